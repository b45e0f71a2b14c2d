// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! An in-memory `ClusterOps` for testing workflow logic without a cluster.
//!
//! The mock keeps created objects in maps, assigns NodePorts the way a
//! real cluster would, enforces already-exists conflicts on create, and
//! records every call so tests can assert on exact call sequences
//! (notably the compensating deletes of the provisioning saga).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use kube::core::{ApiResource, DynamicObject};

use crate::error::{K8sError, K8sResult};
use crate::ops::ClusterOps;

/// A failure to inject into a mock call.
#[derive(Debug, Clone)]
pub enum MockFailure {
	/// The cluster's already-exists conflict (HTTP 409).
	Conflict,
	/// Any other API failure with the given message.
	Api(String),
}

impl MockFailure {
	fn to_error(&self, what: &str) -> K8sError {
		match self {
			MockFailure::Conflict => K8sError::AlreadyExists {
				message: format!("{what} already exists"),
			},
			MockFailure::Api(message) => K8sError::Api {
				message: message.clone(),
			},
		}
	}
}

#[derive(Default)]
struct MockFailures {
	create_pvc: Option<MockFailure>,
	create_deployment: Option<MockFailure>,
	create_service: Option<MockFailure>,
	delete_pvc: Option<MockFailure>,
	delete_deployment: Option<MockFailure>,
	delete_service: Option<MockFailure>,
}

#[derive(Default)]
struct MockState {
	pvcs: BTreeMap<String, PersistentVolumeClaim>,
	deployments: BTreeMap<String, Deployment>,
	services: BTreeMap<String, Service>,
	dynamics: BTreeMap<String, DynamicObject>,
	calls: Vec<String>,
	ports_assigned: i32,
	fail: MockFailures,
}

/// In-memory mock cluster.
#[derive(Clone, Default)]
pub struct MockCluster {
	state: Arc<Mutex<MockState>>,
}

fn object_name(meta: &kube::core::ObjectMeta) -> String {
	meta.name.clone().unwrap_or_default()
}

fn matches_selector(deployment: &Deployment, selector: &str) -> bool {
	let empty = BTreeMap::new();
	let labels = deployment.metadata.labels.as_ref().unwrap_or(&empty);
	selector
		.split(',')
		.filter(|pair| !pair.is_empty())
		.all(|pair| match pair.split_once('=') {
			Some((key, value)) => labels.get(key).is_some_and(|v| v == value),
			None => false,
		})
}

impl MockCluster {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every call made so far, in order, as `"<op> <name>"` strings.
	pub fn calls(&self) -> Vec<String> {
		self.state.lock().unwrap().calls.clone()
	}

	pub fn has_pvc(&self, name: &str) -> bool {
		self.state.lock().unwrap().pvcs.contains_key(name)
	}

	pub fn has_deployment(&self, name: &str) -> bool {
		self.state.lock().unwrap().deployments.contains_key(name)
	}

	pub fn has_service(&self, name: &str) -> bool {
		self.state.lock().unwrap().services.contains_key(name)
	}

	pub fn has_dynamic(&self, name: &str) -> bool {
		self.state.lock().unwrap().dynamics.contains_key(name)
	}

	/// Set the reported ready-replica count on a stored deployment, as
	/// the cluster's own reconciliation would.
	pub fn set_ready_replicas(&self, name: &str, ready: i32) {
		let mut state = self.state.lock().unwrap();
		if let Some(deployment) = state.deployments.get_mut(name) {
			deployment
				.status
				.get_or_insert_with(Default::default)
				.ready_replicas = Some(ready);
		}
	}

	pub fn fail_create_pvc(&self, failure: MockFailure) {
		self.state.lock().unwrap().fail.create_pvc = Some(failure);
	}

	pub fn fail_create_deployment(&self, failure: MockFailure) {
		self.state.lock().unwrap().fail.create_deployment = Some(failure);
	}

	pub fn fail_create_service(&self, failure: MockFailure) {
		self.state.lock().unwrap().fail.create_service = Some(failure);
	}

	pub fn fail_delete_pvc(&self, failure: MockFailure) {
		self.state.lock().unwrap().fail.delete_pvc = Some(failure);
	}

	pub fn fail_delete_deployment(&self, failure: MockFailure) {
		self.state.lock().unwrap().fail.delete_deployment = Some(failure);
	}

	pub fn fail_delete_service(&self, failure: MockFailure) {
		self.state.lock().unwrap().fail.delete_service = Some(failure);
	}
}

#[async_trait]
impl ClusterOps for MockCluster {
	async fn create_pvc(&self, pvc: &PersistentVolumeClaim) -> K8sResult<()> {
		let name = object_name(&pvc.metadata);
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("create_pvc {name}"));
		if let Some(failure) = &state.fail.create_pvc {
			return Err(failure.to_error(&format!("persistentvolumeclaims \"{name}\"")));
		}
		if state.pvcs.contains_key(&name) {
			return Err(MockFailure::Conflict
				.to_error(&format!("persistentvolumeclaims \"{name}\"")));
		}
		state.pvcs.insert(name, pvc.clone());
		Ok(())
	}

	async fn delete_pvc(&self, name: &str) -> K8sResult<()> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("delete_pvc {name}"));
		if let Some(failure) = &state.fail.delete_pvc {
			return Err(failure.to_error(&format!("persistentvolumeclaims \"{name}\"")));
		}
		state.pvcs.remove(name);
		Ok(())
	}

	async fn create_deployment(&self, deployment: &Deployment) -> K8sResult<()> {
		let name = object_name(&deployment.metadata);
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("create_deployment {name}"));
		if let Some(failure) = &state.fail.create_deployment {
			return Err(failure.to_error(&format!("deployments \"{name}\"")));
		}
		if state.deployments.contains_key(&name) {
			return Err(MockFailure::Conflict.to_error(&format!("deployments \"{name}\"")));
		}
		state.deployments.insert(name, deployment.clone());
		Ok(())
	}

	async fn get_deployment(&self, name: &str) -> K8sResult<Option<Deployment>> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("get_deployment {name}"));
		Ok(state.deployments.get(name).cloned())
	}

	async fn list_deployments(&self, label_selector: &str) -> K8sResult<Vec<Deployment>> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("list_deployments {label_selector}"));
		Ok(state
			.deployments
			.values()
			.filter(|d| matches_selector(d, label_selector))
			.cloned()
			.collect())
	}

	async fn delete_deployment(&self, name: &str) -> K8sResult<()> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("delete_deployment {name}"));
		if let Some(failure) = &state.fail.delete_deployment {
			return Err(failure.to_error(&format!("deployments \"{name}\"")));
		}
		state.deployments.remove(name);
		Ok(())
	}

	async fn create_service(&self, service: &Service) -> K8sResult<Service> {
		let name = object_name(&service.metadata);
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("create_service {name}"));
		if let Some(failure) = &state.fail.create_service {
			return Err(failure.to_error(&format!("services \"{name}\"")));
		}
		if state.services.contains_key(&name) {
			return Err(MockFailure::Conflict.to_error(&format!("services \"{name}\"")));
		}

		// Assign a NodePort the way the cluster would.
		let mut created = service.clone();
		state.ports_assigned += 1;
		let node_port = 30000 + state.ports_assigned;
		if let Some(spec) = created.spec.as_mut() {
			if let Some(ports) = spec.ports.as_mut() {
				if let Some(port) = ports.first_mut() {
					port.node_port = Some(node_port);
				}
			}
		}
		state.services.insert(name, created.clone());
		Ok(created)
	}

	async fn get_service(&self, name: &str) -> K8sResult<Option<Service>> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("get_service {name}"));
		Ok(state.services.get(name).cloned())
	}

	async fn delete_service(&self, name: &str) -> K8sResult<()> {
		let mut state = self.state.lock().unwrap();
		state.calls.push(format!("delete_service {name}"));
		if let Some(failure) = &state.fail.delete_service {
			return Err(failure.to_error(&format!("services \"{name}\"")));
		}
		state.services.remove(name);
		Ok(())
	}

	async fn create_dynamic(
		&self,
		resource: &ApiResource,
		object: &DynamicObject,
	) -> K8sResult<()> {
		let name = object_name(&object.metadata);
		let mut state = self.state.lock().unwrap();
		state
			.calls
			.push(format!("create_dynamic {} {name}", resource.plural));
		if state.dynamics.contains_key(&name) {
			return Err(MockFailure::Conflict
				.to_error(&format!("{} \"{name}\"", resource.plural)));
		}
		state.dynamics.insert(name, object.clone());
		Ok(())
	}

	async fn delete_dynamic(&self, resource: &ApiResource, name: &str) -> K8sResult<()> {
		let mut state = self.state.lock().unwrap();
		state
			.calls
			.push(format!("delete_dynamic {} {name}", resource.plural));
		state.dynamics.remove(name);
		Ok(())
	}
}
