// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The cluster operations seam.
//!
//! `ClusterOps` abstracts the handful of Kubernetes calls the provisioning
//! and teardown workflows make, so workflow logic can be exercised against
//! [`crate::mock::MockCluster`] without a cluster. The production
//! implementation is [`KubeCluster`], a thin namespaced wrapper over
//! `kube::Api`.
//!
//! Deletes tolerate not-found and report success: both teardown and
//! compensating rollback treat an absent object as already done.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Service};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::core::{ApiResource, DynamicObject};
use kube::{Api, Client};

use crate::error::{K8sError, K8sResult};

/// The cluster calls made by the provisioning and query/teardown
/// workflows. One method per call site; every call is attempted exactly
/// once per request, with no retries at this layer.
#[async_trait]
pub trait ClusterOps: Send + Sync {
	async fn create_pvc(&self, pvc: &PersistentVolumeClaim) -> K8sResult<()>;
	async fn delete_pvc(&self, name: &str) -> K8sResult<()>;

	async fn create_deployment(&self, deployment: &Deployment) -> K8sResult<()>;
	async fn get_deployment(&self, name: &str) -> K8sResult<Option<Deployment>>;
	async fn list_deployments(&self, label_selector: &str) -> K8sResult<Vec<Deployment>>;
	async fn delete_deployment(&self, name: &str) -> K8sResult<()>;

	/// Create a service and return it as the cluster stored it, so the
	/// caller can read back the assigned NodePort.
	async fn create_service(&self, service: &Service) -> K8sResult<Service>;
	async fn get_service(&self, name: &str) -> K8sResult<Option<Service>>;
	async fn delete_service(&self, name: &str) -> K8sResult<()>;

	/// Create a dynamically-typed object, for resource kinds without
	/// native typed bindings.
	async fn create_dynamic(&self, resource: &ApiResource, object: &DynamicObject)
		-> K8sResult<()>;
	async fn delete_dynamic(&self, resource: &ApiResource, name: &str) -> K8sResult<()>;
}

/// Production `ClusterOps` backed by a `kube::Client`, scoped to a single
/// namespace.
#[derive(Clone)]
pub struct KubeCluster {
	client: Client,
	namespace: String,
}

impl KubeCluster {
	pub fn new(client: Client, namespace: impl Into<String>) -> Self {
		Self {
			client,
			namespace: namespace.into(),
		}
	}

	/// The namespace all operations are scoped to.
	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	fn pvcs(&self) -> Api<PersistentVolumeClaim> {
		Api::namespaced(self.client.clone(), &self.namespace)
	}

	fn deployments(&self) -> Api<Deployment> {
		Api::namespaced(self.client.clone(), &self.namespace)
	}

	fn services(&self) -> Api<Service> {
		Api::namespaced(self.client.clone(), &self.namespace)
	}

	fn dynamics(&self, resource: &ApiResource) -> Api<DynamicObject> {
		Api::namespaced_with(self.client.clone(), &self.namespace, resource)
	}
}

/// Treat a not-found delete response as success.
fn tolerate_not_found(result: Result<(), K8sError>) -> K8sResult<()> {
	match result {
		Err(err) if err.is_not_found() => Ok(()),
		other => other,
	}
}

#[async_trait]
impl ClusterOps for KubeCluster {
	async fn create_pvc(&self, pvc: &PersistentVolumeClaim) -> K8sResult<()> {
		self.pvcs().create(&PostParams::default(), pvc).await?;
		Ok(())
	}

	async fn delete_pvc(&self, name: &str) -> K8sResult<()> {
		tolerate_not_found(
			self.pvcs()
				.delete(name, &DeleteParams::default())
				.await
				.map(|_| ())
				.map_err(K8sError::from),
		)
	}

	async fn create_deployment(&self, deployment: &Deployment) -> K8sResult<()> {
		self.deployments()
			.create(&PostParams::default(), deployment)
			.await?;
		Ok(())
	}

	async fn get_deployment(&self, name: &str) -> K8sResult<Option<Deployment>> {
		Ok(self.deployments().get_opt(name).await?)
	}

	async fn list_deployments(&self, label_selector: &str) -> K8sResult<Vec<Deployment>> {
		let params = ListParams::default().labels(label_selector);
		Ok(self.deployments().list(&params).await?.items)
	}

	async fn delete_deployment(&self, name: &str) -> K8sResult<()> {
		tolerate_not_found(
			self.deployments()
				.delete(name, &DeleteParams::default())
				.await
				.map(|_| ())
				.map_err(K8sError::from),
		)
	}

	async fn create_service(&self, service: &Service) -> K8sResult<Service> {
		Ok(self
			.services()
			.create(&PostParams::default(), service)
			.await?)
	}

	async fn get_service(&self, name: &str) -> K8sResult<Option<Service>> {
		Ok(self.services().get_opt(name).await?)
	}

	async fn delete_service(&self, name: &str) -> K8sResult<()> {
		tolerate_not_found(
			self.services()
				.delete(name, &DeleteParams::default())
				.await
				.map(|_| ())
				.map_err(K8sError::from),
		)
	}

	async fn create_dynamic(
		&self,
		resource: &ApiResource,
		object: &DynamicObject,
	) -> K8sResult<()> {
		self.dynamics(resource)
			.create(&PostParams::default(), object)
			.await?;
		Ok(())
	}

	async fn delete_dynamic(&self, resource: &ApiResource, name: &str) -> K8sResult<()> {
		tolerate_not_found(
			self.dynamics(resource)
				.delete(name, &DeleteParams::default())
				.await
				.map(|_| ())
				.map_err(K8sError::from),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tolerate_not_found_passes_success_through() {
		assert!(tolerate_not_found(Ok(())).is_ok());
	}

	#[test]
	fn tolerate_not_found_swallows_not_found() {
		let err = K8sError::NotFound {
			message: "gone".to_string(),
		};
		assert!(tolerate_not_found(Err(err)).is_ok());
	}

	#[test]
	fn tolerate_not_found_surfaces_other_errors() {
		let err = K8sError::Api {
			message: "boom".to_string(),
		};
		assert!(tolerate_not_found(Err(err)).is_err());
	}
}
