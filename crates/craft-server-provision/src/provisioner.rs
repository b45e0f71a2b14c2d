// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Provisioning and query/teardown workflows.
//!
//! [`Provisioner::create`] is a linear three-step saga (claim, workload,
//! service) with backward-only, best-effort compensation: each step that
//! fails deletes what earlier steps created, swallows the delete's own
//! errors, and reports the original failure. There are no retries, no
//! idempotency keys and no exactly-once guarantee; a crash between steps
//! leaves orphans for manual cleanup.

use std::sync::Arc;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use tracing::{info, warn};

use craft_server_k8s::{ClusterOps, K8sError};

use crate::builders;
use crate::error::ProvisionError;
use crate::types::{claim_name, derive_name, CreateServerRequest, ServerStatus, ServerView};

/// An already-created object to delete when a later saga step fails.
enum Compensation {
	Workload(String),
	Claim(String),
}

/// Orchestrates the cluster calls for one server instance.
///
/// Holds the injected cluster handle; no other state. Concurrent calls
/// for the same derived name race at the cluster, where already-exists
/// conflict detection is the only safety net.
pub struct Provisioner {
	cluster: Arc<dyn ClusterOps>,
	/// Routing domain for Traefik TCP routes; ingress objects are only
	/// managed when this is set.
	domain: Option<String>,
}

impl Provisioner {
	pub fn new(cluster: Arc<dyn ClusterOps>) -> Self {
		Self {
			cluster,
			domain: None,
		}
	}

	/// Enable best-effort `IngressRouteTCP` management under `domain`.
	pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());
		self
	}

	/// Provision a new server instance: storage claim, workload, NodePort
	/// service, in that order.
	pub async fn create(&self, request: &CreateServerRequest) -> Result<ServerView, ProvisionError> {
		let name = derive_name(&request.username)?;
		let claim = claim_name(&name);

		// Step 1: storage claim. Nothing created yet, so no compensation.
		self.cluster.create_pvc(&builders::claim(&name)).await?;

		// Step 2: workload.
		if let Err(err) = self
			.cluster
			.create_deployment(&builders::deployment(&name, request))
			.await
		{
			if err.is_already_exists() {
				// The claim from step one is deliberately left in place on
				// conflict; a retry under the same name reclaims it.
				return Err(ProvisionError::AlreadyExists { name });
			}
			self.compensate(&[Compensation::Claim(claim)]).await;
			return Err(err.into());
		}

		// Step 3: service, and the NodePort the cluster assigned to it.
		let port = match self.create_service_with_port(&name).await {
			Ok(port) => port,
			Err(err) => {
				self.compensate(&[
					Compensation::Workload(name.clone()),
					Compensation::Claim(claim),
				])
				.await;
				return Err(err);
			}
		};

		if let Some(domain) = &self.domain {
			self.create_ingress_route(&name, domain).await;
		}

		info!(%name, port, "server provisioned");
		Ok(ServerView {
			name,
			version: request.version.clone().unwrap_or_default(),
			memory: request.memory.clone().unwrap_or_default(),
			status: ServerStatus::Online,
			port: port.to_string(),
		})
	}

	/// List every managed server instance in the namespace.
	pub async fn list(&self) -> Result<Vec<ServerView>, ProvisionError> {
		let deployments = self
			.cluster
			.list_deployments(builders::APP_SELECTOR)
			.await?;
		let mut servers = Vec::with_capacity(deployments.len());
		for deployment in deployments {
			servers.push(self.view_of(&deployment).await);
		}
		Ok(servers)
	}

	/// Look up one server instance; a missing workload is a soft miss,
	/// not an error.
	pub async fn get(&self, name: &str) -> Result<Option<ServerView>, ProvisionError> {
		match self.cluster.get_deployment(name).await? {
			Some(deployment) => Ok(Some(self.view_of(&deployment).await)),
			None => Ok(None),
		}
	}

	/// Tear down a server instance: workload, then service, each
	/// tolerating not-found as success. The storage claim is retained so
	/// the world survives recreation under the same name.
	pub async fn delete(&self, name: &str) -> Result<(), ProvisionError> {
		self.cluster.delete_deployment(name).await?;
		self.cluster.delete_service(name).await?;

		if self.domain.is_some() {
			let resource = builders::ingress_route_resource();
			if let Err(error) = self.cluster.delete_dynamic(&resource, name).await {
				warn!(%error, %name, "ingress route deletion failed");
			}
		}

		info!(%name, "server deleted");
		Ok(())
	}

	async fn create_service_with_port(&self, name: &str) -> Result<i32, ProvisionError> {
		let created = self.cluster.create_service(&builders::service(name)).await?;
		node_port(&created).ok_or_else(|| ProvisionError::MissingNodePort {
			name: name.to_string(),
		})
	}

	async fn create_ingress_route(&self, name: &str, domain: &str) {
		let resource = builders::ingress_route_resource();
		let route = builders::ingress_route(name, domain);
		if let Err(error) = self.cluster.create_dynamic(&resource, &route).await {
			warn!(%error, %name, "ingress route creation failed");
		}
	}

	/// Run compensating deletes in order, swallowing their failures; the
	/// caller reports the original error, never these.
	async fn compensate(&self, steps: &[Compensation]) {
		for step in steps {
			let result: Result<(), K8sError> = match step {
				Compensation::Workload(name) => self.cluster.delete_deployment(name).await,
				Compensation::Claim(name) => self.cluster.delete_pvc(name).await,
			};
			if let Err(error) = result {
				warn!(%error, "compensating delete failed");
			}
		}
	}

	/// Project a deployment (plus its service, when present) into the
	/// response view. Service lookup failures are tolerated; the port
	/// stays empty.
	async fn view_of(&self, deployment: &Deployment) -> ServerView {
		let name = deployment.metadata.name.clone().unwrap_or_default();

		let (version, memory) = deployment
			.spec
			.as_ref()
			.and_then(|spec| spec.template.spec.as_ref())
			.and_then(|pod| pod.containers.first())
			.map(|container| {
				(
					container_env(container, "VERSION"),
					container_env(container, "MEMORY"),
				)
			})
			.unwrap_or_default();

		let ready = deployment
			.status
			.as_ref()
			.and_then(|status| status.ready_replicas)
			.unwrap_or(0);
		let status = if ready > 0 {
			ServerStatus::Online
		} else {
			ServerStatus::Offline
		};

		let port = match self.cluster.get_service(&name).await {
			Ok(Some(service)) => node_port(&service)
				.map(|p| p.to_string())
				.unwrap_or_default(),
			Ok(None) => String::new(),
			Err(error) => {
				warn!(%error, %name, "service lookup failed");
				String::new()
			}
		};

		ServerView {
			name,
			version,
			memory,
			status,
			port,
		}
	}
}

fn container_env(container: &k8s_openapi::api::core::v1::Container, key: &str) -> String {
	container
		.env
		.iter()
		.flatten()
		.find(|env| env.name == key)
		.and_then(|env| env.value.clone())
		.unwrap_or_default()
}

fn node_port(service: &Service) -> Option<i32> {
	service
		.spec
		.as_ref()?
		.ports
		.as_ref()?
		.first()?
		.node_port
}
