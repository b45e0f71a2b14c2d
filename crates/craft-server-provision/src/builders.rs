// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Declarative resource builders.
//!
//! Pure construction of the three cluster objects owned by one server
//! instance: storage claim, workload deployment and NodePort service.
//! Builders never touch the cluster and cannot fail; malformed input is
//! rejected upstream by [`crate::types::derive_name`].
//!
//! The one untyped builder, [`ingress_route`], covers the Traefik
//! `IngressRouteTCP` CRD, which has no native typed binding.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
	Container, ContainerPort, EnvVar, PersistentVolumeClaim, PersistentVolumeClaimSpec,
	PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Service, ServicePort,
	ServiceSpec, Volume, VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};

use crate::types::{claim_name, CreateServerRequest};

/// Container image every instance runs.
pub const SERVER_IMAGE: &str = "itzg/minecraft-server";

/// Fixed game-protocol port.
pub const GAME_PORT: i32 = 25565;

/// Server engine passed to the container as `TYPE`.
pub const ENGINE: &str = "PAPER";

/// Label selector matching every workload this service manages.
pub const APP_SELECTOR: &str = "app=minecraft";

/// Fixed size of each world storage claim.
pub const CLAIM_SIZE: &str = "1Gi";

const APP_LABEL: &str = "app";
const APP_NAME: &str = "minecraft";
const SERVER_LABEL: &str = "server";
const OWNER_LABEL: &str = "owner";
const VOLUME_NAME: &str = "minecraft-world";
const DATA_PATH: &str = "/data";
const PORT_NAME: &str = "minecraft";

fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
	pairs
		.iter()
		.map(|(k, v)| (k.to_string(), v.to_string()))
		.collect()
}

fn env(name: &str, value: &str) -> EnvVar {
	EnvVar {
		name: name.to_string(),
		value: Some(value.to_string()),
		..Default::default()
	}
}

/// Storage claim holding the instance's world data, named `pvc-<name>`.
/// It outlives the workload: teardown leaves it behind so the world
/// survives recreation.
pub fn claim(name: &str) -> PersistentVolumeClaim {
	PersistentVolumeClaim {
		metadata: ObjectMeta {
			name: Some(claim_name(name)),
			labels: Some(labels(&[(APP_LABEL, APP_NAME), (SERVER_LABEL, name)])),
			..Default::default()
		},
		spec: Some(PersistentVolumeClaimSpec {
			access_modes: Some(vec!["ReadWriteOnce".to_string()]),
			resources: Some(VolumeResourceRequirements {
				requests: Some(BTreeMap::from([(
					"storage".to_string(),
					Quantity(CLAIM_SIZE.to_string()),
				)])),
				..Default::default()
			}),
			..Default::default()
		}),
		..Default::default()
	}
}

/// Single-replica workload running the game server container, with the
/// world volume bound to the instance's storage claim.
pub fn deployment(name: &str, request: &CreateServerRequest) -> Deployment {
	let version = request.version.clone().unwrap_or_default();
	let memory = request.memory.clone().unwrap_or_default();
	let owner = request.username.to_lowercase();

	Deployment {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			labels: Some(labels(&[(APP_LABEL, APP_NAME), (OWNER_LABEL, &owner)])),
			..Default::default()
		},
		spec: Some(DeploymentSpec {
			replicas: Some(1),
			selector: LabelSelector {
				match_labels: Some(labels(&[(SERVER_LABEL, name)])),
				..Default::default()
			},
			template: PodTemplateSpec {
				metadata: Some(ObjectMeta {
					labels: Some(labels(&[(APP_LABEL, APP_NAME), (SERVER_LABEL, name)])),
					..Default::default()
				}),
				spec: Some(PodSpec {
					containers: vec![Container {
						name: APP_NAME.to_string(),
						image: Some(SERVER_IMAGE.to_string()),
						env: Some(vec![
							env("EULA", "TRUE"),
							env("TYPE", ENGINE),
							env("VERSION", &version),
							env("MEMORY", &memory),
							// Allow clients without Mojang accounts.
							env("ONLINE_MODE", "FALSE"),
						]),
						ports: Some(vec![ContainerPort {
							container_port: GAME_PORT,
							name: Some("minecraft-port".to_string()),
							..Default::default()
						}]),
						volume_mounts: Some(vec![VolumeMount {
							name: VOLUME_NAME.to_string(),
							mount_path: DATA_PATH.to_string(),
							..Default::default()
						}]),
						..Default::default()
					}],
					volumes: Some(vec![Volume {
						name: VOLUME_NAME.to_string(),
						persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
							claim_name: claim_name(name),
							..Default::default()
						}),
						..Default::default()
					}]),
					..Default::default()
				}),
			},
			..Default::default()
		}),
		..Default::default()
	}
}

/// NodePort service exposing the instance's game port, selecting pods by
/// the derived name. The cluster assigns the external port on create.
pub fn service(name: &str) -> Service {
	Service {
		metadata: ObjectMeta {
			name: Some(name.to_string()),
			labels: Some(labels(&[(APP_LABEL, APP_NAME), (SERVER_LABEL, name)])),
			..Default::default()
		},
		spec: Some(ServiceSpec {
			selector: Some(labels(&[(SERVER_LABEL, name)])),
			ports: Some(vec![ServicePort {
				name: Some(PORT_NAME.to_string()),
				protocol: Some("TCP".to_string()),
				port: GAME_PORT,
				target_port: Some(IntOrString::Int(GAME_PORT)),
				..Default::default()
			}]),
			type_: Some("NodePort".to_string()),
			..Default::default()
		}),
		..Default::default()
	}
}

/// API resource descriptor for the Traefik `IngressRouteTCP` CRD.
pub fn ingress_route_resource() -> ApiResource {
	ApiResource::from_gvk_with_plural(
		&GroupVersionKind::gvk("traefik.containo.us", "v1alpha1", "IngressRouteTCP"),
		"ingressroutetcps",
	)
}

/// Traefik TCP route matching `HostSNI` on `<name>.<domain>`.
///
/// Built as a `DynamicObject` because the CRD has no typed binding.
pub fn ingress_route(name: &str, domain: &str) -> DynamicObject {
	let mut route = DynamicObject::new(name, &ingress_route_resource());
	route.metadata.labels = Some(labels(&[(APP_LABEL, APP_NAME), (SERVER_LABEL, name)]));
	route.data = serde_json::json!({
		"spec": {
			"entryPoints": ["minecraft-tcp"],
			"routes": [{
				"match": format!("HostSNI(`{name}.{domain}`)"),
				"services": [{
					"name": name,
					"port": GAME_PORT,
				}],
			}],
		}
	});
	route
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request(username: &str, version: Option<&str>, memory: Option<&str>) -> CreateServerRequest {
		CreateServerRequest {
			username: username.to_string(),
			version: version.map(str::to_string),
			memory: memory.map(str::to_string),
		}
	}

	fn env_value(deployment: &Deployment, key: &str) -> Option<String> {
		let container = &deployment.spec.as_ref()?.template.spec.as_ref()?.containers[0];
		container
			.env
			.as_ref()?
			.iter()
			.find(|e| e.name == key)
			.and_then(|e| e.value.clone())
	}

	#[test]
	fn claim_requests_fixed_size_volume() {
		let claim = claim("mc-alice");
		assert_eq!(claim.metadata.name.as_deref(), Some("pvc-mc-alice"));
		let spec = claim.spec.unwrap();
		assert_eq!(spec.access_modes.unwrap(), vec!["ReadWriteOnce"]);
		let requests = spec.resources.unwrap().requests.unwrap();
		assert_eq!(requests["storage"].0, CLAIM_SIZE);
	}

	#[test]
	fn deployment_has_one_replica_and_fixed_image() {
		let deployment = deployment("mc-alice", &request("Alice", None, None));
		let spec = deployment.spec.as_ref().unwrap();
		assert_eq!(spec.replicas, Some(1));
		let container = &spec.template.spec.as_ref().unwrap().containers[0];
		assert_eq!(container.image.as_deref(), Some(SERVER_IMAGE));
		assert_eq!(
			container.ports.as_ref().unwrap()[0].container_port,
			GAME_PORT
		);
	}

	#[test]
	fn deployment_env_carries_request_config() {
		let deployment = deployment("mc-alice", &request("Alice", Some("1.21"), Some("2G")));
		assert_eq!(env_value(&deployment, "EULA").as_deref(), Some("TRUE"));
		assert_eq!(env_value(&deployment, "TYPE").as_deref(), Some(ENGINE));
		assert_eq!(env_value(&deployment, "VERSION").as_deref(), Some("1.21"));
		assert_eq!(env_value(&deployment, "MEMORY").as_deref(), Some("2G"));
		assert_eq!(
			env_value(&deployment, "ONLINE_MODE").as_deref(),
			Some("FALSE")
		);
	}

	#[test]
	fn deployment_omitted_config_becomes_empty_env() {
		let deployment = deployment("mc-alice", &request("Alice", None, None));
		assert_eq!(env_value(&deployment, "VERSION").as_deref(), Some(""));
		assert_eq!(env_value(&deployment, "MEMORY").as_deref(), Some(""));
	}

	#[test]
	fn deployment_mounts_world_claim() {
		let deployment = deployment("mc-alice", &request("Alice", None, None));
		let pod = deployment.spec.unwrap().template.spec.unwrap();
		let mount = &pod.containers[0].volume_mounts.as_ref().unwrap()[0];
		assert_eq!(mount.mount_path, DATA_PATH);
		let volume = &pod.volumes.unwrap()[0];
		assert_eq!(volume.name, mount.name);
		assert_eq!(
			volume
				.persistent_volume_claim
				.as_ref()
				.unwrap()
				.claim_name,
			"pvc-mc-alice"
		);
	}

	#[test]
	fn deployment_selector_matches_pod_labels() {
		let deployment = deployment("mc-alice", &request("Alice", None, None));
		let spec = deployment.spec.unwrap();
		let selector = spec.selector.match_labels.unwrap();
		let pod_labels = spec.template.metadata.unwrap().labels.unwrap();
		for (key, value) in &selector {
			assert_eq!(pod_labels.get(key), Some(value));
		}
	}

	#[test]
	fn service_is_node_port_selecting_server_pods() {
		let service = service("mc-alice");
		let spec = service.spec.unwrap();
		assert_eq!(spec.type_.as_deref(), Some("NodePort"));
		assert_eq!(
			spec.selector.unwrap().get(SERVER_LABEL).map(String::as_str),
			Some("mc-alice")
		);
		let port = &spec.ports.unwrap()[0];
		assert_eq!(port.port, GAME_PORT);
		assert_eq!(port.target_port, Some(IntOrString::Int(GAME_PORT)));
		assert!(port.node_port.is_none());
	}

	#[test]
	fn ingress_route_matches_host_sni() {
		let route = ingress_route("mc-alice", "play.example.com");
		assert_eq!(route.metadata.name.as_deref(), Some("mc-alice"));
		let matcher = route.data["spec"]["routes"][0]["match"]
			.as_str()
			.unwrap();
		assert_eq!(matcher, "HostSNI(`mc-alice.play.example.com`)");
		assert_eq!(
			route.data["spec"]["routes"][0]["services"][0]["port"],
			GAME_PORT
		);
	}
}
