// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server provisioning HTTP handlers.
//!
//! Thin translation from the REST surface to the provisioning workflows:
//! validation errors map to 400, the cluster's already-exists conflict to
//! 409, soft misses to 404 with an offline-shaped body, and everything
//! else to 500 carrying the underlying failure text.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use craft_server_provision::{CreateServerRequest, ProvisionError, ServerView};

use crate::api::AppState;

/// Error response for server endpoints.
#[derive(Debug, Serialize)]
pub struct ServersErrorResponse {
	pub error: String,
	pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ListServersResponse {
	pub servers: Vec<ServerView>,
}

#[derive(Debug, Serialize)]
pub struct DeleteServerResponse {
	pub status: &'static str,
	pub server: String,
}

fn json_error(
	status: StatusCode,
	error: impl Into<String>,
	message: impl Into<String>,
) -> Response {
	(
		status,
		Json(ServersErrorResponse {
			error: error.into(),
			message: message.into(),
		}),
	)
		.into_response()
}

fn provision_error(err: ProvisionError) -> Response {
	match err {
		ProvisionError::InvalidUsername { .. } => {
			json_error(StatusCode::BAD_REQUEST, "invalid_username", err.to_string())
		}
		ProvisionError::AlreadyExists { .. } => {
			json_error(StatusCode::CONFLICT, "conflict", err.to_string())
		}
		other => {
			error!(error = %other, "provisioning operation failed");
			json_error(
				StatusCode::INTERNAL_SERVER_ERROR,
				"internal_error",
				other.to_string(),
			)
		}
	}
}

/// GET /servers - list all managed server instances.
pub async fn list_servers(State(state): State<AppState>) -> Response {
	match state.provisioner.list().await {
		Ok(servers) => Json(ListServersResponse { servers }).into_response(),
		Err(err) => provision_error(err),
	}
}

/// POST /servers - provision a new server instance.
pub async fn create_server(
	State(state): State<AppState>,
	payload: Result<Json<CreateServerRequest>, JsonRejection>,
) -> Response {
	let Json(request) = match payload {
		Ok(payload) => payload,
		Err(rejection) => {
			return json_error(
				StatusCode::BAD_REQUEST,
				"invalid_body",
				rejection.body_text(),
			);
		}
	};

	match state.provisioner.create(&request).await {
		Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
		Err(err) => provision_error(err),
	}
}

/// GET /servers/{name} - look up one server instance.
///
/// A missing workload is a soft miss: 404 with an offline-shaped view,
/// not an error body.
pub async fn get_server(State(state): State<AppState>, Path(name): Path<String>) -> Response {
	if name.trim().is_empty() {
		return json_error(StatusCode::BAD_REQUEST, "invalid_name", "server name is required");
	}

	match state.provisioner.get(&name).await {
		Ok(Some(view)) => Json(view).into_response(),
		Ok(None) => (StatusCode::NOT_FOUND, Json(ServerView::offline(name))).into_response(),
		Err(err) => provision_error(err),
	}
}

/// DELETE /servers/{name} - tear down a server instance.
///
/// Idempotent: deleting an absent server still reports success. The
/// world storage claim is retained by design.
pub async fn delete_server(State(state): State<AppState>, Path(name): Path<String>) -> Response {
	if name.trim().is_empty() {
		return json_error(StatusCode::BAD_REQUEST, "invalid_name", "server name is required");
	}

	match state.provisioner.delete(&name).await {
		Ok(()) => Json(DeleteServerResponse {
			status: "deleted",
			server: name,
		})
		.into_response(),
		Err(err) => provision_error(err),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use axum::body::Body;
	use axum::http::{header, Request, StatusCode};
	use axum::Router;
	use serde_json::{json, Value};
	use tower::util::ServiceExt;

	use craft_server_k8s::{MockCluster, MockFailure};
	use craft_server_provision::Provisioner;

	use crate::api::{create_router, AppState};

	fn test_app(mock: &MockCluster) -> Router {
		let provisioner = Arc::new(Provisioner::new(Arc::new(mock.clone())));
		create_router(AppState::new(provisioner))
	}

	async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
		let response = app.oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let body = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, body)
	}

	fn post_servers(body: &str) -> Request<Body> {
		Request::builder()
			.method("POST")
			.uri("/servers")
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap()
	}

	fn get(uri: &str) -> Request<Body> {
		Request::builder().uri(uri).body(Body::empty()).unwrap()
	}

	fn delete(uri: &str) -> Request<Body> {
		Request::builder()
			.method("DELETE")
			.uri(uri)
			.body(Body::empty())
			.unwrap()
	}

	#[tokio::test]
	async fn post_with_empty_username_is_400_and_makes_no_cluster_calls() {
		let mock = MockCluster::new();
		let (status, body) = send(test_app(&mock), post_servers(r#"{"username":""}"#)).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "invalid_username");
		assert!(mock.calls().is_empty());
	}

	#[tokio::test]
	async fn post_with_missing_username_field_is_400() {
		let mock = MockCluster::new();
		let (status, _) = send(test_app(&mock), post_servers("{}")).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert!(mock.calls().is_empty());
	}

	#[tokio::test]
	async fn post_with_malformed_body_is_400() {
		let mock = MockCluster::new();
		let (status, body) = send(test_app(&mock), post_servers("{not json")).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "invalid_body");
		assert!(mock.calls().is_empty());
	}

	#[tokio::test]
	async fn post_success_is_201_online_with_port() {
		let mock = MockCluster::new();
		let (status, body) = send(
			test_app(&mock),
			post_servers(r#"{"username":"Alice","version":"1.21","memory":"2G"}"#),
		)
		.await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(body["name"], "mc-alice");
		assert_eq!(body["status"], "online");
		assert_eq!(body["version"], "1.21");
		assert_eq!(body["memory"], "2G");
		assert!(!body["port"].as_str().unwrap().is_empty());
	}

	#[tokio::test]
	async fn post_conflict_is_409_without_service_creation() {
		let mock = MockCluster::new();
		mock.fail_create_deployment(MockFailure::Conflict);

		let (status, body) = send(test_app(&mock), post_servers(r#"{"username":"Alice"}"#)).await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "conflict");
		assert!(!mock
			.calls()
			.iter()
			.any(|c| c.starts_with("create_service")));
	}

	#[tokio::test]
	async fn post_service_failure_is_500_with_underlying_message() {
		let mock = MockCluster::new();
		mock.fail_create_service(MockFailure::Api("no node ports left".to_string()));

		let (status, body) = send(test_app(&mock), post_servers(r#"{"username":"Alice"}"#)).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body["error"], "internal_error");
		assert!(body["message"]
			.as_str()
			.unwrap()
			.contains("no node ports left"));
	}

	#[tokio::test]
	async fn get_miss_is_404_with_offline_shaped_view() {
		let mock = MockCluster::new();
		let (status, body) = send(test_app(&mock), get("/servers/mc-ghost")).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(
			body,
			json!({
				"name": "mc-ghost",
				"version": "",
				"memory": "",
				"status": "offline",
				"port": "",
			})
		);
	}

	#[tokio::test]
	async fn get_reflects_provisioned_server() {
		let mock = MockCluster::new();
		let app = test_app(&mock);
		send(
			app.clone(),
			post_servers(r#"{"username":"Alice","version":"1.21"}"#),
		)
		.await;
		mock.set_ready_replicas("mc-alice", 1);

		let (status, body) = send(app, get("/servers/mc-alice")).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "online");
		assert_eq!(body["version"], "1.21");
	}

	#[tokio::test]
	async fn delete_is_200_and_idempotent() {
		let mock = MockCluster::new();
		let (status, body) = send(test_app(&mock), delete("/servers/mc-ghost")).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body, json!({"status": "deleted", "server": "mc-ghost"}));
	}

	#[tokio::test]
	async fn delete_failure_is_500() {
		let mock = MockCluster::new();
		mock.fail_delete_deployment(MockFailure::Api("etcd unavailable".to_string()));

		let (status, body) = send(test_app(&mock), delete("/servers/mc-alice")).await;
		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(body["message"]
			.as_str()
			.unwrap()
			.contains("etcd unavailable"));
	}

	#[tokio::test]
	async fn delete_keeps_the_world_claim() {
		let mock = MockCluster::new();
		let app = test_app(&mock);
		send(app.clone(), post_servers(r#"{"username":"Alice"}"#)).await;

		let (status, _) = send(app.clone(), delete("/servers/mc-alice")).await;
		assert_eq!(status, StatusCode::OK);
		assert!(mock.has_pvc("pvc-mc-alice"));

		let (status, _) = send(app, get("/servers/mc-alice")).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn list_returns_servers_envelope() {
		let mock = MockCluster::new();
		let app = test_app(&mock);
		send(app.clone(), post_servers(r#"{"username":"Alice"}"#)).await;
		send(app.clone(), post_servers(r#"{"username":"Bob"}"#)).await;

		let (status, body) = send(app, get("/servers")).await;
		assert_eq!(status, StatusCode::OK);
		let servers = body["servers"].as_array().unwrap();
		assert_eq!(servers.len(), 2);
	}

	#[tokio::test]
	async fn unsupported_method_is_405() {
		let mock = MockCluster::new();
		let request = Request::builder()
			.method("PUT")
			.uri("/servers")
			.body(Body::empty())
			.unwrap();
		let (status, _) = send(test_app(&mock), request).await;
		assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
	}

	#[tokio::test]
	async fn health_is_200() {
		let mock = MockCluster::new();
		let (status, body) = send(test_app(&mock), get("/health")).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
	}
}
