// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use craft_server_provision::Provisioner;

use crate::routes;

/// Shared application state.
///
/// The provisioner (and the cluster handle inside it) is immutable after
/// construction; handlers only ever read it.
#[derive(Clone)]
pub struct AppState {
	pub provisioner: Arc<Provisioner>,
}

impl AppState {
	pub fn new(provisioner: Arc<Provisioner>) -> Self {
		Self { provisioner }
	}
}

/// Build the API router. CORS and request tracing layers are applied by
/// the binary, outside core scope.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/servers",
			get(routes::servers::list_servers).post(routes::servers::create_server),
		)
		.route(
			"/servers/{name}",
			get(routes::servers::get_server).delete(routes::servers::delete_server),
		)
		.with_state(state)
}
