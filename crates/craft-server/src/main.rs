// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Craft server provisioning API binary.

use std::sync::Arc;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use craft_server::{create_router, AppState};
use craft_server_k8s::KubeCluster;
use craft_server_provision::Provisioner;

/// Craft server - HTTP API for Minecraft instance provisioning.
#[derive(Parser, Debug)]
#[command(
	name = "craft-server",
	about = "Minecraft instance provisioning API",
	version
)]
struct Args {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let _args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let config = craft_server::load_config()?;

	// Cluster credentials are the only startup-fatal dependency.
	let client = craft_server_k8s::connect(&config.cluster.mode).await?;
	let cluster = KubeCluster::new(client, config.cluster.namespace.clone());

	let mut provisioner = Provisioner::new(Arc::new(cluster));
	if let Some(domain) = &config.cluster.domain {
		provisioner = provisioner.with_domain(domain.clone());
	}
	let state = AppState::new(Arc::new(provisioner));

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!(namespace = %config.cluster.namespace, "listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	tracing::info!("server shutdown complete");
	Ok(())
}
