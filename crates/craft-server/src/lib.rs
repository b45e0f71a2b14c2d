// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Craft server instance provisioning API.
//!
//! This crate provides the HTTP surface for provisioning and tearing
//! down per-user Minecraft server instances on a Kubernetes cluster.

pub mod api;
pub mod config;
pub mod routes;

pub use api::{create_router, AppState};
pub use config::{load_config, ClusterConfig, Config, ConfigError, HttpConfig};
