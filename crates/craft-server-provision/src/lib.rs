// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Minecraft instance provisioning for Craft server.
//!
//! This crate provides the core business logic for creating, querying and
//! tearing down per-user game server instances on Kubernetes.
//!
//! # Architecture
//!
//! The provisioner layer sits between the HTTP API (craft-server) and the
//! cluster client (craft-server-k8s), implementing:
//!
//! - Derived-name validation and resource construction
//! - The three-step provisioning saga with best-effort compensation
//! - Status and port projection for list/get
//! - Teardown with deliberate world-claim retention

pub mod builders;
pub mod error;
pub mod provisioner;
pub mod types;

pub use error::ProvisionError;
pub use provisioner::Provisioner;
pub use types::{
	claim_name, derive_name, CreateServerRequest, ServerStatus, ServerView, CLAIM_PREFIX,
	NAME_PREFIX,
};
