// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! K8s client abstraction for Craft server provisioning.
//!
//! This crate owns everything that touches the cluster API directly:
//! credential bootstrap, the namespaced operation seam used by the
//! provisioning workflows, and the error taxonomy that separates
//! conflicts and soft misses from real failures.

pub mod client;
pub mod error;
pub mod mock;
pub mod ops;

pub use client::{connect, ClusterMode};
pub use error::{K8sError, K8sResult};
pub use mock::{MockCluster, MockFailure};
pub use ops::{ClusterOps, KubeCluster};
