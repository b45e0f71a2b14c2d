// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Cluster client bootstrap.
//!
//! Produces the `kube::Client` handle used by all other components. The
//! handle is immutable after construction and passed down explicitly; no
//! other part of the system touches credentials or cluster config.

use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::info;

use crate::error::{K8sError, K8sResult};

/// How to obtain credentials for the cluster API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterMode {
	/// In-cluster service account credentials (the deployment default).
	InCluster,
	/// A local kubeconfig file; `None` falls back to `KUBECONFIG` or
	/// `~/.kube/config`.
	Kubeconfig(Option<PathBuf>),
}

/// Build a cluster client for the given access mode.
///
/// Failure here is startup-fatal for the server binary; nothing else in
/// the system can run without the handle.
pub async fn connect(mode: &ClusterMode) -> K8sResult<Client> {
	let config = match mode {
		ClusterMode::InCluster => {
			info!("using in-cluster service account credentials");
			Config::incluster().map_err(|e| K8sError::Config {
				message: format!("in-cluster config: {e}"),
			})?
		}
		ClusterMode::Kubeconfig(path) => {
			let kubeconfig = match path {
				Some(path) => {
					info!(path = %path.display(), "using local kubeconfig");
					Kubeconfig::read_from(path).map_err(|e| K8sError::Config {
						message: format!("kubeconfig {}: {e}", path.display()),
					})?
				}
				None => {
					info!("using default kubeconfig");
					Kubeconfig::read().map_err(|e| K8sError::Config {
						message: format!("kubeconfig: {e}"),
					})?
				}
			};
			Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
				.await
				.map_err(|e| K8sError::Config {
					message: format!("kubeconfig: {e}"),
				})?
		}
	};

	Client::try_from(config).map_err(|e| K8sError::Config {
		message: format!("client construction: {e}"),
	})
}
