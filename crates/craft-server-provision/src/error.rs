// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Provisioning error types.

/// Errors that can occur during server provisioning operations.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
	/// The submitted username cannot produce a valid object name.
	#[error("invalid username: {reason}")]
	InvalidUsername { reason: String },

	/// A server with this derived name already exists.
	#[error("server '{name}' already exists")]
	AlreadyExists { name: String },

	/// The cluster created the service but assigned no NodePort.
	#[error("no NodePort assigned for service '{name}'")]
	MissingNodePort { name: String },

	/// Kubernetes error.
	#[error(transparent)]
	K8s(#[from] craft_server_k8s::K8sError),
}
