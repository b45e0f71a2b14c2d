// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for K8s operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during K8s operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("K8s API error: {message}")]
	Api { message: String },

	#[error("already exists: {message}")]
	AlreadyExists { message: String },

	#[error("not found: {message}")]
	NotFound { message: String },

	#[error("cluster config error: {message}")]
	Config { message: String },
}

impl K8sError {
	/// Whether this error is the cluster's already-exists conflict.
	pub fn is_already_exists(&self) -> bool {
		matches!(self, K8sError::AlreadyExists { .. })
	}

	/// Whether this error is a not-found response.
	pub fn is_not_found(&self) -> bool {
		matches!(self, K8sError::NotFound { .. })
	}
}

impl From<kube::Error> for K8sError {
	fn from(err: kube::Error) -> Self {
		match err {
			kube::Error::Api(ae) if ae.code == 409 => K8sError::AlreadyExists {
				message: ae.message,
			},
			kube::Error::Api(ae) if ae.code == 404 => K8sError::NotFound {
				message: ae.message,
			},
			other => K8sError::Api {
				message: other.to_string(),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use kube::core::ErrorResponse;

	fn api_error(code: u16, message: &str) -> kube::Error {
		kube::Error::Api(ErrorResponse {
			status: "Failure".to_string(),
			message: message.to_string(),
			reason: String::new(),
			code,
		})
	}

	#[test]
	fn conflict_maps_to_already_exists() {
		let err = K8sError::from(api_error(409, "deployments \"mc-alice\" already exists"));
		assert!(err.is_already_exists());
		assert!(!err.is_not_found());
	}

	#[test]
	fn missing_maps_to_not_found() {
		let err = K8sError::from(api_error(404, "deployments \"mc-alice\" not found"));
		assert!(err.is_not_found());
		assert!(!err.is_already_exists());
	}

	#[test]
	fn other_codes_map_to_api() {
		let err = K8sError::from(api_error(503, "the server is currently unable"));
		assert!(!err.is_not_found());
		assert!(!err.is_already_exists());
		assert!(err.to_string().contains("currently unable"));
	}
}
