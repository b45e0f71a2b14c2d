// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Request and response types for the server provisioning API.
//!
//! These are thin, short-lived projections of the API payloads. The
//! cluster's own object store is the source of truth; nothing here is
//! persisted.

use serde::{Deserialize, Serialize};

use crate::error::ProvisionError;

/// Prefix for all derived server names.
pub const NAME_PREFIX: &str = "mc-";

/// Prefix for storage claim names, applied on top of the derived name.
pub const CLAIM_PREFIX: &str = "pvc-";

/// DNS-1123 label length limit, which bounds every derived name.
const MAX_NAME_LEN: usize = 63;

/// Client-supplied configuration for a new server instance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateServerRequest {
	/// Owner of the instance; required, non-empty.
	#[serde(default)]
	pub username: String,
	/// Opaque game version tag passed through to the container.
	#[serde(default)]
	pub version: Option<String>,
	/// Memory limit string such as "2G", passed through to the container.
	#[serde(default)]
	pub memory: Option<String>,
}

/// Running state of a server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
	Online,
	Offline,
}

impl std::fmt::Display for ServerStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ServerStatus::Online => write!(f, "online"),
			ServerStatus::Offline => write!(f, "offline"),
		}
	}
}

/// Response projection of one server instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerView {
	pub name: String,
	pub version: String,
	pub memory: String,
	pub status: ServerStatus,
	/// Externally reachable port, or empty if unassigned.
	pub port: String,
}

impl ServerView {
	/// The offline-shaped view returned for a soft miss.
	pub fn offline(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			version: String::new(),
			memory: String::new(),
			status: ServerStatus::Offline,
			port: String::new(),
		}
	}
}

/// Derive the deterministic object name for a username.
///
/// The result is `"mc-" + lowercase(username)` and must be a valid
/// DNS-1123 label; usernames that cannot produce one are rejected before
/// any cluster call. Uniqueness is enforced by the cluster's own conflict
/// detection, not here.
pub fn derive_name(username: &str) -> Result<String, ProvisionError> {
	if username.is_empty() {
		return Err(ProvisionError::InvalidUsername {
			reason: "username field is required".to_string(),
		});
	}

	let lowered = username.to_lowercase();
	if !lowered
		.chars()
		.all(|c| c.is_ascii_alphanumeric() || c == '-')
	{
		return Err(ProvisionError::InvalidUsername {
			reason: "username may only contain letters, digits and hyphens".to_string(),
		});
	}
	if lowered.starts_with('-') || lowered.ends_with('-') {
		return Err(ProvisionError::InvalidUsername {
			reason: "username may not start or end with a hyphen".to_string(),
		});
	}

	let name = format!("{NAME_PREFIX}{lowered}");
	if name.len() > MAX_NAME_LEN {
		return Err(ProvisionError::InvalidUsername {
			reason: format!("username is too long ({} byte limit)", MAX_NAME_LEN),
		});
	}

	Ok(name)
}

/// Name of the storage claim belonging to a derived server name.
pub fn claim_name(name: &str) -> String {
	format!("{CLAIM_PREFIX}{name}")
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn derive_name_lowercases_and_prefixes() {
		assert_eq!(derive_name("Alice").unwrap(), "mc-alice");
		assert_eq!(derive_name("BOB-42").unwrap(), "mc-bob-42");
	}

	#[test]
	fn empty_username_is_rejected() {
		let err = derive_name("").unwrap_err();
		assert!(err.to_string().contains("required"));
	}

	#[test]
	fn invalid_characters_are_rejected() {
		assert!(derive_name("alice smith").is_err());
		assert!(derive_name("alice_smith").is_err());
		assert!(derive_name("älice").is_err());
	}

	#[test]
	fn leading_and_trailing_hyphens_are_rejected() {
		assert!(derive_name("-alice").is_err());
		assert!(derive_name("alice-").is_err());
	}

	#[test]
	fn overlong_username_is_rejected() {
		let username = "a".repeat(61);
		assert!(derive_name(&username).is_err());
		let username = "a".repeat(60);
		assert!(derive_name(&username).is_ok());
	}

	#[test]
	fn claim_name_stacks_prefixes() {
		assert_eq!(claim_name("mc-alice"), "pvc-mc-alice");
	}

	#[test]
	fn status_serializes_lowercase() {
		assert_eq!(
			serde_json::to_string(&ServerStatus::Online).unwrap(),
			"\"online\""
		);
		assert_eq!(
			serde_json::to_string(&ServerStatus::Offline).unwrap(),
			"\"offline\""
		);
	}

	#[test]
	fn offline_view_has_empty_fields() {
		let view = ServerView::offline("mc-ghost");
		assert_eq!(view.name, "mc-ghost");
		assert_eq!(view.status, ServerStatus::Offline);
		assert!(view.version.is_empty());
		assert!(view.memory.is_empty());
		assert!(view.port.is_empty());
	}

	proptest! {
		#[test]
		fn derived_name_is_prefixed_lowercase(username in "[A-Za-z0-9][A-Za-z0-9-]{0,18}[A-Za-z0-9]") {
			let name = derive_name(&username).unwrap();
			prop_assert_eq!(name, format!("mc-{}", username.to_lowercase()));
		}
	}
}
