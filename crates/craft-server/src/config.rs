// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Environment-derived server configuration.
//!
//! Consistent variable naming (`CRAFT_SERVER_*`) with built-in defaults.
//! The core workflows never read the environment; they receive an
//! already-constructed cluster handle and namespace from here.

use std::path::PathBuf;

use craft_server_k8s::ClusterMode;
use tracing::info;

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid value for {variable}: {value}")]
	Invalid { variable: String, value: String },
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
	pub host: String,
	pub port: u16,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".to_string(),
			port: 3000,
		}
	}
}

/// Target cluster configuration.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
	pub namespace: String,
	pub mode: ClusterMode,
	/// Routing domain for Traefik TCP routes; route objects are only
	/// managed when set.
	pub domain: Option<String>,
}

impl Default for ClusterConfig {
	fn default() -> Self {
		Self {
			namespace: "default".to_string(),
			mode: ClusterMode::InCluster,
			domain: None,
		}
	}
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
	pub http: HttpConfig,
	pub cluster: ClusterConfig,
}

impl Config {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from the environment.
///
/// Variables (all optional):
/// - `CRAFT_SERVER_HOST` (default `0.0.0.0`)
/// - `CRAFT_SERVER_PORT` (default `3000`)
/// - `CRAFT_SERVER_NAMESPACE` (default `default`)
/// - `CRAFT_SERVER_CLUSTER_MODE` (`in-cluster` | `kubeconfig`, default
///   `in-cluster`)
/// - `CRAFT_SERVER_KUBECONFIG` (path; implies `kubeconfig` mode)
/// - `CRAFT_SERVER_DOMAIN` (routing domain, off when unset)
pub fn load_config() -> Result<Config, ConfigError> {
	let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

	let mut http = HttpConfig::default();
	if let Some(host) = var("CRAFT_SERVER_HOST") {
		http.host = host;
	}
	if let Some(port) = var("CRAFT_SERVER_PORT") {
		http.port = parse_port(&port)?;
	}

	let mut cluster = ClusterConfig::default();
	if let Some(namespace) = var("CRAFT_SERVER_NAMESPACE") {
		cluster.namespace = namespace;
	}
	cluster.mode = parse_mode(
		var("CRAFT_SERVER_CLUSTER_MODE").as_deref(),
		var("CRAFT_SERVER_KUBECONFIG").map(PathBuf::from),
	)?;
	cluster.domain = var("CRAFT_SERVER_DOMAIN");

	info!(
		host = %http.host,
		port = http.port,
		namespace = %cluster.namespace,
		in_cluster = cluster.mode == ClusterMode::InCluster,
		domain_configured = cluster.domain.is_some(),
		"server configuration loaded"
	);

	Ok(Config { http, cluster })
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
	value.parse().map_err(|_| ConfigError::Invalid {
		variable: "CRAFT_SERVER_PORT".to_string(),
		value: value.to_string(),
	})
}

fn parse_mode(
	mode: Option<&str>,
	kubeconfig: Option<PathBuf>,
) -> Result<ClusterMode, ConfigError> {
	match mode {
		None => match kubeconfig {
			// An explicit kubeconfig path implies local mode.
			Some(path) => Ok(ClusterMode::Kubeconfig(Some(path))),
			None => Ok(ClusterMode::InCluster),
		},
		Some("in-cluster") => Ok(ClusterMode::InCluster),
		Some("kubeconfig") => Ok(ClusterMode::Kubeconfig(kubeconfig)),
		Some(other) => Err(ConfigError::Invalid {
			variable: "CRAFT_SERVER_CLUSTER_MODE".to_string(),
			value: other.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn socket_addr_joins_host_and_port() {
		let config = Config {
			http: HttpConfig {
				host: "127.0.0.1".to_string(),
				port: 9000,
			},
			cluster: ClusterConfig::default(),
		};
		assert_eq!(config.socket_addr(), "127.0.0.1:9000");
	}

	#[test]
	fn defaults_match_documented_values() {
		let config = Config::default();
		assert_eq!(config.http.port, 3000);
		assert_eq!(config.cluster.namespace, "default");
		assert_eq!(config.cluster.mode, ClusterMode::InCluster);
		assert!(config.cluster.domain.is_none());
	}

	#[test]
	fn parse_port_rejects_garbage() {
		assert!(parse_port("3000").is_ok());
		assert!(parse_port("not-a-port").is_err());
		assert!(parse_port("70000").is_err());
	}

	#[test]
	fn kubeconfig_path_implies_local_mode() {
		let mode = parse_mode(None, Some(PathBuf::from("/tmp/kubeconfig"))).unwrap();
		assert_eq!(
			mode,
			ClusterMode::Kubeconfig(Some(PathBuf::from("/tmp/kubeconfig")))
		);
	}

	#[test]
	fn explicit_modes_parse() {
		assert_eq!(
			parse_mode(Some("in-cluster"), None).unwrap(),
			ClusterMode::InCluster
		);
		assert_eq!(
			parse_mode(Some("kubeconfig"), None).unwrap(),
			ClusterMode::Kubeconfig(None)
		);
		assert!(parse_mode(Some("teleport"), None).is_err());
	}
}
