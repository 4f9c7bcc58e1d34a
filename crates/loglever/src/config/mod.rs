// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered logger configuration.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file, then
//! `LOGLEVER_*` environment variables.
//!
//! ```toml
//! component = "arpd"
//! global_flag_policy = "honor"
//!
//! [sink]
//! kind = "syslog"
//! protocol = "udp"
//! host = "syslog.internal"
//!
//! [store]
//! kind = "sqlite"
//! url = "sqlite:///var/lib/loglever/config.db"
//!
//! [listener]
//! endpoint = "127.0.0.1:10002"
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

pub use error::ConfigError;
pub use layer::LoggerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

use crate::bootstrap::GlobalFlagPolicy;

/// Fully resolved logger configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerConfig {
	pub component: String,
	/// Application name stamped on syslog lines.
	pub tag: String,
	pub global_flag_policy: GlobalFlagPolicy,
	pub sink: SinkConfig,
	pub store: StoreConfig,
	pub listener: ListenerConfig,
}

impl LoggerConfig {
	/// Defaults for `component`, without consulting any source.
	pub fn for_component(component: impl Into<String>) -> Self {
		let component = component.into();
		Self {
			tag: component.clone(),
			component,
			global_flag_policy: GlobalFlagPolicy::default(),
			sink: SinkConfig::default(),
			store: StoreConfig::default(),
			listener: ListenerConfig::default(),
		}
	}

	pub fn reconnect_interval(&self) -> Duration {
		Duration::from_millis(self.listener.reconnect_interval_ms)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOGLEVER_*`)
/// 2. Config file (`/etc/loglever/loglever.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<LoggerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<LoggerConfig, ConfigError> {
	let mut merged = LoggerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<LoggerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<LoggerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LoggerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Resolves a merged layer, filling defaults and validating.
pub fn finalize(layer: LoggerConfigLayer) -> Result<LoggerConfig, ConfigError> {
	let component = layer
		.component
		.filter(|c| !c.trim().is_empty())
		.ok_or_else(|| ConfigError::Validation("a component name is required".to_string()))?;
	let tag = layer.tag.unwrap_or_else(|| component.clone());
	let sink = layer.sink.unwrap_or_default().finalize();
	let store = layer.store.unwrap_or_default().finalize();
	let listener = layer.listener.unwrap_or_default().finalize();

	validate_config(&sink, &store, &listener)?;

	info!(
		%component,
		sink = ?sink.kind,
		store = ?store.kind,
		listener_enabled = listener.enabled,
		endpoint = %listener.endpoint,
		"logger configuration loaded"
	);

	Ok(LoggerConfig {
		component,
		tag,
		global_flag_policy: layer.global_flag_policy.unwrap_or_default(),
		sink,
		store,
		listener,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(
	sink: &SinkConfig,
	store: &StoreConfig,
	listener: &ListenerConfig,
) -> Result<(), ConfigError> {
	if sink.kind == SinkKind::Syslog
		&& sink.syslog.protocol != SyslogProtocol::Unix
		&& sink.syslog.host.trim().is_empty()
	{
		return Err(ConfigError::Validation(
			"a syslog host is required for udp and tcp syslog".to_string(),
		));
	}

	match store.kind {
		StoreKind::Toml if store.path.is_none() => {
			return Err(ConfigError::Validation(
				"store.path is required when store.kind = \"toml\"".to_string(),
			));
		}
		StoreKind::Sqlite if store.url.is_none() => {
			return Err(ConfigError::Validation(
				"store.url is required when store.kind = \"sqlite\"".to_string(),
			));
		}
		_ => {}
	}

	if listener.enabled && listener.recv_buffer_bytes == 0 {
		return Err(ConfigError::Validation(
			"listener.recv_buffer_bytes must be greater than zero".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	fn layer(toml: &str) -> LoggerConfigLayer {
		toml::from_str(toml).unwrap()
	}

	#[test]
	fn test_component_is_required() {
		let err = finalize(LoggerConfigLayer::default()).unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));

		let err = finalize(layer(r#"component = "  ""#)).unwrap_err();
		assert!(err.to_string().contains("component"));
	}

	#[test]
	fn test_defaults() {
		let config = finalize(layer(r#"component = "arpd""#)).unwrap();
		assert_eq!(config, LoggerConfig::for_component("arpd"));
		assert_eq!(config.tag, "arpd");
		assert_eq!(config.global_flag_policy, GlobalFlagPolicy::Honor);
		assert_eq!(config.store.kind, StoreKind::None);
		assert_eq!(config.reconnect_interval(), Duration::from_millis(100));
	}

	#[test]
	fn test_tag_override() {
		let config = finalize(layer(
			r#"
			component = "arpd"
			tag = "arp-daemon"
			"#,
		))
		.unwrap();
		assert_eq!(config.tag, "arp-daemon");
	}

	#[test]
	fn test_store_validation() {
		let err = finalize(layer(
			r#"
			component = "arpd"
			[store]
			kind = "sqlite"
			"#,
		))
		.unwrap_err();
		assert!(err.to_string().contains("store.url"));

		let err = finalize(layer(
			r#"
			component = "arpd"
			[store]
			kind = "toml"
			"#,
		))
		.unwrap_err();
		assert!(err.to_string().contains("store.path"));
	}

	#[test]
	fn test_remote_syslog_needs_host() {
		let err = finalize(layer(
			r#"
			component = "arpd"
			[sink]
			protocol = "tcp"
			host = ""
			"#,
		))
		.unwrap_err();
		assert!(err.to_string().contains("syslog host"));
	}

	#[test]
	fn test_sources_merge_by_precedence() {
		struct Fixed(Precedence, LoggerConfigLayer);
		impl ConfigSource for Fixed {
			fn name(&self) -> &'static str {
				"fixed"
			}
			fn precedence(&self) -> Precedence {
				self.0
			}
			fn load(&self) -> Result<LoggerConfigLayer, ConfigError> {
				Ok(self.1.clone())
			}
		}

		let config = load_from_sources(vec![
			Box::new(Fixed(
				Precedence::Environment,
				layer(
					r#"
					[listener]
					endpoint = "10.1.1.1:10002"
					"#,
				),
			)),
			Box::new(Fixed(
				Precedence::ConfigFile,
				layer(
					r#"
					component = "arpd"
					[listener]
					endpoint = "10.0.0.1:10002"
					enabled = false
					"#,
				),
			)),
		])
		.unwrap();

		assert_eq!(config.component, "arpd");
		assert_eq!(config.listener.endpoint, "10.1.1.1:10002");
		assert!(!config.listener.enabled);
	}

	#[test]
	fn test_load_with_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
component = "ospfd"

[sink]
kind = "memory"
"#
		)
		.unwrap();
		let config = load_config_with_file(file.path()).unwrap();
		assert_eq!(config.component, "ospfd");
		assert_eq!(config.sink.kind, SinkKind::Memory);
	}
}
