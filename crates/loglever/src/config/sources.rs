// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files and environment.

use std::path::PathBuf;

use tracing::{debug, trace};

use super::error::ConfigError;
use super::layer::LoggerConfigLayer;
use super::sections::{
	ListenerConfigLayer, SinkConfigLayer, SinkKind, StoreConfigLayer, StoreKind, SyslogProtocol,
};
use crate::bootstrap::GlobalFlagPolicy;

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<LoggerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<LoggerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(LoggerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/loglever/loglever.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LoggerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LoggerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: LoggerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `LOGLEVER_<SECTION>_<FIELD>`, e.g. `LOGLEVER_SYSLOG_HOST`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LoggerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		load_from(&Env(|name: &str| std::env::var(name).ok()))
	}
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
	fn var(&self, name: &str) -> Option<String> {
		(self.0)(name).filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
		self.choice(
			name,
			&[("true", true), ("1", true), ("false", false), ("0", false)],
		)
	}

	fn parse<T: std::str::FromStr>(&self, name: &str, what: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid {what} value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn choice<T>(
		&self,
		name: &str,
		choices: &[(&str, T)],
	) -> Result<Option<T>, ConfigError>
	where
		T: Copy,
	{
		let Some(v) = self.var(name) else {
			return Ok(None);
		};
		choices
			.iter()
			.find(|(key, _)| v.eq_ignore_ascii_case(key))
			.map(|(_, value)| Some(*value))
			.ok_or_else(|| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!(
					"'{v}' is not one of {}",
					choices
						.iter()
						.map(|(key, _)| *key)
						.collect::<Vec<_>>()
						.join(", ")
				),
			})
	}
}

fn load_from<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<LoggerConfigLayer, ConfigError> {
	Ok(LoggerConfigLayer {
		component: env.var("LOGLEVER_COMPONENT"),
		tag: env.var("LOGLEVER_TAG"),
		global_flag_policy: env.choice(
			"LOGLEVER_GLOBAL_FLAG_POLICY",
			&[
				("honor", GlobalFlagPolicy::Honor),
				("confirm-only", GlobalFlagPolicy::ConfirmOnly),
			],
		)?,
		sink: Some(load_sink_from_env(env)?),
		store: Some(load_store_from_env(env)?),
		listener: Some(load_listener_from_env(env)?),
	})
}

fn load_sink_from_env<F: Fn(&str) -> Option<String>>(
	env: &Env<F>,
) -> Result<SinkConfigLayer, ConfigError> {
	Ok(SinkConfigLayer {
		kind: env.choice(
			"LOGLEVER_SINK_KIND",
			&[
				("syslog", SinkKind::Syslog),
				("tracing", SinkKind::Tracing),
				("memory", SinkKind::Memory),
			],
		)?,
		protocol: env.choice(
			"LOGLEVER_SYSLOG_PROTOCOL",
			&[
				("unix", SyslogProtocol::Unix),
				("udp", SyslogProtocol::Udp),
				("tcp", SyslogProtocol::Tcp),
			],
		)?,
		path: env.var("LOGLEVER_SYSLOG_PATH").map(PathBuf::from),
		host: env.var("LOGLEVER_SYSLOG_HOST"),
		port: env.parse("LOGLEVER_SYSLOG_PORT", "u16")?,
		facility: env.var("LOGLEVER_SYSLOG_FACILITY"),
	})
}

fn load_store_from_env<F: Fn(&str) -> Option<String>>(
	env: &Env<F>,
) -> Result<StoreConfigLayer, ConfigError> {
	Ok(StoreConfigLayer {
		kind: env.choice(
			"LOGLEVER_STORE_KIND",
			&[
				("none", StoreKind::None),
				("toml", StoreKind::Toml),
				("sqlite", StoreKind::Sqlite),
			],
		)?,
		path: env.var("LOGLEVER_STORE_PATH").map(PathBuf::from),
		url: env.var("LOGLEVER_STORE_URL"),
	})
}

fn load_listener_from_env<F: Fn(&str) -> Option<String>>(
	env: &Env<F>,
) -> Result<ListenerConfigLayer, ConfigError> {
	Ok(ListenerConfigLayer {
		enabled: env.bool("LOGLEVER_LISTENER_ENABLED")?,
		endpoint: env.var("LOGLEVER_LISTENER_ENDPOINT"),
		recv_buffer_bytes: env.parse("LOGLEVER_LISTENER_RECV_BUFFER_BYTES", "usize")?,
		reconnect_interval_ms: env.parse("LOGLEVER_LISTENER_RECONNECT_INTERVAL_MS", "u64")?,
	})
}
