// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sink, store and listener configuration sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::transport::{DEFAULT_ENDPOINT, DEFAULT_RECONNECT_INTERVAL, DEFAULT_RECV_BUFFER_BYTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
	#[default]
	Syslog,
	/// Forward to the host's `tracing` subscriber.
	Tracing,
	/// Keep messages in memory (tests, dry runs).
	Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyslogProtocol {
	/// Local syslog daemon socket.
	#[default]
	Unix,
	Udp,
	Tcp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SinkConfigLayer {
	pub kind: Option<SinkKind>,
	pub protocol: Option<SyslogProtocol>,
	pub path: Option<PathBuf>,
	pub host: Option<String>,
	pub port: Option<u16>,
	pub facility: Option<String>,
}

impl SinkConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.kind.is_some() {
			self.kind = other.kind;
		}
		if other.protocol.is_some() {
			self.protocol = other.protocol;
		}
		if other.path.is_some() {
			self.path = other.path;
		}
		if other.host.is_some() {
			self.host = other.host;
		}
		if other.port.is_some() {
			self.port = other.port;
		}
		if other.facility.is_some() {
			self.facility = other.facility;
		}
	}

	pub fn finalize(self) -> SinkConfig {
		SinkConfig {
			kind: self.kind.unwrap_or_default(),
			syslog: SyslogConfig {
				protocol: self.protocol.unwrap_or_default(),
				path: self.path.unwrap_or_else(|| PathBuf::from("/dev/log")),
				host: self.host.unwrap_or_else(|| "localhost".to_string()),
				port: self.port.unwrap_or(514),
				facility: self.facility.unwrap_or_else(|| "daemon".to_string()),
			},
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SinkConfig {
	pub kind: SinkKind,
	pub syslog: SyslogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyslogConfig {
	pub protocol: SyslogProtocol,
	/// Socket path for [`SyslogProtocol::Unix`].
	pub path: PathBuf,
	pub host: String,
	pub port: u16,
	pub facility: String,
}

impl Default for SyslogConfig {
	fn default() -> Self {
		SinkConfigLayer::default().finalize().syslog
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
	/// No persisted configuration; bootstrap yields defaults.
	#[default]
	None,
	Toml,
	Sqlite,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfigLayer {
	pub kind: Option<StoreKind>,
	pub path: Option<PathBuf>,
	pub url: Option<String>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.kind.is_some() {
			self.kind = other.kind;
		}
		if other.path.is_some() {
			self.path = other.path;
		}
		if other.url.is_some() {
			self.url = other.url;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			kind: self.kind.unwrap_or_default(),
			path: self.path,
			url: self.url,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
	pub kind: StoreKind,
	/// TOML store file.
	pub path: Option<PathBuf>,
	/// SQLite connection URL.
	pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListenerConfigLayer {
	pub enabled: Option<bool>,
	pub endpoint: Option<String>,
	pub recv_buffer_bytes: Option<usize>,
	pub reconnect_interval_ms: Option<u64>,
}

impl ListenerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.recv_buffer_bytes.is_some() {
			self.recv_buffer_bytes = other.recv_buffer_bytes;
		}
		if other.reconnect_interval_ms.is_some() {
			self.reconnect_interval_ms = other.reconnect_interval_ms;
		}
	}

	pub fn finalize(self) -> ListenerConfig {
		ListenerConfig {
			enabled: self.enabled.unwrap_or(true),
			endpoint: self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
			recv_buffer_bytes: self.recv_buffer_bytes.unwrap_or(DEFAULT_RECV_BUFFER_BYTES),
			reconnect_interval_ms: self
				.reconnect_interval_ms
				.unwrap_or(DEFAULT_RECONNECT_INTERVAL.as_millis() as u64),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenerConfig {
	pub enabled: bool,
	pub endpoint: String,
	pub recv_buffer_bytes: usize,
	pub reconnect_interval_ms: u64,
}

impl Default for ListenerConfig {
	fn default() -> Self {
		ListenerConfigLayer::default().finalize()
	}
}
