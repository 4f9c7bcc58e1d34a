// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The logging facade handed to application code.

use std::sync::Arc;

use loglever_core::{GateSnapshot, SeverityGate, SeverityLevel, SharedSink, SinkError};
use tracing::{debug, info, warn};

use crate::bootstrap::{bootstrap, BootstrapReport, GlobalFlagPolicy};
use crate::config::{ConfigError, LoggerConfig, SinkConfig, StoreKind};
use crate::error::{BootstrapError, LoggerError, Result};
use crate::listener::{ListenerHandle, ReconfigurationListener};
use crate::sink::open_sink;
use crate::store::{ConfigStore, TomlStore};
use crate::transport::{BroadcastTransport, TcpTransport};

enum SinkSource {
	Ready(SharedSink),
	Config(SinkConfig),
}

/// Builder for constructing a [`Logger`].
pub struct LoggerBuilder {
	component: String,
	tag: Option<String>,
	sink: SinkSource,
	store: Option<Arc<dyn ConfigStore>>,
	policy: GlobalFlagPolicy,
	transport: Option<Arc<dyn BroadcastTransport>>,
}

impl LoggerBuilder {
	pub fn new(component: impl Into<String>) -> Self {
		Self {
			component: component.into(),
			tag: None,
			sink: SinkSource::Config(SinkConfig::default()),
			store: None,
			policy: GlobalFlagPolicy::default(),
			transport: None,
		}
	}

	/// Sets the name stamped on sink output. Defaults to the component name.
	pub fn tag(mut self, tag: impl Into<String>) -> Self {
		self.tag = Some(tag.into());
		self
	}

	/// Uses an already-open sink.
	pub fn sink(mut self, sink: SharedSink) -> Self {
		self.sink = SinkSource::Ready(sink);
		self
	}

	/// Opens the sink from configuration during [`LoggerBuilder::build`].
	pub fn sink_config(mut self, config: SinkConfig) -> Self {
		self.sink = SinkSource::Config(config);
		self
	}

	/// Reads initial settings from `store`. Without a store the gate starts
	/// from defaults.
	pub fn store(mut self, store: impl ConfigStore + 'static) -> Self {
		self.store = Some(Arc::new(store));
		self
	}

	pub fn global_flag_policy(mut self, policy: GlobalFlagPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Subscribes to reconfiguration notifications on `transport`.
	pub fn transport(mut self, transport: impl BroadcastTransport + 'static) -> Self {
		self.transport = Some(Arc::new(transport));
		self
	}

	/// Acquires the sink, bootstraps gate state and starts the listener, in
	/// that order. Only sink acquisition can fail; a listener that cannot
	/// subscribe terminates on its own without affecting the logger.
	pub async fn build(self) -> Result<Logger> {
		let tag = self.tag.unwrap_or_else(|| self.component.clone());
		let sink = match self.sink {
			SinkSource::Ready(sink) => sink,
			SinkSource::Config(config) => {
				open_sink(&config, &tag).map_err(LoggerError::SinkAcquisition)?
			}
		};
		debug!(component = %self.component, sink = sink.name(), "sink acquired");

		let report = match &self.store {
			Some(store) => bootstrap(store.as_ref(), &self.component, self.policy).await,
			None => BootstrapReport::default(),
		};

		let gate = Arc::new(SeverityGate::with_settings(
			self.component.as_str(),
			report.settings,
		));
		gate.mark_ready(sink);

		let listener = self
			.transport
			.map(|transport| ReconfigurationListener::spawn(gate.clone(), transport));

		info!(
			component = %self.component,
			global_enabled = report.settings.global_enabled,
			level = %report.settings.threshold,
			listening = listener.is_some(),
			"logger ready"
		);

		Ok(Logger {
			gate,
			listener,
			bootstrap_warnings: report.warnings,
		})
	}
}

/// Per-process logging facade: a severity gate in front of a sink, kept up
/// to date by an optional background listener.
pub struct Logger {
	gate: Arc<SeverityGate>,
	listener: Option<ListenerHandle>,
	bootstrap_warnings: Vec<BootstrapError>,
}

impl Logger {
	pub fn builder(component: impl Into<String>) -> LoggerBuilder {
		LoggerBuilder::new(component)
	}

	/// Assembles a logger from resolved configuration.
	pub async fn from_config(config: &LoggerConfig) -> Result<Logger> {
		let mut builder = LoggerBuilder::new(config.component.as_str())
			.tag(config.tag.as_str())
			.sink_config(config.sink.clone())
			.global_flag_policy(config.global_flag_policy);

		match config.store.kind {
			StoreKind::None => {}
			StoreKind::Toml => {
				let path = config.store.path.clone().ok_or_else(|| {
					ConfigError::Validation("store.path is required for a toml store".to_string())
				})?;
				builder = builder.store(TomlStore::new(path));
			}
			StoreKind::Sqlite => {
				let url = config.store.url.clone().ok_or_else(|| {
					ConfigError::Validation("store.url is required for a sqlite store".to_string())
				})?;
				builder = with_sqlite_store(builder, url)?;
			}
		}

		if config.listener.enabled {
			builder = builder.transport(
				TcpTransport::new(config.listener.endpoint.as_str())
					.recv_buffer_bytes(config.listener.recv_buffer_bytes)
					.reconnect_interval(config.reconnect_interval()),
			);
		}

		builder.build().await
	}

	/// A logger whose every call is a no-op, for hosts that carry on when the
	/// sink cannot be acquired.
	pub fn inert(component: impl Into<String>) -> Logger {
		Logger {
			gate: Arc::new(SeverityGate::new(component)),
			listener: None,
			bootstrap_warnings: Vec::new(),
		}
	}

	pub fn component(&self) -> &str {
		self.gate.component()
	}

	pub fn gate(&self) -> &Arc<SeverityGate> {
		&self.gate
	}

	pub fn listener(&self) -> Option<&ListenerHandle> {
		self.listener.as_ref()
	}

	/// Problems met while reading initial settings. Each one left the
	/// affected setting at its default.
	pub fn bootstrap_warnings(&self) -> &[BootstrapError] {
		&self.bootstrap_warnings
	}

	pub fn is_ready(&self) -> bool {
		self.gate.is_ready()
	}

	pub fn snapshot(&self) -> GateSnapshot {
		self.gate.snapshot()
	}

	pub fn set_global_enabled(&self, enabled: bool) {
		self.gate.set_global_enabled(enabled);
	}

	pub fn set_threshold(&self, level: SeverityLevel) {
		self.gate.set_threshold(level);
	}

	/// Emits `message` at `level` if the gate admits it. `Ok(false)` means it
	/// was filtered out.
	pub fn emit(&self, level: SeverityLevel, message: &str) -> std::result::Result<bool, SinkError> {
		self.gate.emit(level, message)
	}

	pub fn emerg(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Emergency, message)
	}

	pub fn alert(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Alert, message)
	}

	pub fn crit(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Critical, message)
	}

	pub fn err(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Error, message)
	}

	pub fn warning(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Warning, message)
	}

	pub fn notice(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Notice, message)
	}

	pub fn info(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Info, message)
	}

	pub fn debug(&self, message: &str) -> std::result::Result<bool, SinkError> {
		self.emit(SeverityLevel::Debug, message)
	}

	/// Writes raw bytes, only when the threshold is at its most verbose.
	/// Returns the number of bytes written, zero when filtered out.
	pub fn write_raw(&self, bytes: &[u8]) -> std::result::Result<usize, SinkError> {
		self.gate.write_raw(bytes)
	}

	/// Adapts the raw path to [`std::io::Write`], e.g. for redirecting a
	/// library's diagnostic output.
	pub fn raw_writer(&self) -> RawWriter<'_> {
		RawWriter { gate: &self.gate }
	}

	/// Releases the sink. Later calls emit nothing. The listener keeps
	/// running; use [`Logger::shutdown`] to stop both.
	pub fn close(&self) -> std::result::Result<(), SinkError> {
		self.gate.close()
	}

	/// Stops the listener, then releases the sink.
	pub async fn shutdown(&mut self) -> Result<()> {
		if let Some(mut listener) = self.listener.take() {
			listener.shutdown().await;
		}
		self.gate.close()?;
		Ok(())
	}
}

impl std::fmt::Debug for Logger {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Logger")
			.field("gate", &self.gate)
			.field("listener", &self.listener)
			.finish()
	}
}

#[cfg(feature = "store-sqlite")]
fn with_sqlite_store(builder: LoggerBuilder, url: String) -> Result<LoggerBuilder> {
	Ok(builder.store(crate::store::SqliteStore::new(url)))
}

#[cfg(not(feature = "store-sqlite"))]
fn with_sqlite_store(_builder: LoggerBuilder, _url: String) -> Result<LoggerBuilder> {
	Err(ConfigError::Validation(
		"sqlite store support requires the store-sqlite feature".to_string(),
	)
	.into())
}

/// [`std::io::Write`] over the gate's raw path.
///
/// Writes the gate filters out still report the whole buffer as consumed,
/// so callers don't retry them.
pub struct RawWriter<'a> {
	gate: &'a SeverityGate,
}

impl std::io::Write for RawWriter<'_> {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		match self.gate.write_raw(buf) {
			Ok(0) => Ok(buf.len()),
			Ok(n) => Ok(n),
			Err(SinkError::Write(e)) => Err(e),
			Err(e) => {
				warn!(component = self.gate.component(), error = %e, "raw write failed");
				Err(std::io::Error::other(e.to_string()))
			}
		}
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}
