// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-process logging facade with live, remotely triggered reconfiguration.
//!
//! An operator can switch logging off everywhere, or change the verbosity of
//! one component, and every running process picks the change up without a
//! restart.
//!
//! Startup runs in a fixed order:
//! 1. acquire the sink (syslog, `tracing`, or in-memory)
//! 2. read initial settings once from the persisted store ([`bootstrap`])
//! 3. mark the gate ready
//! 4. optionally spawn a [`ReconfigurationListener`] on a broadcast transport
//!
//! # Usage
//!
//! ```ignore
//! use loglever::{Logger, TcpTransport, TomlStore};
//!
//! let logger = Logger::builder("arpd")
//!     .store(TomlStore::new("/etc/loglever/levels.toml"))
//!     .transport(TcpTransport::default())
//!     .build()
//!     .await?;
//!
//! logger.info("arp table loaded")?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handoff;
pub mod listener;
pub mod logger;
pub mod sink;
pub mod store;
pub mod transport;

pub use bootstrap::{bootstrap, BootstrapReport, GlobalFlagPolicy};
pub use config::{
	load_config, load_config_from_env, load_config_with_file, ConfigError, LoggerConfig,
};
pub use error::{BootstrapError, LoggerError, Result, StoreError, TransportError};
pub use listener::{ListenerHandle, ListenerState, ListenerStats, ReconfigurationListener};
pub use logger::{Logger, LoggerBuilder, RawWriter};
pub use sink::{open_sink, SyslogSink, TracingSink};
#[cfg(feature = "store-sqlite")]
pub use store::SqliteStore;
pub use store::{ConfigStore, MemoryStore, StoreConnection, TomlStore};
pub use transport::{
	BroadcastTransport, MemoryBroadcast, Subscription, TcpPublisher, TcpTransport,
};

pub use loglever_core::{
	notification, DecodedUpdate, GateSettings, GateSnapshot, MemorySink, SeverityGate,
	SeverityLevel, SharedSink, Sink, SinkError,
};
