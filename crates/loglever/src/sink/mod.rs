// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Concrete sinks and construction from configuration.

pub mod syslog;
pub mod tracing_sink;

use std::sync::Arc;

use loglever_core::{MemorySink, SharedSink, SinkError};

use crate::config::{SinkConfig, SinkKind};

pub use syslog::SyslogSink;
pub use tracing_sink::TracingSink;

/// Opens the sink described by `config`, tagging its output with `tag`.
pub fn open_sink(config: &SinkConfig, tag: &str) -> Result<SharedSink, SinkError> {
	let sink: SharedSink = match config.kind {
		SinkKind::Syslog => Arc::new(SyslogSink::connect(&config.syslog, tag)?),
		SinkKind::Tracing => Arc::new(TracingSink::new(tag)),
		SinkKind::Memory => Arc::new(MemorySink::new()),
	};
	Ok(sink)
}
