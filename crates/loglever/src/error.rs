// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loglever_core::{RecordError, SinkError};
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Errors surfaced while building or shutting down a [`crate::Logger`].
#[derive(Error, Debug)]
pub enum LoggerError {
	/// The downstream sink could not be opened. The facade is unusable.
	#[error("failed to acquire sink: {0}")]
	SinkAcquisition(#[source] SinkError),

	#[error("sink error: {0}")]
	Sink(#[from] SinkError),

	#[error("invalid logger configuration: {0}")]
	Config(#[from] ConfigError),
}

/// Errors from the persisted logging configuration store.
#[derive(Error, Debug)]
pub enum StoreError {
	#[error("store unreachable: {0}")]
	Unreachable(String),

	#[error("store query failed: {0}")]
	Query(String),
}

/// A non-fatal problem found while reading initial state from the store.
///
/// Every variant leaves the affected setting at its default.
#[derive(Error, Debug)]
pub enum BootstrapError {
	#[error("could not open configuration store: {0}")]
	StoreUnreachable(#[source] StoreError),

	#[error("failed to read {table} records: {source}")]
	QueryFailed {
		table: &'static str,
		#[source]
		source: StoreError,
	},

	#[error("malformed record: {0}")]
	MalformedRecord(#[from] RecordError),

	#[error("malformed {field} value '{value}' in {table} record")]
	MalformedValue {
		table: &'static str,
		field: &'static str,
		value: String,
	},
}

/// Errors from the broadcast notification transport.
#[derive(Error, Debug)]
pub enum TransportError {
	/// The subscription could not be established. Live reconfiguration is
	/// unavailable for this process.
	#[error("failed to subscribe to {endpoint}: {message}")]
	Subscribe { endpoint: String, message: String },

	/// A single receive failed; the next receive may succeed.
	#[error("receive failed: {0}")]
	Receive(String),

	/// The publishing side is gone for good.
	#[error("transport closed")]
	Closed,
}

impl TransportError {
	pub fn is_transient(&self) -> bool {
		matches!(self, TransportError::Receive(_))
	}
}
