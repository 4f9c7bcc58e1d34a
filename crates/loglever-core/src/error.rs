// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// A severity name that is not one of the nine known levels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity level '{0}'")]
pub struct ParseLevelError(pub String);

/// Failure decoding a reconfiguration notification frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	#[error("malformed notification: {0}")]
	Malformed(String),
}

/// Failure writing an accepted message to the downstream sink.
#[derive(Error, Debug)]
pub enum SinkError {
	#[error("failed to open sink: {0}")]
	Open(String),

	#[error("sink write failed: {0}")]
	Write(#[from] std::io::Error),

	#[error("sink is closed")]
	Closed,
}

/// A store row that does not have the fields its record type needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{record} record is missing field '{field}'")]
pub struct RecordError {
	pub record: &'static str,
	pub field: &'static str,
}
