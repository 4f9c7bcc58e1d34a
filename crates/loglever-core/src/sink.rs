// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The downstream facility that persists or displays accepted messages.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SinkError;
use crate::level::SeverityLevel;

/// Writes messages that passed the severity gate.
///
/// Implementations are called from arbitrary application threads and must
/// not block for long; the gate holds no lock across a write.
pub trait Sink: Send + Sync {
	fn name(&self) -> &str;

	/// Write a leveled message.
	fn write(&self, severity: SeverityLevel, message: &str) -> Result<(), SinkError>;

	/// Write raw diagnostic bytes at the sink's default priority.
	fn write_raw(&self, bytes: &[u8]) -> Result<usize, SinkError>;

	/// Release the underlying facility. Called at most once by the gate.
	fn close(&self) -> Result<(), SinkError> {
		Ok(())
	}
}

pub type SharedSink = Arc<dyn Sink>;

/// A record captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedMessage {
	Leveled {
		severity: SeverityLevel,
		message: String,
	},
	Raw(Vec<u8>),
}

/// Sink that keeps every accepted message in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
	messages: Arc<Mutex<Vec<CapturedMessage>>>,
	closed: Arc<Mutex<bool>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn messages(&self) -> Vec<CapturedMessage> {
		self.messages.lock().clone()
	}

	/// Leveled messages only, as `(severity, text)` pairs.
	pub fn leveled(&self) -> Vec<(SeverityLevel, String)> {
		self
			.messages
			.lock()
			.iter()
			.filter_map(|m| match m {
				CapturedMessage::Leveled { severity, message } => Some((*severity, message.clone())),
				CapturedMessage::Raw(_) => None,
			})
			.collect()
	}

	pub fn len(&self) -> usize {
		self.messages.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.lock().is_empty()
	}

	pub fn is_closed(&self) -> bool {
		*self.closed.lock()
	}

	pub fn clear(&self) {
		self.messages.lock().clear();
	}
}

impl Sink for MemorySink {
	fn name(&self) -> &str {
		"memory"
	}

	fn write(&self, severity: SeverityLevel, message: &str) -> Result<(), SinkError> {
		if self.is_closed() {
			return Err(SinkError::Closed);
		}
		self.messages.lock().push(CapturedMessage::Leveled {
			severity,
			message: message.to_string(),
		});
		Ok(())
	}

	fn write_raw(&self, bytes: &[u8]) -> Result<usize, SinkError> {
		if self.is_closed() {
			return Err(SinkError::Closed);
		}
		self.messages.lock().push(CapturedMessage::Raw(bytes.to_vec()));
		Ok(bytes.len())
	}

	fn close(&self) -> Result<(), SinkError> {
		*self.closed.lock() = true;
		Ok(())
	}
}
