// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sink that forwards accepted messages to the host's `tracing` subscriber.

use loglever_core::{SeverityLevel, Sink, SinkError};
use tracing::{debug, error, info, trace, warn};

pub struct TracingSink {
	tag: String,
}

impl TracingSink {
	pub fn new(tag: impl Into<String>) -> Self {
		Self { tag: tag.into() }
	}
}

impl Sink for TracingSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn write(&self, severity: SeverityLevel, message: &str) -> Result<(), SinkError> {
		let tag = self.tag.as_str();
		match severity {
			SeverityLevel::Emergency
			| SeverityLevel::Alert
			| SeverityLevel::Critical
			| SeverityLevel::Error => error!(target: "loglever", tag, %severity, "{message}"),
			SeverityLevel::Warning => warn!(target: "loglever", tag, %severity, "{message}"),
			SeverityLevel::Notice | SeverityLevel::Info => {
				info!(target: "loglever", tag, %severity, "{message}")
			}
			SeverityLevel::Debug => debug!(target: "loglever", tag, %severity, "{message}"),
			SeverityLevel::Trace => trace!(target: "loglever", tag, %severity, "{message}"),
		}
		Ok(())
	}

	fn write_raw(&self, bytes: &[u8]) -> Result<usize, SinkError> {
		let text = String::from_utf8_lossy(bytes);
		info!(target: "loglever", tag = self.tag.as_str(), raw = true, "{}", text.trim_end_matches('\n'));
		Ok(bytes.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_writes_succeed_without_subscriber() {
		let sink = TracingSink::new("arpd");
		for level in SeverityLevel::ALL {
			sink.write(level, "message").unwrap();
		}
		assert_eq!(sink.write_raw(b"raw\n").unwrap(), 4);
		sink.close().unwrap();
	}
}
