// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Severity levels, ordered from least to most verbose.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseLevelError;

/// A log severity.
///
/// The discriminant is the verbosity rank: `Emergency` is the least verbose and
/// `Trace` the most. A threshold at some rank admits every level whose rank
/// is less than or equal to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum SeverityLevel {
	Emergency = 0,
	Alert = 1,
	Critical = 2,
	Error = 3,
	Warning = 4,
	Notice = 5,
	#[default]
	Info = 6,
	Debug = 7,
	Trace = 8,
}

impl SeverityLevel {
	/// All levels in rank order.
	pub const ALL: [SeverityLevel; 9] = [
		SeverityLevel::Emergency,
		SeverityLevel::Alert,
		SeverityLevel::Critical,
		SeverityLevel::Error,
		SeverityLevel::Warning,
		SeverityLevel::Notice,
		SeverityLevel::Info,
		SeverityLevel::Debug,
		SeverityLevel::Trace,
	];

	/// The most verbose level.
	pub const MAX: SeverityLevel = SeverityLevel::Trace;

	pub fn rank(self) -> u8 {
		self as u8
	}

	pub fn from_rank(rank: u8) -> Option<Self> {
		Self::ALL.get(rank as usize).copied()
	}

	pub fn as_str(self) -> &'static str {
		match self {
			SeverityLevel::Emergency => "emerg",
			SeverityLevel::Alert => "alert",
			SeverityLevel::Critical => "crit",
			SeverityLevel::Error => "err",
			SeverityLevel::Warning => "warn",
			SeverityLevel::Notice => "notice",
			SeverityLevel::Info => "info",
			SeverityLevel::Debug => "debug",
			SeverityLevel::Trace => "trace",
		}
	}

	/// Syslog severity code (RFC 5424 section 6.2.1). Syslog has no trace
	/// severity, so trace shares debug's code.
	pub fn syslog_code(self) -> u8 {
		match self {
			SeverityLevel::Trace => 7,
			other => other.rank(),
		}
	}

	/// Whether a gate whose threshold is `self` admits a message at `level`.
	pub fn admits(self, level: SeverityLevel) -> bool {
		self >= level
	}
}

impl fmt::Display for SeverityLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SeverityLevel {
	type Err = ParseLevelError;

	fn from_str(s: &str) -> Result<Self, ParseLevelError> {
		let trimmed = s.trim();
		Self::ALL
			.iter()
			.copied()
			.find(|level| level.as_str().eq_ignore_ascii_case(trimmed))
			.ok_or_else(|| ParseLevelError(s.to_string()))
	}
}

impl Serialize for SeverityLevel {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for SeverityLevel {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_ordering_least_to_most_verbose() {
		for pair in SeverityLevel::ALL.windows(2) {
			assert!(pair[0] < pair[1], "{} should rank below {}", pair[0], pair[1]);
		}
		assert_eq!(SeverityLevel::MAX, SeverityLevel::Trace);
	}

	#[test]
	fn test_default_is_info() {
		assert_eq!(SeverityLevel::default(), SeverityLevel::Info);
	}

	#[test]
	fn test_parse_names() {
		assert_eq!("crit".parse::<SeverityLevel>().unwrap(), SeverityLevel::Critical);
		assert_eq!("err".parse::<SeverityLevel>().unwrap(), SeverityLevel::Error);
		assert_eq!("WARN".parse::<SeverityLevel>().unwrap(), SeverityLevel::Warning);
		assert_eq!(" debug ".parse::<SeverityLevel>().unwrap(), SeverityLevel::Debug);
		assert!("warning".parse::<SeverityLevel>().is_err());
		assert!("".parse::<SeverityLevel>().is_err());
	}

	#[test]
	fn test_syslog_codes() {
		assert_eq!(SeverityLevel::Emergency.syslog_code(), 0);
		assert_eq!(SeverityLevel::Error.syslog_code(), 3);
		assert_eq!(SeverityLevel::Info.syslog_code(), 6);
		assert_eq!(SeverityLevel::Debug.syslog_code(), 7);
		assert_eq!(SeverityLevel::Trace.syslog_code(), 7);
	}

	#[test]
	fn test_serde_uses_lowercase_names() {
		let json = serde_json::to_string(&SeverityLevel::Notice).unwrap();
		assert_eq!(json, r#""notice""#);
		let level: SeverityLevel = serde_json::from_str(r#""Alert""#).unwrap();
		assert_eq!(level, SeverityLevel::Alert);
		assert!(serde_json::from_str::<SeverityLevel>(r#""loud""#).is_err());
	}

	proptest! {
		#[test]
		fn display_parse_is_identity(rank in 0u8..9) {
			let level = SeverityLevel::from_rank(rank).unwrap();
			prop_assert_eq!(level.to_string().parse::<SeverityLevel>().unwrap(), level);
		}

		#[test]
		fn admits_matches_rank_comparison(threshold in 0u8..9, level in 0u8..9) {
			let t = SeverityLevel::from_rank(threshold).unwrap();
			let l = SeverityLevel::from_rank(level).unwrap();
			prop_assert_eq!(t.admits(l), level <= threshold);
		}

		#[test]
		fn ranks_past_trace_are_rejected(rank in 9u8..) {
			prop_assert!(SeverityLevel::from_rank(rank).is_none());
		}
	}
}
