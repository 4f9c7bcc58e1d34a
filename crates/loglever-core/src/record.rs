// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rows read from the persisted logging configuration.
//!
//! A store hands back flat `field -> string` rows; these types give the two
//! tables this facade reads a typed shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// A raw store row.
pub type Record = BTreeMap<String, String>;

/// Singleton row holding the fleet-wide logging switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalLoggingRecord {
	/// `"on"` or `"off"`.
	pub logging: String,
}

impl GlobalLoggingRecord {
	pub fn new(logging: impl Into<String>) -> Self {
		Self {
			logging: logging.into(),
		}
	}

	/// `Some(true)` for `"on"`, `Some(false)` for `"off"`, `None` otherwise.
	pub fn switch(&self) -> Option<bool> {
		match self.logging.trim() {
			s if s.eq_ignore_ascii_case("on") => Some(true),
			s if s.eq_ignore_ascii_case("off") => Some(false),
			_ => None,
		}
	}

	pub fn to_record(&self) -> Record {
		Record::from([("logging".to_string(), self.logging.clone())])
	}
}

impl TryFrom<&Record> for GlobalLoggingRecord {
	type Error = RecordError;

	fn try_from(row: &Record) -> Result<Self, Self::Error> {
		let logging = row.get("logging").ok_or(RecordError {
			record: "global logging",
			field: "logging",
		})?;
		Ok(Self::new(logging.clone()))
	}
}

/// One row per component: its configured threshold, as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentThresholdRecord {
	pub module: String,
	pub level: String,
}

impl ComponentThresholdRecord {
	pub fn new(module: impl Into<String>, level: impl Into<String>) -> Self {
		Self {
			module: module.into(),
			level: level.into(),
		}
	}

	pub fn to_record(&self) -> Record {
		Record::from([
			("module".to_string(), self.module.clone()),
			("level".to_string(), self.level.clone()),
		])
	}
}

impl TryFrom<&Record> for ComponentThresholdRecord {
	type Error = RecordError;

	fn try_from(row: &Record) -> Result<Self, Self::Error> {
		let module = row.get("module").ok_or(RecordError {
			record: "component logging",
			field: "module",
		})?;
		let level = row.get("level").ok_or(RecordError {
			record: "component logging",
			field: "level",
		})?;
		Ok(Self::new(module.clone(), level.clone()))
	}
}
