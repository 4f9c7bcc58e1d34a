// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! TOML file store.
//!
//! ```toml
//! [[system_logging]]
//! logging = "on"
//!
//! [[component_logging]]
//! module = "arpd"
//! level = "debug"
//! ```
//!
//! Rows are returned in document order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use loglever_core::Record;
use tracing::debug;

use super::{ConfigStore, StoreConnection, COMPONENT_LOGGING_TABLE, GLOBAL_LOGGING_TABLE};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct TomlStore {
	path: PathBuf,
}

impl TomlStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

#[async_trait]
impl ConfigStore for TomlStore {
	fn name(&self) -> &str {
		"toml"
	}

	async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
		debug!(path = %self.path.display(), "opening logging config file");
		let content = tokio::fs::read_to_string(&self.path)
			.await
			.map_err(|e| StoreError::Unreachable(format!("{}: {e}", self.path.display())))?;
		let document: toml::Table = content
			.parse()
			.map_err(|e| StoreError::Unreachable(format!("{}: {e}", self.path.display())))?;
		Ok(Box::new(TomlConnection { document }))
	}
}

struct TomlConnection {
	document: toml::Table,
}

impl TomlConnection {
	fn rows(&self, table: &str) -> Result<Vec<Record>, StoreError> {
		let Some(value) = self.document.get(table) else {
			return Ok(Vec::new());
		};
		let entries = value
			.as_array()
			.ok_or_else(|| StoreError::Query(format!("{table} must be an array of tables")))?;

		entries
			.iter()
			.map(|entry| {
				let fields = entry
					.as_table()
					.ok_or_else(|| StoreError::Query(format!("{table} entries must be tables")))?;
				fields
					.iter()
					.map(|(key, value)| Ok((key.clone(), flatten_value(table, key, value)?)))
					.collect::<Result<Record, StoreError>>()
			})
			.collect()
	}
}

fn flatten_value(table: &str, key: &str, value: &toml::Value) -> Result<String, StoreError> {
	match value {
		toml::Value::String(s) => Ok(s.clone()),
		toml::Value::Integer(i) => Ok(i.to_string()),
		toml::Value::Boolean(b) => Ok(b.to_string()),
		toml::Value::Float(f) => Ok(f.to_string()),
		_ => Err(StoreError::Query(format!(
			"{table}.{key} must be a scalar value"
		))),
	}
}

#[async_trait]
impl StoreConnection for TomlConnection {
	async fn global_logging_records(&mut self) -> Result<Vec<Record>, StoreError> {
		self.rows(GLOBAL_LOGGING_TABLE)
	}

	async fn component_logging_records(&mut self) -> Result<Vec<Record>, StoreError> {
		self.rows(COMPONENT_LOGGING_TABLE)
	}

	async fn close(self: Box<Self>) -> Result<(), StoreError> {
		Ok(())
	}
}
