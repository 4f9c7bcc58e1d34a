// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use loglever_core::{ComponentThresholdRecord, GlobalLoggingRecord, Record};
use parking_lot::RwLock;

use super::{ConfigStore, StoreConnection, COMPONENT_LOGGING_TABLE, GLOBAL_LOGGING_TABLE};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Tables {
	global: Vec<Record>,
	component: Vec<Record>,
	unreachable: bool,
	failing_tables: Vec<&'static str>,
}

/// In-process store, for tests and for hosts that already hold their
/// logging configuration.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	tables: Arc<RwLock<Tables>>,
	open_connections: Arc<AtomicUsize>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_global(self, record: GlobalLoggingRecord) -> Self {
		self.tables.write().global.push(record.to_record());
		self
	}

	pub fn with_component(self, record: ComponentThresholdRecord) -> Self {
		self.tables.write().component.push(record.to_record());
		self
	}

	/// Appends an arbitrary row to the component table.
	pub fn with_component_row(self, row: Record) -> Self {
		self.tables.write().component.push(row);
		self
	}

	/// Makes every `connect` fail.
	pub fn unreachable(self) -> Self {
		self.tables.write().unreachable = true;
		self
	}

	/// Makes queries against `table` fail.
	pub fn failing_table(self, table: &'static str) -> Self {
		self.tables.write().failing_tables.push(table);
		self
	}

	/// Number of connections opened and not yet closed.
	pub fn open_connections(&self) -> usize {
		self.open_connections.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ConfigStore for MemoryStore {
	fn name(&self) -> &str {
		"memory"
	}

	async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
		if self.tables.read().unreachable {
			return Err(StoreError::Unreachable("memory store marked unreachable".to_string()));
		}
		self.open_connections.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(MemoryConnection {
			tables: Arc::clone(&self.tables),
			open_connections: Arc::clone(&self.open_connections),
		}))
	}
}

struct MemoryConnection {
	tables: Arc<RwLock<Tables>>,
	open_connections: Arc<AtomicUsize>,
}

impl MemoryConnection {
	fn read(&self, table: &'static str) -> Result<Vec<Record>, StoreError> {
		let tables = self.tables.read();
		if tables.failing_tables.contains(&table) {
			return Err(StoreError::Query(format!("query against {table} failed")));
		}
		Ok(match table {
			GLOBAL_LOGGING_TABLE => tables.global.clone(),
			_ => tables.component.clone(),
		})
	}
}

#[async_trait]
impl StoreConnection for MemoryConnection {
	async fn global_logging_records(&mut self) -> Result<Vec<Record>, StoreError> {
		self.read(GLOBAL_LOGGING_TABLE)
	}

	async fn component_logging_records(&mut self) -> Result<Vec<Record>, StoreError> {
		self.read(COMPONENT_LOGGING_TABLE)
	}

	async fn close(self: Box<Self>) -> Result<(), StoreError> {
		self.open_connections.fetch_sub(1, Ordering::SeqCst);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_rows_come_back_in_insertion_order() {
		let store = MemoryStore::new()
			.with_component(ComponentThresholdRecord::new("a", "debug"))
			.with_component(ComponentThresholdRecord::new("b", "crit"));

		let mut conn = store.connect().await.unwrap();
		let rows = conn.component_logging_records().await.unwrap();
		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0].get("module").map(String::as_str), Some("a"));
		assert_eq!(rows[1].get("module").map(String::as_str), Some("b"));
		assert!(conn.global_logging_records().await.unwrap().is_empty());

		assert_eq!(store.open_connections(), 1);
		conn.close().await.unwrap();
		assert_eq!(store.open_connections(), 0);
	}

	#[tokio::test]
	async fn test_unreachable_store() {
		let store = MemoryStore::new().unreachable();
		assert!(matches!(
			store.connect().await,
			Err(StoreError::Unreachable(_))
		));
	}

	#[tokio::test]
	async fn test_failing_table() {
		let store = MemoryStore::new()
			.with_global(GlobalLoggingRecord::new("on"))
			.failing_table(GLOBAL_LOGGING_TABLE);
		let mut conn = store.connect().await.unwrap();
		assert!(matches!(
			conn.global_logging_records().await,
			Err(StoreError::Query(_))
		));
		assert!(conn.component_logging_records().await.is_ok());
	}
}
