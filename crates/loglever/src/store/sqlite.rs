// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite store. Rows are returned in `rowid` order.

use async_trait::async_trait;
use loglever_core::Record;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::debug;

use super::{ConfigStore, StoreConnection};
use crate::error::StoreError;

const SCHEMA: [&str; 2] = [
	"CREATE TABLE IF NOT EXISTS system_logging (logging TEXT)",
	"CREATE TABLE IF NOT EXISTS component_logging (module TEXT, level TEXT)",
];

#[derive(Debug, Clone)]
pub struct SqliteStore {
	url: String,
}

impl SqliteStore {
	/// `url` is a sqlx SQLite URL, e.g. `sqlite:///var/lib/loglever/config.db`.
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// Creates both tables if they are missing.
	pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
		for statement in SCHEMA {
			sqlx::query(statement)
				.execute(pool)
				.await
				.map_err(|e| StoreError::Query(format!("failed to create schema: {e}")))?;
		}
		Ok(())
	}
}

#[async_trait]
impl ConfigStore for SqliteStore {
	fn name(&self) -> &str {
		"sqlite"
	}

	async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
		debug!(url = %self.url, "connecting to logging config database");
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect(&self.url)
			.await
			.map_err(|e| StoreError::Unreachable(e.to_string()))?;
		Ok(Box::new(SqliteConnection { pool }))
	}
}

struct SqliteConnection {
	pool: SqlitePool,
}

fn row_to_record(row: &SqliteRow, columns: &[&str]) -> Result<Record, StoreError> {
	let mut record = Record::new();
	for column in columns {
		let value: Option<String> = row
			.try_get(*column)
			.map_err(|e| StoreError::Query(format!("failed to read column {column}: {e}")))?;
		if let Some(value) = value {
			record.insert((*column).to_string(), value);
		}
	}
	Ok(record)
}

#[async_trait]
impl StoreConnection for SqliteConnection {
	async fn global_logging_records(&mut self) -> Result<Vec<Record>, StoreError> {
		let rows = sqlx::query("SELECT logging FROM system_logging ORDER BY rowid")
			.fetch_all(&self.pool)
			.await
			.map_err(|e| StoreError::Query(e.to_string()))?;
		rows.iter().map(|row| row_to_record(row, &["logging"])).collect()
	}

	async fn component_logging_records(&mut self) -> Result<Vec<Record>, StoreError> {
		let rows = sqlx::query("SELECT module, level FROM component_logging ORDER BY rowid")
			.fetch_all(&self.pool)
			.await
			.map_err(|e| StoreError::Query(e.to_string()))?;
		rows
			.iter()
			.map(|row| row_to_record(row, &["module", "level"]))
			.collect()
	}

	async fn close(self: Box<Self>) -> Result<(), StoreError> {
		self.pool.close().await;
		Ok(())
	}
}
