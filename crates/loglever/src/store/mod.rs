// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read access to the persisted logging configuration.
//!
//! The facade reads two tables once at startup: the global logging switch and
//! the per-component thresholds. Rows come back in the store's iteration
//! order, which decides the winner when a component has more than one row.

use async_trait::async_trait;
use loglever_core::Record;

use crate::error::StoreError;

pub mod memory;
#[cfg(feature = "store-sqlite")]
pub mod sqlite;
pub mod toml_file;

pub use memory::MemoryStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteStore;
pub use toml_file::TomlStore;

/// Table holding the global logging switch.
pub const GLOBAL_LOGGING_TABLE: &str = "system_logging";
/// Table holding per-component thresholds.
pub const COMPONENT_LOGGING_TABLE: &str = "component_logging";

/// A store the bootstrapper can open a short-lived connection to.
#[async_trait]
pub trait ConfigStore: Send + Sync {
	fn name(&self) -> &str;

	async fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError>;
}

/// An open connection. Closed as soon as bootstrap has read both tables.
#[async_trait]
pub trait StoreConnection: Send {
	async fn global_logging_records(&mut self) -> Result<Vec<Record>, StoreError>;

	async fn component_logging_records(&mut self) -> Result<Vec<Record>, StoreError>;

	async fn close(self: Box<Self>) -> Result<(), StoreError>;
}
