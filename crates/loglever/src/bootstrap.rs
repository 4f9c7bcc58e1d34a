// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One-shot read of initial gate settings from the persisted store.
//!
//! Bootstrap never fails: an unreachable store, a failed query or a malformed
//! row leaves the affected setting at its default (`global_enabled = true`,
//! `threshold = info`) and is reported back as a warning.

use loglever_core::{
	ComponentThresholdRecord, GateSettings, GlobalLoggingRecord, Record, SeverityLevel,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::BootstrapError;
use crate::store::{ConfigStore, COMPONENT_LOGGING_TABLE, GLOBAL_LOGGING_TABLE};

/// How the persisted global switch is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalFlagPolicy {
	/// The first row decides: `"on"` enables, `"off"` disables.
	#[default]
	Honor,
	/// Only an `"on"` row has any effect, so the store can confirm the
	/// enabled default but never turn logging off.
	ConfirmOnly,
}

/// Initial settings plus everything that went wrong reading them.
#[derive(Debug, Default)]
pub struct BootstrapReport {
	pub settings: GateSettings,
	pub warnings: Vec<BootstrapError>,
}

impl BootstrapReport {
	pub fn is_clean(&self) -> bool {
		self.warnings.is_empty()
	}
}

/// Reads the global switch and this component's threshold from `store`.
pub async fn bootstrap(
	store: &dyn ConfigStore,
	component: &str,
	policy: GlobalFlagPolicy,
) -> BootstrapReport {
	let mut report = BootstrapReport::default();

	let mut conn = match store.connect().await {
		Ok(conn) => conn,
		Err(e) => {
			warn!(store = store.name(), component, error = %e, "logging config store unreachable, using defaults");
			report.warnings.push(BootstrapError::StoreUnreachable(e));
			return report;
		}
	};

	debug!(store = store.name(), component, "reading global logging config");
	match conn.global_logging_records().await {
		Ok(rows) => {
			if let Some(enabled) = resolve_global(&rows, policy, &mut report.warnings) {
				report.settings.global_enabled = enabled;
			}
		}
		Err(source) => {
			warn!(component, error = %source, "global logging query failed");
			report.warnings.push(BootstrapError::QueryFailed {
				table: GLOBAL_LOGGING_TABLE,
				source,
			});
		}
	}

	debug!(store = store.name(), component, "reading component logging config");
	match conn.component_logging_records().await {
		Ok(rows) => {
			if let Some(level) = resolve_threshold(&rows, component, &mut report.warnings) {
				report.settings.threshold = level;
			}
		}
		Err(source) => {
			warn!(component, error = %source, "component logging query failed");
			report.warnings.push(BootstrapError::QueryFailed {
				table: COMPONENT_LOGGING_TABLE,
				source,
			});
		}
	}

	if let Err(e) = conn.close().await {
		warn!(component, error = %e, "failed to close logging config store connection");
	}

	info!(
		component,
		global_enabled = report.settings.global_enabled,
		level = %report.settings.threshold,
		warnings = report.warnings.len(),
		"logging config bootstrapped"
	);
	report
}

fn resolve_global(
	rows: &[Record],
	policy: GlobalFlagPolicy,
	warnings: &mut Vec<BootstrapError>,
) -> Option<bool> {
	let mut records = Vec::with_capacity(rows.len());
	for row in rows {
		match GlobalLoggingRecord::try_from(row) {
			Ok(record) => records.push(record),
			Err(e) => {
				warn!(error = %e, "skipping malformed global logging record");
				warnings.push(BootstrapError::MalformedRecord(e));
			}
		}
	}

	match policy {
		GlobalFlagPolicy::Honor => {
			let record = records.first()?;
			let switch = record.switch();
			if switch.is_none() {
				warn!(value = %record.logging, "unrecognised global logging value");
				warnings.push(BootstrapError::MalformedValue {
					table: GLOBAL_LOGGING_TABLE,
					field: "logging",
					value: record.logging.clone(),
				});
			}
			switch
		}
		GlobalFlagPolicy::ConfirmOnly => records
			.iter()
			.any(|r| r.switch() == Some(true))
			.then_some(true),
	}
}

fn resolve_threshold(
	rows: &[Record],
	component: &str,
	warnings: &mut Vec<BootstrapError>,
) -> Option<SeverityLevel> {
	for row in rows {
		let record = match ComponentThresholdRecord::try_from(row) {
			Ok(record) => record,
			Err(e) => {
				warn!(error = %e, "skipping malformed component logging record");
				warnings.push(BootstrapError::MalformedRecord(e));
				continue;
			}
		};
		if record.module != component {
			continue;
		}
		// First match wins, even if its level is unusable.
		return match record.level.parse::<SeverityLevel>() {
			Ok(level) => Some(level),
			Err(_) => {
				warn!(component, value = %record.level, "unrecognised logging level, keeping default");
				warnings.push(BootstrapError::MalformedValue {
					table: COMPONENT_LOGGING_TABLE,
					field: "level",
					value: record.level,
				});
				None
			}
		};
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;

	#[tokio::test]
	async fn test_empty_store_keeps_defaults() {
		let store = MemoryStore::new();
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert_eq!(report.settings, GateSettings::default());
		assert_eq!(report.settings.threshold, SeverityLevel::Info);
		assert!(report.is_clean());
		assert_eq!(store.open_connections(), 0);
	}

	#[tokio::test]
	async fn test_unreachable_store_keeps_defaults() {
		let store = MemoryStore::new()
			.with_component(ComponentThresholdRecord::new("arpd", "debug"))
			.unreachable();
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert_eq!(report.settings, GateSettings::default());
		assert!(matches!(
			report.warnings.as_slice(),
			[BootstrapError::StoreUnreachable(_)]
		));
	}

	#[tokio::test]
	async fn test_matching_component_sets_threshold() {
		let store = MemoryStore::new()
			.with_component(ComponentThresholdRecord::new("bgpd", "crit"))
			.with_component(ComponentThresholdRecord::new("arpd", "debug"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert_eq!(report.settings.threshold, SeverityLevel::Debug);
		assert!(report.is_clean());
	}

	#[tokio::test]
	async fn test_other_component_has_no_effect() {
		let store =
			MemoryStore::new().with_component(ComponentThresholdRecord::new("bgpd", "debug"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert_eq!(report.settings.threshold, SeverityLevel::Info);
	}

	#[tokio::test]
	async fn test_first_match_wins() {
		let store = MemoryStore::new()
			.with_component(ComponentThresholdRecord::new("arpd", "err"))
			.with_component(ComponentThresholdRecord::new("arpd", "trace"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert_eq!(report.settings.threshold, SeverityLevel::Error);
	}

	#[tokio::test]
	async fn test_bad_level_on_first_match_keeps_default() {
		let store = MemoryStore::new()
			.with_component(ComponentThresholdRecord::new("arpd", "chatty"))
			.with_component(ComponentThresholdRecord::new("arpd", "debug"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert_eq!(report.settings.threshold, SeverityLevel::Info);
		assert!(matches!(
			report.warnings.as_slice(),
			[BootstrapError::MalformedValue { field: "level", .. }]
		));
	}

	#[tokio::test]
	async fn test_malformed_rows_are_skipped() {
		let row = Record::from([("level".to_string(), "crit".to_string())]);
		let store = MemoryStore::new()
			.with_component_row(row)
			.with_component(ComponentThresholdRecord::new("arpd", "notice"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert_eq!(report.settings.threshold, SeverityLevel::Notice);
		assert!(matches!(
			report.warnings.as_slice(),
			[BootstrapError::MalformedRecord(_)]
		));
	}

	#[tokio::test]
	async fn test_honor_policy_reads_off() {
		let store = MemoryStore::new().with_global(GlobalLoggingRecord::new("off"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert!(!report.settings.global_enabled);

		let store = MemoryStore::new().with_global(GlobalLoggingRecord::new("on"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert!(report.settings.global_enabled);
	}

	#[tokio::test]
	async fn test_honor_policy_unknown_value_keeps_default() {
		let store = MemoryStore::new().with_global(GlobalLoggingRecord::new("sometimes"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert!(report.settings.global_enabled);
		assert_eq!(report.warnings.len(), 1);
	}

	#[tokio::test]
	async fn test_confirm_only_policy_ignores_off() {
		let store = MemoryStore::new().with_global(GlobalLoggingRecord::new("off"));
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::ConfirmOnly).await;
		assert!(report.settings.global_enabled);
		assert!(report.is_clean());
	}

	#[tokio::test]
	async fn test_failed_query_does_not_stop_other_step() {
		let store = MemoryStore::new()
			.with_global(GlobalLoggingRecord::new("off"))
			.with_component(ComponentThresholdRecord::new("arpd", "warn"))
			.failing_table(GLOBAL_LOGGING_TABLE);
		let report = bootstrap(&store, "arpd", GlobalFlagPolicy::Honor).await;
		assert!(report.settings.global_enabled);
		assert_eq!(report.settings.threshold, SeverityLevel::Warning);
		assert!(matches!(
			report.warnings.as_slice(),
			[BootstrapError::QueryFailed {
				table: GLOBAL_LOGGING_TABLE,
				..
			}]
		));
		assert_eq!(store.open_connections(), 0);
	}

	#[test]
	fn test_policy_serde() {
		let policy: GlobalFlagPolicy = serde_json::from_str(r#""confirm-only""#).unwrap();
		assert_eq!(policy, GlobalFlagPolicy::ConfirmOnly);
		assert_eq!(GlobalFlagPolicy::default(), GlobalFlagPolicy::Honor);
	}
}
