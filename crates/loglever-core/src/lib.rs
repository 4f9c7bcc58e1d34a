// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the loglever logging facade.
//!
//! This crate holds the pieces that need no async runtime:
//! - [`SeverityLevel`] - the nine ordered severities
//! - [`SeverityGate`] - the per-call emit decision and its live state
//! - [`Sink`] - the downstream facility accepted messages are written to
//! - [`notification`] - the reconfiguration wire format and its decoder
//! - [`record`] - typed views of persisted configuration rows
//!
//! The runtime side (store bootstrap, broadcast listener, syslog sink) lives
//! in the `loglever` crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use loglever_core::{MemorySink, SeverityGate, SeverityLevel};
//!
//! let sink = MemorySink::new();
//! let gate = SeverityGate::new("arpd");
//! gate.mark_ready(Arc::new(sink.clone()));
//!
//! assert!(gate.emit(SeverityLevel::Error, "link down").unwrap());
//! assert!(!gate.emit(SeverityLevel::Debug, "hello").unwrap());
//! assert_eq!(sink.len(), 1);
//! ```

pub mod error;
pub mod gate;
pub mod level;
pub mod notification;
pub mod record;
pub mod sink;

pub use error::{DecodeError, ParseLevelError, RecordError, SinkError};
pub use gate::{ApplyOutcome, GateSettings, GateSnapshot, SeverityGate};
pub use level::SeverityLevel;
pub use notification::{DecodedUpdate, NotificationEnvelope, NotificationKind};
pub use record::{ComponentThresholdRecord, GlobalLoggingRecord, Record};
pub use sink::{CapturedMessage, MemorySink, SharedSink, Sink};
