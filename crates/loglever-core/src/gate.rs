// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The per-call severity gate.
//!
//! Gate state is read on every log call and written by the bootstrapper and
//! the reconfiguration listener, so each field is stored atomically. The sink
//! slot sits behind a lock that is only held long enough to clone the handle.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::SinkError;
use crate::level::SeverityLevel;
use crate::notification::DecodedUpdate;
use crate::sink::SharedSink;

/// Enablement and threshold, without identity or readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSettings {
	pub global_enabled: bool,
	pub threshold: SeverityLevel,
}

impl Default for GateSettings {
	fn default() -> Self {
		Self {
			global_enabled: true,
			threshold: SeverityLevel::Info,
		}
	}
}

/// Point-in-time copy of the whole gate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSnapshot {
	pub component: String,
	pub global_enabled: bool,
	pub threshold: SeverityLevel,
	pub ready: bool,
}

/// What applying a decoded notification did to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
	GlobalSet(bool),
	ThresholdSet(SeverityLevel),
	/// A threshold change addressed to some other component.
	OtherComponent,
	Ignored,
}

pub struct SeverityGate {
	component: String,
	global_enabled: AtomicBool,
	threshold: AtomicU8,
	ready: AtomicBool,
	sink: RwLock<Option<SharedSink>>,
}

impl SeverityGate {
	/// Creates an inert gate with default settings. Nothing is emitted until a
	/// sink is attached with [`SeverityGate::mark_ready`].
	pub fn new(component: impl Into<String>) -> Self {
		Self::with_settings(component, GateSettings::default())
	}

	pub fn with_settings(component: impl Into<String>, settings: GateSettings) -> Self {
		Self {
			component: component.into(),
			global_enabled: AtomicBool::new(settings.global_enabled),
			threshold: AtomicU8::new(settings.threshold.rank()),
			ready: AtomicBool::new(false),
			sink: RwLock::new(None),
		}
	}

	pub fn component(&self) -> &str {
		&self.component
	}

	pub fn is_ready(&self) -> bool {
		self.ready.load(Ordering::Acquire)
	}

	pub fn global_enabled(&self) -> bool {
		self.global_enabled.load(Ordering::Acquire)
	}

	pub fn threshold(&self) -> SeverityLevel {
		// Only ever stored from a valid SeverityLevel.
		SeverityLevel::from_rank(self.threshold.load(Ordering::Acquire)).unwrap_or_default()
	}

	pub fn settings(&self) -> GateSettings {
		GateSettings {
			global_enabled: self.global_enabled(),
			threshold: self.threshold(),
		}
	}

	pub fn snapshot(&self) -> GateSnapshot {
		GateSnapshot {
			component: self.component.clone(),
			global_enabled: self.global_enabled(),
			threshold: self.threshold(),
			ready: self.is_ready(),
		}
	}

	/// Attaches the acquired sink and makes the gate live.
	pub fn mark_ready(&self, sink: SharedSink) {
		*self.sink.write() = Some(sink);
		self.ready.store(true, Ordering::Release);
	}

	pub fn set_global_enabled(&self, enabled: bool) {
		self.global_enabled.store(enabled, Ordering::Release);
		info!(component = %self.component, enabled, "global logging changed");
	}

	pub fn set_threshold(&self, level: SeverityLevel) {
		self.threshold.store(level.rank(), Ordering::Release);
		info!(component = %self.component, level = %level, "logging level changed");
	}

	/// Applies a decoded notification. Threshold changes for other
	/// components leave the gate untouched.
	pub fn apply(&self, update: &DecodedUpdate) -> ApplyOutcome {
		match update {
			DecodedUpdate::Global(enabled) => {
				self.set_global_enabled(*enabled);
				ApplyOutcome::GlobalSet(*enabled)
			}
			DecodedUpdate::Component { name, level } if *name == self.component => {
				self.set_threshold(*level);
				ApplyOutcome::ThresholdSet(*level)
			}
			DecodedUpdate::Component { name, .. } => {
				debug!(component = %self.component, target_component = %name, "ignoring level change for another component");
				ApplyOutcome::OtherComponent
			}
			DecodedUpdate::Ignored => ApplyOutcome::Ignored,
		}
	}

	/// Whether a message at `level` would currently be emitted.
	pub fn admits(&self, level: SeverityLevel) -> bool {
		self.is_ready() && self.global_enabled() && self.threshold().admits(level)
	}

	/// Gates a leveled message. Returns `Ok(true)` when the sink took it and
	/// `Ok(false)` when the gate dropped it.
	pub fn emit(&self, level: SeverityLevel, message: &str) -> Result<bool, SinkError> {
		if !self.admits(level) {
			return Ok(false);
		}
		match self.current_sink() {
			Some(sink) => sink.write(level, message).map(|()| true),
			None => Ok(false),
		}
	}

	/// Gates raw diagnostic bytes. Only a gate at the most verbose threshold
	/// lets these through. Returns the number of bytes written, zero if dropped.
	pub fn write_raw(&self, bytes: &[u8]) -> Result<usize, SinkError> {
		if !(self.is_ready() && self.global_enabled() && self.threshold() == SeverityLevel::MAX) {
			return Ok(0);
		}
		match self.current_sink() {
			Some(sink) => sink.write_raw(bytes),
			None => Ok(0),
		}
	}

	/// Releases the sink and makes the gate inert. Closing a gate that was
	/// never ready, or closing twice, does nothing.
	pub fn close(&self) -> Result<(), SinkError> {
		self.ready.store(false, Ordering::Release);
		let sink = self.sink.write().take();
		match sink {
			Some(sink) => {
				debug!(component = %self.component, sink = sink.name(), "closing sink");
				sink.close()
			}
			None => Ok(()),
		}
	}

	fn current_sink(&self) -> Option<SharedSink> {
		self.sink.read().clone()
	}
}

impl std::fmt::Debug for SeverityGate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SeverityGate")
			.field("component", &self.component)
			.field("global_enabled", &self.global_enabled())
			.field("threshold", &self.threshold())
			.field("ready", &self.is_ready())
			.finish()
	}
}
