// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Background consumer of reconfiguration notifications.
//!
//! Two tasks cooperate: the receive task owns the subscription and hands raw
//! frames over a rendezvous channel to the apply task, which decodes them and
//! mutates the gate. Frames are applied strictly in receipt order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use loglever_core::notification::decode;
use loglever_core::{ApplyOutcome, SeverityGate};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::handoff::{self, HandoffReceiver, HandoffSender};
use crate::transport::BroadcastTransport;

/// Lifecycle of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
	/// Not yet subscribed.
	Disconnected,
	/// Receiving and applying notifications.
	Subscribed,
	/// Subscribing failed or the transport closed for good. Gate state is
	/// left as it was.
	Terminated,
	/// Shut down on request.
	Stopped,
}

impl ListenerState {
	pub fn is_finished(self) -> bool {
		matches!(self, ListenerState::Terminated | ListenerState::Stopped)
	}
}

#[derive(Debug, Default)]
struct Counters {
	frames_received: AtomicU64,
	updates_applied: AtomicU64,
	updates_ignored: AtomicU64,
	decode_failures: AtomicU64,
	receive_errors: AtomicU64,
}

/// Point-in-time listener counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
	pub frames_received: u64,
	/// Notifications that changed this gate.
	pub updates_applied: u64,
	/// Well-formed notifications addressed elsewhere or of an unknown kind.
	pub updates_ignored: u64,
	pub decode_failures: u64,
	pub receive_errors: u64,
}

impl ListenerStats {
	/// Frames the apply task has finished with.
	pub fn frames_processed(&self) -> u64 {
		self.updates_applied + self.updates_ignored + self.decode_failures
	}
}

pub struct ReconfigurationListener;

impl ReconfigurationListener {
	/// Subscribes to `transport` in the background and applies every
	/// notification to `gate`. Must be called inside a tokio runtime.
	pub fn spawn(gate: Arc<SeverityGate>, transport: Arc<dyn BroadcastTransport>) -> ListenerHandle {
		let counters = Arc::new(Counters::default());
		let (state_tx, state_rx) = watch::channel(ListenerState::Disconnected);
		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let (frame_tx, frame_rx) = handoff::channel::<Bytes>();

		let apply_task = tokio::spawn(apply_loop(gate.clone(), frame_rx, counters.clone()));
		let receive_task = tokio::spawn(receive_loop(
			gate.component().to_string(),
			transport,
			frame_tx,
			state_tx,
			shutdown_rx,
			counters.clone(),
		));

		ListenerHandle {
			component: gate.component().to_string(),
			state: state_rx,
			counters,
			shutdown_tx,
			receive_task: Some(receive_task),
			apply_task: Some(apply_task),
		}
	}
}

/// Owner of a running listener. Dropping it aborts both tasks.
pub struct ListenerHandle {
	component: String,
	state: watch::Receiver<ListenerState>,
	counters: Arc<Counters>,
	shutdown_tx: watch::Sender<bool>,
	receive_task: Option<JoinHandle<()>>,
	apply_task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
	pub fn state(&self) -> ListenerState {
		*self.state.borrow()
	}

	/// Waits until the listener reaches `target`. Returns false if it finished
	/// in some other state first.
	pub async fn wait_for_state(&self, target: ListenerState) -> bool {
		let mut rx = self.state.clone();
		let reached = rx
			.wait_for(|s| *s == target || s.is_finished())
			.await
			.map(|state| *state == target);
		match reached {
			Ok(reached) => reached,
			Err(_) => *rx.borrow() == target,
		}
	}

	pub fn stats(&self) -> ListenerStats {
		ListenerStats {
			frames_received: self.counters.frames_received.load(Ordering::Relaxed),
			updates_applied: self.counters.updates_applied.load(Ordering::Relaxed),
			updates_ignored: self.counters.updates_ignored.load(Ordering::Relaxed),
			decode_failures: self.counters.decode_failures.load(Ordering::Relaxed),
			receive_errors: self.counters.receive_errors.load(Ordering::Relaxed),
		}
	}

	/// Stops receiving, lets the frame in flight finish applying, and waits
	/// for both tasks.
	pub async fn shutdown(&mut self) {
		let _ = self.shutdown_tx.send(true);
		if let Some(handle) = self.receive_task.take() {
			if let Err(e) = handle.await {
				warn!(component = %self.component, error = %e, "listener receive task failed");
			}
		}
		if let Some(handle) = self.apply_task.take() {
			if let Err(e) = handle.await {
				warn!(component = %self.component, error = %e, "listener apply task failed");
			}
		}
	}
}

impl std::fmt::Debug for ListenerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListenerHandle")
			.field("component", &self.component)
			.field("state", &self.state())
			.field("stats", &self.stats())
			.finish()
	}
}

impl Drop for ListenerHandle {
	fn drop(&mut self) {
		if let Some(handle) = self.receive_task.take() {
			handle.abort();
		}
		if let Some(handle) = self.apply_task.take() {
			handle.abort();
		}
	}
}

async fn receive_loop(
	component: String,
	transport: Arc<dyn BroadcastTransport>,
	frames: HandoffSender<Bytes>,
	state: watch::Sender<ListenerState>,
	mut shutdown_rx: watch::Receiver<bool>,
	counters: Arc<Counters>,
) {
	let endpoint = transport.endpoint();
	let subscribed = tokio::select! {
		biased;

		_ = shutdown_rx.changed() => {
			state.send_replace(ListenerState::Stopped);
			return;
		}

		result = transport.subscribe() => result,
	};
	// The subscription is all we need; the transport is not kept alive.
	drop(transport);

	let mut subscription = match subscribed {
		Ok(subscription) => subscription,
		Err(e) => {
			error!(%component, %endpoint, error = %e, "failed to subscribe to logging notifications, live reconfiguration disabled");
			state.send_replace(ListenerState::Terminated);
			return;
		}
	};
	info!(%component, %endpoint, "subscribed to logging notifications");
	state.send_replace(ListenerState::Subscribed);

	let final_state = loop {
		let received = tokio::select! {
			biased;

			_ = shutdown_rx.changed() => break ListenerState::Stopped,

			result = subscription.recv() => result,
		};

		match received {
			Ok(frame) => {
				counters.frames_received.fetch_add(1, Ordering::Relaxed);
				debug!(%component, bytes = frame.len(), "notification received");
				tokio::select! {
					biased;

					_ = shutdown_rx.changed() => break ListenerState::Stopped,

					sent = frames.send(frame) => {
						if sent.is_err() {
							error!(%component, "notification applier is gone");
							break ListenerState::Terminated;
						}
					}
				}
			}
			Err(e) if e.is_transient() => {
				counters.receive_errors.fetch_add(1, Ordering::Relaxed);
				warn!(%component, error = %e, "failed to receive logging notification");
			}
			Err(e) => {
				error!(%component, error = %e, "logging notification transport closed");
				break ListenerState::Terminated;
			}
		}
	};

	info!(%component, state = ?final_state, "logging notification listener finished");
	state.send_replace(final_state);
}

async fn apply_loop(
	gate: Arc<SeverityGate>,
	mut frames: HandoffReceiver<Bytes>,
	counters: Arc<Counters>,
) {
	while let Some(frame) = frames.recv().await {
		let update = match decode(&frame) {
			Ok(update) => update,
			Err(e) => {
				counters.decode_failures.fetch_add(1, Ordering::Relaxed);
				warn!(component = gate.component(), error = %e, "discarding malformed logging notification");
				continue;
			}
		};

		match gate.apply(&update) {
			ApplyOutcome::GlobalSet(_) | ApplyOutcome::ThresholdSet(_) => {
				counters.updates_applied.fetch_add(1, Ordering::Relaxed);
			}
			ApplyOutcome::OtherComponent => {
				counters.updates_ignored.fetch_add(1, Ordering::Relaxed);
			}
			ApplyOutcome::Ignored => {
				counters.updates_ignored.fetch_add(1, Ordering::Relaxed);
				debug!(component = gate.component(), "ignoring logging notification of unknown kind");
			}
		}
	}
}
