// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process broadcast transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::broadcast;

use super::{BroadcastTransport, Subscription};
use crate::error::TransportError;

type Item = Result<Bytes, String>;

/// Publisher and transport in one, backed by a tokio broadcast channel.
#[derive(Clone)]
pub struct MemoryBroadcast {
	sender: broadcast::Sender<Item>,
	refuse_subscriptions: Arc<AtomicBool>,
}

impl MemoryBroadcast {
	/// `capacity` frames are buffered per subscriber before it starts lagging.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self {
			sender,
			refuse_subscriptions: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Publishes a frame, returning how many subscribers will see it.
	pub fn publish(&self, frame: impl Into<Bytes>) -> usize {
		self.sender.send(Ok(frame.into())).unwrap_or(0)
	}

	/// Makes every subscriber's next receive fail once.
	pub fn publish_receive_error(&self, message: impl Into<String>) -> usize {
		self.sender.send(Err(message.into())).unwrap_or(0)
	}

	pub fn subscriber_count(&self) -> usize {
		self.sender.receiver_count()
	}

	/// Makes further `subscribe` calls fail.
	pub fn refuse_subscriptions(&self) {
		self.refuse_subscriptions.store(true, Ordering::SeqCst);
	}
}

impl Default for MemoryBroadcast {
	fn default() -> Self {
		Self::new(1024)
	}
}

#[async_trait]
impl BroadcastTransport for MemoryBroadcast {
	fn endpoint(&self) -> String {
		"memory".to_string()
	}

	async fn subscribe(&self) -> Result<Box<dyn Subscription>, TransportError> {
		if self.refuse_subscriptions.load(Ordering::SeqCst) {
			return Err(TransportError::Subscribe {
				endpoint: self.endpoint(),
				message: "subscriptions refused".to_string(),
			});
		}
		Ok(Box::new(MemorySubscription {
			receiver: self.sender.subscribe(),
		}))
	}
}

struct MemorySubscription {
	receiver: broadcast::Receiver<Item>,
}

#[async_trait]
impl Subscription for MemorySubscription {
	async fn recv(&mut self) -> Result<Bytes, TransportError> {
		match self.receiver.recv().await {
			Ok(Ok(frame)) => Ok(frame),
			Ok(Err(message)) => Err(TransportError::Receive(message)),
			Err(broadcast::error::RecvError::Lagged(skipped)) => Err(TransportError::Receive(
				format!("subscriber lagged, {skipped} frames dropped"),
			)),
			Err(broadcast::error::RecvError::Closed) => Err(TransportError::Closed),
		}
	}
}
