// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Broadcast transports carrying reconfiguration notifications.
//!
//! Delivery is at-most-once and best effort: no acknowledgements, no replay.
//! A subscription receives every frame published after it was established;
//! there is no topic filtering.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;

pub mod memory;
pub mod tcp;

pub use memory::MemoryBroadcast;
pub use tcp::{TcpPublisher, TcpTransport};

/// Well-known address of the notification publisher.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:10002";

/// Socket receive buffer requested by subscribers. Also the largest frame a
/// TCP subscriber accepts.
pub const DEFAULT_RECV_BUFFER_BYTES: usize = 1024 * 1024;

/// Delay before a TCP subscriber redials a publisher that went away.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can hand out subscriptions to the notification stream.
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
	fn endpoint(&self) -> String;

	/// Establishes a subscription to every notification. Failure here is
	/// permanent for the listener that asked.
	async fn subscribe(&self) -> Result<Box<dyn Subscription>, TransportError>;
}

/// A live subscription.
#[async_trait]
pub trait Subscription: Send {
	/// Waits for the next frame. [`TransportError::Receive`] is transient and
	/// the caller may simply call again; [`TransportError::Closed`] is final.
	async fn recv(&mut self) -> Result<Bytes, TransportError>;
}
