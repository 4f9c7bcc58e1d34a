// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Broadcast over TCP with length-delimited frames.
//!
//! Each frame is a 4-byte big-endian length followed by the payload. The
//! publisher fans every frame out to all connected subscribers; subscribers
//! redial after [`DEFAULT_RECONNECT_INTERVAL`] when the publisher goes away.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use super::{
	BroadcastTransport, Subscription, DEFAULT_ENDPOINT, DEFAULT_RECONNECT_INTERVAL,
	DEFAULT_RECV_BUFFER_BYTES,
};
use crate::error::TransportError;

/// Subscriber side of the TCP broadcast.
#[derive(Debug, Clone)]
pub struct TcpTransport {
	endpoint: String,
	recv_buffer_bytes: usize,
	reconnect_interval: Duration,
}

impl TcpTransport {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			recv_buffer_bytes: DEFAULT_RECV_BUFFER_BYTES,
			reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
		}
	}

	pub fn recv_buffer_bytes(mut self, bytes: usize) -> Self {
		self.recv_buffer_bytes = bytes;
		self
	}

	pub fn reconnect_interval(mut self, interval: Duration) -> Self {
		self.reconnect_interval = interval;
		self
	}

	fn subscribe_error(&self, message: impl std::fmt::Display) -> TransportError {
		TransportError::Subscribe {
			endpoint: self.endpoint.clone(),
			message: message.to_string(),
		}
	}
}

impl Default for TcpTransport {
	fn default() -> Self {
		Self::new(DEFAULT_ENDPOINT)
	}
}

fn codec(max_frame_length: usize) -> LengthDelimitedCodec {
	LengthDelimitedCodec::builder()
		.max_frame_length(max_frame_length)
		.new_codec()
}

async fn dial(addr: SocketAddr, recv_buffer_bytes: usize) -> std::io::Result<TcpStream> {
	let socket = if addr.is_ipv4() {
		TcpSocket::new_v4()?
	} else {
		TcpSocket::new_v6()?
	};
	socket.set_recv_buffer_size(u32::try_from(recv_buffer_bytes).unwrap_or(u32::MAX))?;
	socket.connect(addr).await
}

#[async_trait]
impl BroadcastTransport for TcpTransport {
	fn endpoint(&self) -> String {
		self.endpoint.clone()
	}

	async fn subscribe(&self) -> Result<Box<dyn Subscription>, TransportError> {
		let addr = tokio::net::lookup_host(&self.endpoint)
			.await
			.map_err(|e| self.subscribe_error(e))?
			.next()
			.ok_or_else(|| self.subscribe_error("endpoint resolved to no addresses"))?;

		let stream = dial(addr, self.recv_buffer_bytes)
			.await
			.map_err(|e| self.subscribe_error(e))?;
		info!(endpoint = %self.endpoint, "connected to notification publisher");

		Ok(Box::new(TcpSubscription {
			addr,
			recv_buffer_bytes: self.recv_buffer_bytes,
			reconnect_interval: self.reconnect_interval,
			frames: Some(FramedRead::new(stream, codec(self.recv_buffer_bytes))),
		}))
	}
}

struct TcpSubscription {
	addr: SocketAddr,
	recv_buffer_bytes: usize,
	reconnect_interval: Duration,
	frames: Option<FramedRead<TcpStream, LengthDelimitedCodec>>,
}

#[async_trait]
impl Subscription for TcpSubscription {
	async fn recv(&mut self) -> Result<Bytes, TransportError> {
		if self.frames.is_none() {
			tokio::time::sleep(self.reconnect_interval).await;
			let stream = dial(self.addr, self.recv_buffer_bytes)
				.await
				.map_err(|e| TransportError::Receive(format!("reconnect to {} failed: {e}", self.addr)))?;
			debug!(addr = %self.addr, "reconnected to notification publisher");
			self.frames = Some(FramedRead::new(stream, codec(self.recv_buffer_bytes)));
		}

		let Some(frames) = self.frames.as_mut() else {
			return Err(TransportError::Receive("not connected".to_string()));
		};

		match frames.next().await {
			Some(Ok(frame)) => Ok(frame.freeze()),
			Some(Err(e)) => {
				self.frames = None;
				Err(TransportError::Receive(e.to_string()))
			}
			None => {
				self.frames = None;
				Err(TransportError::Receive(
					"publisher closed the connection".to_string(),
				))
			}
		}
	}
}

/// Publisher side of the TCP broadcast.
pub struct TcpPublisher {
	local_addr: SocketAddr,
	sender: broadcast::Sender<Bytes>,
	subscribers: watch::Receiver<usize>,
	shutdown_tx: watch::Sender<bool>,
	accept_task: Option<JoinHandle<()>>,
}

impl TcpPublisher {
	/// Binds `addr` and starts accepting subscribers.
	pub async fn bind(addr: impl tokio::net::ToSocketAddrs) -> std::io::Result<Self> {
		let listener = TcpListener::bind(addr).await?;
		let local_addr = listener.local_addr()?;
		let (sender, _) = broadcast::channel(1024);
		let (count_tx, count_rx) = watch::channel(0usize);
		let (shutdown_tx, shutdown_rx) = watch::channel(false);

		let accept_task = tokio::spawn(accept_loop(
			listener,
			sender.clone(),
			count_tx,
			shutdown_rx,
		));
		info!(%local_addr, "notification publisher listening");

		Ok(Self {
			local_addr,
			sender,
			subscribers: count_rx,
			shutdown_tx,
			accept_task: Some(accept_task),
		})
	}

	pub fn local_addr(&self) -> SocketAddr {
		self.local_addr
	}

	/// Queues a frame for every connected subscriber. Returns how many
	/// subscribers it was queued for.
	pub fn publish(&self, frame: impl Into<Bytes>) -> usize {
		self.sender.send(frame.into()).unwrap_or(0)
	}

	pub fn subscriber_count(&self) -> usize {
		*self.subscribers.borrow()
	}

	/// Waits until at least `count` subscribers are connected.
	pub async fn wait_for_subscribers(&self, count: usize) {
		let mut rx = self.subscribers.clone();
		let _ = rx.wait_for(|n| *n >= count).await;
	}

	/// Stops accepting and disconnects every subscriber.
	pub async fn shutdown(&mut self) {
		let _ = self.shutdown_tx.send(true);
		if let Some(handle) = self.accept_task.take() {
			let _ = handle.await;
		}
	}
}

impl Drop for TcpPublisher {
	fn drop(&mut self) {
		let _ = self.shutdown_tx.send(true);
		if let Some(handle) = self.accept_task.take() {
			handle.abort();
		}
	}
}

async fn accept_loop(
	listener: TcpListener,
	sender: broadcast::Sender<Bytes>,
	count: watch::Sender<usize>,
	mut shutdown_rx: watch::Receiver<bool>,
) {
	loop {
		tokio::select! {
			biased;

			_ = shutdown_rx.changed() => {
				debug!("notification publisher shutting down");
				break;
			}

			accepted = listener.accept() => match accepted {
				Ok((stream, peer)) => {
					debug!(%peer, "subscriber connected");
					// Subscribe before the count moves so anyone waiting on the
					// count never publishes into a gap.
					let frames = sender.subscribe();
					count.send_modify(|n| *n += 1);
					tokio::spawn(serve_subscriber(
						stream,
						peer,
						frames,
						count.clone(),
						shutdown_rx.clone(),
					));
				}
				Err(e) => warn!(error = %e, "failed to accept subscriber"),
			}
		}
	}
}

async fn serve_subscriber(
	stream: TcpStream,
	peer: SocketAddr,
	mut frames: broadcast::Receiver<Bytes>,
	count: watch::Sender<usize>,
	mut shutdown_rx: watch::Receiver<bool>,
) {
	let mut writer = FramedWrite::new(stream, LengthDelimitedCodec::new());
	loop {
		tokio::select! {
			biased;

			_ = shutdown_rx.changed() => break,

			frame = frames.recv() => match frame {
				Ok(frame) => {
					if let Err(e) = writer.send(frame).await {
						debug!(%peer, error = %e, "subscriber write failed, dropping");
						break;
					}
				}
				Err(broadcast::error::RecvError::Lagged(skipped)) => {
					warn!(%peer, skipped, "subscriber lagging, frames dropped");
				}
				Err(broadcast::error::RecvError::Closed) => break,
			}
		}
	}
	count.send_modify(|n| *n = n.saturating_sub(1));
	debug!(%peer, "subscriber disconnected");
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_frames_reach_subscriber() {
		let publisher = TcpPublisher::bind("127.0.0.1:0").await.unwrap();
		let transport = TcpTransport::new(publisher.local_addr().to_string());
		let mut sub = transport.subscribe().await.unwrap();
		publisher.wait_for_subscribers(1).await;

		assert_eq!(publisher.publish(&b"one"[..]), 1);
		assert_eq!(publisher.publish(&b"two"[..]), 1);
		assert_eq!(sub.recv().await.unwrap(), Bytes::from_static(b"one"));
		assert_eq!(sub.recv().await.unwrap(), Bytes::from_static(b"two"));
	}

	#[tokio::test]
	async fn test_subscribe_fails_without_publisher() {
		let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);

		let transport = TcpTransport::new(addr.to_string());
		assert!(matches!(
			transport.subscribe().await,
			Err(TransportError::Subscribe { .. })
		));
	}

	#[tokio::test]
	async fn test_oversized_frame_is_transient_error() {
		let publisher = TcpPublisher::bind("127.0.0.1:0").await.unwrap();
		let transport = TcpTransport::new(publisher.local_addr().to_string())
			.recv_buffer_bytes(8)
			.reconnect_interval(Duration::from_millis(10));
		let mut sub = transport.subscribe().await.unwrap();
		publisher.wait_for_subscribers(1).await;

		publisher.publish(vec![0u8; 64]);
		let err = sub.recv().await.unwrap_err();
		assert!(err.is_transient());
	}

	#[tokio::test]
	async fn test_subscriber_reconnects_after_publisher_restart() {
		let mut publisher = TcpPublisher::bind("127.0.0.1:0").await.unwrap();
		let addr = publisher.local_addr();
		let transport =
			TcpTransport::new(addr.to_string()).reconnect_interval(Duration::from_millis(10));
		let mut sub = transport.subscribe().await.unwrap();
		publisher.wait_for_subscribers(1).await;

		publisher.shutdown().await;
		drop(publisher);
		assert!(sub.recv().await.unwrap_err().is_transient());

		let publisher = TcpPublisher::bind(addr).await.unwrap();
		let receiver = tokio::spawn(async move {
			loop {
				if let Ok(frame) = sub.recv().await {
					return frame;
				}
			}
		});
		publisher.wait_for_subscribers(1).await;
		publisher.publish(&b"again"[..]);
		let frame = tokio::time::timeout(Duration::from_secs(5), receiver)
			.await
			.unwrap()
			.unwrap();
		assert_eq!(frame, Bytes::from_static(b"again"));
	}
}
