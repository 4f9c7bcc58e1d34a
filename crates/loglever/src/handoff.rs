// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A zero-capacity (rendezvous) channel.
//!
//! [`HandoffSender::send`] only completes once the receiving side has taken
//! the value, so the producer can never run ahead of the consumer by more
//! than the single item in flight. Tokio's mpsc has no capacity-zero mode;
//! this pairs a capacity-one channel with a per-item acknowledgement.

use tokio::sync::{mpsc, oneshot};

/// The receiving half was dropped before taking the value.
#[derive(Debug, PartialEq, Eq)]
pub struct HandoffClosed<T>(pub T);

impl<T> std::fmt::Display for HandoffClosed<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("hand-off receiver dropped")
	}
}

impl<T: std::fmt::Debug> std::error::Error for HandoffClosed<T> {}

pub struct HandoffSender<T> {
	tx: mpsc::Sender<(T, oneshot::Sender<()>)>,
}

pub struct HandoffReceiver<T> {
	rx: mpsc::Receiver<(T, oneshot::Sender<()>)>,
}

/// Creates a rendezvous channel.
pub fn channel<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
	let (tx, rx) = mpsc::channel(1);
	(HandoffSender { tx }, HandoffReceiver { rx })
}

impl<T> HandoffSender<T> {
	/// Waits until the receiver has taken `value`.
	pub async fn send(&self, value: T) -> Result<(), HandoffClosed<T>> {
		let (ack_tx, ack_rx) = oneshot::channel();
		if let Err(mpsc::error::SendError((value, _))) = self.tx.send((value, ack_tx)).await {
			return Err(HandoffClosed(value));
		}
		// The value is gone either way; a dropped receiver after acceptance
		// only means it was discarded with the channel.
		let _ = ack_rx.await;
		Ok(())
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

impl<T> HandoffReceiver<T> {
	/// Takes the next value, releasing its sender. `None` once every sender
	/// is gone.
	pub async fn recv(&mut self) -> Option<T> {
		let (value, ack) = self.rx.recv().await?;
		let _ = ack.send(());
		Some(value)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;
	use std::time::Duration;

	use super::*;

	#[tokio::test]
	async fn test_send_blocks_until_taken() {
		let (tx, mut rx) = channel::<u32>();
		let sent = Arc::new(AtomicUsize::new(0));
		let sent_clone = Arc::clone(&sent);

		let producer = tokio::spawn(async move {
			for i in 0..3 {
				tx.send(i).await.unwrap();
				sent_clone.fetch_add(1, Ordering::SeqCst);
			}
		});

		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(sent.load(Ordering::SeqCst), 0, "nothing taken yet");

		assert_eq!(rx.recv().await, Some(0));
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(sent.load(Ordering::SeqCst), 1);

		assert_eq!(rx.recv().await, Some(1));
		assert_eq!(rx.recv().await, Some(2));
		producer.await.unwrap();
		assert_eq!(sent.load(Ordering::SeqCst), 3);
		assert_eq!(rx.recv().await, None);
	}

	#[test]
	fn test_send_is_pending_until_received() {
		let (tx, mut rx) = channel::<u8>();
		let mut send = tokio_test::task::spawn(tx.send(7));
		tokio_test::assert_pending!(send.poll());

		let mut recv = tokio_test::task::spawn(rx.recv());
		assert_eq!(tokio_test::assert_ready!(recv.poll()), Some(7));
		drop(recv);

		assert!(send.is_woken());
		tokio_test::assert_ready_ok!(send.poll());
	}

	#[tokio::test]
	async fn test_send_after_receiver_dropped() {
		let (tx, rx) = channel::<&'static str>();
		drop(rx);
		assert!(tx.is_closed());
		assert_eq!(tx.send("late").await, Err(HandoffClosed("late")));
	}

	#[tokio::test]
	async fn test_preserves_order() {
		let (tx, mut rx) = channel::<usize>();
		let producer = tokio::spawn(async move {
			for i in 0..100 {
				tx.send(i).await.unwrap();
			}
		});
		let mut received = Vec::new();
		while let Some(v) = rx.recv().await {
			received.push(v);
		}
		producer.await.unwrap();
		assert_eq!(received, (0..100).collect::<Vec<_>>());
	}
}
