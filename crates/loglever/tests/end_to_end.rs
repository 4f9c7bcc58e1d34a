// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loggers subscribed to a real TCP hub, driven the way an operator would.

use std::sync::Arc;
use std::time::Duration;

use loglever::notification::{encode_component, encode_global};
use loglever::{ListenerState, Logger, MemorySink, SeverityLevel, TcpPublisher, TcpTransport};

async fn hub() -> TcpPublisher {
	TcpPublisher::bind("127.0.0.1:0").await.unwrap()
}

async fn subscribed_logger(component: &str, hub: &TcpPublisher) -> (Logger, MemorySink) {
	let sink = MemorySink::new();
	let logger = Logger::builder(component)
		.sink(Arc::new(sink.clone()))
		.transport(TcpTransport::new(hub.local_addr().to_string()))
		.build()
		.await
		.unwrap();

	let listener = logger.listener().unwrap();
	assert!(listener.wait_for_state(ListenerState::Subscribed).await);
	(logger, sink)
}

async fn processed(logger: &Logger, frames: u64) {
	let listener = logger.listener().unwrap();
	tokio::time::timeout(Duration::from_secs(5), async {
		while listener.stats().frames_processed() < frames {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("frames were not processed in time");
}

#[tokio::test]
async fn test_global_disable_then_enable() {
	let mut hub = hub().await;
	let (mut logger, sink) = subscribed_logger("arpd", &hub).await;
	hub.wait_for_subscribers(1).await;

	assert!(logger.info("before").unwrap());

	hub.publish(encode_global(false));
	processed(&logger, 1).await;
	assert!(!logger.snapshot().global_enabled);
	assert!(!logger.emerg("suppressed").unwrap());

	hub.publish(encode_global(true));
	processed(&logger, 2).await;
	assert!(logger.info("after").unwrap());

	assert_eq!(
		sink.leveled(),
		vec![
			(SeverityLevel::Info, "before".to_string()),
			(SeverityLevel::Info, "after".to_string()),
		]
	);

	logger.shutdown().await.unwrap();
	hub.shutdown().await;
}

#[tokio::test]
async fn test_last_threshold_wins() {
	let mut hub = hub().await;
	let (mut logger, sink) = subscribed_logger("bgpd", &hub).await;
	hub.wait_for_subscribers(1).await;

	hub.publish(encode_component("bgpd", SeverityLevel::Debug));
	hub.publish(encode_component("bgpd", SeverityLevel::Critical));
	processed(&logger, 2).await;

	assert_eq!(logger.snapshot().threshold, SeverityLevel::Critical);
	assert!(!logger.err("dropped").unwrap());
	assert!(logger.crit("kept").unwrap());
	assert_eq!(sink.leveled(), vec![(SeverityLevel::Critical, "kept".to_string())]);

	let stats = logger.listener().unwrap().stats();
	assert_eq!(stats.updates_applied, 2);

	logger.shutdown().await.unwrap();
	hub.shutdown().await;
}

#[tokio::test]
async fn test_each_process_only_takes_its_own_component() {
	let mut hub = hub().await;
	let (mut arpd, _) = subscribed_logger("arpd", &hub).await;
	let (mut bgpd, _) = subscribed_logger("bgpd", &hub).await;
	hub.wait_for_subscribers(2).await;

	hub.publish(encode_component("arpd", SeverityLevel::Debug));
	processed(&arpd, 1).await;
	processed(&bgpd, 1).await;

	assert_eq!(arpd.snapshot().threshold, SeverityLevel::Debug);
	assert_eq!(bgpd.snapshot().threshold, SeverityLevel::Info);
	assert_eq!(bgpd.listener().unwrap().stats().updates_ignored, 1);

	arpd.shutdown().await.unwrap();
	bgpd.shutdown().await.unwrap();
	hub.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frame_is_counted_and_skipped() {
	let mut hub = hub().await;
	let (mut logger, _) = subscribed_logger("ribd", &hub).await;
	hub.wait_for_subscribers(1).await;
	let before = logger.snapshot();

	hub.publish(&b"{not json"[..]);
	processed(&logger, 1).await;

	let stats = logger.listener().unwrap().stats();
	assert_eq!(stats.decode_failures, 1);
	assert_eq!(stats.updates_applied, 0);
	assert_eq!(logger.snapshot(), before);

	hub.publish(encode_global(false));
	processed(&logger, 2).await;
	assert!(!logger.snapshot().global_enabled);

	logger.shutdown().await.unwrap();
	hub.shutdown().await;
}

#[tokio::test]
async fn test_listener_survives_hub_restart() {
	let mut first = hub().await;
	let addr = first.local_addr();
	let (mut logger, _) = subscribed_logger("arpd", &first).await;
	first.wait_for_subscribers(1).await;
	first.shutdown().await;
	drop(first);

	let second = TcpPublisher::bind(addr).await.unwrap();
	tokio::time::timeout(Duration::from_secs(5), second.wait_for_subscribers(1))
		.await
		.expect("listener did not reconnect");

	second.publish(encode_component("arpd", SeverityLevel::Warning));
	tokio::time::timeout(Duration::from_secs(5), async {
		while logger.snapshot().threshold != SeverityLevel::Warning {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("update after reconnect was not applied");
	assert!(logger.listener().unwrap().stats().receive_errors >= 1);

	logger.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_hub_leaves_logger_working() {
	let addr = {
		let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
		probe.local_addr().unwrap()
	};
	let sink = MemorySink::new();
	let mut logger = Logger::builder("arpd")
		.sink(Arc::new(sink.clone()))
		.transport(TcpTransport::new(addr.to_string()))
		.build()
		.await
		.unwrap();

	let listener = logger.listener().unwrap();
	assert!(listener.wait_for_state(ListenerState::Terminated).await);
	assert!(logger.warning("still logging").unwrap());
	assert_eq!(sink.len(), 1);

	logger.shutdown().await.unwrap();
}

#[cfg(feature = "store-sqlite")]
mod sqlite {
	use super::*;
	use loglever::SqliteStore;
	use sqlx::SqlitePool;

	#[tokio::test]
	async fn test_bootstrap_from_database_then_reconfigure() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite://{}?mode=rwc", dir.path().join("config.db").display());
		let pool = SqlitePool::connect(&url).await.unwrap();
		SqliteStore::ensure_schema(&pool).await.unwrap();
		sqlx::query("INSERT INTO system_logging (logging) VALUES ('on')")
			.execute(&pool)
			.await
			.unwrap();
		sqlx::query("INSERT INTO component_logging (module, level) VALUES ('ospfd', 'notice')")
			.execute(&pool)
			.await
			.unwrap();
		pool.close().await;

		let mut hub = hub().await;
		let sink = MemorySink::new();
		let mut logger = Logger::builder("ospfd")
			.sink(Arc::new(sink.clone()))
			.store(SqliteStore::new(url))
			.transport(TcpTransport::new(hub.local_addr().to_string()))
			.build()
			.await
			.unwrap();
		assert!(logger.bootstrap_warnings().is_empty());
		assert_eq!(logger.snapshot().threshold, SeverityLevel::Notice);
		assert!(!logger.info("below notice").unwrap());

		hub.wait_for_subscribers(1).await;
		hub.publish(encode_component("ospfd", SeverityLevel::Info));
		processed(&logger, 1).await;
		assert!(logger.info("now visible").unwrap());
		assert_eq!(sink.leveled(), vec![(SeverityLevel::Info, "now visible".to_string())]);

		logger.shutdown().await.unwrap();
		hub.shutdown().await;
	}
}
