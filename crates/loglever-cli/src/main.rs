// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `loglever-cli` operator tool.
//!
//! `loglever-cli hub` accepts subscribers and broadcasts reconfiguration
//! notifications typed on stdin. `loglever-cli watch` runs a logger built from
//! configuration and reports every change to its gate.

mod command;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loglever::{load_config, load_config_with_file, Logger, TcpPublisher};

use crate::command::HubCommand;

#[derive(Parser)]
#[command(name = "loglever-cli", about = "Live logging reconfiguration tool", version)]
struct Args {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Broadcast reconfiguration notifications read from stdin.
	Hub {
		/// Address subscribers connect to.
		#[arg(long, default_value = loglever::transport::DEFAULT_ENDPOINT, env = "LOGLEVER_HUB_BIND")]
		bind: SocketAddr,
	},
	/// Run a logger from configuration and print gate changes.
	Watch {
		/// TOML configuration file. Without it only defaults and environment apply.
		#[arg(long, env = "LOGLEVER_CONFIG")]
		config: Option<PathBuf>,

		/// How often to sample the gate.
		#[arg(long, default_value_t = 250)]
		interval_ms: u64,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let args = Args::parse();
	match args.command {
		Command::Hub { bind } => run_hub(bind).await,
		Command::Watch {
			config,
			interval_ms,
		} => run_watch(config, Duration::from_millis(interval_ms)).await,
	}
}

async fn run_hub(bind: SocketAddr) -> anyhow::Result<()> {
	let mut publisher = TcpPublisher::bind(bind)
		.await
		.with_context(|| format!("failed to bind hub on {bind}"))?;
	tracing::info!(addr = %publisher.local_addr(), "hub listening");

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	loop {
		let line = tokio::select! {
			line = lines.next_line() => line.context("failed to read stdin")?,
			_ = tokio::signal::ctrl_c() => None,
		};
		let Some(line) = line else {
			break;
		};

		let command = match HubCommand::parse(&line) {
			Ok(Some(command)) => command,
			Ok(None) => continue,
			Err(message) => {
				eprintln!("{message}");
				continue;
			}
		};
		let Some(frame) = command.frame() else {
			break;
		};
		let delivered = publisher.publish(frame);
		tracing::info!(?command, subscribers = delivered, "broadcast");
	}

	publisher.shutdown().await;
	tracing::info!("hub stopped");
	Ok(())
}

async fn run_watch(config: Option<PathBuf>, interval: Duration) -> anyhow::Result<()> {
	let config = match config {
		Some(path) => load_config_with_file(path)?,
		None => load_config()?,
	};
	let mut logger = Logger::from_config(&config)
		.await
		.context("failed to start logger")?;

	for warning in logger.bootstrap_warnings() {
		tracing::warn!(error = %warning, "bootstrap fell back to defaults");
	}

	let mut last = logger.snapshot();
	println!(
		"{}: logging={} threshold={}",
		last.component,
		on_off(last.global_enabled),
		last.threshold
	);

	let mut ticker = tokio::time::interval(interval);
	loop {
		tokio::select! {
			_ = ticker.tick() => {}
			_ = tokio::signal::ctrl_c() => break,
		}

		let current = logger.snapshot();
		if current != last {
			println!(
				"{}: logging={} threshold={}",
				current.component,
				on_off(current.global_enabled),
				current.threshold
			);
			logger.notice(&format!(
				"reconfigured: logging={} threshold={}",
				on_off(current.global_enabled),
				current.threshold
			))?;
			last = current;
		}

		if let Some(listener) = logger.listener() {
			if listener.state().is_finished() {
				tracing::warn!(state = ?listener.state(), "listener stopped");
				break;
			}
		}
	}

	if let Some(listener) = logger.listener() {
		tracing::info!(stats = ?listener.stats(), "listener summary");
	}
	logger.shutdown().await?;
	Ok(())
}

fn on_off(enabled: bool) -> &'static str {
	if enabled {
		"on"
	} else {
		"off"
	}
}
