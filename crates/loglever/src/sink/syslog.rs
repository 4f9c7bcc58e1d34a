// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Syslog sink.
//!
//! Local delivery goes to the daemon's unix socket using the traditional
//! BSD line format; remote delivery over UDP or TCP uses RFC 5424, with
//! octet-counting framing on TCP.

use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
#[cfg(unix)]
use std::os::unix::net::{UnixDatagram, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use loglever_core::{SeverityLevel, Sink, SinkError};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::{SyslogConfig, SyslogProtocol};

/// Severity used for raw writes.
const RAW_SEVERITY: SeverityLevel = SeverityLevel::Info;

/// Upper bound on a TCP dial, which runs on the caller's thread with the
/// connection lock held.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

enum Connection {
	#[cfg(unix)]
	UnixDatagram(UnixDatagram),
	#[cfg(unix)]
	UnixStream(UnixStream),
	Udp(UdpSocket),
	Tcp {
		target: SocketAddr,
		stream: Option<TcpStream>,
	},
}

pub struct SyslogSink {
	tag: String,
	facility: u8,
	hostname: String,
	pid: u32,
	/// Local socket to redial after a failed write. `None` for remote targets.
	unix_path: Option<PathBuf>,
	connection: Mutex<Option<Connection>>,
}

impl SyslogSink {
	/// Opens the syslog destination described by `config`. Lines are tagged
	/// with `tag`.
	pub fn connect(config: &SyslogConfig, tag: impl Into<String>) -> Result<Self, SinkError> {
		let facility = facility_to_code(&config.facility).ok_or_else(|| {
			SinkError::Open(format!("unknown syslog facility '{}'", config.facility))
		})?;

		let connection = match config.protocol {
			SyslogProtocol::Unix => connect_unix(&config.path)?,
			SyslogProtocol::Udp => {
				let target = resolve(&config.host, config.port)?;
				let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
				let socket = UdpSocket::bind(bind_addr)
					.map_err(|e| SinkError::Open(format!("failed to bind UDP socket: {e}")))?;
				socket
					.connect(target)
					.map_err(|e| SinkError::Open(format!("failed to connect UDP socket: {e}")))?;
				Connection::Udp(socket)
			}
			SyslogProtocol::Tcp => {
				let target = resolve(&config.host, config.port)?;
				let stream = dial_tcp(target)
					.map_err(|e| SinkError::Open(format!("TCP connect to {target} failed: {e}")))?;
				Connection::Tcp {
					target,
					stream: Some(stream),
				}
			}
		};

		debug!(protocol = ?config.protocol, facility = %config.facility, "syslog sink connected");
		Ok(Self {
			tag: tag.into(),
			facility,
			hostname: std::env::var("HOSTNAME").unwrap_or_else(|_| "-".to_string()),
			pid: std::process::id(),
			unix_path: match config.protocol {
				SyslogProtocol::Unix => Some(config.path.clone()),
				SyslogProtocol::Udp | SyslogProtocol::Tcp => None,
			},
			connection: Mutex::new(Some(connection)),
		})
	}

	fn send(&self, severity: SeverityLevel, message: &str) -> Result<(), SinkError> {
		let mut guard = self.connection.lock();
		let connection = guard.as_mut().ok_or(SinkError::Closed)?;
		let pri = priority(self.facility, severity);

		let Err(e) = self.deliver(connection, pri, message) else {
			return Ok(());
		};
		let Some(path) = self.unix_path.as_deref() else {
			return Err(e.into());
		};

		// The daemon may have restarted behind the same path: redial once.
		debug!(error = %e, path = %path.display(), "syslog socket write failed, reconnecting");
		match connect_unix(path) {
			Ok(fresh) => *connection = fresh,
			Err(_) => return Err(e.into()),
		}
		self.deliver(connection, pri, message)?;
		Ok(())
	}

	fn deliver(&self, connection: &mut Connection, pri: u8, message: &str) -> std::io::Result<()> {
		match connection {
			#[cfg(unix)]
			Connection::UnixDatagram(socket) => {
				let line = format_rfc3164(pri, Local::now(), &self.tag, self.pid, message);
				socket.send(line.as_bytes())?;
			}
			#[cfg(unix)]
			Connection::UnixStream(stream) => {
				let mut line = format_rfc3164(pri, Local::now(), &self.tag, self.pid, message);
				line.push('\n');
				stream.write_all(line.as_bytes())?;
			}
			Connection::Udp(socket) => {
				let line = self.rfc5424(pri, message);
				socket.send(line.as_bytes())?;
			}
			Connection::Tcp { target, stream } => {
				let framed = frame_octet_counted(&self.rfc5424(pri, message));
				let mut s = match stream.take() {
					Some(s) => s,
					None => dial_tcp(*target)?,
				};
				// A stream that failed a write is dropped and redialled next time.
				s.write_all(&framed)?;
				*stream = Some(s);
			}
		}
		Ok(())
	}

	fn rfc5424(&self, pri: u8, message: &str) -> String {
		format_rfc5424(pri, Utc::now(), &self.hostname, &self.tag, self.pid, message)
	}
}

impl Sink for SyslogSink {
	fn name(&self) -> &str {
		"syslog"
	}

	fn write(&self, severity: SeverityLevel, message: &str) -> Result<(), SinkError> {
		self.send(severity, message)
	}

	fn write_raw(&self, bytes: &[u8]) -> Result<usize, SinkError> {
		self.send(RAW_SEVERITY, &String::from_utf8_lossy(bytes))?;
		Ok(bytes.len())
	}

	fn close(&self) -> Result<(), SinkError> {
		self.connection.lock().take();
		Ok(())
	}
}

#[cfg(unix)]
fn connect_unix(path: &Path) -> Result<Connection, SinkError> {
	let datagram_err = match UnixDatagram::unbound().and_then(|s| s.connect(path).map(|()| s)) {
		Ok(socket) => return Ok(Connection::UnixDatagram(socket)),
		Err(e) => e,
	};
	match UnixStream::connect(path) {
		Ok(stream) => Ok(Connection::UnixStream(stream)),
		Err(_) => Err(SinkError::Open(format!(
			"failed to connect to syslog socket {}: {datagram_err}",
			path.display()
		))),
	}
}

#[cfg(not(unix))]
fn connect_unix(path: &Path) -> Result<Connection, SinkError> {
	Err(SinkError::Open(format!(
		"unix syslog socket {} is not supported on this platform",
		path.display()
	)))
}

fn dial_tcp(target: SocketAddr) -> std::io::Result<TcpStream> {
	TcpStream::connect_timeout(&target, TCP_CONNECT_TIMEOUT)
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, SinkError> {
	(host, port)
		.to_socket_addrs()
		.map_err(|e| SinkError::Open(format!("invalid syslog address {host}:{port}: {e}")))?
		.next()
		.ok_or_else(|| SinkError::Open(format!("syslog address {host}:{port} did not resolve")))
}

/// PRI value: facility * 8 + severity.
pub fn priority(facility: u8, severity: SeverityLevel) -> u8 {
	facility * 8 + severity.syslog_code()
}

/// `<PRI>Mmm dd hh:mm:ss TAG[PID]: MSG`
pub fn format_rfc3164(
	pri: u8,
	timestamp: DateTime<Local>,
	tag: &str,
	pid: u32,
	message: &str,
) -> String {
	format!(
		"<{pri}>{} {tag}[{pid}]: {}",
		timestamp.format("%b %e %H:%M:%S"),
		message.trim_end_matches('\n')
	)
}

/// `<PRI>1 TIMESTAMP HOSTNAME APP-NAME PROCID - - MSG`
pub fn format_rfc5424(
	pri: u8,
	timestamp: DateTime<Utc>,
	hostname: &str,
	app_name: &str,
	pid: u32,
	message: &str,
) -> String {
	format!(
		"<{pri}>1 {} {hostname} {app_name} {pid} - - {}",
		timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
		message.trim_end_matches('\n')
	)
}

fn frame_octet_counted(message: &str) -> Vec<u8> {
	let mut framed = Vec::with_capacity(message.len() + 10);
	framed.extend_from_slice(format!("{} ", message.len()).as_bytes());
	framed.extend_from_slice(message.as_bytes());
	framed
}

pub fn facility_to_code(facility: &str) -> Option<u8> {
	let code = match facility.to_lowercase().as_str() {
		"kern" => 0,
		"user" => 1,
		"mail" => 2,
		"daemon" => 3,
		"auth" | "security" => 4,
		"syslog" => 5,
		"lpr" => 6,
		"news" => 7,
		"uucp" => 8,
		"cron" => 9,
		"authpriv" => 10,
		"ftp" => 11,
		"local0" => 16,
		"local1" => 17,
		"local2" => 18,
		"local3" => 19,
		"local4" => 20,
		"local5" => 21,
		"local6" => 22,
		"local7" => 23,
		_ => return None,
	};
	Some(code)
}
