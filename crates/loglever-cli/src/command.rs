// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator commands accepted by `loglever-cli hub` on stdin.

use loglever::notification::{encode_component, encode_global};
use loglever::SeverityLevel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubCommand {
	/// `global on|off`
	Global(bool),
	/// `level <component> <level>`
	Level {
		component: String,
		level: SeverityLevel,
	},
	/// `quit`
	Quit,
}

impl HubCommand {
	/// Parses one input line. Blank lines and `#` comments yield `None`.
	pub fn parse(line: &str) -> Result<Option<HubCommand>, String> {
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			return Ok(None);
		}

		let words: Vec<&str> = line.split_whitespace().collect();
		let command = match words.as_slice() {
			["global", switch] => match switch.to_ascii_lowercase().as_str() {
				"on" | "enable" | "true" => HubCommand::Global(true),
				"off" | "disable" | "false" => HubCommand::Global(false),
				other => return Err(format!("expected on or off, got '{other}'")),
			},
			["level", component, level] => HubCommand::Level {
				component: component.to_string(),
				level: level.parse().map_err(|e| format!("{e}"))?,
			},
			["quit"] | ["exit"] => HubCommand::Quit,
			_ => {
				return Err(format!(
					"unrecognised command '{line}' (try: global on|off, level <component> <level>, quit)"
				))
			}
		};
		Ok(Some(command))
	}

	/// The notification frame to broadcast, if any.
	pub fn frame(&self) -> Option<Vec<u8>> {
		match self {
			HubCommand::Global(enable) => Some(encode_global(*enable)),
			HubCommand::Level { component, level } => Some(encode_component(component, *level)),
			HubCommand::Quit => None,
		}
	}
}
