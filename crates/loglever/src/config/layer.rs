// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use super::sections::{ListenerConfigLayer, SinkConfigLayer, StoreConfigLayer};
use crate::bootstrap::GlobalFlagPolicy;

/// One partial configuration, as read from a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggerConfigLayer {
	pub component: Option<String>,
	pub tag: Option<String>,
	pub global_flag_policy: Option<GlobalFlagPolicy>,
	pub sink: Option<SinkConfigLayer>,
	pub store: Option<StoreConfigLayer>,
	pub listener: Option<ListenerConfigLayer>,
}

impl LoggerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.component.is_some() {
			self.component = other.component;
		}
		if other.tag.is_some() {
			self.tag = other.tag;
		}
		if other.global_flag_policy.is_some() {
			self.global_flag_policy = other.global_flag_policy;
		}
		merge_section(&mut self.sink, other.sink, SinkConfigLayer::merge);
		merge_section(&mut self.store, other.store, StoreConfigLayer::merge);
		merge_section(&mut self.listener, other.listener, ListenerConfigLayer::merge);
	}
}

fn merge_section<T: Default>(current: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	if let Some(other) = other {
		merge(current.get_or_insert_with(T::default), other);
	}
}
