// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunables for the workflow controller.

use alloc::string::String;

use understory_anchor::{DEFAULT_NAME_PREFIX, LowLightHint};
use understory_anchor_session::DEFAULT_TTL_DAYS;

/// Configuration for a [`WorkflowController`](crate::WorkflowController).
///
/// Time values use the same unit as the `dt` passed to
/// [`tick`](crate::WorkflowController::tick), typically seconds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorkflowConfig {
    /// Time after entering a mode before any session is driven, so the AR
    /// runtime can stabilize tracking.
    pub warm_up: f32,
    /// Retention period requested when hosting, in days.
    pub host_ttl_days: u32,
    /// Time spent in [`State::Returning`](crate::State::Returning) before
    /// [`Notice::ReturnHome`](crate::Notice::ReturnHome) is emitted.
    pub return_delay: f32,
    /// Prefix of generated anchor names.
    pub name_prefix: String,
    /// Which low-light message to show while tracking is degraded.
    pub low_light_hint: LowLightHint,
}

impl WorkflowConfig {
    /// Set the warm-up time.
    pub fn with_warm_up(mut self, warm_up: f32) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Set the hosting retention period in days.
    pub fn with_host_ttl_days(mut self, days: u32) -> Self {
        self.host_ttl_days = days;
        self
    }

    /// Set the delay before leaving after a session error.
    pub fn with_return_delay(mut self, delay: f32) -> Self {
        self.return_delay = delay;
        self
    }

    /// Set the prefix of generated anchor names.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Set the low-light message variant.
    pub fn with_low_light_hint(mut self, hint: LowLightHint) -> Self {
        self.low_light_hint = hint;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            warm_up: 3.0,
            host_ttl_days: DEFAULT_TTL_DAYS,
            return_delay: 3.0,
            name_prefix: String::from(DEFAULT_NAME_PREFIX),
            low_light_hint: LowLightHint::Standard,
        }
    }
}
