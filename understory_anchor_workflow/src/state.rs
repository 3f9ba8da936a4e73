// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Workflow modes, states, and per-tick change flags.

/// Mode selected by the user interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Neither hosting nor resolving.
    Idle,
    /// Placing and hosting a single anchor.
    Hosting,
    /// Resolving a set of saved anchors.
    Resolving,
}

/// Progress of the hosting flow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HostingPhase {
    /// Waiting for the user to place a local anchor.
    AwaitingAnchor,
    /// Anchor placed; waiting for mapping quality to reach `Good`.
    AwaitingQuality,
    /// The host request is outstanding.
    InFlight,
    /// Hosting succeeded; waiting for the user to save or discard the result.
    AwaitingSave,
}

/// State of a [`WorkflowController`](crate::WorkflowController).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Nothing is happening.
    Idle,
    /// Hosting mode.
    Hosting(HostingPhase),
    /// Resolving mode.
    Resolving,
    /// The AR session failed. Only [`reset`](crate::WorkflowController::reset) leaves this state.
    Returning,
}

impl State {
    /// The mode this state belongs to.
    ///
    /// [`State::Returning`] reports [`Mode::Idle`].
    pub const fn mode(self) -> Mode {
        match self {
            Self::Idle | Self::Returning => Mode::Idle,
            Self::Hosting(_) => Mode::Hosting,
            Self::Resolving => Mode::Resolving,
        }
    }
}

bitflags::bitflags! {
    /// What changed during one [`tick`](crate::WorkflowController::tick).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Changes: u8 {
        /// [`State`] changed.
        const STATE            = 0b0000_0001;
        /// A new mapping quality estimate differs from the previous one.
        const QUALITY          = 0b0000_0010;
        /// The tracking helper message changed.
        const TRACKING_HELP    = 0b0000_0100;
        /// The host request finished.
        const HOST_OUTCOME     = 0b0000_1000;
        /// At least one resolve request finished.
        const RESOLVE_OUTCOMES = 0b0001_0000;
        /// A resolve batch was issued.
        const RESOLVE_STARTED  = 0b0010_0000;
        /// The warm-up period ended.
        const WARMED_UP        = 0b0100_0000;
        /// The return delay elapsed and the host should leave the AR view.
        const RETURN_HOME      = 0b1000_0000;
    }
}
