// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Notifications from the controller to the user interface.

use understory_anchor::{
    AnchorHistoryEntry, CloudAnchorId, ProviderFailure, Quality, SessionState, TrackingReason,
};

/// Instruction shown to the user.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// A mode was entered and the runtime is warming up.
    DetectingSurface,
    /// Hosting is ready for the user to place an anchor.
    TapToPlace,
    /// Resolving is ready and the user should look around.
    LookAround,
    /// The anchor is placed; more of the area must be mapped.
    WalkAround,
    /// Quality is good and the host request is running.
    Processing,
    /// Hosting succeeded.
    Finished,
    /// Hosting failed.
    HostFailed,
    /// Every saved anchor was queued for resolving.
    ResolvingSaved,
    /// There are no saved anchors to resolve.
    NoSavedAnchors,
    /// One anchor was resolved.
    ResolveSucceeded,
    /// One anchor could not be resolved.
    ResolveFailed,
}

impl Instruction {
    /// Text for this instruction.
    pub const fn text(self) -> &'static str {
        match self {
            Self::DetectingSurface => "Detecting flat surface...",
            Self::TapToPlace => "Tap to place an object.",
            Self::LookAround => "Look at the location you expect to see the AR experience appear.",
            Self::WalkAround => {
                "To save this location, walk around the object to capture it from different angles"
            }
            Self::Processing => "Processing...",
            Self::Finished => "Finish!",
            Self::HostFailed => "Host failed.",
            Self::ResolvingSaved => "Resolving saved locations...",
            Self::NoSavedAnchors => "No saved Cloud Anchors found.",
            Self::ResolveSucceeded => "Resolve success!",
            Self::ResolveFailed => "Resolve failed.",
        }
    }
}

/// Something the user interface should reflect.
///
/// Drained with [`WorkflowController::drain_notices`](crate::WorkflowController::drain_notices).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Replace the instruction text.
    Instruction(Instruction),
    /// Mapping quality around the placed anchor changed.
    Quality(Quality),
    /// The tracking helper message changed; `text` is `None` once tracking is fine.
    TrackingHelp {
        /// Current not-tracking reason.
        reason: TrackingReason,
        /// Message to show, if any.
        text: Option<&'static str>,
    },
    /// Hosting succeeded and the entry is waiting to be saved or discarded.
    Hosted(AnchorHistoryEntry),
    /// Hosting failed.
    HostFailed(ProviderFailure),
    /// A resolve batch of `count` requests was issued.
    ResolveStarted {
        /// Number of requests issued.
        count: usize,
    },
    /// An anchor was resolved.
    Resolved(CloudAnchorId),
    /// An anchor could not be resolved.
    ResolveFailed {
        /// Requested id.
        id: CloudAnchorId,
        /// Why it failed.
        failure: ProviderFailure,
    },
    /// A hosted anchor was saved to the store.
    Saved(AnchorHistoryEntry),
    /// The AR session entered an error state; the workflow is shutting down.
    Returning(SessionState),
    /// The return delay elapsed; leave the AR view.
    ReturnHome,
}
