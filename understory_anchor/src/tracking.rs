// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking state reported by the AR runtime.

use crate::types::Pose;

/// Lifecycle state of the AR session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session state is available.
    None,
    /// AR is not supported on this device.
    Unsupported,
    /// The runtime is checking whether AR is available.
    CheckingAvailability,
    /// AR is supported but the runtime must be installed first.
    NeedsInstall,
    /// The runtime is being installed.
    Installing,
    /// The session is ready but has not started.
    Ready,
    /// The session is starting.
    SessionInitializing,
    /// The session is running and tracking.
    SessionTracking,
}

impl SessionState {
    /// Whether a hosting or resolving workflow can continue in this state.
    ///
    /// Any other state is treated as a fatal error for the workflow.
    pub const fn is_operational(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::SessionInitializing | Self::SessionTracking
        )
    }

    /// Whether the session is actively tracking.
    pub const fn is_tracking(self) -> bool {
        matches!(self, Self::SessionTracking)
    }
}

/// Why the session is currently not tracking.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrackingReason {
    /// Tracking is fine.
    None,
    /// Tracking is being initialized.
    Initializing,
    /// Tracking is resuming after an interruption.
    Relocalizing,
    /// The environment is too dark.
    InsufficientLight,
    /// The camera sees too little texture.
    InsufficientFeatures,
    /// The device is moving too fast.
    ExcessiveMotion,
    /// The runtime reported a reason it cannot describe.
    Unsupported,
}

/// Which low-light message to show.
///
/// Newer platforms can block the camera from system settings, which also
/// looks like a dark image to the tracker.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LowLightHint {
    /// Only suggest moving to a brighter area.
    #[default]
    Standard,
    /// Also mention the system camera privacy toggle.
    CameraPrivacyToggle,
}

impl TrackingReason {
    /// Instructional text for this reason, or `None` while tracking is fine.
    pub const fn helper_text(self, hint: LowLightHint) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Initializing => Some("Tracking is being initialized."),
            Self::Relocalizing => Some("Tracking is resuming after an interruption."),
            Self::InsufficientLight => Some(match hint {
                LowLightHint::Standard => "Too dark. Try moving to a well-lit area.",
                LowLightHint::CameraPrivacyToggle => {
                    "Too dark. Try moving to a well-lit area. \
                     Also, make sure the Block Camera is set to off in system settings."
                }
            }),
            Self::InsufficientFeatures => Some(
                "Can't find anything. Aim device at a surface with more texture or color.",
            ),
            Self::ExcessiveMotion => Some("Moving too fast. Slow down."),
            Self::Unsupported => Some("Tracking lost reason is not supported."),
        }
    }
}

/// Source of the current camera pose and tracking state.
pub trait TrackingSource {
    /// Pose of the camera for this tick.
    fn camera_pose(&self) -> Pose;

    /// Lifecycle state of the AR session.
    fn session_state(&self) -> SessionState;

    /// Why tracking is degraded, if it is.
    fn not_tracking_reason(&self) -> TrackingReason;
}
