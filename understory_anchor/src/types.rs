// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types shared by the provider, the sessions, and the workflow.

use alloc::string::String;
use core::borrow::Borrow;
use core::fmt;

/// Identifier of a hosted cloud anchor.
///
/// Returned by the provider once hosting succeeds and used to resolve the anchor
/// later, possibly from another device. The value is opaque and never changes
/// after it has been obtained.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CloudAnchorId(String);

impl CloudAnchorId {
    /// Wrap a provider-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier and return the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CloudAnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CloudAnchorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CloudAnchorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CloudAnchorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Feature map quality estimated for the current camera pose.
///
/// Tiers are ordered, so `Quality::Sufficient < Quality::Good`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quality {
    /// Not enough visual data has been captured around the anchor.
    Insufficient,
    /// Hosting would likely succeed, but the anchor may resolve poorly.
    Sufficient,
    /// Enough data has been captured to host a durable anchor.
    Good,
}

impl Quality {
    /// Whether this tier is high enough to start hosting.
    pub const fn is_good(self) -> bool {
        matches!(self, Self::Good)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insufficient => "insufficient",
            Self::Sufficient => "sufficient",
            Self::Good => "good",
        })
    }
}

/// A camera pose in the runtime's world space.
///
/// The workflow never interprets the pose; it only forwards it to
/// [`AnchorProvider::estimate_map_quality`](crate::AnchorProvider::estimate_map_quality).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose {
    /// World-space position.
    pub position: [f32; 3],
    /// Orientation as an `[x, y, z, w]` quaternion.
    pub rotation: [f32; 4],
}

impl Pose {
    /// The pose at the world origin with no rotation.
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };

    /// Create a pose from a position and an `[x, y, z, w]` rotation.
    pub const fn new(position: [f32; 3], rotation: [f32; 4]) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Reason a host or resolve request ended without success.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderFailure {
    /// The provider finished the request synchronously without issuing a ticket.
    #[error("the provider rejected the request")]
    Rejected,
    /// Internal provider error.
    #[error("internal provider error")]
    Internal,
    /// The application is not authorized to use the cloud anchor service.
    #[error("not authorized to use the cloud anchor service")]
    NotAuthorized,
    /// Request quota for the service has been exhausted.
    #[error("cloud anchor quota exhausted")]
    ResourceExhausted,
    /// The service could not process the captured visual dataset.
    #[error("the hosting dataset could not be processed")]
    HostingDatasetProcessingFailed,
    /// No cloud anchor with the requested id exists.
    #[error("cloud anchor id not found")]
    CloudIdNotFound,
    /// The anchor was hosted with a newer SDK than the resolver.
    #[error("the SDK is too old to resolve this anchor")]
    SdkVersionTooOld,
    /// The anchor was hosted with an older, incompatible SDK.
    #[error("the SDK is too new to resolve this anchor")]
    SdkVersionTooNew,
    /// The service could not be reached.
    #[error("the cloud anchor service is unavailable")]
    ServiceUnavailable,
}

/// Status of an outstanding provider request, as observed by a single poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketStatus<T> {
    /// The request has not finished yet.
    Pending,
    /// The request finished successfully with a payload.
    Succeeded(T),
    /// The request finished unsuccessfully.
    Failed(ProviderFailure),
}

impl<T> TicketStatus<T> {
    /// Whether the request has reached a terminal state.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}
