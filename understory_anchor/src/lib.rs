// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Anchor: data model and collaborator traits for cloud anchors.
//!
//! A cloud anchor is a spatial anchor persisted by a remote service and
//! resolvable later, possibly on another device, through an opaque
//! [`CloudAnchorId`]. This crate describes the pieces a hosting/resolving
//! workflow needs from its surroundings without depending on any particular
//! AR runtime:
//!
//! - [`AnchorProvider`]: estimates mapping [`Quality`] and starts host and
//!   resolve requests. Requests are tickets polled once per tick and report a
//!   [`TicketStatus`].
//! - [`TrackingSource`]: the camera [`Pose`], the AR [`SessionState`], and the
//!   current [`TrackingReason`].
//! - [`AnchorStore`]: persisted [`AnchorHistoryEntry`] values.
//!
//! Everything is polled; nothing here blocks or calls back.
//!
//! ## Features
//!
//! - `scripted`: enables the [`scripted`] module with in-memory collaborators
//!   that play back scripted outcomes. Intended for tests and demos.
//! - `serde`: derives `Serialize`/`Deserialize` for ids, history entries, and
//!   quality tiers.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod history;
mod provider;
mod tracking;
mod types;

#[cfg(feature = "scripted")]
pub mod scripted;

pub use history::{
    AnchorHistoryEntry, AnchorStore, DEFAULT_NAME_PREFIX, NameError, validate_name,
};
pub use provider::AnchorProvider;
pub use tracking::{LowLightHint, SessionState, TrackingReason, TrackingSource};
pub use types::{CloudAnchorId, Pose, ProviderFailure, Quality, TicketStatus};
