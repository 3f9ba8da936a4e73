// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Anchor Workflow: a tick-driven controller for hosting and
//! resolving cloud anchors.
//!
//! [`WorkflowController`] sequences an
//! [`AnchorProvider`](understory_anchor::AnchorProvider), a
//! [`TrackingSource`](understory_anchor::TrackingSource), and an
//! [`AnchorStore`](understory_anchor::AnchorStore) through the steps a user
//! goes through:
//!
//! - Hosting: place an anchor, map the area until quality is good, host, then
//!   save or discard the result.
//! - Resolving: queue ids (or every saved entry) and resolve them as a batch.
//!
//! Call [`WorkflowController::tick`] once per frame. It returns [`Changes`]
//! describing what moved, and the user-facing details are collected as
//! [`Notice`] values for [`drain_notices`](WorkflowController::drain_notices).
//!
//! ```
//! use understory_anchor::Quality;
//! use understory_anchor::scripted::{MemoryStore, ScriptedProvider, ScriptedTracking};
//! use understory_anchor_workflow::{
//!     Changes, HostingPhase, Mode, State, WorkflowConfig, WorkflowController,
//! };
//!
//! let mut workflow = WorkflowController::with_config(
//!     ScriptedProvider::new(),
//!     ScriptedTracking::default(),
//!     MemoryStore::new(),
//!     WorkflowConfig::default().with_warm_up(0.5),
//! );
//!
//! workflow.select_mode(Mode::Hosting).unwrap();
//! assert!(workflow.tick(0.5).contains(Changes::WARMED_UP));
//!
//! let anchor = workflow.provider_mut().create_anchor();
//! workflow.place_anchor(anchor).unwrap();
//! workflow.provider_mut().quality = Quality::Good;
//! workflow.tick(0.016);
//! assert_eq!(workflow.state(), State::Hosting(HostingPhase::InFlight));
//!
//! workflow.tick(0.016);
//! assert_eq!(workflow.state(), State::Hosting(HostingPhase::AwaitingSave));
//! let saved = workflow.confirm_save(Some("lobby")).unwrap();
//! assert_eq!(saved.name, "lobby");
//! assert_eq!(workflow.state(), State::Idle);
//! ```
//!
//! [`VisualTable`] is a small companion for choosing which asset represents
//! placed and resolved anchors.
//!
//! ## Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`WorkflowConfig`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
mod controller;
mod error;
mod notice;
mod state;
mod visual;

pub use config::WorkflowConfig;
pub use controller::WorkflowController;
pub use error::WorkflowError;
pub use notice::{Instruction, Notice};
pub use state::{Changes, HostingPhase, Mode, State};
pub use visual::{AnchorVisual, VisualError, VisualTable};
