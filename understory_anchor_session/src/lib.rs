// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Anchor Session: poll-driven host and resolve sessions.
//!
//! Both sessions wrap an [`AnchorProvider`](understory_anchor::AnchorProvider)
//! and own its tickets exclusively. They are meant to be driven once per tick:
//! nothing blocks, nothing calls back, and every mutation happens inside the
//! call that caused it.
//!
//! - [`HostingSession`]: at most one outstanding host request. A second
//!   [`start`](HostingSession::start) while busy fails with [`AlreadyInProgress`].
//! - [`ResolvingSession`]: one batch of resolve requests at a time, one ticket
//!   per distinct id.
//!
//! Each terminal outcome is returned by exactly one poll. `cancel` is safe at
//! any time, idempotent, and releases every ticket and unconsumed result.
//! Failed requests are never retried automatically; call `start` or `enqueue`
//! again to retry.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod hosting;
mod resolving;


pub use hosting::{AlreadyInProgress, DEFAULT_TTL_DAYS, HostOutcome, HostingSession, MAX_TTL_DAYS};
pub use resolving::{ResolveOutcome, ResolveOutcomes, ResolvingSession};
