// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hosting session: at most one outstanding host request.

use core::fmt;
use core::mem;

use tracing::{debug, info, warn};
use understory_anchor::{AnchorProvider, CloudAnchorId, ProviderFailure, TicketStatus};

/// Retention period used when none is configured, in days.
pub const DEFAULT_TTL_DAYS: u32 = 1;

/// Longest retention period a provider accepts, in days.
pub const MAX_TTL_DAYS: u32 = 365;

/// Returned when a session is asked to start while it is still busy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("a request is already in progress")]
pub struct AlreadyInProgress;

/// Result of polling a [`HostingSession`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOutcome {
    /// Nothing new: the request is still pending, or there is no request.
    None,
    /// The anchor was hosted under this id.
    Succeeded(CloudAnchorId),
    /// The request ended without success.
    Failed(ProviderFailure),
}

enum Slot<T> {
    Idle,
    Pending(T),
    Finished(HostOutcome),
}

/// Owns the single in-flight host request.
///
/// The session moves between three states:
///
/// - idle: [`start`](Self::start) issues a request.
/// - pending: a ticket is held and [`poll`](Self::poll) queries it.
/// - finished: a result is held until the next [`poll`](Self::poll) returns it.
///
/// A provider that rejects a request synchronously leaves the session in the
/// finished state, so the failure is still reported through `poll`.
///
/// ```
/// use understory_anchor::scripted::{Script, ScriptedProvider};
/// use understory_anchor_session::{HostOutcome, HostingSession};
///
/// let mut provider = ScriptedProvider::new();
/// provider.script_host(Script::succeed_on_poll(2));
/// let anchor = provider.create_anchor();
///
/// let mut session = HostingSession::new();
/// session.start(&mut provider, &anchor).unwrap();
/// assert!(session.start(&mut provider, &anchor).is_err());
///
/// assert_eq!(session.poll(&mut provider), HostOutcome::None);
/// assert!(matches!(session.poll(&mut provider), HostOutcome::Succeeded(_)));
/// assert_eq!(session.poll(&mut provider), HostOutcome::None);
/// ```
pub struct HostingSession<P: AnchorProvider> {
    ttl_days: u32,
    slot: Slot<P::HostTicket>,
}

impl<P: AnchorProvider> HostingSession<P> {
    /// Create an idle session with the default one-day retention.
    pub fn new() -> Self {
        Self::with_ttl_days(DEFAULT_TTL_DAYS)
    }

    /// Create an idle session that hosts anchors for `ttl_days` days.
    ///
    /// The value is clamped to `1..=MAX_TTL_DAYS`.
    pub fn with_ttl_days(ttl_days: u32) -> Self {
        Self {
            ttl_days: ttl_days.clamp(1, MAX_TTL_DAYS),
            slot: Slot::Idle,
        }
    }

    /// Retention period passed to the provider, in days.
    pub fn ttl_days(&self) -> u32 {
        self.ttl_days
    }

    /// Whether no request is pending and no result is held.
    pub fn is_idle(&self) -> bool {
        matches!(self.slot, Slot::Idle)
    }

    /// Whether a provider ticket is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self.slot, Slot::Pending(_))
    }

    /// Whether a result is held and not yet returned by [`poll`](Self::poll).
    pub fn has_result(&self) -> bool {
        matches!(self.slot, Slot::Finished(_))
    }

    /// Ask the provider to host `anchor`.
    ///
    /// Fails with [`AlreadyInProgress`] if a request is pending or a result has
    /// not been consumed yet; the session is left untouched in that case.
    pub fn start(&mut self, provider: &mut P, anchor: &P::Anchor) -> Result<(), AlreadyInProgress> {
        if !self.is_idle() {
            debug!("host request ignored; session is busy");
            return Err(AlreadyInProgress);
        }
        debug!(ttl_days = self.ttl_days, "requesting anchor hosting");
        self.slot = match provider.host_anchor(anchor, self.ttl_days) {
            Ok(ticket) => Slot::Pending(ticket),
            Err(failure) => {
                warn!(%failure, "host request rejected");
                Slot::Finished(HostOutcome::Failed(failure))
            }
        };
        Ok(())
    }

    /// Check for a result.
    ///
    /// Returns each terminal outcome exactly once; after that the session is
    /// idle and reports [`HostOutcome::None`] until the next `start`.
    pub fn poll(&mut self, provider: &mut P) -> HostOutcome {
        match mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Idle => HostOutcome::None,
            Slot::Finished(outcome) => outcome,
            Slot::Pending(mut ticket) => match provider.poll_host(&mut ticket) {
                TicketStatus::Pending => {
                    self.slot = Slot::Pending(ticket);
                    HostOutcome::None
                }
                TicketStatus::Succeeded(id) => {
                    info!(%id, "cloud anchor hosted");
                    HostOutcome::Succeeded(id)
                }
                TicketStatus::Failed(failure) => {
                    warn!(%failure, "hosting failed");
                    HostOutcome::Failed(failure)
                }
            },
        }
    }

    /// Abandon the pending request and drop any held result.
    ///
    /// Safe to call at any time. Returns `true` if anything was released.
    pub fn cancel(&mut self, provider: &mut P) -> bool {
        match mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Idle => false,
            Slot::Pending(ticket) => {
                debug!("cancelling host request");
                provider.cancel_host(ticket);
                true
            }
            Slot::Finished(_) => {
                debug!("discarding unconsumed host result");
                true
            }
        }
    }
}

impl<P: AnchorProvider> Default for HostingSession<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: AnchorProvider> fmt::Debug for HostingSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.slot {
            Slot::Idle => "idle",
            Slot::Pending(_) => "pending",
            Slot::Finished(_) => "finished",
        };
        f.debug_struct("HostingSession")
            .field("ttl_days", &self.ttl_days)
            .field("state", &state)
            .finish()
    }
}
