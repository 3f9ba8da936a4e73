// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic in-memory collaborators.
//!
//! [`ScriptedProvider`] plays back scripted outcomes for host and resolve
//! requests and records every call it receives in a [`CallLog`]. Anchors it
//! hands out are counted while alive, so tests can check that nothing leaks
//! after a cancel or reset.
//!
//! ```
//! use understory_anchor::scripted::{Script, ScriptedProvider};
//! use understory_anchor::{AnchorProvider, CloudAnchorId, TicketStatus};
//!
//! let mut provider = ScriptedProvider::new();
//! let id = CloudAnchorId::from("abc123");
//! provider.script_resolve(id.clone(), Script::succeed_on_poll(2));
//!
//! let mut ticket = provider.resolve_anchor(&id).unwrap();
//! assert!(matches!(provider.poll_resolve(&mut ticket), TicketStatus::Pending));
//! let status = provider.poll_resolve(&mut ticket);
//! assert!(matches!(status, TicketStatus::Succeeded(_)));
//! assert_eq!(provider.live_anchors(), 1);
//! drop(status);
//! assert_eq!(provider.live_anchors(), 0);
//! ```

use alloc::collections::{BTreeMap, VecDeque};
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::history::{AnchorHistoryEntry, AnchorStore};
use crate::provider::AnchorProvider;
use crate::tracking::{SessionState, TrackingReason, TrackingSource};
use crate::types::{CloudAnchorId, Pose, ProviderFailure, Quality, TicketStatus};

/// An anchor handed out by [`ScriptedProvider`].
///
/// Counted as live until dropped.
#[derive(Debug)]
pub struct ScriptedAnchor {
    serial: u32,
    live: Rc<Cell<usize>>,
}

impl ScriptedAnchor {
    fn new(serial: u32, live: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            serial,
            live: Rc::clone(live),
        }
    }

    /// Serial number assigned by the provider.
    pub fn serial(&self) -> u32 {
        self.serial
    }
}

impl PartialEq for ScriptedAnchor {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for ScriptedAnchor {}

impl Drop for ScriptedAnchor {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// Scripted outcome of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Script {
    /// Issue a ticket that turns terminal on poll number `poll` (1-based).
    Complete {
        /// Poll on which the ticket first reports a terminal status.
        poll: u32,
        /// `None` for success, the failure otherwise.
        failure: Option<ProviderFailure>,
    },
    /// Finish synchronously without a ticket.
    Reject(ProviderFailure),
}

impl Script {
    /// Succeed on poll number `poll`.
    pub fn succeed_on_poll(poll: u32) -> Self {
        Self::Complete {
            poll,
            failure: None,
        }
    }

    /// Fail with `failure` on poll number `poll`.
    pub fn fail_on_poll(poll: u32, failure: ProviderFailure) -> Self {
        Self::Complete {
            poll,
            failure: Some(failure),
        }
    }

    /// Reject the request before a ticket is issued.
    pub fn reject(failure: ProviderFailure) -> Self {
        Self::Reject(failure)
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::succeed_on_poll(1)
    }
}

/// Ticket issued by [`ScriptedProvider`].
#[derive(Debug)]
pub struct ScriptedTicket {
    serial: u32,
    subject: CloudAnchorId,
    remaining: u32,
    failure: Option<ProviderFailure>,
    done: bool,
}

impl ScriptedTicket {
    /// The cloud anchor id this ticket is about.
    ///
    /// For host tickets this is the id the anchor will receive on success.
    pub fn subject(&self) -> &CloudAnchorId {
        &self.subject
    }

    fn advance(&mut self) -> Option<Result<(), ProviderFailure>> {
        if self.done {
            // Terminal tickets must not be polled again.
            return Some(Err(ProviderFailure::Internal));
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }
        self.done = true;
        Some(match self.failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        })
    }
}

/// Every call received by a [`ScriptedProvider`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallLog {
    /// Number of `estimate_map_quality` calls.
    pub quality_estimates: usize,
    /// `(anchor serial, ttl_days)` for each `host_anchor` call.
    pub host_requests: Vec<(u32, u32)>,
    /// Ids passed to `resolve_anchor`, in call order.
    pub resolve_requests: Vec<CloudAnchorId>,
    /// Number of cancelled host tickets.
    pub cancelled_hosts: usize,
    /// Ids of cancelled resolve tickets.
    pub cancelled_resolves: Vec<CloudAnchorId>,
}

/// An [`AnchorProvider`] that plays back scripted outcomes.
///
/// Host requests take their scripts from a queue; resolve requests look up a
/// script by id. Unscripted requests succeed on their first poll. Successful
/// host tickets yield ids of the form `cloud-<serial>`.
#[derive(Debug)]
pub struct ScriptedProvider {
    /// Quality reported by every `estimate_map_quality` call.
    pub quality: Quality,
    host_scripts: VecDeque<Script>,
    resolve_scripts: BTreeMap<CloudAnchorId, Script>,
    next_serial: u32,
    live: Rc<Cell<usize>>,
    log: CallLog,
}

impl ScriptedProvider {
    /// Create a provider reporting [`Quality::Insufficient`] with no scripts.
    pub fn new() -> Self {
        Self {
            quality: Quality::Insufficient,
            host_scripts: VecDeque::new(),
            resolve_scripts: BTreeMap::new(),
            next_serial: 0,
            live: Rc::new(Cell::new(0)),
            log: CallLog::default(),
        }
    }

    /// Queue the outcome of the next unscripted host request.
    pub fn script_host(&mut self, script: Script) {
        self.host_scripts.push_back(script);
    }

    /// Set the outcome of resolve requests for `id`.
    pub fn script_resolve(&mut self, id: CloudAnchorId, script: Script) {
        self.resolve_scripts.insert(id, script);
    }

    /// Place a new local anchor.
    pub fn create_anchor(&mut self) -> ScriptedAnchor {
        let serial = self.serial();
        ScriptedAnchor::new(serial, &self.live)
    }

    /// Number of anchors handed out and not yet dropped.
    pub fn live_anchors(&self) -> usize {
        self.live.get()
    }

    /// Calls received so far.
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    fn serial(&mut self) -> u32 {
        self.next_serial += 1;
        self.next_serial
    }

    fn issue(
        &mut self,
        subject: CloudAnchorId,
        script: Script,
    ) -> Result<ScriptedTicket, ProviderFailure> {
        match script {
            Script::Reject(failure) => Err(failure),
            Script::Complete { poll, failure } => Ok(ScriptedTicket {
                serial: self.serial(),
                subject,
                remaining: poll.max(1),
                failure,
                done: false,
            }),
        }
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorProvider for ScriptedProvider {
    type Anchor = ScriptedAnchor;
    type Resolved = ScriptedAnchor;
    type HostTicket = ScriptedTicket;
    type ResolveTicket = ScriptedTicket;

    fn estimate_map_quality(&mut self, _pose: &Pose) -> Quality {
        self.log.quality_estimates += 1;
        self.quality
    }

    fn host_anchor(
        &mut self,
        anchor: &ScriptedAnchor,
        ttl_days: u32,
    ) -> Result<ScriptedTicket, ProviderFailure> {
        self.log.host_requests.push((anchor.serial, ttl_days));
        let script = self.host_scripts.pop_front().unwrap_or_default();
        let subject = CloudAnchorId::new(format!("cloud-{}", self.next_serial + 1));
        self.issue(subject, script)
    }

    fn resolve_anchor(&mut self, id: &CloudAnchorId) -> Result<ScriptedTicket, ProviderFailure> {
        self.log.resolve_requests.push(id.clone());
        let script = self.resolve_scripts.get(id).cloned().unwrap_or_default();
        self.issue(id.clone(), script)
    }

    fn poll_host(&mut self, ticket: &mut ScriptedTicket) -> TicketStatus<CloudAnchorId> {
        match ticket.advance() {
            None => TicketStatus::Pending,
            Some(Ok(())) => TicketStatus::Succeeded(ticket.subject.clone()),
            Some(Err(failure)) => TicketStatus::Failed(failure),
        }
    }

    fn poll_resolve(&mut self, ticket: &mut ScriptedTicket) -> TicketStatus<ScriptedAnchor> {
        match ticket.advance() {
            None => TicketStatus::Pending,
            Some(Ok(())) => TicketStatus::Succeeded(ScriptedAnchor::new(ticket.serial, &self.live)),
            Some(Err(failure)) => TicketStatus::Failed(failure),
        }
    }

    fn cancel_host(&mut self, _ticket: ScriptedTicket) {
        self.log.cancelled_hosts += 1;
    }

    fn cancel_resolve(&mut self, ticket: ScriptedTicket) {
        self.log.cancelled_resolves.push(ticket.subject);
    }
}

/// A [`TrackingSource`] with directly settable state.
///
/// Defaults to a tracking session at the identity pose.
#[derive(Clone, Debug)]
pub struct ScriptedTracking {
    /// Reported camera pose.
    pub pose: Pose,
    /// Reported session state.
    pub state: SessionState,
    /// Reported not-tracking reason.
    pub reason: TrackingReason,
}

impl Default for ScriptedTracking {
    fn default() -> Self {
        Self {
            pose: Pose::IDENTITY,
            state: SessionState::SessionTracking,
            reason: TrackingReason::None,
        }
    }
}

impl TrackingSource for ScriptedTracking {
    fn camera_pose(&self) -> Pose {
        self.pose
    }

    fn session_state(&self) -> SessionState {
        self.state
    }

    fn not_tracking_reason(&self) -> TrackingReason {
        self.reason
    }
}

/// An [`AnchorStore`] backed by a vector.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Vec<AnchorHistoryEntry>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `entries`.
    pub fn with_entries(entries: Vec<AnchorHistoryEntry>) -> Self {
        Self { entries }
    }

    /// Borrow the saved entries.
    pub fn entries(&self) -> &[AnchorHistoryEntry] {
        &self.entries
    }
}

impl AnchorStore for MemoryStore {
    fn save(&mut self, entry: AnchorHistoryEntry) {
        self.entries.push(entry);
    }

    fn load_all(&self) -> Vec<AnchorHistoryEntry> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
