// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolving session: one batch of resolve requests, one ticket per id.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, info, warn};
use understory_anchor::{AnchorProvider, CloudAnchorId, ProviderFailure, TicketStatus};

/// Outcomes collected by one [`ResolvingSession::poll`].
pub type ResolveOutcomes<R> = SmallVec<[ResolveOutcome<R>; 4]>;

/// Terminal result of resolving one id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome<R> {
    /// The anchor was found and placed in the scene.
    Succeeded {
        /// Requested id.
        id: CloudAnchorId,
        /// The resolved anchor; dropping it releases it.
        anchor: R,
    },
    /// The id could not be resolved.
    Failed {
        /// Requested id.
        id: CloudAnchorId,
        /// Why resolving failed.
        failure: ProviderFailure,
    },
}

impl<R> ResolveOutcome<R> {
    /// The id this outcome belongs to.
    pub fn id(&self) -> &CloudAnchorId {
        match self {
            Self::Succeeded { id, .. } | Self::Failed { id, .. } => id,
        }
    }

    /// Whether the id was resolved.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Owns the in-flight resolve requests of a single batch.
///
/// A batch is accepted only while the session is fully idle; ids enqueued
/// while requests or unconsumed results are outstanding are ignored. Each id
/// has at most one ticket and is reported exactly once by [`poll`](Self::poll).
///
/// ```
/// use understory_anchor::scripted::{Script, ScriptedProvider};
/// use understory_anchor::CloudAnchorId;
/// use understory_anchor_session::{ResolveOutcome, ResolvingSession};
///
/// let mut provider = ScriptedProvider::new();
/// let id = CloudAnchorId::from("abc123");
/// provider.script_resolve(id.clone(), Script::succeed_on_poll(2));
///
/// let mut session = ResolvingSession::new();
/// assert_eq!(session.enqueue(&mut provider, [id.clone()]), 1);
///
/// assert!(session.poll(&mut provider).is_empty());
/// let outcomes = session.poll(&mut provider);
/// assert!(matches!(&outcomes[..], [ResolveOutcome::Succeeded { id: got, .. }] if *got == id));
/// assert!(session.poll(&mut provider).is_empty());
/// ```
pub struct ResolvingSession<P: AnchorProvider> {
    pending: HashMap<CloudAnchorId, P::ResolveTicket>,
    completed: Vec<ResolveOutcome<P::Resolved>>,
}

impl<P: AnchorProvider> ResolvingSession<P> {
    /// Create an idle session.
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            completed: Vec::new(),
        }
    }

    /// Whether no request is pending and no result is held.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }

    /// Number of outstanding provider tickets.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether a ticket for `id` is outstanding.
    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Ids with outstanding tickets, in no particular order.
    pub fn pending_ids(&self) -> impl Iterator<Item = &CloudAnchorId> + '_ {
        self.pending.keys()
    }

    /// Issue one resolve request per distinct id.
    ///
    /// Does nothing if `ids` is empty or the session is not idle. Returns the
    /// number of requests issued, including ones the provider rejected
    /// synchronously; those are reported by the next [`poll`](Self::poll).
    pub fn enqueue<I>(&mut self, provider: &mut P, ids: I) -> usize
    where
        I: IntoIterator<Item = CloudAnchorId>,
    {
        if !self.is_idle() {
            debug!(
                pending = self.pending.len(),
                "resolve batch ignored; session is busy"
            );
            return 0;
        }
        let mut issued = 0;
        for id in ids {
            if self.pending.contains_key(&id) || self.completed.iter().any(|o| *o.id() == id) {
                continue;
            }
            debug!(%id, "requesting anchor resolve");
            match provider.resolve_anchor(&id) {
                Ok(ticket) => {
                    self.pending.insert(id, ticket);
                }
                Err(failure) => {
                    warn!(%id, %failure, "resolve request rejected");
                    self.completed.push(ResolveOutcome::Failed { id, failure });
                }
            }
            issued += 1;
        }
        issued
    }

    /// Collect every outcome that became terminal since the last poll.
    ///
    /// Pending tickets are left in place. Never blocks.
    pub fn poll(&mut self, provider: &mut P) -> ResolveOutcomes<P::Resolved> {
        let mut outcomes: ResolveOutcomes<P::Resolved> = self.completed.drain(..).collect();
        self.pending
            .retain(|id, ticket| match provider.poll_resolve(ticket) {
                TicketStatus::Pending => true,
                TicketStatus::Succeeded(anchor) => {
                    info!(%id, "cloud anchor resolved");
                    outcomes.push(ResolveOutcome::Succeeded {
                        id: id.clone(),
                        anchor,
                    });
                    false
                }
                TicketStatus::Failed(failure) => {
                    warn!(%id, %failure, "resolving failed");
                    outcomes.push(ResolveOutcome::Failed {
                        id: id.clone(),
                        failure,
                    });
                    false
                }
            });
        outcomes
    }

    /// Abandon every pending request and drop every held result.
    ///
    /// Safe to call at any time. Returns `true` if anything was released.
    pub fn cancel(&mut self, provider: &mut P) -> bool {
        let released = !self.is_idle();
        for (id, ticket) in self.pending.drain() {
            debug!(%id, "cancelling resolve request");
            provider.cancel_resolve(ticket);
        }
        self.completed.clear();
        released
    }
}

impl<P: AnchorProvider> Default for ResolvingSession<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: AnchorProvider> fmt::Debug for ResolvingSession<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvingSession")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("completed", &self.completed.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use understory_anchor::scripted::{Script, ScriptedProvider};

    fn ids(names: &[&str]) -> Vec<CloudAnchorId> {
        names.iter().map(|n| CloudAnchorId::from(*n)).collect()
    }

    #[test]
    fn single_id_resolves_on_second_poll() {
        let mut provider = ScriptedProvider::new();
        provider.script_resolve("abc123".into(), Script::succeed_on_poll(2));
        let mut session = ResolvingSession::new();

        session.enqueue(&mut provider, ids(&["abc123"]));
        assert!(session.poll(&mut provider).is_empty());
        let outcomes = session.poll(&mut provider);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
        assert_eq!(outcomes[0].id().as_str(), "abc123");
        assert!(session.poll(&mut provider).is_empty());
        assert!(session.is_idle());
    }

    #[test]
    fn every_id_reported_once_regardless_of_completion_order() {
        let mut provider = ScriptedProvider::new();
        provider.script_resolve("A".into(), Script::succeed_on_poll(3));
        provider.script_resolve(
            "B".into(),
            Script::fail_on_poll(1, ProviderFailure::CloudIdNotFound),
        );
        provider.script_resolve("C".into(), Script::succeed_on_poll(2));
        let mut session = ResolvingSession::new();

        assert_eq!(session.enqueue(&mut provider, ids(&["A", "B", "C"])), 3);
        let mut seen = Vec::new();
        for _ in 0..5 {
            for outcome in session.poll(&mut provider) {
                seen.push(outcome.id().clone());
            }
        }
        seen.sort();
        assert_eq!(seen, ids(&["A", "B", "C"]));
    }

    #[test]
    fn duplicate_ids_share_one_ticket() {
        let mut provider = ScriptedProvider::new();
        let mut session = ResolvingSession::new();

        assert_eq!(session.enqueue(&mut provider, ids(&["A", "A", "B"])), 2);
        assert_eq!(session.pending_len(), 2);
        assert_eq!(provider.log().resolve_requests.len(), 2);
    }

    #[test]
    fn enqueue_while_busy_is_ignored() {
        let mut provider = ScriptedProvider::new();
        provider.script_resolve("A".into(), Script::succeed_on_poll(2));
        let mut session = ResolvingSession::new();

        assert_eq!(session.enqueue(&mut provider, ids(&["A"])), 1);
        assert_eq!(session.enqueue(&mut provider, ids(&["B"])), 0);
        assert!(!session.is_pending("B"));
        assert_eq!(session.enqueue(&mut provider, Vec::new()), 0);
        assert_eq!(provider.log().resolve_requests, ids(&["A"]));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let mut provider = ScriptedProvider::new();
        let mut session = ResolvingSession::<ScriptedProvider>::new();
        assert_eq!(session.enqueue(&mut provider, vec![]), 0);
        assert!(session.is_idle());
    }

    #[test]
    fn synchronous_rejections_surface_on_next_poll() {
        let mut provider = ScriptedProvider::new();
        provider.script_resolve("bad".into(), Script::reject(ProviderFailure::Rejected));
        let mut session = ResolvingSession::new();

        session.enqueue(&mut provider, ids(&["bad"]));
        assert!(!session.is_idle());
        let outcomes = session.poll(&mut provider);
        assert_eq!(
            outcomes.as_slice(),
            [ResolveOutcome::Failed {
                id: "bad".into(),
                failure: ProviderFailure::Rejected
            }]
        );
        assert!(session.is_idle());
    }

    #[test]
    fn cancel_releases_tickets_and_is_idempotent() {
        let mut provider = ScriptedProvider::new();
        provider.script_resolve("A".into(), Script::succeed_on_poll(4));
        provider.script_resolve("B".into(), Script::succeed_on_poll(4));
        provider.script_resolve("C".into(), Script::reject(ProviderFailure::Internal));
        let mut session = ResolvingSession::new();

        session.enqueue(&mut provider, ids(&["A", "B", "C"]));
        assert!(session.cancel(&mut provider));
        assert!(session.is_idle());
        let mut cancelled = provider.log().cancelled_resolves.clone();
        cancelled.sort();
        assert_eq!(cancelled, ids(&["A", "B"]));

        assert!(!session.cancel(&mut provider));
        assert_eq!(provider.log().cancelled_resolves.len(), 2);
        assert!(session.poll(&mut provider).is_empty());
    }

    #[test]
    fn consumed_anchors_belong_to_the_caller() {
        let mut provider = ScriptedProvider::new();
        let mut session = ResolvingSession::new();

        session.enqueue(&mut provider, ids(&["A", "B"]));
        let outcomes = session.poll(&mut provider);
        assert_eq!(provider.live_anchors(), 2);
        drop(outcomes);
        assert_eq!(provider.live_anchors(), 0);
    }
}
