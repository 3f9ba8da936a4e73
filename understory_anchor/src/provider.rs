// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The anchor provider seam: mapping quality, hosting, and resolving.

use crate::types::{CloudAnchorId, Pose, ProviderFailure, Quality, TicketStatus};

/// Capability exposed by the AR runtime for cloud anchors.
///
/// Requests are asynchronous. Starting one returns a ticket which the caller
/// polls once per tick with [`poll_host`](Self::poll_host) or
/// [`poll_resolve`](Self::poll_resolve) until it reports a terminal status.
/// Tickets are consumed by [`cancel_host`](Self::cancel_host) and
/// [`cancel_resolve`](Self::cancel_resolve); a ticket that has reported a
/// terminal status is simply dropped.
///
/// A provider may finish a request synchronously, without issuing a ticket.
/// That is reported as `Err(ProviderFailure::Rejected)` (or a more specific
/// failure) from the starting call.
pub trait AnchorProvider {
    /// Handle to a local anchor placed in the scene.
    ///
    /// Owned by the caller; dropping it releases the anchor.
    type Anchor;
    /// Anchor created by a successful resolve.
    ///
    /// Dropping it releases the anchor.
    type Resolved;
    /// Ticket for an outstanding host request.
    type HostTicket;
    /// Ticket for an outstanding resolve request.
    type ResolveTicket;

    /// Estimate how well the area around the camera has been mapped.
    fn estimate_map_quality(&mut self, pose: &Pose) -> Quality;

    /// Start hosting `anchor`, keeping it resolvable for `ttl_days` days.
    fn host_anchor(
        &mut self,
        anchor: &Self::Anchor,
        ttl_days: u32,
    ) -> Result<Self::HostTicket, ProviderFailure>;

    /// Start resolving the cloud anchor `id`.
    fn resolve_anchor(
        &mut self,
        id: &CloudAnchorId,
    ) -> Result<Self::ResolveTicket, ProviderFailure>;

    /// Observe the status of a host request.
    fn poll_host(&mut self, ticket: &mut Self::HostTicket) -> TicketStatus<CloudAnchorId>;

    /// Observe the status of a resolve request.
    fn poll_resolve(&mut self, ticket: &mut Self::ResolveTicket) -> TicketStatus<Self::Resolved>;

    /// Abandon a host request.
    ///
    /// Provider-side teardown may finish later; its result is never observed.
    fn cancel_host(&mut self, ticket: Self::HostTicket);

    /// Abandon a resolve request.
    fn cancel_resolve(&mut self, ticket: Self::ResolveTicket);
}
