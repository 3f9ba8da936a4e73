// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The workflow state machine.

use alloc::collections::BTreeSet;
use alloc::vec::{Drain, Vec};
use core::fmt;
use core::mem;

use tracing::{debug, info, warn};
use understory_anchor::{
    AnchorHistoryEntry, AnchorProvider, AnchorStore, CloudAnchorId, Quality, SessionState,
    TrackingReason, TrackingSource,
};
use understory_anchor_session::{
    AlreadyInProgress, HostOutcome, HostingSession, ResolveOutcome, ResolvingSession,
};

use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::notice::{Instruction, Notice};
use crate::state::{Changes, HostingPhase, Mode, State};

/// Drives hosting and resolving from a once-per-frame [`tick`](Self::tick).
///
/// The controller owns its three collaborators: the [`AnchorProvider`], the
/// [`TrackingSource`], and the [`AnchorStore`]. It also owns one
/// [`HostingSession`] and one [`ResolvingSession`]. All state changes happen
/// synchronously inside the method that caused them.
///
/// ## Lifecycle
///
/// 1. [`select_mode`](Self::select_mode) enters [`Mode::Hosting`] or
///    [`Mode::Resolving`] and restarts the warm-up timer. No session is driven
///    until the warm-up has elapsed.
/// 2. Hosting: [`place_anchor`](Self::place_anchor) supplies the local anchor.
///    Each tick then estimates mapping quality and starts hosting on the first
///    tick the estimate is [`Quality::Good`]. On success the controller waits in
///    [`HostingPhase::AwaitingSave`] for [`confirm_save`](Self::confirm_save) or
///    [`discard`](Self::discard). On failure it returns to [`State::Idle`].
///    Returning to idle releases the placed anchor.
/// 3. Resolving: [`queue_resolve`](Self::queue_resolve) or
///    [`resolve_saved`](Self::resolve_saved) fill the resolving set. The whole
///    set is issued as one batch once the session is idle and tracking.
/// 4. If the AR session enters an error state, both sessions are cancelled and
///    the controller moves to [`State::Returning`] until [`reset`](Self::reset).
///
/// Every outcome is reported as a [`Notice`] exactly once; nothing is retried
/// automatically.
pub struct WorkflowController<P: AnchorProvider, T, S> {
    config: WorkflowConfig,
    provider: P,
    tracking: T,
    store: S,
    state: State,
    warm_up_elapsed: f32,
    warmed_up: bool,
    return_elapsed: f32,
    returned_home: bool,
    anchor: Option<P::Anchor>,
    hosting: HostingSession<P>,
    resolving: ResolvingSession<P>,
    queued: BTreeSet<CloudAnchorId>,
    resolved: Vec<(CloudAnchorId, P::Resolved)>,
    pending_entry: Option<AnchorHistoryEntry>,
    last_saved: Option<AnchorHistoryEntry>,
    quality: Option<Quality>,
    tracking_reason: TrackingReason,
    notices: Vec<Notice>,
}

impl<P, T, S> WorkflowController<P, T, S>
where
    P: AnchorProvider,
    T: TrackingSource,
    S: AnchorStore,
{
    /// Create an idle controller with the default configuration.
    pub fn new(provider: P, tracking: T, store: S) -> Self {
        Self::with_config(provider, tracking, store, WorkflowConfig::default())
    }

    /// Create an idle controller with `config`.
    pub fn with_config(provider: P, tracking: T, store: S, config: WorkflowConfig) -> Self {
        let hosting = HostingSession::with_ttl_days(config.host_ttl_days);
        Self {
            config,
            provider,
            tracking,
            store,
            state: State::Idle,
            warm_up_elapsed: 0.0,
            warmed_up: false,
            return_elapsed: 0.0,
            returned_home: false,
            anchor: None,
            hosting,
            resolving: ResolvingSession::new(),
            queued: BTreeSet::new(),
            resolved: Vec::new(),
            pending_entry: None,
            last_saved: None,
            quality: None,
            tracking_reason: TrackingReason::None,
            notices: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    /// Whether the current mode is still warming up.
    pub fn is_warming_up(&self) -> bool {
        !matches!(self.state, State::Idle | State::Returning)
            && !self.warmed_up
    }

    /// Configuration in use.
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Most recent mapping quality estimate for the placed anchor.
    pub fn quality(&self) -> Option<Quality> {
        self.quality
    }

    /// Most recently observed not-tracking reason.
    pub fn tracking_reason(&self) -> TrackingReason {
        self.tracking_reason
    }

    /// The placed local anchor, if any.
    pub fn anchor(&self) -> Option<&P::Anchor> {
        self.anchor.as_ref()
    }

    /// Anchors resolved in the current mode.
    pub fn resolved_anchors(&self) -> impl Iterator<Item = (&CloudAnchorId, &P::Resolved)> + '_ {
        self.resolved.iter().map(|(id, anchor)| (id, anchor))
    }

    /// Ids waiting to be issued as the next resolve batch.
    pub fn queued_ids(&self) -> impl Iterator<Item = &CloudAnchorId> + '_ {
        self.queued.iter()
    }

    /// Whether a resolve batch is outstanding.
    pub fn is_resolving(&self) -> bool {
        !self.resolving.is_idle()
    }

    /// The hosted entry waiting to be saved, if any.
    pub fn pending_entry(&self) -> Option<&AnchorHistoryEntry> {
        self.pending_entry.as_ref()
    }

    /// The last entry saved by [`confirm_save`](Self::confirm_save).
    ///
    /// Its id is what the user shares with other devices.
    pub fn last_saved(&self) -> Option<&AnchorHistoryEntry> {
        self.last_saved.as_ref()
    }

    /// Borrow the provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Mutably borrow the provider, for example to place a local anchor.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Borrow the tracking source.
    pub fn tracking(&self) -> &T {
        &self.tracking
    }

    /// Mutably borrow the tracking source.
    pub fn tracking_mut(&mut self) -> &mut T {
        &mut self.tracking
    }

    /// Borrow the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Take every notice emitted since the last call, oldest first.
    pub fn drain_notices(&mut self) -> Drain<'_, Notice> {
        self.notices.drain(..)
    }

    /// Switch to `mode`.
    ///
    /// Selecting the current mode does nothing. Any other selection tears the
    /// current mode down (cancelling sessions and releasing anchors) and, for
    /// hosting or resolving, restarts the warm-up timer. Ids queued for
    /// resolving survive only a switch into [`Mode::Resolving`].
    pub fn select_mode(&mut self, mode: Mode) -> Result<(), WorkflowError> {
        if self.state == State::Returning {
            return Err(WorkflowError::TrackingInvalid);
        }
        if self.mode() == mode {
            return Ok(());
        }
        debug!(from = ?self.mode(), to = ?mode, "switching workflow mode");
        self.teardown();
        if mode != Mode::Resolving {
            self.queued.clear();
        }
        self.state = match mode {
            Mode::Idle => State::Idle,
            Mode::Hosting => State::Hosting(HostingPhase::AwaitingAnchor),
            Mode::Resolving => State::Resolving,
        };
        if mode != Mode::Idle {
            self.warm_up_elapsed = 0.0;
            self.warmed_up = false;
            self.notices.push(Notice::Instruction(Instruction::DetectingSurface));
        }
        Ok(())
    }

    /// Supply the local anchor to host.
    ///
    /// Only accepted in [`HostingPhase::AwaitingAnchor`]. A rejected anchor is
    /// dropped, which releases it.
    pub fn place_anchor(&mut self, anchor: P::Anchor) -> Result<(), WorkflowError> {
        match self.state {
            State::Returning => Err(WorkflowError::TrackingInvalid),
            State::Hosting(HostingPhase::AwaitingAnchor) => {
                debug!("anchor placed; waiting for mapping quality");
                self.anchor = Some(anchor);
                self.state = State::Hosting(HostingPhase::AwaitingQuality);
                self.notices.push(Notice::Instruction(Instruction::WalkAround));
                Ok(())
            }
            State::Hosting(_) => Err(AlreadyInProgress.into()),
            State::Idle | State::Resolving => Err(WorkflowError::WrongMode {
                expected: Mode::Hosting,
                actual: self.mode(),
            }),
        }
    }

    /// Add ids to the resolving set, entering [`Mode::Resolving`] if needed.
    ///
    /// Returns how many ids were not already queued.
    pub fn queue_resolve<I>(&mut self, ids: I) -> Result<usize, WorkflowError>
    where
        I: IntoIterator<Item = CloudAnchorId>,
    {
        self.select_mode(Mode::Resolving)?;
        let before = self.queued.len();
        self.queued.extend(ids);
        let added = self.queued.len() - before;
        debug!(added, queued = self.queued.len(), "ids queued for resolving");
        Ok(added)
    }

    /// Queue every saved anchor for resolving, replacing the current set.
    ///
    /// Returns the number of ids queued; zero when nothing has been saved.
    pub fn resolve_saved(&mut self) -> Result<usize, WorkflowError> {
        self.select_mode(Mode::Resolving)?;
        let saved = self.store.load_all();
        if saved.is_empty() {
            self.notices.push(Notice::Instruction(Instruction::NoSavedAnchors));
            return Ok(0);
        }
        self.queued.clear();
        self.queued.extend(saved.into_iter().map(|entry| entry.id));
        self.notices.push(Notice::Instruction(Instruction::ResolvingSaved));
        Ok(self.queued.len())
    }

    /// Advance the workflow by `dt`.
    ///
    /// Negative or non-finite `dt` is treated as zero. The tick that completes
    /// the warm-up only emits the first instruction; sessions are driven from
    /// the next tick on.
    pub fn tick(&mut self, dt: f32) -> Changes {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut changes = Changes::empty();
        match self.state {
            State::Idle => return changes,
            State::Returning => {
                self.tick_returning(dt, &mut changes);
                return changes;
            }
            State::Hosting(_) | State::Resolving => {}
        }

        if !self.warmed_up {
            self.warm_up_elapsed += dt;
            if self.warm_up_elapsed < self.config.warm_up {
                return changes;
            }
            debug!(mode = ?self.mode(), "warm-up finished");
            self.warmed_up = true;
            let instruction = match self.state {
                State::Resolving => Instruction::LookAround,
                _ => Instruction::TapToPlace,
            };
            self.notices.push(Notice::Instruction(instruction));
            changes |= Changes::WARMED_UP;
            return changes;
        }

        let session_state = self.tracking.session_state();
        if !session_state.is_operational() {
            self.abort(session_state);
            changes |= Changes::STATE;
            return changes;
        }
        self.update_tracking_help(&mut changes);

        match self.state {
            State::Hosting(_) => self.tick_hosting(&mut changes),
            State::Resolving => self.tick_resolving(session_state, &mut changes),
            State::Idle | State::Returning => {}
        }
        changes
    }

    /// Save the hosted entry, optionally under a new name.
    ///
    /// The entry is handed to the store exactly once. An invalid name leaves
    /// the entry waiting so the caller can try again.
    pub fn confirm_save(
        &mut self,
        name: Option<&str>,
    ) -> Result<AnchorHistoryEntry, WorkflowError> {
        if self.state == State::Returning {
            return Err(WorkflowError::TrackingInvalid);
        }
        if self.state != State::Hosting(HostingPhase::AwaitingSave) {
            return Err(WorkflowError::NothingToSave);
        }
        let entry = self
            .pending_entry
            .as_mut()
            .ok_or(WorkflowError::NothingToSave)?;
        if let Some(name) = name {
            entry.rename(name)?;
        }
        let entry = self
            .pending_entry
            .take()
            .ok_or(WorkflowError::NothingToSave)?;
        info!(id = %entry.id, name = %entry.name, "saving hosted anchor");
        self.store.save(entry.clone());
        self.last_saved = Some(entry.clone());
        self.teardown();
        self.state = State::Idle;
        self.notices.push(Notice::Saved(entry.clone()));
        Ok(entry)
    }

    /// Drop the hosted entry without saving it.
    ///
    /// Returns `false` if nothing was waiting to be saved.
    pub fn discard(&mut self) -> bool {
        if self.state != State::Hosting(HostingPhase::AwaitingSave) {
            return false;
        }
        debug!("discarding hosted anchor");
        self.teardown();
        self.state = State::Idle;
        true
    }

    /// Return to [`State::Idle`] from any state, including [`State::Returning`].
    ///
    /// Cancels both sessions and releases every anchor. Saved history and
    /// [`last_saved`](Self::last_saved) are kept.
    pub fn reset(&mut self) {
        debug!(state = ?self.state, "resetting workflow");
        self.teardown();
        self.queued.clear();
        self.state = State::Idle;
        self.warm_up_elapsed = 0.0;
        self.warmed_up = false;
        self.return_elapsed = 0.0;
        self.returned_home = false;
        self.tracking_reason = TrackingReason::None;
    }

    fn tick_hosting(&mut self, changes: &mut Changes) {
        match self.hosting.poll(&mut self.provider) {
            HostOutcome::None => {}
            HostOutcome::Succeeded(id) => {
                let entry =
                    AnchorHistoryEntry::sequential(id, &self.config.name_prefix, self.store.len());
                info!(id = %entry.id, name = %entry.name, "hosting finished; awaiting save");
                self.pending_entry = Some(entry.clone());
                self.state = State::Hosting(HostingPhase::AwaitingSave);
                self.notices.push(Notice::Instruction(Instruction::Finished));
                self.notices.push(Notice::Hosted(entry));
                *changes |= Changes::STATE | Changes::HOST_OUTCOME;
                return;
            }
            HostOutcome::Failed(failure) => {
                warn!(%failure, "hosting failed; returning to idle");
                self.teardown();
                self.state = State::Idle;
                self.notices.push(Notice::Instruction(Instruction::HostFailed));
                self.notices.push(Notice::HostFailed(failure));
                *changes |= Changes::STATE | Changes::HOST_OUTCOME;
                return;
            }
        }

        if self.state != State::Hosting(HostingPhase::AwaitingQuality) || !self.hosting.is_idle() {
            return;
        }
        let Some(anchor) = self.anchor.as_ref() else {
            return;
        };
        let quality = self.provider.estimate_map_quality(&self.tracking.camera_pose());
        if self.quality != Some(quality) {
            debug!(%quality, "mapping quality changed");
            self.quality = Some(quality);
            self.notices.push(Notice::Quality(quality));
            *changes |= Changes::QUALITY;
        }
        if !quality.is_good() {
            return;
        }
        if self.hosting.start(&mut self.provider, anchor).is_ok() {
            info!("mapping quality is good; hosting anchor");
            self.state = State::Hosting(HostingPhase::InFlight);
            self.notices.push(Notice::Instruction(Instruction::Processing));
            *changes |= Changes::STATE;
        }
    }

    fn tick_resolving(&mut self, session_state: SessionState, changes: &mut Changes) {
        let outcomes = self.resolving.poll(&mut self.provider);
        if !outcomes.is_empty() {
            *changes |= Changes::RESOLVE_OUTCOMES;
        }
        for outcome in outcomes {
            match outcome {
                ResolveOutcome::Succeeded { id, anchor } => {
                    self.notices.push(Notice::Instruction(Instruction::ResolveSucceeded));
                    self.notices.push(Notice::Resolved(id.clone()));
                    self.resolved.push((id, anchor));
                }
                ResolveOutcome::Failed { id, failure } => {
                    self.notices.push(Notice::Instruction(Instruction::ResolveFailed));
                    self.notices.push(Notice::ResolveFailed { id, failure });
                }
            }
        }

        if self.queued.is_empty() || !self.resolving.is_idle() || !session_state.is_tracking() {
            return;
        }
        let batch = mem::take(&mut self.queued);
        info!(count = batch.len(), "resolving queued anchors");
        let count = self.resolving.enqueue(&mut self.provider, batch);
        self.notices.push(Notice::ResolveStarted { count });
        *changes |= Changes::RESOLVE_STARTED;
    }

    fn tick_returning(&mut self, dt: f32, changes: &mut Changes) {
        if self.returned_home {
            return;
        }
        self.return_elapsed += dt;
        if self.return_elapsed >= self.config.return_delay {
            self.returned_home = true;
            self.notices.push(Notice::ReturnHome);
            *changes |= Changes::RETURN_HOME;
        }
    }

    fn update_tracking_help(&mut self, changes: &mut Changes) {
        let reason = self.tracking.not_tracking_reason();
        if reason == self.tracking_reason {
            return;
        }
        self.tracking_reason = reason;
        self.notices.push(Notice::TrackingHelp {
            reason,
            text: reason.helper_text(self.config.low_light_hint),
        });
        *changes |= Changes::TRACKING_HELP;
    }

    fn abort(&mut self, session_state: SessionState) {
        warn!(?session_state, "AR session entered an error state; returning");
        self.teardown();
        self.queued.clear();
        self.state = State::Returning;
        self.return_elapsed = 0.0;
        self.returned_home = false;
        self.notices.push(Notice::Returning(session_state));
    }

    /// Cancel both sessions and release everything the current mode holds.
    fn teardown(&mut self) {
        self.hosting.cancel(&mut self.provider);
        self.resolving.cancel(&mut self.provider);
        self.anchor = None;
        self.resolved.clear();
        self.pending_entry = None;
        self.quality = None;
    }
}

impl<P: AnchorProvider, T, S> fmt::Debug for WorkflowController<P, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowController")
            .field("state", &self.state)
            .field("warm_up_elapsed", &self.warm_up_elapsed)
            .field("warmed_up", &self.warmed_up)
            .field("hosting", &self.hosting)
            .field("resolving", &self.resolving)
            .field("queued", &self.queued)
            .field("resolved", &self.resolved.len())
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use understory_anchor::scripted::{MemoryStore, Script, ScriptedProvider, ScriptedTracking};
    use understory_anchor::{LowLightHint, ProviderFailure};

    use super::*;

    type Controller = WorkflowController<ScriptedProvider, ScriptedTracking, MemoryStore>;

    fn controller() -> Controller {
        controller_with(MemoryStore::new(), WorkflowConfig::default())
    }

    fn controller_with(store: MemoryStore, config: WorkflowConfig) -> Controller {
        WorkflowController::with_config(
            ScriptedProvider::new(),
            ScriptedTracking::default(),
            store,
            config.with_warm_up(1.0).with_return_delay(2.0),
        )
    }

    fn warm_up(c: &mut Controller) {
        assert!(c.tick(1.0).contains(Changes::WARMED_UP));
        c.drain_notices().for_each(drop);
    }

    /// Enter hosting, place an anchor, and run until the host request is in flight.
    fn host_in_flight(c: &mut Controller) {
        c.select_mode(Mode::Hosting).unwrap();
        warm_up(c);
        let anchor = c.provider_mut().create_anchor();
        c.place_anchor(anchor).unwrap();
        c.provider_mut().quality = Quality::Good;
        c.tick(0.1);
        assert_eq!(c.state(), State::Hosting(HostingPhase::InFlight));
        c.drain_notices().for_each(drop);
    }

    fn ids(list: &[&str]) -> Vec<CloudAnchorId> {
        list.iter().copied().map(CloudAnchorId::from).collect()
    }

    #[test]
    fn idle_ticks_do_nothing() {
        let mut c = controller();
        assert_eq!(c.tick(10.0), Changes::empty());
        assert_eq!(c.drain_notices().count(), 0);
        assert_eq!(c.provider().log().quality_estimates, 0);
    }

    #[test]
    fn warm_up_delays_the_first_instruction() {
        let mut c = controller();
        c.select_mode(Mode::Hosting).unwrap();
        assert!(c.is_warming_up());
        assert_eq!(c.tick(0.5), Changes::empty());
        assert_eq!(c.tick(0.5), Changes::WARMED_UP);
        assert!(!c.is_warming_up());
        let notices: Vec<_> = c.drain_notices().collect();
        assert_eq!(
            notices,
            [
                Notice::Instruction(Instruction::DetectingSurface),
                Notice::Instruction(Instruction::TapToPlace),
            ]
        );
    }

    #[test]
    fn zero_warm_up_still_emits_the_first_instruction() {
        let mut c: Controller = WorkflowController::with_config(
            ScriptedProvider::new(),
            ScriptedTracking::default(),
            MemoryStore::new(),
            WorkflowConfig::default().with_warm_up(0.0),
        );
        c.select_mode(Mode::Hosting).unwrap();
        assert_eq!(c.tick(0.1), Changes::WARMED_UP);
        for _ in 0..4 {
            assert!(!c.tick(0.1).contains(Changes::WARMED_UP));
        }
        let notices: Vec<_> = c.drain_notices().collect();
        assert_eq!(
            notices,
            [
                Notice::Instruction(Instruction::DetectingSurface),
                Notice::Instruction(Instruction::TapToPlace),
            ]
        );
    }

    #[test]
    fn non_finite_or_negative_dt_does_not_stall_warm_up() {
        let mut c = controller();
        c.select_mode(Mode::Resolving).unwrap();
        assert_eq!(c.tick(f32::NAN), Changes::empty());
        assert_eq!(c.tick(f32::INFINITY), Changes::empty());
        assert_eq!(c.tick(-5.0), Changes::empty());
        assert!(c.is_warming_up());
        assert_eq!(c.tick(1.0), Changes::WARMED_UP);
        assert!(
            c.drain_notices()
                .any(|n| n == Notice::Instruction(Instruction::LookAround))
        );
    }

    #[test]
    fn default_timings_are_three_units() {
        let mut c = WorkflowController::new(
            ScriptedProvider::new(),
            ScriptedTracking::default(),
            MemoryStore::new(),
        );
        c.select_mode(Mode::Hosting).unwrap();
        assert_eq!(c.tick(2.9), Changes::empty());
        assert!(c.is_warming_up());
        assert_eq!(c.tick(0.1), Changes::WARMED_UP);

        c.tracking_mut().state = SessionState::Unsupported;
        assert_eq!(c.tick(0.1), Changes::STATE);
        assert_eq!(c.tick(2.9), Changes::empty());
        assert_eq!(c.tick(0.1), Changes::RETURN_HOME);
    }

    #[test]
    fn nothing_is_estimated_while_warming_up() {
        let mut c = controller();
        c.select_mode(Mode::Hosting).unwrap();
        let anchor = c.provider_mut().create_anchor();
        c.place_anchor(anchor).unwrap();
        c.provider_mut().quality = Quality::Good;
        c.tick(0.5);
        assert_eq!(c.provider().log().quality_estimates, 0);
        assert!(c.provider().log().host_requests.is_empty());
    }

    #[test]
    fn hosting_waits_for_good_quality() {
        let mut c = controller();
        c.select_mode(Mode::Hosting).unwrap();
        warm_up(&mut c);
        let anchor = c.provider_mut().create_anchor();
        c.place_anchor(anchor).unwrap();
        assert_eq!(c.state(), State::Hosting(HostingPhase::AwaitingQuality));

        assert!(c.tick(0.1).contains(Changes::QUALITY));
        c.provider_mut().quality = Quality::Sufficient;
        assert!(c.tick(0.1).contains(Changes::QUALITY));
        assert!(!c.tick(0.1).contains(Changes::QUALITY));
        assert!(c.provider().log().host_requests.is_empty());
        assert_eq!(c.provider().log().quality_estimates, 3);

        c.provider_mut().quality = Quality::Good;
        let changes = c.tick(0.1);
        assert!(changes.contains(Changes::QUALITY | Changes::STATE));
        assert_eq!(c.state(), State::Hosting(HostingPhase::InFlight));
        assert_eq!(c.provider().log().host_requests, [(1, 1)]);

        let notices: Vec<_> = c.drain_notices().collect();
        assert_eq!(
            notices,
            [
                Notice::Instruction(Instruction::WalkAround),
                Notice::Quality(Quality::Insufficient),
                Notice::Quality(Quality::Sufficient),
                Notice::Quality(Quality::Good),
                Notice::Instruction(Instruction::Processing),
            ]
        );
    }

    #[test]
    fn configured_ttl_is_clamped_before_hosting() {
        let mut c = controller_with(
            MemoryStore::new(),
            WorkflowConfig::default().with_host_ttl_days(400),
        );
        host_in_flight(&mut c);
        assert_eq!(c.provider().log().host_requests, [(1, 365)]);
    }

    #[test]
    fn hosted_anchor_is_saved_exactly_once() {
        let mut c = controller();
        host_in_flight(&mut c);

        let changes = c.tick(0.1);
        assert!(changes.contains(Changes::HOST_OUTCOME));
        assert_eq!(c.state(), State::Hosting(HostingPhase::AwaitingSave));
        let pending = c.pending_entry().cloned().unwrap();
        assert_eq!(pending.id.as_str(), "cloud-2");
        assert_eq!(pending.name, "CloudAnchor0");
        assert!(c.store().is_empty());

        let saved = c.confirm_save(None).unwrap();
        assert_eq!(saved, pending);
        assert_eq!(c.store().entries(), [pending.clone()]);
        assert_eq!(c.last_saved(), Some(&pending));
        assert_eq!(c.state(), State::Idle);
        assert_eq!(c.provider().live_anchors(), 0);

        assert_eq!(c.confirm_save(None), Err(WorkflowError::NothingToSave));
        assert_eq!(c.store().len(), 1);

        let notices: Vec<_> = c.drain_notices().collect();
        assert_eq!(
            notices,
            [
                Notice::Instruction(Instruction::Finished),
                Notice::Hosted(pending.clone()),
                Notice::Saved(pending),
            ]
        );
    }

    #[test]
    fn generated_names_count_saved_entries() {
        let existing = vec![AnchorHistoryEntry::new("old".into(), "kitchen")];
        let mut c = controller_with(MemoryStore::with_entries(existing), WorkflowConfig::default());
        host_in_flight(&mut c);
        c.tick(0.1);
        assert_eq!(c.pending_entry().map(|e| e.name.as_str()), Some("CloudAnchor1"));
    }

    #[test]
    fn invalid_name_keeps_the_entry_pending() {
        let mut c = controller();
        host_in_flight(&mut c);
        c.tick(0.1);

        let err = c.confirm_save(Some("my anchor")).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidName(_)));
        assert_eq!(c.state(), State::Hosting(HostingPhase::AwaitingSave));
        assert!(c.store().is_empty());

        let saved = c.confirm_save(Some("front_door")).unwrap();
        assert_eq!(saved.name, "front_door");
        assert_eq!(c.store().entries()[0].name, "front_door");
    }

    #[test]
    fn discard_drops_the_entry() {
        let mut c = controller();
        host_in_flight(&mut c);
        c.tick(0.1);
        assert!(c.discard());
        assert!(!c.discard());
        assert_eq!(c.state(), State::Idle);
        assert!(c.store().is_empty());
        assert_eq!(c.pending_entry(), None);
        assert_eq!(c.provider().live_anchors(), 0);
    }

    #[test]
    fn host_failure_returns_to_idle() {
        let mut c = controller();
        c.provider_mut()
            .script_host(Script::fail_on_poll(1, ProviderFailure::ResourceExhausted));
        host_in_flight(&mut c);

        let changes = c.tick(0.1);
        assert!(changes.contains(Changes::STATE | Changes::HOST_OUTCOME));
        assert_eq!(c.state(), State::Idle);
        assert_eq!(c.provider().live_anchors(), 0);
        assert!(c.store().is_empty());
        let notices: Vec<_> = c.drain_notices().collect();
        assert_eq!(
            notices,
            [
                Notice::Instruction(Instruction::HostFailed),
                Notice::HostFailed(ProviderFailure::ResourceExhausted),
            ]
        );
        // Not retried.
        c.tick(0.1);
        assert_eq!(c.provider().log().host_requests.len(), 1);
    }

    #[test]
    fn synchronous_rejection_is_reported_on_the_next_tick() {
        let mut c = controller();
        c.provider_mut()
            .script_host(Script::reject(ProviderFailure::NotAuthorized));
        host_in_flight(&mut c);
        c.tick(0.1);
        assert_eq!(c.state(), State::Idle);
        assert!(
            c.drain_notices()
                .any(|n| n == Notice::HostFailed(ProviderFailure::NotAuthorized))
        );
    }

    #[test]
    fn place_anchor_is_checked_against_state() {
        let mut c = controller();
        let anchor = c.provider_mut().create_anchor();
        assert_eq!(
            c.place_anchor(anchor),
            Err(WorkflowError::WrongMode {
                expected: Mode::Hosting,
                actual: Mode::Idle,
            })
        );
        assert_eq!(c.provider().live_anchors(), 0);

        host_in_flight(&mut c);
        let second = c.provider_mut().create_anchor();
        assert_eq!(
            c.place_anchor(second),
            Err(WorkflowError::AlreadyInProgress(AlreadyInProgress))
        );
        assert_eq!(c.provider().live_anchors(), 1);
    }

    #[test]
    fn resolve_batch_reports_every_id_once() {
        let mut c = controller();
        c.provider_mut().script_resolve(
            "C".into(),
            Script::fail_on_poll(2, ProviderFailure::CloudIdNotFound),
        );
        assert_eq!(c.queue_resolve(ids(&["A", "B", "C", "A"])), Ok(3));
        assert_eq!(c.mode(), Mode::Resolving);
        warm_up(&mut c);

        assert!(c.tick(0.1).contains(Changes::RESOLVE_STARTED));
        assert!(c.is_resolving());
        assert_eq!(c.provider().log().resolve_requests, ids(&["A", "B", "C"]));
        assert_eq!(c.queued_ids().count(), 0);

        assert!(c.tick(0.1).contains(Changes::RESOLVE_OUTCOMES));
        assert_eq!(c.resolved_anchors().count(), 2);
        assert!(c.tick(0.1).contains(Changes::RESOLVE_OUTCOMES));
        assert!(!c.is_resolving());
        assert_eq!(c.tick(0.1), Changes::empty());

        let notices: Vec<_> = c.drain_notices().collect();
        assert_eq!(notices[0], Notice::ResolveStarted { count: 3 });
        let mut resolved: Vec<_> = notices
            .iter()
            .filter_map(|n| match n {
                Notice::Resolved(id) => Some(id.as_str()),
                _ => None,
            })
            .collect();
        resolved.sort_unstable();
        assert_eq!(resolved, ["A", "B"]);
        assert_eq!(
            notices.last(),
            Some(&Notice::ResolveFailed {
                id: "C".into(),
                failure: ProviderFailure::CloudIdNotFound,
            })
        );
        assert_eq!(c.provider().live_anchors(), 2);

        c.reset();
        assert_eq!(c.provider().live_anchors(), 0);
        assert_eq!(c.state(), State::Idle);
    }

    #[test]
    fn ids_queued_mid_batch_wait_for_the_next_one() {
        let mut c = controller();
        c.provider_mut()
            .script_resolve("A".into(), Script::succeed_on_poll(2));
        c.queue_resolve(ids(&["A"])).unwrap();
        warm_up(&mut c);
        c.tick(0.1);
        assert_eq!(c.queue_resolve(ids(&["D"])), Ok(1));
        assert!(!c.is_warming_up());

        c.tick(0.1);
        assert_eq!(c.provider().log().resolve_requests, ids(&["A"]));
        let changes = c.tick(0.1);
        assert!(changes.contains(Changes::RESOLVE_OUTCOMES | Changes::RESOLVE_STARTED));
        assert_eq!(c.provider().log().resolve_requests, ids(&["A", "D"]));
    }

    #[test]
    fn resolving_waits_for_tracking() {
        let mut c = controller();
        c.queue_resolve(ids(&["A"])).unwrap();
        warm_up(&mut c);
        c.tracking_mut().state = SessionState::SessionInitializing;
        c.tick(0.1);
        assert!(c.provider().log().resolve_requests.is_empty());
        assert_eq!(c.state(), State::Resolving);

        c.tracking_mut().state = SessionState::SessionTracking;
        assert!(c.tick(0.1).contains(Changes::RESOLVE_STARTED));
    }

    #[test]
    fn resolve_saved_loads_the_store() {
        let saved = vec![
            AnchorHistoryEntry::new("x1".into(), "one"),
            AnchorHistoryEntry::new("x2".into(), "two"),
        ];
        let mut c = controller_with(MemoryStore::with_entries(saved), WorkflowConfig::default());
        assert_eq!(c.resolve_saved(), Ok(2));
        assert_eq!(c.queued_ids().cloned().collect::<Vec<_>>(), ids(&["x1", "x2"]));
        assert!(
            c.drain_notices()
                .any(|n| n == Notice::Instruction(Instruction::ResolvingSaved))
        );

        let mut empty = controller();
        assert_eq!(empty.resolve_saved(), Ok(0));
        assert!(
            empty
                .drain_notices()
                .any(|n| n == Notice::Instruction(Instruction::NoSavedAnchors))
        );
    }

    #[test]
    fn session_error_aborts_until_reset() {
        let mut c = controller();
        host_in_flight(&mut c);
        c.tracking_mut().state = SessionState::Unsupported;

        assert_eq!(c.tick(0.1), Changes::STATE);
        assert_eq!(c.state(), State::Returning);
        assert_eq!(c.mode(), Mode::Idle);
        assert_eq!(c.provider().log().cancelled_hosts, 1);
        assert_eq!(c.provider().live_anchors(), 0);
        assert_eq!(
            c.drain_notices().collect::<Vec<_>>(),
            [Notice::Returning(SessionState::Unsupported)]
        );

        assert_eq!(c.select_mode(Mode::Hosting), Err(WorkflowError::TrackingInvalid));
        assert_eq!(c.confirm_save(None), Err(WorkflowError::TrackingInvalid));
        assert_eq!(c.queue_resolve(ids(&["A"])), Err(WorkflowError::TrackingInvalid));

        assert_eq!(c.tick(1.0), Changes::empty());
        assert_eq!(c.tick(1.0), Changes::RETURN_HOME);
        assert_eq!(c.tick(1.0), Changes::empty());
        assert_eq!(c.drain_notices().collect::<Vec<_>>(), [Notice::ReturnHome]);

        c.reset();
        assert_eq!(c.state(), State::Idle);
        assert_eq!(c.select_mode(Mode::Hosting), Ok(()));
    }

    #[test]
    fn abort_cancels_outstanding_resolves() {
        let mut c = controller();
        c.provider_mut()
            .script_resolve("A".into(), Script::succeed_on_poll(5));
        c.queue_resolve(ids(&["A"])).unwrap();
        warm_up(&mut c);
        c.tick(0.1);
        c.tracking_mut().state = SessionState::NeedsInstall;
        c.tick(0.1);
        assert_eq!(c.provider().log().cancelled_resolves, ids(&["A"]));
        assert!(!c.is_resolving());
    }

    #[test]
    fn tracking_help_follows_the_reason() {
        let mut c = controller_with(
            MemoryStore::new(),
            WorkflowConfig::default().with_low_light_hint(LowLightHint::CameraPrivacyToggle),
        );
        c.select_mode(Mode::Hosting).unwrap();
        warm_up(&mut c);

        c.tracking_mut().reason = TrackingReason::InsufficientLight;
        assert!(c.tick(0.1).contains(Changes::TRACKING_HELP));
        assert!(!c.tick(0.1).contains(Changes::TRACKING_HELP));
        c.tracking_mut().reason = TrackingReason::None;
        assert!(c.tick(0.1).contains(Changes::TRACKING_HELP));

        let notices: Vec<_> = c.drain_notices().collect();
        assert_eq!(
            notices,
            [
                Notice::TrackingHelp {
                    reason: TrackingReason::InsufficientLight,
                    text: TrackingReason::InsufficientLight
                        .helper_text(LowLightHint::CameraPrivacyToggle),
                },
                Notice::TrackingHelp {
                    reason: TrackingReason::None,
                    text: None,
                },
            ]
        );
    }

    #[test]
    fn switching_modes_releases_everything() {
        let mut c = controller();
        c.queue_resolve(ids(&["A", "B"])).unwrap();
        warm_up(&mut c);
        c.tick(0.1);
        c.tick(0.1);
        assert_eq!(c.provider().live_anchors(), 2);

        // Reselecting the current mode keeps the warm-up finished.
        c.select_mode(Mode::Resolving).unwrap();
        assert!(!c.is_warming_up());
        assert_eq!(c.provider().live_anchors(), 2);

        c.queue_resolve(ids(&["C"])).unwrap();
        c.select_mode(Mode::Hosting).unwrap();
        assert_eq!(c.provider().live_anchors(), 0);
        assert_eq!(c.queued_ids().count(), 0);
        assert!(c.is_warming_up());
    }
}
