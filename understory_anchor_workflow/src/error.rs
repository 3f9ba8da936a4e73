// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use understory_anchor::NameError;
use understory_anchor_session::AlreadyInProgress;

use crate::state::Mode;

/// Errors returned by [`WorkflowController`](crate::WorkflowController) operations.
///
/// Provider failures are not errors of the caller's request; they are reported
/// through [`Notice::HostFailed`](crate::Notice::HostFailed) and
/// [`Notice::ResolveFailed`](crate::Notice::ResolveFailed).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum WorkflowError {
    /// A request is already active; wait for it to finish.
    #[error(transparent)]
    AlreadyInProgress(#[from] AlreadyInProgress),
    /// The AR session failed and the workflow is returning; call `reset`.
    #[error("AR tracking is invalid; the workflow must be reset")]
    TrackingInvalid,
    /// The operation does not apply to the current mode.
    #[error("operation requires {expected:?} mode, but the workflow is in {actual:?} mode")]
    WrongMode {
        /// Mode the operation needs.
        expected: Mode,
        /// Current mode.
        actual: Mode,
    },
    /// No hosted anchor is waiting to be saved.
    #[error("no hosted anchor is awaiting save")]
    NothingToSave,
    /// The requested display name is not allowed.
    #[error(transparent)]
    InvalidName(#[from] NameError),
}
