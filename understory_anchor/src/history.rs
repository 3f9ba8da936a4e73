// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Saved anchor history and the persistence seam.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::types::CloudAnchorId;

/// Prefix used for generated display names, as in `CloudAnchor3`.
pub const DEFAULT_NAME_PREFIX: &str = "CloudAnchor";

/// A hosted anchor remembered across sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorHistoryEntry {
    /// Identifier returned by the provider.
    pub id: CloudAnchorId,
    /// Name shown to the user.
    pub name: String,
}

impl AnchorHistoryEntry {
    /// Create an entry with an explicit name.
    pub fn new(id: CloudAnchorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Create an entry named after the number of entries already saved.
    ///
    /// With `saved == 2` and the default prefix this yields `CloudAnchor2`.
    pub fn sequential(id: CloudAnchorId, prefix: &str, saved: usize) -> Self {
        Self::new(id, format!("{prefix}{saved}"))
    }

    /// Rename the entry after validating the new name.
    pub fn rename(&mut self, name: &str) -> Result<(), NameError> {
        validate_name(name)?;
        self.name = String::from(name);
        Ok(())
    }
}

/// Why a display name was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The name is empty.
    #[error("anchor name must not be empty")]
    Empty,
    /// The name contains a character outside `[A-Za-z0-9_-]`.
    #[error("anchor name contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Check that `name` is non-empty and only uses ASCII letters, digits, `-`, and `_`.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    match name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        Some(c) => Err(NameError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

/// Persistent store of saved anchors.
pub trait AnchorStore {
    /// Persist one entry.
    fn save(&mut self, entry: AnchorHistoryEntry);

    /// All persisted entries, oldest first.
    fn load_all(&self) -> Vec<AnchorHistoryEntry>;

    /// Number of persisted entries.
    fn len(&self) -> usize {
        self.load_all().len()
    }

    /// Whether nothing has been persisted yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
