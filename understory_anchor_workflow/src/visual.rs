// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed lookup of the visual shown on placed and resolved anchors.

use alloc::string::String;
use core::str::FromStr;

/// Visual variants that can be attached to an anchor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AnchorVisual {
    /// The default visual.
    Default,
    /// Laughing face.
    Laughing,
    /// Thinking face.
    Thinking,
    /// Stars.
    Stars,
    /// Party popper.
    Party,
    /// Heart.
    Heart,
}

impl AnchorVisual {
    /// Every variant, in table order.
    pub const ALL: [Self; 6] = [
        Self::Default,
        Self::Laughing,
        Self::Thinking,
        Self::Stars,
        Self::Party,
        Self::Heart,
    ];

    /// Asset key of this visual.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Default => "CloudAnchor",
            Self::Laughing => "LaughingCloudAnchor",
            Self::Thinking => "ThinkingCloudAnchor",
            Self::Stars => "StarsCloudAnchor",
            Self::Party => "PartyCloudAnchor",
            Self::Heart => "HeartCloudAnchor",
        }
    }

    /// Slot among the non-default variants; `None` for the default.
    const fn variant_slot(self) -> Option<usize> {
        match self {
            Self::Default => None,
            other => Some(other as usize - 1),
        }
    }
}

impl FromStr for AnchorVisual {
    type Err = VisualError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|visual| visual.key() == key)
            .ok_or_else(|| VisualError::UnknownKey(String::from(key)))
    }
}

/// Why a visual could not be selected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VisualError {
    /// The key does not name any visual.
    #[error("no anchor visual is named {0:?}")]
    UnknownKey(String),
    /// The visual exists but no asset has been assigned to it.
    #[error("no asset is assigned to {0:?}")]
    Unassigned(AnchorVisual),
}

/// Asset handles per [`AnchorVisual`], plus the current selection.
///
/// The default visual always has a handle, so [`current`](Self::current)
/// never fails.
///
/// ```
/// use understory_anchor_workflow::{AnchorVisual, VisualError, VisualTable};
///
/// let mut table = VisualTable::new("cube.glb");
/// table.assign(AnchorVisual::Heart, "heart.glb");
///
/// assert_eq!(table.select_key("HeartCloudAnchor"), Ok(&"heart.glb"));
/// assert_eq!(
///     table.select(AnchorVisual::Stars),
///     Err(VisualError::Unassigned(AnchorVisual::Stars))
/// );
/// // A failed selection keeps the previous one.
/// assert_eq!(table.current(), &"heart.glb");
/// ```
#[derive(Clone, Debug)]
pub struct VisualTable<H> {
    default: H,
    variants: [Option<H>; 5],
    selected: AnchorVisual,
}

impl<H> VisualTable<H> {
    /// Create a table whose default visual uses `default`.
    pub fn new(default: H) -> Self {
        Self {
            default,
            variants: core::array::from_fn(|_| None),
            selected: AnchorVisual::Default,
        }
    }

    /// Assign a handle to `visual`, returning the previous one.
    pub fn assign(&mut self, visual: AnchorVisual, handle: H) -> Option<H> {
        match visual.variant_slot() {
            None => Some(core::mem::replace(&mut self.default, handle)),
            Some(slot) => self.variants[slot].replace(handle),
        }
    }

    /// Handle assigned to `visual`, if any.
    pub fn get(&self, visual: AnchorVisual) -> Option<&H> {
        match visual.variant_slot() {
            None => Some(&self.default),
            Some(slot) => self.variants[slot].as_ref(),
        }
    }

    /// Make `visual` the current selection.
    ///
    /// Fails without changing the selection if no handle is assigned.
    pub fn select(&mut self, visual: AnchorVisual) -> Result<&H, VisualError> {
        if self.get(visual).is_none() {
            tracing::warn!(?visual, "no asset assigned to anchor visual");
            return Err(VisualError::Unassigned(visual));
        }
        self.selected = visual;
        Ok(self.current())
    }

    /// Parse `key` and select the visual it names.
    pub fn select_key(&mut self, key: &str) -> Result<&H, VisualError> {
        let visual = key.parse()?;
        self.select(visual)
    }

    /// The selected visual.
    pub fn selected(&self) -> AnchorVisual {
        self.selected
    }

    /// Handle of the selected visual.
    pub fn current(&self) -> &H {
        self.get(self.selected).unwrap_or(&self.default)
    }
}
