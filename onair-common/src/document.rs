//! Remote document shape and merge-write patches
//!
//! The remote store holds a single flat document per well-known path: one
//! [`FieldState`] entry per [`FieldName`]. All mutation happens through
//! [`DocumentPatch`] merge-writes; the document is never replaced
//! wholesale, so concurrent operators touching unrelated fields cannot
//! clobber each other.

use crate::fields::{FieldContent, FieldName, FieldState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full on-air document as stored at the remote path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OnAirDocument {
    pub fields: BTreeMap<FieldName, FieldState>,
}

impl OnAirDocument {
    /// Document with every field hidden and empty
    pub fn hidden() -> Self {
        let mut fields = BTreeMap::new();
        for field in FieldName::all() {
            fields.insert(field, FieldState::hidden());
        }
        Self { fields }
    }

    /// Field state, defaulting to hidden/empty when the entry is absent
    pub fn field(&self, name: FieldName) -> FieldState {
        self.fields.get(&name).cloned().unwrap_or_default()
    }

    /// Apply a merge patch in place
    ///
    /// Patched attributes overwrite existing ones; attributes the patch
    /// does not mention are preserved. A `visible` of `None` leaves the
    /// current visibility untouched.
    pub fn apply(&mut self, patch: &DocumentPatch) {
        for (name, field_patch) in &patch.fields {
            let entry = self.fields.entry(*name).or_default();
            entry.content.merge(&field_patch.content);
            if let Some(visible) = field_patch.visible {
                entry.visible = visible;
            }
        }
    }
}

/// Partial update for one field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatch {
    /// New visibility, or `None` to leave unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    /// Attributes to merge over the current content
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, String>,
}

impl FieldPatch {
    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            content: BTreeMap::new(),
        }
    }

    pub fn with_content(mut self, content: &FieldContent) -> Self {
        self.content = content.0.clone();
        self
    }
}

/// Merge-write against the remote document
///
/// A single patch may touch several fields; the store applies it
/// atomically relative to its own notification stream (subscribers see
/// either none or all of the patch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPatch {
    pub fields: BTreeMap<FieldName, FieldPatch>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the patch entry for one field
    pub fn set(mut self, name: FieldName, patch: FieldPatch) -> Self {
        self.fields.insert(name, patch);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
