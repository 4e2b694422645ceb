//! Per-field sync state machine
//!
//! Serializes local toggle intents for one live field: NORMAL accepts a
//! toggle, PROCESSING holds further toggles off while the merge-write is
//! in flight and its settle window runs. The settle window doubles as
//! echo suppression: the reconciliation pass skips fields that are
//! processing, so the push caused by our own write does not loop back as
//! an external change.

use crate::error::{Error, Result};
use onair_common::document::{DocumentPatch, FieldPatch};
use onair_common::fields::FieldState;
use onair_common::policy::{ContentGate, MutualExclusionPolicy};
use onair_common::{FieldContent, FieldName};
use std::collections::BTreeMap;

/// State machine for one field of the mutual-exclusion group
#[derive(Debug)]
pub struct FieldSyncController {
    field: FieldName,
    /// Accepts new local toggle intents
    enabled: bool,
    /// A write is in flight / settling
    processing: bool,
    /// Last visibility known consistent with the remote document
    confirmed_visible: bool,
    /// Target of the write currently settling
    pending_target: Option<bool>,
    /// Latest known content for this field
    content: FieldContent,
}

impl FieldSyncController {
    /// Created at engine start: nothing confirmed, toggles accepted
    pub fn new(field: FieldName) -> Self {
        Self {
            field,
            enabled: true,
            processing: false,
            confirmed_visible: false,
            pending_target: None,
            content: FieldContent::empty(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn confirmed_visible(&self) -> bool {
        self.confirmed_visible
    }

    pub fn content(&self) -> &FieldContent {
        &self.content
    }

    /// Seed local truth from the initial document read
    pub fn seed(&mut self, state: &FieldState) {
        self.confirmed_visible = state.visible;
        self.content = state.content.clone();
    }

    /// Accept a local toggle intent and enter PROCESSING
    ///
    /// Returns the full merge-write to issue: this field's visibility,
    /// force-off entries for every mutually-exclusive field when turning
    /// on, and any caller-supplied extra attributes (pushed alongside the
    /// flag so the remote document is never visible with empty content,
    /// even transiently).
    pub fn begin_toggle(
        &mut self,
        target: bool,
        extra: &BTreeMap<String, String>,
    ) -> Result<DocumentPatch> {
        if target {
            let mut candidate = self.content.clone();
            candidate.merge(extra);
            if !ContentGate::allows(self.field, &candidate) {
                return Err(Error::ContentRejected { field: self.field });
            }
        }

        if self.processing {
            return Err(Error::Busy { field: self.field });
        }

        self.processing = true;
        self.enabled = false;
        self.pending_target = Some(target);
        self.content.merge(extra);

        let mut own = FieldPatch::visible(target);
        own.content = extra.clone();

        let mut patch = DocumentPatch::new().set(self.field, own);
        if target {
            for other in MutualExclusionPolicy::fields_to_disable(self.field) {
                patch = patch.set(other, FieldPatch::visible(false));
            }
        }
        Ok(patch)
    }

    /// Enter PROCESSING on behalf of an external combined write
    ///
    /// Used by the airing session's go-live write so the resulting echo
    /// is suppressed exactly like a toggle's own echo.
    pub fn begin_external_settle(&mut self, target: bool, content: FieldContent) {
        self.processing = true;
        self.enabled = false;
        self.pending_target = Some(target);
        self.content = content;
    }

    /// Settle window expired: success path back to NORMAL
    ///
    /// Returns the visibility that is now confirmed, or `None` when no
    /// write was settling (stale timer).
    pub fn settle(&mut self) -> Option<bool> {
        if !self.processing {
            return None;
        }
        self.processing = false;
        self.enabled = true;
        if let Some(target) = self.pending_target.take() {
            self.confirmed_visible = target;
        }
        Some(self.confirmed_visible)
    }

    /// Write failed: back to NORMAL with confirmed visibility unchanged
    pub fn revert(&mut self) {
        self.processing = false;
        self.enabled = true;
        self.pending_target = None;
    }

    /// Adopt a remote state as the new local truth
    pub fn adopt_remote(&mut self, state: &FieldState) {
        self.confirmed_visible = state.visible;
        self.content = state.content.clone();
    }

    /// Refresh content without touching visibility
    pub fn refresh_content(&mut self, content: &FieldContent) {
        self.content = content.clone();
    }
}

/// One controller per field of the on-air document
///
/// Fixed membership, so lookups are infallible by construction.
#[derive(Debug)]
pub struct ControllerSet {
    guest: FieldSyncController,
    topic: FieldSyncController,
    logo: FieldSyncController,
    advertisement: FieldSyncController,
}

impl ControllerSet {
    pub fn new() -> Self {
        Self {
            guest: FieldSyncController::new(FieldName::Guest),
            topic: FieldSyncController::new(FieldName::Topic),
            logo: FieldSyncController::new(FieldName::Logo),
            advertisement: FieldSyncController::new(FieldName::Advertisement),
        }
    }

    pub fn get(&self, field: FieldName) -> &FieldSyncController {
        match field {
            FieldName::Guest => &self.guest,
            FieldName::Topic => &self.topic,
            FieldName::Logo => &self.logo,
            FieldName::Advertisement => &self.advertisement,
        }
    }

    pub fn get_mut(&mut self, field: FieldName) -> &mut FieldSyncController {
        match field {
            FieldName::Guest => &mut self.guest,
            FieldName::Topic => &mut self.topic,
            FieldName::Logo => &mut self.logo,
            FieldName::Advertisement => &mut self.advertisement,
        }
    }
}

impl Default for ControllerSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_common::FieldContent;

    fn extra(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_toggle_on_includes_exclusions_and_content() {
        let mut ctrl = FieldSyncController::new(FieldName::Guest);
        let patch = ctrl
            .begin_toggle(true, &extra(&[("name", "Ana")]))
            .unwrap();

        let guest = &patch.fields[&FieldName::Guest];
        assert_eq!(guest.visible, Some(true));
        assert_eq!(guest.content.get("name").map(String::as_str), Some("Ana"));

        assert_eq!(patch.fields[&FieldName::Topic].visible, Some(false));
        assert_eq!(patch.fields[&FieldName::Advertisement].visible, Some(false));
        assert!(!patch.fields.contains_key(&FieldName::Logo));

        assert!(ctrl.is_processing());
        assert!(!ctrl.is_enabled());
    }

    #[test]
    fn test_toggle_off_writes_only_own_flag() {
        let mut ctrl = FieldSyncController::new(FieldName::Guest);
        let patch = ctrl.begin_toggle(false, &BTreeMap::new()).unwrap();

        assert_eq!(patch.fields.len(), 1);
        assert_eq!(patch.fields[&FieldName::Guest].visible, Some(false));
    }

    #[test]
    fn test_empty_content_is_rejected_without_state_change() {
        let mut ctrl = FieldSyncController::new(FieldName::Guest);
        let result = ctrl.begin_toggle(true, &BTreeMap::new());

        assert!(matches!(result, Err(Error::ContentRejected { .. })));
        assert!(!ctrl.is_processing());
        assert!(ctrl.is_enabled());
    }

    #[test]
    fn test_second_toggle_while_processing_is_busy() {
        let mut ctrl = FieldSyncController::new(FieldName::Logo);
        ctrl.begin_toggle(true, &BTreeMap::new()).unwrap();

        let result = ctrl.begin_toggle(true, &BTreeMap::new());
        assert!(matches!(result, Err(Error::Busy { .. })));
    }

    #[test]
    fn test_settle_confirms_target() {
        let mut ctrl = FieldSyncController::new(FieldName::Logo);
        ctrl.begin_toggle(true, &BTreeMap::new()).unwrap();

        assert_eq!(ctrl.settle(), Some(true));
        assert!(ctrl.confirmed_visible());
        assert!(!ctrl.is_processing());
        assert!(ctrl.is_enabled());

        // Stale timer after settling is a no-op
        assert_eq!(ctrl.settle(), None);
    }

    #[test]
    fn test_revert_keeps_confirmed_visibility() {
        let mut ctrl = FieldSyncController::new(FieldName::Logo);
        ctrl.begin_toggle(true, &BTreeMap::new()).unwrap();
        ctrl.revert();

        assert!(!ctrl.confirmed_visible());
        assert!(!ctrl.is_processing());
        assert!(ctrl.is_enabled());

        // Operator can retry immediately
        assert!(ctrl.begin_toggle(true, &BTreeMap::new()).is_ok());
    }

    #[test]
    fn test_gate_uses_previously_pushed_content() {
        let mut ctrl = FieldSyncController::new(FieldName::Guest);
        ctrl.seed(&FieldState::new(
            FieldContent::from_pairs([("name", "Ana")]),
            false,
        ));

        // No extra content needed; the stored name satisfies the gate
        assert!(ctrl.begin_toggle(true, &BTreeMap::new()).is_ok());
    }
}
