//! Remote-driven reconciliation
//!
//! Decides, for each push notification from the document store, which
//! remote field states become local truth, which are echoes of our own
//! in-flight writes (skipped), and which are invalid external writes that
//! need a corrective force-off. The decision is pure; the engine actor
//! applies the outcome and issues the writes.

use crate::sync::controller::ControllerSet;
use onair_common::document::OnAirDocument;
use onair_common::fields::FieldState;
use onair_common::policy::ContentGate;
use onair_common::{FieldContent, FieldName};

/// What one reconciliation pass decided
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// First notification before initial load completed: ignore entirely
    pub bootstrap: bool,
    /// Remote states to adopt as new local truth
    pub adopt: Vec<(FieldName, FieldState)>,
    /// Fields whose remote `visible=true` violates the content gate and
    /// must be forced back off
    pub correct: Vec<FieldName>,
    /// Content-only remote changes (visibility already agrees)
    pub refresh: Vec<(FieldName, FieldContent)>,
}

/// Per-subscription reconciliation state
///
/// Notifications are assessed one at a time in delivery order; the engine
/// actor guarantees no two passes overlap.
pub struct Reconciler {
    bootstrapped: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            bootstrapped: false,
        }
    }

    /// Assess one remote snapshot against local truth
    pub fn assess(&mut self, doc: &OnAirDocument, controllers: &ControllerSet) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        // The very first notification is the bootstrap read, not a change
        if !self.bootstrapped {
            self.bootstrapped = true;
            outcome.bootstrap = true;
            return outcome;
        }

        for field in FieldName::all() {
            let remote = doc.field(field);
            let ctrl = controllers.get(field);

            // A difference caused by our own in-flight write settles on
            // its own; treating the echo as external would loop
            if ctrl.is_processing() {
                continue;
            }

            if remote.visible != ctrl.confirmed_visible() {
                if remote.visible && !ContentGate::allows(field, &remote.content) {
                    // Stale or buggy external writer: self-heal, never
                    // adopt visible-with-empty-content
                    outcome.correct.push(field);
                } else {
                    outcome.adopt.push((field, remote));
                }
            } else if remote.content != *ctrl.content() {
                outcome.refresh.push((field, remote.content));
            }
        }

        outcome
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_common::document::{DocumentPatch, FieldPatch};
    use onair_common::FieldContent;

    fn doc_with(field: FieldName, patch: FieldPatch) -> OnAirDocument {
        let mut doc = OnAirDocument::hidden();
        doc.apply(&DocumentPatch::new().set(field, patch));
        doc
    }

    fn reconciler_past_bootstrap(controllers: &ControllerSet) -> Reconciler {
        let mut reconciler = Reconciler::new();
        let outcome = reconciler.assess(&OnAirDocument::hidden(), controllers);
        assert!(outcome.bootstrap);
        reconciler
    }

    #[test]
    fn test_first_notification_is_bootstrap() {
        let controllers = ControllerSet::new();
        let mut reconciler = Reconciler::new();

        let doc = doc_with(FieldName::Logo, FieldPatch::visible(true));
        let outcome = reconciler.assess(&doc, &controllers);
        assert!(outcome.bootstrap);
        assert!(outcome.adopt.is_empty());

        // The same snapshot a second time is a real change
        let outcome = reconciler.assess(&doc, &controllers);
        assert!(!outcome.bootstrap);
        assert_eq!(outcome.adopt.len(), 1);
    }

    #[test]
    fn test_adopts_valid_remote_activation() {
        let controllers = ControllerSet::new();
        let mut reconciler = reconciler_past_bootstrap(&controllers);

        let doc = doc_with(
            FieldName::Guest,
            FieldPatch::visible(true).with_content(&FieldContent::from_pairs([("name", "Ana")])),
        );
        let outcome = reconciler.assess(&doc, &controllers);

        assert_eq!(outcome.adopt.len(), 1);
        assert_eq!(outcome.adopt[0].0, FieldName::Guest);
        assert!(outcome.correct.is_empty());
    }

    #[test]
    fn test_gated_remote_activation_is_corrected() {
        let controllers = ControllerSet::new();
        let mut reconciler = reconciler_past_bootstrap(&controllers);

        // Another client set visible=true on Topic with no topic text
        let doc = doc_with(FieldName::Topic, FieldPatch::visible(true));
        let outcome = reconciler.assess(&doc, &controllers);

        assert!(outcome.adopt.is_empty());
        assert_eq!(outcome.correct, vec![FieldName::Topic]);
    }

    #[test]
    fn test_processing_field_echo_is_skipped() {
        let mut controllers = ControllerSet::new();
        controllers
            .get_mut(FieldName::Logo)
            .begin_toggle(true, &Default::default())
            .unwrap();
        let mut reconciler = reconciler_past_bootstrap(&controllers);

        // The push reporting our own write must not be treated as external
        let doc = doc_with(FieldName::Logo, FieldPatch::visible(true));
        let outcome = reconciler.assess(&doc, &controllers);

        assert!(outcome.adopt.is_empty());
        assert!(outcome.correct.is_empty());
    }

    #[test]
    fn test_content_only_change_is_refreshed() {
        let controllers = ControllerSet::new();
        let mut reconciler = reconciler_past_bootstrap(&controllers);

        let doc = doc_with(
            FieldName::Guest,
            FieldPatch::default().with_content(&FieldContent::from_pairs([("name", "Bea")])),
        );
        let outcome = reconciler.assess(&doc, &controllers);

        assert!(outcome.adopt.is_empty());
        assert_eq!(outcome.refresh.len(), 1);
        assert_eq!(outcome.refresh[0].0, FieldName::Guest);
    }
}
