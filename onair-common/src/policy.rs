//! Content gate and mutual exclusion policy
//!
//! Two pure domain rules shared by the sync engine and its reconciliation
//! pass:
//!
//! - A field may only go visible when its required content is present
//!   (a lower-third with an empty guest name must never air).
//! - Only one "primary" overlay occupies the lower-third region at a
//!   time; the logo bug is visually disjoint and independent.

use crate::fields::{FieldContent, FieldName};

/// Decides whether a field is allowed to go visible given its content
pub struct ContentGate;

impl ContentGate {
    /// Required content check
    ///
    /// - Guest: requires a non-blank `name` (role/topic optional)
    /// - Topic: requires a non-blank `topic`
    /// - Logo, Advertisement: no content dependency, always allowed
    pub fn allows(field: FieldName, content: &FieldContent) -> bool {
        match field {
            FieldName::Guest => content.has("name"),
            FieldName::Topic => content.has("topic"),
            FieldName::Logo | FieldName::Advertisement => true,
        }
    }
}

/// Decides which fields must be forced off when another goes live
pub struct MutualExclusionPolicy;

impl MutualExclusionPolicy {
    /// Fields that must be turned off together with turning `target` on
    ///
    /// Guest and Topic exclude each other and the advertisement banner
    /// (all three occupy the lower-third region in this layout); the logo
    /// bug is independent of everything.
    pub fn fields_to_disable(target: FieldName) -> Vec<FieldName> {
        match target {
            FieldName::Guest => vec![FieldName::Topic, FieldName::Advertisement],
            FieldName::Topic => vec![FieldName::Guest, FieldName::Advertisement],
            FieldName::Advertisement => vec![FieldName::Guest, FieldName::Topic],
            FieldName::Logo => vec![],
        }
    }
}
