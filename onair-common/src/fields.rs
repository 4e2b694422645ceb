//! Live field model
//!
//! An on-air graphic is composed of a small fixed set of toggle-able
//! elements ("live fields"): the lower-third guest strap, the topic strap,
//! the station logo, and the advertisement banner. Each field carries a
//! flat map of string attributes plus a visibility flag; the remote
//! document holds one entry per field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier for a single on-air element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    /// Lower-third guest strap (name / role / topic snapshot)
    Guest,
    /// Topic strap
    Topic,
    /// Station logo bug
    Logo,
    /// Advertisement banner
    Advertisement,
}

impl FieldName {
    /// All fields, in document order
    pub fn all() -> [FieldName; 4] {
        [
            FieldName::Guest,
            FieldName::Topic,
            FieldName::Logo,
            FieldName::Advertisement,
        ]
    }

    /// Wire name used in the remote document and the HTTP API
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Guest => "guest",
            FieldName::Topic => "topic",
            FieldName::Logo => "logo",
            FieldName::Advertisement => "advertisement",
        }
    }

    /// Parse a wire name back into a field identifier
    pub fn parse(s: &str) -> Option<FieldName> {
        match s {
            "guest" => Some(FieldName::Guest),
            "topic" => Some(FieldName::Topic),
            "logo" => Some(FieldName::Logo),
            "advertisement" => Some(FieldName::Advertisement),
            _ => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String-attribute map for one field
///
/// Attribute values are free text entered by the operator. Blank values
/// (empty or whitespace-only) are treated as absent everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldContent(pub BTreeMap<String, String>);

impl FieldContent {
    /// Empty content (Logo and Advertisement never carry attributes)
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Build content from key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Attribute value, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    /// True when the attribute exists and is not blank
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.trim().is_empty())
    }

    /// Set an attribute value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Merge other attributes over this content (merge semantics, not replace)
    pub fn merge(&mut self, other: &BTreeMap<String, String>) {
        for (k, v) in other {
            self.0.insert(k.clone(), v.clone());
        }
    }
}

/// One field's slice of the remote document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    /// Attribute map (empty for Logo / Advertisement)
    #[serde(default)]
    pub content: FieldContent,

    /// Is this field currently rendered live
    #[serde(default)]
    pub visible: bool,
}

impl FieldState {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn new(content: FieldContent, visible: bool) -> Self {
        Self { content, visible }
    }
}
