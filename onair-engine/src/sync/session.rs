//! Countdown-to-air state machine
//!
//! The grace period exists so an operator who hits "go live" by mistake
//! has a window to abort before the broadcast document is mutated. Once
//! PROCESSING begins the combined write has been dispatched and the
//! action is irrevocable; failure is surfaced but never leaves the
//! operator stuck outside NORMAL.

use crate::error::{Error, Result};
use onair_common::document::{DocumentPatch, FieldPatch};
use onair_common::policy::{ContentGate, MutualExclusionPolicy};
use onair_common::{FieldContent, FieldName};
use serde::Serialize;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiringPhase {
    Normal,
    Countdown,
    Processing,
}

/// Outcome of one countdown tick
#[derive(Debug)]
pub enum TickOutcome {
    /// Countdown no longer running; the timer loop terminates
    Ignored,
    /// Still counting; `remaining` ticks left
    Continue { remaining: u32 },
    /// Grace period over: dispatch the combined go-live write
    Expired {
        field: FieldName,
        content: FieldContent,
    },
}

/// Cancellable countdown workflow issuing one atomic multi-field write
#[derive(Debug)]
pub struct AiringSession {
    phase: AiringPhase,
    field: Option<FieldName>,
    content: FieldContent,
    remaining_ticks: u32,
}

impl AiringSession {
    pub fn new() -> Self {
        Self {
            phase: AiringPhase::Normal,
            field: None,
            content: FieldContent::empty(),
            remaining_ticks: 0,
        }
    }

    pub fn phase(&self) -> AiringPhase {
        self.phase
    }

    pub fn target(&self) -> Option<FieldName> {
        self.field
    }

    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    /// Begin the countdown
    ///
    /// Fails with `MissingContent` when the primary field's required
    /// content is blank, and with `SessionBusy` when a countdown or write
    /// is already running.
    pub fn start(&mut self, field: FieldName, content: FieldContent, ticks: u32) -> Result<()> {
        if self.phase != AiringPhase::Normal {
            return Err(Error::SessionBusy(format!(
                "phase is {:?}",
                self.phase
            )));
        }
        if !ContentGate::allows(field, &content) {
            return Err(Error::MissingContent { field });
        }

        self.phase = AiringPhase::Countdown;
        self.field = Some(field);
        self.content = content;
        self.remaining_ticks = ticks;
        Ok(())
    }

    /// One second elapsed
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != AiringPhase::Countdown {
            return TickOutcome::Ignored;
        }

        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        if self.remaining_ticks > 0 {
            return TickOutcome::Continue {
                remaining: self.remaining_ticks,
            };
        }

        self.phase = AiringPhase::Processing;
        match self.field {
            Some(field) => TickOutcome::Expired {
                field,
                content: self.content.clone(),
            },
            // Unreachable by construction; treat as a cancelled countdown
            None => {
                self.phase = AiringPhase::Normal;
                TickOutcome::Ignored
            }
        }
    }

    /// Operator abort; only valid from COUNTDOWN
    pub fn cancel(&mut self) -> Result<FieldName> {
        if self.phase != AiringPhase::Countdown {
            return Err(Error::NotCounting);
        }
        self.phase = AiringPhase::Normal;
        self.remaining_ticks = 0;
        self.field.take().ok_or(Error::NotCounting)
    }

    /// Another operator activated the field first; abort silently
    pub fn preempt(&mut self, field: FieldName) -> bool {
        if self.phase == AiringPhase::Countdown && self.field == Some(field) {
            self.phase = AiringPhase::Normal;
            self.remaining_ticks = 0;
            self.field = None;
            return true;
        }
        false
    }

    /// Combined write acknowledged (or failed): back to NORMAL either way
    pub fn write_finished(&mut self) -> Option<(FieldName, FieldContent)> {
        if self.phase != AiringPhase::Processing {
            return None;
        }
        self.phase = AiringPhase::Normal;
        self.remaining_ticks = 0;
        let field = self.field.take()?;
        Some((field, std::mem::take(&mut self.content)))
    }

    /// The single combined go-live write: primary field content and
    /// visibility plus force-off entries for the exclusion group
    pub fn go_live_patch(field: FieldName, content: &FieldContent) -> DocumentPatch {
        let mut patch = DocumentPatch::new().set(
            field,
            FieldPatch::visible(true).with_content(content),
        );
        for other in MutualExclusionPolicy::fields_to_disable(field) {
            patch = patch.set(other, FieldPatch::visible(false));
        }
        patch
    }
}

impl Default for AiringSession {
    fn default() -> Self {
        Self::new()
    }
}
