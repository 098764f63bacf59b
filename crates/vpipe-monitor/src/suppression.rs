//! Transitions the pipeline makes on its own.
//!
//! A change matching one of these triples was written by the system, not by
//! a person editing the sheet, so it is never reported. Anything not listed
//! is reported.

use std::collections::HashSet;
use std::sync::LazyLock;

use vpipe_models::{FieldTransition, StatusField};

/// `(field, old label, new label)` triples of system-driven transitions.
pub const AUTOMATED_TRANSITIONS: &[(StatusField, &str, &str)] = &[
    // Voice-over unlocks once the script is approved.
    (StatusField::VoiceGenerationStatus, "Not Ready", "Not Started"),
    // Editing unlocks once the voice-over is done.
    (StatusField::VideoEditingStatus, "Not Ready", "Not Started"),
    // Intake and script breakdown.
    (StatusField::MainStatus, "New", "Processing"),
    (StatusField::MainStatus, "Processing", "Script Separated"),
    // Image generation kicks off after approval.
    (StatusField::MainStatus, "Approved", "Generating Images"),
];

static SUPPRESSED: LazyLock<HashSet<(StatusField, &'static str, &'static str)>> =
    LazyLock::new(|| AUTOMATED_TRANSITIONS.iter().copied().collect());

/// True when `transition` of `field` is in the automated-transition table.
///
/// Transitions from or to an unset cell are never automated.
pub fn is_automated(field: StatusField, transition: &FieldTransition) -> bool {
    let suppressed: &HashSet<(StatusField, &str, &str)> = &SUPPRESSED;

    match (transition.old.as_deref(), transition.new.as_deref()) {
        (Some(old), Some(new)) => suppressed.contains(&(field, old, new)),
        _ => false,
    }
}
