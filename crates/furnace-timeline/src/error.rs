//! Error types and data-quality warnings for furnace-timeline operations.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::snapshot::{ProcessId, TerminalKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("Invalid recipe shape for '{recipe}': {reason}")]
    InvalidRecipeShape { recipe: String, reason: String },

    #[error("Unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("Invalid horizon: {0}")]
    InvalidHorizon(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl TimelineError {
    pub(crate) fn recipe_shape(recipe: &str, reason: impl Into<String>) -> Self {
        TimelineError::InvalidRecipeShape {
            recipe: recipe.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;

/// A data inconsistency the projection resolved on its own.
///
/// Warnings never fail a projection. They are logged and returned alongside
/// the result so the caller can surface them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// Two placed processes on one furnace cover a common day. The higher id
    /// wins the contended days.
    OverlappingProcesses {
        furnace: String,
        lower: ProcessId,
        higher: ProcessId,
    },
    /// An event references a process id absent from the snapshot.
    DanglingEvent { process_id: ProcessId },
    /// More than one terminal kind is recorded against one process.
    ConflictingTerminals {
        process_id: ProcessId,
        kinds: Vec<TerminalKind>,
        kept: TerminalKind,
    },
    /// A terminal event sits before the process start and was ignored.
    NegativeTerminalOffset { process_id: ProcessId, sequence: i64 },
    /// A process's own stage markers were malformed; the recipe layout was used.
    StageOverrideIgnored { process_id: ProcessId, reason: String },
    /// A furnace row could not be projected and renders entirely open.
    RowUnavailable { furnace: String, reason: String },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::OverlappingProcesses {
                furnace,
                lower,
                higher,
            } => write!(
                f,
                "furnace '{furnace}': processes {lower} and {higher} overlap; {higher} takes precedence"
            ),
            DataQualityWarning::DanglingEvent { process_id } => {
                write!(f, "event references unknown process {process_id}")
            }
            DataQualityWarning::ConflictingTerminals {
                process_id,
                kinds,
                kept,
            } => {
                let names: Vec<&str> = kinds.iter().map(TerminalKind::as_str).collect();
                write!(
                    f,
                    "process {process_id} has terminal markers [{}]; keeping {kept}",
                    names.join(", ")
                )
            }
            DataQualityWarning::NegativeTerminalOffset {
                process_id,
                sequence,
            } => write!(
                f,
                "process {process_id}: terminal marker at offset {sequence} ignored"
            ),
            DataQualityWarning::StageOverrideIgnored { process_id, reason } => {
                write!(f, "process {process_id}: stage markers ignored: {reason}")
            }
            DataQualityWarning::RowUnavailable { furnace, reason } => {
                write!(f, "furnace '{furnace}' rendered open: {reason}")
            }
        }
    }
}
