//! Recipe stage vocabulary and day-to-stage resolution.
//!
//! A recipe is an ordered run of stages given as day offsets from the start
//! of a process. Three-stage recipes run `Starting → Running → Finishing`;
//! four-stage recipes add `Preparing` after `Starting`. This module validates
//! those offsets, derives stage lengths, and answers "which stage is local day
//! `n` in?" for the projector.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// One phase of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Starting,
    Preparing,
    Running,
    Finishing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Starting => "Starting",
            Stage::Preparing => "Preparing",
            Stage::Running => "Running",
            Stage::Finishing => "Finishing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const THREE_STAGE: [Stage; 3] = [Stage::Starting, Stage::Running, Stage::Finishing];
const FOUR_STAGE: [Stage; 4] = [
    Stage::Starting,
    Stage::Preparing,
    Stage::Running,
    Stage::Finishing,
];

/// The canonical stage order for a recipe with `count` stages.
pub fn stage_sequence(count: usize) -> Option<&'static [Stage]> {
    match count {
        3 => Some(&THREE_STAGE),
        4 => Some(&FOUR_STAGE),
        _ => None,
    }
}

// ── Stage lengths ───────────────────────────────────────────────────────────

/// Compute per-stage lengths from boundary offsets and the nominal duration.
///
/// `lengths[i] = boundaries[i + 1] - boundaries[i]` for every stage but the
/// last, and `lengths[last] = time - boundaries[last]`, so the lengths always
/// sum to `time`.
///
/// # Errors
///
/// Returns [`TimelineError::InvalidRecipeShape`] when there are not 3 or 4
/// boundaries, the first boundary is not 0, the offsets are not strictly
/// increasing, or the last offset is not before `time`.
///
/// # Examples
///
/// ```
/// use furnace_timeline::stages::stage_lengths;
///
/// assert_eq!(stage_lengths("A", &[0, 2, 4], 6).unwrap(), vec![2, 2, 2]);
/// assert!(stage_lengths("B", &[0, 2], 6).is_err());
/// ```
pub fn stage_lengths(recipe: &str, boundaries: &[i64], time: i64) -> Result<Vec<i64>> {
    validate_boundaries(recipe, boundaries, time)?;
    let last = boundaries.len() - 1;
    Ok(boundaries
        .iter()
        .enumerate()
        .map(|(i, start)| {
            let end = if i == last { time } else { boundaries[i + 1] };
            end - start
        })
        .collect())
}

fn validate_boundaries(recipe: &str, boundaries: &[i64], time: i64) -> Result<()> {
    if stage_sequence(boundaries.len()).is_none() {
        return Err(TimelineError::recipe_shape(
            recipe,
            format!("expected 3 or 4 stage boundaries, got {}", boundaries.len()),
        ));
    }
    if boundaries[0] != 0 {
        return Err(TimelineError::recipe_shape(
            recipe,
            format!("first boundary must be 0, got {}", boundaries[0]),
        ));
    }
    if let Some(pair) = boundaries.windows(2).find(|w| w[0] >= w[1]) {
        return Err(TimelineError::recipe_shape(
            recipe,
            format!("boundaries not strictly increasing at {} -> {}", pair[0], pair[1]),
        ));
    }
    let last = boundaries[boundaries.len() - 1];
    if last >= time {
        return Err(TimelineError::recipe_shape(
            recipe,
            format!("last boundary {last} is not before duration {time}"),
        ));
    }
    Ok(())
}

// ── Stage layout ────────────────────────────────────────────────────────────

/// A stage and the local day range it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageSpan {
    pub stage: Stage,
    /// Local day offset the stage begins on.
    pub start: i64,
    /// Nominal length in days.
    pub length: i64,
}

/// A validated stage layout, ready for day-to-stage lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageLayout {
    spans: Vec<StageSpan>,
}

impl StageLayout {
    /// Build a layout from a recipe's boundary offsets. Stage names follow the
    /// canonical order for the boundary count.
    pub fn from_boundaries(recipe: &str, boundaries: &[i64], time: i64) -> Result<Self> {
        let lengths = stage_lengths(recipe, boundaries, time)?;
        // Count was validated by stage_lengths.
        let names = stage_sequence(boundaries.len()).unwrap_or(&[]);
        let spans = names
            .iter()
            .zip(boundaries.iter().zip(lengths))
            .map(|(&stage, (&start, length))| StageSpan {
                stage,
                start,
                length,
            })
            .collect();
        Ok(Self { spans })
    }

    /// Build a layout from per-process stage markers `(stage, offset)`.
    ///
    /// Markers are ordered by offset and must name the canonical stage order
    /// for their count.
    pub fn from_markers(recipe: &str, markers: &[(Stage, i64)], time: i64) -> Result<Self> {
        let mut ordered = markers.to_vec();
        ordered.sort_by_key(|&(stage, offset)| (offset, stage));
        let names: Vec<Stage> = ordered.iter().map(|&(stage, _)| stage).collect();
        match stage_sequence(names.len()) {
            Some(expected) if expected == names.as_slice() => {}
            _ => {
                return Err(TimelineError::recipe_shape(
                    recipe,
                    format!("stage markers out of order: {names:?}"),
                ))
            }
        }
        let boundaries: Vec<i64> = ordered.iter().map(|&(_, offset)| offset).collect();
        Self::from_boundaries(recipe, &boundaries, time)
    }

    pub fn spans(&self) -> &[StageSpan] {
        &self.spans
    }

    pub fn lengths(&self) -> Vec<i64> {
        self.spans.iter().map(|s| s.length).collect()
    }

    /// Resolve local day `cur` of a process whose effective length is
    /// `effective_len` to its stage and in-stage day count.
    ///
    /// Stage `i` covers `[start_i, start_{i+1})`; the last stage runs to the
    /// effective end, which may be shorter or longer than the nominal
    /// duration. A boundary day belongs to the stage it opens. Returns `None`
    /// outside `[0, effective_len)`.
    pub fn resolve(&self, cur: i64, effective_len: i64) -> Option<(Stage, i64)> {
        if cur < 0 || cur >= effective_len {
            return None;
        }
        let last = self.spans.len().checked_sub(1)?;
        for (i, span) in self.spans.iter().enumerate() {
            let next = if i == last {
                effective_len
            } else {
                self.spans[i + 1].start
            };
            if span.start <= cur && cur < next {
                return Some((span.stage, cur - span.start));
            }
        }
        None
    }
}
