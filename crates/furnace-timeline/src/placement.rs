//! Process placement on the projection horizon.
//!
//! For one furnace, the [`PlacementIndex`] records where each scheduled
//! process sits relative to the horizon start and how many days it actually
//! runs. The effective length follows a fixed precedence:
//!
//! 1. authoritative terminal event offset + 1 (the process physically stopped)
//! 2. the process row's explicit `end_time`
//! 3. the first stage marker's `end_time`
//! 4. the recipe's nominal `time`
//!
//! Processes without a start date are not placed.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{DataQualityWarning, Result, TimelineError};
use crate::snapshot::{
    find_recipe, CalendarEvent, EventKind, Process, ProcessId, Recipe, TerminalKind,
};
use crate::stages::{Stage, StageLayout};

/// The terminal event that ended a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Terminal {
    pub kind: TerminalKind,
    /// Local day offset the process stopped on.
    pub day_offset: i64,
}

/// One process placed on the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub process_id: ProcessId,
    pub recipe: String,
    /// Signed day offset of the start date from the horizon start.
    pub start_offset: i64,
    pub effective_length: i64,
    pub terminal: Option<Terminal>,
    #[serde(skip)]
    pub layout: StageLayout,
}

impl Placement {
    /// One past the last covered horizon day.
    pub fn end_offset(&self) -> i64 {
        self.start_offset.saturating_add(self.effective_length)
    }

    /// Whether horizon day `day` falls in `[start_offset, end_offset)`.
    pub fn covers(&self, day: i64) -> bool {
        day >= self.start_offset && day < self.end_offset()
    }

    fn overlaps(&self, other: &Placement) -> bool {
        self.start_offset < other.end_offset() && other.start_offset < self.end_offset()
    }
}

/// Placed processes of one furnace, keyed by process id.
#[derive(Debug, Clone, Default)]
pub struct PlacementIndex {
    furnace: String,
    placements: BTreeMap<ProcessId, Placement>,
    warnings: Vec<DataQualityWarning>,
}

impl PlacementIndex {
    /// Place every scheduled process of `furnace`.
    ///
    /// `events` maps process ids to the calendar events recorded against them.
    /// Processes belonging to other furnaces and open processes are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::UnknownRecipe`] if a placed process names a
    /// recipe missing from `recipes`, or [`TimelineError::InvalidRecipeShape`]
    /// if that recipe's boundaries are malformed.
    pub fn build(
        furnace: &str,
        horizon_start: NaiveDate,
        processes: &[&Process],
        events: &HashMap<ProcessId, Vec<&CalendarEvent>>,
        recipes: &[Recipe],
    ) -> Result<Self> {
        let mut index = PlacementIndex {
            furnace: furnace.to_string(),
            ..Default::default()
        };
        let no_events = Vec::new();

        for process in processes.iter().filter(|p| p.furnace == furnace) {
            let Some(start) = process.start_date else {
                continue;
            };
            let recipe = find_recipe(recipes, &process.recipe)
                .ok_or_else(|| TimelineError::UnknownRecipe(process.recipe.clone()))?;
            let recipe_layout = recipe.layout()?;
            let process_events = events.get(&process.id).unwrap_or(&no_events);

            let terminal = select_terminal(process.id, process_events, &mut index.warnings);
            let marker_end = process_events
                .iter()
                .filter(|e| matches!(e.kind, EventKind::Stage(_)))
                .find_map(|e| e.end_time);
            let base_length = process.end_time.or(marker_end).unwrap_or(recipe.time);

            let markers: Vec<(Stage, i64)> = process_events
                .iter()
                .filter_map(|e| match e.kind {
                    EventKind::Stage(stage) => Some((stage, e.sequence)),
                    EventKind::Terminal(_) => None,
                })
                .collect();
            let layout = if markers.is_empty() {
                recipe_layout
            } else {
                match StageLayout::from_markers(&recipe.key, &markers, base_length) {
                    Ok(layout) => layout,
                    Err(err) => {
                        index.warnings.push(DataQualityWarning::StageOverrideIgnored {
                            process_id: process.id,
                            reason: err.to_string(),
                        });
                        recipe_layout
                    }
                }
            };

            let effective_length =
                terminal.map_or(base_length, |t| t.day_offset.saturating_add(1));
            index.placements.insert(
                process.id,
                Placement {
                    process_id: process.id,
                    recipe: recipe.key.clone(),
                    start_offset: (start - horizon_start).num_days(),
                    effective_length,
                    terminal,
                    layout,
                },
            );
        }

        index.flag_overlaps();
        Ok(index)
    }

    fn flag_overlaps(&mut self) {
        let placed: Vec<&Placement> = self
            .placements
            .values()
            .filter(|p| p.effective_length > 0)
            .collect();
        for (i, lower) in placed.iter().enumerate() {
            for higher in &placed[i + 1..] {
                if lower.overlaps(higher) {
                    self.warnings.push(DataQualityWarning::OverlappingProcesses {
                        furnace: self.furnace.clone(),
                        lower: lower.process_id,
                        higher: higher.process_id,
                    });
                }
            }
        }
    }

    pub fn furnace(&self) -> &str {
        &self.furnace
    }

    pub fn get(&self, id: ProcessId) -> Option<&Placement> {
        self.placements.get(&id)
    }

    /// Placements in ascending process id order.
    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// The placement that owns horizon day `day`.
    ///
    /// When ranges overlap, the numerically largest process id wins, since
    /// newer assignments always receive higher ids.
    pub fn covering(&self, day: i64) -> Option<&Placement> {
        self.placements.values().rev().find(|p| p.covers(day))
    }

    /// The most recent assignment (highest process id).
    pub fn latest(&self) -> Option<&Placement> {
        self.placements.values().next_back()
    }

    /// Data-quality issues found while building the index.
    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }
}

/// Pick the authoritative terminal event: highest-precedence kind first,
/// then the earliest offset within that kind.
fn select_terminal(
    process_id: ProcessId,
    events: &[&CalendarEvent],
    warnings: &mut Vec<DataQualityWarning>,
) -> Option<Terminal> {
    let mut candidates = Vec::new();
    for event in events {
        let Some(kind) = event.terminal_kind() else {
            continue;
        };
        if event.sequence < 0 {
            warnings.push(DataQualityWarning::NegativeTerminalOffset {
                process_id,
                sequence: event.sequence,
            });
            continue;
        }
        candidates.push(Terminal {
            kind,
            day_offset: event.sequence,
        });
    }

    let chosen = candidates
        .iter()
        .min_by_key(|t| (t.kind, t.day_offset))
        .copied()?;

    let mut kinds: Vec<TerminalKind> = candidates.iter().map(|t| t.kind).collect();
    kinds.sort();
    kinds.dedup();
    if kinds.len() > 1 {
        warnings.push(DataQualityWarning::ConflictingTerminals {
            process_id,
            kinds,
            kept: chosen.kind,
        });
    }
    Some(chosen)
}
