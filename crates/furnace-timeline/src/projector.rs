//! Day-state projection.
//!
//! For every furnace and every day on the horizon, decide which state
//! applies: an active recipe stage, the terminal state of a stopped process,
//! or open. The projection is a pure function of a [`Snapshot`] and
//! [`ProjectionOptions`]; projecting the same snapshot twice gives identical
//! output.
//!
//! # Per-day rules
//!
//! 1. The covering placement is the one whose `[start, start + effective)`
//!    range contains the day; overlaps go to the highest process id.
//! 2. On the terminal event's local offset the day is the terminal state.
//!    The placement's range ends there, so no stage days follow it.
//! 3. Otherwise the local offset resolves against the stage layout.
//! 4. Uncovered days are open.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::availability::{assignable_slot, first_open_day};
use crate::calendar::{month_buckets, DayAxis, MonthBucket};
use crate::error::{DataQualityWarning, Result};
use crate::placement::PlacementIndex;
use crate::snapshot::{CalendarEvent, Process, ProcessId, Snapshot, TerminalKind};
use crate::stages::Stage;

// ── Options ─────────────────────────────────────────────────────────────────

/// Where the horizon starts and how long it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionOptions {
    /// First projected day; replaces any notion of "today".
    pub horizon_start: NaiveDate,
    /// Horizon length in days. Defaults to the number of days in the
    /// start date's year.
    #[serde(default)]
    pub horizon_days: Option<u32>,
}

impl ProjectionOptions {
    pub fn new(horizon_start: NaiveDate) -> Self {
        Self {
            horizon_start,
            horizon_days: None,
        }
    }

    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = Some(days);
        self
    }

    /// The day axis these options describe.
    pub fn axis(&self) -> Result<DayAxis> {
        match self.horizon_days {
            Some(days) => DayAxis::new(self.horizon_start, days),
            None => DayAxis::one_year(self.horizon_start),
        }
    }
}

// ── Output ──────────────────────────────────────────────────────────────────

/// The authoritative state of one furnace on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DayState {
    /// A recipe stage is running. `count` is the day number within the
    /// stage, starting at 0, for display.
    Stage {
        process_id: ProcessId,
        stage: Stage,
        count: i64,
    },
    /// The process stopped on this day.
    Terminal {
        process_id: ProcessId,
        kind: TerminalKind,
    },
    /// No process covers the day.
    Open,
}

impl DayState {
    pub fn is_open(&self) -> bool {
        matches!(self, DayState::Open)
    }

    pub fn process_id(&self) -> Option<ProcessId> {
        match self {
            DayState::Stage { process_id, .. } | DayState::Terminal { process_id, .. } => {
                Some(*process_id)
            }
            DayState::Open => None,
        }
    }
}

/// One furnace's projected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FurnaceTimeline {
    pub furnace: String,
    /// Recipe shown against the row.
    pub recipe: Option<String>,
    /// One state per horizon day.
    pub days: Vec<DayState>,
    /// First day not covered by the latest assignment. `None` when the row
    /// could not be projected.
    pub first_open_day: Option<i64>,
    /// The single day offered for a new assignment, if on the horizon.
    pub assignable_day: Option<usize>,
    pub assignable_date: Option<NaiveDate>,
    /// Every process on this furnace is still unscheduled.
    pub open_row: bool,
    /// Why the row renders entirely open, if it failed.
    pub error: Option<String>,
}

/// The full projection handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub horizon_start: NaiveDate,
    pub horizon_days: u32,
    pub months: Vec<MonthBucket>,
    pub furnaces: Vec<FurnaceTimeline>,
    pub warnings: Vec<DataQualityWarning>,
}

impl Projection {
    pub fn furnace(&self, name: &str) -> Option<&FurnaceTimeline> {
        self.furnaces.iter().find(|f| f.furnace == name)
    }
}

// ── Projection ──────────────────────────────────────────────────────────────

/// The state of horizon day `day` for the furnace `index` describes.
pub fn project_day(index: &PlacementIndex, day: i64) -> DayState {
    let Some(placement) = index.covering(day) else {
        return DayState::Open;
    };
    let cur = day - placement.start_offset;

    if let Some(terminal) = placement.terminal {
        if cur == terminal.day_offset {
            return DayState::Terminal {
                process_id: placement.process_id,
                kind: terminal.kind,
            };
        }
    }

    match placement.layout.resolve(cur, placement.effective_length) {
        Some((stage, count)) => DayState::Stage {
            process_id: placement.process_id,
            stage,
            count,
        },
        None => DayState::Open,
    }
}

/// Project every day of `axis` for one furnace.
pub fn project_days(index: &PlacementIndex, axis: &DayAxis) -> Vec<DayState> {
    (0..i64::from(axis.days()))
        .map(|day| project_day(index, day))
        .collect()
}

/// Project every furnace in `snapshot` over the horizon in `options`.
///
/// A furnace whose processes reference an unknown or malformed recipe is
/// rendered entirely open with its `error` set; other rows are unaffected.
///
/// # Errors
///
/// Returns [`crate::TimelineError::InvalidHorizon`] if the options describe an
/// empty or unrepresentable horizon.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use furnace_timeline::{project, Process, ProjectionOptions, Recipe, Snapshot};
///
/// let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// let snapshot = Snapshot {
///     recipes: vec![Recipe::new("A", 6, vec![0, 2, 4])],
///     processes: vec![Process::new(1, "F1", "A").starting(start)],
///     ..Default::default()
/// };
/// let projection = project(&snapshot, &ProjectionOptions::new(start)).unwrap();
/// let row = projection.furnace("F1").unwrap();
/// assert_eq!(row.days.len(), 365);
/// assert_eq!(row.first_open_day, Some(6));
/// ```
pub fn project(snapshot: &Snapshot, options: &ProjectionOptions) -> Result<Projection> {
    let axis = options.axis()?;
    let events = snapshot.events_by_process();
    let mut warnings = Vec::new();

    for event in snapshot.dangling_events() {
        record(
            &mut warnings,
            DataQualityWarning::DanglingEvent {
                process_id: event.process_id,
            },
        );
    }

    let furnaces = snapshot
        .processes_by_furnace()
        .iter()
        .map(|(furnace, processes)| {
            project_furnace(furnace, processes, snapshot, &events, &axis, &mut warnings)
        })
        .collect();

    Ok(Projection {
        horizon_start: axis.start(),
        horizon_days: axis.days(),
        months: month_buckets(&axis),
        furnaces,
        warnings,
    })
}

fn project_furnace(
    furnace: &str,
    processes: &[&Process],
    snapshot: &Snapshot,
    events: &HashMap<ProcessId, Vec<&CalendarEvent>>,
    axis: &DayAxis,
    warnings: &mut Vec<DataQualityWarning>,
) -> FurnaceTimeline {
    let recipe = snapshot
        .furnace_recipe(furnace)
        .map(str::to_string)
        .or_else(|| {
            processes
                .iter()
                .max_by_key(|p| p.id)
                .map(|p| p.recipe.clone())
        });
    let open_row = processes.iter().all(|p| p.is_open());

    let index = match PlacementIndex::build(
        furnace,
        axis.start(),
        processes,
        events,
        &snapshot.recipes,
    ) {
        Ok(index) => index,
        Err(err) => {
            record(
                warnings,
                DataQualityWarning::RowUnavailable {
                    furnace: furnace.to_string(),
                    reason: err.to_string(),
                },
            );
            return FurnaceTimeline {
                furnace: furnace.to_string(),
                recipe,
                days: vec![DayState::Open; axis.days() as usize],
                first_open_day: None,
                assignable_day: None,
                assignable_date: None,
                open_row,
                error: Some(err.to_string()),
            };
        }
    };

    for warning in index.warnings() {
        record(warnings, warning.clone());
    }

    let days = project_days(&index, axis);
    let first_open = first_open_day(&index);
    let assignable_day = assignable_slot(&index, axis);
    debug!(
        furnace,
        placed = index.len(),
        first_open_day = first_open,
        "projected furnace row"
    );

    FurnaceTimeline {
        furnace: furnace.to_string(),
        recipe,
        days,
        first_open_day: Some(first_open),
        assignable_day,
        assignable_date: assignable_day.and_then(|d| axis.date(d)),
        open_row,
        error: None,
    }
}

fn record(warnings: &mut Vec<DataQualityWarning>, warning: DataQualityWarning) {
    warn!(%warning, "data quality");
    warnings.push(warning);
}
