//! Read models the projection runs over.
//!
//! A [`Snapshot`] is the immutable set of recipes, processes and calendar
//! events fetched from the persistence layer for one view load. Projection
//! never mutates it; after any write the caller builds a new snapshot and
//! swaps it into a [`SnapshotCell`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};
use crate::projector::{project, Projection, ProjectionOptions};
use crate::stages::{Stage, StageLayout};

/// Process identifier. New assignments always receive higher ids.
pub type ProcessId = u64;

// ── Recipes ─────────────────────────────────────────────────────────────────

/// A named template of ordered stages with a total duration in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub key: String,
    /// Nominal duration in days.
    pub time: i64,
    /// Stage start offsets, one per stage, first always 0.
    pub boundaries: Vec<i64>,
}

impl Recipe {
    pub fn new(key: impl Into<String>, time: i64, boundaries: Vec<i64>) -> Self {
        Self {
            key: key.into(),
            time,
            boundaries,
        }
    }

    /// Validate the boundaries and build the stage layout.
    pub fn layout(&self) -> Result<StageLayout> {
        StageLayout::from_boundaries(&self.key, &self.boundaries, self.time)
    }
}

// ── Processes ───────────────────────────────────────────────────────────────

/// One assignment of a furnace to a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    pub furnace: String,
    pub recipe: String,
    /// `None` marks a placeholder row that has not been scheduled yet.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Explicit length in days, set when an operator edits the block length.
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl Process {
    pub fn new(id: ProcessId, furnace: impl Into<String>, recipe: impl Into<String>) -> Self {
        Self {
            id,
            furnace: furnace.into(),
            recipe: recipe.into(),
            start_date: None,
            end_time: None,
        }
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_time(mut self, days: i64) -> Self {
        self.end_time = Some(days);
        self
    }

    /// An open process has no start date and covers no days.
    pub fn is_open(&self) -> bool {
        self.start_date.is_none()
    }
}

// ── Calendar events ─────────────────────────────────────────────────────────

/// An event that ends a process early.
///
/// Variants are declared in precedence order: when several kinds are recorded
/// against one process, the smallest (per `Ord`) is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerminalKind {
    #[serde(rename = "Aborted")]
    Aborted,
    #[serde(rename = "Down (Maintenance)")]
    DownMaintenance,
    #[serde(rename = "Down (Power)")]
    DownPower,
}

impl TerminalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalKind::Aborted => "Aborted",
            TerminalKind::DownMaintenance => "Down (Maintenance)",
            TerminalKind::DownPower => "Down (Power)",
        }
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a calendar event marks: a stage start or a terminal stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventKind {
    Stage(Stage),
    Terminal(TerminalKind),
}

/// An event recorded against a process, `sequence` days after its start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub process_id: ProcessId,
    pub kind: EventKind,
    pub sequence: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl CalendarEvent {
    pub fn stage(process_id: ProcessId, stage: Stage, sequence: i64) -> Self {
        Self {
            process_id,
            kind: EventKind::Stage(stage),
            sequence,
            end_time: None,
        }
    }

    pub fn terminal(process_id: ProcessId, kind: TerminalKind, sequence: i64) -> Self {
        Self {
            process_id,
            kind: EventKind::Terminal(kind),
            sequence,
            end_time: None,
        }
    }

    pub fn with_end_time(mut self, days: i64) -> Self {
        self.end_time = Some(days);
        self
    }

    pub fn terminal_kind(&self) -> Option<TerminalKind> {
        match self.kind {
            EventKind::Terminal(kind) => Some(kind),
            EventKind::Stage(_) => None,
        }
    }
}

/// Cosmetic label for the cause of a down event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownReason {
    pub name: String,
}

/// Default recipe shown against a furnace row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FurnaceRecipe {
    pub furnace: String,
    pub recipe: String,
}

/// Look up a recipe by key in a catalog.
pub fn find_recipe<'a>(recipes: &'a [Recipe], key: &str) -> Option<&'a Recipe> {
    recipes.iter().find(|r| r.key == key)
}

// ── Snapshot ────────────────────────────────────────────────────────────────

/// Everything one projection pass reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub processes: Vec<Process>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub down_reasons: Vec<DownReason>,
    #[serde(default)]
    pub furnace_recipes: Vec<FurnaceRecipe>,
}

impl Snapshot {
    /// Decode a snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::InvalidSnapshot`] if the JSON does not match
    /// the read-model shapes.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TimelineError::InvalidSnapshot(e.to_string()))
    }

    pub fn recipe(&self, key: &str) -> Option<&Recipe> {
        find_recipe(&self.recipes, key)
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == id)
    }

    /// Processes grouped by furnace, furnaces in order of first appearance.
    pub fn processes_by_furnace(&self) -> IndexMap<&str, Vec<&Process>> {
        let mut grouped: IndexMap<&str, Vec<&Process>> = IndexMap::new();
        for process in &self.processes {
            grouped.entry(process.furnace.as_str()).or_default().push(process);
        }
        grouped
    }

    /// Events grouped by the process they reference.
    pub fn events_by_process(&self) -> HashMap<ProcessId, Vec<&CalendarEvent>> {
        let mut grouped: HashMap<ProcessId, Vec<&CalendarEvent>> = HashMap::new();
        for event in &self.events {
            grouped.entry(event.process_id).or_default().push(event);
        }
        grouped
    }

    /// Events whose process id is not in the snapshot.
    pub fn dangling_events(&self) -> Vec<&CalendarEvent> {
        self.events
            .iter()
            .filter(|e| self.process(e.process_id).is_none())
            .collect()
    }

    /// The furnace's configured default recipe, if any.
    pub fn furnace_recipe(&self, furnace: &str) -> Option<&str> {
        self.furnace_recipes
            .iter()
            .find(|fr| fr.furnace == furnace)
            .map(|fr| fr.recipe.as_str())
    }

    pub fn down_reason_names(&self) -> Vec<&str> {
        self.down_reasons.iter().map(|d| d.name.as_str()).collect()
    }
}

// ── Snapshot cell ───────────────────────────────────────────────────────────

/// Holder for the current snapshot.
///
/// A projection pass takes one `Arc` to the snapshot up front and works on
/// that copy, so a concurrent [`SnapshotCell::replace`] never mixes old and
/// new records within a pass.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot as of now.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    /// Install a new snapshot, returning the previous one.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        std::mem::replace(&mut *self.current.write(), Arc::new(snapshot))
    }

    /// Project the current snapshot.
    pub fn project(&self, options: &ProjectionOptions) -> Result<Projection> {
        let snapshot = self.load();
        project(&snapshot, options)
    }
}
