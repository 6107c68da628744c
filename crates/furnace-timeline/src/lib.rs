//! # furnace-timeline
//!
//! Deterministic timeline projection for furnace scheduling.
//!
//! Given a catalog of recipes with ordered stage boundaries, the processes
//! assigned to each furnace, and the sparse calendar events recorded against
//! them (aborts, power and maintenance downs), the engine computes for every
//! furnace and every day of a one-year horizon which stage, terminal state
//! or open slot applies. Everything is a pure function of an immutable
//! snapshot and an explicit horizon start; nothing reads the system clock.
//!
//! ## Modules
//!
//! - [`calendar`] - Day axis, calendar-month buckets, leap-year counts
//! - [`stages`] - Stage vocabulary, stage lengths, day-to-stage resolution
//! - [`snapshot`] - Read models (recipes, processes, events) and the snapshot cell
//! - [`placement`] - Per-furnace placement of processes on the horizon
//! - [`projector`] - Per-day state projection for every furnace
//! - [`availability`] - First open day and the assignable slot per furnace
//! - [`error`] - Error types and data-quality warnings

pub mod availability;
pub mod calendar;
pub mod error;
pub mod placement;
pub mod projector;
pub mod snapshot;
pub mod stages;

pub use availability::{assignable_slot, first_open_day, open_slots, OpenSlot};
pub use calendar::{days_in_year, enumerate_days, month_buckets, DayAxis, MonthBucket};
pub use error::{DataQualityWarning, TimelineError};
pub use placement::{Placement, PlacementIndex, Terminal};
pub use projector::{
    project, project_day, project_days, DayState, FurnaceTimeline, Projection, ProjectionOptions,
};
pub use snapshot::{
    CalendarEvent, DownReason, EventKind, FurnaceRecipe, Process, ProcessId, Recipe, Snapshot,
    SnapshotCell, TerminalKind,
};
pub use stages::{stage_lengths, Stage, StageLayout};
