//! Where a furnace can take its next process.
//!
//! The open tail of a furnace starts one day past the end of its latest
//! assignment (terminal-truncated if that process was stopped). Only that
//! single day is offered for a new assignment; later open days are rendered
//! but not actionable until a new process extends the row.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::DayAxis;
use crate::error::Result;
use crate::placement::PlacementIndex;
use crate::projector::ProjectionOptions;
use crate::snapshot::Snapshot;

/// First horizon day not covered by the furnace's latest assignment.
///
/// Returns 0 when nothing is placed (an unscheduled row), and never a
/// negative index: a latest process that ended before the horizon leaves the
/// whole horizon open.
pub fn first_open_day(index: &PlacementIndex) -> i64 {
    index
        .latest()
        .map_or(0, |placement| placement.end_offset().max(0))
}

/// The day index offered for a new assignment, if it lies on `axis`.
pub fn assignable_slot(index: &PlacementIndex, axis: &DayAxis) -> Option<usize> {
    let day = first_open_day(index);
    (day < i64::from(axis.days())).then_some(day as usize)
}

/// The open tail of one furnace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenSlot {
    pub furnace: String,
    /// `None` when the furnace's placements could not be built.
    pub first_open_day: Option<i64>,
    /// Calendar date of the slot when it falls on the horizon.
    pub date: Option<NaiveDate>,
}

/// Locate the open tail of every furnace without projecting day states.
pub fn open_slots(snapshot: &Snapshot, options: &ProjectionOptions) -> Result<Vec<OpenSlot>> {
    let axis = options.axis()?;
    let events = snapshot.events_by_process();
    Ok(snapshot
        .processes_by_furnace()
        .iter()
        .map(|(furnace, processes)| {
            match PlacementIndex::build(
                furnace,
                axis.start(),
                processes,
                &events,
                &snapshot.recipes,
            ) {
                Ok(index) => OpenSlot {
                    furnace: furnace.to_string(),
                    first_open_day: Some(first_open_day(&index)),
                    date: assignable_slot(&index, &axis).and_then(|d| axis.date(d)),
                },
                Err(err) => {
                    tracing::warn!(furnace = *furnace, error = %err, "no open slot");
                    OpenSlot {
                        furnace: furnace.to_string(),
                        first_open_day: None,
                        date: None,
                    }
                }
            }
        })
        .collect())
}
