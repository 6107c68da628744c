//! Property-based tests for projection invariants.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;

use furnace_timeline::{
    project, stage_lengths, CalendarEvent, DayState, Process, ProjectionOptions, Recipe, Snapshot,
    TerminalKind,
};

const HORIZON_DAYS: u32 = 150;

fn horizon_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
}

fn catalog() -> Vec<Recipe> {
    vec![
        Recipe::new("A", 6, vec![0, 2, 4]),
        Recipe::new("B", 10, vec![0, 1, 3, 8]),
        Recipe::new("C", 14, vec![0, 5, 9]),
    ]
}

/// Generates valid boundaries (3 or 4 stages) and a duration.
fn arb_recipe_shape() -> impl Strategy<Value = (Vec<i64>, i64)> {
    (prop::collection::vec(1i64..15, 2..=3), 1i64..15).prop_map(|(gaps, tail)| {
        let mut boundaries = vec![0];
        for gap in gaps {
            let next = boundaries[boundaries.len() - 1] + gap;
            boundaries.push(next);
        }
        let time = boundaries[boundaries.len() - 1] + tail;
        (boundaries, time)
    })
}

fn arb_terminal_kind() -> impl Strategy<Value = TerminalKind> {
    prop::sample::select(vec![
        TerminalKind::Aborted,
        TerminalKind::DownMaintenance,
        TerminalKind::DownPower,
    ])
}

/// A generated process: recipe index, start offset, optional terminal.
#[derive(Debug, Clone)]
struct ArbProcess {
    recipe: usize,
    start_offset: i64,
    terminal: Option<(TerminalKind, i64)>,
}

fn arb_process() -> impl Strategy<Value = ArbProcess> {
    (
        0usize..3,
        -20i64..140,
        prop::option::of((arb_terminal_kind(), 0i64..16)),
    )
        .prop_map(|(recipe, start_offset, terminal)| ArbProcess {
            recipe,
            start_offset,
            terminal,
        })
}

fn build_snapshot(generated: &[ArbProcess]) -> Snapshot {
    let recipes = catalog();
    let mut processes = Vec::new();
    let mut events = Vec::new();
    for (i, p) in generated.iter().enumerate() {
        let id = (i as u64 + 1) * 3;
        let start = if p.start_offset >= 0 {
            horizon_start() + Days::new(p.start_offset as u64)
        } else {
            horizon_start() - Days::new(p.start_offset.unsigned_abs())
        };
        processes.push(Process::new(id, "F1", recipes[p.recipe].key.clone()).starting(start));
        if let Some((kind, offset)) = p.terminal {
            events.push(CalendarEvent::terminal(id, kind, offset));
        }
    }
    Snapshot {
        recipes,
        processes,
        events,
        ..Default::default()
    }
}

/// Highest id among generated processes whose effective range covers `day`.
fn expected_owner(generated: &[ArbProcess], day: i64) -> Option<(u64, &ArbProcess)> {
    let recipes = catalog();
    generated
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            let length = p
                .terminal
                .map_or(recipes[p.recipe].time, |(_, offset)| offset + 1);
            day >= p.start_offset && day < p.start_offset + length
        })
        .map(|(i, p)| ((i as u64 + 1) * 3, p))
        .max_by_key(|(id, _)| *id)
}

proptest! {
    #[test]
    fn stage_lengths_sum_to_time((boundaries, time) in arb_recipe_shape()) {
        let lengths = stage_lengths("P", &boundaries, time).unwrap();
        prop_assert_eq!(lengths.len(), boundaries.len());
        prop_assert!(lengths.iter().all(|&l| l > 0));
        prop_assert_eq!(lengths.iter().sum::<i64>(), time);
    }

    #[test]
    fn every_day_is_open_or_owned_by_a_covering_process(generated in prop::collection::vec(arb_process(), 0..6)) {
        let snapshot = build_snapshot(&generated);
        let options = ProjectionOptions::new(horizon_start()).with_horizon_days(HORIZON_DAYS);
        let projection = project(&snapshot, &options).unwrap();

        let recipes = catalog();
        for row in &projection.furnaces {
            prop_assert_eq!(row.days.len(), HORIZON_DAYS as usize);
            for (day, state) in row.days.iter().enumerate() {
                let day = day as i64;
                match state.process_id() {
                    None => prop_assert!(state.is_open()),
                    Some(id) => {
                        let index = (id / 3) as usize;
                        prop_assert!(id % 3 == 0 && (1..=generated.len()).contains(&index));
                        let p = &generated[index - 1];
                        let length = p
                            .terminal
                            .map_or(recipes[p.recipe].time, |(_, offset)| offset + 1);
                        prop_assert!(day >= p.start_offset && day < p.start_offset + length);
                    }
                }
            }
        }
    }

    #[test]
    fn contended_days_go_to_highest_id(generated in prop::collection::vec(arb_process(), 1..6)) {
        let snapshot = build_snapshot(&generated);
        let options = ProjectionOptions::new(horizon_start()).with_horizon_days(HORIZON_DAYS);
        let projection = project(&snapshot, &options).unwrap();
        let row = projection.furnace("F1").unwrap();

        for (day, state) in row.days.iter().enumerate() {
            let day = day as i64;
            match expected_owner(&generated, day) {
                None => prop_assert_eq!(*state, DayState::Open),
                Some((id, p)) => {
                    prop_assert_eq!(state.process_id(), Some(id));
                    let on_terminal = p
                        .terminal
                        .is_some_and(|(_, offset)| day - p.start_offset == offset);
                    prop_assert_eq!(matches!(state, DayState::Terminal { .. }), on_terminal);
                }
            }
        }
    }

    #[test]
    fn no_stage_days_after_terminal(generated in prop::collection::vec(arb_process(), 1..6)) {
        let snapshot = build_snapshot(&generated);
        let options = ProjectionOptions::new(horizon_start()).with_horizon_days(HORIZON_DAYS);
        let projection = project(&snapshot, &options).unwrap();
        let row = projection.furnace("F1").unwrap();

        for (i, p) in generated.iter().enumerate() {
            let id = (i as u64 + 1) * 3;
            if let Some((_, offset)) = p.terminal {
                let stop = p.start_offset + offset;
                let later_stage = row.days.iter().enumerate().any(|(day, state)| {
                    day as i64 > stop
                        && matches!(state, DayState::Stage { process_id, .. } if *process_id == id)
                });
                prop_assert!(!later_stage, "process {} has stage days after {}", id, stop);
            }
        }
    }

    #[test]
    fn projection_is_deterministic(generated in prop::collection::vec(arb_process(), 0..6)) {
        let snapshot = build_snapshot(&generated);
        let options = ProjectionOptions::new(horizon_start()).with_horizon_days(HORIZON_DAYS);
        prop_assert_eq!(project(&snapshot, &options).unwrap(), project(&snapshot, &options).unwrap());
    }

    #[test]
    fn first_open_day_follows_latest_process(generated in prop::collection::vec(arb_process(), 1..6)) {
        let snapshot = build_snapshot(&generated);
        let options = ProjectionOptions::new(horizon_start()).with_horizon_days(HORIZON_DAYS);
        let projection = project(&snapshot, &options).unwrap();
        let row = projection.furnace("F1").unwrap();

        let recipes = catalog();
        let latest = &generated[generated.len() - 1];
        let length = latest
            .terminal
            .map_or(recipes[latest.recipe].time, |(_, offset)| offset + 1);
        let expected = (latest.start_offset + length).max(0);
        prop_assert_eq!(row.first_open_day, Some(expected));
        prop_assert_eq!(
            row.assignable_day,
            (expected < i64::from(HORIZON_DAYS)).then_some(expected as usize)
        );
    }
}
