//! Exercise history lookup across every day of the workout log

use chrono::{DateTime, Utc};

use crate::db::WorkoutLog;
use crate::exercises::WorkoutSet;

/// One past attempt of an exercise
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<'a> {
    pub date: DateTime<Utc>,
    pub sets: &'a [WorkoutSet],
}

impl HistoryEntry<'_> {
    pub fn all_completed(&self) -> bool {
        self.sets.iter().all(|s| s.completed)
    }
}

/// Every saved attempt of `exercise_id`, most recent first.
/// Duplicates inside one workout are all kept.
pub fn exercise_history<'a>(exercise_id: &str, log: &'a WorkoutLog) -> Vec<HistoryEntry<'a>> {
    let mut history: Vec<HistoryEntry<'a>> = log
        .values()
        .flatten()
        .flat_map(|workout| {
            workout
                .exercises
                .iter()
                .filter(move |ex| ex.id == exercise_id)
                .map(move |ex| HistoryEntry { date: workout.date, sets: &ex.sets })
        })
        .collect();

    history.sort_by(|a, b| b.date.cmp(&a.date));
    history
}
