//! Training advisor
//!
//! Rule-based suggestions and progress views. Everything here is a pure
//! function of the workout log and the profile.

pub mod history;
pub mod overload;
pub mod progress;

pub use history::{HistoryEntry, exercise_history};
pub use overload::{Suggestion, apply_suggestion, suggest_increment};
pub use progress::{ProgressPoint, estimate_one_rm, progress_points, volume_by_day};

use crate::db::{UserProfile, WorkoutLog};
use crate::exercises::Exercise;

/// Suggestion for every exercise of a plan, in plan order
pub fn day_report<'a>(
    exercises: &'a [Exercise],
    log: &WorkoutLog,
    profile: &UserProfile,
) -> Vec<(&'a Exercise, Suggestion)> {
    exercises
        .iter()
        .map(|exercise| (exercise, suggest_increment(exercise, log, profile)))
        .collect()
}
