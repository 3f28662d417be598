//! Progressive overload rule table
//!
//! Looks at the most recent attempt of an exercise and decides how much
//! load, reps or distance to add next time. Pure: no I/O, no hidden state.

use tracing::debug;

use crate::db::{UserProfile, WorkoutLog};
use crate::exercises::Exercise;

use super::history::exercise_history;

/// Cardio distance step, miles
pub const CARDIO_DISTANCE_STEP: f64 = 0.1;

/// Rep-target step used when the plan has no sets to read a target from
const FALLBACK_TARGET_REPS: u32 = 8;

/// Suggested change for the next session of one exercise
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub weight_increment: f64,
    pub reps_increment: u32,
    pub message: String,
}

impl Suggestion {
    fn hold(message: impl Into<String>) -> Self {
        Self { weight_increment: 0.0, reps_increment: 0, message: message.into() }
    }

    pub fn is_increase(&self) -> bool {
        self.weight_increment > 0.0 || self.reps_increment > 0
    }
}

/// Weight step after a to-failure session where every set was completed
fn failure_weight_step(exercise: &Exercise) -> f64 {
    if exercise.muscle_group.is_large() { 2.5 } else { 1.0 }
}

/// Weight step after beating the rep threshold
fn threshold_weight_step(exercise: &Exercise) -> f64 {
    if exercise.muscle_group.is_large() { 5.0 } else { 2.5 }
}

/// Decide the increment for the next occurrence of `exercise`
pub fn suggest_increment(exercise: &Exercise, log: &WorkoutLog, profile: &UserProfile) -> Suggestion {
    if !profile.progressive_overload.enabled {
        debug!(exercise = %exercise.id, "progressive overload disabled");
        return Suggestion::hold("Progressive overload is disabled.");
    }

    let history = exercise_history(&exercise.id, log);
    let last_session = history.first();

    if exercise.is_cardio() {
        let suggestion = match last_session {
            None => Suggestion::hold("No previous cardio data. Start with your target."),
            Some(last) if last.all_completed() => Suggestion {
                weight_increment: CARDIO_DISTANCE_STEP,
                reps_increment: 0,
                message: format!("Great job! Try increasing distance by {} miles.", CARDIO_DISTANCE_STEP),
            },
            Some(_) => Suggestion::hold("Focus on completing your current cardio goal."),
        };
        debug!(exercise = %exercise.id, ?suggestion, "cardio suggestion");
        return suggestion;
    }

    let Some(last) = last_session else {
        debug!(exercise = %exercise.id, "no strength history");
        return Suggestion::hold("No previous data. Start with your planned weight/reps.");
    };

    let target_reps = exercise.sets.first().map_or(FALLBACK_TARGET_REPS, |s| s.reps);

    // To failure
    if target_reps == 0 {
        let suggestion = if !last.all_completed() {
            Suggestion::hold("Focus on completing all sets to failure.")
        } else if exercise.is_bodyweight {
            Suggestion::hold("All bodyweight sets completed! Aim for more reps or a harder variation next time.")
        } else {
            let step = failure_weight_step(exercise);
            Suggestion {
                weight_increment: step,
                reps_increment: 0,
                message: format!(
                    "All sets completed (to failure)! Try increasing weight by {} lbs or aim for more reps.",
                    step
                ),
            }
        };
        debug!(exercise = %exercise.id, ?suggestion, "to-failure suggestion");
        return suggestion;
    }

    // reps >= target * 1.6, kept in integers wide enough for any u32 pair
    let qualifies = last
        .sets
        .iter()
        .any(|set| set.completed && u64::from(set.reps) * 10 >= u64::from(target_reps) * 16);

    let suggestion = if qualifies && exercise.is_bodyweight {
        let reps = (target_reps / 10).max(1);
        Suggestion {
            weight_increment: 0.0,
            reps_increment: reps,
            message: format!(
                "Excellent! You exceeded reps by 60% in a set. Try increasing reps by {} or move to a harder variation.",
                reps
            ),
        }
    } else if qualifies {
        let step = threshold_weight_step(exercise);
        Suggestion {
            weight_increment: step,
            reps_increment: 0,
            message: format!("Excellent! You exceeded reps by 60% in a set. Try increasing weight by {} lbs.", step),
        }
    } else if last.sets.iter().all(|s| s.completed && s.reps >= target_reps) {
        Suggestion::hold("All sets completed at target reps. Maintain weight, focus on form or slight rep increase.")
    } else {
        Suggestion::hold("Focus on completing all sets at target reps.")
    };

    debug!(exercise = %exercise.id, target_reps, ?suggestion, "strength suggestion");
    suggestion
}

/// Starting state for the next session: last recorded numbers plus the
/// suggested delta, every set open again, cursor rewound.
pub fn apply_suggestion(exercise: &Exercise, suggestion: &Suggestion) -> Exercise {
    let mut next = exercise.clone();
    next.current_active_set_index = 0;

    for set in &mut next.sets {
        set.completed = false;
        if next.muscle_group.is_cardio() {
            set.weight = round_hundredths(set.weight + suggestion.weight_increment);
            set.reps = set.reps.saturating_add(suggestion.reps_increment);
        } else if next.is_bodyweight {
            set.reps = set.reps.saturating_add(suggestion.reps_increment);
        } else {
            set.weight = round_hundredths(set.weight + suggestion.weight_increment);
        }
    }
    next
}

/// Keeps 5.0 + 0.1 + 0.1 at 5.2
fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
