//! Progress views over the workout log

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::db::{UserProfile, WorkoutLog};
use crate::exercises::Exercise;

/// Estimated one-rep max (Epley). Zero when weight or reps is zero.
pub fn estimate_one_rm(weight: f64, reps: u32) -> f64 {
    if weight <= 0.0 || reps == 0 {
        return 0.0;
    }
    (weight * (1.0 + f64::from(reps) / 30.0)).round()
}

/// One workout's worth of progress for a single exercise
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressPoint {
    Strength {
        date: DateTime<Utc>,
        weight: f64,
        reps: u32,
        one_rm: f64,
    },
    Cardio {
        date: DateTime<Utc>,
        distance: f64,
        minutes: u32,
    },
}

impl ProgressPoint {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            ProgressPoint::Strength { date, .. } | ProgressPoint::Cardio { date, .. } => *date,
        }
    }
}

/// Progress of `exercise_id`, oldest first.
///
/// Each workout containing the exercise contributes its first completed
/// set; workouts where nothing was completed are skipped.
pub fn progress_points(exercise_id: &str, log: &WorkoutLog, profile: &UserProfile) -> Vec<ProgressPoint> {
    let mut points: Vec<ProgressPoint> = log
        .values()
        .flatten()
        .filter_map(|workout| {
            let exercise = workout.exercises.iter().find(|e| e.id == exercise_id)?;
            let set = exercise.sets.iter().find(|s| s.completed)?;

            let point = if exercise.is_cardio() {
                ProgressPoint::Cardio { date: workout.date, distance: set.weight, minutes: set.reps }
            } else {
                let weight = exercise.effective_weight(set, profile.weight);
                ProgressPoint::Strength {
                    date: workout.date,
                    weight,
                    reps: set.reps,
                    one_rm: estimate_one_rm(weight, set.reps),
                }
            };
            Some(point)
        })
        .collect();

    points.sort_by_key(ProgressPoint::date);
    points
}

/// Weight moved in completed strength sets
pub fn exercise_volume(exercise: &Exercise, body_weight: f64) -> f64 {
    if exercise.is_cardio() {
        return 0.0;
    }
    exercise
        .sets
        .iter()
        .filter(|s| s.completed)
        .map(|s| exercise.effective_weight(s, body_weight) * f64::from(s.reps))
        .sum()
}

/// Volume of each day's latest workout
pub fn volume_by_day(log: &WorkoutLog, profile: &UserProfile) -> BTreeMap<String, f64> {
    log.iter()
        .filter_map(|(day, workouts)| {
            let latest = workouts.last()?;
            let volume = latest.exercises.iter().map(|e| exercise_volume(e, profile.weight)).sum();
            Some((day.clone(), volume))
        })
        .collect()
}
