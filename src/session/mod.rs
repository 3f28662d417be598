//! Live workout session
//!
//! Holds the exercise state for one day's workout while the user works
//! through it set by set. Validation failures are `false` returns and
//! leave the session untouched; only storage and missing-start problems
//! surface as [`SessionError`].

pub mod countdown;
pub mod rest_timer;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::advisor::{apply_suggestion, suggest_increment};
use crate::db::{ProfileStore, RestTimePreferences, UserProfile, Workout, WorkoutLog, WorkoutRepository};
use crate::exercises::{Exercise, WorkoutSet, default_day_exercises, propagate};

use rest_timer::{RestOverrides, RestTimer, TickOutcome};

/// Source of wall-clock time for session timing
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything a session reads from or writes to
pub trait SessionStore: WorkoutRepository + ProfileStore + RestTimePreferences {}

impl<T: WorkoutRepository + ProfileStore + RestTimePreferences> SessionStore for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
    /// Day is flagged as rest; nothing to track
    RestDay,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("workout start time not recorded")]
    NoStartTime,
    #[error("session is not in progress")]
    NotInProgress,
    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}

/// Field edit on the active set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetValue {
    Weight(f64),
    Reps(u32),
}

/// Starting exercise state for a day: last saved workout with the
/// advisor's increments applied, or the default plan propagated.
pub fn session_exercises(day: &str, log: &WorkoutLog, profile: &UserProfile) -> Vec<Exercise> {
    match log.get(day).and_then(|workouts| workouts.last()) {
        Some(last) => last
            .exercises
            .iter()
            .map(|exercise| apply_suggestion(exercise, &suggest_increment(exercise, log, profile)))
            .collect(),
        None => default_day_exercises(day).into_iter().map(propagate).collect(),
    }
}

/// Current plan of a day as stored, without increments
pub fn planned_exercises(repo: &impl WorkoutRepository, day: &str) -> anyhow::Result<Vec<Exercise>> {
    Ok(match repo.last_workout(day)? {
        Some(workout) => workout.exercises,
        None => default_day_exercises(day).into_iter().map(propagate).collect(),
    })
}

fn plan_record(exercises: Vec<Exercise>, now: DateTime<Utc>) -> Workout {
    Workout { id: now.timestamp_millis().to_string(), date: now, exercises, duration_in_minutes: None }
}

/// Append a catalog exercise to a day's plan and save the new plan
pub fn add_to_plan(
    repo: &impl WorkoutRepository,
    day: &str,
    exercise: Exercise,
    now: DateTime<Utc>,
) -> anyhow::Result<Workout> {
    let mut exercises = planned_exercises(repo, day)?;
    exercises.push(propagate(exercise));
    let workout = plan_record(exercises, now);
    repo.append_workout(day, &workout)?;
    info!(day, "exercise added to plan");
    Ok(workout)
}

/// Drop the exercise at `index` from a day's plan. `None` when out of range.
pub fn remove_from_plan(
    repo: &impl WorkoutRepository,
    day: &str,
    index: usize,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<Workout>> {
    let mut exercises = planned_exercises(repo, day)?;
    if index >= exercises.len() {
        return Ok(None);
    }
    let removed = exercises.remove(index);
    let workout = plan_record(exercises, now);
    repo.append_workout(day, &workout)?;
    info!(day, exercise = %removed.id, "exercise removed from plan");
    Ok(Some(workout))
}

pub struct WorkoutSession<C: Clock = SystemClock> {
    day: String,
    state: SessionState,
    exercises: Vec<Exercise>,
    started_at: Option<DateTime<Utc>>,
    body_weight: f64,
    rest: RestTimer,
    rest_overrides: RestOverrides,
    clock: C,
}

impl WorkoutSession<SystemClock> {
    pub fn new(day: impl Into<String>) -> Self {
        Self::with_clock(day, SystemClock)
    }
}

impl<C: Clock> WorkoutSession<C> {
    pub fn with_clock(day: impl Into<String>, clock: C) -> Self {
        Self {
            day: day.into(),
            state: SessionState::NotStarted,
            exercises: Vec::new(),
            started_at: None,
            body_weight: 0.0,
            rest: RestTimer::new(),
            rest_overrides: RestOverrides::new(),
            clock,
        }
    }

    pub fn day(&self) -> &str {
        &self.day
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Profile body weight captured at start
    pub fn body_weight(&self) -> f64 {
        self.body_weight
    }

    pub fn rest_timer(&self) -> &RestTimer {
        &self.rest
    }

    /// Rest gate: no edits or confirmations while this holds
    pub fn is_resting(&self) -> bool {
        self.rest.is_active()
    }

    pub fn elapsed_secs(&self) -> i64 {
        self.started_at.map_or(0, |start| (self.clock.now() - start).num_seconds().max(0))
    }

    fn accepts_input(&self) -> bool {
        self.state == SessionState::InProgress && !self.rest.is_active()
    }

    /// Derive exercise state for the day and start the clock
    pub fn start(&mut self, store: &impl SessionStore) -> Result<SessionState, SessionError> {
        self.rest.close();

        if store.is_rest_day(&self.day).map_err(SessionError::Storage)? {
            self.exercises.clear();
            self.started_at = None;
            self.state = SessionState::RestDay;
            info!(day = %self.day, "rest day");
            return Ok(self.state);
        }

        let log = store.workout_log().map_err(SessionError::Storage)?;
        let profile = store.profile().map_err(SessionError::Storage)?;
        self.rest_overrides = store.custom_rest_times().map_err(SessionError::Storage)?;

        self.exercises = session_exercises(&self.day, &log, &profile);
        self.body_weight = profile.weight;
        self.started_at = Some(self.clock.now());
        self.state = SessionState::InProgress;
        info!(day = %self.day, exercises = self.exercises.len(), "session started");
        Ok(self.state)
    }

    /// Switch to another day; the session is rebuilt and the clock restarts
    pub fn select_day(&mut self, day: impl Into<String>, store: &impl SessionStore) -> Result<SessionState, SessionError> {
        self.day = day.into();
        self.start(store)
    }

    /// Mark the active set of an exercise done. Non-cardio sets open the rest gate.
    pub fn confirm_set(&mut self, exercise_index: usize, set_index: usize) -> bool {
        if !self.accepts_input() {
            debug!(exercise_index, set_index, "confirm rejected: session locked");
            return false;
        }
        let Some(exercise) = self.exercises.get_mut(exercise_index) else {
            return false;
        };
        if set_index != exercise.current_active_set_index || set_index >= exercise.sets.len() {
            debug!(exercise_index, set_index, active = exercise.current_active_set_index, "confirm rejected: not the active set");
            return false;
        }

        exercise.sets[set_index].completed = true;
        exercise.current_active_set_index += 1;
        info!(exercise = %exercise.id, set = set_index, "set confirmed");

        if !exercise.is_cardio() {
            let (group, name) = (exercise.muscle_group, exercise.name.clone());
            self.rest.start(group, &name, &self.rest_overrides);
        }
        true
    }

    /// Append a copy of the last set. Cardio keeps its single set.
    pub fn add_set(&mut self, exercise_index: usize) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(exercise) = self.exercises.get_mut(exercise_index) else {
            return false;
        };
        if exercise.is_cardio() {
            debug!(exercise = %exercise.id, "add set rejected: cardio");
            return false;
        }

        let next = exercise
            .sets
            .last()
            .map(|last| WorkoutSet { completed: false, ..*last })
            .unwrap_or_default();
        exercise.sets.push(next);
        true
    }

    /// Edit weight or reps of the active set.
    ///
    /// Set 0 of a non-cardio exercise acts as the template: weight edits
    /// reach every set unless the exercise is bodyweight, reps edits
    /// always do. Bodyweight exercises refuse weight edits.
    pub fn edit_set_value(&mut self, exercise_index: usize, set_index: usize, value: SetValue) -> bool {
        if !self.accepts_input() {
            debug!(exercise_index, set_index, "edit rejected: session locked");
            return false;
        }
        let Some(exercise) = self.exercises.get_mut(exercise_index) else {
            return false;
        };
        if set_index != exercise.current_active_set_index {
            return false;
        }
        match exercise.sets.get(set_index) {
            Some(set) if !set.completed => {}
            _ => return false,
        }

        let propagates = set_index == 0 && !exercise.is_cardio();
        match value {
            SetValue::Weight(weight) => {
                if exercise.is_bodyweight || !weight.is_finite() || weight < 0.0 {
                    return false;
                }
                if propagates {
                    exercise.sets.iter_mut().for_each(|s| s.weight = weight);
                } else {
                    exercise.sets[set_index].weight = weight;
                }
            }
            SetValue::Reps(reps) => {
                if propagates {
                    exercise.sets.iter_mut().for_each(|s| s.reps = reps);
                } else {
                    exercise.sets[set_index].reps = reps;
                }
            }
        }
        true
    }

    /// Add an exercise mid-session, propagated and starting at set 0
    pub fn add_exercise(&mut self, exercise: Exercise) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let mut exercise = propagate(exercise);
        exercise.sets.iter_mut().for_each(|s| s.completed = false);
        info!(exercise = %exercise.id, "exercise added to session");
        self.exercises.push(exercise);
        true
    }

    pub fn remove_exercise(&mut self, exercise_index: usize) -> bool {
        if !self.accepts_input() || exercise_index >= self.exercises.len() {
            return false;
        }
        let removed = self.exercises.remove(exercise_index);
        info!(exercise = %removed.id, "exercise removed from session");
        true
    }

    /// Start a rest countdown by hand for a strength exercise
    pub fn open_rest_timer(&mut self, exercise_index: usize) -> bool {
        if !self.accepts_input() {
            return false;
        }
        match self.exercises.get(exercise_index) {
            Some(exercise) if !exercise.is_cardio() => {
                let (group, name) = (exercise.muscle_group, exercise.name.clone());
                self.rest.start(group, &name, &self.rest_overrides) > 0
            }
            _ => false,
        }
    }

    /// Dismiss the rest countdown and reopen the gate
    pub fn close_rest_timer(&mut self) {
        self.rest.close();
    }

    pub fn tick_rest(&mut self) -> TickOutcome {
        self.rest.tick()
    }

    pub fn toggle_rest_pause(&mut self) -> bool {
        self.rest.toggle_pause()
    }

    pub fn reset_rest(&mut self) -> bool {
        self.rest.reset()
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.rest.toggle_mute()
    }

    /// Remember `seconds` for the resting exercise, then restart the countdown
    /// at that value. Nothing changes when saving fails.
    pub fn apply_custom_rest(&mut self, seconds: u32, prefs: &impl RestTimePreferences) -> Result<bool, SessionError> {
        if !self.rest.is_active() || seconds == 0 {
            return Ok(false);
        }
        let Some(context) = self.rest.context().cloned() else {
            return Ok(false);
        };
        prefs
            .set_custom_rest_time(context.muscle_group, &context.exercise_name, seconds)
            .map_err(SessionError::Storage)?;
        self.rest.apply_custom(seconds);
        self.rest_overrides.insert((context.muscle_group, context.exercise_name), seconds);
        Ok(true)
    }

    /// Save the session as a workout for its day.
    ///
    /// On storage failure the session stays in progress so the caller can retry.
    pub fn complete_session(&mut self, repo: &impl WorkoutRepository) -> Result<Workout, SessionError> {
        match self.state {
            SessionState::InProgress => {}
            SessionState::NotStarted => return Err(SessionError::NoStartTime),
            SessionState::Completed | SessionState::RestDay => return Err(SessionError::NotInProgress),
        }
        let started_at = self.started_at.ok_or(SessionError::NoStartTime)?;

        let now = self.clock.now();
        let elapsed_ms = (now - started_at).num_milliseconds();
        let duration = (elapsed_ms as f64 / 60_000.0).round() as i64;

        let workout = Workout {
            id: now.timestamp_millis().to_string(),
            date: now,
            exercises: self.exercises.clone(),
            duration_in_minutes: Some(duration),
        };
        repo.append_workout(&self.day, &workout).map_err(SessionError::Storage)?;

        self.rest.close();
        self.state = SessionState::Completed;
        info!(day = %self.day, duration, "session completed");
        Ok(workout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::db::ProgressiveOverload;
    use crate::exercises::{MuscleGroup, find_exercise};
    use anyhow::{Result, bail};
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Clock moved by hand
    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl ManualClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap())))
        }

        fn advance_ms(&self, ms: i64) {
            self.0.set(self.0.get() + Duration::milliseconds(ms));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    /// Reads work, writes fail
    struct ReadOnlyStore(Database);

    impl WorkoutRepository for ReadOnlyStore {
        fn last_workout(&self, day: &str) -> Result<Option<Workout>> {
            self.0.last_workout(day)
        }
        fn append_workout(&self, _day: &str, _workout: &Workout) -> Result<()> {
            bail!("disk full")
        }
        fn workout_log(&self) -> Result<WorkoutLog> {
            self.0.workout_log()
        }
        fn is_rest_day(&self, day: &str) -> Result<bool> {
            self.0.is_rest_day(day)
        }
    }

    impl ProfileStore for ReadOnlyStore {
        fn profile(&self) -> Result<UserProfile> {
            self.0.profile()
        }
        fn save_profile(&self, _profile: &UserProfile) -> Result<()> {
            bail!("disk full")
        }
    }

    impl RestTimePreferences for ReadOnlyStore {
        fn custom_rest_time(&self, group: MuscleGroup, exercise_name: &str) -> Result<Option<u32>> {
            self.0.custom_rest_time(group, exercise_name)
        }
        fn set_custom_rest_time(&self, _group: MuscleGroup, _exercise_name: &str, _seconds: u32) -> Result<()> {
            bail!("disk full")
        }
        fn custom_rest_times(&self) -> Result<RestOverrides> {
            self.0.custom_rest_times()
        }
    }

    fn memory_db() -> Database {
        Database::open(":memory:").unwrap()
    }

    fn started(day: &str, db: &Database) -> (WorkoutSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut session = WorkoutSession::with_clock(day, clock.clone());
        assert_eq!(session.start(db).unwrap(), SessionState::InProgress);
        (session, clock)
    }

    fn create_exercise(id: &str, group: MuscleGroup, sets: Vec<WorkoutSet>) -> Exercise {
        Exercise {
            id: id.to_string(),
            name: id.to_string(),
            muscle_group: group,
            sets,
            is_bodyweight: false,
            current_active_set_index: 0,
            custom: false,
        }
    }

    fn save_monday(db: &Database, exercises: Vec<Exercise>) {
        let workout = Workout {
            id: "1".to_string(),
            date: Utc::now() - Duration::days(7),
            exercises,
            duration_in_minutes: Some(40),
        };
        db.append_workout("monday", &workout).unwrap();
    }

    #[test]
    fn test_start_from_default_plan() {
        let db = memory_db();
        let (session, _) = started("monday", &db);

        let expected: Vec<String> = default_day_exercises("monday").into_iter().map(|e| e.id).collect();
        let ids: Vec<String> = session.exercises().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, expected);
        for exercise in session.exercises() {
            assert_eq!(exercise.current_active_set_index, 0);
            assert!(exercise.sets.iter().all(|s| !s.completed));
        }
        assert!(session.started_at().is_some());
    }

    #[test]
    fn test_start_applies_increments_to_last_workout() {
        let db = memory_db();
        let done = WorkoutSet { weight: 100.0, reps: 8, completed: true };
        let mut squat = create_exercise("squat", MuscleGroup::Legs, vec![done, done]);
        squat.sets[0].reps = 5;
        squat.current_active_set_index = 2;
        save_monday(&db, vec![squat]);

        let (session, _) = started("monday", &db);
        let squat = &session.exercises()[0];
        assert_eq!(squat.current_active_set_index, 0);
        assert_eq!(squat.sets[1], WorkoutSet::new(105.0, 8));
        assert!(squat.sets.iter().all(|s| !s.completed));
    }

    #[test]
    fn test_start_without_overload_keeps_numbers() {
        let db = memory_db();
        db.save_profile(&UserProfile {
            progressive_overload: ProgressiveOverload { enabled: false },
            ..UserProfile::default()
        })
        .unwrap();
        let done = WorkoutSet { weight: 100.0, reps: 9, completed: true };
        save_monday(&db, vec![create_exercise("squat", MuscleGroup::Legs, vec![WorkoutSet::new(100.0, 5), done])]);

        let (session, _) = started("monday", &db);
        assert_eq!(session.exercises()[0].sets[1].weight, 100.0);
    }

    #[test]
    fn test_rest_day_short_circuits() {
        let db = memory_db();
        let mut session = WorkoutSession::with_clock("saturday", ManualClock::new());
        assert_eq!(session.start(&db).unwrap(), SessionState::RestDay);
        assert!(session.exercises().is_empty());
        assert!(matches!(session.complete_session(&db), Err(SessionError::NotInProgress)));
    }

    #[test]
    fn test_confirm_out_of_order_is_noop() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);
        let before = session.exercises().to_vec();

        assert!(!session.confirm_set(0, 1));
        assert!(!session.confirm_set(0, 5));
        assert!(!session.confirm_set(42, 0));
        assert_eq!(session.exercises(), before.as_slice());
        assert!(!session.is_resting());
    }

    #[test]
    fn test_confirm_advances_cursor_per_exercise() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);

        assert!(session.confirm_set(0, 0));
        session.close_rest_timer();
        assert!(session.confirm_set(1, 0));
        session.close_rest_timer();
        assert!(session.confirm_set(0, 1));

        assert_eq!(session.exercises()[0].current_active_set_index, 2);
        assert_eq!(session.exercises()[1].current_active_set_index, 1);
        assert!(session.exercises()[0].sets[1].completed);
        // Confirmed sets cannot be confirmed again
        session.close_rest_timer();
        assert!(!session.confirm_set(0, 1));
    }

    #[test]
    fn test_rest_gate_blocks_input() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);

        assert!(session.confirm_set(0, 0));
        assert!(session.is_resting());
        let before = session.exercises().to_vec();

        assert!(!session.edit_set_value(0, 1, SetValue::Weight(50.0)));
        assert!(!session.edit_set_value(1, 0, SetValue::Reps(3)));
        assert!(!session.confirm_set(0, 1));
        assert!(!session.confirm_set(1, 0));
        assert!(!session.add_set(0));
        assert!(!session.remove_exercise(0));
        assert_eq!(session.exercises(), before.as_slice());

        session.close_rest_timer();
        assert!(session.edit_set_value(0, 1, SetValue::Weight(50.0)));
        assert!(session.confirm_set(0, 1));
    }

    #[test]
    fn test_rest_gate_opens_on_expiry() {
        let db = memory_db();
        db.set_custom_rest_time(MuscleGroup::Legs, "Leg Press", 2).unwrap();
        let (mut session, _) = started("monday", &db);

        assert!(session.confirm_set(0, 0));
        assert_eq!(session.tick_rest(), TickOutcome::Counting(1));
        assert_eq!(session.tick_rest(), TickOutcome::Finished { notify: true });
        assert!(!session.is_resting());
        assert!(session.confirm_set(0, 1));
    }

    #[test]
    fn test_cardio_skips_rest_and_add_set() {
        let db = memory_db();
        let (mut session, _) = started("tuesday", &db);
        assert!(session.exercises()[0].is_cardio());

        assert!(!session.add_set(0));
        assert_eq!(session.exercises()[0].sets.len(), 1);
        assert!(!session.open_rest_timer(0));

        assert!(session.confirm_set(0, 0));
        assert!(!session.is_resting());
        assert!(!session.add_set(0));
        assert_eq!(session.exercises()[0].sets.len(), 1);
    }

    #[test]
    fn test_add_set_clones_last() {
        let db = memory_db();
        save_monday(
            &db,
            vec![create_exercise("curl", MuscleGroup::Arms, vec![WorkoutSet::new(20.0, 10), WorkoutSet::new(15.0, 12)])],
        );
        let (mut session, _) = started("monday", &db);

        assert!(session.add_set(0));
        let sets = &session.exercises()[0].sets;
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[2], WorkoutSet::new(15.0, 12));
        assert_eq!(session.exercises()[0].current_active_set_index, 0);
    }

    #[test]
    fn test_edit_set_zero_propagates() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);

        // Leg press: weighted legs exercise, three sets
        assert!(session.edit_set_value(0, 0, SetValue::Weight(140.0)));
        assert!(session.edit_set_value(0, 0, SetValue::Reps(6)));
        assert!(session.exercises()[0].sets.iter().all(|s| s.weight == 140.0 && s.reps == 6));

        // Later sets only change themselves
        assert!(session.confirm_set(0, 0));
        session.close_rest_timer();
        assert!(session.edit_set_value(0, 1, SetValue::Reps(4)));
        let reps: Vec<u32> = session.exercises()[0].sets.iter().map(|s| s.reps).collect();
        assert_eq!(reps, vec![6, 4, 6]);
    }

    #[test]
    fn test_edit_rules() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);

        // Not the active set
        assert!(!session.edit_set_value(0, 1, SetValue::Reps(9)));
        // Pull ups are bodyweight: weight refused, reps propagate
        assert!(!session.edit_set_value(1, 0, SetValue::Weight(20.0)));
        assert!(session.edit_set_value(1, 0, SetValue::Reps(12)));
        assert!(session.exercises()[1].sets.iter().all(|s| s.reps == 12));
        assert!(!session.edit_set_value(0, 0, SetValue::Weight(-5.0)));
    }

    #[test]
    fn test_edit_cardio_does_not_propagate() {
        let db = memory_db();
        save_monday(
            &db,
            vec![create_exercise("intervals", MuscleGroup::Cardio, vec![WorkoutSet::new(1.0, 5), WorkoutSet::new(1.0, 5)])],
        );
        let (mut session, _) = started("monday", &db);

        assert!(session.edit_set_value(0, 0, SetValue::Weight(2.0)));
        assert_eq!(session.exercises()[0].sets[1].weight, 1.0);
    }

    #[test]
    fn test_add_and_remove_exercise() {
        let db = memory_db();
        let (mut session, _) = started("tuesday", &db);
        let deadlift = find_exercise("deadlift").unwrap().to_exercise();

        assert!(session.add_exercise(deadlift));
        assert_eq!(session.exercises().len(), 2);
        assert_eq!(session.exercises()[1].current_active_set_index, 0);

        assert!(session.remove_exercise(0));
        assert_eq!(session.exercises()[0].id, "deadlift");
        assert!(!session.remove_exercise(3));
    }

    #[test]
    fn test_open_rest_timer_manually() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);

        assert!(session.open_rest_timer(0));
        assert!(session.is_resting());
        assert_eq!(session.rest_timer().remaining(), 120);
        assert!(!session.open_rest_timer(1));
    }

    #[test]
    fn test_apply_custom_rest_persists() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);

        assert!(!session.apply_custom_rest(60, &db).unwrap());
        session.confirm_set(0, 0);
        assert!(session.apply_custom_rest(60, &db).unwrap());
        assert_eq!(session.rest_timer().remaining(), 60);
        assert_eq!(db.custom_rest_time(MuscleGroup::Legs, "Leg Press").unwrap(), Some(60));

        // Next rest for the same exercise uses the saved value
        session.close_rest_timer();
        session.confirm_set(0, 1);
        assert_eq!(session.rest_timer().remaining(), 60);
    }

    #[test]
    fn test_duration_rounding() {
        let db = memory_db();
        let (mut session, clock) = started("monday", &db);
        clock.advance_ms(125_000);

        let workout = session.complete_session(&db).unwrap();
        assert_eq!(workout.duration_in_minutes, Some(2));
        assert_eq!(workout.id, clock.now().timestamp_millis().to_string());
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn test_complete_before_start_fails() {
        let db = memory_db();
        let mut session = WorkoutSession::with_clock("monday", ManualClock::new());
        assert!(matches!(session.complete_session(&db), Err(SessionError::NoStartTime)));
        assert_eq!(session.state(), SessionState::NotStarted);
        assert!(db.workout_log().unwrap().is_empty());
    }

    #[test]
    fn test_complete_twice_fails() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);
        session.complete_session(&db).unwrap();
        assert!(matches!(session.complete_session(&db), Err(SessionError::NotInProgress)));
    }

    #[test]
    fn test_storage_failure_keeps_session() {
        let store = ReadOnlyStore(memory_db());
        let clock = ManualClock::new();
        let mut session = WorkoutSession::with_clock("monday", clock);
        session.start(&store).unwrap();
        session.confirm_set(0, 0);

        assert!(matches!(session.complete_session(&store), Err(SessionError::Storage(_))));
        assert_eq!(session.state(), SessionState::InProgress);
        assert!(session.exercises()[0].sets[0].completed);
        assert!(matches!(session.apply_custom_rest(90, &store), Err(SessionError::Storage(_))));
    }

    #[test]
    fn test_failed_rest_save_keeps_countdown() {
        let store = ReadOnlyStore(memory_db());
        let mut session = WorkoutSession::with_clock("monday", ManualClock::new());
        session.start(&store).unwrap();
        session.confirm_set(0, 0);
        session.tick_rest();
        let before = session.rest_timer().state();

        assert!(matches!(session.apply_custom_rest(60, &store), Err(SessionError::Storage(_))));
        assert_eq!(session.rest_timer().state(), before);

        // Next rest still uses the recommendation
        session.close_rest_timer();
        session.confirm_set(0, 1);
        assert_eq!(session.rest_timer().remaining(), 120);
    }

    #[test]
    fn test_completed_workout_feeds_next_session() {
        let db = memory_db();
        let (mut session, clock) = started("tuesday", &db);
        assert!(session.edit_set_value(0, 0, SetValue::Reps(30)));
        assert!(session.confirm_set(0, 0));
        clock.advance_ms(30 * 60_000);
        session.complete_session(&db).unwrap();

        let last = db.last_workout("tuesday").unwrap().unwrap();
        assert_eq!(last.duration_in_minutes, Some(30));

        let (next, _) = started("tuesday", &db);
        let run = &next.exercises()[0];
        assert_eq!(run.sets[0], WorkoutSet::new(5.1, 30));
    }

    #[test]
    fn test_select_day_rebuilds() {
        let db = memory_db();
        let (mut session, _) = started("monday", &db);
        session.confirm_set(0, 0);

        assert_eq!(session.select_day("tuesday", &db).unwrap(), SessionState::InProgress);
        assert_eq!(session.day(), "tuesday");
        assert!(!session.is_resting());
        assert_eq!(session.exercises().len(), 1);
    }

    #[test]
    fn test_plan_editing() {
        let db = memory_db();
        let now = Utc::now();
        let squat = create_exercise("squat", MuscleGroup::Legs, vec![WorkoutSet::new(60.0, 5), WorkoutSet::new(0.0, 0)]);

        let saved = add_to_plan(&db, "tuesday", squat, now).unwrap();
        assert_eq!(saved.exercises.len(), 2);
        assert_eq!(saved.exercises[1].sets[1], WorkoutSet::new(60.0, 5));
        assert_eq!(saved.duration_in_minutes, None);

        let plan = planned_exercises(&db, "tuesday").unwrap();
        assert_eq!(plan, saved.exercises);

        let trimmed = remove_from_plan(&db, "tuesday", 0, now).unwrap().unwrap();
        assert_eq!(trimmed.exercises[0].id, "squat");
        assert!(remove_from_plan(&db, "tuesday", 9, now).unwrap().is_none());
    }
}
