//! Database module - SQLite storage for workouts, days and settings

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::exercises::{
    DEFAULT_DAY_ORDER, DEFAULT_REST_DAYS, Exercise, MuscleGroup, get_all_exercises, is_default_day,
};
use crate::session::rest_timer::RestOverrides;

/// Saved workout. Immutable once appended to a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub date: DateTime<Utc>,
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_minutes: Option<i64>,
}

/// Day key -> workouts in the order they were saved
pub type WorkoutLog = BTreeMap<String, Vec<Workout>>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressiveOverload {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    /// Body weight, used wherever an exercise is bodyweight
    pub weight: f64,
    pub height: f64,
    pub progressive_overload: ProgressiveOverload,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            weight: 0.0,
            height: 0.0,
            progressive_overload: ProgressiveOverload { enabled: true },
        }
    }
}

/// Entry of the ordered day list
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    pub name: String,
    pub is_rest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Per-day workout storage
pub trait WorkoutRepository {
    fn last_workout(&self, day: &str) -> Result<Option<Workout>>;
    fn append_workout(&self, day: &str, workout: &Workout) -> Result<()>;
    fn workout_log(&self) -> Result<WorkoutLog>;
    fn is_rest_day(&self, day: &str) -> Result<bool>;
}

pub trait ProfileStore {
    fn profile(&self) -> Result<UserProfile>;
    fn save_profile(&self, profile: &UserProfile) -> Result<()>;
}

/// Saved rest-timer overrides keyed by (muscle group, exercise name)
pub trait RestTimePreferences {
    fn custom_rest_time(&self, group: MuscleGroup, exercise_name: &str) -> Result<Option<u32>>;
    fn set_custom_rest_time(&self, group: MuscleGroup, exercise_name: &str, seconds: u32) -> Result<()>;
    fn custom_rest_times(&self) -> Result<RestOverrides>;
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("failed to open database {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        db.seed_defaults()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workouts (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                day_key TEXT NOT NULL,
                date TEXT NOT NULL,
                exercises TEXT NOT NULL,
                duration_minutes INTEGER
            );
            CREATE TABLE IF NOT EXISTS days (
                name TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                is_rest INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                name TEXT NOT NULL,
                weight REAL NOT NULL,
                height REAL NOT NULL,
                overload_enabled INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rest_times (
                muscle_group TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                seconds INTEGER NOT NULL,
                PRIMARY KEY (muscle_group, exercise_name)
            );
            CREATE TABLE IF NOT EXISTS custom_exercises (
                id TEXT PRIMARY KEY,
                definition TEXT NOT NULL
            );",
        )?;
        debug!("schema ready");
        Ok(())
    }

    /// First run: default week and profile
    fn seed_defaults(&self) -> Result<()> {
        let day_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM days", [], |row| row.get(0))?;
        if day_count == 0 {
            for (position, day) in DEFAULT_DAY_ORDER.iter().enumerate() {
                self.conn.execute(
                    "INSERT INTO days (name, position, is_rest) VALUES (?1, ?2, ?3)",
                    params![day, position as i64, DEFAULT_REST_DAYS.contains(day)],
                )?;
            }
            debug!("seeded default days");
        }

        let defaults = UserProfile::default();
        self.conn.execute(
            "INSERT OR IGNORE INTO profile (id, name, weight, height, overload_enabled) VALUES (1, ?1, ?2, ?3, ?4)",
            params![defaults.name, defaults.weight, defaults.height, defaults.progressive_overload.enabled],
        )?;
        Ok(())
    }

    // --- days ---

    /// Days in display order
    pub fn days(&self) -> Result<Vec<Day>> {
        let mut stmt = self.conn.prepare("SELECT name, is_rest FROM days ORDER BY position")?;
        let days = stmt
            .query_map([], |row| Ok(Day { name: row.get(0)?, is_rest: row.get(1)? }))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(days)
    }

    fn day_exists(&self, name: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row("SELECT name FROM days WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Normalized key of an existing day
    pub fn resolve_day(&self, name: &str) -> Result<String> {
        let name = name.trim().to_lowercase();
        if !self.day_exists(&name)? {
            bail!("Unknown day: {}", name);
        }
        Ok(name)
    }

    /// Append a new training day; returns the normalized name
    pub fn add_day(&self, name: &str) -> Result<String> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            bail!("Day name cannot be empty.");
        }
        if self.day_exists(&name)? {
            bail!("Day with this name already exists.");
        }

        let next: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(position) + 1, 0) FROM days", [], |row| row.get(0))?;
        self.conn.execute(
            "INSERT INTO days (name, position, is_rest) VALUES (?1, ?2, 0)",
            params![name, next],
        )?;
        debug!(day = %name, "day added");
        Ok(name)
    }

    /// Remove a user-added day together with its workouts
    pub fn remove_day(&self, name: &str) -> Result<()> {
        let name = name.trim().to_lowercase();
        if is_default_day(&name) {
            bail!("Default days (Monday-Sunday) cannot be removed.");
        }
        if !self.day_exists(&name)? {
            bail!("No day named \"{}\".", name);
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM workouts WHERE day_key = ?1", params![name])?;
        tx.execute("DELETE FROM days WHERE name = ?1", params![name])?;
        tx.commit()?;
        debug!(day = %name, "day removed");
        Ok(())
    }

    /// Rename a day; its workouts and rest flag follow
    pub fn rename_day(&self, old: &str, new: &str) -> Result<String> {
        let old = old.trim().to_lowercase();
        let new = new.trim().to_lowercase();

        if new.is_empty() {
            bail!("New day name cannot be empty.");
        }
        if old == new {
            bail!("New name is the same as the old name.");
        }
        if !self.day_exists(&old)? {
            bail!("No day named \"{}\".", old);
        }
        if self.day_exists(&new)? {
            bail!("New day name already exists.");
        }
        if is_default_day(&old) && is_default_day(&new) {
            bail!("Cannot rename a default day to another default day's name.");
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("UPDATE days SET name = ?1 WHERE name = ?2", params![new, old])?;
        tx.execute("UPDATE workouts SET day_key = ?1 WHERE day_key = ?2", params![new, old])?;
        tx.commit()?;
        debug!(from = %old, to = %new, "day renamed");
        Ok(new)
    }

    /// Swap a day with its neighbour. Returns false at the edges.
    pub fn move_day(&self, name: &str, direction: MoveDirection) -> Result<bool> {
        let name = name.trim().to_lowercase();
        let mut days = self.days()?;
        let index = days
            .iter()
            .position(|d| d.name == name)
            .with_context(|| format!("No day named \"{}\".", name))?;

        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < days.len() => index + 1,
            _ => return Ok(false),
        };
        days.swap(index, target);

        let tx = self.conn.unchecked_transaction()?;
        for (position, day) in days.iter().enumerate() {
            tx.execute("UPDATE days SET position = ?1 WHERE name = ?2", params![position as i64, day.name])?;
        }
        tx.commit()?;
        Ok(true)
    }

    pub fn set_rest_day(&self, name: &str, is_rest: bool) -> Result<()> {
        let name = name.trim().to_lowercase();
        let changed = self
            .conn
            .execute("UPDATE days SET is_rest = ?1 WHERE name = ?2", params![is_rest, name])?;
        if changed == 0 {
            bail!("No day named \"{}\".", name);
        }
        Ok(())
    }

    // --- exercise catalog ---

    pub fn add_custom_exercise(&self, exercise: &Exercise) -> Result<()> {
        let definition = serde_json::to_string(exercise)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO custom_exercises (id, definition) VALUES (?1, ?2)",
            params![exercise.id, definition],
        )?;
        debug!(id = %exercise.id, "custom exercise saved");
        Ok(())
    }

    pub fn custom_exercises(&self) -> Result<Vec<Exercise>> {
        let mut stmt = self.conn.prepare("SELECT definition FROM custom_exercises ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|json| serde_json::from_str(json).context("corrupt custom exercise definition"))
            .collect()
    }

    /// Built-in exercises followed by user-defined ones
    pub fn catalog(&self) -> Result<Vec<Exercise>> {
        let mut all: Vec<Exercise> = get_all_exercises().iter().map(|t| t.to_exercise()).collect();
        all.extend(self.custom_exercises()?);
        Ok(all)
    }

    pub fn find_catalog_exercise(&self, id: &str) -> Result<Option<Exercise>> {
        Ok(self.catalog()?.into_iter().find(|e| e.id == id))
    }

    // --- workouts ---

    /// Saved workouts, most recent first
    pub fn recent_workouts(&self, limit: usize) -> Result<Vec<(String, Workout)>> {
        let mut stmt = self.conn.prepare(
            "SELECT day_key, id, date, exercises, duration_minutes FROM workouts ORDER BY seq DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, WorkoutRow::from_columns(row, 1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|(day, row)| Ok((day, row.decode()?))).collect()
    }
}

/// Raw workout columns before JSON decoding
struct WorkoutRow {
    id: String,
    date: String,
    exercises: String,
    duration: Option<i64>,
}

impl WorkoutRow {
    fn from_columns(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            date: row.get(offset + 1)?,
            exercises: row.get(offset + 2)?,
            duration: row.get(offset + 3)?,
        })
    }

    fn decode(self) -> Result<Workout> {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .with_context(|| format!("bad date on workout {}", self.id))?
            .with_timezone(&Utc);
        let exercises = serde_json::from_str(&self.exercises)
            .with_context(|| format!("bad exercises on workout {}", self.id))?;
        Ok(Workout { id: self.id, date, exercises, duration_in_minutes: self.duration })
    }
}

impl WorkoutRepository for Database {
    fn last_workout(&self, day: &str) -> Result<Option<Workout>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, date, exercises, duration_minutes FROM workouts WHERE day_key = ?1 ORDER BY seq DESC LIMIT 1",
                params![day],
                |row| WorkoutRow::from_columns(row, 0),
            )
            .optional()?;
        row.map(WorkoutRow::decode).transpose()
    }

    fn append_workout(&self, day: &str, workout: &Workout) -> Result<()> {
        let exercises = serde_json::to_string(&workout.exercises)?;
        self.conn.execute(
            "INSERT INTO workouts (id, day_key, date, exercises, duration_minutes) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![workout.id, day, workout.date.to_rfc3339(), exercises, workout.duration_in_minutes],
        )?;
        debug!(day, id = %workout.id, "workout appended");
        Ok(())
    }

    fn workout_log(&self) -> Result<WorkoutLog> {
        let mut stmt = self
            .conn
            .prepare("SELECT day_key, id, date, exercises, duration_minutes FROM workouts ORDER BY seq")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, WorkoutRow::from_columns(row, 1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut log = WorkoutLog::new();
        for (day, row) in rows {
            log.entry(day).or_default().push(row.decode()?);
        }
        Ok(log)
    }

    fn is_rest_day(&self, day: &str) -> Result<bool> {
        let flag: Option<bool> = self
            .conn
            .query_row("SELECT is_rest FROM days WHERE name = ?1", params![day], |row| row.get(0))
            .optional()?;
        Ok(flag.unwrap_or(false))
    }
}

impl ProfileStore for Database {
    fn profile(&self) -> Result<UserProfile> {
        let profile = self.conn.query_row(
            "SELECT name, weight, height, overload_enabled FROM profile WHERE id = 1",
            [],
            |row| {
                Ok(UserProfile {
                    name: row.get(0)?,
                    weight: row.get(1)?,
                    height: row.get(2)?,
                    progressive_overload: ProgressiveOverload { enabled: row.get(3)? },
                })
            },
        )?;
        Ok(profile)
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO profile (id, name, weight, height, overload_enabled) VALUES (1, ?1, ?2, ?3, ?4)",
            params![profile.name, profile.weight, profile.height, profile.progressive_overload.enabled],
        )?;
        Ok(())
    }
}

impl RestTimePreferences for Database {
    fn custom_rest_time(&self, group: MuscleGroup, exercise_name: &str) -> Result<Option<u32>> {
        let seconds = self
            .conn
            .query_row(
                "SELECT seconds FROM rest_times WHERE muscle_group = ?1 AND exercise_name = ?2",
                params![group.name(), exercise_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seconds)
    }

    fn set_custom_rest_time(&self, group: MuscleGroup, exercise_name: &str, seconds: u32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO rest_times (muscle_group, exercise_name, seconds) VALUES (?1, ?2, ?3)",
            params![group.name(), exercise_name, seconds],
        )?;
        debug!(%group, exercise_name, seconds, "rest time saved");
        Ok(())
    }

    fn custom_rest_times(&self) -> Result<RestOverrides> {
        let mut stmt = self.conn.prepare("SELECT muscle_group, exercise_name, seconds FROM rest_times")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, u32>(2)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut overrides = RestOverrides::new();
        for (group, name, seconds) in rows {
            let group: MuscleGroup = group.parse().map_err(anyhow::Error::msg)?;
            overrides.insert((group, name), seconds);
        }
        Ok(overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::{NewExercise, WorkoutSet, find_exercise};

    fn memory_db() -> Database {
        Database::open(":memory:").unwrap()
    }

    fn create_workout(id: &str, exercise_id: &str, reps: u32) -> Workout {
        let mut exercise = find_exercise(exercise_id).unwrap().to_exercise();
        exercise.sets = vec![WorkoutSet { weight: 50.0, reps, completed: true }];
        exercise.current_active_set_index = 1;
        Workout {
            id: id.to_string(),
            date: Utc::now(),
            exercises: vec![exercise],
            duration_in_minutes: Some(42),
        }
    }

    #[test]
    fn test_seeded_days() {
        let db = memory_db();
        let days = db.days().unwrap();
        let names: Vec<_> = days.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, DEFAULT_DAY_ORDER.to_vec());
        assert!(db.is_rest_day("sunday").unwrap());
        assert!(!db.is_rest_day("monday").unwrap());
        assert!(!db.is_rest_day("unknown").unwrap());
    }

    #[test]
    fn test_default_profile() {
        let db = memory_db();
        let profile = db.profile().unwrap();
        assert_eq!(profile, UserProfile::default());
        assert!(profile.progressive_overload.enabled);
    }

    #[test]
    fn test_save_profile() {
        let db = memory_db();
        let profile = UserProfile {
            name: "Alex".to_string(),
            weight: 81.5,
            height: 180.0,
            progressive_overload: ProgressiveOverload { enabled: false },
        };
        db.save_profile(&profile).unwrap();
        assert_eq!(db.profile().unwrap(), profile);
    }

    #[test]
    fn test_last_workout_roundtrip() {
        let db = memory_db();
        assert!(db.last_workout("monday").unwrap().is_none());

        let first = create_workout("1", "deadlift", 5);
        let second = create_workout("2", "deadlift", 6);
        db.append_workout("monday", &first).unwrap();
        db.append_workout("monday", &second).unwrap();

        let last = db.last_workout("monday").unwrap().unwrap();
        assert_eq!(last.id, "2");
        assert_eq!(last.exercises, second.exercises);
        assert_eq!(last.duration_in_minutes, Some(42));
    }

    #[test]
    fn test_workout_log_groups_by_day() {
        let db = memory_db();
        db.append_workout("monday", &create_workout("a", "deadlift", 5)).unwrap();
        db.append_workout("tuesday", &create_workout("b", "run-5k", 30)).unwrap();
        db.append_workout("monday", &create_workout("c", "deadlift", 6)).unwrap();

        let log = db.workout_log().unwrap();
        let monday: Vec<_> = log["monday"].iter().map(|w| w.id.as_str()).collect();
        assert_eq!(monday, vec!["a", "c"]);
        assert_eq!(log["tuesday"].len(), 1);

        let recent = db.recent_workouts(2).unwrap();
        assert_eq!(recent[0].1.id, "c");
        assert_eq!(recent[1].0, "tuesday");
    }

    #[test]
    fn test_workout_json_shape() {
        let workout = create_workout("x", "pull-ups", 10);
        let json = serde_json::to_value(&workout).unwrap();
        assert_eq!(json["durationInMinutes"], 42);
        assert_eq!(json["exercises"][0]["muscleGroup"], "back");
        assert_eq!(json["exercises"][0]["isBodyweight"], true);
        assert_eq!(json["exercises"][0]["currentActiveSetIndex"], 1);
    }

    #[test]
    fn test_rest_time_preferences() {
        let db = memory_db();
        assert_eq!(db.custom_rest_time(MuscleGroup::Back, "Deadlift").unwrap(), None);

        db.set_custom_rest_time(MuscleGroup::Back, "Deadlift", 240).unwrap();
        db.set_custom_rest_time(MuscleGroup::Back, "Deadlift", 200).unwrap();
        assert_eq!(db.custom_rest_time(MuscleGroup::Back, "Deadlift").unwrap(), Some(200));
        assert_eq!(db.custom_rest_time(MuscleGroup::Legs, "Deadlift").unwrap(), None);

        let all = db.custom_rest_times().unwrap();
        assert_eq!(all.get(&(MuscleGroup::Back, "Deadlift".to_string())), Some(&200));
    }

    #[test]
    fn test_resolve_day() {
        let db = memory_db();
        assert_eq!(db.resolve_day(" Monday ").unwrap(), "monday");
        db.add_day("Leg Day").unwrap();
        assert_eq!(db.resolve_day("LEG DAY").unwrap(), "leg day");
        assert!(db.resolve_day("someday").is_err());
        assert!(db.resolve_day("").is_err());
    }

    #[test]
    fn test_add_day_validation() {
        let db = memory_db();
        assert_eq!(db.add_day("  Leg Day ").unwrap(), "leg day");
        assert!(db.add_day("   ").is_err());
        assert!(db.add_day("LEG DAY").is_err());

        let days = db.days().unwrap();
        assert_eq!(days.last().unwrap().name, "leg day");
        assert!(!days.last().unwrap().is_rest);
    }

    #[test]
    fn test_remove_day() {
        let db = memory_db();
        let err = db.remove_day("monday").unwrap_err();
        assert!(err.to_string().contains("cannot be removed"));

        db.add_day("extra").unwrap();
        db.append_workout("extra", &create_workout("e", "deadlift", 5)).unwrap();
        db.remove_day("extra").unwrap();
        assert!(!db.workout_log().unwrap().contains_key("extra"));
        assert_eq!(db.days().unwrap().len(), 7);
    }

    #[test]
    fn test_rename_day_moves_workouts_and_rest_flag() {
        let db = memory_db();
        db.append_workout("saturday", &create_workout("s", "run-5k", 30)).unwrap();
        db.rename_day("saturday", "Long Run").unwrap();

        assert!(db.is_rest_day("long run").unwrap());
        assert!(db.last_workout("long run").unwrap().is_some());
        assert!(db.last_workout("saturday").unwrap().is_none());
    }

    #[test]
    fn test_rename_day_validation() {
        let db = memory_db();
        assert!(db.rename_day("monday", " ").is_err());
        assert!(db.rename_day("monday", "Monday").is_err());
        assert!(db.rename_day("monday", "tuesday").is_err());
        assert!(db.rename_day("nope", "other").is_err());
    }

    #[test]
    fn test_move_day() {
        let db = memory_db();
        assert!(!db.move_day("monday", MoveDirection::Up).unwrap());
        assert!(!db.move_day("sunday", MoveDirection::Down).unwrap());
        assert!(db.move_day("monday", MoveDirection::Down).unwrap());

        let days = db.days().unwrap();
        assert_eq!(days[0].name, "tuesday");
        assert_eq!(days[1].name, "monday");
    }

    #[test]
    fn test_set_rest_day() {
        let db = memory_db();
        db.set_rest_day("monday", true).unwrap();
        assert!(db.is_rest_day("monday").unwrap());
        db.set_rest_day("monday", false).unwrap();
        assert!(!db.is_rest_day("monday").unwrap());
        assert!(db.set_rest_day("nope", true).is_err());
    }

    #[test]
    fn test_catalog_includes_custom() {
        let db = memory_db();
        let new = NewExercise { name: "Hip Thrust".to_string(), muscle_group: MuscleGroup::Legs, ..NewExercise::default() };
        let custom = Exercise::custom(&new, 0.0, Utc::now());
        db.add_custom_exercise(&custom).unwrap();

        let catalog = db.catalog().unwrap();
        assert_eq!(catalog.len(), get_all_exercises().len() + 1);
        assert_eq!(db.find_catalog_exercise(&custom.id).unwrap(), Some(custom));
        assert!(db.find_catalog_exercise("leg-press").unwrap().is_some());
    }
}
