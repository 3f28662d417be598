//! Exercise definitions - default catalog and weekly plan

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Muscle groups for tagging exercises
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    /// weight = distance (miles), reps = duration (minutes)
    Cardio,
}

impl MuscleGroup {
    pub fn name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Arms => "arms",
            MuscleGroup::Core => "core",
            MuscleGroup::Cardio => "cardio",
        }
    }

    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Legs,
            MuscleGroup::Shoulders,
            MuscleGroup::Arms,
            MuscleGroup::Core,
            MuscleGroup::Cardio,
        ]
    }

    /// Legs, back and chest: bigger load jumps, longer rests
    pub fn is_large(&self) -> bool {
        matches!(self, MuscleGroup::Legs | MuscleGroup::Back | MuscleGroup::Chest)
    }

    pub fn is_cardio(&self) -> bool {
        *self == MuscleGroup::Cardio
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for MuscleGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        MuscleGroup::all()
            .iter()
            .find(|g| g.name() == lower)
            .copied()
            .ok_or_else(|| format!("unknown muscle group: {}", s))
    }
}

/// One set of an exercise. `reps == 0` on a strength exercise means "to failure".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub weight: f64,
    pub reps: u32,
    pub completed: bool,
}

impl WorkoutSet {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self { weight, reps, completed: false }
    }
}

/// Exercise definition plus its live state during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub sets: Vec<WorkoutSet>,
    #[serde(default)]
    pub is_bodyweight: bool,
    /// Next set eligible for completion, in `0..=sets.len()`
    #[serde(default)]
    pub current_active_set_index: usize,
    #[serde(default)]
    pub custom: bool,
}

impl Exercise {
    pub fn is_cardio(&self) -> bool {
        self.muscle_group.is_cardio()
    }

    /// Every set confirmed for this session
    pub fn is_finished(&self) -> bool {
        self.current_active_set_index >= self.sets.len()
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    /// Load actually moved in a set; bodyweight exercises never use the stored value
    pub fn effective_weight(&self, set: &WorkoutSet, body_weight: f64) -> f64 {
        if self.is_bodyweight { body_weight } else { set.weight }
    }

    /// Build a user-defined exercise
    pub fn custom(new: &NewExercise, body_weight: f64, now: DateTime<Utc>) -> Self {
        let sets = if new.muscle_group.is_cardio() {
            vec![WorkoutSet::new(new.weight, new.reps)]
        } else {
            let weight = if new.is_bodyweight { body_weight } else { new.weight };
            vec![WorkoutSet::new(weight, new.reps); new.num_sets.max(1)]
        };

        Self {
            id: format!("custom-{}", now.timestamp_millis()),
            name: new.name.trim().to_string(),
            muscle_group: new.muscle_group,
            sets,
            is_bodyweight: new.is_bodyweight,
            current_active_set_index: 0,
            custom: true,
        }
    }
}

/// Copy set 0's weight/reps onto every set and rewind the cursor.
/// Exercises without sets are returned untouched.
pub fn propagate(mut exercise: Exercise) -> Exercise {
    let Some(first) = exercise.sets.first().copied() else {
        return exercise;
    };
    for set in &mut exercise.sets {
        set.weight = first.weight;
        set.reps = first.reps;
    }
    exercise.current_active_set_index = 0;
    exercise
}

/// Form data for a custom exercise
#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub weight: f64,
    pub reps: u32,
    pub num_sets: usize,
    pub is_bodyweight: bool,
}

impl Default for NewExercise {
    fn default() -> Self {
        Self {
            name: String::new(),
            muscle_group: MuscleGroup::Chest,
            weight: 0.0,
            reps: 8,
            num_sets: 3,
            is_bodyweight: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SetTemplate {
    pub weight: f64,
    pub reps: u32,
}

const fn set(weight: f64, reps: u32) -> SetTemplate {
    SetTemplate { weight, reps }
}

#[derive(Debug, Clone, Copy)]
pub struct ExerciseTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub muscle_group: MuscleGroup,
    pub sets: &'static [SetTemplate],
    pub is_bodyweight: bool,
}

impl ExerciseTemplate {
    pub fn to_exercise(&self) -> Exercise {
        Exercise {
            id: self.id.to_string(),
            name: self.name.to_string(),
            muscle_group: self.muscle_group,
            sets: self.sets.iter().map(|s| WorkoutSet::new(s.weight, s.reps)).collect(),
            is_bodyweight: self.is_bodyweight,
            current_active_set_index: 0,
            custom: false,
        }
    }
}

const fn template(
    id: &'static str,
    name: &'static str,
    muscle_group: MuscleGroup,
    sets: &'static [SetTemplate],
) -> ExerciseTemplate {
    ExerciseTemplate { id, name, muscle_group, sets, is_bodyweight: false }
}

const fn bodyweight(
    id: &'static str,
    name: &'static str,
    muscle_group: MuscleGroup,
    sets: &'static [SetTemplate],
) -> ExerciseTemplate {
    ExerciseTemplate { id, name, muscle_group, sets, is_bodyweight: true }
}

use MuscleGroup::{Arms, Back, Cardio, Chest, Legs, Shoulders};

impl ExerciseTemplate {
    /// Same exercise with a different set list
    const fn with_sets(self, sets: &'static [SetTemplate]) -> Self {
        ExerciseTemplate { sets, ..self }
    }
}

const LEG_PRESS: ExerciseTemplate = template("leg-press", "Leg Press", Legs, &[set(0.0, 5)]);
const PULL_UPS: ExerciseTemplate = bodyweight("pull-ups", "Pull ups", Back, &[set(0.0, 0)]);
const INCLINE_BENCH: ExerciseTemplate = template("incline-bench", "Incline Bench", Chest, &[set(0.0, 5)]);
const CUBAN_PRESS: ExerciseTemplate =
    template("cuban-press", "Cuban Press", Shoulders, &[set(0.0, 8), set(0.0, 8), set(0.0, 8)]);
const PREACHER_CURL: ExerciseTemplate = template("preacher-curl", "Preacher Curl", Arms, &[set(0.0, 5), set(0.0, 5)]);
const RUN_5K: ExerciseTemplate = template("run-5k", "Run 5k", Cardio, &[set(5.0, 0)]);
const DEADLIFT: ExerciseTemplate = template("deadlift", "Deadlift", Back, &[set(0.0, 5), set(0.0, 5)]);
const OVERHEAD_PRESS: ExerciseTemplate =
    template("overhead-press", "Overhead press", Shoulders, &[set(0.0, 5), set(0.0, 5)]);
const DEFICIT_PUSHUPS: ExerciseTemplate =
    bodyweight("deficit-pushups", "Deficit Pushups", Chest, &[set(0.0, 0), set(0.0, 0)]);
const LEG_EXTENSION: ExerciseTemplate = template("leg-extension", "Leg Extension", Legs, &[set(0.0, 5), set(0.0, 5)]);
const CALF_RAISES: ExerciseTemplate =
    template("calf-raises", "Calf Raises", Legs, &[set(0.0, 5), set(0.0, 5), set(0.0, 5), set(0.0, 5)]);
const LATERAL_RAISES: ExerciseTemplate =
    template("lateral-raises", "Lateral Raises", Shoulders, &[set(0.0, 0), set(0.0, 0)]);
const TRICEP_EXTENSIONS: ExerciseTemplate =
    template("tricep-extensions", "Tricep extensions", Arms, &[set(0.0, 5), set(0.0, 5)]);

/// Built-in catalog. Reps 0 = to failure; cardio weight = miles.
pub const DEFAULT_EXERCISES: &[ExerciseTemplate] = &[
    LEG_PRESS,
    PULL_UPS,
    INCLINE_BENCH,
    CUBAN_PRESS,
    PREACHER_CURL,
    RUN_5K,
    DEADLIFT,
    OVERHEAD_PRESS,
    DEFICIT_PUSHUPS,
    LEG_EXTENSION,
    CALF_RAISES,
    LATERAL_RAISES,
    TRICEP_EXTENSIONS,
];

/// Planned exercises for one day key
#[derive(Debug, Clone, Copy)]
pub struct DayTemplate {
    pub day: &'static str,
    pub exercises: &'static [ExerciseTemplate],
}

const RUN_DAY: &[ExerciseTemplate] = &[RUN_5K];

/// Default weekly plan, used when a day has no saved workout yet.
/// Entries come from the catalog; only the set lists differ.
pub const DEFAULT_PLAN: &[DayTemplate] = &[
    DayTemplate {
        day: "monday",
        exercises: &[
            LEG_PRESS.with_sets(&[set(0.0, 5), set(0.0, 5), set(0.0, 5)]),
            PULL_UPS.with_sets(&[set(0.0, 0), set(0.0, 0)]),
            INCLINE_BENCH.with_sets(&[set(0.0, 5), set(0.0, 5)]),
            CUBAN_PRESS,
            PREACHER_CURL,
        ],
    },
    DayTemplate { day: "tuesday", exercises: RUN_DAY },
    DayTemplate {
        day: "wednesday",
        exercises: &[DEADLIFT, OVERHEAD_PRESS, DEFICIT_PUSHUPS, LEG_EXTENSION, CALF_RAISES],
    },
    DayTemplate { day: "thursday", exercises: RUN_DAY },
    DayTemplate {
        day: "friday",
        exercises: &[
            PULL_UPS.with_sets(&[set(0.0, 0), set(0.0, 0)]),
            INCLINE_BENCH.with_sets(&[set(0.0, 5), set(0.0, 5)]),
            LATERAL_RAISES,
            TRICEP_EXTENSIONS,
        ],
    },
    DayTemplate { day: "saturday", exercises: &[] },
    DayTemplate { day: "sunday", exercises: &[] },
];

pub const DEFAULT_DAY_ORDER: [&str; 7] =
    ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];

pub const DEFAULT_REST_DAYS: [&str; 2] = ["saturday", "sunday"];

pub fn get_all_exercises() -> &'static [ExerciseTemplate] {
    DEFAULT_EXERCISES
}

pub fn find_exercise(id: &str) -> Option<&'static ExerciseTemplate> {
    DEFAULT_EXERCISES.iter().find(|e| e.id == id)
}

pub fn is_default_day(day: &str) -> bool {
    DEFAULT_DAY_ORDER.contains(&day)
}

/// Template exercises for a day; empty for rest days and user-added days
pub fn default_day_exercises(day: &str) -> Vec<Exercise> {
    DEFAULT_PLAN
        .iter()
        .find(|d| d.day == day)
        .map(|d| d.exercises.iter().map(ExerciseTemplate::to_exercise).collect())
        .unwrap_or_default()
}
