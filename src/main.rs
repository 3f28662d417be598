//! repforge - weekly workout planner and session tracker

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use repforge::advisor::{ProgressPoint, day_report, progress_points, volume_by_day};
use repforge::db::{Database, MoveDirection, ProfileStore, WorkoutRepository};
use repforge::exercises::{Exercise, MuscleGroup, NewExercise};
use repforge::session::{add_to_plan, planned_exercises, remove_from_plan};
use repforge::tui::App;

#[derive(Parser)]
#[command(name = "repforge")]
#[command(author, version, about = "Weekly workout planner with progressive overload suggestions")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "REPFORGE_DB", default_value = "repforge.db")]
    db: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live workout session
    Session {
        /// Day key (e.g. "monday")
        day: String,
    },

    /// Show the advisor's suggestion for every exercise of a day
    Suggest { day: String },

    /// Manage the weekly day list
    Days {
        #[command(subcommand)]
        action: DaysAction,
    },

    /// Show or edit a day's plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Browse or extend the exercise catalog
    Exercise {
        #[command(subcommand)]
        action: ExerciseAction,
    },

    /// Show or edit the user profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// List saved workouts
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Progress of one exercise over time
    Progress {
        /// Exercise id (e.g. "deadlift")
        exercise: String,
    },

    /// Volume of each day's latest workout
    Volume,
}

#[derive(Subcommand)]
enum DaysAction {
    List,
    Add { name: String },
    Remove { name: String },
    Rename { old: String, new: String },
    Move { name: String, direction: Direction },
    /// Flag a day as rest day
    Rest {
        name: String,
        /// Clear the flag instead
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    Show { day: String },
    Add { day: String, exercise: String },
    /// Remove by position as listed in `plan show`
    Remove { day: String, index: usize },
}

#[derive(Subcommand)]
enum ExerciseAction {
    List {
        #[arg(short, long)]
        muscle: Option<MuscleGroup>,
    },
    Add {
        name: String,
        #[arg(short, long)]
        muscle: MuscleGroup,
        /// Load, or distance in miles for cardio
        #[arg(short, long, default_value = "0")]
        weight: f64,
        /// Reps (0 = to failure), or minutes for cardio
        #[arg(short, long, default_value = "8")]
        reps: u32,
        #[arg(short, long, default_value = "3")]
        sets: usize,
        #[arg(long)]
        bodyweight: bool,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Set {
        #[arg(long)]
        name: Option<String>,
        /// Body weight
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        /// Progressive overload suggestions
        #[arg(long)]
        overload: Option<Toggle>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr, stdout belongs to the TUI
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = Database::open(&cli.db)?;

    match cli.command {
        Some(Commands::Session { day }) => run_session(db, &day)?,

        Some(Commands::Suggest { day }) => {
            let day = db.resolve_day(&day)?;
            let plan = planned_exercises(&db, &day)?;
            let log = db.workout_log()?;
            let profile = db.profile()?;

            println!("Suggestions for {}", day);
            println!("{:-<60}", "");
            for (exercise, suggestion) in day_report(&plan, &log, &profile) {
                println!(
                    "{:20} | +{} / +{} reps | {}",
                    exercise.name, suggestion.weight_increment, suggestion.reps_increment, suggestion.message
                );
            }
        }

        Some(Commands::Days { action }) => days_command(&db, action)?,
        Some(Commands::Plan { action }) => plan_command(&db, action)?,
        Some(Commands::Exercise { action }) => exercise_command(&db, action)?,
        Some(Commands::Profile { action }) => profile_command(&db, action)?,

        Some(Commands::History { limit }) => {
            println!("Recent workouts:");
            println!("{:-<60}", "");
            for (day, workout) in db.recent_workouts(limit)? {
                let done: usize = workout.exercises.iter().map(Exercise::completed_sets).sum();
                let total: usize = workout.exercises.iter().map(|e| e.sets.len()).sum();
                let duration = workout
                    .duration_in_minutes
                    .map_or_else(|| "plan".to_string(), |m| format!("{} min", m));
                println!(
                    "{} | {:10} | {:8} | {} exercises, {}/{} sets",
                    workout.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    day,
                    duration,
                    workout.exercises.len(),
                    done,
                    total
                );
            }
        }

        Some(Commands::Progress { exercise }) => {
            let points = progress_points(&exercise, &db.workout_log()?, &db.profile()?);
            if points.is_empty() {
                println!("No completed sets recorded for {}", exercise);
            }
            for point in points {
                match point {
                    ProgressPoint::Strength { date, weight, reps, one_rm } => {
                        println!("{} | {} x {} | est. 1RM {}", date.format("%Y-%m-%d"), weight, reps, one_rm)
                    }
                    ProgressPoint::Cardio { date, distance, minutes } => {
                        println!("{} | {} mi in {} min", date.format("%Y-%m-%d"), distance, minutes)
                    }
                }
            }
        }

        Some(Commands::Volume) => {
            let volume = volume_by_day(&db.workout_log()?, &db.profile()?);
            for day in db.days()? {
                let total = volume.get(&day.name).copied().unwrap_or_default();
                println!("{:10} | {:.0}", day.name, total);
            }
        }

        None => {
            // Default: today's session
            let today = Local::now().format("%A").to_string().to_lowercase();
            run_session(db, &today)?;
        }
    }

    Ok(())
}

fn run_session(db: Database, day: &str) -> Result<()> {
    let day = db.resolve_day(day)?;
    let mut app = App::new(db, &day)?;
    app.run()
}

fn days_command(db: &Database, action: DaysAction) -> Result<()> {
    match action {
        DaysAction::List => {
            for day in db.days()? {
                println!("{}{}", day.name, if day.is_rest { " (rest)" } else { "" });
            }
        }
        DaysAction::Add { name } => {
            let name = db.add_day(&name)?;
            println!("Day added: {}", name);
        }
        DaysAction::Remove { name } => {
            db.remove_day(&name)?;
            println!("Day removed: {}", name);
        }
        DaysAction::Rename { old, new } => {
            let new = db.rename_day(&old, &new)?;
            println!("Day renamed: {} -> {}", old, new);
        }
        DaysAction::Move { name, direction } => {
            if !db.move_day(&name, direction.into())? {
                println!("{} is already at the edge", name);
            }
        }
        DaysAction::Rest { name, off } => {
            db.set_rest_day(&name, !off)?;
            println!("{} is {}", name, if off { "a workout day" } else { "a rest day" });
        }
    }
    Ok(())
}

fn plan_command(db: &Database, action: PlanAction) -> Result<()> {
    match action {
        PlanAction::Show { day } => {
            let day = db.resolve_day(&day)?;
            if db.is_rest_day(&day)? {
                println!("{} is a rest day", day);
            }
            for (i, exercise) in planned_exercises(db, &day)?.iter().enumerate() {
                let sets: Vec<String> = exercise.sets.iter().map(|s| format!("{}x{}", s.weight, s.reps)).collect();
                println!("{:2} | {:20} | {:9} | {}", i, exercise.name, exercise.muscle_group, sets.join(" "));
            }
        }
        PlanAction::Add { day, exercise } => {
            let day = db.resolve_day(&day)?;
            let found = db
                .find_catalog_exercise(&exercise)?
                .with_context(|| format!("Unknown exercise: {}", exercise))?;
            let name = found.name.clone();
            add_to_plan(db, &day, found, Utc::now())?;
            println!("Added {} to {}", name, day);
        }
        PlanAction::Remove { day, index } => {
            let day = db.resolve_day(&day)?;
            match remove_from_plan(db, &day, index, Utc::now())? {
                Some(_) => println!("Removed exercise {} from {}", index, day),
                None => bail!("No exercise at position {} on {}", index, day),
            }
        }
    }
    Ok(())
}

fn exercise_command(db: &Database, action: ExerciseAction) -> Result<()> {
    match action {
        ExerciseAction::List { muscle } => {
            for exercise in db.catalog()? {
                if muscle.is_some_and(|m| m != exercise.muscle_group) {
                    continue;
                }
                println!(
                    "{:24} | {:20} | {:9}{}",
                    exercise.id,
                    exercise.name,
                    exercise.muscle_group,
                    if exercise.custom { " (custom)" } else { "" }
                );
            }
        }
        ExerciseAction::Add { name, muscle, weight, reps, sets, bodyweight } => {
            if name.trim().is_empty() {
                bail!("Exercise name is required");
            }
            let new = NewExercise { name, muscle_group: muscle, weight, reps, num_sets: sets, is_bodyweight: bodyweight };
            let exercise = Exercise::custom(&new, db.profile()?.weight, Utc::now());
            db.add_custom_exercise(&exercise)?;
            println!("Exercise added: {} ({})", exercise.name, exercise.id);
        }
    }
    Ok(())
}

fn profile_command(db: &Database, action: ProfileAction) -> Result<()> {
    let mut profile = db.profile()?;
    match action {
        ProfileAction::Show => {}
        ProfileAction::Set { name, weight, height, overload } => {
            if let Some(name) = name {
                profile.name = name;
            }
            if let Some(weight) = weight {
                profile.weight = weight;
            }
            if let Some(height) = height {
                profile.height = height;
            }
            if let Some(toggle) = overload {
                profile.progressive_overload.enabled = matches!(toggle, Toggle::On);
            }
            db.save_profile(&profile)?;
        }
    }

    println!("Name:   {}", profile.name);
    println!("Weight: {}", profile.weight);
    println!("Height: {}", profile.height);
    println!(
        "Progressive overload: {}",
        if profile.progressive_overload.enabled { "on" } else { "off" }
    );
    Ok(())
}
