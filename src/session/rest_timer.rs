//! Rest timer between sets
//!
//! Recommended duration lookup plus a small state machine:
//! `Idle -> Running <-> Paused -> Idle`. The timer itself never sleeps;
//! it is advanced by `tick()` from whatever drives the clock.

use std::collections::HashMap;

use tracing::debug;

use crate::exercises::MuscleGroup;

/// Saved rest durations in seconds, keyed by (muscle group, exercise name)
pub type RestOverrides = HashMap<(MuscleGroup, String), u32>;

/// Durations offered as quick picks, seconds
pub const REST_PRESETS: [u32; 6] = [60, 90, 120, 150, 180, 240];

/// Name fragments marking a compound lift (case-sensitive)
const COMPOUND_LIFTS: [&str; 6] = ["Squat", "Deadlift", "Bench Press", "Shoulder Press", "Barbell Row", "Pull-up"];

pub fn is_compound(exercise_name: &str) -> bool {
    COMPOUND_LIFTS.iter().any(|lift| exercise_name.contains(lift))
}

/// Suggested rest in seconds before any saved override
pub fn recommended_rest_secs(group: MuscleGroup, exercise_name: &str) -> u32 {
    match (is_compound(exercise_name), group.is_large()) {
        (true, true) => 180,
        (true, false) => 150,
        (false, true) => 120,
        (false, false) => 90,
    }
}

/// Saved override if present, otherwise the recommendation
pub fn rest_secs(group: MuscleGroup, exercise_name: &str, overrides: &RestOverrides) -> u32 {
    overrides
        .get(&(group, exercise_name.to_string()))
        .copied()
        .unwrap_or_else(|| recommended_rest_secs(group, exercise_name))
}

/// Short explanation shown next to the countdown
pub fn rest_rationale(group: MuscleGroup, exercise_name: &str) -> [&'static str; 2] {
    let by_group = match group {
        MuscleGroup::Legs | MuscleGroup::Back => {
            "Larger muscle groups like legs and back typically need more rest between sets."
        }
        MuscleGroup::Chest | MuscleGroup::Shoulders => {
            "Chest and shoulder exercises benefit from adequate rest to maintain proper form."
        }
        _ => "Smaller muscle groups typically require less rest between sets.",
    };
    let by_lift = if ["Squat", "Deadlift", "Bench Press"].iter().any(|l| exercise_name.contains(l)) {
        "Compound movements like this require more recovery between sets for optimal performance."
    } else {
        "Adjust the timer based on your training intensity and goals."
    };
    [by_group, by_lift]
}

/// `m:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running { remaining: u32, initial: u32 },
    Paused { remaining: u32, initial: u32 },
}

/// What the rest is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestContext {
    pub muscle_group: MuscleGroup,
    pub exercise_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer idle or paused
    Ignored,
    Counting(u32),
    /// Reached zero; `notify` is false when muted
    Finished { notify: bool },
}

#[derive(Debug, Clone, Default)]
pub struct RestTimer {
    state: TimerState,
    context: Option<RestContext>,
    muted: bool,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn context(&self) -> Option<&RestContext> {
        self.context.as_ref()
    }

    /// Running or paused; the session gate is closed while this holds
    pub fn is_active(&self) -> bool {
        !matches!(self.state, TimerState::Idle)
    }

    pub fn remaining(&self) -> u32 {
        match self.state {
            TimerState::Idle => 0,
            TimerState::Running { remaining, .. } | TimerState::Paused { remaining, .. } => remaining,
        }
    }

    /// Fraction of the rest still left, `0.0..=1.0`
    pub fn ratio_left(&self) -> f64 {
        match self.state {
            TimerState::Running { remaining, initial } | TimerState::Paused { remaining, initial } if initial > 0 => {
                f64::from(remaining) / f64::from(initial)
            }
            _ => 0.0,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Start counting down for an exercise. Returns the chosen duration.
    pub fn start(&mut self, group: MuscleGroup, exercise_name: &str, overrides: &RestOverrides) -> u32 {
        let seconds = rest_secs(group, exercise_name, overrides);
        self.context = Some(RestContext { muscle_group: group, exercise_name: exercise_name.to_string() });
        self.state = if seconds == 0 {
            TimerState::Idle
        } else {
            TimerState::Running { remaining: seconds, initial: seconds }
        };
        debug!(%group, exercise_name, seconds, "rest timer started");
        seconds
    }

    /// Advance by one second
    pub fn tick(&mut self) -> TickOutcome {
        let TimerState::Running { remaining, initial } = self.state else {
            return TickOutcome::Ignored;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.close();
            return TickOutcome::Finished { notify: !self.muted };
        }
        self.state = TimerState::Running { remaining, initial };
        TickOutcome::Counting(remaining)
    }

    /// Pause or resume. False when idle.
    pub fn toggle_pause(&mut self) -> bool {
        self.state = match self.state {
            TimerState::Running { remaining, initial } => TimerState::Paused { remaining, initial },
            TimerState::Paused { remaining, initial } => TimerState::Running { remaining, initial },
            TimerState::Idle => return false,
        };
        true
    }

    /// Back to the initial duration, running
    pub fn reset(&mut self) -> bool {
        match self.state {
            TimerState::Running { initial, .. } | TimerState::Paused { initial, .. } => {
                self.state = TimerState::Running { remaining: initial, initial };
                true
            }
            TimerState::Idle => false,
        }
    }

    /// Restart at a user-chosen duration. Returns the override key to persist.
    pub fn apply_custom(&mut self, seconds: u32) -> Option<(MuscleGroup, String)> {
        if !self.is_active() || seconds == 0 {
            return None;
        }
        let context = self.context.as_ref()?;
        self.state = TimerState::Running { remaining: seconds, initial: seconds };
        debug!(seconds, exercise = %context.exercise_name, "custom rest applied");
        Some((context.muscle_group, context.exercise_name.clone()))
    }

    /// Dismiss, whatever is left on the clock
    pub fn close(&mut self) {
        self.state = TimerState::Idle;
        self.context = None;
    }
}
