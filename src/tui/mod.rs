//! TUI module - live workout session with ratatui

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
};
use std::io::{Stdout, Write, stdout};
use tracing::warn;

use crate::db::Database;
use crate::exercises::Exercise;
use crate::session::countdown::Ticker;
use crate::session::rest_timer::{REST_PRESETS, TickOutcome, TimerState, format_clock, rest_rationale};
use crate::session::{SessionState, SetValue, WorkoutSession};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const WEIGHT_STEP: f64 = 2.5;
const DISTANCE_STEP: f64 = 0.1;

/// App state for TUI
pub struct App {
    db: Database,
    session: WorkoutSession,
    selected: usize,
    ticker: Option<Ticker>,
    status: String,
    should_quit: bool,
}

impl App {
    /// Start a session for `day`. Must be called inside a tokio runtime.
    pub fn new(db: Database, day: &str) -> Result<Self> {
        let mut session = WorkoutSession::new(day);
        session.start(&db)?;
        Ok(Self {
            db,
            session,
            selected: 0,
            ticker: None,
            status: String::new(),
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal);

        self.ticker = None;
        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            self.pump_ticks()?;
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
            self.sync_ticker();
        }
        Ok(())
    }

    /// Feed pending countdown ticks into the rest timer
    fn pump_ticks(&mut self) -> Result<()> {
        let Some(ticker) = self.ticker.as_mut() else {
            return Ok(());
        };
        for _ in 0..ticker.drain() {
            if let TickOutcome::Finished { notify } = self.session.tick_rest() {
                self.status = "Rest over".to_string();
                if notify {
                    let mut out = stdout();
                    out.write_all(b"\x07")?;
                    out.flush()?;
                }
                break;
            }
        }
        Ok(())
    }

    /// A ticker runs exactly while the rest timer is active
    fn sync_ticker(&mut self) {
        match (self.session.is_resting(), self.ticker.is_some()) {
            (true, false) => self.ticker = Some(Ticker::every_second()),
            (false, true) => {
                if let Some(mut ticker) = self.ticker.take() {
                    ticker.stop();
                }
            }
            _ => {}
        }
    }

    fn selected_exercise(&self) -> Option<&Exercise> {
        self.session.exercises().get(self.selected)
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rest_height = if self.session.is_resting() { 7 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(rest_height),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let elapsed = self.session.elapsed_secs();
        let header = Paragraph::new(format!(
            "repforge - {} | {:02}:{:02} | {}",
            self.session.day(),
            elapsed / 60,
            elapsed % 60,
            state_label(self.session.state())
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        match self.session.state() {
            SessionState::InProgress => self.render_exercises(frame, chunks[1]),
            SessionState::RestDay => {
                let rest = Paragraph::new("Rest day. Recover and come back tomorrow.")
                    .block(Block::default().borders(Borders::ALL).title("Today"));
                frame.render_widget(rest, chunks[1]);
            }
            SessionState::Completed | SessionState::NotStarted => {
                let done = Paragraph::new(self.status.clone())
                    .block(Block::default().borders(Borders::ALL).title("Workout"));
                frame.render_widget(done, chunks[1]);
            }
        }

        if self.session.is_resting() {
            self.render_rest(frame, chunks[2]);
        }

        // Footer
        let keys = if self.session.is_resting() {
            "space: pause | r: reset | 1-6: preset | m: mute | x: close"
        } else {
            "j/k: select | enter: confirm | +/-: weight | ]/[: reps | a: add set | t: rest | f: finish | q: quit"
        };
        let footer_text = if self.status.is_empty() || self.session.state() != SessionState::InProgress {
            keys.to_string()
        } else {
            format!("{}  ·  {}", self.status, keys)
        };
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn render_exercises(&self, frame: &mut Frame, area: Rect) {
        let body_weight = self.session.body_weight();
        let rows: Vec<Row> = self
            .session
            .exercises()
            .iter()
            .enumerate()
            .map(|(i, exercise)| {
                let row = Row::new(vec![
                    Cell::from(exercise.name.clone()),
                    Cell::from(exercise.muscle_group.name()),
                    Cell::from(format!("{}/{}", exercise.completed_sets(), exercise.sets.len())),
                    Cell::from(sets_line(exercise, body_weight)),
                ]);
                if i == self.selected {
                    row.style(Style::default().fg(Color::Yellow).bold())
                } else if exercise.is_finished() {
                    row.style(Style::default().fg(Color::Green))
                } else {
                    row
                }
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(20),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Min(20),
            ],
        )
        .header(Row::new(vec!["Exercise", "Group", "Done", "Sets"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Session"));

        frame.render_widget(table, area);
    }

    fn render_rest(&self, frame: &mut Frame, area: Rect) {
        let timer = self.session.rest_timer();
        let Some(context) = timer.context() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(2)])
            .split(area);

        let paused = matches!(timer.state(), TimerState::Paused { .. });
        let label = format!(
            "{}{}{}",
            format_clock(timer.remaining()),
            if paused { " (paused)" } else { "" },
            if timer.is_muted() { " (muted)" } else { "" }
        );
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Rest - {} ({})",
                context.exercise_name, context.muscle_group
            )))
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(timer.ratio_left().clamp(0.0, 1.0))
            .label(label);
        frame.render_widget(gauge, chunks[0]);

        let presets: Vec<String> = REST_PRESETS
            .iter()
            .enumerate()
            .map(|(i, secs)| format!("{}:{}", i + 1, format_clock(*secs)))
            .collect();
        let [by_group, by_lift] = rest_rationale(context.muscle_group, &context.exercise_name);
        let help = Paragraph::new(format!("{}\n{} {}", presets.join("  "), by_group, by_lift))
            .wrap(Wrap { trim: true });
        frame.render_widget(help, chunks[1]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if self.session.is_resting() {
                self.handle_rest_key(key.code);
            } else {
                self.handle_session_key(key.code);
            }
        }
        Ok(())
    }

    fn handle_rest_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(' ') => {
                self.session.toggle_rest_pause();
            }
            KeyCode::Char('r') => {
                self.session.reset_rest();
            }
            KeyCode::Char('m') => {
                self.session.toggle_mute();
            }
            KeyCode::Char('x') | KeyCode::Esc => self.session.close_rest_timer(),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                let seconds = REST_PRESETS[index];
                match self.session.apply_custom_rest(seconds, &self.db) {
                    Ok(_) => self.status = format!("Rest set to {}", format_clock(seconds)),
                    Err(e) => {
                        warn!(error = %e, "failed to save rest time");
                        self.status = format!("Could not save rest time: {}", e);
                    }
                }
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_session_key(&mut self, code: KeyCode) {
        let count = self.session.exercises().len();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down if count > 0 => {
                self.selected = (self.selected + 1).min(count - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char('c') => self.confirm_selected(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_weight(1.0),
            KeyCode::Char('-') => self.nudge_weight(-1.0),
            KeyCode::Char(']') => self.nudge_reps(1),
            KeyCode::Char('[') => self.nudge_reps(-1),
            KeyCode::Char('a') => {
                if !self.session.add_set(self.selected) {
                    self.status = "Cannot add sets here".to_string();
                }
            }
            KeyCode::Char('t') => {
                self.session.open_rest_timer(self.selected);
            }
            KeyCode::Char('f') => self.finish(),
            _ => {}
        }
    }

    fn confirm_selected(&mut self) {
        let Some(active) = self.selected_exercise().map(|e| e.current_active_set_index) else {
            return;
        };
        if self.session.confirm_set(self.selected, active) {
            self.status = format!("Set {} done", active + 1);
        }
    }

    fn nudge_weight(&mut self, direction: f64) {
        let Some(exercise) = self.selected_exercise() else {
            return;
        };
        let step = if exercise.is_cardio() { DISTANCE_STEP } else { WEIGHT_STEP };
        let active = exercise.current_active_set_index;
        let Some(set) = exercise.sets.get(active) else {
            return;
        };
        let weight = ((set.weight + direction * step).max(0.0) * 100.0).round() / 100.0;
        self.session.edit_set_value(self.selected, active, SetValue::Weight(weight));
    }

    fn nudge_reps(&mut self, delta: i64) {
        let Some(exercise) = self.selected_exercise() else {
            return;
        };
        let active = exercise.current_active_set_index;
        let Some(set) = exercise.sets.get(active) else {
            return;
        };
        let reps = nudged_reps(set.reps, delta);
        self.session.edit_set_value(self.selected, active, SetValue::Reps(reps));
    }

    fn finish(&mut self) {
        match self.session.complete_session(&self.db) {
            Ok(workout) => {
                self.status = format!(
                    "Workout for {} saved. Duration: {} minutes. Press q to quit.",
                    self.session.day(),
                    workout.duration_in_minutes.unwrap_or_default()
                );
            }
            Err(e) => {
                warn!(error = %e, "failed to complete session");
                self.status = format!("Could not save workout: {}", e);
            }
        }
    }
}

/// Reps after a +/- step, clamped to the `u32` range
fn nudged_reps(reps: u32, delta: i64) -> u32 {
    (i64::from(reps) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::NotStarted => "not started",
        SessionState::InProgress => "in progress",
        SessionState::Completed => "completed",
        SessionState::RestDay => "rest day",
    }
}

/// `100x5✓ [100x5] 100x5`: brackets mark the active set
fn sets_line(exercise: &Exercise, body_weight: f64) -> String {
    exercise
        .sets
        .iter()
        .enumerate()
        .map(|(i, set)| {
            let numbers = if exercise.is_cardio() {
                format!("{}mi/{}min", set.weight, set.reps)
            } else {
                let reps = if set.reps == 0 { "F".to_string() } else { set.reps.to_string() };
                format!("{}x{}", exercise.effective_weight(set, body_weight), reps)
            };
            if set.completed {
                format!("{}✓", numbers)
            } else if i == exercise.current_active_set_index {
                format!("[{}]", numbers)
            } else {
                numbers
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
