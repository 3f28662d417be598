//! repforge - weekly workout planner and session tracker
//!
//! Progressive overload suggestions from past sessions, a set-by-set
//! session state machine with a rest gate, and SQLite storage.

pub mod advisor;
pub mod db;
pub mod exercises;
pub mod session;
pub mod tui;

pub use db::Database;
