//! Selection and tracking for batches of waveform extrapolation runs.
//!
//! Candidates are discovered under an input root, sorted into categories by
//! the state of their output, merged into a rotated run queue, and executed
//! one at a time. An optional SQLite ledger shared between processes makes
//! sure each item is attempted by at most one of them.

pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod execute;
pub mod item;
pub mod ledger;
pub mod queue;
pub mod template;
pub mod ui;
