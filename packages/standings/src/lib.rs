//! Course progress standings.
//!
//! Turns a snapshot of per-period correctness records into a ranked table
//! with pass/fail forecasts. Everything here is pure computation over data
//! the caller fetched; no I/O happens in this crate.

pub mod aggregate;
pub mod engine;
pub mod forecast;
pub mod period;
pub mod ranking;
pub mod record;

pub use engine::{ProgressStatus, Standings, StandingsContext, StandingsRow, compute_standings};
pub use record::{CorrectnessRecord, ParticipantId};
