//! Stateless foundation layer: data models, deterministic schedules, and I/O
//! utilities shared by the orchestration engine and the workflows.

pub mod io;
pub mod models;
pub mod schedule;
pub mod units;
