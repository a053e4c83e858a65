//! CLI command implementations.

pub mod boards;
pub mod clean;
pub mod doctor;
pub mod run;
