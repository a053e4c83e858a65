//! Board platform catalog for colorsoc.
//!
//! A platform describes one revision of one board: the FPGA device it carries,
//! the Trellis device parameters derived from it, and the handful of pins the
//! SoC needs (the system clock input and an optional user LED).
//!
//! Platforms are collected in a [`PlatformCatalog`], an explicit lookup service
//! passed to descriptor assembly. Custom boards are loaded from
//! `boards/*.board.toml` files in a project directory.

pub mod board;
pub mod catalog;
pub mod error;
pub mod parse;

pub use board::{ClockPin, PinAssignment, Platform};
pub use catalog::PlatformCatalog;
pub use error::{PlatformError, Result};
