//! Logging for the sortsplit tool
//!
//! This module provides:
//! - Bracketed event formatting tagged with the running operation
//! - Dual logging (stdout + optional timestamped file)

mod formatter;
mod setup;

pub use formatter::BracketedFormatter;
pub use setup::setup_logging;
