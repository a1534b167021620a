//! Normalize CLI Library
//!
//! Command-line front end for the normalization engine: flag parsing,
//! layered settings, candidate-file discovery and progress output.
//!
//! This library exposes the binary's components for testing purposes.

pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod scan;

pub use cli::{expand_legacy_flags, Cli};
pub use config::Settings;
pub use error::{CliError, Result};
pub use progress::{error_line, ProgressLine};
pub use scan::FileScanner;
