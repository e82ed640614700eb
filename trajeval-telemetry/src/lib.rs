//! # trajeval Telemetry
//!
//! Structured logging for trajectory evaluators.
//!
//! ## Features
//! - Structured logging with `tracing`
//! - Console or JSON output selected at initialisation
//! - Span helpers shared by the matcher, extractor and judge crates
//!
//! ## Usage
//!
//! ```rust
//! use trajeval_telemetry::{init_telemetry, info, evaluator_run_span};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry("my-eval-suite")?;
//!
//!     let span = evaluator_run_span("trajectory_strict_match", "trajectory_strict_match");
//!     let _enter = span.enter();
//!     info!("scoring started");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Span, debug, error, info, instrument, trace, warn};

pub use spans::*;

pub use init::{init_json_telemetry, init_telemetry};
