//! Rotation-tolerant async log tailing for vigil.
//!
//! This crate provides the pipeline's line source: a `tail -f`-style reader
//! that yields lines appended to a log file after startup, transparently
//! surviving truncation, rotation, and the file going missing. See
//! [`LogTailer`] for the behavioral contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod tailer;

pub use error::{Result, TailError};
pub use tailer::{LogTailer, TailerConfig};
