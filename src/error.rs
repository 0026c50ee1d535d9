//! Error handling for archive and image operations
//!
//! This module re-exports the error type used throughout the crate.
//! It uses thiserror for ergonomic error handling and keeps "not this format"
//! distinct from I/O failures.

pub use crate::common::GrdPacError;
pub use crate::common::Result;
