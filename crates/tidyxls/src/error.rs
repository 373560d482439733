//! Error types for tidyxls operations.
//!
//! This module provides the main error type [`TidyxlsError`] which wraps
//! the error conditions that can occur while processing formulas.

use std::io;

use thiserror::Error;

use tidyxls_parser::Diagnostic;

use crate::graph::CycleError;

/// The main error type for tidyxls operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the parser [`Diagnostic`] together with the
/// formula text and, when known, the formula name, so that the error can be
/// rendered against its source.
#[derive(Debug, Error)]
pub enum TidyxlsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse {
        err: Diagnostic,
        name: Option<String>,
        src: String,
    },

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TidyxlsError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: Diagnostic, name: Option<&str>, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            name: name.map(str::to_string),
            src: src.into(),
        }
    }
}
