//! CLI support for exhibit-expression
//!
//! Provides programmatic access to the `exhibit` commands for embedding in
//! other tools.

mod check;
mod docs;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use docs::{get_registry_overview, get_syntax_overview};

use std::io;

use thiserror::Error;

use crate::{DatabaseError, EvalError, ParseError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Data error: {0}")]
    Database(#[from] DatabaseError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
