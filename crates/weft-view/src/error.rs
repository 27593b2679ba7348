#![forbid(unsafe_code)]

//! Errors surfaced to callers.
//!
//! Only structural preconditions and configuration loading produce errors.
//! Bad data (unparseable selectors, invalid binding values, lost targets)
//! is recovered locally and logged.

use thiserror::Error;

/// A binder was called without a node it requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("{0}: required node is missing")]
    MissingNode(&'static str),
}

/// Failure to load a [`RenderConfig`](crate::RenderConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid render config: {message}")]
    Parse { message: String },
    #[error("invalid render config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}
