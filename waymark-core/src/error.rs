//! Error types for Waymark.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`RoutingError`] - Top-level error type for all Waymark operations
//! - [`PatternError`] - Invalid input rejected by the pattern builder
//! - [`SourceError`] - Failures raised by an endpoint source
//! - [`MatchError`] - Errors raised while narrowing candidates

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Waymark operations.
#[derive(Error, Debug)]
pub enum RoutingError {
    /// A route pattern could not be built.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// An endpoint source failed while being read.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Matching could not settle on a single endpoint.
    #[error("match error: {0}")]
    Match(#[from] MatchError),
}

/// Errors reported by [`RoutePatternBuilder`](crate::RoutePatternBuilder).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A literal part was empty.
    #[error("literal parts must not be empty")]
    EmptyLiteral,

    /// A literal part contained a path separator.
    #[error("literal {0:?} must not contain `/`")]
    InvalidLiteral(String),

    /// A parameter name was empty or contained a reserved character.
    #[error("invalid parameter name: {0:?}")]
    InvalidParameterName(String),

    /// The same parameter name was declared twice.
    #[error("parameter `{0}` is declared more than once")]
    DuplicateParameter(String),

    /// A segment was declared without any parts.
    #[error("segment {0} has no parts")]
    EmptySegment(usize),

    /// A catch-all or optional parameter appeared before the last segment.
    #[error("parameter `{0}` must be in the last segment")]
    NotInLastSegment(String),

    /// A catch-all or optional parameter was combined with other parts.
    #[error("parameter `{0}` must be the only part of its segment")]
    NotAlone(String),

    /// Two parameters were placed next to each other without a literal.
    #[error("parameters `{0}` and `{1}` need a literal between them")]
    AdjacentParameters(String, String),

    /// An optional parameter was also given a default value.
    #[error("optional parameter `{0}` cannot have a default value")]
    OptionalWithDefault(String),

    /// A parameter default disagreed with the pattern-level default.
    #[error("conflicting default values for `{0}`")]
    ConflictingDefault(String),
}

/// Errors raised by an [`EndpointDataSource`](crate::EndpointDataSource).
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source could not produce its endpoints.
    #[error("endpoint source unavailable: {0}")]
    Unavailable(String),

    /// A custom source error.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while matching a request path.
#[derive(Error, Debug)]
pub enum MatchError {
    /// More than one valid candidate shares the best score.
    #[error("request matched multiple endpoints: {}", .endpoints.join(", "))]
    Ambiguous {
        /// Display names of the tied endpoints.
        endpoints: Vec<String>,
    },

    /// A constraint reference names no registered constraint.
    #[error("no constraint registered under `{0}`")]
    UnknownConstraint(String),

    /// A constraint was referenced with arguments it cannot accept.
    #[error("invalid arguments for constraint `{name}`: {reason}")]
    InvalidConstraintArguments {
        /// Constraint name.
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// A candidate policy failed.
    #[error("candidate policy failed")]
    Policy(#[source] BoxError),
}

impl From<BoxError> for SourceError {
    fn from(err: BoxError) -> Self {
        SourceError::Custom(err)
    }
}
