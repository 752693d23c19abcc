//! # waymark-core
//!
//! Core types for the Waymark routing table.
//!
//! This crate has minimal dependencies and is meant for code that describes
//! endpoints or provides them, without needing the aggregation, matching and
//! link generation found in `waymark-std`.
//!
//! # Building Blocks
//!
//! ## Patterns ([`RoutePattern`])
//!
//! An immutable description of a route template: path segments made of
//! literal and parameter parts, default values and constraint references.
//! Patterns are assembled with [`RoutePatternBuilder`], which validates the
//! description; [`RoutePattern::new`] itself trusts its input.
//!
//! ## Precedence ([`Precedence`])
//!
//! Every pattern carries an inbound and an outbound precedence, computed once
//! by a [`PrecedenceStrategy`]. Inbound precedence orders matching (lower is
//! more specific); outbound precedence orders link generation (higher is
//! preferred).
//!
//! ## Endpoints and Sources ([`Endpoint`], [`EndpointDataSource`])
//!
//! An endpoint binds a pattern to an order, a display name and metadata. A
//! source publishes a list of endpoints together with a [`ChangeToken`] that
//! fires once the list is stale.
//!
//! ## Candidates ([`CandidateSet`])
//!
//! Per-attempt bookkeeping used while a path is narrowed down to a single
//! endpoint.
//!
//! # Error Types
//!
//! - [`RoutingError`] - Top-level error type
//! - [`PatternError`] - Pattern validation errors
//! - [`SourceError`] - Endpoint source failures
//! - [`MatchError`] - Matching errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod builder;
mod candidate;
pub mod change;
mod endpoint;
mod error;
mod pattern;
mod precedence;
mod source;
mod values;

// Re-exports
pub use builder::{RoutePatternBuilder, SegmentBuilder};
pub use candidate::{CandidateSet, CandidateState};
pub use change::{ChangeRegistration, ChangeSubscription, ChangeToken, ChangeTrigger, on_change};
pub use endpoint::{Endpoint, EndpointBuilder, EndpointMetadata, RouteName};
pub use error::{BoxError, MatchError, PatternError, RoutingError, SourceError};
pub use pattern::{
    ConstraintReference, ParameterKind, PathPart, PathSegment, RouteConstraints, RouteParameter,
    RoutePattern,
};
pub use precedence::{DefaultPrecedence, Precedence, PrecedenceStrategy};
pub use source::{EndpointDataSource, EndpointList};
pub use values::{CaseInsensitiveMap, RouteValues};
