//! # Path Matching
//!
//! Resolving a request path to an endpoint happens in stages:
//!
//! 1. [`match_pattern`] tries each endpoint's pattern against the path and
//!    extracts route values.
//! 2. Every endpoint that matched becomes a candidate, scored by inbound
//!    precedence and declared order.
//! 3. [`RouteConstraint`]s withdraw candidates whose values they reject.
//! 4. [`CandidatePolicy`] stages withdraw candidates on any other grounds.
//! 5. The valid candidate with the lowest score wins.
//!
//! [`Matcher`] runs the whole pipeline over a live endpoint source.

mod constraints;
mod matcher;
mod path;
mod policy;

pub use constraints::{
    AlphaConstraint, BoolConstraint, ConstraintArgumentError, ConstraintFactory,
    ConstraintResolver, IntConstraint, LengthConstraint, RangeConstraint, RequiredConstraint,
    RouteConstraint,
};
pub use matcher::{Matcher, MatcherBuilder, RouteMatch};
pub use path::{match_pattern, split_path};
pub use policy::{CandidatePolicy, RequireMetadata};
