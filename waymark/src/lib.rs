//! # waymark - Live URL Routing Table
//!
//! `waymark` keeps a routing table built from one or more independently
//! changing endpoint sources, merges them into a single cached view, and
//! resolves request paths against it. When several endpoints match, the most
//! specific one wins by a deterministic precedence rule.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use waymark::prelude::*;
//!
//! let product = Endpoint::builder(
//!     RoutePattern::builder()
//!         .literal("products")
//!         .parameter("id")
//!         .constraint("id", ConstraintReference::new("int"))
//!         .build()?,
//! )
//! .route_name("product")
//! .build();
//!
//! let config = Arc::new(DynamicEndpointDataSource::new([product]));
//! let table = Arc::new(CompositeEndpointDataSource::new([config.clone() as Arc<dyn EndpointDataSource>]));
//!
//! let matcher = Matcher::new(table.clone());
//! let found = matcher.match_path("/products/42")?;
//!
//! let links = LinkGenerator::new(table);
//! let path = links.path_by_name("product", &found.unwrap().values().clone())?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use waymark_core::{
    // Error types
    BoxError,
    // Candidates
    CandidateSet,
    CandidateState,
    CaseInsensitiveMap,
    // Change signals
    ChangeRegistration,
    ChangeSubscription,
    ChangeToken,
    ChangeTrigger,
    // Patterns
    ConstraintReference,
    DefaultPrecedence,
    // Endpoints
    Endpoint,
    EndpointBuilder,
    EndpointDataSource,
    EndpointList,
    EndpointMetadata,
    MatchError,
    ParameterKind,
    PathPart,
    PathSegment,
    PatternError,
    Precedence,
    PrecedenceStrategy,
    RouteConstraints,
    RouteName,
    RouteParameter,
    RoutePattern,
    RoutePatternBuilder,
    RouteValues,
    RoutingError,
    SegmentBuilder,
    SourceError,
    change,
    on_change,
};

// Aggregation and caching
pub use waymark_std::{cache::DataSourceDependentCache, composite::CompositeEndpointDataSource};

// Link generation
pub use waymark_std::generation::LinkGenerator;

/// Endpoint source implementations.
pub mod sources {
    #![allow(clippy::wildcard_imports)]
    pub use waymark_std::sources::*;
}

/// Path matching, constraints and candidate policies.
pub mod matching {
    #![allow(clippy::wildcard_imports)]
    pub use waymark_std::matching::*;
}

/// Link generation.
pub mod generation {
    pub use waymark_std::generation::{LinkGenerator, bind};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use waymark_std::testing::*;
}

/// Prelude module - common imports for Waymark.
///
/// # Usage
///
/// ```rust,ignore
/// use waymark::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ChangeToken, CompositeEndpointDataSource, ConstraintReference, Endpoint,
        EndpointDataSource, LinkGenerator, RouteName, RoutePattern, RoutePatternBuilder,
        RouteValues, RoutingError,
        matching::{Matcher, MatcherBuilder, RouteMatch},
        sources::{DefaultEndpointDataSource, DynamicEndpointDataSource},
    };
}

#[cfg(feature = "inventory")]
pub use inventory;
