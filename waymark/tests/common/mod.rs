#![allow(dead_code)]

use std::sync::Arc;
use waymark::{Endpoint, EndpointDataSource, RoutePatternBuilder, RouteValues};

// ============================================================================
// Endpoint Helpers
// ============================================================================

/// A literal endpoint `/name` displayed as `name`.
pub fn literal(name: &str) -> Endpoint {
    named(name, RoutePatternBuilder::new().literal(name))
}

/// An endpoint displayed as `name`.
pub fn named(name: &str, pattern: RoutePatternBuilder) -> Endpoint {
    Endpoint::builder(pattern.build().expect("valid pattern"))
        .display_name(name)
        .build()
}

/// Display names, in order.
pub fn names(endpoints: &[Endpoint]) -> Vec<String> {
    endpoints.iter().map(|e| e.to_string()).collect()
}

/// Route values from pairs.
pub fn values(pairs: &[(&str, &str)]) -> RouteValues {
    pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
}

/// Erase a source for composition.
pub fn erased<S: EndpointDataSource + 'static>(source: &Arc<S>) -> Arc<dyn EndpointDataSource> {
    Arc::clone(source) as Arc<dyn EndpointDataSource>
}
