//! Route endpoints.
//!
//! An [`Endpoint`] pairs a [`RoutePattern`] with its declared order, an
//! optional display name and a typed metadata collection. Endpoints are
//! cheap to clone: every clone shares one allocation, so snapshots of
//! thousands of endpoints can be copied and merged freely.

use crate::pattern::RoutePattern;
use std::{any::Any, fmt, sync::Arc};

/// Names an endpoint for link generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteName(pub String);

impl RouteName {
    /// Create a route name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A typed, ordered collection of endpoint metadata.
///
/// Entries are looked up by type; when several entries share a type the
/// most recently added one wins in [`get`](Self::get).
#[derive(Clone, Default)]
pub struct EndpointMetadata {
    items: Vec<Arc<dyn Any + Send + Sync>>,
}

impl EndpointMetadata {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn push<T: Any + Send + Sync>(&mut self, item: T) {
        self.items.push(Arc::new(item));
    }

    /// The last entry of type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.items
            .iter()
            .rev()
            .find_map(|item| (**item).downcast_ref::<T>())
    }

    /// Every entry of type `T`, in insertion order.
    pub fn get_all<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.items
            .iter()
            .filter_map(|item| (**item).downcast_ref::<T>())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for EndpointMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointMetadata")
            .field("len", &self.items.len())
            .finish()
    }
}

struct EndpointInner {
    pattern: Arc<RoutePattern>,
    order: i32,
    display_name: Option<String>,
    metadata: EndpointMetadata,
}

/// A routable endpoint.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

impl Endpoint {
    /// An endpoint with order `0`, no name and no metadata.
    pub fn new(pattern: RoutePattern) -> Self {
        Self::builder(pattern).build()
    }

    /// Start building an endpoint.
    pub fn builder(pattern: impl Into<Arc<RoutePattern>>) -> EndpointBuilder {
        EndpointBuilder {
            pattern: pattern.into(),
            order: 0,
            display_name: None,
            metadata: EndpointMetadata::new(),
        }
    }

    /// The route pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.inner.pattern
    }

    /// The shared route pattern.
    pub fn shared_pattern(&self) -> &Arc<RoutePattern> {
        &self.inner.pattern
    }

    /// Declared order; lower values are preferred among equal precedence.
    pub fn order(&self) -> i32 {
        self.inner.order
    }

    /// Display name, if one was given.
    pub fn display_name(&self) -> Option<&str> {
        self.inner.display_name.as_deref()
    }

    /// Endpoint metadata.
    pub fn metadata(&self) -> &EndpointMetadata {
        &self.inner.metadata
    }

    /// Returns true if both handles refer to the same endpoint.
    pub fn ptr_eq(a: &Endpoint, b: &Endpoint) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

// Display name when present, otherwise the pattern text.
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_name() {
            Some(name) => f.write_str(name),
            None => fmt::Display::fmt(self.pattern(), f),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("display_name", &self.inner.display_name)
            .field("pattern", &format_args!("{}", self.inner.pattern))
            .field("order", &self.inner.order)
            .field("metadata", &self.inner.metadata)
            .finish()
    }
}

/// Builder for [`Endpoint`].
pub struct EndpointBuilder {
    pattern: Arc<RoutePattern>,
    order: i32,
    display_name: Option<String>,
    metadata: EndpointMetadata,
}

impl EndpointBuilder {
    /// Set the declared order.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Set the display name.
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Attach a metadata entry.
    pub fn metadata<T: Any + Send + Sync>(mut self, item: T) -> Self {
        self.metadata.push(item);
        self
    }

    /// Name the endpoint for link generation.
    pub fn route_name(self, name: impl Into<String>) -> Self {
        self.metadata(RouteName::new(name))
    }

    /// Build the endpoint.
    pub fn build(self) -> Endpoint {
        Endpoint {
            inner: Arc::new(EndpointInner {
                pattern: self.pattern,
                order: self.order,
                display_name: self.display_name,
                metadata: self.metadata,
            }),
        }
    }
}
