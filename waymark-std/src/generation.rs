//! # Link Generation
//!
//! [`LinkGenerator`] turns route values back into a path. Endpoints are tried
//! in declared order, then by outbound precedence (higher first), and the
//! first endpoint that accepts the values produces the path.
//!
//! An endpoint accepts a set of values when:
//! - every parameter without a default or optional marker has a value;
//! - every default that is not a parameter agrees with the supplied value of
//!   the same name, if one is supplied;
//! - no value bound to a non-catch-all parameter contains `/`.
//!
//! Trailing segments whose value equals their default (or that are optional
//! and unbound) are left off the generated path.

use crate::cache::DataSourceDependentCache;
use std::{fmt, sync::Arc};
use waymark_core::{
    Endpoint, EndpointDataSource, PathPart, RouteName, RoutePattern, RouteValues, RoutingError,
};

/// Generates paths from route values.
///
/// # Example
///
/// ```rust,ignore
/// let links = LinkGenerator::new(Arc::new(composite));
///
/// let values: RouteValues = [("id", "42".to_string())].into_iter().collect();
/// assert_eq!(links.path_by_name("product", &values)?, Some("/products/42".into()));
/// ```
#[derive(Clone)]
pub struct LinkGenerator {
    ordered: DataSourceDependentCache<Vec<Endpoint>>,
}

impl LinkGenerator {
    /// Create a generator over `source`.
    pub fn new(source: Arc<dyn EndpointDataSource>) -> Self {
        Self {
            ordered: DataSourceDependentCache::new(source, |endpoints| {
                let mut ordered = endpoints.to_vec();
                ordered.sort_by(|a, b| {
                    a.order().cmp(&b.order()).then_with(|| {
                        b.pattern()
                            .outbound_precedence()
                            .cmp(a.pattern().outbound_precedence())
                    })
                });
                Ok(ordered)
            }),
        }
    }

    /// Path for the first endpoint that accepts `values`.
    pub fn path_by_values(&self, values: &RouteValues) -> Result<Option<String>, RoutingError> {
        let ordered = self.ordered.value()?;
        Ok(ordered
            .iter()
            .find_map(|endpoint| bind(endpoint.pattern(), values)))
    }

    /// Path for the first endpoint named `name` that accepts `values`.
    pub fn path_by_name(
        &self,
        name: &str,
        values: &RouteValues,
    ) -> Result<Option<String>, RoutingError> {
        let ordered = self.ordered.value()?;
        let path = ordered
            .iter()
            .filter(|endpoint| {
                endpoint
                    .metadata()
                    .get::<RouteName>()
                    .is_some_and(|route_name| route_name.as_str() == name)
            })
            .find_map(|endpoint| bind(endpoint.pattern(), values));

        #[cfg(feature = "tracing")]
        if path.is_none() {
            tracing::debug!(name, "No endpoint accepted the values for route name");
        }

        Ok(path)
    }
}

impl fmt::Debug for LinkGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkGenerator")
            .field("ordered", &self.ordered)
            .finish()
    }
}

// A segment's rendered text, and whether it may be trimmed from the end.
struct Rendered {
    text: String,
    trimmable: bool,
}

/// Bind `values` to `pattern`, returning the path when every requirement is
/// met.
pub fn bind(pattern: &RoutePattern, values: &RouteValues) -> Option<String> {
    for (name, default) in pattern.defaults().iter() {
        if pattern.get_parameter(name).is_some() {
            continue;
        }
        if values
            .get(name)
            .is_some_and(|supplied| !supplied.eq_ignore_ascii_case(default))
        {
            return None;
        }
    }

    let mut rendered = Vec::with_capacity(pattern.path_segments().len());
    for segment in pattern.path_segments() {
        let mut text = String::new();
        let mut trimmable = !segment.is_complex();

        for part in segment.parts() {
            match part {
                PathPart::Literal(literal) => {
                    text.push_str(literal);
                    trimmable = false;
                }
                PathPart::Parameter(parameter) => {
                    let default = parameter
                        .default_value()
                        .or_else(|| pattern.defaults().get(parameter.name()).map(String::as_str));
                    let value = values.get(parameter.name()).map(String::as_str);

                    match value.or(default) {
                        Some(bound) => {
                            if parameter.is_catch_all() {
                                if parameter.encode_slashes() {
                                    text.push_str(&bound.replace('/', "%2F"));
                                } else {
                                    text.push_str(bound);
                                }
                            } else if bound.contains('/') {
                                return None;
                            } else {
                                text.push_str(bound);
                            }
                            let is_default =
                                default.is_some_and(|d| d.eq_ignore_ascii_case(bound));
                            trimmable &= is_default || bound.is_empty();
                        }
                        None if parameter.is_optional() || parameter.is_catch_all() => {}
                        None => return None,
                    }
                }
            }
        }

        rendered.push(Rendered { text, trimmable });
    }

    while rendered.last().is_some_and(|segment| segment.trimmable) {
        rendered.pop();
    }

    let mut path = String::new();
    for segment in &rendered {
        path.push('/');
        path.push_str(&segment.text);
    }
    if path.is_empty() {
        path.push('/');
    }
    Some(path)
}
