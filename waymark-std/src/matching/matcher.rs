//! The request-path matcher.

use super::{
    constraints::{ConstraintResolver, RouteConstraint},
    path::match_pattern,
    policy::CandidatePolicy,
};
use crate::cache::DataSourceDependentCache;
use std::{fmt, sync::Arc};
use waymark_core::{
    CandidateSet, Endpoint, EndpointDataSource, MatchError, RouteValues, RoutingError,
};

struct ParameterConstraint {
    parameter: String,
    constraint: Arc<dyn RouteConstraint>,
}

struct TableEntry {
    endpoint: Endpoint,
    constraints: Vec<ParameterConstraint>,
}

impl TableEntry {
    fn accepts(&self, values: &RouteValues) -> bool {
        self.constraints.iter().all(|c| {
            c.constraint
                .matches(values.get(&c.parameter).map(String::as_str))
        })
    }
}

struct MatcherTable {
    entries: Vec<TableEntry>,
    policies: Vec<Arc<dyn CandidatePolicy>>,
}

impl MatcherTable {
    fn build(
        endpoints: &[Endpoint],
        resolver: &ConstraintResolver,
        policies: &[Arc<dyn CandidatePolicy>],
    ) -> Result<Self, RoutingError> {
        let mut entries = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let mut constraints = Vec::new();
            for (parameter, references) in endpoint.pattern().constraints().iter() {
                for reference in references {
                    constraints.push(ParameterConstraint {
                        parameter: parameter.to_string(),
                        constraint: resolver.resolve(reference)?,
                    });
                }
            }
            entries.push(TableEntry {
                endpoint: endpoint.clone(),
                constraints,
            });
        }

        let policies = policies
            .iter()
            .filter(|policy| policy.applies_to(endpoints))
            .cloned()
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(endpoints = entries.len(), "Built matcher table");

        Ok(Self { entries, policies })
    }
}

/// The outcome of a successful match.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    endpoint: Endpoint,
    values: RouteValues,
}

impl RouteMatch {
    /// The selected endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Route values extracted from the path, defaults included.
    pub fn values(&self) -> &RouteValues {
        &self.values
    }

    /// Split into endpoint and values.
    pub fn into_parts(self) -> (Endpoint, RouteValues) {
        (self.endpoint, self.values)
    }
}

/// Resolves request paths to endpoints.
///
/// Every endpoint of the source is tried in turn (there is no prebuilt
/// automaton). Candidates that match the path and pass their constraints are
/// narrowed by the configured policies; the best remaining candidate by
/// inbound precedence, then declared order, wins.
///
/// The per-endpoint table, with resolved constraints, is rebuilt whenever the
/// source changes.
///
/// # Example
///
/// ```rust,ignore
/// let matcher = Matcher::builder().build(Arc::new(composite));
///
/// if let Some(found) = matcher.match_path("/products/42")? {
///     println!("{} {:?}", found.endpoint(), found.values().get("id"));
/// }
/// ```
#[derive(Clone)]
pub struct Matcher {
    table: DataSourceDependentCache<MatcherTable>,
}

impl Matcher {
    /// A matcher with the built-in constraints and no policies.
    pub fn new(source: Arc<dyn EndpointDataSource>) -> Self {
        MatcherBuilder::new().build(source)
    }

    /// Start configuring a matcher.
    pub fn builder() -> MatcherBuilder {
        MatcherBuilder::new()
    }

    /// Find the endpoint for `path`.
    ///
    /// Returns `Ok(None)` when nothing matches, and
    /// [`MatchError::Ambiguous`] when the best candidates tie.
    pub fn match_path(&self, path: &str) -> Result<Option<RouteMatch>, RoutingError> {
        let table = self.table.value()?;

        let mut matched: Vec<&TableEntry> = Vec::new();
        let mut candidates: Vec<(&Endpoint, Option<RouteValues>)> = Vec::new();
        for entry in &table.entries {
            if let Some(values) = match_pattern(entry.endpoint.pattern(), path) {
                matched.push(entry);
                candidates.push((&entry.endpoint, Some(values)));
            }
        }

        let mut set = CandidateSet::new(candidates);
        for (index, entry) in matched.iter().enumerate() {
            let accepted = set
                .get(index)
                .and_then(|candidate| candidate.values())
                .is_some_and(|values| entry.accepts(values));
            if !accepted {
                set.invalidate(index);
            }
        }

        for policy in &table.policies {
            policy
                .apply(path, &mut set)
                .map_err(MatchError::Policy)?;
        }

        let selected = set.into_selected()?.map(|(endpoint, values)| RouteMatch {
            endpoint: endpoint.clone(),
            values,
        });

        #[cfg(feature = "tracing")]
        match &selected {
            Some(found) => tracing::debug!(path, endpoint = %found.endpoint, "Matched path"),
            None => tracing::debug!(path, "No endpoint matched path"),
        }

        Ok(selected)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher").field("table", &self.table).finish()
    }
}

/// Builder for [`Matcher`].
#[derive(Default)]
pub struct MatcherBuilder {
    resolver: ConstraintResolver,
    policies: Vec<Arc<dyn CandidatePolicy>>,
}

impl MatcherBuilder {
    /// Built-in constraints, no policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the constraint resolver.
    pub fn resolver(mut self, resolver: ConstraintResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Register an argument-less constraint.
    pub fn constraint<C: RouteConstraint + 'static>(mut self, name: &str, constraint: C) -> Self {
        self.resolver = self.resolver.with_constraint(name, constraint);
        self
    }

    /// Append a policy. Policies run in the order they were added.
    pub fn policy<P: CandidatePolicy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    /// Build a matcher over `source`.
    pub fn build(self, source: Arc<dyn EndpointDataSource>) -> Matcher {
        let Self { resolver, policies } = self;
        Matcher {
            table: DataSourceDependentCache::new(source, move |endpoints| {
                MatcherTable::build(endpoints, &resolver, &policies)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{matching::policy::RequireMetadata, sources::DynamicEndpointDataSource};
    use waymark_core::{BoxError, ConstraintReference, RoutePatternBuilder};

    fn named(name: &str, builder: RoutePatternBuilder) -> Endpoint {
        Endpoint::builder(builder.build().unwrap())
            .display_name(name)
            .build()
    }

    fn matcher(endpoints: Vec<Endpoint>) -> (Arc<DynamicEndpointDataSource>, Matcher) {
        let source = Arc::new(DynamicEndpointDataSource::new(endpoints));
        let matcher = Matcher::new(Arc::clone(&source) as Arc<dyn EndpointDataSource>);
        (source, matcher)
    }

    fn matched_name(matcher: &Matcher, path: &str) -> Option<String> {
        matcher
            .match_path(path)
            .unwrap()
            .map(|found| found.endpoint().to_string())
    }

    #[test]
    fn test_literal_beats_parameter_and_catch_all() {
        let (_, matcher) = matcher(vec![
            named("catch-all", RoutePatternBuilder::new().literal("products").catch_all("rest")),
            named("by-id", RoutePatternBuilder::new().literal("products").parameter("id")),
            named("featured", RoutePatternBuilder::new().literal("products").literal("featured")),
        ]);

        assert_eq!(matched_name(&matcher, "/products/featured").as_deref(), Some("featured"));
        assert_eq!(matched_name(&matcher, "/products/7").as_deref(), Some("by-id"));
        assert_eq!(matched_name(&matcher, "/products/7/reviews").as_deref(), Some("catch-all"));
        assert_eq!(matched_name(&matcher, "/orders"), None);
    }

    #[test]
    fn test_values_are_returned() {
        let (_, matcher) = matcher(vec![named(
            "by-id",
            RoutePatternBuilder::new()
                .literal("products")
                .parameter("id")
                .default_value("area", "shop"),
        )]);

        let found = matcher.match_path("/products/42").unwrap().unwrap();
        assert_eq!(found.values().get("ID").map(String::as_str), Some("42"));
        assert_eq!(found.values().get("area").map(String::as_str), Some("shop"));
    }

    #[test]
    fn test_constraints_withdraw_candidates() {
        let (_, matcher) = matcher(vec![
            named(
                "by-id",
                RoutePatternBuilder::new()
                    .literal("products")
                    .parameter("id")
                    .constraint("id", ConstraintReference::new("int")),
            ),
            named(
                "by-slug",
                RoutePatternBuilder::new()
                    .literal("products")
                    .parameter("slug"),
            ),
        ]);

        assert_eq!(matched_name(&matcher, "/products/42").as_deref(), Some("by-id"));
        assert_eq!(matched_name(&matcher, "/products/shoes").as_deref(), Some("by-slug"));
    }

    #[test]
    fn test_order_breaks_precedence_ties() {
        let first = Endpoint::builder(
            RoutePatternBuilder::new().parameter("a").build().unwrap(),
        )
        .display_name("first")
        .order(1)
        .build();
        let second = Endpoint::builder(
            RoutePatternBuilder::new().parameter("b").build().unwrap(),
        )
        .display_name("second")
        .order(0)
        .build();
        let (_, matcher) = matcher(vec![first, second]);

        assert_eq!(matched_name(&matcher, "/x").as_deref(), Some("second"));
    }

    #[test]
    fn test_ambiguous_match_is_an_error() {
        let (_, matcher) = matcher(vec![
            named("a", RoutePatternBuilder::new().parameter("a")),
            named("b", RoutePatternBuilder::new().parameter("b")),
        ]);

        assert!(matches!(
            matcher.match_path("/x"),
            Err(RoutingError::Match(MatchError::Ambiguous { .. }))
        ));
    }

    #[test]
    fn test_unknown_constraint_surfaces_on_match() {
        let (_, matcher) = matcher(vec![named(
            "a",
            RoutePatternBuilder::new()
                .parameter("id")
                .constraint("id", ConstraintReference::new("guid")),
        )]);

        assert!(matches!(
            matcher.match_path("/x"),
            Err(RoutingError::Match(MatchError::UnknownConstraint(_)))
        ));
    }

    #[test]
    fn test_table_follows_source_changes() {
        let (source, matcher) = matcher(vec![named("a", RoutePatternBuilder::new().literal("a"))]);
        assert_eq!(matched_name(&matcher, "/b"), None);

        source.add(named("b", RoutePatternBuilder::new().literal("b")));
        assert_eq!(matched_name(&matcher, "/b").as_deref(), Some("b"));
    }

    struct Visible;

    fn failing_policy(_: &str, _: &mut CandidateSet<'_>) -> Result<(), BoxError> {
        Err("policy failed".into())
    }

    #[test]
    fn test_policies_run_in_order() {
        let source = Arc::new(DynamicEndpointDataSource::new([
            named("hidden", RoutePatternBuilder::new().literal("a")),
            Endpoint::builder(RoutePatternBuilder::new().parameter("x").build().unwrap())
                .display_name("visible")
                .metadata(Visible)
                .build(),
        ]));

        let matcher = Matcher::builder()
            .policy(RequireMetadata::<Visible>::new())
            .build(Arc::clone(&source) as Arc<dyn EndpointDataSource>);
        assert_eq!(matched_name(&matcher, "/a").as_deref(), Some("visible"));

        let failing = Matcher::builder()
            .policy(failing_policy)
            .build(source as Arc<dyn EndpointDataSource>);
        assert!(matches!(
            failing.match_path("/a"),
            Err(RoutingError::Match(MatchError::Policy(_)))
        ));
    }

    #[test]
    fn test_custom_constraint() {
        let source = Arc::new(DynamicEndpointDataSource::new([named(
            "even",
            RoutePatternBuilder::new()
                .parameter("n")
                .constraint("n", ConstraintReference::new("even")),
        )]));
        let matcher = Matcher::builder()
            .constraint("even", |value: Option<&str>| {
                value.is_none_or(|v| v.parse::<u32>().is_ok_and(|n| n % 2 == 0))
            })
            .build(source as Arc<dyn EndpointDataSource>);

        assert_eq!(matched_name(&matcher, "/4").as_deref(), Some("even"));
        assert_eq!(matched_name(&matcher, "/3"), None);
    }
}
