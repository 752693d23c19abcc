//! # Route Pattern Model
//!
//! A [`RoutePattern`] is the parsed, immutable form of a URL template: its
//! path segments, parameter definitions, default values and constraint
//! references, plus the two precedence scores derived from them.
//!
//! Patterns are produced by [`RoutePatternBuilder`](crate::RoutePatternBuilder)
//! (or by any other front end that has already validated its input) and are
//! shared behind an `Arc` by every endpoint that uses them. Nothing in a
//! pattern changes after construction, so it can be read from any thread
//! without synchronization.

use crate::{
    precedence::{DefaultPrecedence, Precedence, PrecedenceStrategy},
    values::{CaseInsensitiveMap, RouteValues},
};
use std::fmt;

/// A reference to a route constraint by name, with optional arguments.
///
/// The reference is resolved to an implementation by the matching stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintReference {
    name: String,
    arguments: Vec<String>,
}

impl ConstraintReference {
    /// A constraint without arguments, e.g. `int`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// A constraint with arguments, e.g. `range(1,10)`.
    pub fn with_arguments<I, S>(name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// Constraint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constraint arguments, in declaration order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

impl fmt::Display for ConstraintReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.arguments.is_empty() {
            write!(f, "({})", self.arguments.join(","))?;
        }
        Ok(())
    }
}

/// Constraint references per parameter name.
pub type RouteConstraints = CaseInsensitiveMap<Vec<ConstraintReference>>;

/// How a parameter participates in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Must be present (or supplied by a default).
    Standard,
    /// May be absent.
    Optional,
    /// Captures the remainder of the path.
    CatchAll,
}

/// A parameter definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParameter {
    name: String,
    kind: ParameterKind,
    default: Option<String>,
    encode_slashes: bool,
}

impl RouteParameter {
    /// A standard parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, ParameterKind::Standard)
    }

    /// A parameter of the given kind.
    pub fn with_kind(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            encode_slashes: true,
        }
    }

    /// Attach an inline default value.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Keep `/` unescaped when generating links for a catch-all (`{**path}`).
    pub fn preserve_slashes(mut self) -> Self {
        self.encode_slashes = false;
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter kind.
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Inline default value, if any.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Returns true if the parameter has an inline default.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Returns true for optional parameters.
    pub fn is_optional(&self) -> bool {
        self.kind == ParameterKind::Optional
    }

    /// Returns true for catch-all parameters.
    pub fn is_catch_all(&self) -> bool {
        self.kind == ParameterKind::CatchAll
    }

    /// Whether generated catch-all values escape `/`.
    pub fn encode_slashes(&self) -> bool {
        self.encode_slashes
    }
}

/// One part of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    /// Literal text.
    Literal(String),
    /// A parameter reference.
    Parameter(RouteParameter),
}

impl PathPart {
    /// Returns the literal text, if this is a literal part.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            PathPart::Literal(text) => Some(text),
            PathPart::Parameter(_) => None,
        }
    }

    /// Returns the parameter, if this is a parameter part.
    pub fn as_parameter(&self) -> Option<&RouteParameter> {
        match self {
            PathPart::Literal(_) => None,
            PathPart::Parameter(parameter) => Some(parameter),
        }
    }
}

/// A path segment: the text between two `/` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    parts: Vec<PathPart>,
}

impl PathSegment {
    /// Create a segment from its parts.
    pub fn new(parts: Vec<PathPart>) -> Self {
        Self { parts }
    }

    /// A segment made of a single literal.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(vec![PathPart::Literal(text.into())])
    }

    /// A segment made of a single parameter.
    pub fn parameter(parameter: RouteParameter) -> Self {
        Self::new(vec![PathPart::Parameter(parameter)])
    }

    /// Parts in order.
    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    /// Returns true if the segment has more than one part.
    pub fn is_complex(&self) -> bool {
        self.parts.len() > 1
    }

    /// The only part of a simple segment.
    pub fn single_part(&self) -> Option<&PathPart> {
        match self.parts.as_slice() {
            [part] => Some(part),
            _ => None,
        }
    }
}

/// An immutable, parsed route pattern.
///
/// # Example
///
/// ```rust,ignore
/// let pattern = RoutePattern::builder()
///     .literal("products")
///     .parameter("id")
///     .constraint("id", ConstraintReference::new("int"))
///     .build()?;
///
/// assert!(pattern.get_parameter("ID").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw_text: Option<String>,
    defaults: RouteValues,
    constraints: RouteConstraints,
    parameters: Vec<RouteParameter>,
    path_segments: Vec<PathSegment>,
    inbound_precedence: Precedence,
    outbound_precedence: Precedence,
}

impl RoutePattern {
    /// Create a pattern from validated parts using [`DefaultPrecedence`].
    pub fn new(
        raw_text: Option<String>,
        defaults: RouteValues,
        constraints: RouteConstraints,
        parameters: Vec<RouteParameter>,
        path_segments: Vec<PathSegment>,
    ) -> Self {
        Self::with_strategy(
            raw_text,
            defaults,
            constraints,
            parameters,
            path_segments,
            &DefaultPrecedence,
        )
    }

    /// Create a pattern whose precedence is computed by `strategy`.
    ///
    /// No validation happens here; the builder layer owns that.
    pub fn with_strategy(
        raw_text: Option<String>,
        defaults: RouteValues,
        constraints: RouteConstraints,
        parameters: Vec<RouteParameter>,
        path_segments: Vec<PathSegment>,
        strategy: &dyn PrecedenceStrategy,
    ) -> Self {
        debug_assert!(
            path_segments
                .iter()
                .flat_map(|s| s.parts())
                .filter_map(PathPart::as_parameter)
                .all(|p| parameters.iter().any(|d| d.name().eq_ignore_ascii_case(p.name()))),
            "every parameter part must be declared in `parameters`"
        );

        let mut pattern = Self {
            raw_text,
            defaults,
            constraints,
            parameters,
            path_segments,
            inbound_precedence: Precedence::ZERO,
            outbound_precedence: Precedence::ZERO,
        };
        pattern.inbound_precedence = strategy.inbound(&pattern);
        pattern.outbound_precedence = strategy.outbound(&pattern);
        pattern
    }

    /// Start a fluent builder.
    pub fn builder() -> crate::RoutePatternBuilder {
        crate::RoutePatternBuilder::new()
    }

    /// The source text the pattern was built from, if any.
    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    /// Default values, including inline parameter defaults.
    pub fn defaults(&self) -> &RouteValues {
        &self.defaults
    }

    /// Constraint references per parameter.
    pub fn constraints(&self) -> &RouteConstraints {
        &self.constraints
    }

    /// Constraint references for one parameter.
    pub fn constraints_for(&self, name: &str) -> &[ConstraintReference] {
        self.constraints.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parameter definitions in declaration order.
    pub fn parameters(&self) -> &[RouteParameter] {
        &self.parameters
    }

    /// Path segments in order.
    pub fn path_segments(&self) -> &[PathSegment] {
        &self.path_segments
    }

    /// Score used to rank matches; lower wins.
    pub fn inbound_precedence(&self) -> &Precedence {
        &self.inbound_precedence
    }

    /// Score used to rank link generation; higher wins.
    pub fn outbound_precedence(&self) -> &Precedence {
        &self.outbound_precedence
    }

    /// Find a parameter by name, ignoring ASCII case. First match wins.
    pub fn get_parameter(&self, name: &str) -> Option<&RouteParameter> {
        self.parameters
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

// Canonical template text, e.g. `/products/{id:int}/{**path}`.
impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path_segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.path_segments {
            f.write_str("/")?;
            for part in segment.parts() {
                match part {
                    PathPart::Literal(text) => f.write_str(text)?,
                    PathPart::Parameter(parameter) => {
                        f.write_str("{")?;
                        match parameter.kind() {
                            ParameterKind::CatchAll if parameter.encode_slashes() => {
                                f.write_str("*")?
                            }
                            ParameterKind::CatchAll => f.write_str("**")?,
                            _ => {}
                        }
                        f.write_str(parameter.name())?;
                        for constraint in self.constraints_for(parameter.name()) {
                            write!(f, ":{}", constraint)?;
                        }
                        if let Some(default) = parameter.default_value() {
                            write!(f, "={}", default)?;
                        }
                        if parameter.is_optional() {
                            f.write_str("?")?;
                        }
                        f.write_str("}")?;
                    }
                }
            }
        }
        Ok(())
    }
}
