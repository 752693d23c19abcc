//! Fluent construction of route patterns.
//!
//! [`RoutePattern`] itself stores whatever it is given. This builder is the
//! layer that rejects malformed input before a pattern exists.
//!
//! # Example
//!
//! ```rust,ignore
//! // /files/{name}.{ext}/{**rest}
//! let pattern = RoutePatternBuilder::new()
//!     .literal("files")
//!     .segment(|s| s.parameter("name").literal(".").parameter("ext"))
//!     .catch_all_preserving_slashes("rest")
//!     .build()?;
//! ```

use crate::{
    error::PatternError,
    pattern::{
        ConstraintReference, ParameterKind, PathPart, PathSegment, RouteConstraints,
        RouteParameter, RoutePattern,
    },
    precedence::{DefaultPrecedence, PrecedenceStrategy},
    values::RouteValues,
};

const RESERVED: &[char] = &['/', '{', '}', '?', '*', '=', ':'];

/// Builder for the parts of a single complex segment.
#[derive(Debug, Default)]
pub struct SegmentBuilder {
    parts: Vec<PathPart>,
}

impl SegmentBuilder {
    /// Append a literal part.
    pub fn literal(mut self, text: impl Into<String>) -> Self {
        self.parts.push(PathPart::Literal(text.into()));
        self
    }

    /// Append a standard parameter part.
    pub fn parameter(self, name: impl Into<String>) -> Self {
        self.part(RouteParameter::new(name))
    }

    /// Append a parameter part with an inline default.
    pub fn parameter_with_default(
        self,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.part(RouteParameter::new(name).with_default(default))
    }

    /// Append an arbitrary parameter part.
    pub fn part(mut self, parameter: RouteParameter) -> Self {
        self.parts.push(PathPart::Parameter(parameter));
        self
    }

    fn finish(self) -> PathSegment {
        PathSegment::new(self.parts)
    }
}

/// Fluent builder for [`RoutePattern`].
pub struct RoutePatternBuilder {
    raw_text: Option<String>,
    segments: Vec<PathSegment>,
    defaults: RouteValues,
    constraints: RouteConstraints,
    strategy: Box<dyn PrecedenceStrategy>,
}

impl Default for RoutePatternBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutePatternBuilder {
    /// Create an empty builder (the root pattern `/`).
    pub fn new() -> Self {
        Self {
            raw_text: None,
            segments: Vec::new(),
            defaults: RouteValues::new(),
            constraints: RouteConstraints::new(),
            strategy: Box::new(DefaultPrecedence),
        }
    }

    /// Record the text this pattern came from, for diagnostics.
    pub fn raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    /// Append a literal segment.
    pub fn literal(self, text: impl Into<String>) -> Self {
        self.push_segment(PathSegment::literal(text))
    }

    /// Append a standard parameter segment.
    pub fn parameter(self, name: impl Into<String>) -> Self {
        self.push_segment(PathSegment::parameter(RouteParameter::new(name)))
    }

    /// Append a parameter segment with an inline default.
    pub fn parameter_with_default(
        self,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.push_segment(PathSegment::parameter(
            RouteParameter::new(name).with_default(default),
        ))
    }

    /// Append an optional parameter segment.
    pub fn optional(self, name: impl Into<String>) -> Self {
        self.push_segment(PathSegment::parameter(RouteParameter::with_kind(
            name,
            ParameterKind::Optional,
        )))
    }

    /// Append a catch-all segment (`{*name}`).
    pub fn catch_all(self, name: impl Into<String>) -> Self {
        self.push_segment(PathSegment::parameter(RouteParameter::with_kind(
            name,
            ParameterKind::CatchAll,
        )))
    }

    /// Append a catch-all segment that keeps `/` when generating (`{**name}`).
    pub fn catch_all_preserving_slashes(self, name: impl Into<String>) -> Self {
        self.push_segment(PathSegment::parameter(
            RouteParameter::with_kind(name, ParameterKind::CatchAll).preserve_slashes(),
        ))
    }

    /// Append a segment made of several parts.
    pub fn segment<F>(self, build: F) -> Self
    where
        F: FnOnce(SegmentBuilder) -> SegmentBuilder,
    {
        self.push_segment(build(SegmentBuilder::default()).finish())
    }

    /// Append a prebuilt segment.
    pub fn push_segment(mut self, segment: PathSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Add a default value. The name need not be a parameter.
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name, value.into());
        self
    }

    /// Add a constraint reference to a parameter.
    pub fn constraint(mut self, name: impl Into<String>, constraint: ConstraintReference) -> Self {
        let name = name.into();
        match self.constraints.get_mut(&name) {
            Some(existing) => existing.push(constraint),
            None => {
                self.constraints.insert(name, vec![constraint]);
            }
        }
        self
    }

    /// Compute precedence with a custom strategy.
    pub fn precedence_strategy<S: PrecedenceStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Validate and build the pattern.
    pub fn build(self) -> Result<RoutePattern, PatternError> {
        let Self {
            raw_text,
            segments,
            mut defaults,
            constraints,
            strategy,
        } = self;

        let last = segments.len().saturating_sub(1);
        let mut parameters: Vec<RouteParameter> = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            if segment.parts().is_empty() {
                return Err(PatternError::EmptySegment(index));
            }

            let mut previous_parameter: Option<&str> = None;
            for part in segment.parts() {
                match part {
                    PathPart::Literal(text) => {
                        if text.is_empty() {
                            return Err(PatternError::EmptyLiteral);
                        }
                        if text.contains('/') {
                            return Err(PatternError::InvalidLiteral(text.clone()));
                        }
                        previous_parameter = None;
                    }
                    PathPart::Parameter(parameter) => {
                        let name = parameter.name();
                        validate_name(name)?;

                        if parameters.iter().any(|p| p.name().eq_ignore_ascii_case(name)) {
                            return Err(PatternError::DuplicateParameter(name.to_string()));
                        }
                        if let Some(previous) = previous_parameter {
                            return Err(PatternError::AdjacentParameters(
                                previous.to_string(),
                                name.to_string(),
                            ));
                        }
                        if parameter.is_optional() || parameter.is_catch_all() {
                            if segment.is_complex() {
                                return Err(PatternError::NotAlone(name.to_string()));
                            }
                            if index != last {
                                return Err(PatternError::NotInLastSegment(name.to_string()));
                            }
                        }
                        if parameter.is_optional() && parameter.has_default() {
                            return Err(PatternError::OptionalWithDefault(name.to_string()));
                        }
                        if let Some(value) = parameter.default_value() {
                            match defaults.get(name) {
                                Some(existing) if existing != value => {
                                    return Err(PatternError::ConflictingDefault(
                                        name.to_string(),
                                    ));
                                }
                                Some(_) => {}
                                None => {
                                    defaults.insert(name, value.to_string());
                                }
                            }
                        }

                        parameters.push(parameter.clone());
                        previous_parameter = Some(name);
                    }
                }
            }
        }

        Ok(RoutePattern::with_strategy(
            raw_text,
            defaults,
            constraints,
            parameters,
            segments,
            strategy.as_ref(),
        ))
    }
}

fn validate_name(name: &str) -> Result<(), PatternError> {
    if name.is_empty() || name.contains(RESERVED) {
        return Err(PatternError::InvalidParameterName(name.to_string()));
    }
    Ok(())
}
