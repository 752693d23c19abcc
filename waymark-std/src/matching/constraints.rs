//! # Route Constraints
//!
//! A constraint restricts the values a parameter accepts. Patterns refer to
//! constraints by name ([`ConstraintReference`]); a [`ConstraintResolver`]
//! turns those references into [`RouteConstraint`] objects once, when the
//! matcher builds its table.
//!
//! # Built-in Constraints
//!
//! | Name | Arguments | Accepts |
//! |------|-----------|---------|
//! | `int` | none | a 64-bit signed integer |
//! | `bool` | none | `true` or `false`, any case |
//! | `alpha` | none | ASCII letters only |
//! | `required` | none | any non-empty value |
//! | `minlength` | `n` | at least `n` characters |
//! | `maxlength` | `n` | at most `n` characters |
//! | `length` | `n` or `min,max` | exactly `n`, or between `min` and `max` characters |
//! | `min` | `n` | an integer `>= n` |
//! | `max` | `n` | an integer `<= n` |
//! | `range` | `min,max` | an integer between `min` and `max` |
//!
//! Every constraint except `required` accepts an absent value.

use std::{fmt, sync::Arc};
use thiserror::Error;
use waymark_core::{CaseInsensitiveMap, ConstraintReference, MatchError};

/// A test applied to a parameter's value.
pub trait RouteConstraint: Send + Sync {
    /// Returns true if the value is acceptable. `None` means the parameter
    /// has no value for this path.
    fn matches(&self, value: Option<&str>) -> bool;
}

impl<F> RouteConstraint for F
where
    F: Fn(Option<&str>) -> bool + Send + Sync,
{
    fn matches(&self, value: Option<&str>) -> bool {
        self(value)
    }
}

/// Errors raised while parsing constraint arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstraintArgumentError {
    /// Wrong number of arguments.
    #[error("expected {expected} argument(s), got {actual}")]
    Count {
        /// Accepted counts, for display.
        expected: &'static str,
        /// Number supplied.
        actual: usize,
    },

    /// An argument is not an integer.
    #[error("`{0}` is not an integer")]
    NotAnInteger(String),

    /// A lower bound exceeds its upper bound.
    #[error("minimum {min} exceeds maximum {max}")]
    InvertedBounds {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
}

// ============================================================================
// Built-ins
// ============================================================================

/// Accepts integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConstraint;

impl RouteConstraint for IntConstraint {
    fn matches(&self, value: Option<&str>) -> bool {
        value.is_none_or(|v| v.parse::<i64>().is_ok())
    }
}

/// Accepts `true` and `false`, in any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConstraint;

impl RouteConstraint for BoolConstraint {
    fn matches(&self, value: Option<&str>) -> bool {
        value.is_none_or(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
    }
}

/// Accepts ASCII letters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlphaConstraint;

impl RouteConstraint for AlphaConstraint {
    fn matches(&self, value: Option<&str>) -> bool {
        value.is_none_or(|v| v.chars().all(|c| c.is_ascii_alphabetic()))
    }
}

/// Rejects absent and empty values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredConstraint;

impl RouteConstraint for RequiredConstraint {
    fn matches(&self, value: Option<&str>) -> bool {
        value.is_some_and(|v| !v.is_empty())
    }
}

/// Bounds the length of a value, in characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthConstraint {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthConstraint {
    /// Both bounds are inclusive; `None` leaves a side open.
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

impl RouteConstraint for LengthConstraint {
    fn matches(&self, value: Option<&str>) -> bool {
        value.is_none_or(|v| {
            let len = v.chars().count();
            self.min.is_none_or(|min| len >= min) && self.max.is_none_or(|max| len <= max)
        })
    }
}

/// Bounds an integer value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeConstraint {
    min: Option<i64>,
    max: Option<i64>,
}

impl RangeConstraint {
    /// Both bounds are inclusive; `None` leaves a side open.
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }
}

impl RouteConstraint for RangeConstraint {
    fn matches(&self, value: Option<&str>) -> bool {
        value.is_none_or(|v| {
            v.parse::<i64>().is_ok_and(|n| {
                self.min.is_none_or(|min| n >= min) && self.max.is_none_or(|max| n <= max)
            })
        })
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Builds a constraint from its arguments.
pub type ConstraintFactory = Arc<
    dyn Fn(&[String]) -> Result<Arc<dyn RouteConstraint>, ConstraintArgumentError> + Send + Sync,
>;

/// Maps constraint names to factories.
///
/// Names are case-insensitive. Registering a name again replaces the
/// earlier factory, built-ins included.
#[derive(Clone)]
pub struct ConstraintResolver {
    factories: CaseInsensitiveMap<ConstraintFactory>,
}

impl ConstraintResolver {
    /// A resolver with no constraints.
    pub fn empty() -> Self {
        Self {
            factories: CaseInsensitiveMap::new(),
        }
    }

    /// A resolver with every built-in constraint.
    pub fn new() -> Self {
        Self::empty()
            .with_factory("int", |args| no_arguments(args, IntConstraint))
            .with_factory("bool", |args| no_arguments(args, BoolConstraint))
            .with_factory("alpha", |args| no_arguments(args, AlphaConstraint))
            .with_factory("required", |args| no_arguments(args, RequiredConstraint))
            .with_factory("minlength", |args| {
                let [min] = exact::<1>(args, "1")?;
                Ok(Arc::new(LengthConstraint::new(Some(length(min)?), None)))
            })
            .with_factory("maxlength", |args| {
                let [max] = exact::<1>(args, "1")?;
                Ok(Arc::new(LengthConstraint::new(None, Some(length(max)?))))
            })
            .with_factory("length", |args| match args {
                [n] => {
                    let n = length(n)?;
                    Ok(Arc::new(LengthConstraint::new(Some(n), Some(n))))
                }
                [min, max] => {
                    let (min, max) = (length(min)?, length(max)?);
                    if min > max {
                        return Err(ConstraintArgumentError::InvertedBounds {
                            min: min as i64,
                            max: max as i64,
                        });
                    }
                    Ok(Arc::new(LengthConstraint::new(Some(min), Some(max))))
                }
                _ => Err(ConstraintArgumentError::Count {
                    expected: "1 or 2",
                    actual: args.len(),
                }),
            })
            .with_factory("min", |args| {
                let [min] = exact::<1>(args, "1")?;
                Ok(Arc::new(RangeConstraint::new(Some(integer(min)?), None)))
            })
            .with_factory("max", |args| {
                let [max] = exact::<1>(args, "1")?;
                Ok(Arc::new(RangeConstraint::new(None, Some(integer(max)?))))
            })
            .with_factory("range", |args| {
                let [min, max] = exact::<2>(args, "2")?;
                let (min, max) = (integer(min)?, integer(max)?);
                if min > max {
                    return Err(ConstraintArgumentError::InvertedBounds { min, max });
                }
                Ok(Arc::new(RangeConstraint::new(Some(min), Some(max))))
            })
    }

    /// Register a factory under `name`.
    pub fn with_factory<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&[String]) -> Result<Arc<dyn RouteConstraint>, ConstraintArgumentError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name, Arc::new(factory));
        self
    }

    /// Register an argument-less constraint under `name`.
    pub fn with_constraint<C>(self, name: impl Into<String>, constraint: C) -> Self
    where
        C: RouteConstraint + 'static,
    {
        let constraint: Arc<dyn RouteConstraint> = Arc::new(constraint);
        self.with_factory(name, move |args| {
            if args.is_empty() {
                Ok(Arc::clone(&constraint))
            } else {
                Err(ConstraintArgumentError::Count {
                    expected: "0",
                    actual: args.len(),
                })
            }
        })
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the constraint a reference names.
    pub fn resolve(
        &self,
        reference: &ConstraintReference,
    ) -> Result<Arc<dyn RouteConstraint>, MatchError> {
        let factory = self
            .factories
            .get(reference.name())
            .ok_or_else(|| MatchError::UnknownConstraint(reference.name().to_string()))?;
        factory(reference.arguments()).map_err(|err| MatchError::InvalidConstraintArguments {
            name: reference.to_string(),
            reason: err.to_string(),
        })
    }
}

impl Default for ConstraintResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConstraintResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintResolver")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn no_arguments<C: RouteConstraint + 'static>(
    args: &[String],
    constraint: C,
) -> Result<Arc<dyn RouteConstraint>, ConstraintArgumentError> {
    if args.is_empty() {
        Ok(Arc::new(constraint))
    } else {
        Err(ConstraintArgumentError::Count {
            expected: "0",
            actual: args.len(),
        })
    }
}

fn exact<'a, const N: usize>(
    args: &'a [String],
    expected: &'static str,
) -> Result<&'a [String; N], ConstraintArgumentError> {
    args.try_into().map_err(|_| ConstraintArgumentError::Count {
        expected,
        actual: args.len(),
    })
}

fn integer(arg: &str) -> Result<i64, ConstraintArgumentError> {
    arg.trim()
        .parse()
        .map_err(|_| ConstraintArgumentError::NotAnInteger(arg.to_string()))
}

fn length(arg: &str) -> Result<usize, ConstraintArgumentError> {
    arg.trim()
        .parse()
        .map_err(|_| ConstraintArgumentError::NotAnInteger(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str, args: &[&str]) -> Result<Arc<dyn RouteConstraint>, MatchError> {
        ConstraintResolver::new().resolve(&ConstraintReference::with_arguments(
            name,
            args.iter().copied(),
        ))
    }

    #[test]
    fn test_builtin_constraints() {
        let int = resolve("int", &[]).unwrap();
        assert!(int.matches(Some("-42")));
        assert!(!int.matches(Some("4x")));
        assert!(int.matches(None));

        let boolean = resolve("BOOL", &[]).unwrap();
        assert!(boolean.matches(Some("TRUE")));
        assert!(!boolean.matches(Some("yes")));

        let alpha = resolve("alpha", &[]).unwrap();
        assert!(alpha.matches(Some("abcXYZ")));
        assert!(!alpha.matches(Some("abc1")));

        let required = resolve("required", &[]).unwrap();
        assert!(!required.matches(None));
        assert!(!required.matches(Some("")));
        assert!(required.matches(Some("x")));
    }

    #[test]
    fn test_length_constraints() {
        let min = resolve("minlength", &["2"]).unwrap();
        assert!(!min.matches(Some("a")));
        assert!(min.matches(Some("ab")));

        let max = resolve("maxlength", &["2"]).unwrap();
        assert!(max.matches(Some("ab")));
        assert!(!max.matches(Some("abc")));

        let exact = resolve("length", &["3"]).unwrap();
        assert!(exact.matches(Some("abc")));
        assert!(!exact.matches(Some("ab")));

        let between = resolve("length", &["1", "3"]).unwrap();
        assert!(between.matches(Some("ab")));
        assert!(!between.matches(Some("abcd")));
    }

    #[test]
    fn test_numeric_range_constraints() {
        let range = resolve("range", &["1", "10"]).unwrap();
        assert!(range.matches(Some("1")));
        assert!(range.matches(Some("10")));
        assert!(!range.matches(Some("11")));
        assert!(!range.matches(Some("ten")));

        assert!(resolve("min", &["5"]).unwrap().matches(Some("5")));
        assert!(!resolve("max", &["5"]).unwrap().matches(Some("6")));
    }

    #[test]
    fn test_unknown_constraint() {
        assert!(matches!(
            resolve("uuid", &[]),
            Err(MatchError::UnknownConstraint(name)) if name == "uuid"
        ));
    }

    #[test]
    fn test_invalid_arguments() {
        match resolve("range", &["10", "1"]) {
            Err(MatchError::InvalidConstraintArguments { name, reason }) => {
                assert_eq!(name, "range(10,1)");
                assert_eq!(reason, "minimum 10 exceeds maximum 1");
            }
            _ => panic!("expected invalid arguments"),
        }
        assert!(matches!(
            resolve("int", &["1"]),
            Err(MatchError::InvalidConstraintArguments { .. })
        ));
        assert!(matches!(
            resolve("minlength", &["x"]),
            Err(MatchError::InvalidConstraintArguments { .. })
        ));
    }

    #[test]
    fn test_custom_constraints() {
        let resolver = ConstraintResolver::new()
            .with_constraint("even", |value: Option<&str>| {
                value.is_none_or(|v| v.parse::<i64>().is_ok_and(|n| n % 2 == 0))
            });

        let even = resolver
            .resolve(&ConstraintReference::new("even"))
            .unwrap();
        assert!(even.matches(Some("4")));
        assert!(!even.matches(Some("3")));
        assert!(resolver.contains("EVEN"));
    }
}
