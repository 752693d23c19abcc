//! Route precedence.
//!
//! Precedence is a decimal score built from one digit per path segment: the
//! first segment is the units digit, the second the first decimal place, and
//! so on. Segments of kinds `[literal, parameter, catch-all]` with digits
//! `1, 3, 5` give `1.35`.
//!
//! [`Precedence`] keeps the digits themselves instead of a float, so scores
//! compare exactly for any number of segments. How digits are chosen is a
//! [`PrecedenceStrategy`]; [`DefaultPrecedence`] is used unless a pattern is
//! built with another one.

use crate::pattern::{PathPart, PathSegment, RoutePattern};
use std::fmt;

/// An exact decimal precedence score.
///
/// Ordering is numeric: `1 < 1.1 < 1.15 < 1.5 < 2`.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precedence {
    // Trailing zeros are trimmed, which makes lexicographic order numeric.
    digits: Vec<u8>,
}

impl Precedence {
    /// The zero score.
    pub const ZERO: Precedence = Precedence { digits: Vec::new() };

    /// Build a score from per-segment digits, most significant first.
    ///
    /// Digits above 9 are clamped.
    pub fn from_digits<I: IntoIterator<Item = u8>>(digits: I) -> Self {
        let mut digits: Vec<u8> = digits
            .into_iter()
            .map(|d| {
                debug_assert!(d < 10, "precedence digit out of range: {d}");
                d.min(9)
            })
            .collect();
        while digits.last() == Some(&0) {
            digits.pop();
        }
        Self { digits }
    }

    /// The significant digits, most significant first.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.digits.split_first() {
            None => f.write_str("0"),
            Some((units, rest)) => {
                write!(f, "{units}")?;
                if !rest.is_empty() {
                    f.write_str(".")?;
                    for d in rest {
                        write!(f, "{d}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Precedence({self})")
    }
}

/// Computes precedence scores for a pattern.
///
/// Implementations must be deterministic: the same pattern structure always
/// yields the same scores.
pub trait PrecedenceStrategy: Send + Sync {
    /// Score used when matching requests; lower wins.
    fn inbound(&self, pattern: &RoutePattern) -> Precedence;

    /// Score used when generating links; higher wins.
    fn outbound(&self, pattern: &RoutePattern) -> Precedence;
}

/// The default digit table.
///
/// | Segment | Inbound | Outbound |
/// |---|---|---|
/// | literal | 1 | 5 |
/// | complex (several parts) | 2 | 4 |
/// | constrained parameter | 2 | 4 |
/// | parameter | 3 | 3 |
/// | constrained catch-all | 4 | 2 |
/// | catch-all | 5 | 1 |
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrecedence;

impl DefaultPrecedence {
    fn inbound_digit(pattern: &RoutePattern, segment: &PathSegment) -> u8 {
        match segment.single_part() {
            None => 2,
            Some(PathPart::Literal(_)) => 1,
            Some(PathPart::Parameter(parameter)) => {
                let digit = if parameter.is_catch_all() { 5 } else { 3 };
                if pattern.constraints_for(parameter.name()).is_empty() {
                    digit
                } else {
                    digit - 1
                }
            }
        }
    }

    fn outbound_digit(pattern: &RoutePattern, segment: &PathSegment) -> u8 {
        match segment.single_part() {
            None => 4,
            Some(PathPart::Literal(_)) => 5,
            Some(PathPart::Parameter(parameter)) => {
                let digit = if parameter.is_catch_all() { 1 } else { 3 };
                if pattern.constraints_for(parameter.name()).is_empty() {
                    digit
                } else {
                    digit + 1
                }
            }
        }
    }
}

impl PrecedenceStrategy for DefaultPrecedence {
    fn inbound(&self, pattern: &RoutePattern) -> Precedence {
        Precedence::from_digits(
            pattern
                .path_segments()
                .iter()
                .map(|s| Self::inbound_digit(pattern, s)),
        )
    }

    fn outbound(&self, pattern: &RoutePattern) -> Precedence {
        Precedence::from_digits(
            pattern
                .path_segments()
                .iter()
                .map(|s| Self::outbound_digit(pattern, s)),
        )
    }
}
