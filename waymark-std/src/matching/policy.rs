//! Candidate policies.
//!
//! A policy is a matching stage that runs after path matching and constraint
//! checks. It sees every candidate and may withdraw any of them, typically
//! based on endpoint metadata.

use waymark_core::{BoxError, CandidateSet, Endpoint};

/// A stage that narrows the candidate set.
///
/// # Example
///
/// ```rust,ignore
/// struct InternalOnly;
///
/// impl CandidatePolicy for InternalOnly {
///     fn apply(&self, _path: &str, candidates: &mut CandidateSet<'_>) -> Result<(), BoxError> {
///         for candidate in candidates.iter_mut() {
///             if candidate.endpoint().metadata().get::<Internal>().is_none() {
///                 candidate.invalidate();
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a candidate policy",
    label = "missing `CandidatePolicy` implementation"
)]
pub trait CandidatePolicy: Send + Sync {
    /// Returns false if this policy can be skipped for a table made of
    /// `endpoints`. Checked once per table build.
    fn applies_to(&self, endpoints: &[Endpoint]) -> bool {
        let _ = endpoints;
        true
    }

    /// Withdraw candidates that must not win for `path`.
    fn apply(&self, path: &str, candidates: &mut CandidateSet<'_>) -> Result<(), BoxError>;
}

impl<F> CandidatePolicy for F
where
    F: Fn(&str, &mut CandidateSet<'_>) -> Result<(), BoxError> + Send + Sync,
{
    fn apply(&self, path: &str, candidates: &mut CandidateSet<'_>) -> Result<(), BoxError> {
        self(path, candidates)
    }
}

/// Withdraws every candidate whose endpoint lacks metadata of type `T`.
pub struct RequireMetadata<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> RequireMetadata<T> {
    /// Create the policy.
    pub const fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Default for RequireMetadata<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::any::Any> CandidatePolicy for RequireMetadata<T> {
    fn applies_to(&self, endpoints: &[Endpoint]) -> bool {
        !endpoints.is_empty()
    }

    fn apply(&self, _path: &str, candidates: &mut CandidateSet<'_>) -> Result<(), BoxError> {
        for candidate in candidates.iter_mut() {
            if candidate.endpoint().metadata().get::<T>().is_none() {
                candidate.invalidate();
            }
        }
        Ok(())
    }
}
