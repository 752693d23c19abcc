//! Testing utilities for Waymark.
//!
//! # Features
//!
//! - [`CountingCallback`]: Counts change notifications
//! - [`FlakyEndpointSource`]: A dynamic source that can be switched into failure

use crate::sources::DynamicEndpointDataSource;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use waymark_core::{ChangeToken, Endpoint, EndpointDataSource, EndpointList, SourceError};

// ============================================================================
// Counting Callback
// ============================================================================

/// Counts how many times its callbacks ran.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CountingCallback::new();
/// token.register(counter.callback());
/// trigger.fire();
/// assert_eq!(counter.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingCallback {
    count: Arc<AtomicUsize>,
}

impl CountingCallback {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-shot callback that increments the counter.
    pub fn callback(&self) -> impl FnOnce() + Send + 'static {
        let count = Arc::clone(&self.count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Increment the counter directly.
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of increments so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

// ============================================================================
// Flaky Source
// ============================================================================

/// A [`DynamicEndpointDataSource`] that can be told to fail.
///
/// While failing, both `endpoints` and `change_token` return
/// [`SourceError::Unavailable`]. Mutations still rotate and fire, so a
/// failure can be injected in the middle of change handling.
#[derive(Debug, Default)]
pub struct FlakyEndpointSource {
    inner: DynamicEndpointDataSource,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl FlakyEndpointSource {
    /// Create a healthy source holding `endpoints`.
    pub fn new<I: IntoIterator<Item = Endpoint>>(endpoints: I) -> Self {
        Self {
            inner: DynamicEndpointDataSource::new(endpoints),
            failing: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }

    /// Switch failure on or off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Replace every endpoint and fire.
    pub fn set_endpoints<I: IntoIterator<Item = Endpoint>>(&self, endpoints: I) {
        self.inner.set_endpoints(endpoints);
    }

    /// Append one endpoint and fire.
    pub fn add(&self, endpoint: Endpoint) {
        self.inner.add(endpoint);
    }

    /// Number of successful and failed `endpoints` calls.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), SourceError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SourceError::Unavailable("flaky source is failing".into()))
        } else {
            Ok(())
        }
    }
}

impl EndpointDataSource for FlakyEndpointSource {
    fn endpoints(&self) -> Result<EndpointList, SourceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.endpoints()
    }

    fn change_token(&self) -> Result<ChangeToken, SourceError> {
        self.check()?;
        self.inner.change_token()
    }
}
