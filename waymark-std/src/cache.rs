//! # Data Source Dependent Cache
//!
//! [`DataSourceDependentCache`] holds a value derived from an endpoint
//! source's current list and rebuilds it every time the source changes. The
//! matcher keeps its table in one; so does the link generator.
//!
//! The value is built on first read. Reads afterwards are lock-free. A
//! rebuild triggered by a change notification replaces the value in place;
//! if the rebuild fails, the value is dropped and the next read builds it
//! again, returning the error if it persists.

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{Arc, Weak},
};
use waymark_core::{ChangeSubscription, Endpoint, EndpointDataSource, RoutingError, on_change};

type Build<T> = dyn Fn(&[Endpoint]) -> Result<T, RoutingError> + Send + Sync;

#[derive(Default)]
struct GuardState {
    subscribed: bool,
    subscription: Option<ChangeSubscription>,
}

struct Inner<T> {
    source: Arc<dyn EndpointDataSource>,
    build: Box<Build<T>>,
    value: ArcSwapOption<T>,
    guard: Mutex<GuardState>,
}

impl<T: Send + Sync + 'static> Inner<T> {
    fn rebuild(&self) -> Result<Arc<T>, RoutingError> {
        let endpoints = self.source.endpoints()?;
        let value = Arc::new((self.build)(&endpoints)?);
        self.value.store(Some(Arc::clone(&value)));
        Ok(value)
    }

    fn initialize(self: &Arc<Self>) -> Result<Arc<T>, RoutingError> {
        let (value, initial_token) = {
            let mut guard = self.guard.lock();
            if let Some(value) = self.value.load_full() {
                return Ok(value);
            }

            let initial_token = if guard.subscribed {
                None
            } else {
                Some(self.source.change_token()?)
            };

            let value = self.rebuild()?;
            if initial_token.is_some() {
                guard.subscribed = true;
            }
            (value, initial_token)
        };

        if let Some(token) = initial_token {
            let mut initial = Some(token);
            let source = Arc::clone(&self.source);
            let on_error: Weak<Self> = Arc::downgrade(self);
            let on_notify: Weak<Self> = Arc::downgrade(self);

            let subscription = on_change(
                move || {
                    if let Some(token) = initial.take() {
                        return Some(token);
                    }
                    match source.change_token() {
                        Ok(token) => Some(token),
                        Err(err) => {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(error = %err, "Failed to re-subscribe cache to its source");
                            #[cfg(not(feature = "tracing"))]
                            let _ = err;
                            if let Some(inner) = on_error.upgrade() {
                                inner.reset();
                            }
                            None
                        }
                    }
                },
                move || {
                    if let Some(inner) = on_notify.upgrade() {
                        inner.refresh();
                    }
                },
            );
            let mut guard = self.guard.lock();
            if guard.subscribed {
                guard.subscription = Some(subscription);
            } else {
                drop(guard);
                subscription.cancel();
            }
        }

        Ok(value)
    }

    fn refresh(&self) {
        let guard = self.guard.lock();
        if !guard.subscribed {
            // Reset by a failed re-subscription; the next read subscribes.
            self.value.store(None);
            return;
        }
        match self.rebuild() {
            Ok(_) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Rebuilt cached value after source change");
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "Failed to rebuild cached value; next read will retry");
                #[cfg(not(feature = "tracing"))]
                let _ = err;
                self.value.store(None);
            }
        }
    }

    fn reset(&self) {
        let subscription = {
            let mut guard = self.guard.lock();
            guard.subscribed = false;
            self.value.store(None);
            guard.subscription.take()
        };
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(subscription) = self.guard.get_mut().subscription.take() {
            subscription.cancel();
        }
    }
}

/// A value derived from an endpoint source, kept current as it changes.
///
/// # Example
///
/// ```rust,ignore
/// let count = DataSourceDependentCache::new(source, |endpoints| Ok(endpoints.len()));
/// assert_eq!(*count.value()?, 3);
/// ```
pub struct DataSourceDependentCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + Sync + 'static> DataSourceDependentCache<T> {
    /// Create a cache over `source`. Nothing is built until the first read.
    pub fn new<F>(source: Arc<dyn EndpointDataSource>, build: F) -> Self
    where
        F: Fn(&[Endpoint]) -> Result<T, RoutingError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                source,
                build: Box::new(build),
                value: ArcSwapOption::empty(),
                guard: Mutex::new(GuardState::default()),
            }),
        }
    }

    /// The current value, building it if needed.
    pub fn value(&self) -> Result<Arc<T>, RoutingError> {
        match self.inner.value.load_full() {
            Some(value) => Ok(value),
            None => self.inner.initialize(),
        }
    }

    /// Returns true if a value is currently cached.
    pub fn is_initialized(&self) -> bool {
        self.inner.value.load().is_some()
    }

    /// The source the value is derived from.
    pub fn source(&self) -> &Arc<dyn EndpointDataSource> {
        &self.inner.source
    }
}

impl<T> Clone for DataSourceDependentCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for DataSourceDependentCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceDependentCache")
            .field("initialized", &self.inner.value.load().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sources::DynamicEndpointDataSource, testing::FlakyEndpointSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use waymark_core::{MatchError, RoutePatternBuilder};

    fn endpoint(name: &str) -> Endpoint {
        Endpoint::new(RoutePatternBuilder::new().literal(name).build().unwrap())
    }

    #[test]
    fn test_builds_lazily_once() {
        let source = Arc::new(DynamicEndpointDataSource::new([endpoint("a")]));
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let cache = DataSourceDependentCache::new(source, move |endpoints| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(endpoints.len())
        });

        assert!(!cache.is_initialized());
        assert_eq!(builds.load(Ordering::SeqCst), 0);

        assert_eq!(*cache.value().unwrap(), 1);
        assert_eq!(*cache.value().unwrap(), 1);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rebuilds_on_change() {
        let source = Arc::new(DynamicEndpointDataSource::new([endpoint("a")]));
        let cache = DataSourceDependentCache::new(
            Arc::clone(&source) as Arc<dyn EndpointDataSource>,
            |endpoints| Ok(endpoints.len()),
        );
        assert_eq!(*cache.value().unwrap(), 1);

        source.add(endpoint("b"));
        assert!(cache.is_initialized());
        assert_eq!(*cache.value().unwrap(), 2);

        source.add(endpoint("c"));
        assert_eq!(*cache.value().unwrap(), 3);
    }

    #[test]
    fn test_build_error_is_returned_and_retried() {
        let source = Arc::new(DynamicEndpointDataSource::new([endpoint("a")]));
        let cache = DataSourceDependentCache::new(
            Arc::clone(&source) as Arc<dyn EndpointDataSource>,
            |endpoints| {
                if endpoints.len() > 1 {
                    Err(MatchError::UnknownConstraint("too-many".into()).into())
                } else {
                    Ok(endpoints.len())
                }
            },
        );
        assert_eq!(*cache.value().unwrap(), 1);

        source.add(endpoint("b"));
        assert!(!cache.is_initialized());
        assert!(matches!(
            cache.value(),
            Err(RoutingError::Match(MatchError::UnknownConstraint(_)))
        ));

        source.set_endpoints([endpoint("c")]);
        assert_eq!(*cache.value().unwrap(), 1);
    }

    #[test]
    fn test_concurrent_writers_leave_value_current() {
        for _ in 0..20 {
            let source = Arc::new(DynamicEndpointDataSource::default());
            let cache = DataSourceDependentCache::new(
                Arc::clone(&source) as Arc<dyn EndpointDataSource>,
                |endpoints| Ok(endpoints.len()),
            );
            assert_eq!(*cache.value().unwrap(), 0);

            std::thread::scope(|scope| {
                for writer in 0..4 {
                    let source = Arc::clone(&source);
                    scope.spawn(move || {
                        for i in 0..20 {
                            source.add(endpoint(&format!("w{writer}x{i}")));
                        }
                    });
                }
            });

            assert_eq!(*cache.value().unwrap(), 80);
        }
    }

    #[test]
    fn test_source_failure_during_notification() {
        let source = Arc::new(FlakyEndpointSource::new([endpoint("a")]));
        let cache = DataSourceDependentCache::new(
            Arc::clone(&source) as Arc<dyn EndpointDataSource>,
            |endpoints| Ok(endpoints.len()),
        );
        assert_eq!(*cache.value().unwrap(), 1);

        source.set_failing(true);
        source.add(endpoint("b"));
        assert!(matches!(cache.value(), Err(RoutingError::Source(_))));

        source.set_failing(false);
        assert_eq!(*cache.value().unwrap(), 2);

        source.add(endpoint("c"));
        assert_eq!(*cache.value().unwrap(), 3);
    }
}
