//! # Composite Endpoint Source
//!
//! [`CompositeEndpointDataSource`] presents several independently changing
//! sources as one endpoint list with a single change signal.
//!
//! # Snapshot Model
//!
//! The merged list and its change signal live together in one immutable
//! snapshot held by an [`ArcSwap`]. Readers load the snapshot without locking.
//! Writers (first population and change handling) serialize on a guard, build
//! a complete replacement and swap it in whole.
//!
//! When a source changes, the composite recomputes the merge, installs a
//! snapshot carrying a fresh signal, releases the guard and only then fires
//! the signal of the snapshot it replaced. A consumer that re-subscribes from
//! inside its callback therefore lands on the new signal.
//!
//! # Example
//!
//! ```rust,ignore
//! let composite = CompositeEndpointDataSource::new([config_source, collected_source]);
//!
//! let endpoints = composite.endpoints()?;
//! let token = composite.change_token()?;
//! token.register(|| println!("routes changed"));
//! ```

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use waymark_core::{
    ChangeSubscription, ChangeToken, ChangeTrigger, Endpoint, EndpointDataSource, EndpointList,
    SourceError, change, on_change,
};

struct Snapshot {
    // `None` until populated, and again after a failed recompute.
    endpoints: Option<EndpointList>,
    token: ChangeToken,
    trigger: ChangeTrigger,
}

impl Snapshot {
    fn unpopulated() -> Self {
        let (trigger, token) = change::channel();
        Self {
            endpoints: None,
            token,
            trigger,
        }
    }

    fn rotated(endpoints: Option<EndpointList>) -> Self {
        let (trigger, token) = change::channel();
        Self {
            endpoints,
            token,
            trigger,
        }
    }

    fn with_endpoints(&self, endpoints: Option<EndpointList>) -> Self {
        Self {
            endpoints,
            token: self.token.clone(),
            trigger: self.trigger.clone(),
        }
    }
}

#[derive(Default)]
struct GuardState {
    subscribed: bool,
    subscriptions: Vec<ChangeSubscription>,
}

struct Shared {
    sources: Vec<Arc<dyn EndpointDataSource>>,
    snapshot: ArcSwap<Snapshot>,
    guard: Mutex<GuardState>,
}

impl Shared {
    fn merge(&self) -> Result<EndpointList, SourceError> {
        let mut merged: Vec<Endpoint> = Vec::new();
        for source in &self.sources {
            merged.extend(source.endpoints()?.iter().cloned());
        }
        Ok(merged.into())
    }

    fn ensure_populated(self: &Arc<Self>) -> Result<Arc<Snapshot>, SourceError> {
        let current = self.snapshot.load_full();
        if current.endpoints.is_some() {
            return Ok(current);
        }

        let (installed, initial_tokens) = {
            let mut guard = self.guard.lock();

            let current = self.snapshot.load_full();
            if current.endpoints.is_some() {
                return Ok(current);
            }

            // Tokens are taken before the merge so a change racing with it
            // is still observed.
            let initial_tokens = if guard.subscribed {
                None
            } else {
                let tokens = self
                    .sources
                    .iter()
                    .map(|source| source.change_token())
                    .collect::<Result<Vec<_>, _>>()?;
                Some(tokens)
            };

            let endpoints = self.merge()?;

            #[cfg(feature = "tracing")]
            tracing::debug!(
                sources = self.sources.len(),
                endpoints = endpoints.len(),
                "Populated composite endpoint source"
            );

            let installed = Arc::new(current.with_endpoints(Some(endpoints)));
            self.snapshot.store(Arc::clone(&installed));
            if initial_tokens.is_some() {
                guard.subscribed = true;
            }
            (installed, initial_tokens)
        };

        // Subscribing can run a callback inline when a token has already
        // fired, so it happens without the guard.
        if let Some(tokens) = initial_tokens {
            let subscriptions = self.subscribe(tokens);
            let mut guard = self.guard.lock();
            if guard.subscribed {
                guard.subscriptions.extend(subscriptions);
            } else {
                // A source failed while we were subscribing and reset us.
                drop(guard);
                for subscription in subscriptions {
                    subscription.cancel();
                }
            }
        }

        Ok(installed)
    }

    fn subscribe(self: &Arc<Self>, tokens: Vec<ChangeToken>) -> Vec<ChangeSubscription> {
        self.sources
            .iter()
            .zip(tokens)
            .map(|(source, initial)| {
                let source = Arc::clone(source);
                let mut initial = Some(initial);
                let on_error = Arc::downgrade(self);
                let on_notify = Arc::downgrade(self);

                on_change(
                    move || {
                        if let Some(token) = initial.take() {
                            return Some(token);
                        }
                        match source.change_token() {
                            Ok(token) => Some(token),
                            Err(err) => {
                                #[cfg(feature = "tracing")]
                                tracing::warn!(
                                    error = %err,
                                    "Failed to re-subscribe to endpoint source; composite will resubscribe on next read"
                                );
                                #[cfg(not(feature = "tracing"))]
                                let _ = err;
                                if let Some(shared) = on_error.upgrade() {
                                    shared.reset_subscriptions();
                                }
                                None
                            }
                        }
                    },
                    move || {
                        if let Some(shared) = on_notify.upgrade() {
                            shared.handle_change();
                        }
                    },
                )
            })
            .collect()
    }

    fn handle_change(&self) {
        let previous = {
            let guard = self.guard.lock();

            // After a failed re-subscription the next read must subscribe
            // again, so nothing is cached.
            let endpoints = if !guard.subscribed {
                None
            } else {
                match self.merge() {
                    Ok(endpoints) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            endpoints = endpoints.len(),
                            "Endpoint source changed; composite rotated"
                        );
                        Some(endpoints)
                    }
                    Err(err) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            error = %err,
                            "Failed to recompute composite endpoints; next read will retry"
                        );
                        #[cfg(not(feature = "tracing"))]
                        let _ = err;
                        None
                    }
                }
            };

            self.snapshot.swap(Arc::new(Snapshot::rotated(endpoints)))
        };

        previous.trigger.fire();
    }

    fn reset_subscriptions(&self) {
        let cancelled = {
            let mut guard = self.guard.lock();
            guard.subscribed = false;
            let current = self.snapshot.load_full();
            self.snapshot.store(Arc::new(current.with_endpoints(None)));
            std::mem::take(&mut guard.subscriptions)
        };
        for subscription in cancelled {
            subscription.cancel();
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        for subscription in self.guard.get_mut().subscriptions.drain(..) {
            subscription.cancel();
        }
    }
}

/// Merges several endpoint sources into one cached, change-notifying list.
///
/// Endpoints appear in source order, each source contributing its own list
/// in its own order. The merge runs on first access and once per upstream
/// change, never per read.
///
/// Upstream errors propagate unchanged from [`endpoints`](Self::endpoints)
/// and [`change_token`](Self::change_token); nothing is cached when
/// population fails, so the next call tries again.
#[derive(Clone)]
pub struct CompositeEndpointDataSource {
    shared: Arc<Shared>,
}

impl CompositeEndpointDataSource {
    /// Create a composite over `sources`.
    ///
    /// The first change signal is created here; merging waits for the first
    /// read. An empty list is valid and yields no endpoints.
    pub fn new<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn EndpointDataSource>>,
    {
        Self {
            shared: Arc::new(Shared {
                sources: sources.into_iter().collect(),
                snapshot: ArcSwap::from_pointee(Snapshot::unpopulated()),
                guard: Mutex::new(GuardState::default()),
            }),
        }
    }

    /// The wrapped sources, in merge order.
    pub fn sources(&self) -> &[Arc<dyn EndpointDataSource>] {
        &self.shared.sources
    }

    /// The merged endpoints.
    pub fn endpoints(&self) -> Result<EndpointList, SourceError> {
        {
            let snapshot = self.shared.snapshot.load();
            if let Some(endpoints) = &snapshot.endpoints {
                return Ok(Arc::clone(endpoints));
            }
        }
        self.shared
            .ensure_populated()?
            .endpoints
            .clone()
            .ok_or_else(|| SourceError::Unavailable("composite is not populated".into()))
    }

    /// A token that fires the next time any source changes.
    pub fn change_token(&self) -> Result<ChangeToken, SourceError> {
        {
            let snapshot = self.shared.snapshot.load();
            if snapshot.endpoints.is_some() {
                return Ok(snapshot.token.clone());
            }
        }
        Ok(self.shared.ensure_populated()?.token.clone())
    }
}

impl EndpointDataSource for CompositeEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointList, SourceError> {
        CompositeEndpointDataSource::endpoints(self)
    }

    fn change_token(&self) -> Result<ChangeToken, SourceError> {
        CompositeEndpointDataSource::change_token(self)
    }
}

// Diagnostic rendering; not a stable format.
impl fmt::Display for CompositeEndpointDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let endpoints = match self.endpoints() {
            Ok(endpoints) => endpoints,
            Err(err) => return write!(f, "CompositeEndpointDataSource <error: {err}>"),
        };

        writeln!(
            f,
            "CompositeEndpointDataSource ({} sources, {} endpoints)",
            self.shared.sources.len(),
            endpoints.len()
        )?;
        for endpoint in endpoints.iter() {
            write!(f, "  {}", endpoint.pattern())?;
            if let Some(name) = endpoint.display_name() {
                write!(f, " \"{name}\"")?;
            }
            writeln!(
                f,
                " order={} precedence={}",
                endpoint.order(),
                endpoint.pattern().inbound_precedence()
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for CompositeEndpointDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.shared.snapshot.load();
        f.debug_struct("CompositeEndpointDataSource")
            .field("sources", &self.shared.sources.len())
            .field(
                "endpoints",
                &snapshot.endpoints.as_ref().map(|endpoints| endpoints.len()),
            )
            .field("token", &snapshot.token)
            .finish()
    }
}
