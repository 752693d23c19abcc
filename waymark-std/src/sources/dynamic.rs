use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use waymark_core::{
    ChangeToken, ChangeTrigger, Endpoint, EndpointDataSource, EndpointList, SourceError, change,
};

struct Current {
    endpoints: EndpointList,
    token: ChangeToken,
    trigger: ChangeTrigger,
}

impl Current {
    fn new(endpoints: EndpointList) -> Self {
        let (trigger, token) = change::channel();
        Self {
            endpoints,
            token,
            trigger,
        }
    }
}

/// An endpoint list that can be replaced at runtime.
///
/// Every mutation installs the new list together with a fresh change token,
/// then fires the token it replaced. Readers never block writers and never
/// observe a partially applied mutation.
///
/// # Example
///
/// ```rust,ignore
/// let source = DynamicEndpointDataSource::new([health]);
/// source.add(products);
/// source.remove_where(|e| e.display_name() == Some("health"));
/// ```
pub struct DynamicEndpointDataSource {
    current: ArcSwap<Current>,
    writer: Mutex<()>,
}

impl DynamicEndpointDataSource {
    /// Create a source holding `endpoints`.
    pub fn new<I: IntoIterator<Item = Endpoint>>(endpoints: I) -> Self {
        Self {
            current: ArcSwap::from_pointee(Current::new(
                endpoints.into_iter().collect::<Vec<_>>().into(),
            )),
            writer: Mutex::new(()),
        }
    }

    /// Number of endpoints currently held.
    pub fn len(&self) -> usize {
        self.current.load().endpoints.len()
    }

    /// Returns true if no endpoints are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every endpoint.
    pub fn set_endpoints<I: IntoIterator<Item = Endpoint>>(&self, endpoints: I) {
        let endpoints: Vec<Endpoint> = endpoints.into_iter().collect();
        self.update(move |_| endpoints);
    }

    /// Append one endpoint.
    pub fn add(&self, endpoint: Endpoint) {
        self.update(move |current| {
            let mut next = current.to_vec();
            next.push(endpoint);
            next
        });
    }

    /// Remove every endpoint matching `predicate`, returning how many were
    /// removed. Nothing fires when nothing matched.
    pub fn remove_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&Endpoint) -> bool,
    {
        let (previous, removed) = {
            let _writer = self.writer.lock();
            let current = self.current.load();
            let kept: Vec<Endpoint> = current
                .endpoints
                .iter()
                .filter(|endpoint| !predicate(endpoint))
                .cloned()
                .collect();
            let removed = current.endpoints.len() - kept.len();
            if removed == 0 {
                return 0;
            }
            (self.current.swap(Arc::new(Current::new(kept.into()))), removed)
        };
        previous.trigger.fire();
        removed
    }

    fn update<F>(&self, build: F)
    where
        F: FnOnce(&[Endpoint]) -> Vec<Endpoint>,
    {
        let previous = {
            let _writer = self.writer.lock();
            let next = build(&self.current.load().endpoints);

            #[cfg(feature = "tracing")]
            tracing::debug!(endpoints = next.len(), "Dynamic endpoint source updated");

            self.current.swap(Arc::new(Current::new(next.into())))
        };
        previous.trigger.fire();
    }
}

impl Default for DynamicEndpointDataSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EndpointDataSource for DynamicEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointList, SourceError> {
        Ok(Arc::clone(&self.current.load().endpoints))
    }

    fn change_token(&self) -> Result<ChangeToken, SourceError> {
        Ok(self.current.load().token.clone())
    }
}

impl fmt::Debug for DynamicEndpointDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicEndpointDataSource")
            .field("endpoints", &self.len())
            .finish()
    }
}
