use std::sync::Arc;
use waymark_core::{ChangeToken, Endpoint, EndpointDataSource, EndpointList, SourceError};

/// A fixed list of endpoints that never changes.
#[derive(Debug, Clone)]
pub struct DefaultEndpointDataSource {
    endpoints: EndpointList,
}

impl DefaultEndpointDataSource {
    /// Create a source over `endpoints`.
    pub fn new<I: IntoIterator<Item = Endpoint>>(endpoints: I) -> Self {
        Self {
            endpoints: endpoints.into_iter().collect::<Vec<_>>().into(),
        }
    }
}

impl Default for DefaultEndpointDataSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl EndpointDataSource for DefaultEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointList, SourceError> {
        Ok(Arc::clone(&self.endpoints))
    }

    fn change_token(&self) -> Result<ChangeToken, SourceError> {
        Ok(ChangeToken::never())
    }
}
