//! Endpoints registered at link time through `inventory`.

use std::sync::{Arc, OnceLock};
use waymark_core::{ChangeToken, Endpoint, EndpointDataSource, EndpointList, SourceError};

/// A link-time endpoint registration.
///
/// Submit one with `inventory::submit!`; every registration in the final
/// binary is picked up by [`CollectedEndpointDataSource`].
///
/// # Example
///
/// ```rust,ignore
/// fn health() -> Endpoint {
///     Endpoint::new(RoutePattern::builder().literal("health").build().unwrap())
/// }
///
/// inventory::submit! { EndpointRegistration::new(health) }
/// ```
pub struct EndpointRegistration {
    /// Builds the endpoint.
    pub factory: fn() -> Endpoint,
    /// Position among collected endpoints (lower comes first).
    pub rank: i32,
}

impl EndpointRegistration {
    /// A registration with rank `0`.
    pub const fn new(factory: fn() -> Endpoint) -> Self {
        Self { factory, rank: 0 }
    }

    /// A registration with an explicit rank.
    pub const fn with_rank(factory: fn() -> Endpoint, rank: i32) -> Self {
        Self { factory, rank }
    }
}

inventory::collect!(EndpointRegistration);

/// Endpoints gathered from every [`EndpointRegistration`] in the binary.
///
/// Registrations are materialized on first read and ordered by rank; the
/// list never changes afterwards.
#[derive(Debug, Default)]
pub struct CollectedEndpointDataSource {
    endpoints: OnceLock<EndpointList>,
}

impl CollectedEndpointDataSource {
    /// Create the source. Nothing is collected until the first read.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registrations linked into the binary.
    pub fn registration_count() -> usize {
        inventory::iter::<EndpointRegistration>().count()
    }

    fn collect() -> EndpointList {
        let mut registrations: Vec<&EndpointRegistration> =
            inventory::iter::<EndpointRegistration>().collect();
        registrations.sort_by_key(|registration| registration.rank);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            registrations = registrations.len(),
            "Collected endpoint registrations"
        );

        registrations
            .into_iter()
            .map(|registration| (registration.factory)())
            .collect::<Vec<_>>()
            .into()
    }
}

impl EndpointDataSource for CollectedEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointList, SourceError> {
        Ok(Arc::clone(self.endpoints.get_or_init(Self::collect)))
    }

    fn change_token(&self) -> Result<ChangeToken, SourceError> {
        Ok(ChangeToken::never())
    }
}
