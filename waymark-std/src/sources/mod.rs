//! # Endpoint Sources
//!
//! Concrete [`EndpointDataSource`](waymark_core::EndpointDataSource)
//! implementations:
//!
//! | Source | Changes | Use Case |
//! |--------|---------|----------|
//! | [`DefaultEndpointDataSource`] | never | Routes known when the table is built |
//! | [`DynamicEndpointDataSource`] | on every mutation | Hot-reloaded configuration, plugins |
//! | `CollectedEndpointDataSource` | never | Routes registered with `inventory::submit!` |
//!
//! [`watch`] turns any source into a stream of snapshots.

mod default;
mod dynamic;
mod watch;

#[cfg(feature = "inventory")]
mod collected;

pub use default::DefaultEndpointDataSource;
pub use dynamic::DynamicEndpointDataSource;
pub use watch::watch;

#[cfg(feature = "inventory")]
pub use collected::{CollectedEndpointDataSource, EndpointRegistration};
