//! # Endpoint Sources
//!
//! An endpoint source provides the current list of endpoints and a change
//! token that fires when that list is replaced. Sources are read by the
//! composite aggregation layer and by anything that caches derived state.

use crate::{change::ChangeToken, endpoint::Endpoint, error::SourceError};
use std::sync::Arc;

/// An immutable snapshot of endpoints.
pub type EndpointList = Arc<[Endpoint]>;

/// A provider of endpoints with change notification.
///
/// # Contract
///
/// - `endpoints` returns the current snapshot, in the source's own order.
/// - `change_token` returns a token that fires once the snapshot returned by
///   `endpoints` is out of date.
/// - When the list changes, the replacement token must be in place before the
///   old token fires, so that callbacks asking for "the current token" get
///   the new one.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an endpoint source",
    label = "missing `EndpointDataSource` implementation",
    note = "Implement `endpoints` and `change_token` to provide endpoints."
)]
pub trait EndpointDataSource: Send + Sync {
    /// The current endpoints.
    fn endpoints(&self) -> Result<EndpointList, SourceError>;

    /// A token that fires when [`endpoints`](Self::endpoints) changes.
    fn change_token(&self) -> Result<ChangeToken, SourceError>;
}

impl<T: EndpointDataSource + ?Sized> EndpointDataSource for Arc<T> {
    fn endpoints(&self) -> Result<EndpointList, SourceError> {
        (**self).endpoints()
    }

    fn change_token(&self) -> Result<ChangeToken, SourceError> {
        (**self).change_token()
    }
}

impl<T: EndpointDataSource + ?Sized> EndpointDataSource for Box<T> {
    fn endpoints(&self) -> Result<EndpointList, SourceError> {
        (**self).endpoints()
    }

    fn change_token(&self) -> Result<ChangeToken, SourceError> {
        (**self).change_token()
    }
}
