use futures::{Stream, stream};
use std::sync::Arc;
use waymark_core::{ChangeToken, EndpointDataSource, EndpointList, SourceError};

/// Stream every snapshot of `source`: the current one first, then one per
/// change.
///
/// Changes that happen while the consumer is busy collapse into a single
/// item carrying the latest list. The stream ends after yielding the first
/// error.
///
/// # Example
///
/// ```rust,ignore
/// let mut snapshots = Box::pin(watch(Arc::new(composite)));
/// while let Some(endpoints) = snapshots.next().await {
///     rebuild_index(&endpoints?);
/// }
/// ```
pub fn watch<S>(source: Arc<S>) -> impl Stream<Item = Result<EndpointList, SourceError>> + Send
where
    S: EndpointDataSource + ?Sized + 'static,
{
    stream::unfold(Some((source, None::<ChangeToken>)), |state| async move {
        let (source, pending) = state?;
        if let Some(token) = pending {
            token.changed().await;
        }

        // The token is taken before the list so that no change slips between.
        let next = match source.change_token() {
            Ok(token) => token,
            Err(err) => return Some((Err(err), None)),
        };
        match source.endpoints() {
            Ok(endpoints) => Some((Ok(endpoints), Some((source, Some(next))))),
            Err(err) => Some((Err(err), None)),
        }
    })
}
