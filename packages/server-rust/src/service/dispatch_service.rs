//! `tower::Service` face of the [`Dispatcher`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::Service;
use tracing::Instrument;

use super::dispatcher::{DispatchError, DispatchReceipt, Dispatcher};

type DispatchFuture = Pin<Box<dyn Future<Output = Result<DispatchReceipt, DispatchError>> + Send>>;

/// Innermost service of the dispatch pipeline: raw request body in,
/// [`DispatchReceipt`] out.
///
/// Each call runs on its own tokio task. Dropping the returned future (for
/// example because the client hung up) detaches the task instead of
/// cancelling it, so a request that reached the store is still published.
#[derive(Clone)]
pub struct DispatchService {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchService {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl Service<Bytes> for DispatchService {
    type Response = DispatchReceipt;
    type Error = DispatchError;
    type Future = DispatchFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, body: Bytes) -> Self::Future {
        let dispatcher = Arc::clone(&self.dispatcher);
        // Carry the caller's span so the dispatch span nests under it.
        let task = tokio::spawn(
            async move { dispatcher.dispatch_bytes(&body).await }.in_current_span(),
        );
        Box::pin(async move {
            task.await
                .map_err(|e| DispatchError::Internal(format!("dispatch task failed: {e}")))?
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;
    use tower::ServiceExt;
    use tracing::span::{Attributes, Id};
    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    use super::*;
    use crate::service::test_support::{dispatcher, ScriptedPublisher, ScriptedStore};

    #[tokio::test]
    async fn runs_dispatch_for_body() {
        let store = Arc::new(ScriptedStore::with_ids(&["r1"]));
        let publisher = Arc::new(ScriptedPublisher::default());
        let svc = DispatchService::new(Arc::new(dispatcher(&store, &publisher)));

        let receipt = svc
            .oneshot(Bytes::from_static(
                br#"{"module":"alpha-fold","requester":{"email":"a@b.com"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(receipt.request_id, "r1");
    }

    #[tokio::test]
    async fn dropped_caller_does_not_cancel_dispatch() {
        let store = Arc::new(ScriptedStore::with_ids(&["r1"]));
        let publisher = Arc::new(ScriptedPublisher::default());
        let mut svc = DispatchService::new(Arc::new(dispatcher(&store, &publisher)));

        let fut = svc.call(Bytes::from_static(
            br#"{"module":"data-science","requester":{"email":"a@b.com"}}"#,
        ));
        drop(fut);

        for _ in 0..100 {
            if publisher.call_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(store.append_calls(), 1);
        assert_eq!(publisher.call_count(), 1);
    }

    /// Records `(span, parent)` name pairs as spans are created.
    #[derive(Clone, Default)]
    struct ParentRecorder(Arc<Mutex<Vec<(&'static str, Option<&'static str>)>>>);

    impl<S> Layer<S> for ParentRecorder
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, _attrs: &Attributes<'_>, id: &Id, ctx: LayerContext<'_, S>) {
            if let Some(span) = ctx.span(id) {
                let parent = span.parent().map(|p| p.name());
                self.0.lock().push((span.name(), parent));
            }
        }
    }

    #[tokio::test]
    async fn dispatch_span_nests_under_caller_span() {
        let recorder = ParentRecorder::default();
        let subscriber = tracing_subscriber::registry().with(recorder.clone());
        let _default = tracing::subscriber::set_default(subscriber);

        let store = Arc::new(ScriptedStore::with_ids(&["r1"]));
        let publisher = Arc::new(ScriptedPublisher::default());
        let svc = DispatchService::new(Arc::new(dispatcher(&store, &publisher)));

        svc.oneshot(Bytes::from_static(
            br#"{"module":"genomics-dsub","requester":{"email":"a@b.com"}}"#,
        ))
        .instrument(tracing::info_span!("launch"))
        .await
        .unwrap();

        let spans = recorder.0.lock().clone();
        assert!(
            spans.contains(&("dispatch", Some("launch"))),
            "dispatch span lost its parent: {spans:?}"
        );
    }
}
