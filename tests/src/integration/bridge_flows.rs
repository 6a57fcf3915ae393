//! # Bridge Flows
//!
//! The coordinator owns a session store. Views ask it to change the store
//! over messaging; a store observer pushes every change back to all views.

#[cfg(test)]
mod tests {
    use crate::integration::within;
    use cb_01_messaging::{
        define_protocol, HandlerError, HandlerMap, ListenerConfig, MessageListener, Messenger,
        RuntimeChannel,
    };
    use cb_02_storage::{Store, StoreContext};
    use cb_telemetry::{try_init_logging, TelemetryConfig};
    use serde::{Deserialize, Serialize};
    use shared_bus::InMemoryRuntime;
    use shared_types::TargetId;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct SessionState {
        count: i64,
    }

    define_protocol! {
        pub protocol CounterProtocol: CounterCalls {
            increment => Increment("increment"): i64 => i64;
        }
    }

    define_protocol! {
        pub protocol ViewProtocol: ViewCalls {
            count_changed => CountChanged("countChanged"): i64 => ();
        }
    }

    struct Coordinator {
        store: Arc<Store<SessionState>>,
        _listener: MessageListener<CounterProtocol>,
    }

    fn start_coordinator(runtime: &InMemoryRuntime, storage: &StoreContext) -> Coordinator {
        let store = Arc::new(
            storage
                .session_store("session", SessionState { count: 0 }, false)
                .unwrap(),
        );

        let counter = store.clone();
        let handlers = HandlerMap::<CounterProtocol>::new().on::<Increment, _, _>(move |ctx| {
            let store = counter.clone();
            async move {
                let current: i64 = store
                    .get("count")
                    .await
                    .map_err(HandlerError::msg)?;
                let next = current + ctx.data;
                store
                    .set("count", Some(next))
                    .await
                    .map_err(HandlerError::msg)?;
                ctx.respond(next)
            }
        });

        let port: Arc<dyn RuntimeChannel> = Arc::new(runtime.coordinator());
        let notifier = Messenger::<ViewProtocol>::to_views(port.clone());
        store
            .observe::<i64, _>("count", move |change| {
                let Some(count) = change.new_value else {
                    return;
                };
                let notifier = notifier.clone();
                tokio::spawn(async move {
                    let _ = notifier.call_all::<CountChanged>(count).await;
                });
            })
            .unwrap();

        let listener = MessageListener::new(port, ListenerConfig::background(), handlers);
        listener.listen();

        Coordinator {
            store,
            _listener: listener,
        }
    }

    fn start_view(
        port: Arc<dyn RuntimeChannel>,
        id: TargetId,
        seen: mpsc::UnboundedSender<(TargetId, i64)>,
    ) -> MessageListener<ViewProtocol> {
        let handlers = HandlerMap::<ViewProtocol>::new().on::<CountChanged, _, _>(move |ctx| {
            let _ = seen.send((id, ctx.data));
            async move { ctx.respond(()) }
        });
        let listener = MessageListener::new(port, ListenerConfig::view(), handlers);
        listener.listen();
        listener
    }

    #[tokio::test]
    async fn test_store_change_reaches_every_view() {
        try_init_logging(&TelemetryConfig::for_context("bridge-tests"));

        let runtime = InMemoryRuntime::new();
        let storage = StoreContext::in_memory();
        let coordinator = start_coordinator(&runtime, &storage);
        coordinator.store.initialize().await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
        let _views = vec![
            start_view(
                Arc::new(runtime.target(1, "https://example.com/1")),
                1,
                tx.clone(),
            ),
            start_view(
                Arc::new(runtime.target(2, "https://example.com/2")),
                2,
                tx.clone(),
            ),
            start_view(page.clone(), 0, tx),
        ];

        let counter = Messenger::<CounterProtocol>::to_background(page);
        assert_eq!(within(counter.increment(5)).await.unwrap(), 5);

        // The initial 0 may or may not reach views opened after it.
        let mut seen = Vec::new();
        while seen.len() < 3 {
            let (id, count) = within(rx.recv()).await.unwrap();
            if count == 5 {
                seen.push(id);
            }
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);

        let extra = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(!matches!(extra, Ok(Some((_, 5)))));
    }

    #[tokio::test]
    async fn test_sequential_increments_accumulate() {
        let runtime = InMemoryRuntime::new();
        let storage = StoreContext::in_memory();
        let coordinator = start_coordinator(&runtime, &storage);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
        let _view = start_view(page.clone(), 0, tx);

        let counter = Messenger::<CounterProtocol>::to_background(page);
        assert_eq!(within(counter.increment(1)).await.unwrap(), 1);
        assert_eq!(within(counter.increment(2)).await.unwrap(), 3);

        assert_eq!(
            coordinator.store.get_all().await.unwrap(),
            SessionState { count: 3 }
        );

        // Initialization to 0, then 1, then 3. Notifications are independent
        // tasks, so arrival order is not fixed.
        let mut counts = Vec::new();
        for _ in 0..3 {
            counts.push(within(rx.recv()).await.unwrap().1);
        }
        counts.sort_unstable();
        assert_eq!(counts, vec![0, 1, 3]);
    }
}
