//! # Messaging Flows
//!
//! A coordinator and several foreground views exchanging typed calls over the
//! in-memory runtime.
//!
//! ## Flows Tested
//!
//! 1. **View → Coordinator**: `openNewTab` round trip and its wire shape
//! 2. **Coordinator → Views**: direct sends plus one broadcast, aggregated
//! 3. **Self-filtering**: envelopes for another tag are never handled
//! 4. **Sender identity**: handlers see the channel-reported sender

#[cfg(test)]
mod tests {
    use crate::integration::within;
    use cb_01_messaging::{
        define_protocol, Destination, HandlerError, HandlerFailure, HandlerMap, ListenerConfig,
        MessageListener, MessagingError, Messenger, RuntimeChannel,
    };
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use shared_bus::{Acknowledgement, InMemoryRuntime, ReplySender};
    use shared_types::{DeliveryError, Endpoint, Envelope, SenderInfo, TargetId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct OpenTabRequest {
        pub url: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct OpenTabResponse {
        #[serde(rename = "tabId")]
        pub tab_id: u32,
    }

    define_protocol! {
        /// Calls served by the coordinator.
        pub protocol TabProtocol: TabCalls {
            open_new_tab => OpenNewTab("openNewTab"): OpenTabRequest => OpenTabResponse;
            who_am_i => WhoAmI("whoAmI"): () => SenderInfo;
        }
    }

    define_protocol! {
        /// Calls served by views.
        pub protocol ViewProtocol: ViewCalls {
            refresh => Refresh("refresh"): String => TargetId;
        }
    }

    fn coordinator_handlers() -> HandlerMap<TabProtocol> {
        HandlerMap::new()
            .on::<OpenNewTab, _, _>(|ctx| async move {
                if ctx.data.url.is_empty() {
                    return Err(HandlerError::msg("empty url"));
                }
                ctx.respond(OpenTabResponse { tab_id: 7 })
            })
            .on::<WhoAmI, _, _>(|ctx| async move {
                let sender = ctx.sender.clone();
                ctx.respond(sender)
            })
    }

    fn start_coordinator(runtime: &InMemoryRuntime) -> MessageListener<TabProtocol> {
        let port: Arc<dyn RuntimeChannel> = Arc::new(runtime.coordinator());
        let listener = MessageListener::new(port, ListenerConfig::background(), coordinator_handlers());
        listener.listen();
        listener
    }

    fn start_view(
        port: Arc<dyn RuntimeChannel>,
        id: TargetId,
        calls: Arc<AtomicUsize>,
    ) -> MessageListener<ViewProtocol> {
        let handlers = HandlerMap::<ViewProtocol>::new().on::<Refresh, _, _>(move |ctx| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                if ctx.data == format!("reject-{id}") {
                    return Err(HandlerError::msg("refresh rejected"));
                }
                ctx.respond(id)
            }
        });
        let listener = MessageListener::new(port, ListenerConfig::view(), handlers);
        listener.listen();
        listener
    }

    // =============================================================================
    // VIEW → COORDINATOR
    // =============================================================================

    #[tokio::test]
    async fn test_open_new_tab_from_view() {
        let runtime = InMemoryRuntime::new();
        let _coordinator = start_coordinator(&runtime);

        let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
        let messenger = Messenger::<TabProtocol>::to_background(page);

        let opened = within(messenger.open_new_tab(OpenTabRequest {
            url: "https://example.com".to_string(),
        }))
        .await
        .unwrap();

        assert_eq!(opened, OpenTabResponse { tab_id: 7 });
        assert_eq!(serde_json::to_value(&opened).unwrap(), json!({ "tabId": 7 }));
    }

    #[tokio::test]
    async fn test_envelope_wire_shape() {
        let runtime = InMemoryRuntime::new();
        let _coordinator = start_coordinator(&runtime);

        let coordinator_port = runtime.coordinator();
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        let _tap = coordinator_port.on_receive(Arc::new(
            move |envelope: Envelope, _sender: SenderInfo, _reply: ReplySender| {
                let _ = tx.send(serde_json::to_value(&envelope).unwrap_or(Value::Null));
                Acknowledgement::Ignored
            },
        ));

        let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
        let messenger = Messenger::<TabProtocol>::to_background(page);
        within(messenger.open_new_tab(OpenTabRequest {
            url: "https://example.com".to_string(),
        }))
        .await
        .unwrap();

        let wire = within(rx.recv()).await.unwrap();
        assert_eq!(
            wire,
            json!({
                "name": "openNewTab",
                "data": { "url": "https://example.com" },
                "from": "VIEW",
                "to": "BACKGROUND",
            })
        );
    }

    #[tokio::test]
    async fn test_handler_sees_target_sender() {
        let runtime = InMemoryRuntime::new();
        let _coordinator = start_coordinator(&runtime);

        let tab: Arc<dyn RuntimeChannel> = Arc::new(runtime.target(4, "https://example.com/4"));
        let messenger = Messenger::<TabProtocol>::to_background(tab);

        let sender = within(messenger.who_am_i(())).await.unwrap();
        assert_eq!(sender.endpoint, Endpoint::View);
        assert_eq!(sender.target_id, Some(4));
        assert_eq!(sender.url.as_deref(), Some("https://example.com/4"));
    }

    #[tokio::test]
    async fn test_handler_failure_stays_in_coordinator() {
        let runtime = InMemoryRuntime::new();
        let port: Arc<dyn RuntimeChannel> = Arc::new(runtime.coordinator());
        let (tx, mut rx) = mpsc::unbounded_channel::<HandlerFailure>();
        let listener =
            MessageListener::new(port, ListenerConfig::background(), coordinator_handlers())
                .with_error_sink(move |failure: &HandlerFailure| {
                    let _ = tx.send(failure.clone());
                });
        listener.listen();

        let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
        let messenger = Messenger::<TabProtocol>::to_background(page);

        let result = within(messenger.open_new_tab(OpenTabRequest { url: String::new() })).await;
        assert_eq!(result, Err(MessagingError::Delivery(DeliveryError::PortClosed)));

        let failure = within(rx.recv()).await.unwrap();
        assert_eq!(failure.operation, "openNewTab");
        assert_eq!(failure.error, HandlerError::Failed("empty url".to_string()));

        // Still serving.
        let opened = within(messenger.open_new_tab(OpenTabRequest { url: "x".into() }))
            .await
            .unwrap();
        assert_eq!(opened.tab_id, 7);
    }

    // =============================================================================
    // SELF-FILTERING
    // =============================================================================

    #[tokio::test]
    async fn test_background_ignores_envelopes_for_views() {
        let runtime = InMemoryRuntime::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let port: Arc<dyn RuntimeChannel> = Arc::new(runtime.coordinator());
        let counted = calls.clone();
        let handlers = HandlerMap::<TabProtocol>::new().on::<OpenNewTab, _, _>(move |ctx| {
            counted.fetch_add(1, Ordering::SeqCst);
            async move { ctx.respond(OpenTabResponse { tab_id: 1 }) }
        });
        let listener = MessageListener::new(port, ListenerConfig::background(), handlers);
        listener.listen();

        let page = runtime.page();
        let envelope = Envelope::new(
            "openNewTab",
            json!({ "url": "https://example.com" }),
            Endpoint::Background,
            Endpoint::View,
        );
        let result = within(page.send(envelope)).await;

        assert_eq!(result, Err(DeliveryError::PortClosed));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // =============================================================================
    // COORDINATOR → VIEWS
    // =============================================================================

    struct Fleet {
        runtime: InMemoryRuntime,
        calls: Arc<AtomicUsize>,
        _views: Vec<MessageListener<ViewProtocol>>,
    }

    fn open_fleet(ids: &[TargetId]) -> Fleet {
        let runtime = InMemoryRuntime::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut views = Vec::new();
        for &id in ids {
            let port: Arc<dyn RuntimeChannel> =
                Arc::new(runtime.target(id, &format!("https://example.com/{id}")));
            views.push(start_view(port, id, calls.clone()));
        }
        // An extension page: reachable only by broadcast.
        let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
        views.push(start_view(page, 0, calls.clone()));

        Fleet {
            runtime,
            calls,
            _views: views,
        }
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_view_once() {
        let fleet = open_fleet(&[1, 2, 3]);
        let coordinator: Arc<dyn RuntimeChannel> = Arc::new(fleet.runtime.coordinator());
        let messenger = Messenger::<ViewProtocol>::to_views(coordinator);

        let mut replies = within(messenger.call_all::<Refresh>("now".to_string()))
            .await
            .unwrap();
        replies.sort_unstable();

        assert_eq!(replies, vec![0, 1, 2, 3]);
        assert_eq!(fleet.runtime.stats().direct_sends(), 3);
        assert_eq!(fleet.runtime.stats().broadcasts(), 1);
        assert_eq!(fleet.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fan_out_single_failure_rejects_aggregate() {
        let fleet = open_fleet(&[1, 2, 3]);
        let coordinator: Arc<dyn RuntimeChannel> = Arc::new(fleet.runtime.coordinator());
        let messenger = Messenger::<ViewProtocol>::to_views(coordinator)
            .with_destination(Destination::AllViews);

        let result = within(messenger.refresh("reject-3".to_string())).await;

        assert_eq!(result, Err(MessagingError::Delivery(DeliveryError::PortClosed)));
        assert_eq!(fleet.runtime.stats().direct_sends(), 3);

        // Views still answering after the rejection are reached all the same.
        within(async {
            while fleet.calls.load(Ordering::SeqCst) < 4 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await;
    }

    #[tokio::test]
    async fn test_direct_send_to_one_tab() {
        let fleet = open_fleet(&[1, 2, 3]);
        let coordinator: Arc<dyn RuntimeChannel> = Arc::new(fleet.runtime.coordinator());
        let messenger = Messenger::<ViewProtocol>::to_views(coordinator);

        let id = within(messenger.call_target::<Refresh>(2, "now".to_string()))
            .await
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(fleet.calls.load(Ordering::SeqCst), 1);

        let missing = within(messenger.call_target::<Refresh>(42, "now".to_string())).await;
        assert_eq!(
            missing,
            Err(MessagingError::Delivery(DeliveryError::UnknownTarget(42)))
        );
    }

    #[tokio::test]
    async fn test_closed_tab_drops_out_of_fan_out() {
        let fleet = open_fleet(&[1]);
        let closing = fleet.runtime.target(2, "https://example.com/2");
        closing.disconnect();

        let coordinator: Arc<dyn RuntimeChannel> = Arc::new(fleet.runtime.coordinator());
        let messenger = Messenger::<ViewProtocol>::to_views(coordinator);
        let replies = within(messenger.call_all::<Refresh>("now".to_string()))
            .await
            .unwrap();

        assert_eq!(replies, vec![1, 0]);
        assert_eq!(fleet.runtime.stats().direct_sends(), 1);
    }
}
