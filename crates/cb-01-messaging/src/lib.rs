//! # Typed Messaging (cb-01)
//!
//! Request/response calls between isolated contexts (one long-lived
//! coordinator, many short-lived foreground instances) over a broadcast
//! primitive that returns one reply per send.
//!
//! ## Architecture
//!
//! ```text
//! Foreground (VIEW)                          Coordinator (BACKGROUND)
//! ┌──────────────────┐   Envelope{to: BG}   ┌──────────────────────┐
//! │ Messenger<P>     │ ───── broadcast ───→ │ MessageListener<P>   │
//! │  .open_new_tab() │                      │  filter by `to`      │
//! │                  │ ←──── one reply ──── │  HandlerMap<P>       │
//! └──────────────────┘                      └──────────────────────┘
//! ```
//!
//! ## Routing Rules
//!
//! | Rule | Description |
//! |------|-------------|
//! | Self-filtering | A listener ignores envelopes whose `to` is not its own tag (or `ALL`) |
//! | One handler per name | Registering twice replaces the first handler |
//! | Guarded handlers | Handler errors and panics never cross the boundary |
//! | Fan-out | `AllViews` sends directly to each enumerable target plus one broadcast |
//!
//! ## Crate Structure
//!
//! - `domain/` - operation definitions, destinations, config, errors
//! - `ports/` - handler contract (inbound), channel and error sink (outbound)
//! - `service/` - messenger, listener, handler table, watcher
//!
//! ## Usage
//!
//! ```ignore
//! use cb_01_messaging::{define_protocol, HandlerMap, ListenerConfig, MessageListener, Messenger};
//!
//! define_protocol! {
//!     pub protocol TabProtocol: TabCalls {
//!         open_new_tab => OpenNewTab("openNewTab"): OpenTab => OpenedTab;
//!     }
//! }
//!
//! // Coordinator
//! let handlers = HandlerMap::new().on::<OpenNewTab, _, _>(|ctx| async move {
//!     ctx.respond(OpenedTab { tab_id: 7 })
//! });
//! let listener = MessageListener::new(coordinator, ListenerConfig::background(), handlers);
//! listener.listen();
//!
//! // Foreground
//! let messenger = Messenger::<TabProtocol>::to_background(page);
//! let opened = messenger.open_new_tab(OpenTab { url }).await?;
//! ```

pub mod domain;
mod macros;
pub mod ports;
pub mod service;

pub use domain::{
    ConfigError, Destination, HandlerError, ListenerConfig, MessagingError, Operation, Protocol,
    ENDPOINT_ENV_VAR,
};
pub use ports::{ErrorSink, Handler, HandlerContext, HandlerFailure, Reply, RuntimeChannel};
pub use service::{HandlerMap, ListenerState, MessageListener, MessageWatcher, Messenger};

pub use shared_types::{Endpoint, SenderInfo, TargetId};
