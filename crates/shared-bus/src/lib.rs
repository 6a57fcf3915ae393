//! # Shared Bus - Runtime Channel for Cross-Context Messaging
//!
//! The broadcast primitive every context talks through.
//!
//! ## Delivery Model
//!
//! ```text
//! ┌──────────────┐   send()          ┌──────────────┐
//! │ Foreground   │ ────────┐         │ Coordinator  │
//! │  (VIEW)      │         │         │ (BACKGROUND) │
//! └──────────────┘         ▼         └──────────────┘
//!                   ┌──────────────┐        ↑
//!                   │   Runtime    │ ───────┘  every subscription
//!                   │   Channel    │           filters by `to`
//!                   └──────────────┘
//!                          │ send_to(target)
//!                          ▼
//!                   ┌──────────────┐
//!                   │ Target-hosted│
//!                   │   instance   │
//!                   └──────────────┘
//! ```
//!
//! - **One reply per send:** the first reply wins; later replies are dropped.
//! - **Per-sender order:** each subscription drains a FIFO queue.
//! - **One path per context:** broadcasts never reach target-hosted instances;
//!   those are only reachable through `send_to`.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod runtime;
pub mod subscriber;

// Re-export main types
pub use channel::{Acknowledgement, EnvelopeListener, ReplySender, RuntimeChannel};
pub use runtime::{ContextKind, ContextPort, InMemoryRuntime, RuntimeStats};
pub use subscriber::Subscription;
