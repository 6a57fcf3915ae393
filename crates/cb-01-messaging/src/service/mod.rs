//! # Messaging Service
//!
//! - `messenger` - sending side (calls, direct sends, fan-out)
//! - `handlers` - per-context handler table
//! - `listener` - receiving side with guarded dispatch
//! - `watcher` - reply-less observers of one operation

mod handlers;
mod listener;
mod messenger;
mod watcher;


pub use handlers::HandlerMap;
pub use listener::{ListenerState, MessageListener};
pub use messenger::Messenger;
pub use watcher::MessageWatcher;
