// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod bili;
pub mod bot;
pub mod config;
pub mod fetch;
pub mod json;
pub mod metrics;
pub mod msg;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::bot::{Bot, Output, Source};
pub use crate::msg::{Msg, MsgKind};
pub use crate::notify::{EmailSender, WebhookNotifier};
