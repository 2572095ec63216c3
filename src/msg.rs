// src/msg.rs
use chrono::{DateTime, Utc};

/// Which kind of change produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgKind {
    LiveStatus,
    FeedPost,
}

/// Normalized notification record passed from sources to outputs.
/// Immutable once constructed; each output sees it at most once.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Msg {
    pub ts: DateTime<Utc>,
    pub kind: MsgKind,
    pub author: String,
    pub title: String,
    pub text: String,
    pub images: Vec<String>,
    pub link: String,
}
