// src/bili/mod.rs
pub mod classify;
pub mod live;
pub mod space;

use anyhow::{bail, Result};
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::json;

pub(crate) const INFO_URL: &str = "https://api.bilibili.com/x/space/acc/info";
pub(crate) const SPACE_URL: &str =
    "https://api.bilibili.com/x/polymer/web-dynamic/v1/feed/space";
pub(crate) const LIVE_URL_PREFIX: &str = "https://live.bilibili.com/";
pub(crate) const DYNAMIC_URL_PREFIX: &str = "https://t.bilibili.com/";
pub(crate) const VIDEO_URL_PREFIX: &str = "https://www.bilibili.com/video/";
pub(crate) const ARTICLE_URL_PREFIX: &str = "https://www.bilibili.com/read/cv";
pub(crate) const MUSIC_URL_PREFIX: &str = "https://www.bilibili.com/audio/au";

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "relay_poll_errors_total",
            "Transport or payload errors while polling, per source kind."
        );
        describe_counter!(
            "relay_msgs_emitted_total",
            "Messages emitted by sources, per message kind."
        );
        describe_counter!(
            "relay_dynamics_filtered_total",
            "Feed items dropped as already seen or as live announcements."
        );
        describe_gauge!(
            "relay_last_poll_ts",
            "Unix ts of the most recent completed poll tick, per source kind."
        );
    });
}

/// Parse a raw response body; an empty body counts as a fetch failure.
pub(crate) fn parse_payload(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        bail!("empty response body");
    }
    serde_json::from_str(body).map_err(Into::into)
}

/// Split the platform envelope into its `data` subtree, or the upstream
/// application-level error `(code, msg)`.
pub(crate) fn unwrap_data(root: &Value) -> std::result::Result<&Value, (i64, String)> {
    let code = json::i64_at(root, "code");
    if code != 0 {
        return Err((code, json::str_at(root, "msg")));
    }
    Ok(json::at(root, "data"))
}
