// src/bili/live.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::bili::{ensure_metrics_described, parse_payload, unwrap_data, INFO_URL, LIVE_URL_PREFIX};
use crate::bot::Source;
use crate::fetch::Fetcher;
use crate::json;
use crate::msg::{Msg, MsgKind};

/// Watches live-broadcast status for a fixed set of accounts and emits one
/// message per observed transition.
pub struct LiveSource {
    uids: Vec<u64>,
    /// Last *successfully observed* status per account; absent means the
    /// account was never successfully polled and counts as offline.
    living: HashMap<u64, bool>,
    fetcher: Arc<dyn Fetcher>,
    interval: Duration,
}

#[derive(Debug, Default)]
struct LiveInfo {
    code: i64,
    msg: String,
    uname: String,
    living: bool,
    room_id: i64,
    title: String,
    cover: String,
}

async fn fetch_live_info(fetcher: &dyn Fetcher, uid: u64) -> Result<LiveInfo> {
    let body = fetcher
        .get(INFO_URL, &[("mid", uid.to_string())])
        .await?;
    let root = parse_payload(&body).context("read bili resp data")?;
    let data = match unwrap_data(&root) {
        Ok(data) => data,
        Err((code, msg)) => {
            return Ok(LiveInfo {
                code,
                msg,
                ..LiveInfo::default()
            })
        }
    };
    let uname = json::str_at(data, "name");
    if !json::exists(data, "live_room") {
        return Ok(LiveInfo {
            code: 400,
            msg: "no live_room field in response".to_string(),
            uname,
            ..LiveInfo::default()
        });
    }
    Ok(LiveInfo {
        code: 0,
        msg: String::new(),
        uname,
        living: json::i64_at(data, "live_room.liveStatus") == 1,
        room_id: json::i64_at(data, "live_room.roomid"),
        title: json::str_at(data, "live_room.title"),
        cover: json::str_at(data, "live_room.cover"),
    })
}

impl LiveSource {
    pub fn new(uids: Vec<u64>, fetcher: Arc<dyn Fetcher>, interval: Duration) -> Self {
        ensure_metrics_described();
        tracing::info!(?uids, "watching bilibili live status");
        Self {
            uids,
            living: HashMap::new(),
            fetcher,
            interval,
        }
    }

    /// One poll pass over every tracked account. Returns false once the
    /// receiving end of the pipeline is gone.
    pub async fn poll_once(&mut self, now: DateTime<Utc>, tx: &mpsc::Sender<Msg>) -> bool {
        for &uid in &self.uids {
            let info = match fetch_live_info(self.fetcher.as_ref(), uid).await {
                Ok(info) => info,
                Err(e) => {
                    tracing::error!(uid, error = ?e, "fetching live status failed");
                    counter!("relay_poll_errors_total", "source" => "live").increment(1);
                    continue;
                }
            };
            // Same status as last recorded means the transition was already
            // announced.
            if info.code == 0 && info.living == self.living.get(&uid).copied().unwrap_or(false) {
                tracing::debug!(uid, living = info.living, "live status unchanged");
                continue;
            }
            let msg = if info.code != 0 {
                tracing::warn!(uid, code = info.code, msg = %info.msg, "upstream error fetching live status");
                Msg {
                    ts: now,
                    kind: MsgKind::LiveStatus,
                    author: info.uname,
                    title: "failed to fetch live status".to_string(),
                    text: format!("[error] {}, code={}", info.msg, info.code),
                    images: Vec::new(),
                    link: String::new(),
                }
            } else if info.living {
                self.living.insert(uid, true);
                tracing::debug!(uid, name = %info.uname, "live room opened");
                Msg {
                    ts: now,
                    kind: MsgKind::LiveStatus,
                    author: info.uname,
                    title: "went live".to_string(),
                    text: format!("title: \"{}\"", info.title),
                    images: vec![info.cover],
                    link: format!("{}{}", LIVE_URL_PREFIX, info.room_id),
                }
            } else {
                self.living.insert(uid, false);
                tracing::debug!(uid, name = %info.uname, "live room closed");
                Msg {
                    ts: now,
                    kind: MsgKind::LiveStatus,
                    author: info.uname,
                    title: "went offline".to_string(),
                    text: "😭😭😭".to_string(),
                    images: Vec::new(),
                    link: String::new(),
                }
            };
            counter!("relay_msgs_emitted_total", "kind" => "live_status").increment(1);
            if tx.send(msg).await.is_err() {
                return false;
            }
        }
        gauge!("relay_last_poll_ts", "source" => "live").set(now.timestamp() as f64);
        true
    }
}

#[async_trait]
impl Source for LiveSource {
    async fn run(&mut self, cancel: CancellationToken, tx: mpsc::Sender<Msg>) {
        // First poll lands one full interval after startup.
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("stopping bilibili live status watcher");
                    return;
                }
                _ = ticker.tick() => {
                    if !self.poll_once(Utc::now(), &tx).await {
                        return;
                    }
                }
            }
        }
    }
}
