// src/bili/space.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::bili::classify::{parse_dynamic, DynamicInfo};
use crate::bili::{ensure_metrics_described, parse_payload, unwrap_data, SPACE_URL};
use crate::bot::Source;
use crate::fetch::Fetcher;
use crate::json;
use crate::msg::{Msg, MsgKind};

/// Watches the dynamic feed of a fixed set of accounts and emits one
/// message per new post.
pub struct SpaceSource {
    uids: Vec<u64>,
    /// Newest publish time already emitted (or implied seen) per account,
    /// unix seconds. Monotonically non-decreasing.
    last_seen: HashMap<u64, i64>,
    fetcher: Arc<dyn Fetcher>,
    interval: Duration,
}

impl SpaceSource {
    pub fn new(uids: Vec<u64>, fetcher: Arc<dyn Fetcher>, interval: Duration) -> Self {
        ensure_metrics_described();
        tracing::info!(?uids, "watching bilibili dynamic feeds");
        Self {
            uids,
            last_seen: HashMap::new(),
            fetcher,
            interval,
        }
    }

    /// One poll pass over every tracked account. Returns false once the
    /// receiving end of the pipeline is gone.
    pub async fn poll_once(&mut self, now: DateTime<Utc>, tx: &mpsc::Sender<Msg>) -> bool {
        let floor_secs = self.interval.as_secs() as i64;
        for &uid in &self.uids {
            let infos = match poll_account(
                self.fetcher.as_ref(),
                &mut self.last_seen,
                floor_secs,
                uid,
                now,
            )
            .await
            {
                Ok(infos) => infos,
                Err(e) => {
                    tracing::error!(uid, error = ?e, "fetching dynamics failed");
                    counter!("relay_poll_errors_total", "source" => "space").increment(1);
                    continue;
                }
            };
            if infos.is_empty() {
                tracing::debug!(uid, "no new dynamics");
            }
            for info in infos {
                tracing::debug!(uid, author = %info.author, link = %info.link, "new dynamic");
                counter!("relay_msgs_emitted_total", "kind" => "feed_post").increment(1);
                let msg = Msg {
                    ts: DateTime::from_timestamp(info.ts, 0).unwrap_or(now),
                    kind: MsgKind::FeedPost,
                    author: info.author,
                    title: info.kind.label().to_string(),
                    text: info.text,
                    images: info.images,
                    link: info.link,
                };
                if tx.send(msg).await.is_err() {
                    return false;
                }
            }
        }
        gauge!("relay_last_poll_ts", "source" => "space").set(now.timestamp() as f64);
        true
    }
}

/// Fetch one account's feed page and return the items newer than its
/// watermark, in platform order. Advances the watermark to the newest
/// publish time seen in the batch, counting filtered items too; on the
/// first poll the watermark floor is `now - interval` so an account's
/// whole history does not flood the pipeline at startup.
async fn poll_account(
    fetcher: &dyn Fetcher,
    last_seen: &mut HashMap<u64, i64>,
    floor_secs: i64,
    uid: u64,
    now: DateTime<Utc>,
) -> Result<Vec<DynamicInfo>> {
    let body = fetcher
        .get(
            SPACE_URL,
            &[
                ("offset", String::new()),
                ("host_mid", uid.to_string()),
                ("timezone_offset", "-480".to_string()),
            ],
        )
        .await?;
    let root = parse_payload(&body).context("read bili resp data")?;
    let data =
        unwrap_data(&root).map_err(|(code, msg)| anyhow!("upstream error: {msg}, code={code}"))?;
    let items = json::array_at(data, "items");

    let mut fresh = Vec::with_capacity(items.len());
    let mut newest = 0i64;
    let mut last = last_seen.get(&uid).copied().unwrap_or(0);
    if last == 0 {
        last = now.timestamp() - floor_secs;
    }
    for item in items {
        let Some(info) = parse_dynamic(item, 0) else {
            tracing::warn!(uid, "dynamic item did not classify");
            continue;
        };
        if info.kind.is_live_announcement() {
            // The live poller already announces this.
            tracing::debug!(uid, author = %info.author, "ignoring live announcement dynamic");
            counter!("relay_dynamics_filtered_total", "reason" => "live_announcement")
                .increment(1);
            continue;
        }
        newest = newest.max(info.ts);
        if info.ts > last {
            fresh.push(info);
        } else {
            tracing::debug!(uid, link = %info.link, "filtering already seen dynamic");
            counter!("relay_dynamics_filtered_total", "reason" => "seen").increment(1);
        }
    }
    last = last.max(newest);
    last_seen.insert(uid, last);
    Ok(fresh)
}

#[async_trait]
impl Source for SpaceSource {
    async fn run(&mut self, cancel: CancellationToken, tx: mpsc::Sender<Msg>) {
        // First poll lands one full interval after startup.
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("stopping bilibili dynamic watcher");
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
