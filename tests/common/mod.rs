// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use bili_relay::fetch::Fetcher;

/// Returns canned bodies in order, one per `get` call; `Err` entries model
/// transport failures. Tests keep an `Arc` clone to push more responses
/// between polls.
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_ok(&self, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(body.into()));
    }

    pub fn push_err(&self, err: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Err(err.into()));
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, _url: &str, _query: &[(&str, String)]) -> Result<String> {
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(body)) => Ok(body),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("scripted fetcher exhausted")),
        }
    }
}

pub fn acc_info_body(name: &str, live_status: i64, roomid: i64, title: &str, cover: &str) -> String {
    json!({
        "code": 0,
        "data": {
            "name": name,
            "live_room": {
                "liveStatus": live_status,
                "roomid": roomid,
                "title": title,
                "cover": cover,
            },
        },
    })
    .to_string()
}

pub fn upstream_error_body(code: i64, msg: &str) -> String {
    json!({"code": code, "msg": msg}).to_string()
}

pub fn space_body(items: Vec<Value>) -> String {
    json!({"code": 0, "data": {"items": items}}).to_string()
}

pub fn word_item(id: &str, author: &str, text: &str, ts: i64) -> Value {
    json!({
        "type": "DYNAMIC_TYPE_WORD",
        "id_str": id,
        "modules": {
            "module_author": {"name": author, "pub_ts": ts},
            "module_dynamic": {"desc": {"text": text}},
        },
    })
}

pub fn live_rcmd_item(id: &str, author: &str, title: &str, ts: i64) -> Value {
    let content = json!({"live_play_info": {"title": title, "cover": "c.jpg"}}).to_string();
    json!({
        "type": "DYNAMIC_TYPE_LIVE_RCMD",
        "id_str": id,
        "modules": {
            "module_author": {"name": author, "pub_ts": ts},
            "module_dynamic": {"major": {"live_rcmd": {"content": content}}},
        },
    })
}
