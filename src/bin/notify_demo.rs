//! Demo that pushes a few sample messages through the configured channels
//! (no-op when no channel env vars are set).

use chrono::Utc;

use bili_relay::{EmailSender, Msg, MsgKind, Output, WebhookNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut outputs: Vec<Box<dyn Output>> = Vec::new();
    if let Some(webhook) = WebhookNotifier::from_env() {
        outputs.push(Box::new(webhook));
    }
    if let Some(email) = EmailSender::from_env()? {
        outputs.push(Box::new(email));
    }

    let samples = [
        Msg {
            ts: Utc::now(),
            kind: MsgKind::LiveStatus,
            author: "demo".into(),
            title: "went live".into(),
            text: "title: \"notify demo\"".into(),
            images: vec!["https://example.com/cover.jpg".into()],
            link: "https://live.bilibili.com/100".into(),
        },
        Msg {
            ts: Utc::now(),
            kind: MsgKind::FeedPost,
            author: "demo".into(),
            title: "posted an update".into(),
            text: "hello from notify_demo".into(),
            images: Vec::new(),
            link: "https://t.bilibili.com/111".into(),
        },
    ];

    for msg in &samples {
        for output in &outputs {
            if let Err(e) = output.deliver(msg).await {
                tracing::warn!(output = output.name(), error = ?e, "demo delivery failed");
            }
        }
    }

    println!("notify-demo done");
    Ok(())
}
