use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use crate::bot::Output;
use crate::msg::Msg;

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// Builds the SMTP channel from env. `Ok(None)` when `SMTP_HOST` is
    /// unset (channel disabled); an error when it is set but the rest of
    /// the configuration is broken.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(host) = std::env::var("SMTP_HOST") else {
            tracing::debug!("email disabled (no SMTP_HOST)");
            return Ok(None);
        };
        let user = std::env::var("SMTP_USER").context("SMTP_USER missing")?;
        let pass = std::env::var("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr = std::env::var("NOTIFY_EMAIL_FROM").context("NOTIFY_EMAIL_FROM missing")?;
        let to_addr = std::env::var("NOTIFY_EMAIL_TO").context("NOTIFY_EMAIL_TO missing")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = to_addr.parse().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Some(Self { mailer, from, to }))
    }

    pub(crate) fn render_body(msg: &Msg) -> String {
        let mut body = format!("{}\n\n{}\n", msg.author, msg.text);
        if !msg.link.is_empty() {
            body.push_str(&format!("\n{}\n", msg.link));
        }
        for img in &msg.images {
            body.push_str(&format!("{img}\n"));
        }
        body.push_str(&format!("\n{}\n", msg.ts.to_rfc3339()));
        body
    }
}

#[async_trait]
impl Output for EmailSender {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, msg: &Msg) -> Result<()> {
        let subject = format!("[{}] {}", msg.author, msg.title);
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(Self::render_body(msg))
            .context("build email")?;

        self.mailer.send(email).await.context("send email")?;
        Ok(())
    }
}
