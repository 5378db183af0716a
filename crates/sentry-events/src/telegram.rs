//! Concrete `AlertDispatcher`: Telegram Bot API `sendPhoto`, matching
//! §6's `TELEGRAM_BOT_TOKEN`/`TELEGRAM_CHAT_ID` environment contract. Wire
//! details beyond the one call this core makes are unspecified collaborator
//! territory; this adapter is the minimal real client, not the spec.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use sentry_models::{MotionEvent, ThreatLevel};
use tracing::warn;

use crate::dispatcher::AlertDispatcher;
use crate::error::{EventsError, EventsResult};

pub struct TelegramDispatcher {
    http: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramDispatcher {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn caption(&self, event: &MotionEvent, threat_level: ThreatLevel) -> String {
        format!(
            "{} {} detected on camera {} at {}",
            threat_level.emoji(),
            event.object_class.as_deref().unwrap_or("motion"),
            event.camera_id,
            event.timestamp.to_rfc3339(),
        )
    }
}

#[async_trait]
impl AlertDispatcher for TelegramDispatcher {
    async fn send_alert(&self, event: &MotionEvent, image: Option<Bytes>, threat_level: ThreatLevel) -> EventsResult<()> {
        let url = format!("https://api.telegram.org/bot{}/sendPhoto", self.bot_token);
        let caption = self.caption(event, threat_level);

        let form = match image {
            Some(jpeg) => Form::new()
                .text("chat_id", self.chat_id.clone())
                .text("caption", caption)
                .part("photo", Part::bytes(jpeg.to_vec()).file_name("frame.jpg")),
            None => {
                warn!(event_id = %event.id, "no image available for Telegram alert, sending caption only");
                Form::new().text("chat_id", self.chat_id.clone()).text("caption", caption)
            }
        };

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EventsError::Dispatch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EventsError::Dispatch(format!("Telegram API returned {}", response.status())));
        }
        Ok(())
    }
}
