//! Event sink configuration (§6).

use std::time::Duration;

/// Runtime configuration for the event sink and alert dispatcher.
#[derive(Debug, Clone)]
pub struct EventsConfig {
    /// Directory annotated frames and forensic thumbnails are written under.
    pub frame_dir: String,
    /// Path handed to the storage collaborator; the core never opens a
    /// schema against it directly.
    pub database_path: String,
    /// Per-action-type alert cooldown window (§4.8).
    pub cooldown: Duration,
    /// Telegram bot token; `None` falls back to the in-memory dispatcher.
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            frame_dir: "./data/frames".to_string(),
            database_path: "./data/sentry.db".to_string(),
            cooldown: Duration::from_secs(30),
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

impl EventsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            frame_dir: std::env::var("FRAME_DIR").unwrap_or(defaults.frame_dir),
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            cooldown: Duration::from_secs(
                std::env::var("TELEGRAM_COOLDOWN_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok(),
        }
    }

    /// Both credentials present, matching the YOLO/recognition `_ENABLED`
    /// feature-toggle idiom (§6) via presence rather than a separate flag.
    pub fn telegram_configured(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }
}
