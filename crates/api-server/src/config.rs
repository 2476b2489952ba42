//! Process configuration, read once at startup.

/// Placeholder values so the service starts out of the box. Anything left at
/// its default is unusable against the real Telegram API and gets a warning
/// at startup.
const DEFAULT_BOT_TOKEN: &str = "your-telegram-token";
const DEFAULT_CHAT_ID: &str = "your-chat-id";
const DEFAULT_UPLOAD_SECRET: &str = "change-me";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
    pub upload_secret: String,
    pub port: u16,
}

impl AppConfig {
    /// Load from environment variables, falling back to the insecure
    /// defaults above.
    pub fn from_env() -> Self {
        Self {
            telegram_bot_token: env_or("TELEGRAM_BOT_TOKEN", DEFAULT_BOT_TOKEN),
            telegram_chat_id: env_or("TELEGRAM_CHAT_ID", DEFAULT_CHAT_ID),
            upload_secret: env_or("UPLOAD_SECRET", DEFAULT_UPLOAD_SECRET),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }

    pub fn warn_on_insecure_defaults(&self) {
        if self.telegram_bot_token == DEFAULT_BOT_TOKEN {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, deliveries will fail");
        }
        if self.telegram_chat_id == DEFAULT_CHAT_ID {
            tracing::warn!("TELEGRAM_CHAT_ID not set, deliveries will fail");
        }
        if self.upload_secret == DEFAULT_UPLOAD_SECRET {
            tracing::warn!("UPLOAD_SECRET left at its default value");
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
