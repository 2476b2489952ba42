//! Telegram delivery adapter.
//!
//! Two outbound calls: a photo upload for the rendered report card, and a
//! plain-text send used for status and operator error notifications. The
//! photo upload gets one fallback attempt as a document upload before the
//! failure is surfaced; text sends are best-effort and never propagate.

use std::time::Duration;

use reqwest::multipart;

use report_core::DeliveryError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

const PHOTO_TIMEOUT: Duration = Duration::from_secs(10);
const TEXT_TIMEOUT: Duration = Duration::from_secs(5);

const REPORT_FILENAME: &str = "report.png";
const REPORT_MIME: &str = "image/png";

/// Delivery configuration, constructed at startup and passed in explicitly.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl NotifierConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    /// Point the notifier at a different API host (used by tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    config: NotifierConfig,
}

impl TelegramNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PHOTO_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base, self.config.bot_token, method
        )
    }

    /// Upload the rendered report image with a caption.
    ///
    /// Falls back to a `sendDocument` upload when `sendPhoto` is rejected
    /// (Telegram refuses photos over certain dimensions/sizes). Both failing
    /// is the only delivery error.
    pub async fn send_photo(&self, image: &[u8], caption: &str) -> Result<(), DeliveryError> {
        match self.upload(image, caption, "sendPhoto", "photo").await {
            Ok(()) => Ok(()),
            Err(photo) => {
                tracing::warn!(error = %photo, "sendPhoto failed, retrying as document");
                self.upload(image, caption, "sendDocument", "document")
                    .await
                    .map_err(|fallback| DeliveryError::Exhausted { photo, fallback })
            }
        }
    }

    async fn upload(
        &self,
        image: &[u8],
        caption: &str,
        method: &str,
        part_name: &str,
    ) -> Result<(), String> {
        let part = multipart::Part::bytes(image.to_vec())
            .file_name(REPORT_FILENAME)
            .mime_str(REPORT_MIME)
            .map_err(|e| e.to_string())?;

        let form = multipart::Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption.to_string())
            .part(part_name.to_string(), part);

        let response = self
            .client
            .post(self.method_url(method))
            .timeout(PHOTO_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{method} returned {status}: {body}"));
        }

        tracing::info!(method, "report delivered");
        Ok(())
    }

    /// Best-effort plain-text send. Failures are logged, never returned:
    /// this is also the channel that reports pipeline errors, so it must
    /// not introduce errors of its own.
    pub async fn send_text(&self, message: &str) {
        let payload = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": message,
        });

        let result = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(TEXT_TIMEOUT)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(status = %response.status(), "sendMessage rejected")
            }
            Err(e) => tracing::warn!(error = %e, "sendMessage failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_embeds_token_in_path() {
        let notifier = TelegramNotifier::new(NotifierConfig::new("123:abc", "42"));
        assert_eq!(
            notifier.method_url("sendPhoto"),
            "https://api.telegram.org/bot123:abc/sendPhoto"
        );
    }

    #[test]
    fn api_base_override() {
        let config = NotifierConfig::new("t", "c").with_api_base("http://localhost:8080");
        let notifier = TelegramNotifier::new(config);
        assert_eq!(
            notifier.method_url("sendMessage"),
            "http://localhost:8080/bott/sendMessage"
        );
    }

    #[tokio::test]
    async fn photo_failure_falls_back_to_document() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        use axum::{http::StatusCode, routing::post, Router};

        let document_hits = Arc::new(AtomicUsize::new(0));

        let app = Router::new()
            .route(
                "/bott/sendPhoto",
                post(|| async { (StatusCode::BAD_REQUEST, "photo too large") }),
            )
            .route(
                "/bott/sendDocument",
                post({
                    let hits = document_hits.clone();
                    move || {
                        let hits = hits.clone();
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            "ok"
                        }
                    }
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = NotifierConfig::new("t", "c").with_api_base(format!("http://{addr}"));
        let notifier = TelegramNotifier::new(config);

        // Photo rejected, document accepted: overall success.
        notifier.send_photo(b"png-bytes", "caption").await.unwrap();
        assert_eq!(document_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn photo_failure_reports_both_attempts() {
        // Unroutable host: both sendPhoto and the document fallback fail.
        let config =
            NotifierConfig::new("t", "c").with_api_base("http://127.0.0.1:1");
        let notifier = TelegramNotifier::new(config);

        let err = notifier.send_photo(b"not-a-png", "caption").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Exhausted { .. }));
    }

    #[tokio::test]
    async fn send_text_never_panics_on_failure() {
        let config =
            NotifierConfig::new("t", "c").with_api_base("http://127.0.0.1:1");
        let notifier = TelegramNotifier::new(config);

        // Swallows the connection error.
        notifier.send_text("hello").await;
    }
}
