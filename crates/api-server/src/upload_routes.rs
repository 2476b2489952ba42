//! Report upload endpoint.
//!
//! One POST route: multipart upload in, extraction -> render -> Telegram
//! delivery, human-readable status string out.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Router,
};
use chrono::Utc;

use report_core::Metrics;

use crate::{AppError, AppState};

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_report))
}

async fn upload_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<&'static str, AppError> {
    let raw = read_file_part(&mut multipart).await?;

    match process_report(&state, &raw).await {
        Ok(()) => Ok("Report processed"),
        Err(description) => {
            tracing::error!(%description, "report pipeline failed");
            state
                .notifier
                .send_text(&format!("Report processing failed: {description}"))
                .await;
            Err(AppError::Pipeline(description))
        }
    }
}

/// Pull the uploaded report text out of the multipart body. Upload bytes are
/// assumed UTF-8; anything else is replaced rather than rejected.
async fn read_file_part(multipart: &mut Multipart) -> Result<String, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Input("No file uploaded"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        if field.file_name().is_some_and(str::is_empty) {
            return Err(AppError::Input("No file selected"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|_| AppError::Input("No file uploaded"))?;
        if data.is_empty() {
            return Err(AppError::Input("No file selected"));
        }

        return Ok(String::from_utf8_lossy(&data).into_owned());
    }

    Err(AppError::Input("No file uploaded"))
}

async fn process_report(state: &AppState, raw: &str) -> Result<(), String> {
    let metrics = metrics_extractor::extract(raw).map_err(|e| e.to_string())?;
    tracing::info!(
        period = %metrics.period,
        total = metrics.total_trades,
        trades = metrics.trades.len(),
        "report extracted"
    );

    let image = report_renderer::render(&metrics, Utc::now()).map_err(|e| e.to_string())?;

    state
        .notifier
        .send_photo(&image, &summary_caption(&metrics))
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}

fn summary_caption(metrics: &Metrics) -> String {
    format!(
        "Trading report ({}): {} trades, win rate {:.1}%, net {:+.1} pips",
        metrics.period, metrics.total_trades, metrics.win_rate, metrics.net_result
    )
}
