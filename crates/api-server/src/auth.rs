use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::{AppError, AppState};

#[cfg(test)]
#[path = "auth_tests.rs"]
mod auth_tests;

const SECRET_HEADER: &str = "X-Upload-Secret";

/// Hash a secret with SHA-256 so the comparison runs over fixed-length hex
/// strings and the secret value never sits in a timing-observable compare.
fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn secret_matches(provided: &str, expected: &str) -> bool {
    hash_secret(provided) == hash_secret(expected)
}

/// Shared-secret authentication middleware.
///
/// Every route except the health probe requires the `X-Upload-Secret`
/// header to equal the configured secret.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || !secret_matches(provided, &state.config.upload_secret) {
        tracing::warn!("Upload rejected: bad or missing secret");
        return Err(AppError::Auth("Invalid upload secret"));
    }

    Ok(next.run(request).await)
}
