use axum::http::HeaderMap;

use coinbot_domain::RuntimeConfig;

use crate::error::HttpError;

/// Header accepted from older operator tooling in place of a bearer token.
pub const LEGACY_TOKEN_HEADER: &str = "token";

/// Checks the bearer token (or the legacy `token` header) against the
/// configured server token. Without a configured token nothing is allowed.
pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> Result<(), HttpError> {
    let presented = extract_bearer(headers).or_else(|| extract_legacy(headers));
    let Some(presented) = presented else {
        return Err(HttpError::TokenRequired);
    };
    match &config.server_token {
        Some(expected) if *expected == presented => Ok(()),
        _ => Err(HttpError::InvalidToken),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn extract_legacy(headers: &HeaderMap) -> Option<String> {
    let token = headers.get(LEGACY_TOKEN_HEADER)?.to_str().ok()?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
