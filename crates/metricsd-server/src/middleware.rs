//! Middleware for update-accepting routes.
//!
//! Applied in this order: [`decrypt_body`] then [`trust_filter`]. Both
//! pass requests through untouched when unconfigured.

use std::net::IpAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the original client address, set by the reporter or
/// a trusted proxy.
pub const REAL_IP_HEADER: &str = "X-Real-IP";

/// Largest request body read for decryption.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Replace an RSA-OAEP encrypted body with its plaintext.
pub async fn decrypt_body(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(decryptor) = &state.decryptor else {
        return Ok(next.run(request).await);
    };

    let (parts, body) = request.into_parts();
    let sealed = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    let plain = decryptor.decrypt(&sealed).map_err(|e| {
        tracing::warn!(error = %e, bytes = sealed.len(), "Rejected undecryptable body");
        ApiError::Decrypt(e.to_string())
    })?;

    Ok(next.run(Request::from_parts(parts, Body::from(plain))).await)
}

/// Reject updates whose `X-Real-IP` is absent, unparsable or outside the
/// trusted subnet. IPv4-mapped IPv6 addresses are matched as IPv4.
pub async fn trust_filter(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(subnet) = state.trusted_subnet else {
        return Ok(next.run(request).await);
    };

    let raw = request
        .headers()
        .get(REAL_IP_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let allowed = raw
        .trim()
        .parse::<IpAddr>()
        .is_ok_and(|ip: IpAddr| subnet.contains(&ip.to_canonical()));
    if !allowed {
        tracing::warn!(real_ip = %raw, %subnet, "Source address not allowed");
        return Err(ApiError::Forbidden(format!(
            "source address {raw:?} is not in the trusted subnet"
        )));
    }

    Ok(next.run(request).await)
}
