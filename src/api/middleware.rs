//! API Middleware
//!
//! Caller identity and request logging middleware.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::domain::OperationContext;
use crate::error::AppError;

/// Header carrying the authenticated user id, set by the upstream gateway
pub const REQUEST_USER_HEADER: &str = "X-Request-User-Id";

/// Header carrying an optional caller-supplied correlation id
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

/// Longest user id accepted from the gateway
const MAX_USER_ID_LEN: usize = 128;

/// Request user from X-Request-User-Id header
#[derive(Debug, Clone)]
pub struct RequestUser {
    pub user_id: String,
}

// =========================================================================
// Request User Middleware
// =========================================================================

/// Resolve the caller from X-Request-User-Id and build the operation context.
///
/// Authentication happens upstream; this layer only refuses requests that
/// arrive without an identity. It runs outside the logging layer so request
/// logs carry the correlation id.
pub async fn request_user_middleware(
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = match headers
        .get(REQUEST_USER_HEADER)
        .map(|v| v.to_str().map(str::trim))
    {
        Some(Ok(id)) if id.is_empty() => {
            return Err(AppError::InvalidUserId("value is empty".to_string()));
        }
        Some(Ok(id)) if id.len() > MAX_USER_ID_LEN => {
            return Err(AppError::InvalidUserId(format!(
                "longer than {} characters",
                MAX_USER_ID_LEN
            )));
        }
        Some(Ok(id)) => id.to_string(),
        Some(Err(_)) => {
            return Err(AppError::InvalidUserId("not valid ASCII".to_string()));
        }
        None => {
            return Err(AppError::MissingHeader(REQUEST_USER_HEADER.to_string()));
        }
    };

    // Extract correlation ID or generate new one
    let correlation_id = headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let mut context = OperationContext::new()
        .with_request_user(user_id.clone())
        .with_correlation_id(correlation_id);

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        context = context.with_client_ip(addr.ip());
    }

    request.extensions_mut().insert(RequestUser { user_id });
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let context = request
        .extensions()
        .get::<OperationContext>()
        .cloned()
        .unwrap_or_default();
    let correlation_id = context.correlation_id;

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = ?correlation_id,
        request_user_id = ?context.request_user_id,
        client_ip = ?context.client_ip,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        headers.insert("x-request-user-id", "user-123".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let auth = masked.iter().find(|(k, _)| k == "authorization");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let user_id = masked.iter().find(|(k, _)| k == "x-request-user-id");

        assert_eq!(auth.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(user_id.unwrap().1, "user-123");
    }

    #[test]
    fn test_sensitive_headers_list() {
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(SENSITIVE_HEADERS.contains(&"cookie"));
        assert!(!SENSITIVE_HEADERS.contains(&"x-request-user-id"));
    }
}
