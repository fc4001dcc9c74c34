// Admin authentication proxied to the backend

use hyper::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::response::{error_response, parse_body, relay_json};
use crate::backend::BackendClient;
use crate::http::SiteResponse;
use crate::logger;

/// Fields stay untyped: any truthy JSON value is forwarded as text
#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Value,
    #[serde(default)]
    password: Value,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    #[serde(default)]
    token: Value,
}

/// Text of a truthy value; `null`, `false`, `0` and `""` count as absent
fn present(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_i64() == Some(0) => None,
        other => Some(other.to_string()),
    }
}

/// POST /api/admin/login
pub async fn login(body: &[u8], backend: &BackendClient) -> SiteResponse {
    let request: LoginRequest = match parse_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let (Some(email), Some(password)) = (present(&request.email), present(&request.password))
    else {
        return error_response(StatusCode::BAD_REQUEST, "Email and password are required");
    };

    let reply = match backend.login(&email, &password).await {
        Ok(reply) => reply,
        Err(e) => {
            logger::log_error(&format!("Login error: {e}"));
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    if reply.is_success() {
        return relay_json(StatusCode::OK, &reply);
    }

    let message = match reply.json_value() {
        Some(body) => body
            .get("detail")
            .and_then(|d| d.as_str())
            .filter(|d| !d.is_empty())
            .unwrap_or("Invalid credentials")
            .to_string(),
        None => "Authentication failed".to_string(),
    };
    error_response(reply.status, &message)
}

/// POST /api/admin/verify-token
pub async fn verify_token(body: &[u8], backend: &BackendClient) -> SiteResponse {
    let request: VerifyRequest = match parse_body(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let Some(token) = present(&request.token) else {
        return error_response(StatusCode::BAD_REQUEST, "Token is required");
    };

    match backend.test_token(&token).await {
        Ok(reply) if reply.is_success() => relay_json(StatusCode::OK, &reply),
        Ok(_) => error_response(StatusCode::UNAUTHORIZED, "Invalid token"),
        Err(e) => {
            logger::log_error(&format!("Token verification error: {e}"));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
