// API response utility functions module

use crate::backend::BackendReply;
use crate::http::SiteResponse;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Build JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> SiteResponse {
    match serde_json::to_vec(body) {
        Ok(json) => raw_json(status, Bytes::from(json)),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            raw_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(br#"{"error":"Internal server error"}"#),
            )
        }
    }
}

/// `{"error": message}` with the given status
pub fn error_response(status: StatusCode, message: &str) -> SiteResponse {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// 405 with an `Allow` header
pub fn method_not_allowed(allow: &'static str) -> SiteResponse {
    let mut resp = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    resp.headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static(allow));
    resp
}

/// Relay a backend JSON body unchanged; a body that is not JSON becomes a 500
pub fn relay_json(status: StatusCode, reply: &BackendReply) -> SiteResponse {
    match serde_json::from_slice::<serde_json::Value>(&reply.body) {
        Ok(_) => raw_json(status, reply.body.clone()),
        Err(e) => {
            logger::log_error(&format!("Backend returned invalid JSON: {e}"));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Parse a request body, answering 500 with the parser message on failure
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, SiteResponse> {
    serde_json::from_slice(body).map_err(|e| {
        logger::log_warning(&format!("Malformed JSON body: {e}"));
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
    })
}

fn raw_json(status: StatusCode, body: Bytes) -> SiteResponse {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-store")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            Response::new(Full::new(Bytes::from("Error")))
        })
}
