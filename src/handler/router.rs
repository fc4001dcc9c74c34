//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, health probes,
//! site API routes, the edge rewrite, pages and static assets, in that order.

use crate::api;
use crate::config::AppState;
use crate::edge::EdgeDecision;
use crate::handler::static_files;
use crate::http::{self, SiteResponse};
use crate::logger::{self, AccessLogEntry};
use crate::pages;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::{Method, Request};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const LIVENESS_PATH: &str = "/healthz";
const READINESS_PATH: &str = "/readyz";

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    peer: SocketAddr,
    state: Arc<AppState>,
) -> Result<SiteResponse, Infallible> {
    let started = Instant::now();
    let access_log = state.access_log_enabled();
    let mut entry = access_log.then(|| {
        AccessLogEntry::from_request(peer, req.method(), req.uri(), req.version(), req.headers())
    });

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let (response, upstream) = match read_body(req, state.config.http.max_body_size).await {
        Ok(req) => dispatch(req, &state).await,
        Err(resp) => (resp, None),
    };

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.upstream = upstream;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Buffer the request body, answering 413 past `max_body_size`
async fn read_body(
    req: Request<Incoming>,
    max_body_size: u64,
) -> Result<Request<Bytes>, SiteResponse> {
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return Err(resp);
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(Request::from_parts(parts, collected.to_bytes())),
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            Err(http::build_413_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(req: &Request<Incoming>, max_body_size: u64) -> Option<SiteResponse> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Route a buffered request; also returns the backend URL when the edge forwarded it
pub async fn dispatch(req: Request<Bytes>, state: &AppState) -> (SiteResponse, Option<String>) {
    let path = req.uri().path();

    // 0. Health check endpoints (highest priority, always fast)
    if path == LIVENESS_PATH || path == READINESS_PATH {
        return (http::build_health_response("ok"), None);
    }

    // 1. Site-owned API routes
    if let Some(resp) = api::route(&req, state).await {
        return (resp, None);
    }

    // 2. Backend surfaces
    if let EdgeDecision::Rewrite(rewrite) = state.edge.decide(req.uri(), req.headers()) {
        let destination = rewrite.destination.clone();
        let (parts, body) = req.into_parts();
        let resp = state.edge.forward(rewrite, parts.method, body).await;
        return (resp, Some(destination));
    }

    // 3. Pages and assets are read-only
    let is_head = req.method() == Method::HEAD;
    match *req.method() {
        Method::GET | Method::HEAD => {}
        Method::OPTIONS => return (http::build_options_response(state.config.http.enable_cors), None),
        ref method => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            return (http::build_405_response("GET, HEAD, OPTIONS"), None);
        }
    }

    if let Some(resp) = pages::render(req.uri(), state, is_head).await {
        return (resp, None);
    }

    let if_none_match = req
        .headers()
        .get("if-none-match")
        .and_then(|v| v.to_str().ok());
    if let Some(resp) =
        static_files::serve_asset(&state.config.content.public_dir, path, if_none_match, is_head)
            .await
    {
        return (resp, None);
    }

    (pages::not_found(is_head), None)
}
