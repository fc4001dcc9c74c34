// Tour schedule lookups relayed from the backend

use hyper::StatusCode;

use super::response::{error_response, relay_json};
use crate::backend::{BackendClient, BackendReply, TOURS_PATH};
use crate::http::SiteResponse;

/// Relay a successful reply, map 404 to `not_found` and anything else to a 500
pub(super) fn relay_lookup(
    result: Result<BackendReply, crate::backend::BackendError>,
    not_found: Option<&str>,
) -> SiteResponse {
    let reply = match result {
        Ok(reply) => reply,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };
    match (reply.status, not_found) {
        (status, _) if status.is_success() => relay_json(StatusCode::OK, &reply),
        (StatusCode::NOT_FOUND, Some(message)) => error_response(StatusCode::NOT_FOUND, message),
        (status, _) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Backend responded with status: {}", status.as_u16()),
        ),
    }
}

/// GET /api/tours
pub async fn list(backend: &BackendClient) -> SiteResponse {
    relay_lookup(backend.get(TOURS_PATH).await, None)
}

/// GET /api/tours/{slug}/{date_id}
pub async fn detail(backend: &BackendClient, slug: &str, date_id: &str) -> SiteResponse {
    let path = format!("{TOURS_PATH}{slug}/{date_id}");
    relay_lookup(backend.get(&path).await, Some("Tour not found"))
}
