// Blog post lookups relayed from the backend

use super::tours::relay_lookup;
use crate::backend::{BackendClient, BLOG_POSTS_PATH};
use crate::http::SiteResponse;

/// GET /api/blog-posts, pagination query forwarded as-is
pub async fn list(backend: &BackendClient, query: Option<&str>) -> SiteResponse {
    let path = match query {
        Some(q) => format!("{BLOG_POSTS_PATH}?{q}"),
        None => BLOG_POSTS_PATH.to_string(),
    };
    relay_lookup(backend.get(&path).await, None)
}

/// GET /api/blog-posts/{slug}
pub async fn detail(backend: &BackendClient, slug: &str) -> SiteResponse {
    let path = format!("{BLOG_POSTS_PATH}{slug}");
    relay_lookup(backend.get(&path).await, Some("Blog post not found"))
}
