//! Static asset serving module
//!
//! Files under the public directory with MIME detection, `ETag`
//! revalidation and `index.html` lookup for directories.

use crate::http::{self, cache, mime, SiteResponse};
use crate::logger;
use hyper::body::Bytes;
use std::path::Path;
use tokio::fs;

const INDEX_FILE: &str = "index.html";

/// Serve a file from `public_dir`; `None` when nothing matches
pub async fn serve_asset(
    public_dir: &str,
    path: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> Option<SiteResponse> {
    let (content, content_type) = load_from_directory(public_dir, path).await?;
    Some(build_static_file_response(
        content,
        content_type,
        if_none_match,
        is_head,
    ))
}

/// Load a file below `static_dir`, rejecting paths that escape it
pub async fn load_from_directory(static_dir: &str, path: &str) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let relative_path = path.trim_start_matches('/').replace("..", "");
    let mut file_path = Path::new(static_dir).join(&relative_path);

    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_debug(&format!(
                "Public directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    if file_path.is_dir() {
        file_path = file_path.join(INDEX_FILE);
    }

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }
    if !file_path_canonical.is_file() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path.display(),
                e
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
    Some((content, content_type))
}

/// Build static file response with `ETag` support
fn build_static_file_response(
    data: Vec<u8>,
    content_type: &str,
    if_none_match: Option<&str>,
    is_head: bool,
) -> SiteResponse {
    let etag = cache::generate_etag(&data);

    // Check if client has cached version
    if cache::check_etag_match(if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    http::build_cached_response(Bytes::from(data), content_type, &etag, is_head)
}
