//! HTTP protocol layer module
//!
//! Response builders, conditional requests and MIME detection shared by
//! pages, API routes and static assets.

pub mod cache;
pub mod mime;
pub mod response;

pub use response::{
    build_304_response, build_405_response, build_413_response, build_502_response,
    build_cached_response, build_health_response, build_html_response, build_options_response,
    SiteResponse,
};
