//! Request handler module
//!
//! Buffers the request, then dispatches it to health checks, the site API,
//! the edge rewrite, the page renderers and finally the public assets.

pub mod router;
pub mod static_files;

pub use router::handle_request;
