//! Edge middleware
//!
//! Requests for the backend's own surfaces (`/admin`, `/docs`, `/api`,
//! `/openapi.json`) are rewritten to the backend origin and forwarded with
//! the original host and scheme attached.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH, HOST};
use hyper::{HeaderMap, Method, Response, Uri};

use crate::backend::BackendError;
use crate::config::EdgeConfig;
use crate::http::{build_502_response, SiteResponse};
use crate::logger;

pub const FORWARDED_HOST: &str = "x-forwarded-host";
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Connection-scoped headers that must not cross the proxy
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Backend request produced by a rewrite
#[derive(Debug, Clone)]
pub struct Rewrite {
    /// Absolute URL: origin + original path + original query
    pub destination: String,
    /// Original headers plus the forwarded host/proto pair
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub enum EdgeDecision {
    PassThrough,
    Rewrite(Rewrite),
}

/// Path-based rewrite rules bound to one backend origin
#[derive(Debug, Clone)]
pub struct EdgeRouter {
    origin: String,
    prefixes: Vec<String>,
    exact: Vec<String>,
    default_proto: HeaderValue,
    http: reqwest::Client,
}

impl EdgeRouter {
    pub fn new(origin: &str, config: &EdgeConfig) -> Result<Self, BackendError> {
        let invalid = |reason: String| BackendError::InvalidOrigin {
            origin: origin.to_string(),
            reason,
        };
        let origin = origin.trim().trim_end_matches('/');
        reqwest::Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
        let default_proto = HeaderValue::from_str(&config.default_forwarded_proto)
            .map_err(|e| invalid(format!("bad default forwarded proto: {e}")))?;

        // redirects are relayed to the browser, not followed
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            origin: origin.to_string(),
            prefixes: config.proxy_prefixes.clone(),
            exact: config.proxy_exact.clone(),
            default_proto,
            http,
        })
    }

    /// Whether a path belongs to the backend
    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
            || self.exact.iter().any(|e| path == e)
    }

    pub fn decide(&self, uri: &Uri, headers: &HeaderMap) -> EdgeDecision {
        let path = uri.path();
        if !self.matches(path) {
            return EdgeDecision::PassThrough;
        }

        let destination = match uri.query() {
            Some(query) => format!("{}{path}?{query}", self.origin),
            None => format!("{}{path}", self.origin),
        };

        let mut forwarded = headers.clone();
        if let Some(host) = headers.get(HOST) {
            forwarded.insert(HeaderName::from_static(FORWARDED_HOST), host.clone());
        }
        let proto = headers
            .get(FORWARDED_PROTO)
            .cloned()
            .unwrap_or_else(|| self.default_proto.clone());
        forwarded.insert(HeaderName::from_static(FORWARDED_PROTO), proto);

        logger::log_rewrite(path, &destination);
        EdgeDecision::Rewrite(Rewrite {
            destination,
            headers: forwarded,
        })
    }

    /// Send a rewritten request and relay the backend's answer; 502 when unreachable
    pub async fn forward(&self, rewrite: Rewrite, method: Method, body: Bytes) -> SiteResponse {
        let mut headers = rewrite.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);

        let sent = self
            .http
            .request(method, &rewrite.destination)
            .headers(headers)
            .body(body)
            .send()
            .await;
        let upstream = match sent {
            Ok(resp) => resp,
            Err(e) => {
                logger::log_error(&format!("Edge forward to {} failed: {e}", rewrite.destination));
                return build_502_response();
            }
        };

        let status = upstream.status();
        let mut relayed = upstream.headers().clone();
        strip_hop_by_hop(&mut relayed);
        relayed.remove(CONTENT_LENGTH);

        let body = match upstream.bytes().await {
            Ok(body) => body,
            Err(e) => {
                logger::log_error(&format!("Edge response from {} failed: {e}", rewrite.destination));
                return build_502_response();
            }
        };

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = relayed;
        response
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}
