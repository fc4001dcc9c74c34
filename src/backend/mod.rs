//! Client for the external backend API (`/api/v1/...`)
//!
//! One attempt per call, caching disabled on every request.

use hyper::body::Bytes;
use hyper::StatusCode;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::logger;

pub const LOGIN_PATH: &str = "/api/v1/login/access-token";
pub const TEST_TOKEN_PATH: &str = "/api/v1/login/test-token";
pub const CONTACTS_PATH: &str = "/api/v1/contacts/";
pub const TOURS_PATH: &str = "/api/v1/tours/";
pub const BLOG_POSTS_PATH: &str = "/api/v1/blog-posts/";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend origin `{origin}`: {reason}")]
    InvalidOrigin { origin: String, reason: String },
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Status and raw body of a backend response
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub status: StatusCode,
    pub body: Bytes,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parsed body, `None` when it is not JSON
    pub fn json_value(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Backend API client
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    origin: String,
}

impl BackendClient {
    /// `origin` is scheme + authority, e.g. `http://backend:8000`
    pub fn new(origin: &str) -> Result<Self, BackendError> {
        let origin = parse_origin(origin)?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, origin })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{path_and_query}", self.origin)
    }

    async fn send(&self, request: RequestBuilder) -> Result<BackendReply, BackendError> {
        let response = request
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(report)?;
        let status = response.status();
        let body = response.bytes().await.map_err(report)?;
        Ok(BackendReply { status, body })
    }

    pub async fn get(&self, path_and_query: &str) -> Result<BackendReply, BackendError> {
        self.send(self.http.get(self.url(path_and_query))).await
    }

    /// Exchange credentials for an access token (form-encoded, OAuth2 password flow)
    pub async fn login(&self, username: &str, password: &str) -> Result<BackendReply, BackendError> {
        let form = [("username", username), ("password", password)];
        self.send(self.http.post(self.url(LOGIN_PATH)).form(&form))
            .await
    }

    pub async fn test_token(&self, token: &str) -> Result<BackendReply, BackendError> {
        let request = self
            .http
            .post(self.url(TEST_TOKEN_PATH))
            .header(AUTHORIZATION, format!("Bearer {token}"));
        self.send(request).await
    }

    pub async fn create_contact(
        &self,
        contact: &serde_json::Value,
    ) -> Result<BackendReply, BackendError> {
        self.send(self.http.post(self.url(CONTACTS_PATH)).json(contact))
            .await
    }
}

fn parse_origin(origin: &str) -> Result<String, BackendError> {
    let trimmed = origin.trim().trim_end_matches('/');
    let invalid = |reason: String| BackendError::InvalidOrigin {
        origin: origin.to_string(),
        reason,
    };
    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(trimmed.to_string())
}

fn report(error: reqwest::Error) -> BackendError {
    logger::log_error(&format!("Backend request failed: {error}"));
    BackendError::Transport(error)
}
