//! In-process fakes shared by the unit tests

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

/// A request as the fake backend saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path and query
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Responder = dyn Fn(&Recorded) -> (u16, String) + Send + Sync;

/// HTTP/1 server on an ephemeral port that records every request and
/// answers with JSON produced by a closure
pub struct FakeBackend {
    pub origin: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeBackend {
    pub async fn start(respond: impl Fn(&Recorded) -> (u16, String) + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let seen = Arc::clone(&seen);
                let respond = Arc::clone(&respond);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let seen = Arc::clone(&seen);
                        let respond = Arc::clone(&respond);
                        async move {
                            let (parts, body) = req.into_parts();
                            let body = body.collect().await.map(|b| b.to_bytes()).unwrap_or_default();
                            let recorded = Recorded {
                                method: parts.method,
                                uri: parts
                                    .uri
                                    .path_and_query()
                                    .map_or_else(|| "/".to_string(), ToString::to_string),
                                headers: parts.headers,
                                body,
                            };
                            let (status, json) = respond(&recorded);
                            seen.lock().unwrap().push(recorded);
                            let response = Response::builder()
                                .status(status)
                                .header("content-type", "application/json")
                                .header("x-upstream", "fake")
                                .body(Full::new(Bytes::from(json)))
                                .unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { origin, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Server state pointed at `origin`, with no database and default settings
pub fn state_for(origin: &str) -> crate::config::AppState {
    let origin = origin.to_string();
    let config = crate::config::Config::load_with_env("does-not-exist", |name| {
        (name == "BACKEND_URL").then(|| origin.clone())
    })
    .unwrap();
    crate::config::AppState::new(&config).unwrap()
}
