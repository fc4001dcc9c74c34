// API module entry
// Site-owned JSON routes under /api; anything else under /api belongs to the backend

mod admin;
mod blog;
mod contacts;
mod response;
mod tours;

use hyper::body::Bytes;
use hyper::{Method, Request};

use crate::config::AppState;
use crate::http::SiteResponse;
use crate::logger;

pub use response::{error_response, json_response};

/// Routes served by the site itself
#[derive(Debug, PartialEq, Eq)]
enum ApiRoute<'a> {
    Login,
    VerifyToken,
    SubmitForm,
    Contacts,
    Tours,
    TourDate { slug: &'a str, date_id: &'a str },
    BlogPosts,
    BlogPost { slug: &'a str },
}

impl<'a> ApiRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let rest = path.strip_prefix("/api/")?;
        let segments: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
        let route = match segments.as_slice() {
            ["admin", "login"] => Self::Login,
            ["admin", "verify-token"] => Self::VerifyToken,
            ["submit-form"] => Self::SubmitForm,
            ["contacts"] => Self::Contacts,
            ["tours"] => Self::Tours,
            ["tours", slug, date_id] if !slug.is_empty() && !date_id.is_empty() => {
                Self::TourDate { slug, date_id }
            }
            ["blog-posts"] => Self::BlogPosts,
            ["blog-posts", slug] if !slug.is_empty() => Self::BlogPost { slug },
            _ => return None,
        };
        Some(route)
    }

    fn method(&self) -> Method {
        match self {
            Self::Login | Self::VerifyToken | Self::SubmitForm | Self::Contacts => Method::POST,
            Self::Tours | Self::TourDate { .. } | Self::BlogPosts | Self::BlogPost { .. } => {
                Method::GET
            }
        }
    }
}

/// Handle a site-owned API route; `None` when the path is not one of them
pub async fn route(req: &Request<Bytes>, state: &AppState) -> Option<SiteResponse> {
    let route = ApiRoute::parse(req.uri().path())?;

    let expected = route.method();
    if req.method() != expected {
        logger::log_debug(&format!(
            "[API] {} {} not allowed",
            req.method(),
            req.uri().path()
        ));
        return Some(response::method_not_allowed(if expected == Method::POST {
            "POST"
        } else {
            "GET"
        }));
    }

    let body = req.body();
    let backend = &state.backend;
    let resp = match route {
        ApiRoute::Login => admin::login(body, backend).await,
        ApiRoute::VerifyToken => admin::verify_token(body, backend).await,
        ApiRoute::SubmitForm => contacts::submit_form(body, state.contact_store()).await,
        ApiRoute::Contacts => contacts::forward_contact(body, backend).await,
        ApiRoute::Tours => tours::list(backend).await,
        ApiRoute::TourDate { slug, date_id } => tours::detail(backend, slug, date_id).await,
        ApiRoute::BlogPosts => blog::list(backend, req.uri().query()).await,
        ApiRoute::BlogPost { slug } => blog::detail(backend, slug).await,
    };
    Some(resp)
}
