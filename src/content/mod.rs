//! Content sources behind the pages and API routes
//!
//! Tours come from the database or the backend; blog posts from the
//! backend or bundled Markdown files; contact submissions go to the database.

mod markdown;

pub use markdown::{render_markdown, MarkdownPosts};

use async_trait::async_trait;
use hyper::StatusCode;

use crate::backend::{BackendClient, BackendError, BLOG_POSTS_PATH, TOURS_PATH};
use crate::db::{Database, DbError};
use crate::models::{BlogPost, BlogPostsPage, NewContact, ScheduledTour, TourDetail};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Backend responded with status: {}", .0.as_u16())]
    Status(StatusCode),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid front matter in {path}: {source}")]
    FrontMatter {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[async_trait]
pub trait TourCatalog: Send + Sync {
    /// Every tour date, ordered by date then time
    async fn scheduled_tours(&self) -> Result<Vec<ScheduledTour>, SourceError>;

    async fn tour_for_date(
        &self,
        slug: &str,
        date_id: i64,
    ) -> Result<Option<TourDetail>, SourceError>;
}

#[async_trait]
pub trait BlogSource: Send + Sync {
    /// Newest first
    async fn posts(&self) -> Result<Vec<BlogPost>, SourceError>;

    async fn post(&self, slug: &str) -> Result<Option<BlogPost>, SourceError>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Persist a submission and return its id
    async fn insert_contact(&self, contact: &NewContact) -> Result<u64, SourceError>;
}

#[async_trait]
impl TourCatalog for Database {
    async fn scheduled_tours(&self) -> Result<Vec<ScheduledTour>, SourceError> {
        Ok(Database::scheduled_tours(self).await?)
    }

    async fn tour_for_date(
        &self,
        slug: &str,
        date_id: i64,
    ) -> Result<Option<TourDetail>, SourceError> {
        Ok(Database::tour_for_date(self, slug, date_id).await?)
    }
}

#[async_trait]
impl ContactStore for Database {
    async fn insert_contact(&self, contact: &NewContact) -> Result<u64, SourceError> {
        Ok(Database::insert_contact(self, contact).await?)
    }
}

#[async_trait]
impl TourCatalog for BackendClient {
    async fn scheduled_tours(&self) -> Result<Vec<ScheduledTour>, SourceError> {
        let reply = self.get(TOURS_PATH).await?;
        if !reply.is_success() {
            return Err(SourceError::Status(reply.status));
        }
        Ok(reply.json()?)
    }

    async fn tour_for_date(
        &self,
        slug: &str,
        date_id: i64,
    ) -> Result<Option<TourDetail>, SourceError> {
        let reply = self.get(&format!("{TOURS_PATH}{slug}/{date_id}")).await?;
        match reply.status {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(reply.json()?)),
            status => Err(SourceError::Status(status)),
        }
    }
}

#[async_trait]
impl BlogSource for BackendClient {
    async fn posts(&self) -> Result<Vec<BlogPost>, SourceError> {
        let reply = self.get(BLOG_POSTS_PATH).await?;
        if !reply.is_success() {
            return Err(SourceError::Status(reply.status));
        }
        Ok(reply.json::<BlogPostsPage>()?.data)
    }

    async fn post(&self, slug: &str) -> Result<Option<BlogPost>, SourceError> {
        let reply = self.get(&format!("{BLOG_POSTS_PATH}{slug}")).await?;
        match reply.status {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(reply.json()?)),
            status => Err(SourceError::Status(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn test_backend_tour_catalog() {
        let fake = FakeBackend::start(|req| match req.uri.as_str() {
            "/api/v1/tours/" => (
                200,
                r#"[{"name":"Recoleta","slug":"recoleta","date_id":7,"raw_date":"2024-07-10","time":"11:00"}]"#.to_string(),
            ),
            _ => (404, r#"{"detail":"Tour not found"}"#.to_string()),
        })
        .await;
        let client = BackendClient::new(&fake.origin).unwrap();

        let tours = TourCatalog::scheduled_tours(&client).await.unwrap();
        assert_eq!(tours.len(), 1);
        assert_eq!(tours[0].slug, "recoleta");

        let missing = TourCatalog::tour_for_date(&client, "recoleta", 99).await.unwrap();
        assert!(missing.is_none());
        assert_eq!(fake.requests()[1].uri, "/api/v1/tours/recoleta/99");
    }

    #[tokio::test]
    async fn test_backend_error_status_is_reported() {
        let fake = FakeBackend::start(|_| (503, "{}".to_string())).await;
        let client = BackendClient::new(&fake.origin).unwrap();
        let err = BlogSource::posts(&client).await.unwrap_err();
        assert_eq!(err.to_string(), "Backend responded with status: 503");
    }

    #[tokio::test]
    async fn test_backend_blog_envelope() {
        let fake = FakeBackend::start(|_| {
            (
                200,
                r#"{"data":[{"slug":"mate","title":"Mate","content":"<p>x</p>"}],"count":1}"#
                    .to_string(),
            )
        })
        .await;
        let client = BackendClient::new(&fake.origin).unwrap();
        let posts = BlogSource::posts(&client).await.unwrap();
        assert_eq!(posts[0].title, "Mate");
    }
}
