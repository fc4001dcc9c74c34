// Application state module
// Shared, read-mostly state handed to every request handler

use super::types::{BlogSourceKind, Config};
use crate::backend::{BackendClient, BackendError};
use crate::content::{BlogSource, ContactStore, MarkdownPosts, TourCatalog};
use crate::db::{Database, DbError};
use crate::edge::EdgeRouter;

/// Errors that prevent the server from starting
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid backend origin: {0}")]
    Backend(#[from] BackendError),
    #[error("invalid database configuration: {0}")]
    Database(#[from] DbError),
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub edge: EdgeRouter,
    pub backend: BackendClient,
    /// Pooled handle; `None` when no connection string is configured
    pub database: Option<Database>,
    pub markdown: MarkdownPosts,
}

impl AppState {
    /// Build the state from a loaded configuration.
    ///
    /// The database pool is lazy: no connection is opened until the first query.
    pub fn new(config: &Config) -> Result<Self, StartupError> {
        let origin = config.backend_origin();
        let backend = BackendClient::new(&origin)?;
        let edge = EdgeRouter::new(&origin, &config.edge)?;
        let database = match config.database.url.as_deref() {
            Some(url) => Some(Database::pooled(url, &config.database)?),
            None => None,
        };

        Ok(Self {
            config: config.clone(),
            edge,
            backend,
            database,
            markdown: MarkdownPosts::new(&config.content.posts_dir),
        })
    }

    /// Tour pages read from the database when one is configured, otherwise from the backend
    pub fn tour_catalog(&self) -> &dyn TourCatalog {
        match &self.database {
            Some(db) => db,
            None => &self.backend,
        }
    }

    pub fn blog_source(&self) -> &dyn BlogSource {
        match self.config.content.blog_source {
            BlogSourceKind::Backend => &self.backend,
            BlogSourceKind::Markdown => &self.markdown,
        }
    }

    pub fn contact_store(&self) -> Option<&dyn ContactStore> {
        self.database.as_ref().map(|db| db as &dyn ContactStore)
    }

    pub fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
