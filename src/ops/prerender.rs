// Tour pages rendered to static files for the FTP export

use std::path::{Path, PathBuf};

use crate::content::{SourceError, TourCatalog};
use crate::db::{Database, DbError};
use crate::logger;
use crate::pages;

#[derive(Debug, thiserror::Error)]
pub enum PrerenderError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Render with a dedicated connection, which is closed afterwards whatever the outcome
pub async fn prerender(db: Database, out_dir: &Path) -> Result<usize, PrerenderError> {
    let rendered = render_tours(&db, out_dir).await;
    let closed = db.close().await;
    let count = rendered?;
    closed?;
    Ok(count)
}

/// Write the schedule and every per-date page; returns the number of files written
pub async fn render_tours(catalog: &dyn TourCatalog, out_dir: &Path) -> Result<usize, PrerenderError> {
    let schedule = catalog.scheduled_tours().await?;
    let listing = pages::schedule_html(&schedule);
    write_page(&out_dir.join("group-tours"), &listing).await?;
    write_page(&out_dir.join("tours"), &listing).await?;
    let mut written = 2;

    for entry in &schedule {
        match catalog.tour_for_date(&entry.slug, entry.date_id).await? {
            Some(tour) => {
                let dir: PathBuf = out_dir
                    .join("group-tours")
                    .join(&entry.slug)
                    .join(entry.date_id.to_string());
                write_page(&dir, &pages::tour_html(&tour)).await?;
                written += 1;
            }
            None => logger::log_warning(&format!(
                "Tour {}/{} disappeared while rendering",
                entry.slug, entry.date_id
            )),
        }
    }

    logger::log_info(&format!("Prerendered {written} page(s) into {}", out_dir.display()));
    Ok(written)
}

async fn write_page(dir: &Path, html: &str) -> Result<(), PrerenderError> {
    let io_error = |source: std::io::Error| PrerenderError::Io {
        path: dir.display().to_string(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
    tokio::fs::write(dir.join("index.html"), html)
        .await
        .map_err(io_error)
}
