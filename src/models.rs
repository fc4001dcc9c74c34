//! Rows and payloads shared by the database, the backend client and the pages

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One scheduled date of a tour, as shown on the schedule listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledTour {
    pub name: String,
    pub slug: String,
    pub date_id: i64,
    pub raw_date: NaiveDate,
    /// Free text, e.g. `11:00`
    pub time: String,
}

/// A tour joined with one of its dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TourDetail {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub additional_description: String,
    /// Minutes
    pub duration: i64,
    pub cost: String,
    pub additional_cost: String,
    pub meeting_point: String,
    pub max_capacity: Option<i64>,
    pub date: NaiveDate,
    pub time: String,
    pub date_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Trusted HTML
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reading_time_minutes: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Listing envelope returned by `/api/v1/blog-posts/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPostsPage {
    pub data: Vec<BlogPost>,
    pub count: usize,
}

/// Contact form submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

/// Admin login written by `register-admin`
#[derive(Debug, Clone)]
pub struct AdminCredential {
    pub username: String,
    pub password_hash: String,
}

/// One row of the MySQL process list
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProcessEntry {
    pub id: i64,
    pub user: String,
    pub command: String,
    pub idle_seconds: i64,
}
