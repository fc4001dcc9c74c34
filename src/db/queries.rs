// Statements the site and the operations CLI run

use super::{Database, DbError, Param};
use crate::models::{AdminCredential, NewContact, ProcessEntry, ScheduledTour, TourDetail};

const SCHEDULED_TOURS: &str = "SELECT t.name, t.slug, CAST(td.id AS SIGNED) AS date_id, \
     td.date AS raw_date, td.time \
     FROM tours AS t INNER JOIN tour_date AS td ON t.id = td.tour_id \
     ORDER BY td.date, td.time";

const TOUR_FOR_DATE: &str = "SELECT t.name, t.slug, t.description, t.additional_description, \
     CAST(t.duration AS SIGNED) AS duration, t.cost, t.additional_cost, t.meeting_point, \
     CAST(t.max_capacity AS SIGNED) AS max_capacity, td.date, td.time, \
     CAST(td.id AS SIGNED) AS date_id \
     FROM tours AS t INNER JOIN tour_date AS td ON t.id = td.tour_id \
     WHERE t.slug = ? AND td.id = ?";

const INSERT_CONTACT: &str =
    "INSERT INTO contacts (name, email, phone, message) VALUES (?, ?, ?, ?)";

const UPSERT_ADMIN: &str = "INSERT INTO admin_users (username, password_hash) VALUES (?, ?) \
     ON DUPLICATE KEY UPDATE password_hash = VALUES(password_hash)";

const CREATE_ADMIN_TABLE: &str = "CREATE TABLE IF NOT EXISTS admin_users (
    id INT AUTO_INCREMENT PRIMARY KEY,
    username VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
)";

const PROCESS_LIST: &str = "SELECT CAST(ID AS SIGNED) AS id, USER AS user, \
     COMMAND AS command, CAST(TIME AS SIGNED) AS idle_seconds \
     FROM information_schema.PROCESSLIST";

impl Database {
    /// Every tour date, ordered by date then time
    pub async fn scheduled_tours(&self) -> Result<Vec<ScheduledTour>, DbError> {
        self.fetch_all(SCHEDULED_TOURS, &[]).await
    }

    pub async fn tour_for_date(
        &self,
        slug: &str,
        date_id: i64,
    ) -> Result<Option<TourDetail>, DbError> {
        self.fetch_optional(TOUR_FOR_DATE, &[slug.into(), date_id.into()])
            .await
    }

    /// Persist one contact submission; returns the new row id
    pub async fn insert_contact(&self, contact: &NewContact) -> Result<u64, DbError> {
        let params = [
            Param::from(contact.name.as_str()),
            Param::from(contact.email.as_str()),
            // the column is NOT NULL
            Param::from(contact.phone.clone().unwrap_or_default()),
            Param::from(contact.message.as_str()),
        ];
        let result = self.execute(INSERT_CONTACT, &params).await?;
        Ok(result.last_insert_id)
    }

    /// Idempotent
    pub async fn ensure_admin_table(&self) -> Result<(), DbError> {
        self.execute(CREATE_ADMIN_TABLE, &[]).await?;
        Ok(())
    }

    /// Create the admin user or replace its password hash
    pub async fn upsert_admin(&self, credential: &AdminCredential) -> Result<u64, DbError> {
        let params = [
            Param::from(credential.username.as_str()),
            Param::from(credential.password_hash.as_str()),
        ];
        Ok(self.execute(UPSERT_ADMIN, &params).await?.rows_affected)
    }

    pub async fn process_list(&self) -> Result<Vec<ProcessEntry>, DbError> {
        self.fetch_all(PROCESS_LIST, &[]).await
    }

    /// Terminate a server session by process id
    pub async fn kill_process(&self, id: i64) -> Result<(), DbError> {
        self.execute_unprepared(&format!("KILL {id}")).await?;
        Ok(())
    }
}
