// Idle database session reaper

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::db::{Database, DbError};
use crate::logger;
use crate::models::ProcessEntry;

/// Sessions idle for longer than this are killed
pub const IDLE_THRESHOLD_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum ReapError {
    #[error("database user is unknown: set DB_USER or include it in DATABASE_URL")]
    MissingUser,
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Process list access needed by the reaper
#[async_trait]
pub trait SessionAdmin: Send + Sync {
    async fn process_list(&self) -> Result<Vec<ProcessEntry>, DbError>;
    async fn kill(&self, id: i64) -> Result<(), DbError>;
}

#[async_trait]
impl SessionAdmin for Database {
    async fn process_list(&self) -> Result<Vec<ProcessEntry>, DbError> {
        Database::process_list(self).await
    }

    async fn kill(&self, id: i64) -> Result<(), DbError> {
        self.kill_process(id).await
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReapReport {
    pub found: usize,
    pub killed: usize,
    pub failed: usize,
}

/// User whose sessions may be killed: `database.user`, else the URL's user
pub fn resolve_user(config: &DatabaseConfig) -> Option<String> {
    if let Some(user) = config.user.as_deref().filter(|u| !u.is_empty()) {
        return Some(user.to_string());
    }
    let url = reqwest::Url::parse(config.url.as_deref()?).ok()?;
    Some(url.username().to_string()).filter(|u| !u.is_empty())
}

/// Sleeping sessions of `user` idle for more than [`IDLE_THRESHOLD_SECS`]
pub fn select_idle<'a>(processes: &'a [ProcessEntry], user: &str) -> Vec<&'a ProcessEntry> {
    processes
        .iter()
        .filter(|p| p.command == "Sleep" && p.user == user && p.idle_seconds > IDLE_THRESHOLD_SECS)
        .collect()
}

/// Kill every idle session of `user`; a failed kill is logged and skipped
pub async fn reap(admin: &dyn SessionAdmin, user: &str) -> Result<ReapReport, ReapError> {
    logger::log_info("Getting list of processes...");
    let processes = admin.process_list().await?;
    let idle = select_idle(&processes, user);

    let mut report = ReapReport {
        found: idle.len(),
        ..ReapReport::default()
    };
    logger::log_info(&format!("Found {} sleeping connections to kill.", report.found));

    for process in idle {
        logger::log_info(&format!("Killing connection {}...", process.id));
        match admin.kill(process.id).await {
            Ok(()) => report.killed += 1,
            Err(e) => {
                logger::log_error(&format!("Failed to kill connection {}: {e}", process.id));
                report.failed += 1;
            }
        }
    }

    logger::log_info("Done killing sleeping connections.");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn entry(id: i64, user: &str, command: &str, idle_seconds: i64) -> ProcessEntry {
        ProcessEntry {
            id,
            user: user.to_string(),
            command: command.to_string(),
            idle_seconds,
        }
    }

    fn processes() -> Vec<ProcessEntry> {
        vec![
            entry(1, "site", "Sleep", 61),
            entry(2, "site", "Sleep", 60),
            entry(3, "site", "Query", 500),
            entry(4, "other", "Sleep", 900),
            entry(5, "site", "Sleep", 3600),
        ]
    }

    struct FakeAdmin {
        processes: Vec<ProcessEntry>,
        killed: Mutex<Vec<i64>>,
        refuse: i64,
    }

    #[async_trait]
    impl SessionAdmin for FakeAdmin {
        async fn process_list(&self) -> Result<Vec<ProcessEntry>, DbError> {
            Ok(self.processes.clone())
        }

        async fn kill(&self, id: i64) -> Result<(), DbError> {
            if id == self.refuse {
                return Err(DbError::MissingUrl);
            }
            self.killed.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[test]
    fn test_select_idle_matches_sleep_user_and_threshold() {
        let all = processes();
        let ids: Vec<i64> = select_idle(&all, "site").iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[tokio::test]
    async fn test_reap_continues_after_failed_kill() {
        let admin = FakeAdmin {
            processes: processes(),
            killed: Mutex::new(Vec::new()),
            refuse: 1,
        };
        let report = reap(&admin, "site").await.unwrap();
        assert_eq!(
            report,
            ReapReport {
                found: 2,
                killed: 1,
                failed: 1
            }
        );
        assert_eq!(*admin.killed.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_resolve_user() {
        let mut config = DatabaseConfig {
            url: Some("mysql://site_user:pw@db:3306/guide".into()),
            user: None,
            max_connections: 10,
            idle_timeout_secs: 60,
        };
        assert_eq!(resolve_user(&config).as_deref(), Some("site_user"));
        config.user = Some("explicit".into());
        assert_eq!(resolve_user(&config).as_deref(), Some("explicit"));
        config.user = None;
        config.url = None;
        assert_eq!(resolve_user(&config), None);
    }
}
