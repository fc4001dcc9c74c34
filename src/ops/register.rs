// Admin account registration: prompt, hash, upsert

use async_trait::async_trait;
use console::Term;

use crate::db::{Database, DbError};
use crate::logger;
use crate::models::AdminCredential;

/// bcrypt work factor
pub const BCRYPT_COST: u32 = 10;
pub const DEFAULT_USERNAME: &str = "admin";

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Пароль не может быть пустым")]
    EmptyPassword,
    #[error("failed to read from terminal: {0}")]
    Prompt(#[from] std::io::Error),
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Storage for admin credentials
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn ensure_table(&self) -> Result<(), DbError>;
    /// Returns rows affected: 1 for a new user, 2 for a replaced hash
    async fn upsert(&self, credential: &AdminCredential) -> Result<u64, DbError>;
}

#[async_trait]
impl AdminStore for Database {
    async fn ensure_table(&self) -> Result<(), DbError> {
        self.ensure_admin_table().await
    }

    async fn upsert(&self, credential: &AdminCredential) -> Result<u64, DbError> {
        self.upsert_admin(credential).await
    }
}

/// Ask for the username (default `admin`) and a hidden password
pub fn prompt_credentials(term: &Term, username: Option<String>) -> Result<(String, String), RegisterError> {
    let username = match username {
        Some(name) => name,
        None => {
            term.write_str(&format!("Имя пользователя [{DEFAULT_USERNAME}]: "))?;
            let line = term.read_line()?;
            let line = line.trim();
            if line.is_empty() {
                DEFAULT_USERNAME.to_string()
            } else {
                line.to_string()
            }
        }
    };

    term.write_str("Пароль: ")?;
    let password = term.read_secure_line()?;
    Ok((username, password))
}

pub fn hash_password(password: &str) -> Result<String, RegisterError> {
    if password.trim().is_empty() {
        return Err(RegisterError::EmptyPassword);
    }
    Ok(bcrypt::hash(password, BCRYPT_COST)?)
}

/// Create the admin user or update its password
pub async fn register(
    store: &dyn AdminStore,
    username: &str,
    password: &str,
) -> Result<(), RegisterError> {
    let credential = AdminCredential {
        username: username.to_string(),
        password_hash: hash_password(password)?,
    };

    store.ensure_table().await?;
    match store.upsert(&credential).await? {
        1 => logger::log_info(&format!("Пользователь {username} успешно создан")),
        _ => logger::log_info(&format!("Пароль пользователя {username} успешно обновлен")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryAdmins {
        users: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl AdminStore for MemoryAdmins {
        async fn ensure_table(&self) -> Result<(), DbError> {
            Ok(())
        }

        async fn upsert(&self, credential: &AdminCredential) -> Result<u64, DbError> {
            let previous = self
                .users
                .lock()
                .unwrap()
                .insert(credential.username.clone(), credential.password_hash.clone());
            Ok(if previous.is_some() { 2 } else { 1 })
        }
    }

    #[test]
    fn test_hash_verifies_with_cost_10() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$2b$10$"));
        assert!(bcrypt::verify("s3cret", &hash).unwrap());
        assert!(!bcrypt::verify("other", &hash).unwrap());
    }

    #[test]
    fn test_empty_password_is_rejected() {
        assert!(matches!(hash_password("  "), Err(RegisterError::EmptyPassword)));
    }

    #[tokio::test]
    async fn test_register_upserts_by_username() {
        let store = MemoryAdmins::default();
        register(&store, "admin", "first").await.unwrap();
        register(&store, "admin", "second").await.unwrap();

        let users = store.users.lock().unwrap();
        assert_eq!(users.len(), 1);
        assert!(bcrypt::verify("second", &users["admin"]).unwrap());
    }
}
