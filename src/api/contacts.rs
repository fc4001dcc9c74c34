// Contact form submission: stored directly, or forwarded to the backend

use hyper::StatusCode;
use serde::Deserialize;

use super::response::{error_response, json_response, parse_body, relay_json};
use crate::backend::BackendClient;
use crate::content::ContactStore;
use crate::http::SiteResponse;
use crate::logger;
use crate::models::NewContact;

const FIELDS_REQUIRED: &str = "Все поля обязательны для заполнения.";
const SENT: &str = "Сообщение успешно отправлено!";
const SAVE_FAILED: &str = "Ошибка сервера при сохранении сообщения.";

#[derive(Debug, Deserialize)]
struct ContactForm {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ContactForm {
    /// `None` unless name, email and message are all non-empty
    fn into_contact(self) -> Option<NewContact> {
        let required = |v: Option<String>| v.filter(|s| !s.is_empty());
        Some(NewContact {
            name: required(self.name)?,
            email: required(self.email)?,
            phone: self.phone.filter(|s| !s.is_empty()),
            message: required(self.message)?,
        })
    }
}

fn message(status: StatusCode, text: &str) -> SiteResponse {
    json_response(status, &serde_json::json!({ "message": text }))
}

/// POST /api/submit-form
pub async fn submit_form(body: &[u8], store: Option<&dyn ContactStore>) -> SiteResponse {
    let form: ContactForm = match parse_body(body) {
        Ok(f) => f,
        Err(resp) => return resp,
    };
    let Some(contact) = form.into_contact() else {
        return message(StatusCode::BAD_REQUEST, FIELDS_REQUIRED);
    };

    let Some(store) = store else {
        logger::log_error("Contact submission received but no database is configured");
        return message(StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED);
    };

    match store.insert_contact(&contact).await {
        Ok(id) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "message": SENT, "insertId": id }),
        ),
        Err(e) => {
            logger::log_error(&format!("Failed to save contact message: {e}"));
            message(StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED)
        }
    }
}

/// POST /api/contacts
pub async fn forward_contact(body: &[u8], backend: &BackendClient) -> SiteResponse {
    let payload: serde_json::Value = match parse_body(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let reply = match backend.create_contact(&payload).await {
        Ok(reply) => reply,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    if reply.is_success() {
        return relay_json(StatusCode::CREATED, &reply);
    }

    let text = match reply.json_value() {
        Some(body) => ["detail", "error"]
            .iter()
            .find_map(|key| body.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or("Failed to send contact message")
            .to_string(),
        None => "Unknown error".to_string(),
    };
    error_response(reply.status, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SourceError;
    use crate::db::DbError;
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<NewContact>>,
        fail: bool,
    }

    #[async_trait]
    impl ContactStore for MemoryStore {
        async fn insert_contact(&self, contact: &NewContact) -> Result<u64, SourceError> {
            if self.fail {
                return Err(SourceError::Database(DbError::MissingUrl));
            }
            let mut rows = self.rows.lock().unwrap();
            rows.push(contact.clone());
            Ok(rows.len() as u64)
        }
    }

    async fn body_json(resp: SiteResponse) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_complete_submission_inserts_one_row() {
        let store = MemoryStore::default();
        let resp = submit_form(
            br#"{"name":"Ana","email":"ana@example.com","message":"Hola"}"#,
            Some(&store),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["message"], SENT);
        assert_eq!(json["insertId"], 1);

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].phone, None);
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected_without_insert() {
        let store = MemoryStore::default();
        let resp = submit_form(br#"{"name":"Ana","email":"","message":"Hola"}"#, Some(&store)).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["message"], FIELDS_REQUIRED);
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let resp = submit_form(
            br#"{"name":"Ana","email":"ana@example.com","message":"Hola"}"#,
            Some(&store),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["message"], SAVE_FAILED);

        let resp = submit_form(br#"{"name":"Ana","email":"a@b.c","message":"Hola"}"#, None).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_json_is_500() {
        let resp = submit_form(b"{not json", None).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(resp).await["error"].is_string());
    }
}
