use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use crate::records::validate::expect_array;
use crate::records::{NewChild, NewDonation, RecordError};
use crate::store::{RecordStore, StoreError};

const CONNECT_TIMEOUT_SECS: u64 = 6;
const ERROR_PREVIEW_CHARS: usize = 180;

/// PostgREST-style client for the hosted backend (`{url}/rest/v1/<table>`), authenticated
/// with the service-role key.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("csr-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn get_rows(
        &self,
        table: &str,
        query: &[(&str, &str)],
        kind: &'static str,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(query)
            .send()
            .await?;
        let body = read_json(response).await?;
        Ok(expect_array(body, kind)?)
    }

    async fn insert_rows<T: serde::Serialize + ?Sized + Sync>(
        &self,
        table: &str,
        rows: &T,
        kind: &'static str,
    ) -> Result<Vec<Value>, StoreError> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let body = read_json(response).await?;
        Ok(expect_array(body, kind)?)
    }
}

#[async_trait]
impl RecordStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.get_rows("children", &[("select", "id"), ("limit", "1")], "children")
            .await
            .map(|_| ())
    }

    async fn fetch_children(&self, verified: Option<bool>) -> Result<Vec<Value>, StoreError> {
        match verified {
            Some(true) => {
                self.get_rows("children", &[("select", "*"), ("verified", "eq.true")], "children")
                    .await
            }
            Some(false) => {
                self.get_rows("children", &[("select", "*"), ("verified", "eq.false")], "children")
                    .await
            }
            None => self.get_rows("children", &[("select", "*")], "children").await,
        }
    }

    async fn fetch_success_stories(&self) -> Result<Vec<Value>, StoreError> {
        self.get_rows(
            "success_stories",
            &[
                ("select", "*,children(name,age)"),
                ("verified", "eq.true"),
                ("order", "created_at.desc"),
            ],
            "success_stories",
        )
        .await
    }

    async fn insert_children(&self, children: &[NewChild]) -> Result<Vec<Value>, StoreError> {
        self.insert_rows("children", children, "children").await
    }

    async fn insert_donation(&self, donation: &NewDonation) -> Result<Value, StoreError> {
        let mut rows = self
            .insert_rows("donations", std::slice::from_ref(donation), "donations")
            .await?;
        if rows.is_empty() {
            return Err(RecordError::Empty.into());
        }
        Ok(rows.swap_remove(0))
    }

    async fn fetch_donations(&self, donor_id: &str) -> Result<Vec<Value>, StoreError> {
        let filter = format!("eq.{donor_id}");
        self.get_rows(
            "donations",
            &[
                ("select", "*"),
                ("donor_id", filter.as_str()),
                ("order", "created_at.desc"),
            ],
            "donations",
        )
        .await
    }
}

async fn read_json(response: Response) -> Result<Value, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(serde_json::from_str(&body)?)
}

/// PostgREST errors carry a `message` field; anything else is previewed verbatim.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.chars().take(ERROR_PREVIEW_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::{error_message, RestStore};
    use crate::records::validate::validate_children;
    use crate::records::{EducationStatus, Gender, HealthStatus, NewChild};
    use crate::store::{RecordStore, StoreError};

    const KEY: &str = "service-key";

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(KEY)
            && headers.get("authorization").and_then(|v| v.to_str().ok())
                == Some("Bearer service-key")
    }

    async fn list_children(
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if !authorized(&headers) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid API key" })),
            );
        }
        let rows = json!([
            {
                "id": "c1", "name": "Asha", "age": 8, "gender": "female",
                "district": "Mumbai Central", "location": "Dharavi",
                "education_status": "primary", "health_status": "good",
                "guardian_name": "Lata", "verified": true
            },
            {
                "id": "c2", "name": "Ravi", "age": 12, "gender": "male",
                "district": "Delhi North", "location": "Rohini",
                "education_status": "dropout", "health_status": "fair",
                "guardian_name": null, "verified": true
            }
        ]);
        let rows = if query.get("limit").map(String::as_str) == Some("1") {
            json!([{ "id": "c1" }])
        } else if query.get("verified").map(String::as_str) == Some("eq.true") {
            rows
        } else {
            json!([])
        };
        (StatusCode::OK, Json(rows))
    }

    async fn insert_children(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("prefer").and_then(|v| v.to_str().ok()) != Some("return=representation") {
            return (StatusCode::NO_CONTENT, Json(Value::Null));
        }
        let rows = body
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                row["id"] = json!(format!("new-{i}"));
                row
            })
            .collect::<Vec<_>>();
        (StatusCode::CREATED, Json(Value::Array(rows)))
    }

    async fn spawn_mock() -> String {
        let app = Router::new().route(
            "/rest/v1/children",
            get(list_children).post(insert_children),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn fetches_verified_children_with_auth_headers() {
        let url = spawn_mock().await;
        let store = RestStore::new(&url, KEY, Duration::from_secs(5)).expect("client");
        store.ping().await.expect("ping");

        let rows = store.fetch_children(Some(true)).await.expect("fetch");
        let report = validate_children(rows);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.accepted[0].name, "Asha");
    }

    #[tokio::test]
    async fn rejected_key_surfaces_store_message() {
        let url = spawn_mock().await;
        let store = RestStore::new(&url, "wrong", Duration::from_secs(5)).expect("client");
        let err = store.fetch_children(Some(true)).await.expect_err("unauthorized");
        match err {
            StoreError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn insert_returns_representation() {
        let url = spawn_mock().await;
        let store = RestStore::new(&url, KEY, Duration::from_secs(5)).expect("client");
        let child = NewChild {
            name: "Leela".to_string(),
            age: 6,
            gender: Gender::Female,
            district: "Chennai South".to_string(),
            location: "Adyar".to_string(),
            education_status: EducationStatus::None,
            health_status: HealthStatus::Good,
            guardian_name: None,
            guardian_phone: None,
            special_needs: None,
            verified: false,
        };
        let rows = store.insert_children(&[child]).await.expect("insert");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "new-0");
        assert_eq!(rows[0]["name"], "Leela");
    }

    #[test]
    fn error_preview_falls_back_to_body() {
        assert_eq!(error_message(r#"{"message":"duplicate key"}"#), "duplicate key");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(&"x".repeat(500)).len(), 180);
    }
}
