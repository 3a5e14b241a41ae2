use std::net::SocketAddr;
use std::sync::Arc;

use csr_dashboard::config::Config;
use csr_dashboard::records::{EducationStatus, Gender, HealthStatus, NewChild};
use csr_dashboard::server::{serve, ApiState};
use csr_dashboard::store::sqlite::SqliteStore;
use csr_dashboard::store::RecordStore;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

fn new_child(name: &str, age: u32, verified: bool) -> NewChild {
    NewChild {
        name: name.to_string(),
        age,
        gender: Gender::Female,
        district: "Pune East".to_string(),
        location: "Hadapsar".to_string(),
        education_status: EducationStatus::Primary,
        health_status: HealthStatus::Good,
        guardian_name: Some("Meera".to_string()),
        guardian_phone: None,
        special_needs: None,
        verified,
    }
}

async fn spawn_proxy() -> (SocketAddr, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));

    let mut at_risk = new_child("Ravi", 16, true);
    at_risk.gender = Gender::Male;
    at_risk.education_status = EducationStatus::None;
    at_risk.guardian_name = None;
    let rows = store
        .insert_children(&[new_child("Asha", 7, true), at_risk, new_child("Hidden", 9, false)])
        .await
        .expect("seed children");
    let asha_id = rows[0]["id"].as_str().expect("id").to_string();
    store
        .insert_success_story(&asha_id, "Back to school", "Asha re-joined class 2.", true)
        .expect("seed story");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ApiState::new(store.clone(), &Config::default());
    tokio::spawn(async move {
        let _ = serve(listener, state).await;
    });
    (addr, store)
}

#[tokio::test]
async fn health_reports_connected_store() {
    let (addr, _store) = spawn_proxy().await;
    let response = reqwest::get(format!("http://{addr}/")).await.expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("text");
    assert!(body.contains("sqlite"));
}

#[tokio::test]
async fn children_listing_is_verified_only_and_cacheable() {
    let (addr, _store) = spawn_proxy().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/children");

    let response = client.get(&url).send().await.expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    let etag = response
        .headers()
        .get("etag")
        .and_then(|v| v.to_str().ok())
        .expect("etag")
        .to_string();
    let children: Vec<Value> = response.json().await.expect("json");
    let names = children
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Asha", "Ravi"]);

    let cached = client
        .get(&url)
        .header("if-none-match", etag.as_str())
        .send()
        .await
        .expect("conditional get");
    assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn posting_children_accepts_objects_and_rejects_bad_rows() {
    let (addr, _store) = spawn_proxy().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/children");

    let single = json!({
        "name": "Kiran",
        "age": 11,
        "gender": "male",
        "district": "Mumbai Central",
        "location": "Dharavi",
        "verified": true
    });
    let created = client.post(&url).json(&single).send().await.expect("post");
    assert_eq!(created.status(), StatusCode::CREATED);
    let rows: Vec<Value> = created.json().await.expect("json");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Kiran");
    assert_eq!(rows[0]["education_status"], "none");

    let invalid = json!([{ "name": "Nope", "age": 5, "gender": "robot", "district": "X", "location": "Y" }]);
    let rejected = client.post(&url).json(&invalid).send().await.expect("post");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    let body: Value = rejected.json().await.expect("json");
    assert!(body["error"].as_str().is_some());

    let malformed = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("post");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stories_are_joined_with_child() {
    let (addr, _store) = spawn_proxy().await;
    let stories: Vec<Value> = reqwest::get(format!("http://{addr}/api/success-stories"))
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["title"], "Back to school");
    assert_eq!(stories[0]["children"]["name"], "Asha");
    assert_eq!(stories[0]["children"]["age"], 7);
}

#[tokio::test]
async fn analytics_and_risk_follow_filters() {
    let (addr, _store) = spawn_proxy().await;

    let analytics: Value = reqwest::get(format!("http://{addr}/api/analytics?gender=male"))
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    assert_eq!(analytics["matched"], 1);
    assert_eq!(analytics["summary"]["total_children"], 1);

    let risk: Value = reqwest::get(format!("http://{addr}/api/risk?top=1"))
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    let ranked = risk["ranked"].as_array().expect("ranked");
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0]["child"]["name"], "Ravi");
    assert_eq!(risk["summary"]["high"], 1);
    assert_eq!(risk["summary"]["low"], 1);
}

#[tokio::test]
async fn non_numeric_top_is_a_json_error() {
    let (addr, _store) = spawn_proxy().await;
    let response = reqwest::get(format!("http://{addr}/api/risk?top=abc"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"));
    let body: Value = response.json().await.expect("json");
    assert!(body["error"].as_str().is_some_and(|m| m.contains("abc")));
}

#[tokio::test]
async fn csv_export_uses_plain_rows() {
    let (addr, _store) = spawn_proxy().await;
    let response = reqwest::get(format!("http://{addr}/api/export/children.csv?search=asha"))
        .await
        .expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/csv"));
    let body = response.text().await.expect("text");
    assert_eq!(
        body,
        "Name,Age,Gender,District,Location,Education,Health\nAsha,7,female,Pune East,Hadapsar,primary,good"
    );
}

#[tokio::test]
async fn donations_are_recorded_and_listed_per_donor() {
    let (addr, _store) = spawn_proxy().await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/donations");

    let request = json!({
        "donor_id": "donor-1",
        "amount": 2500,
        "purpose": "Education Support",
        "description": "School kits"
    });
    let created = client.post(&url).json(&request).send().await.expect("post");
    assert_eq!(created.status(), StatusCode::CREATED);
    let donation: Value = created.json().await.expect("json");
    assert_eq!(donation["purpose"], "Education Support - School kits");
    assert_eq!(donation["beneficiary_children_count"], 2);
    assert_eq!(donation["status"], "pending");
    assert_eq!(donation["currency"], "INR");

    let zero = json!({ "donor_id": "donor-1", "amount": 0, "purpose": "Healthcare" });
    let rejected = client.post(&url).json(&zero).send().await.expect("post");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let listed: Vec<Value> = client
        .get(format!("{url}?donor_id=donor-1"))
        .send()
        .await
        .expect("get")
        .json()
        .await
        .expect("json");
    assert_eq!(listed.len(), 1);

    let missing = client.get(&url).send().await.expect("get");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}
