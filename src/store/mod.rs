pub mod migrations;
pub mod rest;
pub mod sqlite;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{StoreBackend, StoreConfig};
use crate::records::validate::{validate_children, validate_rows, validate_stories};
use crate::records::{
    Donation, NewChild, NewDonation, RecordError, RecordSnapshot, SuccessStory,
};
use crate::store::rest::RestStore;
use crate::store::sqlite::SqliteStore;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Invalid(#[from] RecordError),
    #[error("store connection lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// True when the request itself was at fault, as opposed to the store or the network.
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::Invalid(_) => true,
            Self::Status { status, .. } => (400..500).contains(status),
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ffi::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

/// The hosted relational store holding children, success stories and donations.
/// Reads return raw JSON rows; validation happens in [`load_children`] and friends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn name(&self) -> &str;
    async fn ping(&self) -> Result<(), StoreError>;
    async fn fetch_children(&self, verified: Option<bool>) -> Result<Vec<Value>, StoreError>;
    /// Verified stories, each joined with its child's name and age under `children`.
    async fn fetch_success_stories(&self) -> Result<Vec<Value>, StoreError>;
    async fn insert_children(&self, children: &[NewChild]) -> Result<Vec<Value>, StoreError>;
    async fn insert_donation(&self, donation: &NewDonation) -> Result<Value, StoreError>;
    async fn fetch_donations(&self, donor_id: &str) -> Result<Vec<Value>, StoreError>;
}

pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Rest => {
            if config.url.trim().is_empty() || config.service_role_key.trim().is_empty() {
                return Err(anyhow!(
                    "rest store needs [store] url and service_role_key (or SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY)"
                ));
            }
            let store = RestStore::new(&config.url, &config.service_role_key, config.timeout())?;
            Ok(Arc::new(store))
        }
        StoreBackend::Sqlite => {
            let path = config.resolved_sqlite_path();
            Ok(Arc::new(SqliteStore::open(&path)?))
        }
    }
}

pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

pub async fn load_children(
    store: &dyn RecordStore,
    verified: Option<bool>,
    timeout: Duration,
) -> Result<RecordSnapshot, StoreError> {
    let rows = with_timeout(timeout, store.fetch_children(verified)).await?;
    let report = validate_children(rows);
    if !report.is_clean() {
        warn!(
            "{} child rows rejected during validation from {}",
            report.rejected.len(),
            store.name()
        );
    }
    let rejected = report.rejected.len();
    let snapshot = RecordSnapshot::new(report.accepted).with_rejected(rejected);
    info!(
        "loaded {} children from {} ({})",
        snapshot.len(),
        store.name(),
        &snapshot.fingerprint()[..12]
    );
    Ok(snapshot)
}

pub async fn load_success_stories(
    store: &dyn RecordStore,
    timeout: Duration,
) -> Result<Vec<SuccessStory>, StoreError> {
    let rows = with_timeout(timeout, store.fetch_success_stories()).await?;
    Ok(validate_stories(rows).accepted)
}

/// Children and stories are fetched concurrently, as the dashboard does on load.
pub async fn load_dashboard_data(
    store: &dyn RecordStore,
    timeout: Duration,
) -> Result<(RecordSnapshot, Vec<SuccessStory>), StoreError> {
    let (children, stories) = tokio::join!(
        load_children(store, Some(true), timeout),
        load_success_stories(store, timeout)
    );
    Ok((children?, stories?))
}

pub async fn load_donations(
    store: &dyn RecordStore,
    donor_id: &str,
    timeout: Duration,
) -> Result<Vec<Donation>, StoreError> {
    let rows = with_timeout(timeout, store.fetch_donations(donor_id)).await?;
    Ok(validate_rows(rows, "donation").accepted)
}
