use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{summarize, summarize_risk, Aggregates, DashboardState, FilterSpec};
use crate::engine::{RankedChild, RiskModel, RiskSummary, SummaryStats};
use crate::records::validate::{parse_insert_payload, validate_rows};
use crate::records::{ChildRecord, Donation, DonationRequest, SuccessStory};
use crate::report::csv::{children_to_csv, CHILDREN_CSV_FILENAME};
use crate::store::{
    load_children, load_donations, load_success_stories, with_timeout, RecordStore, StoreError,
};

#[derive(Clone)]
pub struct ApiState {
    store: Arc<dyn RecordStore>,
    risk_model: RiskModel,
    timeout: Duration,
    top_n: usize,
}

impl ApiState {
    pub fn new(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            store,
            risk_model: config.risk_model(),
            timeout: config.store.timeout(),
            top_n: config.risk.top_n,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }

    /// Requests the store refused are client errors; anything else is a server error.
    fn from_store(error: StoreError) -> Self {
        if error.is_rejection() {
            Self::bad_request(error.to_string())
        } else {
            Self::internal(error)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!("request failed with {}: {}", self.status, self.message);
        }
        let body = Json(ApiErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
struct RiskQuery {
    top: Option<String>,
}

impl RiskQuery {
    /// Unset or blank means the configured default; anything non-numeric is a 400.
    fn top(&self, default: usize) -> ApiResult<usize> {
        match self.top.as_deref().map(str::trim) {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                ApiError::bad_request(format!("top must be a non-negative integer, got {raw:?}"))
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DonationsQuery {
    donor_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnalyticsResponse {
    fingerprint: String,
    filters: FilterSpec,
    matched: usize,
    summary: SummaryStats,
    aggregates: Aggregates,
}

#[derive(Debug, Serialize)]
struct RiskResponse {
    summary: RiskSummary,
    ranked: Vec<RankedChild>,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/api/children", get(list_children).post(insert_children))
        .route("/api/success-stories", get(list_success_stories))
        .route("/api/analytics", get(analytics))
        .route("/api/risk", get(risk))
        .route("/api/export/children.csv", get(export_children_csv))
        .route("/api/donations", get(list_donations).post(create_donation))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: &Config, store: Arc<dyn RecordStore>) -> Result<()> {
    let bind = config.server.bind_addr();
    let listener = TcpListener::bind(&bind).await?;
    info!("CSR dashboard proxy listening on http://{bind} ({} store)", store.name());
    serve(listener, ApiState::new(store, config)).await
}

pub async fn serve(listener: TcpListener, state: ApiState) -> Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health(State(state): State<ApiState>) -> Response {
    match with_timeout(state.timeout, state.store.ping()).await {
        Ok(()) => {
            let message = format!(
                "CSR dashboard backend is running and connected to the {} store",
                state.store.name()
            );
            (StatusCode::OK, message).into_response()
        }
        Err(error) => {
            warn!("record store health check failed: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Record store connection failed".to_string(),
            )
                .into_response()
        }
    }
}

async fn list_children(State(state): State<ApiState>, headers: HeaderMap) -> ApiResult<Response> {
    let snapshot = load_children(state.store.as_ref(), Some(true), state.timeout)
        .await
        .map_err(ApiError::internal)?;
    let etag = format!("\"{}\"", snapshot.fingerprint());
    let etag_value = HeaderValue::from_str(&etag).map_err(ApiError::internal)?;

    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == etag)
        .unwrap_or(false);
    if unchanged {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }
    let children: Vec<ChildRecord> = snapshot.children().to_vec();
    Ok(([(header::ETAG, etag_value)], Json(children)).into_response())
}

async fn insert_children(State(state): State<ApiState>, body: Bytes) -> ApiResult<Response> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;
    let batch = parse_insert_payload(payload).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let inserted = with_timeout(state.timeout, state.store.insert_children(&batch))
        .await
        .map_err(ApiError::from_store)?;
    info!("inserted {} children via proxy", inserted.len());
    Ok((StatusCode::CREATED, Json(inserted)).into_response())
}

async fn list_success_stories(State(state): State<ApiState>) -> ApiResult<Json<Vec<SuccessStory>>> {
    let stories = load_success_stories(state.store.as_ref(), state.timeout)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(stories))
}

async fn filtered_state(state: &ApiState, filters: FilterSpec) -> ApiResult<DashboardState> {
    let snapshot = load_children(state.store.as_ref(), Some(true), state.timeout)
        .await
        .map_err(ApiError::internal)?;
    Ok(DashboardState::new(snapshot, state.risk_model.clone()).with_filters(filters))
}

async fn analytics(
    State(state): State<ApiState>,
    Query(filters): Query<FilterSpec>,
) -> ApiResult<Json<AnalyticsResponse>> {
    let dashboard = filtered_state(&state, filters).await?;
    let view = dashboard.view();
    Ok(Json(AnalyticsResponse {
        fingerprint: view.fingerprint,
        filters: view.filters,
        matched: view.filtered.len(),
        summary: summarize(&view.filtered),
        aggregates: view.aggregates,
    }))
}

async fn risk(
    State(state): State<ApiState>,
    Query(filters): Query<FilterSpec>,
    Query(query): Query<RiskQuery>,
) -> ApiResult<Json<RiskResponse>> {
    let top = query.top(state.top_n)?;
    let dashboard = filtered_state(&state, filters).await?;
    let mut ranked = dashboard.risk_model().rank(&dashboard.filtered());
    let summary = summarize_risk(&ranked);
    ranked.truncate(top);
    Ok(Json(RiskResponse { summary, ranked }))
}

async fn export_children_csv(
    State(state): State<ApiState>,
    Query(filters): Query<FilterSpec>,
) -> ApiResult<Response> {
    let dashboard = filtered_state(&state, filters).await?;
    let body = children_to_csv(&dashboard.filtered());
    let disposition = format!("attachment; filename=\"{CHILDREN_CSV_FILENAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn create_donation(State(state): State<ApiState>, body: Bytes) -> ApiResult<Response> {
    let request: DonationRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid donation request: {e}")))?;
    let donation = request
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let row = with_timeout(state.timeout, state.store.insert_donation(&donation))
        .await
        .map_err(ApiError::from_store)?;
    let mut report = validate_rows::<Donation>(vec![row], "donation");
    let created = report
        .accepted
        .pop()
        .ok_or_else(|| ApiError::internal("store returned an unreadable donation row"))?;
    info!(
        "recorded donation {} of {} {} for {}",
        created.id, created.amount, created.currency, created.donor_id
    );
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn list_donations(
    State(state): State<ApiState>,
    Query(query): Query<DonationsQuery>,
) -> ApiResult<Json<Vec<Donation>>> {
    let donor_id = query
        .donor_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("donor_id query parameter is required"))?;
    let donations = load_donations(state.store.as_ref(), &donor_id, state.timeout)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(donations))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::{ApiError, RiskQuery};
    use crate::records::RecordError;
    use crate::store::StoreError;

    #[test]
    fn store_rejections_map_to_bad_request() {
        let rejected = ApiError::from_store(StoreError::Invalid(RecordError::Empty));
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
        let timeout = ApiError::from_store(StoreError::Timeout(std::time::Duration::from_secs(10)));
        assert_eq!(timeout.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(timeout.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn risk_top_falls_back_and_rejects_text() {
        let query = |top: Option<&str>| RiskQuery {
            top: top.map(ToString::to_string),
        };
        assert_eq!(query(None).top(10).expect("default"), 10);
        assert_eq!(query(Some("")).top(10).expect("blank"), 10);
        assert_eq!(query(Some("3")).top(10).expect("number"), 3);
        let error = query(Some("abc")).top(10).expect_err("text is rejected");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert!(error.message.contains("abc"));
    }
}
