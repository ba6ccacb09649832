//! HTTP routes for valuation requests

use crate::ingestion::CsvSaleSource;
use crate::valuation::batch::{valuate_batch, valuate_batch_from_source, BatchOutcome};
use crate::valuation::{
    ComparableSale, SubjectProperty, ValuationEngine, ValuationError, ValuationResult,
    ValuationSummary,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ValuationEngine>,
    /// Default sale-record source for requests that carry no sales
    pub source: Option<Arc<CsvSaleSource>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error("request has no sales and no sale record source is configured")]
    NoSaleSource,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Valuation(ValuationError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Valuation(ValuationError::Source(_)) => StatusCode::BAD_GATEWAY,
            ApiError::NoSaleSource => StatusCode::BAD_REQUEST,
        };

        if status.is_server_error() {
            warn!("Valuation request failed: {}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ValuationRequest {
    pub subject: SubjectProperty,
    #[serde(default)]
    pub sales: Option<Vec<ComparableSale>>,
    /// Defaults to today
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct BatchValuationRequest {
    pub subjects: Vec<SubjectProperty>,
    #[serde(default)]
    pub sales: Option<Vec<ComparableSale>>,
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

/// Client-facing view of a valuation: the stable summary plus the statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResponse {
    pub valuation: ValuationSummary,
    pub valuation_statement: String,
    pub insufficient_evidence: bool,
}

impl From<&ValuationResult> for ValuationResponse {
    fn from(result: &ValuationResult) -> Self {
        Self {
            valuation: result.summary(),
            valuation_statement: result.valuation_statement.clone(),
            insufficient_evidence: result.insufficient_evidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ValuationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn from_outcome(index: usize, outcome: &BatchOutcome) -> Self {
        match outcome {
            Ok(result) => Self {
                index,
                result: Some(ValuationResponse::from(result)),
                error: None,
            },
            Err(err) => Self {
                index,
                result: None,
                error: Some(err.to_string()),
            },
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/api/health", get(health_check))
        .route("/api/valuations", post(create_valuation))
        .route("/api/valuations/batch", post(create_batch_valuation))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Valuation API is running!".to_string(),
        status: "ok".to_string(),
    })
}

async fn create_valuation(
    State(state): State<AppState>,
    Json(request): Json<ValuationRequest>,
) -> Result<Json<ValuationResponse>, ApiError> {
    let reference_date = request.reference_date.unwrap_or_else(today);

    let result = match (&request.sales, &state.source) {
        (Some(sales), _) => state
            .engine
            .valuate(&request.subject, sales, reference_date)?,
        (None, Some(source)) => {
            state
                .engine
                .valuate_from_source(&request.subject, source, reference_date)?
        }
        (None, None) => return Err(ApiError::NoSaleSource),
    };

    Ok(Json(ValuationResponse::from(&result)))
}

async fn create_batch_valuation(
    State(state): State<AppState>,
    Json(request): Json<BatchValuationRequest>,
) -> Result<Json<Vec<BatchEntry>>, ApiError> {
    let reference_date = request.reference_date.unwrap_or_else(today);
    let engine = Arc::clone(&state.engine);

    let outcomes = match (request.sales, &state.source) {
        (Some(sales), _) => {
            valuate_batch(engine, request.subjects, sales.into(), reference_date).await
        }
        (None, Some(source)) => {
            valuate_batch_from_source(engine, request.subjects, Arc::clone(source), reference_date)
                .await
        }
        (None, None) => return Err(ApiError::NoSaleSource),
    };

    let entries = outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| BatchEntry::from_outcome(index, outcome))
        .collect();

    Ok(Json(entries))
}
