//! HTTP API
//!
//! Everything under `/api/v1` sits behind the bearer gate; `/health` does not.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State, rejection::QueryRejection},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use tracing::error;

use crate::AdvisoryError;
use crate::service::{AdvisoryService, RefreshOutcome};

pub mod dto;

pub use dto::{AdvisoryResponse, AdvisoryWithAudit, ApiResponse, ResponseStatus};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AdvisoryService>,
    /// Expected bearer token; `None` leaves the API open
    pub bearer_token: Option<Arc<str>>,
    /// Report per-city audit types from multi-city refreshes
    pub multi_city_audit: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdvisoryQuery {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Deserialize)]
pub struct CountryQuery {
    pub country: String,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, AdvisoryError>;

pub fn router(state: AppState) -> Router {
    let advisories = Router::new()
        .route("/advisories", get(get_advisories).delete(delete_country))
        .route("/advisories/refresh", post(refresh))
        .route("/advisories/search", get(search))
        .route("/advisories/{city}", delete(delete_city))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", advisories)
        .with_state(state)
}

impl IntoResponse for AdvisoryError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self {
            AdvisoryError::Validation { message } => message.clone(),
            AdvisoryError::Upstream { .. } => self.to_string(),
            _ => {
                error!("Unhandled error: {}", self);
                "Something went wrong".to_string()
            }
        };

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.bearer_token.as_deref() else {
        return next.run(request).await;
    };

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected);

    if authorized {
        next.run(request).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("UP"))
}

async fn get_advisories(
    State(state): State<AppState>,
    Query(query): Query<AdvisoryQuery>,
) -> ApiResult<Vec<AdvisoryResponse>> {
    let advisories = state
        .service
        .fetch(query.city.as_deref(), query.country.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(
        advisories.iter().map(AdvisoryResponse::from).collect(),
    )))
}

async fn refresh(
    State(state): State<AppState>,
    Query(query): Query<AdvisoryQuery>,
) -> Result<Response, AdvisoryError> {
    let outcome = state
        .service
        .refresh(query.city.as_deref(), query.country.as_deref())
        .await?;

    let response = match outcome {
        RefreshOutcome::City(synced) => Json(ApiResponse::success_with_audit(
            vec![AdvisoryResponse::from(&synced.advisory)],
            synced.audit,
        ))
        .into_response(),
        RefreshOutcome::Cities(synced) if state.multi_city_audit => Json(ApiResponse::success(
            synced.iter().map(AdvisoryWithAudit::from).collect::<Vec<_>>(),
        ))
        .into_response(),
        RefreshOutcome::Cities(synced) => Json(ApiResponse::success(
            synced
                .iter()
                .map(|s| AdvisoryResponse::from(&s.advisory))
                .collect::<Vec<_>>(),
        ))
        .into_response(),
    };
    Ok(response)
}

async fn search(
    State(state): State<AppState>,
    range: Result<Query<TemperatureRange>, QueryRejection>,
) -> ApiResult<Vec<AdvisoryResponse>> {
    let Query(range) = range.map_err(|_| {
        AdvisoryError::validation("Query parameters min and max must be numbers")
    })?;

    let advisories = state
        .service
        .search_by_temperature(range.min, range.max)
        .await?;
    Ok(Json(ApiResponse::success(
        advisories.iter().map(AdvisoryResponse::from).collect(),
    )))
}

async fn delete_city(State(state): State<AppState>, Path(city): Path<String>) -> ApiResult<String> {
    state.service.delete_city(&city).await?;
    Ok(Json(ApiResponse::success(format!("Deleted city: {city}"))))
}

async fn delete_country(
    State(state): State<AppState>,
    query: Result<Query<CountryQuery>, QueryRejection>,
) -> ApiResult<String> {
    let Query(query) =
        query.map_err(|_| AdvisoryError::validation("Query parameter country is required"))?;

    let removed = state.service.delete_country(&query.country).await?;
    Ok(Json(ApiResponse::success(format!(
        "Deleted {removed} advisories for {}",
        query.country.trim()
    ))))
}
