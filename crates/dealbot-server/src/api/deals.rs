//! Deal listing and click-tracking handlers.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;

use dealbot_db::{ClickRecord, DealRecord};

use super::{
    map_store_error, normalize_hours, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct RecentDealsQuery {
    hours: Option<i64>,
    limit: Option<i64>,
    category: Option<String>,
}

pub(super) async fn list_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RecentDealsQuery>,
) -> Result<Json<ApiResponse<Vec<DealRecord>>>, ApiError> {
    let hours = normalize_hours(query.hours);
    let limit = normalize_limit(query.limit);

    let deals = state
        .store
        .recent_deals(hours, limit, query.category.as_deref())
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: deals,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(deal_id): Path<i64>,
) -> Result<Json<ApiResponse<DealRecord>>, ApiError> {
    let deal = state
        .store
        .get_deal(deal_id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "deal not found"))?;

    Ok(Json(ApiResponse {
        data: deal,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Record a dashboard click against a deal and bump its counter.
pub(super) async fn record_click(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(deal_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ClickRecord>>, ApiError> {
    let header_str =
        |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let click = state
        .store
        .record_click(
            deal_id,
            0,
            header_str("x-forwarded-for"),
            header_str("user-agent"),
            header_str("referer"),
        )
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: click,
        meta: ResponseMeta::new(req_id.0),
    }))
}
