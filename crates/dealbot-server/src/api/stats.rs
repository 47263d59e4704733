//! Aggregate dashboard statistics.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use dealbot_db::DealStats;

use super::{map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub(super) struct StatsData {
    #[serde(flatten)]
    stats: DealStats,
    conversion_rate: f64,
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StatsData>>, ApiError> {
    let stats = state
        .store
        .deal_stats()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    let conversion_rate = stats.conversion_rate();
    Ok(Json(ApiResponse {
        data: StatsData {
            stats,
            conversion_rate,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
