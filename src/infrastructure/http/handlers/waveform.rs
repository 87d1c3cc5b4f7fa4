//! Waveform HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GetMinMaxSamplesQuery, GetSamplesQuery};
use crate::infrastructure::http::dto::{
    ApiResponse, MinMaxData, SamplesData, SamplesRequest, TrimData, TrimRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 包络
pub async fn get_samples(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SamplesRequest>,
) -> Result<Json<ApiResponse<SamplesData>>, ApiError> {
    let result = state
        .get_samples_handler
        .handle(GetSamplesQuery {
            path: req.path.into(),
            count: req.count,
        })
        .await?;

    Ok(Json(ApiResponse::success(SamplesData {
        count: result.samples.len(),
        samples: result.samples,
    })))
}

/// min/max 对
pub async fn get_min_max_samples(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SamplesRequest>,
) -> Result<Json<ApiResponse<MinMaxData>>, ApiError> {
    let result = state
        .get_min_max_samples_handler
        .handle(GetMinMaxSamplesQuery {
            path: req.path.into(),
            count: req.count,
        })
        .await?;

    Ok(Json(ApiResponse::success(MinMaxData {
        count: result.samples.len(),
        samples: result.samples,
    })))
}

/// 裁剪后更新
pub async fn trim_update(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrimRequest>,
) -> Result<Json<ApiResponse<TrimData>>, ApiError> {
    let result = state.trim_update_handler.handle(req.into()).await?;
    Ok(Json(ApiResponse::success(result.into())))
}
