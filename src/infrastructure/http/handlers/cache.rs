//! Cache HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CacheStats, ClearAllCacheCommand, ClearCacheCommand};
use crate::infrastructure::http::dto::{ApiResponse, ClearCacheRequest, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 清除某个源
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClearCacheRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .clear_cache_handler
        .handle(ClearCacheCommand {
            path: req.path.into(),
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 清空
pub async fn clear_all_cache(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Empty>> {
    state
        .clear_all_cache_handler
        .handle(ClearAllCacheCommand)
        .await;
    Json(ApiResponse::ok())
}

/// 统计信息
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CacheStats>> {
    let stats = state.get_cache_stats_handler.handle().await;
    Json(ApiResponse::success(stats))
}
