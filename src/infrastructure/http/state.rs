//! Application State
//!
//! 所有 Command/Query Handlers 共用同一个缓存端口

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ClearAllCacheHandler, ClearCacheHandler, TrimUpdateHandler,
    // Query handlers
    GetCacheStatsHandler, GetMinMaxSamplesHandler, GetSamplesHandler,
    // Ports
    RequestLimits, WaveformCachePort,
};

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub cache: Arc<dyn WaveformCachePort>,

    // ========== Command Handlers ==========
    pub trim_update_handler: TrimUpdateHandler,
    pub clear_cache_handler: ClearCacheHandler,
    pub clear_all_cache_handler: ClearAllCacheHandler,

    // ========== Query Handlers ==========
    pub get_samples_handler: GetSamplesHandler,
    pub get_min_max_samples_handler: GetMinMaxSamplesHandler,
    pub get_cache_stats_handler: GetCacheStatsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(cache: Arc<dyn WaveformCachePort>, limits: RequestLimits) -> Self {
        Self {
            cache: cache.clone(),

            // Command handlers
            trim_update_handler: TrimUpdateHandler::new(cache.clone(), limits),
            clear_cache_handler: ClearCacheHandler::new(cache.clone()),
            clear_all_cache_handler: ClearAllCacheHandler::new(cache.clone()),

            // Query handlers
            get_samples_handler: GetSamplesHandler::new(cache.clone(), limits),
            get_min_max_samples_handler: GetMinMaxSamplesHandler::new(cache.clone(), limits),
            get_cache_stats_handler: GetCacheStatsHandler::new(cache),
        }
    }
}
