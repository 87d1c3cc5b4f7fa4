//! Waveform Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::limits::RequestLimits;
use crate::application::ports::{CacheStats, WaveformCachePort};
use crate::application::queries::waveform_queries::*;

/// GetSamples Handler - 获取包络
pub struct GetSamplesHandler {
    cache: Arc<dyn WaveformCachePort>,
    limits: RequestLimits,
}

impl GetSamplesHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>, limits: RequestLimits) -> Self {
        Self { cache, limits }
    }

    pub async fn handle(&self, query: GetSamplesQuery) -> Result<SamplesResponse, ApplicationError> {
        self.limits.check_path(&query.path)?;
        self.limits.check_count(query.count)?;

        let samples = self.cache.samples(query.path, query.count).await;
        Ok(SamplesResponse { samples })
    }
}

/// GetMinMaxSamples Handler - 获取 min/max 对
pub struct GetMinMaxSamplesHandler {
    cache: Arc<dyn WaveformCachePort>,
    limits: RequestLimits,
}

impl GetMinMaxSamplesHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>, limits: RequestLimits) -> Self {
        Self { cache, limits }
    }

    pub async fn handle(
        &self,
        query: GetMinMaxSamplesQuery,
    ) -> Result<MinMaxSamplesResponse, ApplicationError> {
        self.limits.check_path(&query.path)?;
        self.limits.check_count(query.count)?;

        let samples = self.cache.min_max_samples(query.path, query.count).await;
        Ok(MinMaxSamplesResponse { samples })
    }
}

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    cache: Arc<dyn WaveformCachePort>,
}

impl GetCacheStatsHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self) -> CacheStats {
        self.cache.stats().await
    }
}
