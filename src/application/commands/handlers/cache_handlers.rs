//! Cache Command Handlers

use std::sync::Arc;

use crate::application::commands::cache_commands::*;
use crate::application::error::ApplicationError;
use crate::application::limits::RequestLimits;
use crate::application::ports::{TrimUpdate, WaveformCachePort};
use crate::domain::{SeriesKind, TrimRange};

/// TrimUpdate Handler - 裁剪后的增量更新
pub struct TrimUpdateHandler {
    cache: Arc<dyn WaveformCachePort>,
    limits: RequestLimits,
}

impl TrimUpdateHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>, limits: RequestLimits) -> Self {
        Self { cache, limits }
    }

    pub async fn handle(&self, cmd: TrimUpdateCommand) -> Result<TrimUpdateResponse, ApplicationError> {
        self.limits.check_path(&cmd.old_path)?;
        self.limits.check_path(&cmd.new_path)?;
        self.limits.check_count(cmd.count)?;

        let range = TrimRange::new(cmd.original_duration, cmd.trim_start, cmd.trim_end);
        self.limits.check_trim(&range)?;

        tracing::debug!(
            old_path = %cmd.old_path.display(),
            new_path = %cmd.new_path.display(),
            kind = %cmd.kind,
            "Trim update requested"
        );

        let update = TrimUpdate {
            old_path: cmd.old_path,
            new_path: cmd.new_path,
            range,
            target_count: cmd.count,
        };

        let response = match cmd.kind {
            SeriesKind::Envelope => {
                TrimUpdateResponse::Envelope(self.cache.samples_after_trim(update).await)
            }
            SeriesKind::MinMax => {
                TrimUpdateResponse::MinMax(self.cache.min_max_samples_after_trim(update).await)
            }
        };
        Ok(response)
    }
}

/// ClearCache Handler
pub struct ClearCacheHandler {
    cache: Arc<dyn WaveformCachePort>,
}

impl ClearCacheHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self, cmd: ClearCacheCommand) -> Result<(), ApplicationError> {
        if cmd.path.as_os_str().is_empty() {
            return Err(ApplicationError::validation("Path cannot be empty"));
        }
        self.cache.clear_cache(cmd.path).await;
        Ok(())
    }
}

/// ClearAllCache Handler
pub struct ClearAllCacheHandler {
    cache: Arc<dyn WaveformCachePort>,
}

impl ClearAllCacheHandler {
    pub fn new(cache: Arc<dyn WaveformCachePort>) -> Self {
        Self { cache }
    }

    pub async fn handle(&self, _cmd: ClearAllCacheCommand) {
        self.cache.clear_all_cache().await;
    }
}
