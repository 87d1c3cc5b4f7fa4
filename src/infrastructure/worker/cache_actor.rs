//! Waveform Cache Actor
//!
//! 缓存表、两个重采样 memo、延迟写计时器都归一个 tokio 任务独占，
//! 外部只能通过 `WaveformCacheHandle` 发消息。消息按到达顺序串行处理，
//! 任意两次修改之间不会交错，快照也总是某个一致时刻的副本。
//!
//! 解码不在 actor 里做：handle 在未命中时调用 ExtractionWorker，
//! 拿到结果后再发 Install 消息。

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::ports::{
    AudioDecoderPort, CacheStats, Snapshot, SnapshotStorePort, TrimUpdate, WaveformCachePort,
};
use crate::domain::waveform::{trim_envelope, trim_min_max, PersistedKey};
use crate::domain::{
    CacheKey, ExtractedSeries, MinMaxPair, ResampleMemo, SeriesKind, SourceIdentity, TrimRange,
};
use crate::infrastructure::memory::{WaveformStore, DEFAULT_CAPACITY};

use super::debounce::Debouncer;
use super::extraction_worker::{ExtractionSettings, ExtractionWorker};

/// 缓存配置
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// 最多缓存的 key 数
    pub capacity: usize,
    /// 修改后多久写快照
    pub persist_debounce: Duration,
    pub extraction: ExtractionSettings,
    /// 命令队列长度
    pub channel_capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            persist_debounce: Duration::from_millis(2000),
            extraction: ExtractionSettings::default(),
            channel_capacity: 256,
        }
    }
}

/// 重采样后的结果
#[derive(Debug, Clone)]
enum ResampledSeries {
    Envelope(Arc<[f32]>),
    MinMax(Arc<[MinMaxPair]>),
}

impl ResampledSeries {
    fn into_envelope(self) -> Vec<f32> {
        match self {
            Self::Envelope(series) => series.to_vec(),
            Self::MinMax(_) => Vec::new(),
        }
    }

    fn into_min_max(self) -> Vec<MinMaxPair> {
        match self {
            Self::MinMax(series) => series.to_vec(),
            Self::Envelope(_) => Vec::new(),
        }
    }
}

#[derive(Debug)]
struct TrimReuseRequest {
    old_location: String,
    /// 旧源按当前身份派生的 key，反向索引里没有时使用
    old_key: CacheKey,
    new_location: String,
    new_key: CacheKey,
    range: TrimRange,
    kind: SeriesKind,
    target: usize,
}

/// Actor 消息
enum CacheCommand {
    Lookup {
        key: CacheKey,
        location: String,
        kind: SeriesKind,
        target: usize,
        reply: oneshot::Sender<Option<ResampledSeries>>,
    },
    Install {
        key: CacheKey,
        location: String,
        series: ExtractedSeries,
        /// 来自裁剪回退的完整提取时，记录对应的裁剪区间
        trim: Option<TrimRange>,
        kind: SeriesKind,
        target: usize,
        reply: oneshot::Sender<Option<ResampledSeries>>,
    },
    TrimReuse {
        request: TrimReuseRequest,
        reply: oneshot::Sender<Option<ResampledSeries>>,
    },
    Clear {
        location: String,
        key: CacheKey,
        reply: oneshot::Sender<usize>,
    },
    ClearAll {
        reply: oneshot::Sender<()>,
    },
    Flush {
        reply: oneshot::Sender<()>,
    },
    Stats {
        reply: oneshot::Sender<CacheStats>,
    },
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    extractions: u64,
    trim_reuses: u64,
}

/// 同一个 key 的两种序列
#[derive(Default)]
struct RestoredEntry {
    location: Option<String>,
    envelope: Option<Vec<f32>>,
    min_max: Option<Vec<MinMaxPair>>,
}

struct Restored {
    entries: BTreeMap<CacheKey, RestoredEntry>,
    /// 非当前格式（或无效）的 key 数量
    migrated: usize,
}

struct WaveformCacheActor {
    store: WaveformStore,
    envelope_memo: ResampleMemo<f32>,
    min_max_memo: ResampleMemo<MinMaxPair>,
    debouncer: Debouncer,
    snapshot_store: Arc<dyn SnapshotStorePort>,
    receiver: mpsc::Receiver<CacheCommand>,
    counters: Counters,
    /// key -> 生成其内容的裁剪区间
    trim_origins: HashMap<CacheKey, TrimRange>,
    snapshot_writes: Arc<AtomicU64>,
    in_flight: Option<JoinHandle<()>>,
}

impl WaveformCacheActor {
    async fn run(mut self) {
        self.restore().await;
        tracing::info!(
            capacity = self.store.capacity(),
            entries = self.store.len(),
            "Waveform cache actor started"
        );

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = self.debouncer.fired() => {
                    self.debouncer.cancel();
                    self.persist().await;
                }
            }
        }

        if self.debouncer.is_pending() {
            self.debouncer.cancel();
            self.persist().await;
        }
        self.wait_for_write().await;

        tracing::info!("Waveform cache actor stopped");
    }

    async fn handle(&mut self, command: CacheCommand) {
        match command {
            CacheCommand::Lookup {
                key,
                location,
                kind,
                target,
                reply,
            } => {
                let result = self.resampled(&key, kind, target);
                if result.is_some() {
                    self.counters.hits += 1;
                    // 快照恢复的 key 没有 location，命中时补登记
                    self.store.register(&key, &location);
                } else {
                    self.counters.misses += 1;
                }
                let _ = reply.send(result);
            }
            CacheCommand::Install {
                key,
                location,
                series,
                trim,
                kind,
                target,
                reply,
            } => {
                self.counters.extractions += 1;
                self.install(
                    key.clone(),
                    &location,
                    Some(series.envelope),
                    Some(series.min_max),
                );
                if let Some(range) = trim {
                    self.trim_origins.insert(key.clone(), range);
                }
                let _ = reply.send(self.resampled(&key, kind, target));
            }
            CacheCommand::TrimReuse { request, reply } => {
                let result = self.trim_reuse(request);
                let _ = reply.send(result);
            }
            CacheCommand::Clear {
                location,
                key,
                reply,
            } => {
                let mut removed = self.store.clear_source(&location);
                if self.store.remove(&key) {
                    removed.push(key);
                }
                for key in &removed {
                    self.invalidate(key);
                }
                if !removed.is_empty() {
                    self.debouncer.schedule();
                }
                let _ = reply.send(removed.len());
            }
            CacheCommand::ClearAll { reply } => {
                self.store.clear_all();
                self.envelope_memo.clear();
                self.min_max_memo.clear();
                self.trim_origins.clear();
                self.debouncer.schedule();
                let _ = reply.send(());
            }
            CacheCommand::Flush { reply } => {
                if self.debouncer.is_pending() {
                    self.debouncer.cancel();
                    self.persist().await;
                }
                self.wait_for_write().await;
                let _ = reply.send(());
            }
            CacheCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    /// 取出并重采样，未缓存返回 None
    fn resampled(
        &mut self,
        key: &CacheKey,
        kind: SeriesKind,
        target: usize,
    ) -> Option<ResampledSeries> {
        match kind {
            SeriesKind::Envelope => {
                let series = self.store.get_envelope(key)?;
                Some(ResampledSeries::Envelope(
                    self.envelope_memo.get_or_compute(key, target, &series),
                ))
            }
            SeriesKind::MinMax => {
                let series = self.store.get_min_max(key)?;
                Some(ResampledSeries::MinMax(
                    self.min_max_memo.get_or_compute(key, target, &series),
                ))
            }
        }
    }

    fn install(
        &mut self,
        key: CacheKey,
        location: &str,
        envelope: Option<Vec<f32>>,
        min_max: Option<Vec<MinMaxPair>>,
    ) {
        self.invalidate(&key);

        let evicted = match (envelope, min_max) {
            (Some(envelope), Some(min_max)) => self.store.put_series(
                key,
                Some(location),
                ExtractedSeries { envelope, min_max },
            ),
            (Some(envelope), None) => self.store.put_envelope(key, Some(location), envelope),
            (None, Some(min_max)) => self.store.put_min_max(key, Some(location), min_max),
            (None, None) => return,
        };

        for key in &evicted {
            self.invalidate(key);
        }
        self.debouncer.schedule();
    }

    fn trim_reuse(&mut self, request: TrimReuseRequest) -> Option<ResampledSeries> {
        // 原地裁剪且身份没变时新旧 key 相同，只有同一区间裁出来的内容才能直接用
        let target_ready = request.new_key != request.old_key
            || self.trim_origins.get(&request.new_key) == Some(&request.range);
        if target_ready {
            if let Some(result) = self.resampled(&request.new_key, request.kind, request.target) {
                self.counters.hits += 1;
                self.store.register(&request.new_key, &request.new_location);
                return Some(result);
            }
        }

        // 新 key 的内容永远不作为切片来源，否则会被重复裁剪
        let source_key = match self
            .store
            .best_key_for(&request.old_location, Some(&request.new_key))
        {
            Some(key) => key,
            None if request.old_key != request.new_key && self.store.contains(&request.old_key) => {
                self.store
                    .register(&request.old_key, &request.old_location);
                request.old_key.clone()
            }
            None => {
                tracing::debug!(
                    location = %request.old_location,
                    "No cached waveform for trimmed source"
                );
                return None;
            }
        };

        let range = request.range;
        let envelope = self
            .store
            .get_envelope(&source_key)
            .and_then(|series| range.bucket_span(series.len()).map(|span| trim_envelope(&series, span)));
        let min_max = self
            .store
            .get_min_max(&source_key)
            .and_then(|series| range.bucket_span(series.len()).map(|span| trim_min_max(&series, span)));

        let available = match request.kind {
            SeriesKind::Envelope => envelope.is_some(),
            SeriesKind::MinMax => min_max.is_some(),
        };
        if !available {
            tracing::debug!(
                location = %request.old_location,
                kind = %request.kind,
                duration = range.original_duration,
                start = range.start,
                end = range.end,
                "Trim range not reusable"
            );
            return None;
        }

        self.install(request.new_key.clone(), &request.new_location, envelope, min_max);
        self.trim_origins.insert(request.new_key.clone(), range);
        self.counters.trim_reuses += 1;
        tracing::debug!(
            from = %request.old_location,
            to = %request.new_location,
            "Trimmed waveform derived from cached series"
        );

        self.resampled(&request.new_key, request.kind, request.target)
    }

    fn invalidate(&mut self, key: &CacheKey) {
        self.envelope_memo.invalidate(key);
        self.min_max_memo.invalidate(key);
        self.trim_origins.remove(key);
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.store.len(),
            capacity: self.store.capacity(),
            indexed_sources: self.store.indexed_sources(),
            hit_count: self.counters.hits,
            miss_count: self.counters.misses,
            extraction_count: self.counters.extractions,
            trim_reuse_count: self.counters.trim_reuses,
            eviction_count: self.store.eviction_count(),
            memo_hit_count: self.envelope_memo.hits() + self.min_max_memo.hits(),
            snapshot_writes: self.snapshot_writes.load(Ordering::Relaxed),
        }
    }

    /// 把当前表的副本交给阻塞线程池写出
    ///
    /// 先等上一次写完，保证落盘顺序和修改顺序一致。
    async fn persist(&mut self) {
        self.wait_for_write().await;

        let snapshot = self.store.snapshot();
        let store = self.snapshot_store.clone();
        let writes = self.snapshot_writes.clone();

        self.in_flight = Some(tokio::task::spawn_blocking(move || {
            match store.save(&snapshot) {
                Ok(()) => {
                    writes.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(entries = snapshot.entry_count(), "Waveform snapshot written");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to write waveform snapshot");
                }
            }
        }));
    }

    async fn wait_for_write(&mut self) {
        if let Some(write) = self.in_flight.take() {
            if let Err(e) = write.await {
                tracing::error!(error = %e, "Snapshot write task panicked");
            }
        }
    }

    /// 加载快照并迁移历史 key
    async fn restore(&mut self) {
        let snapshot_store = self.snapshot_store.clone();
        let restored =
            match tokio::task::spawn_blocking(move || load_and_migrate(snapshot_store.as_ref()))
                .await
            {
                Ok(restored) => restored,
                Err(e) => {
                    tracing::error!(error = %e, "Snapshot load task panicked, starting empty");
                    return;
                }
            };

        for (key, entry) in restored.entries {
            let location = entry.location.as_deref();
            match (entry.envelope, entry.min_max) {
                (Some(envelope), Some(min_max)) => {
                    self.store
                        .put_series(key, location, ExtractedSeries { envelope, min_max });
                }
                (Some(envelope), None) => {
                    self.store.put_envelope(key, location, envelope);
                }
                (None, Some(min_max)) => {
                    self.store.put_min_max(key, location, min_max);
                }
                (None, None) => {}
            }
        }

        if restored.migrated > 0 {
            tracing::info!(
                migrated = restored.migrated,
                "Legacy waveform cache keys migrated"
            );
            self.debouncer.schedule();
        }
    }
}

fn load_and_migrate(store: &dyn SnapshotStorePort) -> Restored {
    let snapshot = match store.load() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(error = %e, "Waveform snapshot unreadable, starting empty");
            Snapshot::default()
        }
    };

    let mut migrated = 0;
    let mut entries: BTreeMap<CacheKey, RestoredEntry> = BTreeMap::new();

    for (key, location, series) in migrate_table(snapshot.envelopes, &mut migrated) {
        let entry = entries.entry(key).or_default();
        entry.location = entry.location.take().or(location);
        entry.envelope = Some(series);
    }
    for (key, location, series) in migrate_table(snapshot.min_max, &mut migrated) {
        let entry = entries.entry(key).or_default();
        entry.location = entry.location.take().or(location);
        entry.min_max = Some(series);
    }

    Restored { entries, migrated }
}

fn migrate_table<T>(
    table: HashMap<String, Vec<T>>,
    migrated: &mut usize,
) -> Vec<(CacheKey, Option<String>, Vec<T>)> {
    table
        .into_iter()
        .filter_map(|(raw, series)| {
            let Some(persisted) = PersistedKey::classify(&raw) else {
                *migrated += 1;
                return None;
            };
            if !matches!(persisted, PersistedKey::Current(_)) {
                *migrated += 1;
            }
            let (key, location) = persisted.resolve();
            Some((key, location, series))
        })
        .collect()
}

/// Actor 的客户端
#[derive(Clone)]
pub struct WaveformCacheHandle {
    sender: mpsc::Sender<CacheCommand>,
    extractor: ExtractionWorker,
}

impl WaveformCacheHandle {
    /// 启动 actor
    ///
    /// 快照在 actor 任务里加载，加载期间到达的请求排队等待。
    /// 所有 handle 被 drop 后 actor 写出待处理的快照并退出，返回的 JoinHandle 在那之后完成。
    pub fn spawn(
        settings: CacheSettings,
        decoder: Arc<dyn AudioDecoderPort>,
        snapshot_store: Arc<dyn SnapshotStorePort>,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(settings.channel_capacity.max(1));

        let actor = WaveformCacheActor {
            store: WaveformStore::new(settings.capacity),
            envelope_memo: ResampleMemo::new(),
            min_max_memo: ResampleMemo::new(),
            debouncer: Debouncer::new(settings.persist_debounce),
            snapshot_store,
            receiver,
            counters: Counters::default(),
            trim_origins: HashMap::new(),
            snapshot_writes: Arc::new(AtomicU64::new(0)),
            in_flight: None,
        };
        let task = tokio::spawn(actor.run());

        let handle = Self {
            sender,
            extractor: ExtractionWorker::new(decoder, settings.extraction),
        };
        (handle, task)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> CacheCommand,
    ) -> Option<T> {
        let (reply, response) = oneshot::channel();
        if self.sender.send(command(reply)).await.is_err() {
            tracing::error!("Waveform cache actor has stopped");
            return None;
        }
        response.await.ok()
    }

    async fn identity_of(path: &Path) -> SourceIdentity {
        let owned = path.to_path_buf();
        match tokio::task::spawn_blocking(move || SourceIdentity::probe(&owned)).await {
            Ok(identity) => identity,
            Err(_) => SourceIdentity::new(path.to_string_lossy(), None),
        }
    }

    async fn series(
        &self,
        path: PathBuf,
        kind: SeriesKind,
        target: usize,
    ) -> Option<ResampledSeries> {
        let identity = Self::identity_of(&path).await;
        let key = CacheKey::derive(&identity);
        let location = identity.location().to_string();

        let cached = self
            .request(|reply| CacheCommand::Lookup {
                key: key.clone(),
                location: location.clone(),
                kind,
                target,
                reply,
            })
            .await?;
        if cached.is_some() {
            return cached;
        }

        self.extract_and_install(path, key, location, None, kind, target)
            .await
    }

    async fn extract_and_install(
        &self,
        path: PathBuf,
        key: CacheKey,
        location: String,
        trim: Option<TrimRange>,
        kind: SeriesKind,
        target: usize,
    ) -> Option<ResampledSeries> {
        let series = self.extractor.extract(path).await?;
        self.request(|reply| CacheCommand::Install {
            key,
            location,
            series,
            trim,
            kind,
            target,
            reply,
        })
        .await
        .flatten()
    }

    async fn trimmed(&self, update: TrimUpdate, kind: SeriesKind) -> Option<ResampledSeries> {
        let old_identity = Self::identity_of(&update.old_path).await;
        let new_identity = Self::identity_of(&update.new_path).await;
        let new_key = CacheKey::derive(&new_identity);
        let new_location = new_identity.location().to_string();

        let request = TrimReuseRequest {
            old_location: old_identity.location().to_string(),
            old_key: CacheKey::derive(&old_identity),
            new_location: new_location.clone(),
            new_key: new_key.clone(),
            range: update.range,
            kind,
            target: update.target_count,
        };

        let reused = self
            .request(|reply| CacheCommand::TrimReuse { request, reply })
            .await?;
        if reused.is_some() {
            return reused;
        }

        tracing::debug!(
            path = %update.new_path.display(),
            "Trim reuse unavailable, extracting trimmed source"
        );
        self.extract_and_install(
            update.new_path,
            new_key,
            new_location,
            Some(update.range),
            kind,
            update.target_count,
        )
        .await
    }
}

#[async_trait]
impl WaveformCachePort for WaveformCacheHandle {
    async fn samples(&self, path: PathBuf, target_count: usize) -> Vec<f32> {
        self.series(path, SeriesKind::Envelope, target_count)
            .await
            .map(ResampledSeries::into_envelope)
            .unwrap_or_default()
    }

    async fn min_max_samples(&self, path: PathBuf, target_count: usize) -> Vec<MinMaxPair> {
        self.series(path, SeriesKind::MinMax, target_count)
            .await
            .map(ResampledSeries::into_min_max)
            .unwrap_or_default()
    }

    async fn samples_after_trim(&self, update: TrimUpdate) -> Vec<f32> {
        self.trimmed(update, SeriesKind::Envelope)
            .await
            .map(ResampledSeries::into_envelope)
            .unwrap_or_default()
    }

    async fn min_max_samples_after_trim(&self, update: TrimUpdate) -> Vec<MinMaxPair> {
        self.trimmed(update, SeriesKind::MinMax)
            .await
            .map(ResampledSeries::into_min_max)
            .unwrap_or_default()
    }

    async fn clear_cache(&self, path: PathBuf) {
        let identity = Self::identity_of(&path).await;
        let key = CacheKey::derive(&identity);
        let location = identity.location().to_string();

        if let Some(removed) = self
            .request(|reply| CacheCommand::Clear {
                location: location.clone(),
                key,
                reply,
            })
            .await
        {
            tracing::debug!(location = %location, removed = removed, "Waveform cache cleared for source");
        }
    }

    async fn clear_all_cache(&self) {
        if self
            .request(|reply| CacheCommand::ClearAll { reply })
            .await
            .is_some()
        {
            tracing::info!("Waveform cache cleared");
        }
    }

    async fn flush(&self) {
        let _ = self.request(|reply| CacheCommand::Flush { reply }).await;
    }

    async fn stats(&self) -> CacheStats {
        self.request(|reply| CacheCommand::Stats { reply })
            .await
            .unwrap_or_default()
    }
}
