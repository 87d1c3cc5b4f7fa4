//! In-Memory Waveform Store
//!
//! 两张表（envelope / min-max）共用一条 LRU 顺序和一个容量上限，
//! 外加 location → keys 的反向索引。
//!
//! 只由 cache actor 持有和修改，所以这里没有任何锁。

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::application::ports::Snapshot;
use crate::domain::{CacheKey, ExtractedSeries, MinMaxPair};

/// 默认容量
pub const DEFAULT_CAPACITY: usize = 20;

/// 波形缓存表
#[derive(Debug)]
pub struct WaveformStore {
    capacity: usize,
    envelopes: HashMap<CacheKey, Arc<[f32]>>,
    min_max: HashMap<CacheKey, Arc<[MinMaxPair]>>,
    /// LRU 顺序，队首最久未访问
    order: VecDeque<CacheKey>,
    /// location -> Set<key>
    sources: HashMap<String, HashSet<CacheKey>>,
    /// key -> location
    key_sources: HashMap<CacheKey, String>,
    eviction_count: u64,
}

impl WaveformStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            envelopes: HashMap::new(),
            min_max: HashMap::new(),
            order: VecDeque::new(),
            sources: HashMap::new(),
            key_sources: HashMap::new(),
            eviction_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 不同 key 的数量
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.envelopes.contains_key(key) || self.min_max.contains_key(key)
    }

    pub fn indexed_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn eviction_count(&self) -> u64 {
        self.eviction_count
    }

    /// 读取包络并提升为最近使用
    pub fn get_envelope(&mut self, key: &CacheKey) -> Option<Arc<[f32]>> {
        let series = self.envelopes.get(key)?.clone();
        self.touch(key);
        Some(series)
    }

    /// 读取 min/max 并提升为最近使用
    pub fn get_min_max(&mut self, key: &CacheKey) -> Option<Arc<[MinMaxPair]>> {
        let series = self.min_max.get(key)?.clone();
        self.touch(key);
        Some(series)
    }

    /// 写入包络，返回被淘汰的 key
    pub fn put_envelope(
        &mut self,
        key: CacheKey,
        location: Option<&str>,
        series: Vec<f32>,
    ) -> Vec<CacheKey> {
        self.envelopes.insert(key.clone(), series.into());
        self.after_insert(key, location)
    }

    /// 写入 min/max，返回被淘汰的 key
    pub fn put_min_max(
        &mut self,
        key: CacheKey,
        location: Option<&str>,
        series: Vec<MinMaxPair>,
    ) -> Vec<CacheKey> {
        self.min_max.insert(key.clone(), series.into());
        self.after_insert(key, location)
    }

    /// 同时写入两种序列
    pub fn put_series(
        &mut self,
        key: CacheKey,
        location: Option<&str>,
        series: ExtractedSeries,
    ) -> Vec<CacheKey> {
        self.envelopes.insert(key.clone(), series.envelope.into());
        self.min_max.insert(key.clone(), series.min_max.into());
        self.after_insert(key, location)
    }

    /// 登记 key 到 location 的反向索引
    ///
    /// key 不在表里时忽略，保证反向索引里的 key 都能取到数据。
    pub fn register(&mut self, key: &CacheKey, location: &str) {
        if !self.contains(key) {
            return;
        }
        if let Some(previous) = self.key_sources.get(key) {
            if previous == location {
                return;
            }
            let previous = previous.clone();
            self.unregister(key, &previous);
        }

        self.sources
            .entry(location.to_string())
            .or_default()
            .insert(key.clone());
        self.key_sources.insert(key.clone(), location.to_string());
    }

    /// 某个 location 下最近使用的 key，跳过 `except`
    pub fn best_key_for(&self, location: &str, except: Option<&CacheKey>) -> Option<CacheKey> {
        let keys = self.sources.get(location)?;
        self.order
            .iter()
            .rev()
            .filter(|k| Some(*k) != except)
            .find(|k| keys.contains(*k))
            .cloned()
    }

    /// 清除某个 location 的全部缓存，返回被删除的 key
    pub fn clear_source(&mut self, location: &str) -> Vec<CacheKey> {
        let Some(keys) = self.sources.remove(location) else {
            return Vec::new();
        };

        let removed: Vec<CacheKey> = keys.into_iter().collect();
        for key in &removed {
            self.envelopes.remove(key);
            self.min_max.remove(key);
            self.key_sources.remove(key);
        }
        self.order.retain(|k| !removed.contains(k));

        tracing::debug!(location = %location, removed = removed.len(), "Source cache cleared");
        removed
    }

    /// 删除单个 key（不管是否登记过 location）
    pub fn remove(&mut self, key: &CacheKey) -> bool {
        let had_envelope = self.envelopes.remove(key).is_some();
        let had_min_max = self.min_max.remove(key).is_some();
        if let Some(location) = self.key_sources.get(key).cloned() {
            self.unregister(key, &location);
        }
        self.order.retain(|k| k != key);
        had_envelope || had_min_max
    }

    /// 清空所有结构
    pub fn clear_all(&mut self) {
        self.envelopes.clear();
        self.min_max.clear();
        self.order.clear();
        self.sources.clear();
        self.key_sources.clear();
    }

    /// 两张表的不可变副本
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            envelopes: self
                .envelopes
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_vec()))
                .collect(),
            min_max: self
                .min_max
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), v.to_vec()))
                .collect(),
        }
    }

    fn after_insert(&mut self, key: CacheKey, location: Option<&str>) -> Vec<CacheKey> {
        self.touch(&key);
        if let Some(location) = location {
            self.register(&key, location);
        }
        self.evict_overflow()
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }

    fn evict_overflow(&mut self) -> Vec<CacheKey> {
        let mut evicted = Vec::new();
        while self.order.len() > self.capacity {
            let Some(key) = self.order.pop_front() else {
                break;
            };
            self.envelopes.remove(&key);
            self.min_max.remove(&key);
            if let Some(location) = self.key_sources.get(&key).cloned() {
                self.unregister(&key, &location);
            }
            self.eviction_count += 1;
            tracing::debug!(key = %key, "LRU evicted waveform entry");
            evicted.push(key);
        }
        evicted
    }

    fn unregister(&mut self, key: &CacheKey, location: &str) {
        self.key_sources.remove(key);
        if let Some(keys) = self.sources.get_mut(location) {
            keys.remove(key);
            if keys.is_empty() {
                self.sources.remove(location);
            }
        }
    }
}

impl Default for WaveformStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
