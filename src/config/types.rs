//! Configuration Types
//!
//! 定义所有配置结构体

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::RequestLimits;
use crate::domain::waveform::{DEFAULT_CHUNK_FRAMES, DEFAULT_STORAGE_RESOLUTION};
use crate::infrastructure::memory::DEFAULT_CAPACITY;
use crate::infrastructure::worker::{CacheSettings, ExtractionSettings};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 波形缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 提取配置
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 换算成 cache actor 的运行参数
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            capacity: self.cache.capacity,
            persist_debounce: Duration::from_millis(self.cache.persist_debounce_ms),
            extraction: ExtractionSettings {
                storage_resolution: self.cache.storage_resolution,
                chunk_frames: self.cache.chunk_frames,
                max_concurrent: self.extraction.max_concurrent,
            },
            ..CacheSettings::default()
        }
    }

    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            max_target_count: self.cache.max_target_count,
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 波形缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 快照目录
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// 最多缓存的源数
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// 修改后延迟多久写快照（毫秒）
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,

    /// 存储分辨率上限
    #[serde(default = "default_storage_resolution")]
    pub storage_resolution: usize,

    /// 解码时每次读取的帧数
    #[serde(default = "default_chunk_frames")]
    pub chunk_frames: usize,

    /// 单次请求允许的最大点数
    #[serde(default = "default_max_target_count")]
    pub max_target_count: usize,
}

/// 平台缓存目录下的 waveforms，取不到时用相对路径
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "wavecache")
        .map(|dirs| dirs.cache_dir().join("waveforms"))
        .unwrap_or_else(|| PathBuf::from("data/cache/waveforms"))
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_persist_debounce_ms() -> u64 {
    2000
}

fn default_storage_resolution() -> usize {
    DEFAULT_STORAGE_RESOLUTION
}

fn default_chunk_frames() -> usize {
    DEFAULT_CHUNK_FRAMES
}

fn default_max_target_count() -> usize {
    RequestLimits::default().max_target_count
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            capacity: default_capacity(),
            persist_debounce_ms: default_persist_debounce_ms(),
            storage_resolution: default_storage_resolution(),
            chunk_frames: default_chunk_frames(),
            max_target_count: default_max_target_count(),
        }
    }
}

/// 提取配置
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// 最大并发解码数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    2
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.cache.capacity, 20);
        assert_eq!(config.cache.storage_resolution, 1000);
        assert_eq!(config.cache.chunk_frames, 32_768);
        assert_eq!(config.extraction.max_concurrent, 2);
        assert!(config.cache.dir.ends_with("waveforms"));
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:5070");
    }

    #[test]
    fn test_cache_settings_conversion() {
        let mut config = AppConfig::default();
        config.cache.persist_debounce_ms = 250;
        config.cache.storage_resolution = 500;
        config.extraction.max_concurrent = 4;

        let settings = config.cache_settings();
        assert_eq!(settings.persist_debounce, Duration::from_millis(250));
        assert_eq!(settings.extraction.storage_resolution, 500);
        assert_eq!(settings.extraction.max_concurrent, 4);
        assert_eq!(settings.capacity, 20);
    }
}
