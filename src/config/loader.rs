//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{default_cache_dir, AppConfig};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "WAVECACHE";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `WAVECACHE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `WAVECACHE_SERVER__PORT=8080`
/// - `WAVECACHE_CACHE__DIR=/var/cache/wavecache`
/// - `WAVECACHE_CACHE__CAPACITY=50`
/// - `WAVECACHE_EXTRACTION__MAX_CONCURRENT=4`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    let defaults = AppConfig::default();
    builder = builder
        .set_default("server.host", defaults.server.host)?
        .set_default("server.port", defaults.server.port)?
        .set_default("cache.dir", default_cache_dir().to_string_lossy().to_string())?
        .set_default("cache.capacity", defaults.cache.capacity as u64)?
        .set_default("cache.persist_debounce_ms", defaults.cache.persist_debounce_ms)?
        .set_default("cache.storage_resolution", defaults.cache.storage_resolution as u64)?
        .set_default("cache.chunk_frames", defaults.cache.chunk_frames as u64)?
        .set_default("cache.max_target_count", defaults.cache.max_target_count as u64)?
        .set_default("extraction.max_concurrent", defaults.extraction.max_concurrent as u64)?
        .set_default("log.level", defaults.log.level)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: WAVECACHE_CACHE__CAPACITY=50
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let non_zero = [
        ("server.port", config.server.port as usize),
        ("cache.capacity", config.cache.capacity),
        ("cache.storage_resolution", config.cache.storage_resolution),
        ("cache.chunk_frames", config.cache.chunk_frames),
        ("cache.max_target_count", config.cache.max_target_count),
        ("extraction.max_concurrent", config.extraction.max_concurrent),
    ];

    for (name, value) in non_zero {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Cache Directory: {:?}", config.cache.dir);
    tracing::info!("Cache Capacity: {}", config.cache.capacity);
    tracing::info!("Persist Debounce: {}ms", config.cache.persist_debounce_ms);
    tracing::info!("Storage Resolution: {}", config.cache.storage_resolution);
    tracing::info!("Chunk Frames: {}", config.cache.chunk_frames);
    tracing::info!("Max Target Count: {}", config.cache.max_target_count);
    tracing::info!("Max Concurrent Extractions: {}", config.extraction.max_concurrent);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
