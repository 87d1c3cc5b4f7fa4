//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                GET   健康检查
//! - /api/waveform/samples    POST  包络
//! - /api/waveform/minmax     POST  min/max 对
//! - /api/waveform/trim       POST  裁剪后增量更新
//! - /api/cache/clear         POST  清除某个源的缓存
//! - /api/cache/clear_all     POST  清空缓存
//! - /api/cache/stats         GET   缓存统计

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/waveform", waveform_routes())
        .nest("/cache", cache_routes())
}

/// Waveform 路由
fn waveform_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/samples", post(handlers::get_samples))
        .route("/minmax", post(handlers::get_min_max_samples))
        .route("/trim", post(handlers::trim_update))
}

/// Cache 路由
fn cache_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clear", post(handlers::clear_cache))
        .route("/clear_all", post(handlers::clear_all_cache))
        .route("/stats", get(handlers::cache_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{CacheStats, RequestLimits, TrimUpdate, WaveformCachePort};
    use crate::domain::MinMaxPair;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tower::util::ServiceExt;

    /// 固定返回值的缓存，记录被清除的路径
    #[derive(Default)]
    struct StubCache {
        cleared: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl WaveformCachePort for StubCache {
        async fn samples(&self, path: PathBuf, target_count: usize) -> Vec<f32> {
            if path == PathBuf::from("/missing.wav") {
                return Vec::new();
            }
            vec![0.5; target_count]
        }

        async fn min_max_samples(&self, _path: PathBuf, target_count: usize) -> Vec<MinMaxPair> {
            vec![MinMaxPair::new(-0.5, 0.5); target_count]
        }

        async fn samples_after_trim(&self, update: TrimUpdate) -> Vec<f32> {
            vec![1.0; update.target_count]
        }

        async fn min_max_samples_after_trim(&self, update: TrimUpdate) -> Vec<MinMaxPair> {
            vec![MinMaxPair::new(-1.0, 1.0); update.target_count]
        }

        async fn clear_cache(&self, path: PathBuf) {
            self.cleared.lock().unwrap().push(path);
        }

        async fn clear_all_cache(&self) {}

        async fn flush(&self) {}

        async fn stats(&self) -> CacheStats {
            CacheStats {
                entries: 3,
                capacity: 20,
                ..CacheStats::default()
            }
        }
    }

    fn app(cache: Arc<StubCache>) -> Router {
        let limits = RequestLimits {
            max_target_count: 1000,
        };
        create_routes().with_state(Arc::new(AppState::new(cache, limits)))
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_ping() {
        let (status, body) = call(app(Arc::default()), Method::GET, "/api/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_samples() {
        let (status, body) = call(
            app(Arc::default()),
            Method::POST,
            "/api/waveform/samples",
            Some(json!({"path": "/a.wav", "count": 8})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["count"], 8);
        assert_eq!(body["data"]["samples"][0], 0.5);
    }

    #[tokio::test]
    async fn test_unreadable_source_is_empty_not_error() {
        let (_, body) = call(
            app(Arc::default()),
            Method::POST,
            "/api/waveform/samples",
            Some(json!({"path": "/missing.wav", "count": 8})),
        )
        .await;

        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["count"], 0);
    }

    #[tokio::test]
    async fn test_count_over_limit_is_bad_request() {
        let (status, body) = call(
            app(Arc::default()),
            Method::POST,
            "/api/waveform/minmax",
            Some(json!({"path": "/a.wav", "count": 5000})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["errno"], 400);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_trim_minmax() {
        let (_, body) = call(
            app(Arc::default()),
            Method::POST,
            "/api/waveform/trim",
            Some(json!({
                "old_path": "/a.wav",
                "new_path": "/b.wav",
                "original_duration": 10.0,
                "trim_start": 3.33,
                "trim_end": 6.67,
                "count": 33,
                "kind": "minmax"
            })),
        )
        .await;

        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["kind"], "minmax");
        assert_eq!(body["data"]["samples"].as_array().unwrap().len(), 33);
    }

    #[tokio::test]
    async fn test_inverted_trim_is_bad_request() {
        let (_, body) = call(
            app(Arc::default()),
            Method::POST,
            "/api/waveform/trim",
            Some(json!({
                "old_path": "/a.wav",
                "new_path": "/b.wav",
                "original_duration": 10.0,
                "trim_start": 7.0,
                "trim_end": 3.0,
                "count": 10
            })),
        )
        .await;

        assert_eq!(body["errno"], 400);
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let cache = Arc::new(StubCache::default());

        let (_, body) = call(
            app(cache.clone()),
            Method::POST,
            "/api/cache/clear",
            Some(json!({"path": "/a.wav"})),
        )
        .await;
        assert_eq!(body["errno"], 0);
        assert_eq!(*cache.cleared.lock().unwrap(), vec![PathBuf::from("/a.wav")]);

        let (_, body) = call(app(cache.clone()), Method::POST, "/api/cache/clear_all", None).await;
        assert_eq!(body["errno"], 0);

        let (_, body) = call(app(cache), Method::GET, "/api/cache/stats", None).await;
        assert_eq!(body["data"]["entries"], 3);
        assert_eq!(body["data"]["capacity"], 20);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let (status, _) = call(
            app(Arc::default()),
            Method::POST,
            "/api/waveform/samples",
            Some(json!({"count": 8})),
        )
        .await;
        assert!(status.is_client_error());
    }
}
