//! Worker Layer - 后台执行
//!
//! - WaveformCacheActor: 唯一持有缓存表的 actor，所有修改经由消息串行化
//! - ExtractionWorker: 在阻塞线程池上执行解码与分桶归约，并发受 semaphore 限制
//! - Debouncer: 可取消、可重新调度的延迟写

mod cache_actor;
mod debounce;
mod extraction_worker;

#[cfg(test)]
mod test_support;

pub use cache_actor::{CacheSettings, WaveformCacheHandle};
pub use debounce::Debouncer;
pub use extraction_worker::{extract_from_reader, ExtractionSettings, ExtractionWorker};
