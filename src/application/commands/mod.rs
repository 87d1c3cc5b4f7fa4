//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：裁剪更新、清除缓存

mod cache_commands;

pub mod handlers;

pub use cache_commands::*;
