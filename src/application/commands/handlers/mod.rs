//! Command Handlers 实现

mod cache_handlers;

pub use cache_handlers::*;
