//! HTTP Handlers

mod cache;
mod ping;
mod waveform;

pub use cache::*;
pub use ping::*;
pub use waveform::*;
