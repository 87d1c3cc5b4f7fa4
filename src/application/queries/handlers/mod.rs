//! Query Handlers 实现

mod waveform_handlers;

pub use waveform_handlers::*;
