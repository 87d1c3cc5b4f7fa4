//! Audio Decoder Adapters

mod symphonia_decoder;

pub use symphonia_decoder::SymphoniaDecoder;
