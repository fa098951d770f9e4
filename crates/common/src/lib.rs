//! `wd-common` — Shared types, traits, and errors for the WebM decode engine.
//!
//! This crate is the foundation the other engine crates depend on:
//!
//! - **Types**: `TimeCode`, `Rational`, `Resolution` (newtypes for safety)
//! - **Codecs**: `TrackKind`, `VideoCodec`, `AudioCodec` (codec-id mapping)
//! - **Color**: `ChromaSubsampling`, `ColorMatrix` (consumer-side conversion)
//! - **Info**: `MediaInfo` (discovery-pass output)
//! - **Errors**: `MediaError`, `DemuxError`, `VideoError`, `AudioError`
//! - **Config**: `DecodeConfig`

pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod info;
pub mod types;

// Re-export commonly used items at crate root
pub use codec::{AudioCodec, TrackKind, VideoCodec};
pub use color::{ChromaSubsampling, ColorMatrix};
pub use config::DecodeConfig;
pub use error::{AudioError, DemuxError, MediaError, VideoError};
pub use info::MediaInfo;
pub use types::{Rational, Resolution, TimeCode};
