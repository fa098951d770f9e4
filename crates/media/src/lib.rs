//! `wd-media` — WebM demultiplexing and decoding engine.
//!
//! Umbrella crate tying the pipeline together:
//!
//! ```text
//! byte source -> SharedReader -> element-tree engine -> TrackPump
//!                                                          |
//!                             +----------------------------+
//!                             v                            v
//!                       VideoSession (libvpx)      VorbisSession (lewton)
//!                             |                            |
//!                       VideoDecoder                 AudioDecoder
//! ```
//!
//! - [`probe_media`] runs the discovery pass: container check, one
//!   structural scan, one throwaway first-frame decode, a header-only
//!   audio open — and returns a [`MediaInfo`].
//! - [`VideoDecoder`] / [`AudioDecoder`] are the position-addressable
//!   facades: one decoded unit per call, seek by reparse.
//!
//! Everything is single-threaded and pull-driven; a byte source belongs
//! to exactly one facade.

pub mod probe;

pub use probe::{detect_webm, probe_media};

// Re-export the public surface of the engine crates
pub use wd_audio::AudioDecoder;
pub use wd_common::{
    AudioCodec, AudioError, ChromaSubsampling, ColorMatrix, DecodeConfig, DemuxError, MediaError,
    MediaInfo, Rational, Resolution, TimeCode, TrackKind, VideoCodec, VideoError,
};
pub use wd_video::VideoDecoder;
