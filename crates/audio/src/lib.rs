//! `wd-audio` — Vorbis decoding for the WebM engine.
//!
//! - **headers**: reconstruction of the three Vorbis header packets
//!   from the track's packed private blob
//! - **session**: lewton-backed synthesis with a pending-sample queue
//! - **decoder**: the position-addressable `AudioDecoder` facade

pub mod decoder;
pub mod headers;
pub mod session;

pub use decoder::AudioDecoder;
pub use headers::{split_codec_private, HeaderPackets};
pub use session::{VorbisSession, BYTES_PER_SAMPLE};
