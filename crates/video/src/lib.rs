//! `wd-video` — VP8/VP9 decoding for the WebM engine.
//!
//! - **vpx**: safe wrapper over the libvpx decoder FFI
//! - **convert**: planar-to-packed pixel conversion and alpha merging
//! - **session**: per-track decode state (color + lockstep alpha context)
//! - **decoder**: the position-addressable `VideoDecoder` facade

pub mod convert;
pub mod decoder;
pub mod session;
pub mod vpx;

pub use convert::PlaneImage;
pub use decoder::VideoDecoder;
pub use session::VideoSession;
pub use vpx::VpxContext;
