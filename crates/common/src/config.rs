//! Decode configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for codec sessions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Thread count handed to libvpx contexts. 0 lets the codec pick.
    pub video_threads: u32,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self { video_threads: 0 }
    }
}
