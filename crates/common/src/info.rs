//! Media information produced by the discovery pass.

use serde::{Deserialize, Serialize};

use crate::color::ColorMatrix;
use crate::types::Rational;

/// Everything the discovery pass learns about a container without
/// committing to a full decode.
///
/// Video fields are authoritative (read back from a real first-frame
/// decode, not the declared track geometry). Audio fields hold
/// [`MediaInfo::NO_AUDIO`]-style zero defaults when the container carries
/// no supported audio track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Packed components per pixel: 3, or 4 when an alpha stream exists.
    pub component_count: u32,
    /// Total frames on the selected video track.
    pub frame_count: u64,
    /// Declared or derived frame rate.
    pub frame_rate: Rational,
    /// Matrix the consumer applies to reach RGB.
    pub color_matrix: ColorMatrix,
    /// Bytes per decoded audio sample (always 2: signed 16-bit).
    pub bytes_per_sample: u32,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Total samples: duration x sample rate.
    pub sample_count: u64,
    /// Audio channel count.
    pub channel_count: u32,
}

impl MediaInfo {
    /// Zeroed audio fields for containers without a supported audio track.
    pub fn without_audio(mut self) -> Self {
        self.bytes_per_sample = 0;
        self.sample_rate = 0;
        self.sample_count = 0;
        self.channel_count = 0;
        self
    }

    pub fn has_audio(&self) -> bool {
        self.sample_rate > 0 && self.channel_count > 0
    }

    pub fn has_alpha(&self) -> bool {
        self.component_count == 4
    }
}

impl Default for MediaInfo {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            component_count: 3,
            frame_count: 0,
            frame_rate: Rational::FPS_30,
            color_matrix: ColorMatrix::IDENTITY,
            bytes_per_sample: 0,
            sample_rate: 0,
            sample_count: 0,
            channel_count: 0,
        }
    }
}
