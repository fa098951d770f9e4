//! Track kinds and codec identifier mapping.

use serde::{Deserialize, Serialize};

/// Matroska track type values (TrackType element).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Other(u64),
}

impl TrackKind {
    pub fn from_value(val: u64) -> Self {
        match val {
            1 => Self::Video,
            2 => Self::Audio,
            17 => Self::Subtitle,
            other => Self::Other(other),
        }
    }
}

/// Supported video codecs (WebM set).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    Vp8,
    Vp9,
}

impl VideoCodec {
    /// Map a Matroska codec ID string. Unknown ids return `None` — an
    /// unrecognized codec means "keep scanning", not "guess".
    pub fn from_codec_id(codec_id: &str) -> Option<Self> {
        match codec_id {
            "V_VP8" => Some(Self::Vp8),
            "V_VP9" => Some(Self::Vp9),
            _ => None,
        }
    }
}

/// Supported audio codecs (WebM set).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioCodec {
    Vorbis,
}

impl AudioCodec {
    pub fn from_codec_id(codec_id: &str) -> Option<Self> {
        match codec_id {
            "A_VORBIS" => Some(Self::Vorbis),
            _ => None,
        }
    }
}
