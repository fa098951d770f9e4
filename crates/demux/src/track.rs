//! Track entry materialization from buffered engine events.

use webm_iterable::matroska_spec::{Master, MatroskaSpec};

use wd_common::TrackKind;

/// Video settings declared on a track entry. Declared geometry is
/// advisory; the authoritative output size comes from the codec.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSettings {
    pub pixel_width: u64,
    pub pixel_height: u64,
    /// AlphaMode element: non-zero means BlockAdditions carry an alpha
    /// sub-stream.
    pub alpha: bool,
}

/// Audio settings declared on a track entry.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSettings {
    pub sampling_frequency: f64,
    pub channels: u64,
    pub bit_depth: Option<u64>,
}

/// One TrackEntry, flattened from the engine's buffered element tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackEntryInfo {
    pub number: u64,
    pub kind: TrackKind,
    pub codec_id: String,
    pub codec_private: Option<Vec<u8>>,
    pub enabled: bool,
    pub default_duration_ns: Option<u64>,
    pub video: Option<VideoSettings>,
    pub audio: Option<AudioSettings>,
}

impl TrackEntryInfo {
    /// Flatten the children of a buffered TrackEntry master.
    pub fn from_children(children: &[MatroskaSpec]) -> Self {
        let mut number = 0;
        let mut kind = TrackKind::Other(0);
        let mut codec_id = String::new();
        let mut codec_private = None;
        let mut enabled = true; // FlagEnabled defaults to 1
        let mut default_duration_ns = None;
        let mut video = None;
        let mut audio = None;

        for child in children {
            match child {
                MatroskaSpec::TrackNumber(val) => number = *val,
                MatroskaSpec::TrackType(val) => kind = TrackKind::from_value(*val),
                MatroskaSpec::CodecID(id) => codec_id = id.clone(),
                MatroskaSpec::CodecPrivate(data) => codec_private = Some(data.clone()),
                MatroskaSpec::FlagEnabled(val) => enabled = *val != 0,
                MatroskaSpec::DefaultDuration(val) => default_duration_ns = Some(*val),
                MatroskaSpec::Video(Master::Full(v)) => video = Some(parse_video_settings(v)),
                MatroskaSpec::Audio(Master::Full(a)) => audio = Some(parse_audio_settings(a)),
                _ => {}
            }
        }

        Self {
            number,
            kind,
            codec_id,
            codec_private,
            enabled,
            default_duration_ns,
            video,
            audio,
        }
    }
}

fn parse_video_settings(children: &[MatroskaSpec]) -> VideoSettings {
    let mut pixel_width = 0;
    let mut pixel_height = 0;
    let mut alpha = false;

    for child in children {
        match child {
            MatroskaSpec::PixelWidth(val) => pixel_width = *val,
            MatroskaSpec::PixelHeight(val) => pixel_height = *val,
            MatroskaSpec::AlphaMode(val) => alpha = *val != 0,
            _ => {}
        }
    }

    VideoSettings {
        pixel_width,
        pixel_height,
        alpha,
    }
}

fn parse_audio_settings(children: &[MatroskaSpec]) -> AudioSettings {
    let mut sampling_frequency = 8000.0; // Matroska default
    let mut channels = 1; // Matroska default
    let mut bit_depth = None;

    for child in children {
        match child {
            MatroskaSpec::SamplingFrequency(val) => sampling_frequency = *val,
            MatroskaSpec::Channels(val) => channels = *val,
            MatroskaSpec::BitDepth(val) => bit_depth = Some(*val),
            _ => {}
        }
    }

    AudioSettings {
        sampling_frequency,
        channels,
        bit_depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_video_entry() {
        let children = vec![
            MatroskaSpec::TrackNumber(1),
            MatroskaSpec::TrackType(1),
            MatroskaSpec::CodecID("V_VP8".into()),
            MatroskaSpec::Video(Master::Full(vec![
                MatroskaSpec::PixelWidth(640),
                MatroskaSpec::PixelHeight(360),
                MatroskaSpec::AlphaMode(1),
            ])),
        ];

        let entry = TrackEntryInfo::from_children(&children);
        assert_eq!(entry.number, 1);
        assert_eq!(entry.kind, TrackKind::Video);
        assert_eq!(entry.codec_id, "V_VP8");
        assert!(entry.enabled);
        let video = entry.video.unwrap();
        assert_eq!(video.pixel_width, 640);
        assert_eq!(video.pixel_height, 360);
        assert!(video.alpha);
    }

    #[test]
    fn flatten_audio_entry() {
        let children = vec![
            MatroskaSpec::TrackNumber(2),
            MatroskaSpec::TrackType(2),
            MatroskaSpec::CodecID("A_VORBIS".into()),
            MatroskaSpec::CodecPrivate(vec![2, 30, 62]),
            MatroskaSpec::FlagEnabled(0),
            MatroskaSpec::Audio(Master::Full(vec![
                MatroskaSpec::SamplingFrequency(44100.0),
                MatroskaSpec::Channels(2),
                MatroskaSpec::BitDepth(16),
            ])),
        ];

        let entry = TrackEntryInfo::from_children(&children);
        assert_eq!(entry.number, 2);
        assert_eq!(entry.kind, TrackKind::Audio);
        assert!(!entry.enabled);
        assert_eq!(entry.codec_private.as_deref(), Some(&[2u8, 30, 62][..]));
        let audio = entry.audio.unwrap();
        assert_eq!(audio.sampling_frequency, 44100.0);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.bit_depth, Some(16));
    }

    #[test]
    fn defaults_when_elements_absent() {
        let entry = TrackEntryInfo::from_children(&[MatroskaSpec::TrackNumber(3)]);
        assert!(entry.enabled);
        assert_eq!(entry.kind, TrackKind::Other(0));
        assert!(entry.video.is_none());
        assert!(entry.audio.is_none());
    }
}
