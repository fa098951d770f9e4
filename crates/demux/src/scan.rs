//! Structural discovery pass.
//!
//! A single lightweight walk over the container that records everything
//! metadata extraction needs without opening codec sessions: segment
//! info, the first recognized video and audio tracks, the first video
//! frame's payload (for a later authoritative-size decode), and the
//! summed per-block declared frame count of the selected video track.
//! The container has no index, so the count comes from walking every
//! cluster.

use std::io::{Read, Seek};

use tracing::{debug, trace, warn};
use webm_iterable::matroska_spec::{Master, MatroskaSpec};
use webm_iterable::WebmIterator;

use wd_common::{AudioCodec, DemuxError, TimeCode, TrackKind, VideoCodec};

use crate::block::parse_block;
use crate::reader::SharedReader;
use crate::track::TrackEntryInfo;

/// Matroska default TimestampScale: 1ms ticks.
const DEFAULT_TIMESTAMP_SCALE: u64 = 1_000_000;

/// Everything the structural pass learned.
#[derive(Clone, Debug)]
pub struct ScanReport {
    /// Nanoseconds per container tick.
    pub timestamp_scale: u64,
    /// Declared duration in ticks, when the segment carries one.
    pub duration_ticks: Option<f64>,
    /// First enabled video track with a supported codec.
    pub video: Option<VideoTrackMeta>,
    /// First enabled audio track with a supported codec.
    pub audio: Option<AudioTrackMeta>,
    /// Sum of declared frame counts over the video track's blocks.
    pub video_frame_count: u64,
    /// Payload of the very first video frame.
    pub first_video_frame: Option<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct VideoTrackMeta {
    pub number: u64,
    pub codec: VideoCodec,
    /// Declared geometry; advisory until a real decode confirms it.
    pub declared_width: u64,
    pub declared_height: u64,
    pub alpha: bool,
    pub default_duration_ns: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct AudioTrackMeta {
    pub number: u64,
    pub codec: AudioCodec,
    pub codec_private: Option<Vec<u8>>,
    pub declared_rate: f64,
    pub declared_channels: u64,
}

impl ScanReport {
    /// Total duration in seconds, when declared.
    pub fn duration(&self) -> Option<TimeCode> {
        self.duration_ticks
            .map(|ticks| TimeCode::from_secs(ticks * self.timestamp_scale as f64 / 1e9))
    }
}

/// Walk the whole container once and collect structural metadata.
/// Stops at end of container; an engine failure mid-stream ends the
/// walk with what was collected so far.
pub fn scan_container<R: Read + Seek>(reader: SharedReader<R>) -> Result<ScanReport, DemuxError> {
    let buffered = [
        MatroskaSpec::Info(Master::Start),
        MatroskaSpec::TrackEntry(Master::Start),
        MatroskaSpec::BlockGroup(Master::Start),
    ];
    let engine = WebmIterator::new(reader, &buffered);

    let mut report = ScanReport {
        timestamp_scale: DEFAULT_TIMESTAMP_SCALE,
        duration_ticks: None,
        video: None,
        audio: None,
        video_frame_count: 0,
        first_video_frame: None,
    };

    for tag in engine {
        let tag = match tag {
            Ok(tag) => tag,
            Err(err) => {
                warn!(error = %err, "engine failed during scan, stopping early");
                break;
            }
        };

        match tag {
            MatroskaSpec::Info(Master::Full(children)) => {
                for child in &children {
                    match child {
                        MatroskaSpec::TimestampScale(scale) => report.timestamp_scale = *scale,
                        MatroskaSpec::Duration(ticks) => report.duration_ticks = Some(*ticks),
                        _ => {}
                    }
                }
                debug!(
                    scale = report.timestamp_scale,
                    duration_ticks = ?report.duration_ticks,
                    "scanned segment info"
                );
            }
            MatroskaSpec::TrackEntry(Master::Full(children)) => {
                record_track(&mut report, &TrackEntryInfo::from_children(&children));
            }
            MatroskaSpec::SimpleBlock(data) => {
                record_block(&mut report, &data)?;
            }
            MatroskaSpec::BlockGroup(Master::Full(children)) => {
                for child in children {
                    if let MatroskaSpec::Block(data) = child {
                        record_block(&mut report, &data)?;
                    }
                }
            }
            _ => {}
        }
    }

    debug!(
        frames = report.video_frame_count,
        has_video = report.video.is_some(),
        has_audio = report.audio.is_some(),
        "scan complete"
    );
    Ok(report)
}

fn record_track(report: &mut ScanReport, entry: &TrackEntryInfo) {
    if !entry.enabled {
        return;
    }

    match entry.kind {
        TrackKind::Video if report.video.is_none() => {
            let Some(codec) = VideoCodec::from_codec_id(&entry.codec_id) else {
                trace!(codec = %entry.codec_id, "unsupported video codec, continuing scan");
                return;
            };
            let (width, height, alpha) = entry
                .video
                .as_ref()
                .map(|v| (v.pixel_width, v.pixel_height, v.alpha))
                .unwrap_or((0, 0, false));
            report.video = Some(VideoTrackMeta {
                number: entry.number,
                codec,
                declared_width: width,
                declared_height: height,
                alpha,
                default_duration_ns: entry.default_duration_ns,
            });
        }
        TrackKind::Audio if report.audio.is_none() => {
            let Some(codec) = AudioCodec::from_codec_id(&entry.codec_id) else {
                trace!(codec = %entry.codec_id, "unsupported audio codec, continuing scan");
                return;
            };
            let (rate, channels) = entry
                .audio
                .as_ref()
                .map(|a| (a.sampling_frequency, a.channels))
                .unwrap_or((8000.0, 1));
            report.audio = Some(AudioTrackMeta {
                number: entry.number,
                codec,
                codec_private: entry.codec_private.clone(),
                declared_rate: rate,
                declared_channels: channels,
            });
        }
        _ => {}
    }
}

fn record_block(report: &mut ScanReport, payload: &[u8]) -> Result<(), DemuxError> {
    let Some(video) = report.video.as_ref() else {
        return Ok(());
    };

    let view = parse_block(payload)?;
    if view.track != video.number {
        return Ok(());
    }

    report.video_frame_count += view.frame_count() as u64;
    if report.first_video_frame.is_none() {
        let range = view.frame_range(0);
        report.first_video_frame = Some(payload[range].to_vec());
    }
    Ok(())
}
