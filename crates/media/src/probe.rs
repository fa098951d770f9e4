//! Media discovery — detect the container and extract stream info
//! without committing to a full decode.

use std::io::{Read, Seek, SeekFrom};

use tracing::{debug, warn};

use wd_audio::VorbisSession;
use wd_common::{ColorMatrix, MediaError, MediaInfo, Rational};
use wd_demux::{scan_container, ScanReport, SharedReader, VideoTrackMeta};
use wd_video::VpxContext;

/// Magic bytes for Matroska/WebM files (EBML header element ID).
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Check the EBML magic without relying on a file extension.
pub fn detect_webm<R: Read>(reader: &mut R) -> Result<bool, MediaError> {
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..])?;
        if n == 0 {
            return Ok(false);
        }
        filled += n;
    }
    Ok(header == EBML_MAGIC)
}

/// Probe a container: one structural pass, one throwaway decode of the
/// first video frame (declared dimensions are advisory; the codec's
/// output is authoritative), and a header-only audio open.
///
/// Audio fields stay zeroed when the container carries no supported
/// audio track.
pub fn probe_media<R: Read + Seek>(mut source: R) -> Result<MediaInfo, MediaError> {
    if !detect_webm(&mut source)? {
        return Err(MediaError::UnsupportedContainer);
    }
    source.seek(SeekFrom::Start(0))?;

    let report = scan_container(SharedReader::new(source))?;
    let duration_secs = report.duration().map(|t| t.as_secs()).unwrap_or(0.0);

    let mut info = MediaInfo::default();

    if let Some(video) = &report.video {
        fill_video_info(&mut info, video, &report, duration_secs)?;
    } else {
        debug!("no supported video track found");
    }

    if let Some(audio) = &report.audio {
        // Open (without decoding through) purely to read back the
        // codec-reported geometry; the declared track settings are not
        // trusted.
        let private = audio.codec_private.as_deref().unwrap_or_default();
        let session = VorbisSession::open(private)?;
        info.bytes_per_sample = wd_audio::BYTES_PER_SAMPLE as u32;
        info.sample_rate = session.sample_rate();
        info.channel_count = session.channels();
        info.sample_count = (duration_secs * session.sample_rate() as f64).round() as u64;
    } else {
        debug!("no supported audio track found");
    }

    debug!(
        width = info.width,
        height = info.height,
        frames = info.frame_count,
        sample_rate = info.sample_rate,
        "probe complete"
    );
    Ok(info)
}

fn fill_video_info(
    info: &mut MediaInfo,
    video: &VideoTrackMeta,
    report: &ScanReport,
    duration_secs: f64,
) -> Result<(), MediaError> {
    info.component_count = if video.alpha { 4 } else { 3 };
    info.frame_count = report.video_frame_count;

    info.frame_rate = if let Some(ns) = video.default_duration_ns.filter(|&ns| ns > 0) {
        Rational::from_fps(1e9 / ns as f64)
    } else if duration_secs > 0.0 && report.video_frame_count > 0 {
        Rational::from_fps(report.video_frame_count as f64 / duration_secs)
    } else {
        Rational::FPS_30
    };

    // One real decode with a throwaway context for the authoritative
    // output size and the conversion matrix of the detected layout.
    let Some(frame) = report.first_video_frame.as_deref() else {
        warn!("video track has no frames; keeping declared dimensions");
        info.width = video.declared_width as u32;
        info.height = video.declared_height as u32;
        return Ok(());
    };

    let mut probe_ctx = VpxContext::new(video.codec, 0)?;
    probe_ctx.decode(frame)?;
    match probe_ctx.frame_image()? {
        Some(image) => {
            info.width = image.width as u32;
            info.height = image.height as u32;
            info.color_matrix = ColorMatrix::for_subsampling(image.subsampling);
        }
        None => {
            warn!("first frame produced no image; keeping declared dimensions");
            info.width = video.declared_width as u32;
            info.height = video.declared_height as u32;
        }
    }
    Ok(())
}
