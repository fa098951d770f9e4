//! Video codec session: one color context, optionally one alpha context
//! advanced in lockstep.

use tracing::{debug, trace};

use wd_common::{DecodeConfig, Resolution, VideoCodec, VideoError};
use wd_demux::{FramePayload, TrackEntryInfo};

use crate::convert;
use crate::vpx::VpxContext;

/// WebM carries the alpha sub-stream under BlockAddID 1.
const ALPHA_ADD_ID: u64 = 1;

struct OpenState {
    codec: VideoCodec,
    color: VpxContext,
    alpha: Option<VpxContext>,
    components: usize,
    declared: Resolution,
}

/// Per-track decode state. Opens lazily on the first recognized track
/// entry; contexts are destroyed with the session.
pub struct VideoSession {
    config: DecodeConfig,
    state: Option<OpenState>,
    /// Frame accumulation arena: grows to the largest frame seen,
    /// never shrinks, reused across frames.
    packet: Vec<u8>,
}

impl VideoSession {
    pub fn new(config: DecodeConfig) -> Self {
        Self {
            config,
            state: None,
            packet: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Packed components per pixel: 3, or 4 once an alpha stream is
    /// declared. Fixed at open.
    pub fn components(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.components)
    }

    /// Geometry declared by the track entry (advisory; the decoded
    /// image is authoritative).
    pub fn declared_resolution(&self) -> Option<Resolution> {
        self.state.as_ref().map(|s| s.declared)
    }

    /// Try to open on a candidate track entry. Returns `Ok(false)` for
    /// unrecognized codec ids so the dispatcher keeps scanning.
    pub fn open(&mut self, entry: &TrackEntryInfo) -> Result<bool, VideoError> {
        let Some(codec) = VideoCodec::from_codec_id(&entry.codec_id) else {
            return Ok(false);
        };

        let (width, height, alpha_mode) = entry
            .video
            .as_ref()
            .map(|v| (v.pixel_width as u32, v.pixel_height as u32, v.alpha))
            .unwrap_or((0, 0, false));

        let color = VpxContext::new(codec, self.config.video_threads)?;
        let alpha = if alpha_mode {
            Some(VpxContext::new(codec, self.config.video_threads)?)
        } else {
            None
        };

        debug!(
            ?codec,
            width,
            height,
            alpha = alpha_mode,
            "opened video session"
        );
        self.state = Some(OpenState {
            codec,
            color,
            alpha,
            components: if alpha_mode { 4 } else { 3 },
            declared: Resolution::new(width, height),
        });
        Ok(true)
    }

    /// Decode one frame. The whole payload is taken in one bulk read —
    /// the codec needs complete frames. With no destination the decode
    /// still runs (state must advance during seek fast-forward) but the
    /// conversion is skipped.
    pub fn process_frame(
        &mut self,
        payload: &mut FramePayload<'_>,
        dest: Option<&mut [u8]>,
    ) -> Result<(), VideoError> {
        let state = self.state.as_mut().ok_or_else(|| VideoError::Codec {
            reason: "frame delivered before session open".into(),
        })?;

        self.packet.clear();
        payload.read_to_end(&mut self.packet);
        state.color.decode(&self.packet)?;

        let Some(dest) = dest else {
            trace!(codec = ?state.codec, "decoded frame without output (fast-forward)");
            return Ok(());
        };

        match state.color.frame_image()? {
            Some(image) => convert::write_packed(dest, state.components, &image),
            // Invisible frame: codec state advanced, nothing to show.
            None => Ok(()),
        }
    }

    /// Decode the auxiliary payload through the alpha context and
    /// overwrite the alpha channel of the already-written buffer. The
    /// alpha context never runs ahead of the color context: it is fed
    /// only from the same block's auxiliary data.
    pub fn process_additional(
        &mut self,
        add_id: u64,
        data: &[u8],
        dest: Option<&mut [u8]>,
    ) -> Result<(), VideoError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        let Some(alpha) = state.alpha.as_mut() else {
            trace!(add_id, "auxiliary data on a track without alpha mode, ignoring");
            return Ok(());
        };
        if add_id != ALPHA_ADD_ID {
            trace!(add_id, "unknown auxiliary stream id, ignoring");
            return Ok(());
        }

        alpha.decode(data)?;

        let Some(dest) = dest else {
            return Ok(());
        };
        match alpha.frame_image()? {
            Some(image) => convert::merge_alpha(dest, &image),
            None => Ok(()),
        }
    }

    /// Reset for a seek-triggered reparse. Decode contexts are kept —
    /// the stream restarts at a keyframe — and the arena keeps its
    /// capacity.
    pub fn reset(&mut self) {
        self.packet.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wd_common::TrackKind;
    use wd_demux::VideoSettings;

    fn entry(codec_id: &str, alpha: bool) -> TrackEntryInfo {
        TrackEntryInfo {
            number: 1,
            kind: TrackKind::Video,
            codec_id: codec_id.into(),
            codec_private: None,
            enabled: true,
            default_duration_ns: None,
            video: Some(VideoSettings {
                pixel_width: 64,
                pixel_height: 48,
                alpha,
            }),
            audio: None,
        }
    }

    #[test]
    fn unrecognized_codec_is_not_an_error() {
        let mut session = VideoSession::new(DecodeConfig::default());
        assert_eq!(session.open(&entry("V_AV1", false)).unwrap(), false);
        assert!(!session.is_open());
    }

    #[test]
    fn open_fixes_component_count() {
        let mut session = VideoSession::new(DecodeConfig::default());
        assert!(session.open(&entry("V_VP8", false)).unwrap());
        assert_eq!(session.components(), Some(3));
        assert_eq!(
            session.declared_resolution(),
            Some(Resolution::new(64, 48))
        );

        let mut with_alpha = VideoSession::new(DecodeConfig::default());
        assert!(with_alpha.open(&entry("V_VP9", true)).unwrap());
        assert_eq!(with_alpha.components(), Some(4));
    }

    #[test]
    fn additional_ignored_without_alpha_mode() {
        let mut session = VideoSession::new(DecodeConfig::default());
        session.open(&entry("V_VP8", false)).unwrap();
        // No alpha context: auxiliary data is dropped, not an error.
        session.process_additional(1, &[0x00], None).unwrap();
    }
}
