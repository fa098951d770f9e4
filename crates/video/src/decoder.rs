//! Position-addressable video decoding facade.

use std::io::{Read, Seek};

use tracing::debug;

use wd_common::{DecodeConfig, TrackKind, VideoError};
use wd_demux::{Flow, FramePayload, PumpStatus, TrackCallback, TrackEntryInfo, TrackPump};

use crate::session::VideoSession;

/// Decodes one video track of a WebM byte source, one frame per call.
///
/// The codec session opens lazily on the first recognized track entry,
/// since the required parameters only become known once parsing has
/// begun. Backward seeking reparses from byte 0 (the container has no
/// index).
pub struct VideoDecoder<R: Read + Seek> {
    pump: TrackPump<R>,
    session: VideoSession,
    position: u64,
}

impl<R: Read + Seek> VideoDecoder<R> {
    pub fn open(source: R) -> Result<Self, VideoError> {
        Self::with_config(source, DecodeConfig::default())
    }

    pub fn with_config(source: R, config: DecodeConfig) -> Result<Self, VideoError> {
        debug!("opening video decoder");
        Ok(Self {
            pump: TrackPump::new(source),
            session: VideoSession::new(config),
            position: 0,
        })
    }

    /// Frame index of the next frame to be decoded.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Decode the next frame into `dest` (packed, 3 or 4 bytes per
    /// pixel as fixed at session open). Returns `Ok(false)` on a clean
    /// end of stream; the position does not advance then.
    pub fn decode_frame(&mut self, dest: &mut [u8]) -> Result<bool, VideoError> {
        let mut request = FrameRequest {
            session: &mut self.session,
            dest: Some(dest),
        };
        match self.pump.pump(&mut request)? {
            PumpStatus::Frame => {
                self.position += 1;
                Ok(true)
            }
            PumpStatus::EndOfStream => Ok(false),
        }
    }

    /// Reposition to `target`. Backward targets rewind the reader to
    /// byte 0 and reset the session; in either direction the engine is
    /// then resumed, decoding but discarding output, until the counter
    /// reaches the target (or the stream ends short of it).
    pub fn set_position(&mut self, target: u64) -> Result<(), VideoError> {
        if target < self.position {
            debug!(target, from = self.position, "seeking backward via reparse");
            self.pump.rewind().map_err(VideoError::Demux)?;
            self.session.reset();
            self.position = 0;
        }

        while self.position < target {
            let mut request = FrameRequest {
                session: &mut self.session,
                dest: None,
            };
            match self.pump.pump(&mut request)? {
                PumpStatus::Frame => self.position += 1,
                PumpStatus::EndOfStream => break,
            }
        }
        Ok(())
    }
}

/// One decode request: borrows the session plus the caller's output
/// window for the duration of a single engine resumption.
struct FrameRequest<'a> {
    session: &'a mut VideoSession,
    dest: Option<&'a mut [u8]>,
}

impl TrackCallback for FrameRequest<'_> {
    type Error = VideoError;

    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn on_track_entry(&mut self, entry: &TrackEntryInfo) -> Result<bool, VideoError> {
        self.session.open(entry)
    }

    fn on_frame(&mut self, payload: &mut FramePayload<'_>) -> Result<Flow, VideoError> {
        self.session.process_frame(payload, self.dest.as_deref_mut())?;
        Ok(Flow::Pause)
    }

    fn on_block_additional(&mut self, add_id: u64, data: &[u8]) -> Result<(), VideoError> {
        self.session
            .process_additional(add_id, data, self.dest.as_deref_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn position_starts_at_zero() {
        let decoder = VideoDecoder::open(Cursor::new(Vec::new())).unwrap();
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn decode_on_empty_source_is_end_of_stream() {
        let mut decoder = VideoDecoder::open(Cursor::new(Vec::new())).unwrap();
        let mut dest = vec![0u8; 16];
        assert!(!decoder.decode_frame(&mut dest).unwrap());
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn seek_to_zero_is_a_no_op() {
        let mut decoder = VideoDecoder::open(Cursor::new(Vec::new())).unwrap();
        decoder.set_position(0).unwrap();
        assert_eq!(decoder.position(), 0);
    }
}
