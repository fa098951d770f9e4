//! Position-addressable audio sample reading facade.

use std::io::{Read, Seek};

use tracing::debug;

use wd_common::{AudioCodec, AudioError, TrackKind};
use wd_demux::{Flow, FramePayload, PumpStatus, TrackCallback, TrackEntryInfo, TrackPump};

use crate::session::VorbisSession;

/// Decodes one audio track of a WebM byte source into caller-sized
/// windows of signed 16-bit PCM.
///
/// One window may need several container frames: the read request
/// suppresses the dispatcher's pause until the window is full. The
/// position counter is in sample frames (one sample per channel).
pub struct AudioDecoder<R: Read + Seek> {
    pump: TrackPump<R>,
    session: Option<VorbisSession>,
    /// Scratch for one compressed packet, reused across frames.
    packet: Vec<u8>,
    position: u64,
}

impl<R: Read + Seek> AudioDecoder<R> {
    pub fn open(source: R) -> Result<Self, AudioError> {
        debug!("opening audio decoder");
        Ok(Self {
            pump: TrackPump::new(source),
            session: None,
            packet: Vec::new(),
            position: 0,
        })
    }

    /// Sample-frame index of the next sample to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Rate/channel geometry, once the session has opened.
    pub fn sample_rate(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.sample_rate())
    }

    pub fn channels(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.channels())
    }

    /// Fill `dest` with interleaved s16le PCM. Returns bytes written;
    /// fewer than requested only at end of stream. Whole sample frames
    /// only — trailing bytes of an unaligned window stay unwritten.
    pub fn read_samples(&mut self, dest: &mut [u8]) -> Result<usize, AudioError> {
        let mut written = 0;

        // Surplus from the previous window first.
        if let Some(session) = self.session.as_mut() {
            written += session.drain_into(dest);
        }

        while self.window_has_room(dest.len() - written) {
            let mut request = WindowRequest {
                session: &mut self.session,
                packet: &mut self.packet,
                window: &mut *dest,
                written: &mut written,
            };
            match self.pump.pump(&mut request)? {
                PumpStatus::Frame => {}
                PumpStatus::EndOfStream => break,
            }
        }

        if let Some(session) = self.session.as_ref() {
            self.position += (written / session.frame_bytes()) as u64;
        }
        Ok(written)
    }

    /// Reposition to the given sample frame. Backward targets rewind to
    /// byte 0 and reset synthesis state (headers are kept); then the
    /// engine is resumed, decoding but discarding, until the counter
    /// reaches the target (or the stream ends short of it).
    pub fn set_position(&mut self, target: u64) -> Result<(), AudioError> {
        if target < self.position {
            debug!(target, from = self.position, "seeking backward via reparse");
            self.pump.rewind().map_err(AudioError::Demux)?;
            if let Some(session) = self.session.as_mut() {
                session.rewind();
            }
            self.position = 0;
        }

        if self.position >= target {
            return Ok(());
        }

        let mut remaining = target - self.position;
        if let Some(session) = self.session.as_mut() {
            remaining -= session.discard_frames(remaining);
        }

        while remaining > 0 {
            let mut request = DiscardRequest {
                session: &mut self.session,
                packet: &mut self.packet,
                remaining: &mut remaining,
            };
            match self.pump.pump(&mut request)? {
                PumpStatus::Frame => {}
                PumpStatus::EndOfStream => break,
            }
        }

        self.position = target - remaining;
        Ok(())
    }

    /// Whether another whole frame could still land in the window.
    fn window_has_room(&self, remaining: usize) -> bool {
        match self.session.as_ref() {
            Some(session) => remaining >= session.frame_bytes(),
            // Session not open yet: keep pumping, the first frames will
            // open it (or the stream ends).
            None => remaining > 0,
        }
    }
}

/// Shared open behavior for both request kinds.
fn open_session(
    session: &mut Option<VorbisSession>,
    entry: &TrackEntryInfo,
) -> Result<bool, AudioError> {
    if AudioCodec::from_codec_id(&entry.codec_id).is_none() {
        return Ok(false);
    }
    let private = entry
        .codec_private
        .as_deref()
        .ok_or_else(|| AudioError::InvalidPrivate {
            reason: "vorbis track without codec private data".into(),
        })?;
    *session = Some(VorbisSession::open(private)?);
    Ok(true)
}

/// One read request: decodes packets until the window is full,
/// overriding the dispatcher's default pause while it is not.
struct WindowRequest<'a> {
    session: &'a mut Option<VorbisSession>,
    packet: &'a mut Vec<u8>,
    window: &'a mut [u8],
    written: &'a mut usize,
}

impl TrackCallback for WindowRequest<'_> {
    type Error = AudioError;

    fn kind(&self) -> TrackKind {
        TrackKind::Audio
    }

    fn on_track_entry(&mut self, entry: &TrackEntryInfo) -> Result<bool, AudioError> {
        open_session(self.session, entry)
    }

    fn on_frame(&mut self, payload: &mut FramePayload<'_>) -> Result<Flow, AudioError> {
        let session = self.session.as_mut().ok_or_else(|| AudioError::Codec {
            reason: "frame delivered before session open".into(),
        })?;

        self.packet.clear();
        payload.read_to_end(self.packet);
        session.decode_packet(self.packet)?;

        *self.written += session.drain_into(&mut self.window[*self.written..]);

        let remaining = self.window.len() - *self.written;
        if remaining >= session.frame_bytes() {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Pause)
        }
    }

    fn on_block_additional(&mut self, _add_id: u64, _data: &[u8]) -> Result<(), AudioError> {
        // Audio tracks carry no auxiliary sub-stream.
        Ok(())
    }
}

/// One seek fast-forward request: decodes and drops sample frames
/// until the remaining count hits zero.
struct DiscardRequest<'a> {
    session: &'a mut Option<VorbisSession>,
    packet: &'a mut Vec<u8>,
    remaining: &'a mut u64,
}

impl TrackCallback for DiscardRequest<'_> {
    type Error = AudioError;

    fn kind(&self) -> TrackKind {
        TrackKind::Audio
    }

    fn on_track_entry(&mut self, entry: &TrackEntryInfo) -> Result<bool, AudioError> {
        open_session(self.session, entry)
    }

    fn on_frame(&mut self, payload: &mut FramePayload<'_>) -> Result<Flow, AudioError> {
        let session = self.session.as_mut().ok_or_else(|| AudioError::Codec {
            reason: "frame delivered before session open".into(),
        })?;

        self.packet.clear();
        payload.read_to_end(self.packet);
        session.decode_packet(self.packet)?;

        *self.remaining -= session.discard_frames(*self.remaining);
        if *self.remaining > 0 {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Pause)
        }
    }

    fn on_block_additional(&mut self, _add_id: u64, _data: &[u8]) -> Result<(), AudioError> {
        Ok(())
    }
}
