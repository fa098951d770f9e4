//! Vorbis codec session: header ingestion, packet synthesis, and the
//! pending-sample queue that feeds caller windows.

use std::collections::VecDeque;

use lewton::audio::{read_audio_packet_generic, PreviousWindowRight};
use lewton::header::{read_header_comment, read_header_ident, read_header_setup, IdentHeader, SetupHeader};
use lewton::samples::InterleavedSamples;
use tracing::{debug, trace};

use wd_common::AudioError;

use crate::headers::split_codec_private;

/// Output is fixed signed 16-bit.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Decoded samples waiting for a caller window, in whole frames
/// (one i16 per channel). The synthesis step may yield more samples
/// than the window has room for; the surplus stays queued — that is
/// this design's shape of "report back how many were consumed".
pub(crate) struct PendingSamples {
    queue: VecDeque<i16>,
    channels: usize,
}

impl PendingSamples {
    pub(crate) fn new(channels: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            channels,
        }
    }

    /// Clamp-convert interleaved floats and append them.
    pub(crate) fn push_interleaved(&mut self, samples: &[f32]) {
        self.queue.extend(
            samples
                .iter()
                .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16),
        );
    }

    /// Whole frames currently queued.
    pub(crate) fn frames(&self) -> usize {
        self.queue.len() / self.channels
    }

    /// Copy `min(available, fitting)` whole frames into `dest` as
    /// little-endian i16 bytes; returns bytes written.
    pub(crate) fn drain_into(&mut self, dest: &mut [u8]) -> usize {
        let frame_bytes = self.channels * BYTES_PER_SAMPLE;
        let frames = self.frames().min(dest.len() / frame_bytes);
        let samples = frames * self.channels;

        for (i, sample) in self.queue.drain(..samples).enumerate() {
            dest[i * 2..i * 2 + 2].copy_from_slice(&sample.to_le_bytes());
        }
        frames * frame_bytes
    }

    /// Drop up to `frames` whole frames; returns how many were dropped.
    pub(crate) fn discard_frames(&mut self, frames: u64) -> u64 {
        let dropped = (self.frames() as u64).min(frames);
        self.queue.drain(..dropped as usize * self.channels);
        dropped
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}

/// Per-track Vorbis decode state.
///
/// Created from the track's private blob (the three header packets are
/// reconstructed and ingested in order); afterwards every container
/// frame is one compressed packet.
pub struct VorbisSession {
    ident: IdentHeader,
    setup: SetupHeader,
    pwr: PreviousWindowRight,
    pending: PendingSamples,
    sample_rate: u32,
    channels: u32,
}

impl VorbisSession {
    /// Ingest the three header packets from the private blob. Any
    /// reconstruction or ingestion failure aborts the open.
    pub fn open(codec_private: &[u8]) -> Result<Self, AudioError> {
        let packets = split_codec_private(codec_private)?;

        let ident = read_header_ident(packets.ident).map_err(|e| AudioError::Codec {
            reason: format!("identification header rejected: {e:?}"),
        })?;
        read_header_comment(packets.comment).map_err(|e| AudioError::Codec {
            reason: format!("comment header rejected: {e:?}"),
        })?;
        let setup = read_header_setup(
            packets.setup,
            ident.audio_channels,
            (ident.blocksize_0, ident.blocksize_1),
        )
        .map_err(|e| AudioError::Codec {
            reason: format!("setup header rejected: {e:?}"),
        })?;

        // Rate and channel count come from the now-initialized codec,
        // not the track entry's declared settings.
        let sample_rate = ident.audio_sample_rate;
        let channels = ident.audio_channels as u32;
        debug!(sample_rate, channels, "opened vorbis session");

        Ok(Self {
            ident,
            setup,
            pwr: PreviousWindowRight::new(),
            pending: PendingSamples::new(channels as usize),
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Bytes per output frame: bytes-per-sample x channel count.
    pub fn frame_bytes(&self) -> usize {
        BYTES_PER_SAMPLE * self.channels as usize
    }

    /// Synthesize one compressed packet into the pending queue.
    pub fn decode_packet(&mut self, packet: &[u8]) -> Result<(), AudioError> {
        if packet.is_empty() {
            trace!("skipping empty audio packet");
            return Ok(());
        }

        let decoded: InterleavedSamples<f32> =
            read_audio_packet_generic(&self.ident, &self.setup, packet, &mut self.pwr).map_err(
                |e| AudioError::Codec {
                    reason: format!("packet synthesis failed: {e:?}"),
                },
            )?;
        self.pending.push_interleaved(&decoded.samples);
        Ok(())
    }

    /// Copy pending frames into the window; returns bytes written.
    pub fn drain_into(&mut self, dest: &mut [u8]) -> usize {
        self.pending.drain_into(dest)
    }

    /// Drop up to `frames` pending frames (seek fast-forward).
    pub fn discard_frames(&mut self, frames: u64) -> u64 {
        self.pending.discard_frames(frames)
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.frames()
    }

    /// Reset synthesis state for a reparse. Distinct from a reopen:
    /// header state is kept.
    pub fn rewind(&mut self) {
        self.pwr = PreviousWindowRight::new();
        self.pending.clear();
    }
}
