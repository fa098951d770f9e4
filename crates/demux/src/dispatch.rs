//! Event dispatch: one selected track, one frame per resumption.
//!
//! `TrackPump` drives the element-tree engine and routes its events to a
//! [`TrackCallback`] strategy object. The pump owns the protocol:
//!
//! - at most one track is open; blocks for other tracks are dropped
//!   without touching their payload,
//! - every laced frame is handed to the hook exactly once, through a
//!   pull-style [`FramePayload`] that must be fully drained,
//! - after one frame the engine pauses, unless the hook asks for
//!   continuous feed (audio window fill, metadata scan).

use std::fmt;
use std::io::{Read, Seek};

use tracing::{debug, error, trace, warn};
use webm_iterable::matroska_spec::{Master, MatroskaSpec};
use webm_iterable::WebmIterator;

use wd_common::{DemuxError, TrackKind};

use crate::block::{parse_block, BlockView};
use crate::reader::SharedReader;
use crate::track::TrackEntryInfo;

/// What the frame hook wants the engine to do next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Pause after this frame; one resumption maps to one unit.
    Pause,
    /// Keep feeding frames within the same resumption.
    Continue,
}

/// Explicit feed state. A single boolean invites forgetting to reset
/// the suppression after a continuous-feed call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeedState {
    /// No resumption in progress.
    Idle,
    /// A resumption is running and will pause after the next frame.
    AwaitingOneFrame,
    /// The hook has suppressed the pause; frames keep flowing.
    ContinuousFeed,
}

/// Result of one engine resumption.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PumpStatus {
    /// One frame was processed (plus any auxiliary data of its block).
    Frame,
    /// The container is exhausted; nothing was delivered.
    EndOfStream,
}

/// Pull-style view of one frame's payload. The hook must drain it to
/// zero remaining bytes before returning.
pub struct FramePayload<'a> {
    data: &'a [u8],
    consumed: usize,
}

impl<'a> FramePayload<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, consumed: 0 }
    }

    /// Total payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.consumed
    }

    /// Copy up to `buf.len()` bytes, returning how many were copied.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.consumed..self.consumed + n]);
        self.consumed += n;
        n
    }

    /// Bulk-read the whole remainder into `out` (appending).
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data[self.consumed..]);
        self.consumed = self.data.len();
    }
}

/// Codec-specific hooks, selected once when the facade is built.
pub trait TrackCallback {
    /// Hook errors must absorb dispatch errors so the pump can surface
    /// one fatal status.
    type Error: From<DemuxError> + fmt::Display;

    /// Media kind this callback accepts track entries for.
    fn kind(&self) -> TrackKind;

    /// Try to open the candidate track. `Ok(false)` means the codec id
    /// is unrecognized and the engine should keep scanning; an error is
    /// fatal (a recognized track failed to open).
    fn on_track_entry(&mut self, entry: &TrackEntryInfo) -> Result<bool, Self::Error>;

    /// Process one frame. Must fully drain `payload`.
    fn on_frame(&mut self, payload: &mut FramePayload<'_>) -> Result<Flow, Self::Error>;

    /// Auxiliary data attached to the frame's block group (alpha).
    fn on_block_additional(&mut self, add_id: u64, data: &[u8]) -> Result<(), Self::Error>;
}

/// A block staged for delivery, with its frames handed out one per
/// resumption.
struct PendingBlock {
    payload: Vec<u8>,
    view: BlockView,
    next_frame: usize,
    additional: Option<(u64, Vec<u8>)>,
}

/// Drives the engine over one byte source and dispatches to one callback.
pub struct TrackPump<R: Read + Seek> {
    reader: SharedReader<R>,
    engine: WebmIterator<SharedReader<R>>,
    open_track: Option<u64>,
    cluster_time: u64,
    state: FeedState,
    pending: Option<PendingBlock>,
}

/// Masters the engine buffers into whole events for the pump.
fn buffered_tags() -> [MatroskaSpec; 2] {
    [
        MatroskaSpec::TrackEntry(Master::Start),
        MatroskaSpec::BlockGroup(Master::Start),
    ]
}

impl<R: Read + Seek> TrackPump<R> {
    pub fn new(source: R) -> Self {
        let reader = SharedReader::new(source);
        let engine = WebmIterator::new(reader.clone(), &buffered_tags());
        Self {
            reader,
            engine,
            open_track: None,
            cluster_time: 0,
            state: FeedState::Idle,
            pending: None,
        }
    }

    /// Track number currently routed, if any.
    pub fn open_track(&self) -> Option<u64> {
        self.open_track
    }

    pub fn feed_state(&self) -> FeedState {
        self.state
    }

    /// Timestamp of the cluster currently being traversed, in
    /// TimestampScale ticks.
    pub fn cluster_time(&self) -> u64 {
        self.cluster_time
    }

    /// Rewind to byte 0 and restart the engine. The open track is
    /// remembered: sessions reset their decode state on seek, they do
    /// not reopen.
    pub fn rewind(&mut self) -> Result<(), DemuxError> {
        self.reader.rewind()?;
        self.engine = WebmIterator::new(self.reader.clone(), &buffered_tags());
        self.cluster_time = 0;
        self.state = FeedState::Idle;
        self.pending = None;
        debug!("pump rewound to container start");
        Ok(())
    }

    /// Resume the engine until one frame is processed or the container
    /// ends. With the hook returning [`Flow::Continue`], keeps feeding
    /// frames and only returns at end of stream.
    pub fn pump<C: TrackCallback>(&mut self, callback: &mut C) -> Result<PumpStatus, C::Error> {
        self.state = FeedState::AwaitingOneFrame;

        loop {
            if self.deliver_pending(callback)? {
                return Ok(PumpStatus::Frame);
            }

            let Some(next) = self.engine.next() else {
                self.state = FeedState::Idle;
                return Ok(PumpStatus::EndOfStream);
            };

            let tag = match next {
                Ok(tag) => tag,
                Err(err) => {
                    // A failed resumption surfaces as end-of-stream, not
                    // an exception; the detail is preserved in the log.
                    warn!(error = %err, "parser engine failed, treating as end of stream");
                    self.state = FeedState::Idle;
                    return Ok(PumpStatus::EndOfStream);
                }
            };

            match tag {
                MatroskaSpec::TrackEntry(Master::Full(children)) => {
                    self.handle_track_entry(&children, callback)?;
                }
                MatroskaSpec::Timestamp(time) => {
                    self.cluster_time = time;
                }
                MatroskaSpec::SimpleBlock(data) => {
                    self.stage_block(data, None)?;
                }
                MatroskaSpec::BlockGroup(Master::Full(children)) => {
                    self.handle_block_group(children)?;
                }
                _ => {}
            }
        }
    }

    fn handle_track_entry<C: TrackCallback>(
        &mut self,
        children: &[MatroskaSpec],
        callback: &mut C,
    ) -> Result<(), C::Error> {
        if self.open_track.is_some() {
            return Ok(());
        }

        let entry = TrackEntryInfo::from_children(children);
        if !entry.enabled {
            debug!(track = entry.number, "skipping disabled track");
            return Ok(());
        }
        if entry.kind != callback.kind() {
            return Ok(());
        }

        match callback.on_track_entry(&entry) {
            Ok(true) => {
                self.open_track = Some(entry.number);
                debug!(track = entry.number, codec = %entry.codec_id, "opened track");
            }
            Ok(false) => {
                trace!(codec = %entry.codec_id, "unrecognized codec id, continuing scan");
            }
            Err(err) => {
                error!(track = entry.number, error = %err, "track open failed");
                return Err(err);
            }
        }

        Ok(())
    }

    fn handle_block_group(&mut self, children: Vec<MatroskaSpec>) -> Result<(), DemuxError> {
        let mut block_data = None;
        let mut additional = None;

        for child in children {
            match child {
                MatroskaSpec::Block(data) => block_data = Some(data),
                MatroskaSpec::BlockAdditions(Master::Full(adds)) => {
                    additional = extract_block_additional(adds);
                }
                _ => {}
            }
        }

        if let Some(data) = block_data {
            self.stage_block(data, additional)?;
        }
        Ok(())
    }

    fn stage_block(
        &mut self,
        payload: Vec<u8>,
        additional: Option<(u64, Vec<u8>)>,
    ) -> Result<(), DemuxError> {
        // Read vs. skip is decided purely on the track number; blocks for
        // other tracks are dropped without byte-level work.
        let view = parse_block(&payload)?;
        if Some(view.track) != self.open_track {
            trace!(track = view.track, "dropping block for non-selected track");
            return Ok(());
        }

        trace!(
            track = view.track,
            frames = view.frame_count(),
            keyframe = view.keyframe,
            "staged block"
        );
        self.pending = Some(PendingBlock {
            payload,
            view,
            next_frame: 0,
            additional,
        });
        Ok(())
    }

    /// Deliver frames from the staged block. Returns `Ok(true)` when a
    /// frame was delivered and the hook asked to pause.
    fn deliver_pending<C: TrackCallback>(&mut self, callback: &mut C) -> Result<bool, C::Error> {
        loop {
            let Some(pending) = self.pending.as_mut() else {
                return Ok(false);
            };

            if pending.next_frame >= pending.view.frame_count() {
                let additional = pending.additional.take();
                self.pending = None;
                if let Some((add_id, data)) = additional {
                    callback.on_block_additional(add_id, &data).map_err(|err| {
                        error!(error = %err, "auxiliary data hook failed, aborting parse");
                        err
                    })?;
                }
                continue;
            }

            let index = pending.next_frame;
            pending.next_frame += 1;
            let exhausted = pending.next_frame >= pending.view.frame_count();
            let range = pending.view.frame_range(index);

            let (flow, left) = {
                let mut payload = FramePayload::new(&pending.payload[range]);
                let flow = callback.on_frame(&mut payload).map_err(|err| {
                    error!(error = %err, "frame hook failed, aborting parse");
                    err
                })?;
                (flow, payload.remaining())
            };

            if left > 0 {
                error!(left, "frame hook returned with bytes unconsumed");
                return Err(DemuxError::UnconsumedFrameBytes { left }.into());
            }

            // Auxiliary data belongs to this block's frame; route it
            // before pausing so the unit is complete.
            if exhausted {
                let additional = self.pending.take().and_then(|mut p| p.additional.take());
                if let Some((add_id, data)) = additional {
                    callback.on_block_additional(add_id, &data).map_err(|err| {
                        error!(error = %err, "auxiliary data hook failed, aborting parse");
                        err
                    })?;
                }
            }

            match flow {
                Flow::Pause => {
                    self.state = FeedState::Idle;
                    return Ok(true);
                }
                Flow::Continue => {
                    self.state = FeedState::ContinuousFeed;
                }
            }
        }
    }
}

/// Pull the auxiliary payload out of a buffered BlockAdditions master.
/// BlockAddID defaults to 1 (the alpha sub-stream id in WebM).
fn extract_block_additional(children: Vec<MatroskaSpec>) -> Option<(u64, Vec<u8>)> {
    for child in children {
        if let MatroskaSpec::BlockMore(Master::Full(more)) = child {
            let mut add_id = 1;
            let mut data = None;
            for tag in more {
                match tag {
                    MatroskaSpec::BlockAddID(id) => add_id = id,
                    MatroskaSpec::BlockAdditional(bytes) => data = Some(bytes),
                    _ => {}
                }
            }
            if let Some(bytes) = data {
                return Some((add_id, bytes));
            }
        }
    }
    None
}
