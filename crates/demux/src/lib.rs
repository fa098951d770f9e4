//! `wd-demux` — Event-driven WebM demultiplexing.
//!
//! Bridges a byte source to the element-tree engine (`webm-iterable`) and
//! dispatches its events to codec sessions:
//!
//! - **reader**: position-accounting adapter, rewind-to-zero only
//! - **block**: SimpleBlock/Block body parsing with full lacing
//! - **track**: TrackEntry flattening
//! - **dispatch**: `TrackPump` + `TrackCallback` — one frame per resumption
//! - **scan**: structural metadata pass (no codec sessions)
//!
//! The element tree itself is never parsed here; the engine owns that.

pub mod block;
pub mod dispatch;
pub mod reader;
pub mod scan;
pub mod track;

#[cfg(test)]
pub(crate) mod testutil;

pub use block::{parse_block, BlockView};
pub use dispatch::{FeedState, Flow, FramePayload, PumpStatus, TrackCallback, TrackPump};
pub use reader::SharedReader;
pub use scan::{scan_container, AudioTrackMeta, ScanReport, VideoTrackMeta};
pub use track::{AudioSettings, TrackEntryInfo, VideoSettings};
