//! Central error types for the decode engine (thiserror-based).

use thiserror::Error;

/// Top-level media error.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Demux error: {0}")]
    Demux(#[from] DemuxError),

    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Unsupported container format")]
    UnsupportedContainer,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Container traversal and dispatch errors.
#[derive(Error, Debug)]
pub enum DemuxError {
    /// The element-tree engine rejected the stream outright.
    #[error("Parser engine error: {reason}")]
    Engine { reason: String },

    /// A block body did not parse (bad vint, bad lacing header).
    #[error("Invalid block at offset {offset}: {reason}")]
    InvalidBlock { offset: usize, reason: String },

    /// A block body ended before its declared content.
    #[error("Truncated block data: expected {expected} bytes, got {got}")]
    TruncatedBlock { expected: usize, got: usize },

    /// A frame hook returned without draining its payload. Internal
    /// invariant violation, always fatal.
    #[error("Frame hook left {left} bytes unconsumed")]
    UnconsumedFrameBytes { left: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Video codec session errors.
#[derive(Error, Debug)]
pub enum VideoError {
    /// libvpx context creation or decode failure.
    #[error("Video codec error: {reason}")]
    Codec { reason: String },

    /// The decoder produced an image in a layout the conversion path
    /// cannot index.
    #[error("Unsupported pixel format: {fmt}")]
    UnsupportedPixelFormat { fmt: String },

    /// Destination buffer smaller than one packed frame.
    #[error("Output buffer too small: need {needed}, got {got}")]
    OutputTooSmall { needed: usize, got: usize },

    #[error("Demux error: {0}")]
    Demux(#[from] DemuxError),
}

/// Audio codec session errors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The codec private blob failed header reconstruction.
    #[error("Invalid codec private data: {reason}")]
    InvalidPrivate { reason: String },

    /// Vorbis header ingestion or packet synthesis failure.
    #[error("Audio codec error: {reason}")]
    Codec { reason: String },

    #[error("Demux error: {0}")]
    Demux(#[from] DemuxError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DemuxError::UnconsumedFrameBytes { left: 12 };
        assert_eq!(err.to_string(), "Frame hook left 12 bytes unconsumed");
    }

    #[test]
    fn error_aggregation() {
        let demux = DemuxError::Engine {
            reason: "bad vint".into(),
        };
        let media: MediaError = VideoError::from(demux).into();
        assert!(matches!(media, MediaError::Video(VideoError::Demux(_))));
    }

    #[test]
    fn io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: DemuxError = io_err.into();
        assert!(matches!(err, DemuxError::Io(_)));
    }
}
