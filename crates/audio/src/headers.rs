//! Vorbis header reconstruction from the track's private blob.
//!
//! WebM stores the three required Vorbis header packets Xiph-laced in
//! CodecPrivate:
//!
//! ```text
//! [packet_count - 1 = 2] [len(ident): xiph] [len(comment): xiph] [ident] [comment] [setup]
//! ```
//!
//! Each length is a run of bytes summed together, terminated by the
//! first byte below 255. The setup packet's length is whatever remains
//! after the first two segments and the length prefix.

use wd_common::AudioError;

/// The marker byte: three packets, count stored minus one.
const PACKET_COUNT_MARKER: u8 = 2;

/// The three reconstructed header packets, borrowed from the blob.
#[derive(Debug, PartialEq)]
pub struct HeaderPackets<'a> {
    pub ident: &'a [u8],
    pub comment: &'a [u8],
    pub setup: &'a [u8],
}

/// Split a CodecPrivate blob into the three Vorbis header packets.
///
/// Fails cleanly (no partial state) on a bad marker or when the encoded
/// lengths overrun the blob.
pub fn split_codec_private(blob: &[u8]) -> Result<HeaderPackets<'_>, AudioError> {
    if blob.is_empty() {
        return Err(AudioError::InvalidPrivate {
            reason: "empty blob".into(),
        });
    }
    if blob[0] != PACKET_COUNT_MARKER {
        return Err(AudioError::InvalidPrivate {
            reason: format!("expected packet count marker 2, got {}", blob[0]),
        });
    }

    let mut offset = 1;
    let ident_len = read_xiph_length(blob, &mut offset)?;
    let comment_len = read_xiph_length(blob, &mut offset)?;

    let ident_end = offset + ident_len;
    let comment_end = ident_end + comment_len;
    if comment_end > blob.len() {
        return Err(AudioError::InvalidPrivate {
            reason: format!(
                "declared segments ({ident_len} + {comment_len} bytes at offset {offset}) overrun \
                 blob of {} bytes",
                blob.len()
            ),
        });
    }

    Ok(HeaderPackets {
        ident: &blob[offset..ident_end],
        comment: &blob[ident_end..comment_end],
        setup: &blob[comment_end..],
    })
}

/// Sum 255-run length bytes, advancing `offset` past them.
fn read_xiph_length(blob: &[u8], offset: &mut usize) -> Result<usize, AudioError> {
    let mut length = 0usize;
    loop {
        let Some(&byte) = blob.get(*offset) else {
            return Err(AudioError::InvalidPrivate {
                reason: "length prefix runs past end of blob".into(),
            });
        };
        *offset += 1;
        length += byte as usize;
        if byte < 255 {
            return Ok(length);
        }
    }
}
