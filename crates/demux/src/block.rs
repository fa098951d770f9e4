//! Block body parsing for Matroska/WebM containers.
//!
//! Parses `SimpleBlock` and `Block` element bodies to extract the track
//! number, timecode offset, flags, and the byte range of every laced
//! frame.
//!
//! ## Block body format
//!
//! ```text
//! [track_number: vint] [timecode: int16, relative to cluster] [flags: u8] [frame_data...]
//! ```
//!
//! Flag bits:
//! - bit 7 (0x80): keyframe (SimpleBlock only)
//! - bit 3 (0x08): invisible
//! - bits 1-2 (0x06): lacing type (00=none, 01=Xiph, 11=EBML, 10=fixed-size)

use byteorder::{BigEndian, ByteOrder};
use std::ops::Range;

use wd_common::DemuxError;

/// Parsed view of a SimpleBlock or Block body. Frame ranges index into
/// the payload slice the view was parsed from.
#[derive(Clone, Debug)]
pub struct BlockView {
    /// Track number this block belongs to.
    pub track: u64,
    /// Timecode offset relative to the cluster timestamp (signed 16-bit).
    pub timecode: i16,
    /// Keyframe flag (only meaningful for SimpleBlock).
    pub keyframe: bool,
    /// Invisible flag (frame decoded but not presented).
    pub invisible: bool,
    frames: Vec<Range<usize>>,
}

impl BlockView {
    /// Number of laced frames declared by this block.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_range(&self, index: usize) -> Range<usize> {
        self.frames[index].clone()
    }
}

/// Lacing type for Matroska blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LacingType {
    None,
    Xiph,
    Ebml,
    FixedSize,
}

/// Parse a SimpleBlock or Block element body.
///
/// The `data` slice starts immediately after the element header (ID +
/// size), i.e., it contains: `[track_vint][timecode_i16][flags_u8][frames...]`
pub fn parse_block(data: &[u8]) -> Result<BlockView, DemuxError> {
    if data.is_empty() {
        return Err(DemuxError::InvalidBlock {
            offset: 0,
            reason: "empty block body".into(),
        });
    }

    let mut offset = 0;

    let (track, vint_len) = read_block_vint(&data[offset..])?;
    offset += vint_len;

    if offset + 2 > data.len() {
        return Err(DemuxError::TruncatedBlock {
            expected: offset + 2,
            got: data.len(),
        });
    }
    let timecode = BigEndian::read_i16(&data[offset..offset + 2]);
    offset += 2;

    if offset >= data.len() {
        return Err(DemuxError::TruncatedBlock {
            expected: offset + 1,
            got: data.len(),
        });
    }
    let flags = data[offset];
    offset += 1;

    let keyframe = flags & 0x80 != 0;
    let invisible = flags & 0x08 != 0;
    let lacing = match (flags >> 1) & 0x03 {
        0b00 => LacingType::None,
        0b01 => LacingType::Xiph,
        0b11 => LacingType::Ebml,
        0b10 => LacingType::FixedSize,
        _ => unreachable!(),
    };

    let frames = match lacing {
        LacingType::None => vec![offset..data.len()],
        LacingType::Xiph => parse_xiph_lacing(data, offset)?,
        LacingType::FixedSize => parse_fixed_lacing(data, offset)?,
        LacingType::Ebml => parse_ebml_lacing(data, offset)?,
    };

    Ok(BlockView {
        track,
        timecode,
        keyframe,
        invisible,
        frames,
    })
}

// ─── Block VINT parsing ──────────────────────────────────────────────

/// Read a VINT from a block header (track number / lace size encoding).
///
/// Unlike EBML element IDs, these VINTs strip the leading-1 marker, the
/// same as the size VINT encoding.
///
/// Returns `(value, bytes_consumed)`.
fn read_block_vint(data: &[u8]) -> Result<(u64, usize), DemuxError> {
    if data.is_empty() {
        return Err(DemuxError::TruncatedBlock {
            expected: 1,
            got: 0,
        });
    }

    let first = data[0];
    let width = block_vint_width(first)?;

    if data.len() < width {
        return Err(DemuxError::TruncatedBlock {
            expected: width,
            got: data.len(),
        });
    }

    // Strip the leading-1 marker from the first byte
    let mask = 0xFF >> width;
    let mut value = (first & mask) as u64;

    for &byte in data.iter().take(width).skip(1) {
        value = (value << 8) | byte as u64;
    }

    Ok((value, width))
}

/// Width of a block-header VINT from its first byte.
fn block_vint_width(first: u8) -> Result<usize, DemuxError> {
    if first & 0x80 != 0 {
        Ok(1)
    } else if first & 0x40 != 0 {
        Ok(2)
    } else if first & 0x20 != 0 {
        Ok(3)
    } else if first & 0x10 != 0 {
        Ok(4)
    } else {
        Err(DemuxError::InvalidBlock {
            offset: 0,
            reason: format!("invalid block VINT leading byte: 0x{first:02X}"),
        })
    }
}

// ─── Lacing ──────────────────────────────────────────────────────────

/// Xiph lacing: `[num_frames_minus_1: u8] [sizes...] [frame_data...]`.
///
/// Each of the first (n-1) frame sizes is a run of bytes summed together,
/// terminated by the first byte below 255. The last frame takes whatever
/// remains.
fn parse_xiph_lacing(data: &[u8], mut offset: usize) -> Result<Vec<Range<usize>>, DemuxError> {
    if offset >= data.len() {
        return Err(DemuxError::TruncatedBlock {
            expected: offset + 1,
            got: data.len(),
        });
    }

    let num_frames = data[offset] as usize + 1;
    offset += 1;

    let mut sizes = Vec::with_capacity(num_frames - 1);
    for _ in 0..num_frames - 1 {
        let mut size: usize = 0;
        loop {
            if offset >= data.len() {
                return Err(DemuxError::TruncatedBlock {
                    expected: offset + 1,
                    got: data.len(),
                });
            }
            let b = data[offset] as usize;
            offset += 1;
            size += b;
            if b < 255 {
                break;
            }
        }
        sizes.push(size);
    }

    collect_frame_ranges(data, offset, &sizes)
}

/// Fixed-size lacing: `[num_frames_minus_1: u8]`, all frames equal size.
fn parse_fixed_lacing(data: &[u8], offset: usize) -> Result<Vec<Range<usize>>, DemuxError> {
    if offset >= data.len() {
        return Err(DemuxError::TruncatedBlock {
            expected: offset + 1,
            got: data.len(),
        });
    }

    let num_frames = data[offset] as usize + 1;
    let start = offset + 1;
    let remaining = data.len() - start;

    if remaining % num_frames != 0 {
        return Err(DemuxError::InvalidBlock {
            offset,
            reason: format!(
                "fixed-size lacing: {remaining} bytes not evenly divisible by {num_frames} frames"
            ),
        });
    }

    let frame_size = remaining / num_frames;
    Ok((0..num_frames)
        .map(|i| start + i * frame_size..start + (i + 1) * frame_size)
        .collect())
}

/// EBML lacing: `[num_frames_minus_1: u8] [first_size: vint]
/// [size_deltas: signed vints...]`; each subsequent size is the previous
/// plus a signed delta. The last frame takes whatever remains.
fn parse_ebml_lacing(data: &[u8], mut offset: usize) -> Result<Vec<Range<usize>>, DemuxError> {
    if offset >= data.len() {
        return Err(DemuxError::TruncatedBlock {
            expected: offset + 1,
            got: data.len(),
        });
    }

    let num_frames = data[offset] as usize + 1;
    offset += 1;

    let mut sizes = Vec::with_capacity(num_frames - 1);
    if num_frames > 1 {
        let (first_size, vint_len) = read_block_vint(&data[offset..])?;
        offset += vint_len;
        sizes.push(first_size as usize);

        let mut prev = first_size as i64;
        for _ in 0..num_frames - 2 {
            let (raw, vint_len) = read_block_vint(&data[offset..])?;
            offset += vint_len;
            // Signed delta: stored with a bias of 2^(7*len - 1) - 1
            let bias = (1i64 << (7 * vint_len - 1)) - 1;
            prev += raw as i64 - bias;
            if prev < 0 {
                return Err(DemuxError::InvalidBlock {
                    offset,
                    reason: "EBML lacing produced a negative frame size".into(),
                });
            }
            sizes.push(prev as usize);
        }
    }

    collect_frame_ranges(data, offset, &sizes)
}

/// Turn explicit sizes for the first (n-1) frames plus the implicit
/// remainder frame into byte ranges, validating against the payload end.
fn collect_frame_ranges(
    data: &[u8],
    mut offset: usize,
    sizes: &[usize],
) -> Result<Vec<Range<usize>>, DemuxError> {
    let mut frames = Vec::with_capacity(sizes.len() + 1);
    for &size in sizes {
        if offset + size > data.len() {
            return Err(DemuxError::TruncatedBlock {
                expected: offset + size,
                got: data.len(),
            });
        }
        frames.push(offset..offset + size);
        offset += size;
    }
    frames.push(offset..data.len());
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a block body with no lacing:
    /// [track_vint] [timecode=0] [flags] [frame_data]
    fn make_block(track_vint: u8, flags: u8, frame_data: &[u8]) -> Vec<u8> {
        let mut data = vec![track_vint, 0x00, 0x00, flags];
        data.extend_from_slice(frame_data);
        data
    }

    #[test]
    fn test_parse_unlaced_keyframe() {
        let frame = [0xDE, 0xAD, 0xBE, 0xEF];
        let data = make_block(0x81, 0x80, &frame);
        let view = parse_block(&data).unwrap();

        assert_eq!(view.track, 1);
        assert_eq!(view.timecode, 0);
        assert!(view.keyframe);
        assert!(!view.invisible);
        assert_eq!(view.frame_count(), 1);
        assert_eq!(&data[view.frame_range(0)], &frame);
    }

    #[test]
    fn test_parse_track_two() {
        let data = make_block(0x82, 0x00, &[0x01]);
        let view = parse_block(&data).unwrap();
        assert_eq!(view.track, 2);
        assert!(!view.keyframe);
    }

    #[test]
    fn test_parse_two_byte_track_vint() {
        // 0x40 0x80 = 01_000000 10000000 -> track 128
        let mut data = vec![0x40, 0x80, 0x00, 0x00, 0x00];
        data.push(0xAB);
        let view = parse_block(&data).unwrap();
        assert_eq!(view.track, 128);
    }

    #[test]
    fn test_negative_timecode() {
        let mut data = vec![0x81];
        data.extend_from_slice(&(-5i16).to_be_bytes());
        data.push(0x00);
        data.push(0xAA);
        let view = parse_block(&data).unwrap();
        assert_eq!(view.timecode, -5);
    }

    #[test]
    fn test_invisible_flag() {
        let data = make_block(0x81, 0x08, &[0xAA]);
        let view = parse_block(&data).unwrap();
        assert!(view.invisible);
    }

    #[test]
    fn test_empty_and_truncated() {
        assert!(parse_block(&[]).is_err());
        assert!(parse_block(&[0x81, 0x00]).is_err());
    }

    #[test]
    fn test_xiph_lacing_all_frames() {
        // 3 frames: sizes 3 and 2 declared, last is the remainder (4)
        let mut data = vec![0x81, 0x00, 0x00, 0x02]; // flags: Xiph lacing
        data.push(0x02); // num_frames - 1 = 2
        data.push(0x03); // size of frame 0
        data.push(0x02); // size of frame 1
        data.extend_from_slice(&[0xA0, 0xA1, 0xA2]); // frame 0
        data.extend_from_slice(&[0xB0, 0xB1]); // frame 1
        data.extend_from_slice(&[0xC0, 0xC1, 0xC2, 0xC3]); // frame 2

        let view = parse_block(&data).unwrap();
        assert_eq!(view.frame_count(), 3);
        assert_eq!(&data[view.frame_range(0)], &[0xA0, 0xA1, 0xA2]);
        assert_eq!(&data[view.frame_range(1)], &[0xB0, 0xB1]);
        assert_eq!(&data[view.frame_range(2)], &[0xC0, 0xC1, 0xC2, 0xC3]);
    }

    #[test]
    fn test_xiph_lacing_long_size() {
        // One declared size of 255 + 1 = 256 bytes
        let mut data = vec![0x81, 0x00, 0x00, 0x02];
        data.push(0x01); // 2 frames
        data.extend_from_slice(&[0xFF, 0x01]); // size 256
        data.extend_from_slice(&vec![0x11; 256]);
        data.extend_from_slice(&[0x22, 0x22]);

        let view = parse_block(&data).unwrap();
        assert_eq!(view.frame_count(), 2);
        assert_eq!(view.frame_range(0).len(), 256);
        assert_eq!(view.frame_range(1).len(), 2);
    }

    #[test]
    fn test_fixed_lacing() {
        // 2 frames of 2 bytes each
        let mut data = vec![0x81, 0x00, 0x00, 0x04]; // flags: fixed-size lacing
        data.push(0x01); // num_frames - 1 = 1
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let view = parse_block(&data).unwrap();
        assert_eq!(view.frame_count(), 2);
        assert_eq!(&data[view.frame_range(0)], &[0xAA, 0xBB]);
        assert_eq!(&data[view.frame_range(1)], &[0xCC, 0xDD]);
    }

    #[test]
    fn test_fixed_lacing_uneven_rejected() {
        let mut data = vec![0x81, 0x00, 0x00, 0x04];
        data.push(0x01); // 2 frames
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC]); // 3 bytes, not divisible
        assert!(parse_block(&data).is_err());
    }

    #[test]
    fn test_ebml_lacing() {
        // 3 frames: first size 4, delta -1 (size 3), remainder 2
        let mut data = vec![0x81, 0x00, 0x00, 0x06]; // flags: EBML lacing
        data.push(0x02); // num_frames - 1 = 2
        data.push(0x84); // first size = 4 (1-byte vint)
        data.push(0x80 | 0x3E); // delta vint: raw 0x3E, bias 63 -> -1
        data.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]); // frame 0
        data.extend_from_slice(&[0x05, 0x06, 0x07]); // frame 1
        data.extend_from_slice(&[0x08, 0x09]); // frame 2

        let view = parse_block(&data).unwrap();
        assert_eq!(view.frame_count(), 3);
        assert_eq!(&data[view.frame_range(0)], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&data[view.frame_range(1)], &[0x05, 0x06, 0x07]);
        assert_eq!(&data[view.frame_range(2)], &[0x08, 0x09]);
    }

    #[test]
    fn test_lacing_overrun_rejected() {
        // Xiph size claims more bytes than the payload holds
        let mut data = vec![0x81, 0x00, 0x00, 0x02];
        data.push(0x01);
        data.push(0x20); // size 32
        data.extend_from_slice(&[0x00; 4]); // only 4 bytes present
        assert!(parse_block(&data).is_err());
    }
}
