//! Hand-rolled EBML builders for synthetic WebM containers in tests.
//!
//! Only writes elements the Matroska schema knows, with explicit sizes,
//! so the engine can walk the tree deterministically.

use byteorder::{BigEndian, ByteOrder};

// Element IDs (class bytes, written verbatim)
const EBML_HEADER: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];
const DOC_TYPE: &[u8] = &[0x42, 0x82];
const SEGMENT: &[u8] = &[0x18, 0x53, 0x80, 0x67];
const INFO: &[u8] = &[0x15, 0x49, 0xA9, 0x66];
const TIMESTAMP_SCALE: &[u8] = &[0x2A, 0xD7, 0xB1];
const DURATION: &[u8] = &[0x44, 0x89];
const TRACKS: &[u8] = &[0x16, 0x54, 0xAE, 0x6B];
const TRACK_ENTRY: &[u8] = &[0xAE];
const TRACK_NUMBER: &[u8] = &[0xD7];
const TRACK_TYPE: &[u8] = &[0x83];
const FLAG_ENABLED: &[u8] = &[0xB9];
const CODEC_ID: &[u8] = &[0x86];
const CODEC_PRIVATE: &[u8] = &[0x63, 0xA2];
const DEFAULT_DURATION: &[u8] = &[0x23, 0xE3, 0x83];
const VIDEO: &[u8] = &[0xE0];
const PIXEL_WIDTH: &[u8] = &[0xB0];
const PIXEL_HEIGHT: &[u8] = &[0xBA];
const ALPHA_MODE: &[u8] = &[0x53, 0xC0];
const AUDIO: &[u8] = &[0xE1];
const SAMPLING_FREQUENCY: &[u8] = &[0xB5];
const CHANNELS: &[u8] = &[0x9F];
const BIT_DEPTH: &[u8] = &[0x62, 0x64];
const CLUSTER: &[u8] = &[0x1F, 0x43, 0xB6, 0x75];
const TIMESTAMP: &[u8] = &[0xE7];
const SIMPLE_BLOCK: &[u8] = &[0xA3];
const BLOCK_GROUP: &[u8] = &[0xA0];
const BLOCK: &[u8] = &[0xA1];
const BLOCK_ADDITIONS: &[u8] = &[0x75, 0xA1];
const BLOCK_MORE: &[u8] = &[0xA6];
const BLOCK_ADD_ID: &[u8] = &[0xEE];
const BLOCK_ADDITIONAL: &[u8] = &[0xA5];

/// Encode an element size as a VINT.
pub fn write_vint(value: u64) -> Vec<u8> {
    let mut width = 1;
    // All-ones is reserved for "unknown size"; bump the width there.
    while width < 8 && value >= (1u64 << (7 * width)) - 1 {
        width += 1;
    }
    let mut out = vec![0u8; width];
    let mut v = value;
    for i in (0..width).rev() {
        out[i] = (v & 0xFF) as u8;
        v >>= 8;
    }
    out[0] |= 0x80 >> (width - 1);
    out
}

/// Wrap a payload in `[id][size][payload]`.
pub fn elem(id: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(id.len() + 8 + payload.len());
    out.extend_from_slice(id);
    out.extend_from_slice(&write_vint(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}

pub fn uint_elem(id: &[u8], value: u64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes.remove(0);
    }
    elem(id, &bytes)
}

pub fn float_elem(id: &[u8], value: f64) -> Vec<u8> {
    elem(id, &value.to_be_bytes())
}

pub fn string_elem(id: &[u8], value: &str) -> Vec<u8> {
    elem(id, value.as_bytes())
}

fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.iter().flatten().copied().collect()
}

/// Minimal EBML header declaring the webm doctype.
pub fn ebml_header() -> Vec<u8> {
    elem(EBML_HEADER, &string_elem(DOC_TYPE, "webm"))
}

/// A whole file: EBML header + Segment wrapping the given elements.
pub fn webm_file(segment_children: &[Vec<u8>]) -> Vec<u8> {
    let mut out = ebml_header();
    out.extend_from_slice(&elem(SEGMENT, &concat(segment_children)));
    out
}

pub fn info_elem(timestamp_scale: u64, duration_ticks: Option<f64>) -> Vec<u8> {
    let mut children = vec![uint_elem(TIMESTAMP_SCALE, timestamp_scale)];
    if let Some(d) = duration_ticks {
        children.push(float_elem(DURATION, d));
    }
    elem(INFO, &concat(&children))
}

pub fn tracks_elem(entries: &[Vec<u8>]) -> Vec<u8> {
    elem(TRACKS, &concat(entries))
}

pub fn video_track_entry(number: u64, codec: &str, width: u64, height: u64, alpha: bool) -> Vec<u8> {
    let mut video_children = vec![
        uint_elem(PIXEL_WIDTH, width),
        uint_elem(PIXEL_HEIGHT, height),
    ];
    if alpha {
        video_children.push(uint_elem(ALPHA_MODE, 1));
    }
    let children = vec![
        uint_elem(TRACK_NUMBER, number),
        uint_elem(TRACK_TYPE, 1),
        string_elem(CODEC_ID, codec),
        elem(VIDEO, &concat(&video_children)),
    ];
    elem(TRACK_ENTRY, &concat(&children))
}

pub fn video_track_entry_with_duration(
    number: u64,
    codec: &str,
    width: u64,
    height: u64,
    default_duration_ns: u64,
) -> Vec<u8> {
    let children = vec![
        uint_elem(TRACK_NUMBER, number),
        uint_elem(TRACK_TYPE, 1),
        string_elem(CODEC_ID, codec),
        uint_elem(DEFAULT_DURATION, default_duration_ns),
        elem(
            VIDEO,
            &concat(&[uint_elem(PIXEL_WIDTH, width), uint_elem(PIXEL_HEIGHT, height)]),
        ),
    ];
    elem(TRACK_ENTRY, &concat(&children))
}

pub fn audio_track_entry(
    number: u64,
    codec: &str,
    sampling_frequency: f64,
    channels: u64,
    codec_private: &[u8],
) -> Vec<u8> {
    let children = vec![
        uint_elem(TRACK_NUMBER, number),
        uint_elem(TRACK_TYPE, 2),
        string_elem(CODEC_ID, codec),
        elem(CODEC_PRIVATE, codec_private),
        elem(
            AUDIO,
            &concat(&[
                float_elem(SAMPLING_FREQUENCY, sampling_frequency),
                uint_elem(CHANNELS, channels),
                uint_elem(BIT_DEPTH, 16),
            ]),
        ),
    ];
    elem(TRACK_ENTRY, &concat(&children))
}

/// Rebuild a track entry with FlagEnabled=0 appended.
pub fn disable_track(entry: Vec<u8>) -> Vec<u8> {
    // entry = [0xAE][size vint][payload]; re-wrap with the extra child.
    assert_eq!(entry[0], 0xAE);
    let width = (entry[1].leading_zeros() + 1) as usize;
    let mut payload = entry[1 + width..].to_vec();
    payload.extend_from_slice(&uint_elem(FLAG_ENABLED, 0));
    elem(TRACK_ENTRY, &payload)
}

pub fn cluster_elem(timestamp: u64, blocks: &[Vec<u8>]) -> Vec<u8> {
    let mut children = vec![uint_elem(TIMESTAMP, timestamp)];
    children.extend_from_slice(blocks);
    elem(CLUSTER, &concat(&children))
}

/// Block body shared by SimpleBlock and Block: no lacing.
fn block_body(track: u64, timecode: i16, flags: u8, frame: &[u8]) -> Vec<u8> {
    let mut body = write_vint(track);
    let mut tc = [0u8; 2];
    BigEndian::write_i16(&mut tc, timecode);
    body.extend_from_slice(&tc);
    body.push(flags);
    body.extend_from_slice(frame);
    body
}

pub fn simple_block_elem(track: u64, timecode: i16, frame: &[u8]) -> Vec<u8> {
    elem(SIMPLE_BLOCK, &block_body(track, timecode, 0x80, frame))
}

/// SimpleBlock with Xiph lacing over the given frames.
pub fn xiph_block_elem(track: u64, timecode: i16, frames: &[&[u8]]) -> Vec<u8> {
    let mut body = write_vint(track);
    let mut tc = [0u8; 2];
    BigEndian::write_i16(&mut tc, timecode);
    body.extend_from_slice(&tc);
    body.push(0x02); // Xiph lacing flag
    body.push((frames.len() - 1) as u8);
    for frame in &frames[..frames.len() - 1] {
        let mut size = frame.len();
        while size >= 255 {
            body.push(255);
            size -= 255;
        }
        body.push(size as u8);
    }
    for frame in frames {
        body.extend_from_slice(frame);
    }
    elem(SIMPLE_BLOCK, &body)
}

/// BlockGroup holding one Block, optionally with a BlockAdditional.
pub fn block_group_elem(
    track: u64,
    timecode: i16,
    frame: &[u8],
    additional: Option<(u64, &[u8])>,
) -> Vec<u8> {
    let mut children = vec![elem(BLOCK, &block_body(track, timecode, 0x00, frame))];
    if let Some((add_id, data)) = additional {
        let more = concat(&[uint_elem(BLOCK_ADD_ID, add_id), elem(BLOCK_ADDITIONAL, data)]);
        children.push(elem(BLOCK_ADDITIONS, &elem(BLOCK_MORE, &more)));
    }
    elem(BLOCK_GROUP, &concat(&children))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vint_widths() {
        assert_eq!(write_vint(1), vec![0x81]);
        assert_eq!(write_vint(126), vec![0xFE]);
        // 127 collides with the 1-byte unknown-size marker
        assert_eq!(write_vint(127), vec![0x40, 0x7F]);
        assert_eq!(write_vint(128), vec![0x40, 0x80]);
    }

    #[test]
    fn uint_minimal_bytes() {
        assert_eq!(uint_elem(&[0xD7], 0)[2..], [0x00]);
        assert_eq!(uint_elem(&[0xD7], 0x0102)[2..], [0x01, 0x02]);
    }

    #[test]
    fn file_starts_with_ebml_magic() {
        let file = webm_file(&[]);
        assert_eq!(&file[..4], &[0x1A, 0x45, 0xDF, 0xA3]);
    }
}
