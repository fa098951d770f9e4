//! Packed-pixel conversion from planar decoder output.
//!
//! Output buffers are packed (Y, Cb, Cr) or (Y, Cb, Cr, A), written with
//! destination rows top-to-bottom while reading source rows
//! bottom-to-top — the output convention stores the image inverted
//! relative to the decoder. Chroma is sampled through the subsampling
//! shifts; colorimetric conversion is left to the consumer via
//! `ColorMatrix`.

use wd_common::{ChromaSubsampling, VideoError};

/// Borrowed planar image (decoder output or synthetic test data).
pub struct PlaneImage<'a> {
    pub width: usize,
    pub height: usize,
    pub subsampling: ChromaSubsampling,
    pub y: &'a [u8],
    pub y_stride: usize,
    pub u: &'a [u8],
    pub u_stride: usize,
    pub v: &'a [u8],
    pub v_stride: usize,
}

impl PlaneImage<'_> {
    fn chroma_rows(&self) -> usize {
        (self.height + (1 << self.subsampling.shift_y()) - 1) >> self.subsampling.shift_y()
    }

    fn validate(&self) -> Result<(), VideoError> {
        let chroma_rows = self.chroma_rows();
        if self.y.len() < self.y_stride * self.height
            || self.u.len() < self.u_stride * chroma_rows
            || self.v.len() < self.v_stride * chroma_rows
        {
            return Err(VideoError::Codec {
                reason: "image planes smaller than their declared geometry".into(),
            });
        }
        Ok(())
    }
}

/// Write one decoded image into a packed destination buffer.
///
/// `components` is 3 (no alpha stream) or 4; with 4, the alpha byte is
/// initialized opaque and later overwritten by the auxiliary pass.
pub fn write_packed(
    dest: &mut [u8],
    components: usize,
    img: &PlaneImage<'_>,
) -> Result<(), VideoError> {
    debug_assert!(components == 3 || components == 4);
    img.validate()?;

    let needed = img.width * img.height * components;
    if dest.len() < needed {
        return Err(VideoError::OutputTooSmall {
            needed,
            got: dest.len(),
        });
    }

    let shift_x = img.subsampling.shift_x();
    let shift_y = img.subsampling.shift_y();

    for dest_row in 0..img.height {
        let src_row = img.height - 1 - dest_row;
        let y_row = &img.y[src_row * img.y_stride..];
        let u_row = &img.u[(src_row >> shift_y) * img.u_stride..];
        let v_row = &img.v[(src_row >> shift_y) * img.v_stride..];
        let out = &mut dest[dest_row * img.width * components..];

        for x in 0..img.width {
            let base = x * components;
            let cx = x >> shift_x;
            out[base] = y_row[x];
            out[base + 1] = u_row[cx];
            out[base + 2] = v_row[cx];
            if components == 4 {
                out[base + 3] = 0xFF;
            }
        }
    }

    Ok(())
}

/// Overwrite the alpha channel of an already-written 4-component buffer
/// from the luma plane of the auxiliary image. Color bytes are never
/// touched here.
pub fn merge_alpha(dest: &mut [u8], img: &PlaneImage<'_>) -> Result<(), VideoError> {
    img.validate()?;

    let needed = img.width * img.height * 4;
    if dest.len() < needed {
        return Err(VideoError::OutputTooSmall {
            needed,
            got: dest.len(),
        });
    }

    for dest_row in 0..img.height {
        let src_row = img.height - 1 - dest_row;
        let y_row = &img.y[src_row * img.y_stride..];
        let out = &mut dest[dest_row * img.width * 4..];

        for x in 0..img.width {
            out[x * 4 + 3] = y_row[x];
        }
    }

    Ok(())
}
