//! Chroma subsampling and the fixed color-conversion matrix.
//!
//! Decoded frames carry raw (Y, Cb, Cr) in their color channels; the
//! consumer applies [`ColorMatrix`] to reach RGB. The matrix uses BT.601
//! studio-swing coefficients:
//!
//! ```text
//! R = 1.164 * (Y - 16/255) + 1.596 * (Cr - 0.5)
//! G = 1.164 * (Y - 16/255) - 0.392 * (Cb - 0.5) - 0.813 * (Cr - 0.5)
//! B = 1.164 * (Y - 16/255) + 2.017 * (Cb - 0.5)
//! ```

use serde::{Deserialize, Serialize};

/// Chroma subsampling layout of a decoded image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChromaSubsampling {
    /// 4:2:0 — chroma halved in both directions.
    C420,
    /// 4:2:2 — chroma halved horizontally.
    C422,
    /// 4:4:4 — full-resolution chroma.
    C444,
}

impl ChromaSubsampling {
    /// Right-shift applied to the horizontal pixel index when sampling chroma.
    pub fn shift_x(self) -> u32 {
        match self {
            Self::C420 | Self::C422 => 1,
            Self::C444 => 0,
        }
    }

    /// Right-shift applied to the vertical pixel index when sampling chroma.
    pub fn shift_y(self) -> u32 {
        match self {
            Self::C420 => 1,
            Self::C422 | Self::C444 => 0,
        }
    }
}

/// Row-major 3x4 matrix mapping normalized (y, cb, cr, 1) to (r, g, b).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorMatrix(pub [f32; 12]);

impl ColorMatrix {
    /// Identity transform (color channels passed through).
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ]);

    /// BT.601 studio-swing YCbCr to RGB.
    pub const YCBCR_BT601: Self = Self([
        1.164, 0.0, 1.596, -0.8708, //
        1.164, -0.392, -0.813, 0.5296, //
        1.164, 2.017, 0.0, -1.0815,
    ]);

    /// The fixed matrix for a detected subsampling. The coefficients do not
    /// vary with the sampling layout; the call exists to reject layouts the
    /// conversion path cannot index.
    pub fn for_subsampling(_cs: ChromaSubsampling) -> Self {
        Self::YCBCR_BT601
    }

    /// Apply the matrix to one normalized pixel.
    pub fn apply(&self, y: f32, cb: f32, cr: f32) -> (f32, f32, f32) {
        let m = &self.0;
        (
            m[0] * y + m[1] * cb + m[2] * cr + m[3],
            m[4] * y + m[5] * cb + m[6] * cr + m[7],
            m[8] * y + m[9] * cb + m[10] * cr + m[11],
        )
    }
}
