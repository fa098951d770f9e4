//! Safe wrapper around the libvpx decoder FFI.
//!
//! One `VpxContext` is one decode context. The color stream and the
//! optional alpha sub-stream each get their own context; both are
//! destroyed with the session.
//!
//! libvpx must be installed on the system (libvpx-dev / libvpx).

use std::ffi::CStr;
use std::ptr;

use vpx_sys::*;

use wd_common::{ChromaSubsampling, VideoCodec, VideoError};

use crate::convert::PlaneImage;

/// One libvpx decode context.
pub struct VpxContext {
    ctx: vpx_codec_ctx_t,
    initialized: bool,
}

impl VpxContext {
    /// Initialize a decoder for the given codec.
    ///
    /// `threads` is handed straight to libvpx; 0 lets it pick.
    pub fn new(codec: VideoCodec, threads: u32) -> Result<Self, VideoError> {
        unsafe {
            let mut ctx: vpx_codec_ctx_t = std::mem::zeroed();

            let iface = match codec {
                VideoCodec::Vp8 => vpx_codec_vp8_dx(),
                VideoCodec::Vp9 => vpx_codec_vp9_dx(),
            };
            if iface.is_null() {
                return Err(VideoError::Codec {
                    reason: format!("no decoder interface for {codec:?}"),
                });
            }

            let mut cfg: vpx_codec_dec_cfg_t = std::mem::zeroed();
            cfg.threads = threads;

            let ret = vpx_codec_dec_init_ver(
                &mut ctx,
                iface,
                &cfg,
                0,
                VPX_DECODER_ABI_VERSION as i32,
            );
            if ret != VPX_CODEC_OK {
                return Err(VideoError::Codec {
                    reason: format!("decoder init failed: {}", describe_error(&ctx, ret)),
                });
            }

            Ok(Self {
                ctx,
                initialized: true,
            })
        }
    }

    /// Feed one whole compressed frame. The codec requires complete
    /// frames; partial feeds are not supported.
    pub fn decode(&mut self, data: &[u8]) -> Result<(), VideoError> {
        if data.is_empty() {
            return Err(VideoError::Codec {
                reason: "empty frame payload".into(),
            });
        }

        unsafe {
            let ret = vpx_codec_decode(
                &mut self.ctx,
                data.as_ptr(),
                data.len() as u32,
                ptr::null_mut(),
                0,
            );
            if ret != VPX_CODEC_OK {
                return Err(VideoError::Codec {
                    reason: format!("decode failed: {}", describe_error(&self.ctx, ret)),
                });
            }
        }
        Ok(())
    }

    /// Pull the decoded image of the last [`decode`](Self::decode) call.
    ///
    /// Returns `Ok(None)` when the codec produced no displayable image
    /// (e.g. an invisible frame); an image in a layout the conversion
    /// path cannot index is an error.
    pub fn frame_image(&mut self) -> Result<Option<PlaneImage<'_>>, VideoError> {
        unsafe {
            let mut iter: vpx_codec_iter_t = ptr::null();
            let img = vpx_codec_get_frame(&mut self.ctx, &mut iter);
            if img.is_null() {
                return Ok(None);
            }
            Ok(Some(plane_image(&*img)?))
        }
    }
}

impl Drop for VpxContext {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                vpx_codec_destroy(&mut self.ctx);
            }
            self.initialized = false;
        }
    }
}

/// Borrow the planes of a decoded libvpx image.
unsafe fn plane_image(img: &vpx_image_t) -> Result<PlaneImage<'_>, VideoError> {
    let subsampling = match img.fmt {
        vpx_img_fmt::VPX_IMG_FMT_I420 => ChromaSubsampling::C420,
        vpx_img_fmt::VPX_IMG_FMT_I422 => ChromaSubsampling::C422,
        vpx_img_fmt::VPX_IMG_FMT_I444 => ChromaSubsampling::C444,
        other => {
            return Err(VideoError::UnsupportedPixelFormat {
                fmt: format!("{other:?}"),
            });
        }
    };

    let width = img.d_w as usize;
    let height = img.d_h as usize;
    let chroma_rows = (height + (1 << subsampling.shift_y()) - 1) >> subsampling.shift_y();

    let y_stride = img.stride[0] as usize;
    let u_stride = img.stride[1] as usize;
    let v_stride = img.stride[2] as usize;

    for plane in &img.planes[..3] {
        if plane.is_null() {
            return Err(VideoError::Codec {
                reason: "decoded image has a null plane".into(),
            });
        }
    }

    Ok(PlaneImage {
        width,
        height,
        subsampling,
        y: std::slice::from_raw_parts(img.planes[0], y_stride * height),
        y_stride,
        u: std::slice::from_raw_parts(img.planes[1], u_stride * chroma_rows),
        u_stride,
        v: std::slice::from_raw_parts(img.planes[2], v_stride * chroma_rows),
        v_stride,
    })
}

/// Pull the codec's error detail string when it has one.
fn describe_error(ctx: &vpx_codec_ctx_t, ret: vpx_codec_err_t) -> String {
    unsafe {
        if ctx.err_detail.is_null() {
            format!("error code {ret:?}")
        } else {
            CStr::from_ptr(ctx.err_detail).to_string_lossy().into_owned()
        }
    }
}
