//! The fixed restoration pipeline: sharpen, tone remap, blend-blur.
//!
//! Three stages, applied in order by [`restore`]:
//!
//! 1. **Sharpen** — 3x3 convolution per color channel, alpha passed through.
//! 2. **Tone remap** — linear brightness/contrast lift, in place.
//! 3. **Blend-blur** — a Gaussian-blurred copy composited over the result at
//!    low opacity, a cosmetic softening pass.
//!
//! Every stage is pure with respect to its input and deterministic; the
//! pipeline performs no I/O and holds no state between calls.

use crate::buffer::{check_rgba_len, PixelBuffer, CHANNELS};
use crate::error::{Error, Result};

/// 3x3 sharpen kernel, row-major.
const SHARPEN_KERNEL: [i32; 9] = [0, -1, 0, -1, 5, -1, 0, -1, 0];

/// Tone remap: value subtracted from each channel before scaling.
const TONE_OFFSET: f32 = 16.0;

/// Tone remap: contrast gain applied after the offset.
const TONE_GAIN: f32 = 1.06;

/// Tone remap: brightness added after scaling.
const TONE_LIFT: f32 = 8.0;

/// Standard deviation of the soft-blur Gaussian, in pixels.
const BLUR_SIGMA: f32 = 0.7;

/// Opacity at which the blurred copy is composited over the sharpened base.
const BLUR_OPACITY: f32 = 0.06;

/// Run the full restoration pipeline on a pixel buffer.
///
/// Returns a new buffer with identical dimensions; the input is never
/// mutated. Alpha is byte-identical between input and output. Identical
/// inputs always yield identical outputs.
///
/// # Errors
///
/// Returns [`Error::InvalidBuffer`] if the buffer's dimensions are malformed
/// (unreachable for buffers built through [`PixelBuffer`]'s constructors).
pub fn restore(input: &PixelBuffer) -> Result<PixelBuffer> {
    let (w, h) = (input.width(), input.height());
    let mut data = sharpen(input.data(), w, h)?;
    tone_remap(&mut data);
    let blurred = gaussian_blur(&data, w, h, BLUR_SIGMA)?;
    blend_over(&mut data, &blurred, BLUR_OPACITY)?;
    PixelBuffer::from_raw(data, w, h)
}

/// Sharpen an RGBA buffer with the fixed 3x3 kernel.
///
/// Color channels are convolved; alpha is copied through unchanged. The
/// output is a fresh buffer and the input is only ever read, so neighbor
/// samples always come from the unprocessed image.
///
/// Neighbor taps that fall outside the buffer are skipped entirely, with no
/// renormalization of the partial sum. Border pixels therefore see fewer
/// than nine taps and come out brighter than an edge-clamped kernel would
/// produce (a flat field's border rows saturate while its interior is
/// unchanged).
///
/// # Errors
///
/// Returns [`Error::InvalidBuffer`] if `src.len() != width * height * 4`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn sharpen(src: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_rgba_len(src, width, height)?;

    let w = i64::from(width);
    let h = i64::from(height);
    let mut out = vec![0u8; src.len()];

    for y in 0..h {
        for x in 0..w {
            let base = ((y * w + x) as usize) * CHANNELS;
            for c in 0..3 {
                let mut acc = 0i32;
                for (k, &weight) in SHARPEN_KERNEL.iter().enumerate() {
                    let sx = x + (k as i64 % 3) - 1;
                    let sy = y + (k as i64 / 3) - 1;
                    if sx < 0 || sx >= w || sy < 0 || sy >= h {
                        continue;
                    }
                    let sidx = ((sy * w + sx) as usize) * CHANNELS + c;
                    acc += i32::from(src[sidx]) * weight;
                }
                out[base + c] = acc.clamp(0, 255) as u8;
            }
            out[base + 3] = src[base + 3];
        }
    }

    Ok(out)
}

/// Apply the fixed brightness/contrast remap in place.
///
/// Per color channel: `v' = clamp((v - 16) * 1.06 + 8, 0, 255)`, computed in
/// exactly that order, then rounded to the nearest integer. Alpha is left
/// untouched.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tone_remap(data: &mut [u8]) {
    for px in data.chunks_exact_mut(CHANNELS) {
        for ch in &mut px[..3] {
            let v = (f32::from(*ch) - TONE_OFFSET) * TONE_GAIN + TONE_LIFT;
            *ch = v.clamp(0.0, 255.0).round() as u8;
        }
    }
}

/// Separable Gaussian blur of an RGBA buffer.
///
/// All four channels are blurred; samples beyond the border clamp to the
/// edge pixel. A non-positive `sigma` returns the input unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidBuffer`] if `src.len() != width * height * 4`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn gaussian_blur(src: &[u8], width: u32, height: u32, sigma: f32) -> Result<Vec<u8>> {
    check_rgba_len(src, width, height)?;
    if sigma <= 0.0 || src.is_empty() {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel(sigma);
    let half = (kernel.len() / 2) as i64;
    let w = i64::from(width);
    let h = i64::from(height);

    // Horizontal pass into a float working buffer, then vertical back to u8.
    let mut tmp = vec![0.0f32; src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; CHANNELS];
            for (k, &kv) in kernel.iter().enumerate() {
                let sx = (x + k as i64 - half).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * CHANNELS;
                for c in 0..CHANNELS {
                    acc[c] += f32::from(src[idx + c]) * kv;
                }
            }
            let idx = ((y * w + x) as usize) * CHANNELS;
            tmp[idx..idx + CHANNELS].copy_from_slice(&acc);
        }
    }

    let mut out = vec![0u8; src.len()];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; CHANNELS];
            for (k, &kv) in kernel.iter().enumerate() {
                let sy = (y + k as i64 - half).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * CHANNELS;
                for c in 0..CHANNELS {
                    acc[c] += tmp[idx + c] * kv;
                }
            }
            let idx = ((y * w + x) as usize) * CHANNELS;
            for c in 0..CHANNELS {
                out[idx + c] = acc[c].clamp(0.0, 255.0).round() as u8;
            }
        }
    }

    Ok(out)
}

/// Normalized 1D Gaussian kernel of length `ceil(6 * sigma) | 1`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let size = ((sigma * 6.0).ceil() as usize) | 1;
    let half = (size / 2) as f32;

    let mut kernel: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - half;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Composite `overlay` over `base` in place at the given opacity.
///
/// Only the color channels are mixed: `b' = (1 - opacity) * b + opacity * o`.
/// Alpha is never touched, so the base's alpha plane survives the blend
/// byte-for-byte.
///
/// # Errors
///
/// Returns [`Error::InvalidBuffer`] if the two buffers differ in length.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn blend_over(base: &mut [u8], overlay: &[u8], opacity: f32) -> Result<()> {
    if base.len() != overlay.len() {
        return Err(Error::InvalidBuffer(format!(
            "overlay of {} bytes does not match base of {} bytes",
            overlay.len(),
            base.len()
        )));
    }

    let inv = 1.0 - opacity;
    for (b, o) in base
        .chunks_exact_mut(CHANNELS)
        .zip(overlay.chunks_exact(CHANNELS))
    {
        for c in 0..3 {
            let v = f32::from(b[c]) * inv + f32::from(o[c]) * opacity;
            b[c] = v.clamp(0.0, 255.0).round() as u8;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
        px.repeat((width * height) as usize)
    }

    #[test]
    fn sharpen_single_pixel_is_center_times_five_clamped() {
        // All eight neighbor taps fall outside a 1x1 buffer and are skipped.
        let out = sharpen(&[30, 10, 60, 200], 1, 1).unwrap();
        assert_eq!(out, vec![150, 50, 255, 200]);
    }

    #[test]
    fn sharpen_reads_input_not_output() {
        // Row of r = [10, 20, 30]: the middle pixel must see the original 10
        // on its left, not the already-sharpened 30.
        let src = [
            10, 0, 0, 255, //
            20, 0, 0, 255, //
            30, 0, 0, 255,
        ];
        let out = sharpen(&src, 3, 1).unwrap();
        assert_eq!(out[0], 30); // 5*10 - 20
        assert_eq!(out[4], 60); // -10 + 5*20 - 30
        assert_eq!(out[8], 130); // -20 + 5*30
    }

    #[test]
    fn sharpen_flat_field_interior_unchanged_border_saturates() {
        let src = flat(4, 4, [128, 128, 128, 255]);
        let out = sharpen(&src, 4, 4).unwrap();

        // Interior: 5*128 - 4*128 = 128.
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            let idx = (y * 4 + x) * 4;
            assert_eq!(&out[idx..idx + 3], &[128, 128, 128]);
        }
        // Corner: two in-bounds negative taps, 5*128 - 2*128 = 384 -> 255.
        assert_eq!(out[0], 255);
        // Edge: three in-bounds negative taps, 5*128 - 3*128 = 256 -> 255.
        assert_eq!(out[4], 255);
    }

    #[test]
    fn sharpen_preserves_alpha() {
        let mut src = flat(3, 3, [50, 100, 150, 0]);
        for (i, px) in src.chunks_exact_mut(4).enumerate() {
            px[3] = i as u8 * 20;
        }
        let out = sharpen(&src, 3, 3).unwrap();
        for (s, o) in src.chunks_exact(4).zip(out.chunks_exact(4)) {
            assert_eq!(s[3], o[3]);
        }
    }

    #[test]
    fn sharpen_rejects_mismatched_length() {
        let err = sharpen(&[0; 10], 2, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn tone_remap_reference_values() {
        // (128-16)*1.06+8 = 126.72 -> 127
        // (16-16)*1.06+8  = 8
        // (0-16)*1.06+8   = -8.96  -> 0
        // (255-16)*1.06+8 = 261.34 -> 255
        let mut data = [128, 16, 0, 255, 255, 100, 128, 0];
        tone_remap(&mut data);
        assert_eq!(data[..3], [127, 8, 0]);
        assert_eq!(data[3], 255);
        assert_eq!(data[4], 255);
        assert_eq!(data[5], 97); // (100-16)*1.06+8 = 97.04
        assert_eq!(data[7], 0); // alpha untouched
    }

    #[test]
    fn tone_remap_leaves_alpha_untouched() {
        let mut data = flat(2, 2, [128, 128, 128, 7]);
        tone_remap(&mut data);
        for px in data.chunks_exact(4) {
            assert_eq!(px[3], 7);
        }
    }

    #[test]
    fn blur_of_constant_image_is_identity() {
        let src = flat(4, 3, [10, 20, 30, 40]);
        let out = gaussian_blur(&src, 4, 3, BLUR_SIGMA).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn blur_with_zero_sigma_is_identity() {
        let src = flat(2, 2, [1, 2, 3, 4]);
        let out = gaussian_blur(&src, 2, 2, 0.0).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn blur_spreads_a_bright_pixel() {
        let mut src = flat(5, 5, [0, 0, 0, 255]);
        src[(2 * 5 + 2) * 4] = 255;
        let out = gaussian_blur(&src, 5, 5, BLUR_SIGMA).unwrap();
        assert!(out[(2 * 5 + 2) * 4] < 255);
        assert!(out[(2 * 5 + 1) * 4] > 0);
    }

    #[test]
    fn blur_rejects_mismatched_length() {
        let err = gaussian_blur(&[0; 7], 1, 2, BLUR_SIGMA).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn blend_at_zero_opacity_is_identity() {
        let mut base = flat(2, 2, [50, 100, 150, 200]);
        let overlay = flat(2, 2, [255, 255, 255, 255]);
        let expected = base.clone();
        blend_over(&mut base, &overlay, 0.0).unwrap();
        assert_eq!(base, expected);
    }

    #[test]
    fn blend_mixes_color_channels() {
        let mut base = flat(1, 1, [100, 100, 100, 255]);
        let overlay = flat(1, 1, [200, 200, 200, 255]);
        blend_over(&mut base, &overlay, BLUR_OPACITY).unwrap();
        // 0.94*100 + 0.06*200 = 106
        assert_eq!(base[..3], [106, 106, 106]);
    }

    #[test]
    fn blend_never_touches_alpha() {
        let mut base = flat(2, 1, [0, 0, 0, 200]);
        let overlay = flat(2, 1, [255, 255, 255, 10]);
        blend_over(&mut base, &overlay, 0.5).unwrap();
        for px in base.chunks_exact(4) {
            assert_eq!(px[3], 200);
        }
    }

    #[test]
    fn blend_rejects_length_mismatch() {
        let mut base = flat(2, 2, [0, 0, 0, 255]);
        let overlay = flat(1, 1, [0, 0, 0, 255]);
        let err = blend_over(&mut base, &overlay, 0.5).unwrap_err();
        assert!(matches!(err, Error::InvalidBuffer(_)));
    }

    #[test]
    fn restore_preserves_dimensions_and_alpha() {
        let mut data = flat(6, 4, [90, 130, 170, 255]);
        for (i, px) in data.chunks_exact_mut(4).enumerate() {
            px[3] = (i * 11 % 256) as u8;
        }
        let input = PixelBuffer::from_raw(data.clone(), 6, 4).unwrap();

        let out = restore(&input).unwrap();
        assert_eq!(out.width(), 6);
        assert_eq!(out.height(), 4);
        for (s, o) in data.chunks_exact(4).zip(out.data().chunks_exact(4)) {
            assert_eq!(s[3], o[3]);
        }
    }

    #[test]
    fn restore_is_deterministic() {
        let data: Vec<u8> = (0..8 * 8 * 4).map(|i| (i * 37 % 256) as u8).collect();
        let input = PixelBuffer::from_raw(data, 8, 8).unwrap();
        assert_eq!(restore(&input).unwrap(), restore(&input).unwrap());
    }

    #[test]
    fn restore_never_mutates_its_input() {
        let data = flat(4, 4, [128, 128, 128, 255]);
        let input = PixelBuffer::from_raw(data.clone(), 4, 4).unwrap();
        let _ = restore(&input).unwrap();
        assert_eq!(input.data(), &data[..]);
    }

    #[test]
    fn restore_flat_gray_deep_interior_is_exactly_127() {
        // On an 8x8 flat field the sharpen stage only disturbs the border
        // ring, the remap takes 128 to 127, and pixels more than two away
        // from the border blur entirely over other 127s.
        let input = PixelBuffer::from_raw(flat(8, 8, [128, 128, 128, 255]), 8, 8).unwrap();
        let out = restore(&input).unwrap();
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            assert_eq!(out.pixel(x, y), &[127, 127, 127, 255]);
        }
    }

    #[test]
    fn restore_flat_gray_small_buffer_interior_near_127() {
        // In a 4x4 buffer every interior pixel sits next to the saturated
        // border ring, so the 6% blur blend lifts it slightly above 127.
        let input = PixelBuffer::from_raw(flat(4, 4, [128, 128, 128, 255]), 4, 4).unwrap();
        let out = restore(&input).unwrap();
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            for &v in &out.pixel(x, y)[..3] {
                assert!((126..=135).contains(&v), "got {v} at ({x},{y})");
            }
        }
    }
}
