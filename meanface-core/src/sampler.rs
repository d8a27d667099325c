use crate::buffer::ImageView;
use serde::{Deserialize, Serialize};

/// Interpolation kernel used when resampling the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Bilinear,
    Bicubic,
}

/// Policy for sample coordinates that fall outside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    /// All channels set to zero.
    #[default]
    Zero,
    /// Clamp the coordinate to the nearest valid row/column and sample it
    /// directly, without interpolation.
    Edge,
}

/// Reusable tap indices/weights for the bicubic kernel. Each warp band owns
/// its own copy; bands run concurrently and must not share one.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    row_idx: Vec<usize>,
    row_w: Vec<f64>,
    col_idx: Vec<usize>,
    col_w: Vec<f64>,
}

/// Sample `image` at the real-valued coordinate `(row, col)`, writing one
/// value per channel. The first spatial argument addresses rows (bounded by
/// image height), the second columns (bounded by image width).
///
/// `scale` is the effective sampling scale of the enclosing warp (< 1 when
/// downscaling); it only affects the bicubic kernel width and is capped at 1.
pub fn sample(
    image: &ImageView<'_>,
    row: f64,
    col: f64,
    scale: f64,
    interpolation: Interpolation,
    padding: Padding,
) -> Vec<u8> {
    let mut out = vec![0u8; image.channels()];
    let mut scratch = Scratch::default();
    sample_into(
        image,
        row,
        col,
        scale,
        interpolation,
        padding,
        &mut scratch,
        &mut out,
    );
    out
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn sample_into(
    image: &ImageView<'_>,
    row: f64,
    col: f64,
    scale: f64,
    interpolation: Interpolation,
    padding: Padding,
    scratch: &mut Scratch,
    out: &mut [u8],
) {
    match interpolation {
        Interpolation::Bilinear => bilinear_into(image, row, col, padding, out),
        Interpolation::Bicubic => bicubic_into(image, row, col, scale, padding, scratch, out),
    }
}

/// Blend the 4 grid pixels around `(row, col)`. Coordinates inside the closed
/// rectangle `[0, h-1] x [0, w-1]` always resolve from pixel data: the upper
/// neighbor index is clamped to the last row/column, so an exactly integer
/// coordinate on the image border yields that pixel with zero weight on the
/// missing side and no read past the buffer. Anything outside the rectangle
/// goes to the padding policy.
fn bilinear_into(image: &ImageView<'_>, row: f64, col: f64, padding: Padding, out: &mut [u8]) {
    let height = image.height();
    let width = image.width();
    let in_bounds =
        row >= 0.0 && row <= (height - 1) as f64 && col >= 0.0 && col <= (width - 1) as f64;
    if !in_bounds {
        pad_into(image, row, col, padding, out);
        return;
    }

    let r0 = row.floor() as usize;
    let c0 = col.floor() as usize;
    let r1 = (r0 + 1).min(height - 1);
    let c1 = (c0 + 1).min(width - 1);
    let fr = row - r0 as f64;
    let fc = col - c0 as f64;

    let p00 = image.pixel(r0, c0);
    let p01 = image.pixel(r0, c1);
    let p10 = image.pixel(r1, c0);
    let p11 = image.pixel(r1, c1);

    for ch in 0..image.channels() {
        let top = p00[ch] as f64 * (1.0 - fc) + p01[ch] as f64 * fc;
        let bottom = p10[ch] as f64 * (1.0 - fc) + p11[ch] as f64 * fc;
        let value = top * (1.0 - fr) + bottom * fr;
        out[ch] = value.round().clamp(0.0, 255.0) as u8;
    }
}

/// Catmull-Rom/Keys cubic weight.
fn keys_weight(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t <= 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

/// Collect clamped tap indices and normalized weights along one axis.
/// Returns false when the kernel footprint misses the valid range entirely.
fn axis_taps(coord: f64, len: usize, scale: f64, idx: &mut Vec<usize>, weights: &mut Vec<f64>) -> bool {
    idx.clear();
    weights.clear();

    // Support half-width 2/scale stretches the 4-tap kernel when downscaling.
    let support = 2.0 / scale;
    let lo = (coord - support).ceil() as i64;
    let hi = (coord + support).floor() as i64;
    let last = len as i64 - 1;
    if hi < 0 || lo > last {
        return false;
    }

    let mut total = 0.0;
    for i in lo..=hi {
        let w = keys_weight((i as f64 - coord) * scale);
        if w == 0.0 {
            continue;
        }
        idx.push(i.clamp(0, last) as usize);
        weights.push(w);
        total += w;
    }
    if idx.is_empty() || total.abs() <= f64::EPSILON {
        return false;
    }
    for w in weights.iter_mut() {
        *w /= total;
    }
    true
}

/// Separable widened-kernel bicubic convolution. Tap positions are clamped to
/// the image bounds and per-axis weights renormalized to sum to 1; the
/// padding policy only applies when the whole footprint lies outside the
/// image on some axis.
fn bicubic_into(
    image: &ImageView<'_>,
    row: f64,
    col: f64,
    scale: f64,
    padding: Padding,
    scratch: &mut Scratch,
    out: &mut [u8],
) {
    let scale = if scale > 0.0 { scale.min(1.0) } else { 1.0 };

    let rows_ok = axis_taps(row, image.height(), scale, &mut scratch.row_idx, &mut scratch.row_w);
    let cols_ok = axis_taps(col, image.width(), scale, &mut scratch.col_idx, &mut scratch.col_w);
    if !rows_ok || !cols_ok {
        pad_into(image, row, col, padding, out);
        return;
    }

    for ch in 0..image.channels() {
        let mut acc = 0.0;
        for (&ri, &rw) in scratch.row_idx.iter().zip(&scratch.row_w) {
            let mut line = 0.0;
            for (&ci, &cw) in scratch.col_idx.iter().zip(&scratch.col_w) {
                line += image.pixel(ri, ci)[ch] as f64 * cw;
            }
            acc += line * rw;
        }
        out[ch] = acc.round().clamp(0.0, 255.0) as u8;
    }
}

fn pad_into(image: &ImageView<'_>, row: f64, col: f64, padding: Padding, out: &mut [u8]) {
    match padding {
        Padding::Zero => out.fill(0),
        Padding::Edge => nearest_into(image, row, col, out),
    }
}

/// Round to the nearest grid cell, clamped to the image.
fn nearest_into(image: &ImageView<'_>, row: f64, col: f64, out: &mut [u8]) {
    let r = row.round().clamp(0.0, (image.height() - 1) as f64) as usize;
    let c = col.round().clamp(0.0, (image.width() - 1) as f64) as usize;
    out.copy_from_slice(image.pixel(r, c));
}
