use crate::buffer::{CropBuffer, ImageView};
use crate::geometry::Similarity;
use crate::sampler::{self, Interpolation, Padding, Scratch};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid crop configuration: {0}")]
    Validation(String),
}

/// Destination geometry and sampling configuration for the warp.
///
/// The output buffer is `(height + pad_top + pad_bottom)` rows by
/// `(width + pad_left + pad_right)` columns; the padding ring is filled by
/// the same inverse-map-then-sample rule as interior pixels, it is not
/// post-hoc border replication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub pad_top: u32,
    #[serde(default)]
    pub pad_bottom: u32,
    #[serde(default)]
    pub pad_left: u32,
    #[serde(default)]
    pub pad_right: u32,
    #[serde(default)]
    pub interpolation: Interpolation,
    #[serde(default)]
    pub padding: Padding,
}

impl CropConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pad_top: 0,
            pad_bottom: 0,
            pad_left: 0,
            pad_right: 0,
            interpolation: Interpolation::default(),
            padding: Padding::default(),
        }
    }

    pub fn out_width(&self) -> u32 {
        self.width + self.pad_left + self.pad_right
    }

    pub fn out_height(&self) -> u32 {
        self.height + self.pad_top + self.pad_bottom
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Validation(
                "Crop dimensions must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resample `source` through the inverse mapping of `transform` into a new
/// crop buffer.
///
/// Every destination pixel is shifted into crop-local coordinates, mapped
/// through the transform to a real-valued source coordinate, and sampled with
/// the configured kernel and padding policy; the loop itself cannot fail.
/// When `pool` is given, destination rows are partitioned into contiguous
/// bands processed in parallel and joined before return; output is
/// bit-identical to the sequential path.
pub fn warp(
    source: &ImageView<'_>,
    transform: &Similarity,
    config: &CropConfig,
    pool: Option<&rayon::ThreadPool>,
) -> CropBuffer {
    let start = std::time::Instant::now();
    let out_w = config.out_width() as usize;
    let out_h = config.out_height() as usize;
    let channels = source.channels();
    let mut dest = CropBuffer::zeroed(out_w, out_h, channels);
    let row_stride = out_w * channels;

    // Sampling scale of the inverse map, widening the bicubic kernel when the
    // source region is larger than the crop.
    let scale = 1.0 / transform.scale();

    match pool {
        Some(pool) => pool.install(|| {
            dest.data_mut()
                .par_chunks_mut(row_stride)
                .enumerate()
                .for_each_init(Scratch::default, |scratch, (y, row)| {
                    fill_row(source, transform, config, scale, y, row, scratch);
                });
        }),
        None => {
            let mut scratch = Scratch::default();
            for (y, row) in dest.data_mut().chunks_mut(row_stride).enumerate() {
                fill_row(source, transform, config, scale, y, row, &mut scratch);
            }
        }
    }

    log::debug!(
        "warped {}x{}x{} crop in {}ms",
        out_w,
        out_h,
        channels,
        start.elapsed().as_millis()
    );
    dest
}

/// Warp one crop per transform. Batching is a pure loop with no cross-face
/// interaction; each entry matches the corresponding single [`warp`] call.
pub fn warp_batch(
    source: &ImageView<'_>,
    transforms: &[Similarity],
    config: &CropConfig,
    pool: Option<&rayon::ThreadPool>,
) -> Vec<CropBuffer> {
    transforms
        .iter()
        .map(|transform| warp(source, transform, config, pool))
        .collect()
}

fn fill_row(
    source: &ImageView<'_>,
    transform: &Similarity,
    config: &CropConfig,
    scale: f64,
    y: usize,
    row: &mut [u8],
    scratch: &mut Scratch,
) {
    let channels = source.channels();
    let (a, b) = (transform.a(), transform.b());
    let by = y as f64 - config.pad_top as f64;
    // Row-constant terms of the inverse map, hoisted out of the column loop.
    let row_x = -b * by + transform.tx();
    let row_y = a * by + transform.ty();

    for (x, out) in row.chunks_mut(channels).enumerate() {
        let bx = x as f64 - config.pad_left as f64;
        let src_x = a * bx + row_x;
        let src_y = b * bx + row_y;
        // Sampler addresses rows first, so the mapped (x, y) swaps on entry.
        sampler::sample_into(
            source,
            src_y,
            src_x,
            scale,
            config.interpolation,
            config.padding,
            scratch,
            out,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::shape::ReferenceShape;

    fn gradient_image(width: usize, height: usize, channels: usize) -> Vec<u8> {
        (0..width * height * channels)
            .map(|i| (i * 31 % 251) as u8)
            .collect()
    }

    #[test]
    fn test_identity_warp_reproduces_source() {
        let data = [10u8, 20, 30, 40];
        let view = ImageView::new(&data, 2, 2, 1).unwrap();
        let config = CropConfig::new(2, 2);

        let crop = warp(&view, &Similarity::identity(), &config, None);

        assert_eq!(crop.data(), &data);
    }

    #[test]
    fn test_padding_is_a_pure_coordinate_shift() {
        let data = gradient_image(8, 8, 1);
        let view = ImageView::new(&data, 8, 8, 1).unwrap();
        let transform = Similarity::new(0.9, 0.2, 1.5, 0.5);

        let plain = warp(&view, &transform, &CropConfig::new(4, 4), None);
        let padded = warp(
            &view,
            &transform,
            &CropConfig {
                pad_top: 10,
                pad_left: 10,
                ..CropConfig::new(4, 4)
            },
            None,
        );

        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(
                    padded.pixel(row + 10, col + 10),
                    plain.pixel(row, col),
                    "at ({}, {})",
                    row,
                    col
                );
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = gradient_image(32, 24, 3);
        let view = ImageView::new(&data, 32, 24, 3).unwrap();
        let transform = Similarity::new(0.8, 0.3, 2.0, -1.5);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();

        for interpolation in [Interpolation::Bilinear, Interpolation::Bicubic] {
            let config = CropConfig {
                interpolation,
                pad_top: 2,
                pad_left: 3,
                pad_bottom: 1,
                pad_right: 1,
                ..CropConfig::new(16, 16)
            };
            let sequential = warp(&view, &transform, &config, None);
            let parallel = warp(&view, &transform, &config, Some(&pool));
            assert_eq!(sequential.data(), parallel.data(), "{:?}", interpolation);
        }
    }

    #[test]
    fn test_warp_is_idempotent() {
        let data = gradient_image(16, 16, 3);
        let view = ImageView::new(&data, 16, 16, 3).unwrap();
        let transform = Similarity::new(1.1, -0.2, 3.0, 2.0);
        let config = CropConfig::new(8, 8);

        let first = warp(&view, &transform, &config, None);
        let second = warp(&view, &transform, &config, None);

        assert_eq!(first, second);
    }

    #[test]
    fn test_batch_matches_single_warps() {
        let data = gradient_image(16, 16, 1);
        let view = ImageView::new(&data, 16, 16, 1).unwrap();
        let transforms = [Similarity::identity(), Similarity::new(0.5, 0.1, 4.0, 4.0)];
        let config = CropConfig::new(8, 8);

        let crops = warp_batch(&view, &transforms, &config, None);

        assert_eq!(crops.len(), 2);
        for (crop, transform) in crops.iter().zip(&transforms) {
            assert_eq!(crop, &warp(&view, transform, &config, None));
        }
    }

    #[test]
    fn test_downscale_bicubic_of_constant_stays_constant() {
        // Fitted downscale: detected landmarks span twice the crop, so the
        // widened kernel pulls from a large window; a flat source must stay
        // flat everywhere, padding ring included (edge policy).
        let reference = ReferenceShape::arcface_112();
        let detected: Vec<Point> = reference
            .points
            .iter()
            .map(|p| Point::new(2.0 * p.x + 30.0, 2.0 * p.y + 10.0))
            .collect();
        let transform = Similarity::fit(112, 112, &detected, &reference).unwrap();
        assert!(transform.scale() > 1.9);

        let data = [200u8; 64 * 64];
        let view = ImageView::new(&data, 64, 64, 1).unwrap();
        let config = CropConfig {
            interpolation: Interpolation::Bicubic,
            padding: Padding::Edge,
            pad_top: 2,
            pad_bottom: 2,
            pad_left: 2,
            pad_right: 2,
            ..CropConfig::new(16, 16)
        };

        let crop = warp(&view, &transform, &config, None);

        assert!(crop.data().iter().all(|&v| v == 200));
    }

    #[test]
    fn test_config_defaults_from_minimal_toml() {
        let config: CropConfig = toml::from_str("width = 112\nheight = 112").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.pad_top, 0);
        assert_eq!(config.interpolation, Interpolation::Bilinear);
        assert_eq!(config.padding, Padding::Zero);
        assert_eq!(config.out_width(), 112);

        let config: CropConfig =
            toml::from_str("width = 96\nheight = 112\npad_left = 8\ninterpolation = \"bicubic\"\npadding = \"edge\"")
                .unwrap();
        assert_eq!(config.interpolation, Interpolation::Bicubic);
        assert_eq!(config.padding, Padding::Edge);
        assert_eq!(config.out_width(), 104);
    }

    #[test]
    fn test_config_rejects_zero_size() {
        let config = CropConfig::new(0, 112);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
