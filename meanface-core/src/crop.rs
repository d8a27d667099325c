use crate::buffer::{BufferError, CropBuffer, ImageView};
use crate::geometry::{self, FitError, Point, Similarity};
use crate::shape::{ReferenceShape, ShapeError};
use crate::warp::{self, ConfigError, CropConfig};
use image::RgbImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("Landmark count {got} does not match reference shape point count {expected}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("Fit error: {0}")]
    Fit(#[from] FitError),
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

/// Crops faces to a canonical pose: fits a similarity transform from detected
/// landmarks to the reference template, resamples the source image through
/// its inverse, and optionally maps the landmarks into the crop.
///
/// A cropper is stateless across calls; every face gets a fresh fit and
/// identical inputs produce byte-identical crops.
pub struct FaceCropper {
    shape: ReferenceShape,
    config: CropConfig,
}

impl FaceCropper {
    pub fn new(shape: ReferenceShape, config: CropConfig) -> Result<Self, CropError> {
        shape.validate()?;
        config.validate()?;
        Ok(Self { shape, config })
    }

    pub fn shape(&self) -> &ReferenceShape {
        &self.shape
    }

    pub fn config(&self) -> &CropConfig {
        &self.config
    }

    /// Produce the pose-normalized crop for one face.
    pub fn crop(
        &self,
        image: &ImageView<'_>,
        landmarks: &[Point],
        pool: Option<&rayon::ThreadPool>,
    ) -> Result<CropBuffer, CropError> {
        let transform = self.fit(landmarks)?;
        Ok(warp::warp(image, &transform, &self.config, pool))
    }

    /// Like [`crop`](Self::crop), additionally returning the original
    /// landmarks mapped into crop-space. The projection never gates success
    /// of the crop itself.
    pub fn crop_with_landmarks(
        &self,
        image: &ImageView<'_>,
        landmarks: &[Point],
        pool: Option<&rayon::ThreadPool>,
    ) -> Result<(CropBuffer, Vec<Point>), CropError> {
        let transform = self.fit(landmarks)?;
        let crop = warp::warp(image, &transform, &self.config, pool);
        let projected = geometry::project_landmarks(
            landmarks,
            &transform,
            self.config.pad_top,
            self.config.pad_left,
        );
        Ok((crop, projected))
    }

    /// Convenience wrapper for RGB images.
    pub fn crop_rgb(
        &self,
        image: &RgbImage,
        landmarks: &[Point],
        pool: Option<&rayon::ThreadPool>,
    ) -> Result<RgbImage, CropError> {
        let view = ImageView::from_rgb(image);
        let crop = self.crop(&view, landmarks, pool)?;
        Ok(crop.to_rgb()?)
    }

    fn fit(&self, landmarks: &[Point]) -> Result<Similarity, CropError> {
        if landmarks.len() != self.shape.len() {
            return Err(CropError::ShapeMismatch {
                expected: self.shape.len(),
                got: landmarks.len(),
            });
        }
        log::debug!(
            "aligning {} landmarks against '{}' into {}x{}",
            landmarks.len(),
            self.shape.name,
            self.config.width,
            self.config.height
        );
        Ok(Similarity::fit(
            self.config.width,
            self.config.height,
            landmarks,
            &self.shape,
        )?)
    }
}
