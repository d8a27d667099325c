//! Pose-normalized face cropping.
//!
//! Given an image, detected facial landmarks, and a reference mean-shape
//! template, this crate fits the best least-squares similarity transform
//! (rotation, uniform scale, translation) from the template to the detected
//! points and resamples the image through its inverse into a fixed-size,
//! pose-normalized crop. Landmark detection and feature extraction are
//! external collaborators; landmarks come in, aligned crops go out.

pub mod buffer;
pub mod crop;
pub mod geometry;
pub mod sampler;
pub mod shape;
pub mod viz;
pub mod warp;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Buffer error: {0}")]
    Buffer(#[from] buffer::BufferError),
    #[error("Fit error: {0}")]
    Fit(#[from] geometry::FitError),
    #[error("Shape error: {0}")]
    Shape(#[from] shape::ShapeError),
    #[error("Configuration error: {0}")]
    Config(#[from] warp::ConfigError),
    #[error("Crop error: {0}")]
    Crop(#[from] crop::CropError),
}

pub use buffer::{CropBuffer, ImageView};
pub use crop::FaceCropper;
pub use geometry::{project_landmarks, Point, Similarity};
pub use sampler::{sample, Interpolation, Padding};
pub use shape::ReferenceShape;
pub use warp::{warp, warp_batch, CropConfig};
