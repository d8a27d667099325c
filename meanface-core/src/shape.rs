use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("Failed to read shape file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse shape file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid reference shape: {0}")]
    Validation(String),
}

/// A named landmark template representing canonical face pose, together with
/// the nominal crop size it was authored against. Templates are rescaled to
/// the actual crop size at fit time, so one template serves arbitrary output
/// sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceShape {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub points: Vec<Point>,
}

impl ReferenceShape {
    /// The 5-point mean shape for 256x256 crops used by the SeetaFace
    /// recognizer family (left eye, right eye, nose, mouth corners).
    pub fn seeta_256() -> Self {
        Self {
            name: "seeta-5p-256".to_string(),
            width: 256,
            height: 256,
            points: vec![
                Point::new(89.3095, 72.9025),
                Point::new(169.3095, 72.9025),
                Point::new(127.8949, 127.0441),
                Point::new(96.8796, 184.8907),
                Point::new(159.1065, 184.7601),
            ],
        }
    }

    /// The ArcFace 5-point canonical landmark positions for 112x112 crops.
    pub fn arcface_112() -> Self {
        Self {
            name: "arcface-5p-112".to_string(),
            width: 112,
            height: 112,
            points: vec![
                Point::new(38.2946, 51.6963),
                Point::new(73.5318, 51.5014),
                Point::new(56.0252, 71.7366),
                Point::new(41.5493, 92.3655),
                Point::new(70.7299, 92.2041),
            ],
        }
    }

    /// Load a reference shape from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ShapeError> {
        let contents = fs::read_to_string(path)?;
        let shape: ReferenceShape = toml::from_str(&contents)?;
        shape.validate()?;
        Ok(shape)
    }

    /// Validate template invariants: at least two points (a similarity fit
    /// needs two non-coincident points to be well-posed) and a non-zero
    /// nominal size.
    pub fn validate(&self) -> Result<(), ShapeError> {
        if self.width == 0 || self.height == 0 {
            return Err(ShapeError::Validation(
                "Nominal shape size must be non-zero".to_string(),
            ));
        }
        if self.points.len() < 2 {
            return Err(ShapeError::Validation(format!(
                "Reference shape needs at least 2 points, got {}",
                self.points.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
