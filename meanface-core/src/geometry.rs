use crate::shape::ReferenceShape;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("Reference points collapse to zero spread")]
    DegenerateShape,
    #[error("Least-squares system has no stable solution")]
    DegenerateFit,
    #[error("Landmark count {got} does not match reference point count {expected}")]
    PointCountMismatch { expected: usize, got: usize },
}

/// A 2D point. Landmark sequences are ordered: index `i` of a detected set
/// corresponds to index `i` of the reference template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Similarity transform mapping destination-crop coordinates to source-image
/// coordinates:
///
/// ```text
/// x' = a*x - b*y + tx
/// y' = b*x + a*y + ty
/// ```
///
/// The linear part is rotation plus uniform scale by construction (equal
/// diagonal, antisymmetric off-diagonal), never shear or anisotropic scale.
/// A transform is fitted fresh per landmark set and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    a: f64,
    b: f64,
    tx: f64,
    ty: f64,
}

impl Similarity {
    pub fn new(a: f64, b: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, tx, ty }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Least-squares fit of `detected ≈ T(reference)`, with the reference
    /// first rescaled from its nominal size into the requested crop size.
    ///
    /// Because the reference lives in crop coordinates, the fitted transform
    /// is exactly the destination-to-source map the warp applies directly.
    pub fn fit(
        crop_width: u32,
        crop_height: u32,
        detected: &[Point],
        reference: &ReferenceShape,
    ) -> Result<Self, FitError> {
        if detected.len() != reference.points.len() {
            return Err(FitError::PointCountMismatch {
                expected: reference.points.len(),
                got: detected.len(),
            });
        }

        let scale_x = crop_width as f64 / reference.width as f64;
        let scale_y = crop_height as f64 / reference.height as f64;

        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_u = 0.0;
        let mut sum_v = 0.0;
        let mut sum_xx_yy = 0.0;
        let mut sum_ux_vy = 0.0;
        let mut sum_vx_uy = 0.0;

        for (std, det) in reference.points.iter().zip(detected) {
            let x = std.x as f64 * scale_x;
            let y = std.y as f64 * scale_y;
            let u = det.x as f64;
            let v = det.y as f64;

            sum_x += x;
            sum_y += y;
            sum_u += u;
            sum_v += v;
            sum_xx_yy += x * x + y * y;
            sum_ux_vy += u * x + v * y;
            sum_vx_uy += v * x - u * y;
        }

        if sum_xx_yy <= f64::EPSILON {
            return Err(FitError::DegenerateShape);
        }

        let n = detected.len() as f64;
        let q = sum_u - sum_x * sum_ux_vy / sum_xx_yy + sum_y * sum_vx_uy / sum_xx_yy;
        let p = sum_v - sum_y * sum_ux_vy / sum_xx_yy - sum_x * sum_vx_uy / sum_xx_yy;
        let r = n - (sum_x * sum_x + sum_y * sum_y) / sum_xx_yy;
        if r.abs() <= f64::EPSILON {
            return Err(FitError::DegenerateFit);
        }

        let tx = q / r;
        let ty = p / r;
        let a = (sum_ux_vy - sum_x * tx - sum_y * ty) / sum_xx_yy;
        let b = (sum_vx_uy + sum_y * tx - sum_x * ty) / sum_xx_yy;

        // A zero linear part (all detected points coincide) has no usable
        // scale and cannot be inverted.
        if a * a + b * b <= f64::EPSILON {
            return Err(FitError::DegenerateFit);
        }

        log::debug!(
            "fitted similarity: scale {:.4}, rotation {:.2} deg, translation ({:.2}, {:.2})",
            (a * a + b * b).sqrt(),
            b.atan2(a).to_degrees(),
            tx,
            ty
        );

        Ok(Self { a, b, tx, ty })
    }

    /// Fit one transform per landmark set. Sets are independent: a degenerate
    /// set fails only its own entry.
    pub fn fit_batch(
        crop_width: u32,
        crop_height: u32,
        landmark_sets: &[Vec<Point>],
        reference: &ReferenceShape,
    ) -> Vec<Result<Self, FitError>> {
        landmark_sets
            .iter()
            .map(|set| Self::fit(crop_width, crop_height, set, reference))
            .collect()
    }

    #[inline]
    pub fn a(&self) -> f64 {
        self.a
    }

    #[inline]
    pub fn b(&self) -> f64 {
        self.b
    }

    #[inline]
    pub fn tx(&self) -> f64 {
        self.tx
    }

    #[inline]
    pub fn ty(&self) -> f64 {
        self.ty
    }

    /// Uniform scale factor of the linear part.
    pub fn scale(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Rotation angle of the linear part, in radians.
    pub fn rotation(&self) -> f64 {
        self.b.atan2(self.a)
    }

    /// Map a crop-space point to source-space.
    pub fn apply(&self, point: Point) -> Point {
        let x = point.x as f64;
        let y = point.y as f64;
        Point {
            x: (self.a * x - self.b * y + self.tx) as f32,
            y: (self.b * x + self.a * y + self.ty) as f32,
        }
    }

    /// Map a source-space point back to crop-space by solving the 2x2 linear
    /// system analytically.
    pub fn invert_point(&self, point: Point) -> Point {
        let det = self.guarded_det().0;
        let dx = point.x as f64 - self.tx;
        let dy = point.y as f64 - self.ty;
        Point {
            x: ((self.a * dx + self.b * dy) / det) as f32,
            y: ((self.a * dy - self.b * dx) / det) as f32,
        }
    }

    /// Determinant of the linear part, substituted with a small positive
    /// epsilon when it underflows. Returns whether the guard engaged.
    fn guarded_det(&self) -> (f64, bool) {
        let det = self.a * self.a + self.b * self.b;
        if det < f64::EPSILON {
            (f64::EPSILON, true)
        } else {
            (det, false)
        }
    }
}

/// Map the original detected landmarks into the coordinate space of the
/// (possibly padded) crop produced from `transform`.
///
/// The projection never fails: a near-singular transform is substituted with
/// an epsilon determinant and logged, and the returned coordinates are then
/// numerically unreliable. Transforms produced by [`Similarity::fit`] cannot
/// reach that branch.
pub fn project_landmarks(
    points: &[Point],
    transform: &Similarity,
    pad_top: u32,
    pad_left: u32,
) -> Vec<Point> {
    let (det, engaged) = transform.guarded_det();
    if engaged {
        log::warn!("near-singular transform in landmark projection; output is unreliable");
    }
    points
        .iter()
        .map(|point| {
            let dx = point.x as f64 - transform.tx;
            let dy = point.y as f64 - transform.ty;
            Point {
                x: ((transform.a * dx + transform.b * dy) / det + pad_left as f64) as f32,
                y: ((transform.a * dy - transform.b * dx) / det + pad_top as f64) as f32,
            }
        })
        .collect()
}
