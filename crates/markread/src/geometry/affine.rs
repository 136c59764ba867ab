//! 2D affine transform backed by a 3×3 nalgebra matrix.

use nalgebra::{Matrix3, Vector3};

/// Affine map `p' = A·p + t` between page millimetres and image pixels.
///
/// Parameters follow the `[xx, yx, xy, yy, x0, y0]` order:
/// `x' = xx·x + xy·y + x0`, `y' = yx·x + yy·y + y0`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 6]", into = "[f64; 6]")]
pub struct Affine2 {
    m: Matrix3<f64>,
}

impl Affine2 {
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    pub fn from_params(p: [f64; 6]) -> Self {
        let [xx, yx, xy, yy, x0, y0] = p;
        Self {
            m: Matrix3::new(xx, xy, x0, yx, yy, y0, 0.0, 0.0, 1.0),
        }
    }

    /// Build from the images of the unit axes and the origin.
    pub fn from_axes(x_axis: [f64; 2], y_axis: [f64; 2], origin: [f64; 2]) -> Self {
        Self::from_params([
            x_axis[0], x_axis[1], y_axis[0], y_axis[1], origin[0], origin[1],
        ])
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::from_params([1.0, 0.0, 0.0, 1.0, dx, dy])
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::from_params([sx, 0.0, 0.0, sy, 0.0, 0.0])
    }

    pub fn params(&self) -> [f64; 6] {
        let m = &self.m;
        [
            m[(0, 0)],
            m[(1, 0)],
            m[(0, 1)],
            m[(1, 1)],
            m[(0, 2)],
            m[(1, 2)],
        ]
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.m
    }

    pub fn transform_point(&self, x: f64, y: f64) -> [f64; 2] {
        let p = self.m * Vector3::new(x, y, 1.0);
        [p[0], p[1]]
    }

    /// Transform a vector (translation ignored).
    pub fn transform_distance(&self, dx: f64, dy: f64) -> [f64; 2] {
        let p = self.m * Vector3::new(dx, dy, 0.0);
        [p[0], p[1]]
    }

    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|m| Self { m })
    }

    /// `self` applied first, then `next`.
    pub fn then(&self, next: &Affine2) -> Self {
        Self { m: next.m * self.m }
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
    }

    /// Image of the unit x axis.
    pub fn x_axis(&self) -> [f64; 2] {
        [self.m[(0, 0)], self.m[(1, 0)]]
    }

    /// Image of the unit y axis.
    pub fn y_axis(&self) -> [f64; 2] {
        [self.m[(0, 1)], self.m[(1, 1)]]
    }

    /// Mean scale of the two axes (output units per input unit).
    pub fn mean_scale(&self) -> f64 {
        let [ax, ay] = self.x_axis();
        let [bx, by] = self.y_axis();
        ((ax * ax + ay * ay).sqrt() + (bx * bx + by * by).sqrt()) / 2.0
    }
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 6]> for Affine2 {
    fn from(p: [f64; 6]) -> Self {
        Self::from_params(p)
    }
}

impl From<Affine2> for [f64; 6] {
    fn from(a: Affine2) -> Self {
        a.params()
    }
}
