//! Page matrix from the four corner-marker positions.
//!
//! The corner marks are the intersections of the L-shaped marker lines and
//! sit on the corners of a millimetre rectangle `(mm_x, mm_y, mm_w, mm_h)`.
//! Three detected corners are enough: the fourth follows from the
//! parallelogram rule `missing = adjacent_a + adjacent_b − opposite`.

use super::Affine2;
use crate::error::RecognitionError;

/// Corner order used throughout the crate.
pub const TOP_LEFT: usize = 0;
pub const TOP_RIGHT: usize = 1;
pub const BOTTOM_LEFT: usize = 2;
pub const BOTTOM_RIGHT: usize = 3;

/// Detected corner positions in pixels, each may be missing.
pub type CornerSet = [Option<[f64; 2]>; 4];

/// Plausibility bounds for a mm→px page matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixBounds {
    pub min_px_per_mm: f64,
    pub max_px_per_mm: f64,
    /// Maximum deviation of the axis angle from 90°, in degrees.
    pub max_axis_skew_deg: f64,
}

impl Default for MatrixBounds {
    fn default() -> Self {
        Self {
            min_px_per_mm: 1.0,
            max_px_per_mm: 200.0,
            max_axis_skew_deg: 5.0,
        }
    }
}

/// Fill in a single missing corner. Returns `None` with fewer than three.
pub fn complete_corners(corners: &CornerSet) -> Option<[[f64; 2]; 4]> {
    let missing: Vec<usize> = (0..4).filter(|&i| corners[i].is_none()).collect();
    match missing.as_slice() {
        [] => Some(corners.map(|c| c.unwrap_or_default())),
        [i] => {
            let i = *i;
            // Opposite corner index is 3 - i; the other two are adjacent.
            let opposite = 3 - i;
            let mut adj = (0..4).filter(|&j| j != i && j != opposite);
            let a = corners[adj.next()?]?;
            let b = corners[adj.next()?]?;
            let o = corners[opposite]?;
            let mut out = [[0.0; 2]; 4];
            for (j, slot) in out.iter_mut().enumerate() {
                *slot = if j == i {
                    [a[0] + b[0] - o[0], a[1] + b[1] - o[1]]
                } else {
                    corners[j]?
                };
            }
            Some(out)
        }
        _ => None,
    }
}

/// Build the mm→px matrix from corner positions.
///
/// The x axis is the mean of the two horizontal edges divided by `mm_w`,
/// the y axis the mean of the two vertical edges divided by `mm_h`, and the
/// translation maps the centre of the mm rectangle onto the pixel centroid.
pub fn matrix_from_corners(
    corners: &CornerSet,
    mm_x: f64,
    mm_y: f64,
    mm_w: f64,
    mm_h: f64,
    bounds: &MatrixBounds,
) -> Result<Affine2, RecognitionError> {
    let found = corners.iter().filter(|c| c.is_some()).count();
    let c = complete_corners(corners).ok_or(RecognitionError::MatrixNotFound {
        corners_found: found,
    })?;
    let (tl, tr, bl, br) = (c[TOP_LEFT], c[TOP_RIGHT], c[BOTTOM_LEFT], c[BOTTOM_RIGHT]);

    let x_axis = [
        ((tr[0] - tl[0]) + (br[0] - bl[0])) / 2.0 / mm_w,
        ((tr[1] - tl[1]) + (br[1] - bl[1])) / 2.0 / mm_w,
    ];
    let y_axis = [
        ((bl[0] - tl[0]) + (br[0] - tr[0])) / 2.0 / mm_h,
        ((bl[1] - tl[1]) + (br[1] - tr[1])) / 2.0 / mm_h,
    ];
    let center_px = [
        (tl[0] + tr[0] + bl[0] + br[0]) / 4.0,
        (tl[1] + tr[1] + bl[1] + br[1]) / 4.0,
    ];
    let center_mm = [mm_x + mm_w / 2.0, mm_y + mm_h / 2.0];
    let origin = [
        center_px[0] - (x_axis[0] * center_mm[0] + y_axis[0] * center_mm[1]),
        center_px[1] - (x_axis[1] * center_mm[0] + y_axis[1] * center_mm[1]),
    ];

    let matrix = Affine2::from_axes(x_axis, y_axis, origin);
    check_matrix(&matrix, bounds)?;
    Ok(matrix)
}

/// Reject matrices that cannot come from a scanned page.
pub fn check_matrix(matrix: &Affine2, bounds: &MatrixBounds) -> Result<(), RecognitionError> {
    let det = matrix.determinant();
    if !det.is_finite() || det <= 0.0 {
        return Err(RecognitionError::DegenerateMatrix {
            reason: format!("determinant {:.3e} is not positive", det),
        });
    }

    let [ax, ay] = matrix.x_axis();
    let [bx, by] = matrix.y_axis();
    let sx = (ax * ax + ay * ay).sqrt();
    let sy = (bx * bx + by * by).sqrt();
    for s in [sx, sy] {
        if s < bounds.min_px_per_mm || s > bounds.max_px_per_mm {
            return Err(RecognitionError::DegenerateMatrix {
                reason: format!(
                    "scale {:.3} px/mm outside [{}, {}]",
                    s, bounds.min_px_per_mm, bounds.max_px_per_mm
                ),
            });
        }
    }

    let cos = ((ax * bx + ay * by) / (sx * sy)).clamp(-1.0, 1.0);
    let skew_deg = (cos.acos().to_degrees() - 90.0).abs();
    if skew_deg > bounds.max_axis_skew_deg {
        return Err(RecognitionError::DegenerateMatrix {
            reason: format!("axes skewed by {:.2}°", skew_deg),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RECT: (f64, f64, f64, f64) = (10.0, 12.0, 190.0, 273.0);

    fn true_matrix() -> Affine2 {
        let angle: f64 = 1.3_f64.to_radians();
        let s = 5.9;
        Affine2::from_axes(
            [s * angle.cos(), s * angle.sin()],
            [-s * 1.01 * angle.sin() + 0.02, s * 1.01 * angle.cos()],
            [23.0, -8.0],
        )
    }

    fn project_corners(m: &Affine2) -> [[f64; 2]; 4] {
        let (x, y, w, h) = RECT;
        [
            m.transform_point(x, y),
            m.transform_point(x + w, y),
            m.transform_point(x, y + h),
            m.transform_point(x + w, y + h),
        ]
    }

    fn assert_same(a: &Affine2, b: &Affine2) {
        for (p, q) in a.params().iter().zip(b.params()) {
            assert_relative_eq!(*p, q, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn four_corners_reproduce_matrix() {
        let m = true_matrix();
        let corners = project_corners(&m).map(Some);
        let (x, y, w, h) = RECT;
        let est = matrix_from_corners(&corners, x, y, w, h, &MatrixBounds::default()).unwrap();
        assert_same(&est, &m);
    }

    #[test]
    fn any_three_corners_reproduce_matrix() {
        let m = true_matrix();
        let (x, y, w, h) = RECT;
        for drop in 0..4 {
            let mut corners = project_corners(&m).map(Some);
            corners[drop] = None;
            let est = matrix_from_corners(&corners, x, y, w, h, &MatrixBounds::default())
                .unwrap_or_else(|e| panic!("corner {drop} dropped: {e}"));
            assert_same(&est, &m);
        }
    }

    #[test]
    fn reconstructed_corner_matches_parallelogram() {
        let pts = [[0.0, 0.0], [10.0, 1.0], [-1.0, 20.0], [9.0, 21.0]];
        let mut corners = pts.map(Some);
        corners[BOTTOM_RIGHT] = None;
        let full = complete_corners(&corners).unwrap();
        assert_eq!(full[BOTTOM_RIGHT], [9.0, 21.0]);
    }

    #[test]
    fn two_corners_fail() {
        let m = true_matrix();
        let mut corners = project_corners(&m).map(Some);
        corners[0] = None;
        corners[3] = None;
        let (x, y, w, h) = RECT;
        let err = matrix_from_corners(&corners, x, y, w, h, &MatrixBounds::default()).unwrap_err();
        assert_eq!(err, RecognitionError::MatrixNotFound { corners_found: 2 });
    }

    #[test]
    fn collinear_corners_are_rejected() {
        let corners = [
            Some([0.0, 0.0]),
            Some([100.0, 0.0]),
            Some([200.0, 0.0]),
            None,
        ];
        let err = matrix_from_corners(&corners, 0.0, 0.0, 100.0, 100.0, &MatrixBounds::default())
            .unwrap_err();
        assert_eq!(err.code(), "degenerate_matrix");
    }

    #[test]
    fn mirrored_page_is_rejected() {
        let m = Affine2::from_axes([-5.0, 0.0], [0.0, 5.0], [1000.0, 0.0]);
        assert!(check_matrix(&m, &MatrixBounds::default()).is_err());
    }
}
