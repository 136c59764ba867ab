//! Corner-marker search and page matrix detection.
//!
//! Every page corner carries an L-shaped mark: one horizontal and one
//! vertical line meeting at the corner point. The search works in a square
//! window anchored at the image corner, in local coordinates that grow
//! towards the page centre:
//!
//! 1. Walk bands of rows outward-in until the columns touched by ink form a
//!    run of at least `line_coverage × mark_length`. That band holds the
//!    horizontal arm.
//! 2. Per column, take the first thin ink segment in the band; its midpoint
//!    is a sample of the arm centre line. Fit a line through the samples.
//! 3. Repeat with rows and columns swapped for the vertical arm.
//! 4. The marker position is the intersection of both centre lines.

use super::Bitmap;
use crate::error::RecognitionError;
use crate::geometry::{matrix_from_corners, Affine2, CornerSet, MatrixBounds};

/// Corner-marker search parameters, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSearch {
    /// Window extent from the image corner.
    pub search_distance: f64,
    /// Length of each marker arm.
    pub mark_length: f64,
    /// Required fraction of the arm length seen as one run.
    pub line_coverage: f64,
    /// Thicker ink segments are not part of a marker line.
    pub max_thickness: f64,
}

/// Local window anchored at one image corner.
struct Window<'a> {
    bitmap: &'a Bitmap,
    flip_x: bool,
    flip_y: bool,
    size: [i64; 2],
}

impl Window<'_> {
    fn global_x(&self, i: i64) -> i64 {
        if self.flip_x {
            i64::from(self.bitmap.width()) - 1 - i
        } else {
            i
        }
    }

    fn global_y(&self, j: i64) -> i64 {
        if self.flip_y {
            i64::from(self.bitmap.height()) - 1 - j
        } else {
            j
        }
    }

    fn is_ink(&self, i: i64, j: i64) -> bool {
        if i < 0 || j < 0 || i >= self.size[0] || j >= self.size[1] {
            return false;
        }
        self.bitmap.is_ink(self.global_x(i), self.global_y(j))
    }

    /// Ink count in the local rectangle `[i, i + w) × [j, j + h)`.
    fn count(&self, i: i64, j: i64, w: i64, h: i64) -> u64 {
        let i1 = (i + w).min(self.size[0]);
        let j1 = (j + h).min(self.size[1]);
        let (i, j) = (i.max(0), j.max(0));
        if i1 <= i || j1 <= j {
            return 0;
        }
        let (x0, x1) = (self.global_x(i), self.global_x(i1 - 1));
        let (y0, y1) = (self.global_y(j), self.global_y(j1 - 1));
        self.bitmap
            .count_black(x0.min(x1), y0.min(y1), i1 - i, j1 - j)
    }

    /// Continuous local coordinate to global pixel coordinate.
    fn to_global(&self, u: f64, v: f64) -> [f64; 2] {
        let x = if self.flip_x {
            f64::from(self.bitmap.width()) - u
        } else {
            u
        };
        let y = if self.flip_y {
            f64::from(self.bitmap.height()) - v
        } else {
            v
        };
        [x, y]
    }
}

/// Centre line `across = slope · along + offset` of one marker arm.
#[derive(Debug, Clone, Copy)]
struct ArmLine {
    slope: f64,
    offset: f64,
}

/// Locate one arm. `ink(along, across)` reads the window with the arm
/// running along the first coordinate.
fn find_arm(
    ink: &dyn Fn(i64, i64) -> bool,
    band_count: &dyn Fn(i64, i64) -> u64,
    along_len: i64,
    across_len: i64,
    min_run: i64,
    band: i64,
    max_thick: i64,
) -> Option<ArmLine> {
    let mut across = 0;
    while across + band <= across_len {
        // Longest run of positions along the arm touched by ink in this band.
        let (mut best_len, mut best_start, mut run_start, mut run_len) = (0, 0, 0, 0);
        for along in 0..along_len {
            if band_count(along, across) > 0 {
                if run_len == 0 {
                    run_start = along;
                }
                run_len += 1;
                if run_len > best_len {
                    best_len = run_len;
                    best_start = run_start;
                }
            } else {
                run_len = 0;
            }
        }

        if best_len >= min_run {
            if let Some(line) = fit_arm(ink, best_start, best_len, across, band, max_thick, min_run)
            {
                return Some(line);
            }
            across += band;
        } else {
            across += 1;
        }
    }
    None
}

/// Fit the centre line from the first thin segment per position.
fn fit_arm(
    ink: &dyn Fn(i64, i64) -> bool,
    start: i64,
    len: i64,
    across0: i64,
    band: i64,
    max_thick: i64,
    min_run: i64,
) -> Option<ArmLine> {
    let mut samples: Vec<(f64, f64)> = Vec::with_capacity(len as usize);
    for along in start..start + len {
        let Some(first) = (across0..across0 + band).find(|&a| ink(along, a)) else {
            continue;
        };
        let mut end = first;
        while ink(along, end) && end - first <= max_thick {
            end += 1;
        }
        if end - first > max_thick {
            continue;
        }
        samples.push((along as f64 + 0.5, (first + end) as f64 / 2.0));
    }
    if (samples.len() as i64) < min_run / 2 || samples.len() < 2 {
        return None;
    }

    let n = samples.len() as f64;
    let mean_a = samples.iter().map(|s| s.0).sum::<f64>() / n;
    let mean_c = samples.iter().map(|s| s.1).sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(a, c) in &samples {
        sxx += (a - mean_a) * (a - mean_a);
        sxy += (a - mean_a) * (c - mean_c);
    }
    if sxx <= f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some(ArmLine {
        slope,
        offset: mean_c - slope * mean_a,
    })
}

/// Find the corner mark of `corner` (top-left, top-right, bottom-left,
/// bottom-right) in pixel coordinates.
///
/// `estimate` is a rough mm→px matrix used only to size the search.
pub fn find_corner_marker(
    bitmap: &Bitmap,
    estimate: &Affine2,
    corner: usize,
    search: &CornerSearch,
) -> Option<[f64; 2]> {
    let px_per_mm = estimate.mean_scale();
    if !(px_per_mm.is_finite() && px_per_mm > 0.0) {
        return None;
    }
    let extent = (search.search_distance * px_per_mm).round() as i64;
    let window = Window {
        bitmap,
        flip_x: corner % 2 == 1,
        flip_y: corner >= 2,
        size: [
            extent.min(i64::from(bitmap.width())),
            extent.min(i64::from(bitmap.height())),
        ],
    };
    let min_run = ((search.line_coverage * search.mark_length * px_per_mm).round() as i64).max(2);
    let max_thick = ((search.max_thickness * px_per_mm).round() as i64).max(2);
    let band = max_thick;

    let horizontal = find_arm(
        &|along, across| window.is_ink(along, across),
        &|along, across| window.count(along, across, 1, band),
        window.size[0],
        window.size[1],
        min_run,
        band,
        max_thick,
    )?;
    let vertical = find_arm(
        &|along, across| window.is_ink(across, along),
        &|along, across| window.count(across, along, band, 1),
        window.size[1],
        window.size[0],
        min_run,
        band,
        max_thick,
    )?;

    // j = a·i + b and i = c·j + d.
    let (a, b) = (horizontal.slope, horizontal.offset);
    let (c, d) = (vertical.slope, vertical.offset);
    let denom = 1.0 - a * c;
    if denom.abs() < 1e-9 {
        return None;
    }
    let i = (c * b + d) / denom;
    let j = a * i + b;
    Some(window.to_global(i, j))
}

/// Detect the page matrix (mm→px) from the corner marks.
///
/// The marks sit on the corners of the mm rectangle
/// `(mm_x, mm_y, mm_width, mm_height)`. At least three must be found.
#[allow(clippy::too_many_arguments)]
pub fn calculate_matrix(
    bitmap: &Bitmap,
    estimate: &Affine2,
    mm_x: f64,
    mm_y: f64,
    mm_width: f64,
    mm_height: f64,
    search: &CornerSearch,
    bounds: &MatrixBounds,
) -> Result<Affine2, RecognitionError> {
    let mut corners: CornerSet = [None; 4];
    for (idx, slot) in corners.iter_mut().enumerate() {
        *slot = find_corner_marker(bitmap, estimate, idx, search);
        if slot.is_none() {
            tracing::debug!("corner marker {} not found", idx);
        }
    }
    matrix_from_corners(&corners, mm_x, mm_y, mm_width, mm_height, bounds)
}
