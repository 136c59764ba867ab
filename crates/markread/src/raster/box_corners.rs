//! Printed frame detection for text fields.

use super::{get_coverage, Bitmap};
use crate::geometry::{Affine2, Quadrilateral, Rect};

/// Position of the frame edge near `nominal` by sliding a thin strip across
/// it. `horizontal` edges are searched in y, vertical ones in x.
#[allow(clippy::too_many_arguments)]
fn locate_edge(
    bitmap: &Bitmap,
    matrix: &Affine2,
    horizontal: bool,
    nominal: f64,
    along: f64,
    strip_len: f64,
    tolerance: f64,
    line_width: f64,
    min_coverage: f64,
) -> Option<f64> {
    let step = 1.0 / matrix.mean_scale();
    let n = (tolerance / step).ceil() as i64;

    let mut best = 0.0;
    let mut hits: Vec<f64> = Vec::new();
    for k in -n..=n {
        let d = k as f64 * step;
        let centre = nominal + d;
        let covered = if horizontal {
            get_coverage(
                bitmap,
                matrix,
                along - strip_len / 2.0,
                centre - line_width / 2.0,
                strip_len,
                line_width,
            )
        } else {
            get_coverage(
                bitmap,
                matrix,
                centre - line_width / 2.0,
                along - strip_len / 2.0,
                line_width,
                strip_len,
            )
        };
        if covered > best + 1e-9 {
            best = covered;
            hits.clear();
        }
        if (covered - best).abs() <= 1e-9 {
            hits.push(centre);
        }
    }

    if best < min_coverage || hits.is_empty() {
        return None;
    }
    Some(hits.iter().sum::<f64>() / hits.len() as f64)
}

/// Intersection of the lines through `(a0, a1)` and `(b0, b1)`.
fn intersect(a0: [f64; 2], a1: [f64; 2], b0: [f64; 2], b1: [f64; 2]) -> Option<[f64; 2]> {
    let da = [a1[0] - a0[0], a1[1] - a0[1]];
    let db = [b1[0] - b0[0], b1[1] - b0[1]];
    let denom = da[0] * db[1] - da[1] * db[0];
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = ((b0[0] - a0[0]) * db[1] - (b0[1] - a0[1]) * db[0]) / denom;
    Some([a0[0] + t * da[0], a0[1] + t * da[1]])
}

/// Locate the printed frame around `rect` (millimetres).
///
/// Every edge is sampled at a quarter and three quarters of its length,
/// within `tolerance` mm of the nominal position. A sample succeeds when a
/// `line_width` strip reaches `min_coverage`. The corners are the
/// intersections of the fitted edge lines. Returns `None` when any sample
/// fails.
pub fn find_box_corners(
    bitmap: &Bitmap,
    matrix: &Affine2,
    rect: &Rect,
    tolerance: f64,
    line_width: f64,
    min_coverage: f64,
) -> Option<Quadrilateral> {
    let strip_w = (rect.width / 4.0).min(5.0);
    let strip_h = (rect.height / 4.0).min(5.0);
    let xs = [rect.x + rect.width / 4.0, rect.x + rect.width * 3.0 / 4.0];
    let ys = [rect.y + rect.height / 4.0, rect.y + rect.height * 3.0 / 4.0];

    let edge_h = |edge: f64| -> Option<[[f64; 2]; 2]> {
        let mut pts = [[0.0; 2]; 2];
        for (p, &x) in pts.iter_mut().zip(&xs) {
            let y = locate_edge(
                bitmap, matrix, true, edge, x, strip_w, tolerance, line_width, min_coverage,
            )?;
            *p = [x, y];
        }
        Some(pts)
    };
    let edge_v = |edge: f64| -> Option<[[f64; 2]; 2]> {
        let mut pts = [[0.0; 2]; 2];
        for (p, &y) in pts.iter_mut().zip(&ys) {
            let x = locate_edge(
                bitmap, matrix, false, edge, y, strip_h, tolerance, line_width, min_coverage,
            )?;
            *p = [x, y];
        }
        Some(pts)
    };

    let top = edge_h(rect.y)?;
    let bottom = edge_h(rect.bottom())?;
    let left = edge_v(rect.x)?;
    let right = edge_v(rect.right())?;

    Some(Quadrilateral {
        corners: [
            intersect(top[0], top[1], left[0], left[1])?,
            intersect(top[0], top[1], right[0], right[1])?,
            intersect(bottom[0], bottom[1], left[0], left[1])?,
            intersect(bottom[0], bottom[1], right[0], right[1])?,
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{outline_rects, render_rects};

    const LW: f64 = 25.4 / 72.0;

    #[test]
    fn frame_offset_is_recovered() {
        let m = Affine2::scale(8.0, 8.0);
        let nominal = Rect::new(10.0, 10.0, 60.0, 20.0);
        let printed = Rect::new(10.5, 9.7, 60.0, 20.0);
        let img = render_rects(700, 360, &m, &outline_rects(&printed, LW));

        let quad = find_box_corners(&img, &m, &nominal, 1.5, LW, 0.7).unwrap();
        let expected = Quadrilateral::from_rect(&printed);
        for (got, want) in quad.corners.iter().zip(expected.corners) {
            assert!(
                (got[0] - want[0]).abs() < 0.2 && (got[1] - want[1]).abs() < 0.2,
                "{got:?} vs {want:?}"
            );
        }
    }

    #[test]
    fn missing_frame_fails() {
        let m = Affine2::scale(8.0, 8.0);
        let img = Bitmap::from_fn(700, 360, |_, _| false);
        assert!(find_box_corners(&img, &m, &Rect::new(10.0, 10.0, 60.0, 20.0), 1.5, LW, 0.7).is_none());
    }
}
