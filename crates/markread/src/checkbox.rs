//! Checkbox classification.
//!
//! The printed outline first pins down the box position, then three
//! coverage metrics are measured on the box interior. Each metric is looked
//! up in its knot table and the most confident answer wins, capped by how
//! well the outline was found.

use std::collections::BTreeMap;

use crate::calibration::{
    Calibration, MetricKnot, MetricTable, METRIC_COVERAGE, METRIC_LINES_REMOVED, METRIC_MIN_SIZE,
};
use crate::data::BoxData;
use crate::geometry::Affine2;
use crate::questionnaire::BoxSpec;
use crate::raster::{
    calculate_correction_matrix_masked, get_masked_coverage, get_masked_coverage_without_lines,
    get_masked_white_area_count, Bitmap, Mask, MaskShape,
};

/// Interior inset in printed line widths.
const INNER_INSET_LINE_WIDTHS: f64 = 1.5;

/// Look up `value` in one knot table.
///
/// Every adjacent knot pair with `lower.value <= value <= upper.value`
/// brackets the value; the state is taken from the lower knot and the
/// quality is interpolated linearly (or taken from the lower knot when both
/// share a value). The most confident bracket wins, the first one on ties.
/// Returns `None` when no pair brackets the value.
pub fn interpolate(knots: &[MetricKnot], value: f64) -> Option<(bool, f64)> {
    let mut best: Option<(bool, f64)> = None;
    for pair in knots.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        if !(lower.value <= value && value <= upper.value) {
            continue;
        }
        let quality = if lower.value == upper.value {
            lower.quality
        } else {
            let t = (value - lower.value) / (upper.value - lower.value);
            lower.quality + t * (upper.quality - lower.quality)
        };
        if best.map_or(true, |(_, q)| quality > q) {
            best = Some((lower.state, quality));
        }
    }
    best
}

/// Combine the measured metrics with the tables of a check mode.
///
/// Metrics without a table, and tables without a measurement, are skipped.
/// The first bracketed metric wins ties. Without any bracketing knot pair
/// the box is empty with quality 0.
pub fn classify(table: &MetricTable, metrics: &BTreeMap<String, f64>) -> (bool, f64) {
    let mut best: Option<(bool, f64)> = None;
    for (name, knots) in table {
        let Some(&value) = metrics.get(name) else {
            continue;
        };
        if let Some((s, q)) = interpolate(knots, value) {
            tracing::trace!("metric {} = {:.3} -> state {} quality {:.3}", name, value, s, q);
            if best.map_or(true, |(_, quality)| q > quality) {
                best = Some((s, q));
            }
        }
    }
    best.unwrap_or((false, 0.0))
}

/// Confidence in the box position from the ink found under its outline.
pub fn pos_quality(outline_coverage: f64, line_coverage: f64) -> f64 {
    if outline_coverage < line_coverage || line_coverage >= 1.0 {
        return 0.0;
    }
    (2.0 * (outline_coverage - line_coverage) / (1.0 - line_coverage)).min(1.0)
}

/// Measure and classify one checkbox on a page.
///
/// `matrix` is the mm→px page matrix. The returned data carries the
/// corrected box position and every measured metric.
pub fn recognize_checkbox(
    bitmap: &Bitmap,
    matrix: &Affine2,
    spec: &BoxSpec,
    shape: MaskShape,
    cal: &Calibration,
    table: &MetricTable,
) -> BoxData {
    let rect = spec.rect();
    let outline = Mask::outline(matrix, &rect, shape, spec.lw);
    let search_px = (cal.correction_search_distance * matrix.mean_scale()).round() as i64;
    let (correction, outline_coverage) =
        calculate_correction_matrix_masked(bitmap, &outline, matrix, search_px);
    let pos_q = pos_quality(outline_coverage, cal.image_line_coverage);

    let corrected = correction.then(matrix);
    let inner = Mask::inner(&corrected, &rect, shape, INNER_INSET_LINE_WIDTHS * spec.lw);
    let [ox, oy] = inner.origin();
    let line_px = spec.lw * corrected.mean_scale();

    let mut metrics = BTreeMap::new();
    metrics.insert(
        METRIC_COVERAGE.to_string(),
        get_masked_coverage(bitmap, &inner, ox, oy),
    );
    metrics.insert(
        METRIC_LINES_REMOVED.to_string(),
        get_masked_coverage_without_lines(bitmap, &inner, ox, oy, line_px, cal.checkbox_lines_removed),
    );
    let (_, filled) = get_masked_white_area_count(
        bitmap,
        &inner,
        ox,
        oy,
        cal.checkbox_white_area_min,
        cal.checkbox_white_area_max,
    );
    metrics.insert(METRIC_MIN_SIZE.to_string(), filled);

    let (state, quality) = classify(table, &metrics);
    let [x, y] = correction.transform_point(rect.x, rect.y);
    tracing::debug!(
        "checkbox {}: state {} quality {:.3} (metric {:.3}, position {:.3})",
        spec.id,
        state,
        quality.min(pos_q),
        quality,
        pos_q
    );

    let mut data = BoxData::nominal(spec);
    data.x = x;
    data.y = y;
    data.state = state;
    data.quality = quality.min(pos_q);
    data.metrics = metrics;
    data
}
