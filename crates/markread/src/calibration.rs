//! Printed-layout constants and recognition thresholds.
//!
//! Everything the recognizer knows about the physical form lives here:
//! corner mark placement, corner/code box geometry, search windows and the
//! checkbox metric tables. All values are millimetres unless noted. Every
//! field falls back to its `DEFAULT_*` constant, so a JSON override only
//! needs the fields it changes.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::geometry::MatrixBounds;
use crate::raster::CornerSearch;
use crate::survey::CheckMode;

/// One knot of a checkbox metric table.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetricKnot {
    pub value: f64,
    pub state: bool,
    pub quality: f64,
}

impl MetricKnot {
    pub const fn new(value: f64, state: bool, quality: f64) -> Self {
        Self {
            value,
            state,
            quality,
        }
    }
}

/// Metric name → knots sorted by value.
pub type MetricTable = BTreeMap<String, Vec<MetricKnot>>;

pub const METRIC_COVERAGE: &str = "coverage";
pub const METRIC_LINES_REMOVED: &str = "cov-lines-removed";
pub const METRIC_MIN_SIZE: &str = "cov-min-size";

/// Calibration of the printed layout and the recognition thresholds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Calibration {
    /// Distance of the corner-mark corner from the left paper edge.
    #[serde(default = "Calibration::default_corner_mark_left")]
    pub corner_mark_left: f64,
    #[serde(default = "Calibration::default_corner_mark_right")]
    pub corner_mark_right: f64,
    #[serde(default = "Calibration::default_corner_mark_top")]
    pub corner_mark_top: f64,
    #[serde(default = "Calibration::default_corner_mark_bottom")]
    pub corner_mark_bottom: f64,
    /// Length of each corner mark arm.
    #[serde(default = "Calibration::default_corner_mark_length")]
    pub corner_mark_length: f64,

    #[serde(default = "Calibration::default_corner_box_width")]
    pub corner_box_width: f64,
    #[serde(default = "Calibration::default_corner_box_height")]
    pub corner_box_height: f64,
    /// Gap between the corner mark lines and the corner box.
    #[serde(default = "Calibration::default_corner_box_padding")]
    pub corner_box_padding: f64,
    /// Ink fraction above which a corner box reads as "on".
    #[serde(default = "Calibration::default_cornerbox_on_coverage")]
    pub cornerbox_on_coverage: f64,

    /// Bits per codebox.
    #[serde(default = "Calibration::default_codebox_length")]
    pub codebox_length: u32,
    #[serde(default = "Calibration::default_codebox_step")]
    pub codebox_step: f64,
    #[serde(default = "Calibration::default_codebox_height")]
    pub codebox_height: f64,
    /// Inset of the measured area inside each bit box.
    #[serde(default = "Calibration::default_codebox_offset")]
    pub codebox_offset: f64,
    #[serde(default = "Calibration::default_codebox_on_coverage")]
    pub codebox_on_coverage: f64,

    /// Gap between the bottom corner mark line and a Code-128 barcode.
    #[serde(default = "Calibration::default_code128_vpad")]
    pub code128_vpad: f64,
    #[serde(default = "Calibration::default_code128_height")]
    pub code128_height: f64,

    /// Corner mark search window, measured from the image corner.
    #[serde(default = "Calibration::default_corner_mark_search_distance")]
    pub corner_mark_search_distance: f64,
    /// Fraction of the arm length that must be seen as one ink run.
    #[serde(default = "Calibration::default_corner_mark_line_coverage")]
    pub corner_mark_line_coverage: f64,
    #[serde(default = "Calibration::default_corner_mark_max_thickness")]
    pub corner_mark_max_thickness: f64,

    /// Resolution bounds of an accepted page matrix (px per mm).
    #[serde(default = "Calibration::default_matrix_min_px_per_mm")]
    pub matrix_min_px_per_mm: f64,
    #[serde(default = "Calibration::default_matrix_max_px_per_mm")]
    pub matrix_max_px_per_mm: f64,
    /// Allowed deviation of the page axes from perpendicular, degrees.
    #[serde(default = "Calibration::default_matrix_max_skew_deg")]
    pub matrix_max_skew_deg: f64,

    /// Width of printed box outlines (1 pt).
    #[serde(default = "Calibration::default_image_line_width")]
    pub image_line_width: f64,
    /// Outline ink fraction needed for a trusted box position.
    #[serde(default = "Calibration::default_image_line_coverage")]
    pub image_line_coverage: f64,
    /// Maximum local shift searched when aligning a box outline.
    #[serde(default = "Calibration::default_correction_search_distance")]
    pub correction_search_distance: f64,

    /// Strokes erased for the `cov-lines-removed` metric.
    #[serde(default = "Calibration::default_checkbox_lines_removed")]
    pub checkbox_lines_removed: u32,
    /// Smallest paper region (share of the box) that counts as open.
    #[serde(default = "Calibration::default_checkbox_white_area_min")]
    pub checkbox_white_area_min: f64,
    #[serde(default = "Calibration::default_checkbox_white_area_max")]
    pub checkbox_white_area_max: f64,

    #[serde(default = "Calibration::default_find_box_corners_tolerance")]
    pub find_box_corners_tolerance: f64,

    #[serde(default = "Calibration::default_textbox_scan_width")]
    pub textbox_scan_width: f64,
    #[serde(default = "Calibration::default_textbox_scan_height")]
    pub textbox_scan_height: f64,
    #[serde(default = "Calibration::default_textbox_scan_step_x")]
    pub textbox_scan_step_x: f64,
    #[serde(default = "Calibration::default_textbox_scan_step_y")]
    pub textbox_scan_step_y: f64,
    /// Ink fraction above which a scan tile counts as written on.
    #[serde(default = "Calibration::default_textbox_scan_coverage")]
    pub textbox_scan_coverage: f64,
    #[serde(default = "Calibration::default_textbox_minimum_writing_width")]
    pub textbox_minimum_writing_width: f64,
    #[serde(default = "Calibration::default_textbox_minimum_writing_height")]
    pub textbox_minimum_writing_height: f64,
    /// Inset of the scanned area when the frame was located.
    #[serde(default = "Calibration::default_textbox_scan_padding")]
    pub textbox_scan_padding: f64,
    /// Inset when the frame could not be located.
    #[serde(default = "Calibration::default_textbox_scan_uncorrected_padding")]
    pub textbox_scan_uncorrected_padding: f64,
    #[serde(default = "Calibration::default_textbox_extra_padding")]
    pub textbox_extra_padding: f64,

    /// Luma values below this count as ink (0–255).
    #[serde(default = "Calibration::default_ink_threshold")]
    pub ink_threshold: u8,

    #[serde(default = "Calibration::default_checkbox_metrics")]
    pub checkbox_metrics: BTreeMap<CheckMode, MetricTable>,
}

impl Calibration {
    pub const DEFAULT_CORNER_MARK_LEFT: f64 = 10.0;
    pub const DEFAULT_CORNER_MARK_RIGHT: f64 = 10.0;
    pub const DEFAULT_CORNER_MARK_TOP: f64 = 12.0;
    pub const DEFAULT_CORNER_MARK_BOTTOM: f64 = 12.0;
    pub const DEFAULT_CORNER_MARK_LENGTH: f64 = 20.0;
    pub const DEFAULT_CORNER_BOX_WIDTH: f64 = 3.5;
    pub const DEFAULT_CORNER_BOX_HEIGHT: f64 = 3.5;
    pub const DEFAULT_CORNER_BOX_PADDING: f64 = 1.5;
    pub const DEFAULT_CORNERBOX_ON_COVERAGE: f64 = 0.7;
    pub const DEFAULT_CODEBOX_LENGTH: u32 = 16;
    pub const DEFAULT_CODEBOX_STEP: f64 = 3.5;
    pub const DEFAULT_CODEBOX_HEIGHT: f64 = 3.5;
    pub const DEFAULT_CODEBOX_OFFSET: f64 = 0.75;
    pub const DEFAULT_CODEBOX_ON_COVERAGE: f64 = 0.7;
    pub const DEFAULT_CODE128_VPAD: f64 = 3.0;
    pub const DEFAULT_CODE128_HEIGHT: f64 = 6.0;
    pub const DEFAULT_CORNER_MARK_SEARCH_DISTANCE: f64 = 45.0;
    pub const DEFAULT_CORNER_MARK_LINE_COVERAGE: f64 = 0.65;
    pub const DEFAULT_CORNER_MARK_MAX_THICKNESS: f64 = 2.0;
    pub const DEFAULT_MATRIX_MIN_PX_PER_MM: f64 = 1.0;
    pub const DEFAULT_MATRIX_MAX_PX_PER_MM: f64 = 200.0;
    pub const DEFAULT_MATRIX_MAX_SKEW_DEG: f64 = 5.0;
    pub const DEFAULT_IMAGE_LINE_WIDTH: f64 = 25.4 / 72.0;
    pub const DEFAULT_IMAGE_LINE_COVERAGE: f64 = 0.7;
    pub const DEFAULT_CORRECTION_SEARCH_DISTANCE: f64 = 1.0;
    pub const DEFAULT_CHECKBOX_LINES_REMOVED: u32 = 3;
    pub const DEFAULT_CHECKBOX_WHITE_AREA_MIN: f64 = 0.05;
    pub const DEFAULT_CHECKBOX_WHITE_AREA_MAX: f64 = 1.0;
    pub const DEFAULT_FIND_BOX_CORNERS_TOLERANCE: f64 = 1.5;
    pub const DEFAULT_TEXTBOX_SCAN_WIDTH: f64 = 2.0;
    pub const DEFAULT_TEXTBOX_SCAN_HEIGHT: f64 = 2.0;
    pub const DEFAULT_TEXTBOX_SCAN_STEP_X: f64 = 1.0;
    pub const DEFAULT_TEXTBOX_SCAN_STEP_Y: f64 = 1.0;
    pub const DEFAULT_TEXTBOX_SCAN_COVERAGE: f64 = 0.06;
    pub const DEFAULT_TEXTBOX_MINIMUM_WRITING_WIDTH: f64 = 7.0;
    pub const DEFAULT_TEXTBOX_MINIMUM_WRITING_HEIGHT: f64 = 7.0;
    pub const DEFAULT_TEXTBOX_SCAN_PADDING: f64 = 0.5;
    pub const DEFAULT_TEXTBOX_SCAN_UNCORRECTED_PADDING: f64 = 1.5;
    pub const DEFAULT_TEXTBOX_EXTRA_PADDING: f64 = 1.0;
    pub const DEFAULT_INK_THRESHOLD: u8 = crate::raster::DEFAULT_INK_THRESHOLD;

    fn default_corner_mark_left() -> f64 {
        Self::DEFAULT_CORNER_MARK_LEFT
    }
    fn default_corner_mark_right() -> f64 {
        Self::DEFAULT_CORNER_MARK_RIGHT
    }
    fn default_corner_mark_top() -> f64 {
        Self::DEFAULT_CORNER_MARK_TOP
    }
    fn default_corner_mark_bottom() -> f64 {
        Self::DEFAULT_CORNER_MARK_BOTTOM
    }
    fn default_corner_mark_length() -> f64 {
        Self::DEFAULT_CORNER_MARK_LENGTH
    }
    fn default_corner_box_width() -> f64 {
        Self::DEFAULT_CORNER_BOX_WIDTH
    }
    fn default_corner_box_height() -> f64 {
        Self::DEFAULT_CORNER_BOX_HEIGHT
    }
    fn default_corner_box_padding() -> f64 {
        Self::DEFAULT_CORNER_BOX_PADDING
    }
    fn default_cornerbox_on_coverage() -> f64 {
        Self::DEFAULT_CORNERBOX_ON_COVERAGE
    }
    fn default_codebox_length() -> u32 {
        Self::DEFAULT_CODEBOX_LENGTH
    }
    fn default_codebox_step() -> f64 {
        Self::DEFAULT_CODEBOX_STEP
    }
    fn default_codebox_height() -> f64 {
        Self::DEFAULT_CODEBOX_HEIGHT
    }
    fn default_codebox_offset() -> f64 {
        Self::DEFAULT_CODEBOX_OFFSET
    }
    fn default_codebox_on_coverage() -> f64 {
        Self::DEFAULT_CODEBOX_ON_COVERAGE
    }
    fn default_code128_vpad() -> f64 {
        Self::DEFAULT_CODE128_VPAD
    }
    fn default_code128_height() -> f64 {
        Self::DEFAULT_CODE128_HEIGHT
    }
    fn default_corner_mark_search_distance() -> f64 {
        Self::DEFAULT_CORNER_MARK_SEARCH_DISTANCE
    }
    fn default_corner_mark_line_coverage() -> f64 {
        Self::DEFAULT_CORNER_MARK_LINE_COVERAGE
    }
    fn default_corner_mark_max_thickness() -> f64 {
        Self::DEFAULT_CORNER_MARK_MAX_THICKNESS
    }
    fn default_matrix_min_px_per_mm() -> f64 {
        Self::DEFAULT_MATRIX_MIN_PX_PER_MM
    }
    fn default_matrix_max_px_per_mm() -> f64 {
        Self::DEFAULT_MATRIX_MAX_PX_PER_MM
    }
    fn default_matrix_max_skew_deg() -> f64 {
        Self::DEFAULT_MATRIX_MAX_SKEW_DEG
    }
    fn default_image_line_width() -> f64 {
        Self::DEFAULT_IMAGE_LINE_WIDTH
    }
    fn default_image_line_coverage() -> f64 {
        Self::DEFAULT_IMAGE_LINE_COVERAGE
    }
    fn default_correction_search_distance() -> f64 {
        Self::DEFAULT_CORRECTION_SEARCH_DISTANCE
    }
    fn default_checkbox_lines_removed() -> u32 {
        Self::DEFAULT_CHECKBOX_LINES_REMOVED
    }
    fn default_checkbox_white_area_min() -> f64 {
        Self::DEFAULT_CHECKBOX_WHITE_AREA_MIN
    }
    fn default_checkbox_white_area_max() -> f64 {
        Self::DEFAULT_CHECKBOX_WHITE_AREA_MAX
    }
    fn default_find_box_corners_tolerance() -> f64 {
        Self::DEFAULT_FIND_BOX_CORNERS_TOLERANCE
    }
    fn default_textbox_scan_width() -> f64 {
        Self::DEFAULT_TEXTBOX_SCAN_WIDTH
    }
    fn default_textbox_scan_height() -> f64 {
        Self::DEFAULT_TEXTBOX_SCAN_HEIGHT
    }
    fn default_textbox_scan_step_x() -> f64 {
        Self::DEFAULT_TEXTBOX_SCAN_STEP_X
    }
    fn default_textbox_scan_step_y() -> f64 {
        Self::DEFAULT_TEXTBOX_SCAN_STEP_Y
    }
    fn default_textbox_scan_coverage() -> f64 {
        Self::DEFAULT_TEXTBOX_SCAN_COVERAGE
    }
    fn default_textbox_minimum_writing_width() -> f64 {
        Self::DEFAULT_TEXTBOX_MINIMUM_WRITING_WIDTH
    }
    fn default_textbox_minimum_writing_height() -> f64 {
        Self::DEFAULT_TEXTBOX_MINIMUM_WRITING_HEIGHT
    }
    fn default_textbox_scan_padding() -> f64 {
        Self::DEFAULT_TEXTBOX_SCAN_PADDING
    }
    fn default_textbox_scan_uncorrected_padding() -> f64 {
        Self::DEFAULT_TEXTBOX_SCAN_UNCORRECTED_PADDING
    }
    fn default_textbox_extra_padding() -> f64 {
        Self::DEFAULT_TEXTBOX_EXTRA_PADDING
    }
    fn default_ink_threshold() -> u8 {
        Self::DEFAULT_INK_THRESHOLD
    }

    /// Default metric tables for every check mode.
    pub fn default_checkbox_metrics() -> BTreeMap<CheckMode, MetricTable> {
        let k = MetricKnot::new;
        let table = |entries: Vec<(&str, Vec<MetricKnot>)>| -> MetricTable {
            entries
                .into_iter()
                .map(|(name, knots)| (name.to_string(), knots))
                .collect()
        };

        // A box crossed through and then filled in is a correction.
        let checkcorrect = table(vec![
            (
                METRIC_COVERAGE,
                vec![
                    k(0.0, false, 1.0),
                    k(0.05, false, 0.9),
                    k(0.10, false, 0.0),
                    k(0.10, true, 0.0),
                    k(0.15, true, 0.8),
                    k(0.40, true, 1.0),
                    k(0.60, true, 0.7),
                    k(0.75, true, 0.0),
                    k(0.75, false, 0.0),
                    k(0.90, false, 0.8),
                    k(1.0, false, 1.0),
                ],
            ),
            (
                METRIC_LINES_REMOVED,
                vec![
                    k(0.0, false, 1.0),
                    k(0.03, false, 0.9),
                    k(0.08, false, 0.0),
                    k(0.08, true, 0.0),
                    k(0.12, true, 0.8),
                    k(0.35, true, 1.0),
                    k(0.60, true, 0.7),
                    k(0.75, true, 0.0),
                    k(0.75, false, 0.0),
                    k(0.90, false, 0.8),
                    k(1.0, false, 1.0),
                ],
            ),
            (
                METRIC_MIN_SIZE,
                vec![
                    k(0.0, true, 0.0),
                    k(0.85, true, 0.0),
                    k(0.85, false, 0.0),
                    k(0.95, false, 1.0),
                    k(1.0, false, 1.0),
                ],
            ),
        ]);

        let check = table(vec![
            (
                METRIC_COVERAGE,
                vec![
                    k(0.0, false, 1.0),
                    k(0.05, false, 0.9),
                    k(0.10, false, 0.0),
                    k(0.10, true, 0.0),
                    k(0.15, true, 0.8),
                    k(0.40, true, 1.0),
                    k(1.0, true, 1.0),
                ],
            ),
            (
                METRIC_LINES_REMOVED,
                vec![
                    k(0.0, false, 1.0),
                    k(0.03, false, 0.9),
                    k(0.08, false, 0.0),
                    k(0.08, true, 0.0),
                    k(0.12, true, 0.8),
                    k(0.35, true, 1.0),
                    k(1.0, true, 1.0),
                ],
            ),
            (
                METRIC_MIN_SIZE,
                vec![
                    k(0.0, true, 0.0),
                    k(0.85, true, 0.0),
                    k(0.95, true, 1.0),
                    k(1.0, true, 1.0),
                ],
            ),
        ]);

        let fill = table(vec![
            (
                METRIC_COVERAGE,
                vec![
                    k(0.0, false, 1.0),
                    k(0.20, false, 0.8),
                    k(0.40, false, 0.0),
                    k(0.40, true, 0.0),
                    k(0.60, true, 0.8),
                    k(0.80, true, 1.0),
                    k(1.0, true, 1.0),
                ],
            ),
            (
                METRIC_MIN_SIZE,
                vec![
                    k(0.0, false, 0.5),
                    k(0.50, false, 0.0),
                    k(0.50, true, 0.0),
                    k(0.90, true, 1.0),
                    k(1.0, true, 1.0),
                ],
            ),
        ]);

        BTreeMap::from([
            (CheckMode::CheckCorrect, checkcorrect),
            (CheckMode::Check, check),
            (CheckMode::Fill, fill),
        ])
    }

    /// Load a (partial) calibration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Corner-mark rectangle `(x, y, width, height)` for a paper size.
    pub fn corner_mark_rect(&self, paper_width: f64, paper_height: f64) -> [f64; 4] {
        [
            self.corner_mark_left,
            self.corner_mark_top,
            paper_width - self.corner_mark_left - self.corner_mark_right,
            paper_height - self.corner_mark_top - self.corner_mark_bottom,
        ]
    }

    pub fn matrix_bounds(&self) -> MatrixBounds {
        MatrixBounds {
            min_px_per_mm: self.matrix_min_px_per_mm,
            max_px_per_mm: self.matrix_max_px_per_mm,
            max_axis_skew_deg: self.matrix_max_skew_deg,
        }
    }

    pub fn corner_search(&self) -> CornerSearch {
        CornerSearch {
            search_distance: self.corner_mark_search_distance,
            mark_length: self.corner_mark_length,
            line_coverage: self.corner_mark_line_coverage,
            max_thickness: self.corner_mark_max_thickness,
        }
    }

    /// Metric table of a check mode; empty when the mode has none.
    pub fn metrics_for(&self, mode: CheckMode) -> Option<&MetricTable> {
        self.checkbox_metrics.get(&mode)
    }

    /// Width of a classic codebox row.
    pub fn codebox_width(&self) -> f64 {
        self.codebox_step * f64::from(self.codebox_length)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            corner_mark_left: Self::DEFAULT_CORNER_MARK_LEFT,
            corner_mark_right: Self::DEFAULT_CORNER_MARK_RIGHT,
            corner_mark_top: Self::DEFAULT_CORNER_MARK_TOP,
            corner_mark_bottom: Self::DEFAULT_CORNER_MARK_BOTTOM,
            corner_mark_length: Self::DEFAULT_CORNER_MARK_LENGTH,
            corner_box_width: Self::DEFAULT_CORNER_BOX_WIDTH,
            corner_box_height: Self::DEFAULT_CORNER_BOX_HEIGHT,
            corner_box_padding: Self::DEFAULT_CORNER_BOX_PADDING,
            cornerbox_on_coverage: Self::DEFAULT_CORNERBOX_ON_COVERAGE,
            codebox_length: Self::DEFAULT_CODEBOX_LENGTH,
            codebox_step: Self::DEFAULT_CODEBOX_STEP,
            codebox_height: Self::DEFAULT_CODEBOX_HEIGHT,
            codebox_offset: Self::DEFAULT_CODEBOX_OFFSET,
            codebox_on_coverage: Self::DEFAULT_CODEBOX_ON_COVERAGE,
            code128_vpad: Self::DEFAULT_CODE128_VPAD,
            code128_height: Self::DEFAULT_CODE128_HEIGHT,
            corner_mark_search_distance: Self::DEFAULT_CORNER_MARK_SEARCH_DISTANCE,
            corner_mark_line_coverage: Self::DEFAULT_CORNER_MARK_LINE_COVERAGE,
            corner_mark_max_thickness: Self::DEFAULT_CORNER_MARK_MAX_THICKNESS,
            matrix_min_px_per_mm: Self::DEFAULT_MATRIX_MIN_PX_PER_MM,
            matrix_max_px_per_mm: Self::DEFAULT_MATRIX_MAX_PX_PER_MM,
            matrix_max_skew_deg: Self::DEFAULT_MATRIX_MAX_SKEW_DEG,
            image_line_width: Self::DEFAULT_IMAGE_LINE_WIDTH,
            image_line_coverage: Self::DEFAULT_IMAGE_LINE_COVERAGE,
            correction_search_distance: Self::DEFAULT_CORRECTION_SEARCH_DISTANCE,
            checkbox_lines_removed: Self::DEFAULT_CHECKBOX_LINES_REMOVED,
            checkbox_white_area_min: Self::DEFAULT_CHECKBOX_WHITE_AREA_MIN,
            checkbox_white_area_max: Self::DEFAULT_CHECKBOX_WHITE_AREA_MAX,
            find_box_corners_tolerance: Self::DEFAULT_FIND_BOX_CORNERS_TOLERANCE,
            textbox_scan_width: Self::DEFAULT_TEXTBOX_SCAN_WIDTH,
            textbox_scan_height: Self::DEFAULT_TEXTBOX_SCAN_HEIGHT,
            textbox_scan_step_x: Self::DEFAULT_TEXTBOX_SCAN_STEP_X,
            textbox_scan_step_y: Self::DEFAULT_TEXTBOX_SCAN_STEP_Y,
            textbox_scan_coverage: Self::DEFAULT_TEXTBOX_SCAN_COVERAGE,
            textbox_minimum_writing_width: Self::DEFAULT_TEXTBOX_MINIMUM_WRITING_WIDTH,
            textbox_minimum_writing_height: Self::DEFAULT_TEXTBOX_MINIMUM_WRITING_HEIGHT,
            textbox_scan_padding: Self::DEFAULT_TEXTBOX_SCAN_PADDING,
            textbox_scan_uncorrected_padding: Self::DEFAULT_TEXTBOX_SCAN_UNCORRECTED_PADDING,
            textbox_extra_padding: Self::DEFAULT_TEXTBOX_EXTRA_PADDING,
            ink_threshold: Self::DEFAULT_INK_THRESHOLD,
            checkbox_metrics: Self::default_checkbox_metrics(),
        }
    }
}
