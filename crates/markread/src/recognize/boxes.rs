//! Per-box dispatch once the page images are identified.

use crate::barcode::BarcodeReader;
use crate::calibration::{Calibration, MetricTable};
use crate::checkbox::recognize_checkbox;
use crate::data::BoxData;
use crate::geometry::Affine2;
use crate::questionnaire::{BoxKind, BoxSpec};
use crate::raster::Bitmap;
use crate::textbox::{recognize_codebox, recognize_textbox};

/// Recognize one box on its page.
pub(crate) fn recognize_box(
    bitmap: &Bitmap,
    matrix: &Affine2,
    spec: &BoxSpec,
    cal: &Calibration,
    table: &MetricTable,
    barcodes: &dyn BarcodeReader,
) -> BoxData {
    match spec.kind {
        BoxKind::Checkbox { form } => recognize_checkbox(bitmap, matrix, spec, form, cal, table),
        BoxKind::Textbox => recognize_textbox(bitmap, matrix, spec, cal),
        BoxKind::Codebox => recognize_codebox(bitmap, matrix, spec, barcodes),
    }
}

/// Data of a box whose page could not be recognized.
pub(crate) fn unrecognized_box(spec: &BoxSpec) -> BoxData {
    let mut data = BoxData::nominal(spec);
    data.quality = 0.0;
    data
}
