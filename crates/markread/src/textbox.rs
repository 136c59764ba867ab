//! Free-text and code boxes.
//!
//! A textbox counts as filled when the ink found inside it spans at least
//! the minimum writing size. Its data is moved to the written area so that
//! reports can crop the handwriting.

use crate::barcode::{read_barcode, BarcodeReader, Symbology};
use crate::calibration::Calibration;
use crate::data::BoxData;
use crate::geometry::{Affine2, Quadrilateral, Rect};
use crate::questionnaire::BoxSpec;
use crate::raster::{find_box_corners, get_coverage, Bitmap};

/// Scan a textbox for handwriting.
pub fn recognize_textbox(bitmap: &Bitmap, matrix: &Affine2, spec: &BoxSpec, cal: &Calibration) -> BoxData {
    let rect = spec.rect();
    let frame = find_box_corners(
        bitmap,
        matrix,
        &rect,
        cal.find_box_corners_tolerance,
        spec.lw,
        cal.image_line_coverage,
    );
    let (outline, padding) = match frame {
        Some(q) => (q, cal.textbox_scan_padding),
        None => {
            tracing::debug!("textbox {}: frame not found, scanning nominal area", spec.id);
            (Quadrilateral::from_rect(&rect), cal.textbox_scan_uncorrected_padding)
        }
    };

    let tile = [cal.textbox_scan_width, cal.textbox_scan_height];
    let inked = |p: &[f64; 2]| {
        get_coverage(bitmap, matrix, p[0], p[1], tile[0], tile[1]) > cal.textbox_scan_coverage
    };

    let mut bbox: Option<Rect> = None;
    let interior = outline.inset(padding);
    for p in interior
        .interior_tiles(tile, [cal.textbox_scan_step_x, cal.textbox_scan_step_y])
        .iter()
        .filter(|p| inked(p))
    {
        let t = Rect::new(p[0], p[1], tile[0], tile[1]);
        bbox = Some(bbox.map_or(t, |b| b.union(&t)));
    }

    // Writing that runs over the printed line continues just outside it.
    if let Some(mut found) = bbox {
        let outside = outline.inset(-(spec.lw + tile[0].max(tile[1]) / 2.0));
        let step = cal.textbox_scan_step_x.min(cal.textbox_scan_step_y);
        for p in outside.border_tiles(tile, step) {
            let t = Rect::new(p[0], p[1], tile[0], tile[1]);
            if t.touches(&found, step) && inked(&p) {
                found = found.union(&t);
            }
        }
        bbox = Some(found);
    }

    let mut data = BoxData::nominal(spec);
    data.quality = 1.0;
    match bbox {
        Some(b)
            if b.width >= cal.textbox_minimum_writing_width
                || b.height >= cal.textbox_minimum_writing_height =>
        {
            data.state = true;
            data.set_rect(&b.grow(padding + cal.textbox_extra_padding));
            tracing::debug!(
                "textbox {}: writing in ({:.1}, {:.1}, {:.1}, {:.1})",
                spec.id,
                b.x,
                b.y,
                b.width,
                b.height
            );
        }
        _ => {
            data.state = false;
            tracing::debug!("textbox {}: empty", spec.id);
        }
    }
    data
}

/// Decode a QR code printed or stuck into a code box.
pub fn recognize_codebox(
    bitmap: &Bitmap,
    matrix: &Affine2,
    spec: &BoxSpec,
    reader: &dyn BarcodeReader,
) -> BoxData {
    let decoded = read_barcode(
        bitmap,
        matrix,
        spec.x,
        spec.y,
        spec.width,
        spec.height,
        Symbology::Qr,
        reader,
    );
    let mut data = BoxData::nominal(spec);
    data.state = decoded.is_some();
    data.quality = 1.0;
    data.text = decoded;
    data
}
