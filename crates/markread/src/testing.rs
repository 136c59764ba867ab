//! Synthetic scans for tests and benchmarks.
//!
//! Pages are drawn in millimetres: every filled rectangle is pushed through
//! the page matrix and each pixel is inked when its centre maps back inside.

use crate::calibration::Calibration;
use crate::geometry::{Affine2, Rect};
use crate::raster::Bitmap;
use crate::style::CORNER_BOXES;
use crate::survey::Survey;

/// Resolution of synthetic pages.
pub const PX_PER_MM: f64 = 5.0;

/// Rasterise filled mm rectangles through the mm→px `matrix`.
pub fn render_rects(width: u32, height: u32, matrix: &Affine2, rects: &[Rect]) -> Bitmap {
    let mut ink = vec![false; width as usize * height as usize];
    let Some(inverse) = matrix.inverse() else {
        return Bitmap::from_fn(width, height, |_, _| false);
    };
    for r in rects {
        let corners = [
            matrix.transform_point(r.x, r.y),
            matrix.transform_point(r.right(), r.y),
            matrix.transform_point(r.x, r.bottom()),
            matrix.transform_point(r.right(), r.bottom()),
        ];
        let x0 = corners.iter().map(|c| c[0]).fold(f64::INFINITY, f64::min).floor().max(0.0) as u32;
        let y0 = corners.iter().map(|c| c[1]).fold(f64::INFINITY, f64::min).floor().max(0.0) as u32;
        let x1 = (corners.iter().map(|c| c[0]).fold(f64::NEG_INFINITY, f64::max).ceil() as u32).min(width);
        let y1 = (corners.iter().map(|c| c[1]).fold(f64::NEG_INFINITY, f64::max).ceil() as u32).min(height);
        for y in y0..y1 {
            for x in x0..x1 {
                let [mx, my] = inverse.transform_point(x as f64 + 0.5, y as f64 + 0.5);
                if mx >= r.x && mx <= r.right() && my >= r.y && my <= r.bottom() {
                    ink[y as usize * width as usize + x as usize] = true;
                }
            }
        }
    }
    Bitmap::from_fn(width, height, |x, y| ink[y as usize * width as usize + x as usize])
}

/// Four strokes of width `lw` centred on the outline of `rect`.
pub fn outline_rects(rect: &Rect, lw: f64) -> Vec<Rect> {
    let h = lw / 2.0;
    vec![
        Rect::new(rect.x - h, rect.y - h, rect.width + lw, lw),
        Rect::new(rect.x - h, rect.bottom() - h, rect.width + lw, lw),
        Rect::new(rect.x - h, rect.y - h, lw, rect.height + lw),
        Rect::new(rect.right() - h, rect.y - h, lw, rect.height + lw),
    ]
}

/// L-shaped marks on the corners of `mark`, two strokes per corner in
/// top-left, top-right, bottom-left, bottom-right order.
pub fn corner_mark_rects(mark: &Rect, length: f64, lw: f64) -> Vec<Rect> {
    let h = lw / 2.0;
    let mut out = Vec::with_capacity(8);
    for (cx, cy, inward_x, inward_y) in [
        (mark.x, mark.y, true, true),
        (mark.right(), mark.y, false, true),
        (mark.x, mark.bottom(), true, false),
        (mark.right(), mark.bottom(), false, false),
    ] {
        let hx = if inward_x { cx - h } else { cx - length };
        let vy = if inward_y { cy - h } else { cy - length };
        out.push(Rect::new(hx, cy - h, length + h, lw));
        out.push(Rect::new(cx - h, vy, lw, length + h));
    }
    out
}

/// Upright page matrix at [`PX_PER_MM`].
pub fn page_matrix() -> Affine2 {
    Affine2::scale(PX_PER_MM, PX_PER_MM)
}

/// Page matrix of a sheet fed upside down.
pub fn upside_down_matrix(paper: [f64; 2]) -> Affine2 {
    Affine2::from_params([
        -PX_PER_MM,
        0.0,
        0.0,
        -PX_PER_MM,
        paper[0] * PX_PER_MM,
        paper[1] * PX_PER_MM,
    ])
}

/// Pixel size of a page of the survey.
pub fn page_size_px(survey: &Survey) -> (u32, u32) {
    (
        (survey.defs.paper_width * PX_PER_MM).round() as u32,
        (survey.defs.paper_height * PX_PER_MM).round() as u32,
    )
}

/// The four L-shaped corner marks of a survey page.
pub fn page_corner_marks(survey: &Survey, cal: &Calibration) -> Vec<Rect> {
    let [x, y, w, h] = cal.corner_mark_rect(survey.defs.paper_width, survey.defs.paper_height);
    corner_mark_rects(&Rect::new(x, y, w, h), cal.corner_mark_length, cal.image_line_width)
}

/// Classic corner boxes of `page`: filled when on, outlined when off.
pub fn classic_corner_boxes(survey: &Survey, cal: &Calibration, page: u32) -> Vec<Rect> {
    let (pw, ph) = (survey.defs.paper_width, survey.defs.paper_height);
    let (w, h, pad) = (cal.corner_box_width, cal.corner_box_height, cal.corner_box_padding);
    let positions = [
        (cal.corner_mark_left + pad, cal.corner_mark_top + pad),
        (pw - cal.corner_mark_right - pad - w, cal.corner_mark_top + pad),
        (cal.corner_mark_left + pad, ph - cal.corner_mark_bottom - pad - h),
        (pw - cal.corner_mark_right - pad - w, ph - cal.corner_mark_bottom - pad - h),
    ];
    let Some(pattern) = page.checked_sub(1).and_then(|i| CORNER_BOXES.get(i as usize)) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (&(x, y), &on) in positions.iter().zip(pattern.iter()) {
        let r = Rect::new(x, y, w, h);
        if on == 1 {
            out.push(r);
        } else {
            out.extend(outline_rects(&r, cal.image_line_width));
        }
    }
    out
}

/// Filled bit boxes encoding the low `codebox_length` bits of `code`.
pub fn codebox_rects(cal: &Calibration, x: f64, y: f64, code: u32) -> Vec<Rect> {
    let n = cal.codebox_length;
    (0..n)
        .filter(|i| code >> (n - 1 - i) & 1 == 1)
        .map(|i| Rect::new(x + f64::from(i) * cal.codebox_step, y, cal.codebox_step, cal.codebox_height))
        .collect()
}

/// Survey and questionnaire ID codeboxes of a classic page.
pub fn classic_id_rects(
    survey: &Survey,
    cal: &Calibration,
    survey_id: u32,
    questionnaire_id: Option<u32>,
) -> Vec<Rect> {
    let mut out = Vec::new();
    if survey.defs.print_survey_id {
        let row = survey.survey_id_pos(cal);
        out.extend(codebox_rects(cal, row.msb_x, row.y, survey_id >> 16));
        out.extend(codebox_rects(cal, row.lsb_x, row.y, survey_id & 0xffff));
    }
    if let Some(qid) = questionnaire_id {
        let row = survey.questionnaire_id_pos(cal);
        out.extend(codebox_rects(cal, row.msb_x, row.y, qid));
    }
    out
}

/// Module widths of a Code-128 symbol holding `digits` in code set C:
/// start, digit pairs, check symbol and stop. Even indices are bars. Empty
/// for an odd or non-numeric `digits`.
pub fn code128_widths(digits: &str) -> Vec<u8> {
    use crate::barcode::code128::{PATTERNS, START_C, STOP};

    if digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Vec::new();
    }
    let mut values = vec![START_C];
    for pair in digits.as_bytes().chunks(2) {
        values.push(usize::from(pair[0] - b'0') * 10 + usize::from(pair[1] - b'0'));
    }
    let check = values
        .iter()
        .enumerate()
        .skip(1)
        .fold(START_C, |acc, (i, &v)| acc + i * v)
        % 103;
    values.push(check);

    let mut widths: Vec<u8> = values.iter().flat_map(|&v| PATTERNS[v]).collect();
    widths.extend_from_slice(&STOP);
    widths
}

/// Bars of a Code-128 symbol for `digits`, left edge at `x`, `module` mm
/// per module.
pub fn code128_rects(digits: &str, x: f64, y: f64, module: f64, height: f64) -> Vec<Rect> {
    let mut out = Vec::new();
    let mut at = x;
    for (i, &w) in code128_widths(digits).iter().enumerate() {
        let width = f64::from(w) * module;
        if i % 2 == 0 {
            out.push(Rect::new(at, y, width, height));
        }
        at += width;
    }
    out
}
