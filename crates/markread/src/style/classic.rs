//! Corner boxes plus bit-box codes.

use super::{PageContext, PageStyle};
use crate::error::RecognitionError;

/// Corner-box pattern of each page, in top-left, top-right, bottom-left,
/// bottom-right order. Page `n` uses entry `n - 1`.
pub const CORNER_BOXES: [[u8; 4]; 6] = [
    [0, 1, 1, 1],
    [1, 1, 0, 0],
    [1, 0, 1, 1],
    [1, 0, 1, 0],
    [1, 0, 0, 0],
    [0, 0, 0, 1],
];

/// Corner box outlines are specified on the line centre; measurements are
/// widened by one point.
const HALF_PT: f64 = 0.5 / 72.0 * 25.4;
const PT: f64 = 1.0 / 72.0 * 25.4;

/// Page number and rotation encoded by a measured corner pattern.
///
/// The upright pattern is tried first, then the reversed one.
pub fn corner_pattern_lookup(pattern: [u8; 4]) -> Result<(u32, bool), RecognitionError> {
    if let Some(idx) = CORNER_BOXES.iter().position(|p| *p == pattern) {
        return Ok((idx as u32 + 1, false));
    }
    let mut reversed = pattern;
    reversed.reverse();
    match CORNER_BOXES.iter().position(|p| *p == reversed) {
        Some(idx) => Ok((idx as u32 + 1, true)),
        None => Err(RecognitionError::UnknownCornerPattern { pattern }),
    }
}

/// The classic style.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicStyle;

impl ClassicStyle {
    fn corner_pattern(&self, page: &PageContext<'_>) -> [u8; 4] {
        let cal = page.calibration;
        let (w, h, pad) = (cal.corner_box_width, cal.corner_box_height, cal.corner_box_padding);
        let (pw, ph) = (page.paper_width(), page.paper_height());
        let positions = [
            (cal.corner_mark_left + pad, cal.corner_mark_top + pad),
            (pw - cal.corner_mark_right - pad - w, cal.corner_mark_top + pad),
            (cal.corner_mark_left + pad, ph - cal.corner_mark_bottom - pad - h),
            (pw - cal.corner_mark_right - pad - w, ph - cal.corner_mark_bottom - pad - h),
        ];
        let mut pattern = [0u8; 4];
        for (bit, (x, y)) in pattern.iter_mut().zip(positions) {
            let coverage = page.coverage(x - HALF_PT, y - HALF_PT, w + PT, h + PT);
            *bit = u8::from(coverage > cal.cornerbox_on_coverage);
        }
        tracing::trace!("corner box pattern {:?}", pattern);
        pattern
    }

    /// Shift `codebox_length` bits read left to right into `code`.
    fn read_codebox(&self, page: &PageContext<'_>, x: f64, y: f64, mut code: u32) -> u32 {
        let cal = page.calibration;
        for i in 0..cal.codebox_length {
            code <<= 1;
            let coverage = page.coverage(
                x + f64::from(i) * cal.codebox_step + cal.codebox_offset,
                y + cal.codebox_offset,
                cal.codebox_step - 2.0 * cal.codebox_offset,
                cal.codebox_height - 2.0 * cal.codebox_offset,
            );
            if coverage > cal.codebox_on_coverage {
                code += 1;
            }
        }
        code
    }

    /// IDs are printed on even pages, or on the only page.
    fn carries_ids(&self, page: &PageContext<'_>) -> bool {
        page.survey.page_count() == 1 || page.page_number.is_some_and(|n| n % 2 == 0)
    }
}

impl PageStyle for ClassicStyle {
    fn get_page_rotation(&self, page: &PageContext<'_>) -> Result<Option<bool>, RecognitionError> {
        let (_, rotated) = corner_pattern_lookup(self.corner_pattern(page))?;
        Ok(Some(rotated))
    }

    fn get_page_number(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        match corner_pattern_lookup(self.corner_pattern(page))? {
            (_, true) => Err(RecognitionError::PageRotated),
            (number, false) => Ok(Some(number)),
        }
    }

    fn get_survey_id(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        if !self.carries_ids(page) {
            return Ok(None);
        }
        let row = page.survey.survey_id_pos(page.calibration);
        let msb = self.read_codebox(page, row.msb_x, row.y, 0);
        Ok(Some(self.read_codebox(page, row.lsb_x, row.y, msb)))
    }

    fn get_questionnaire_id(
        &self,
        page: &PageContext<'_>,
    ) -> Result<Option<String>, RecognitionError> {
        if !self.carries_ids(page) {
            return Ok(None);
        }
        let row = page.survey.questionnaire_id_pos(page.calibration);
        Ok(Some(self.read_codebox(page, row.msb_x, row.y, 0).to_string()))
    }

    fn get_global_id(&self, _page: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::NoBarcodeReader;
    use crate::calibration::Calibration;
    use crate::geometry::Affine2;
    use crate::raster::Bitmap;
    use crate::survey::Survey;
    use crate::test_utils::{
        classic_corner_boxes, classic_id_rects, page_corner_marks, page_matrix, page_size_px,
        render_rects, sample_survey, upside_down_matrix,
    };

    fn render(survey: &Survey, cal: &Calibration, page: u32, qid: Option<u32>, m: &Affine2) -> Bitmap {
        let mut rects = page_corner_marks(survey, cal);
        rects.extend(classic_corner_boxes(survey, cal, page));
        rects.extend(classic_id_rects(survey, cal, survey.survey_id, qid));
        let (w, h) = page_size_px(survey);
        render_rects(w, h, m, &rects)
    }

    fn ctx<'a>(
        bitmap: &'a Bitmap,
        survey: &'a Survey,
        cal: &'a Calibration,
        page_number: Option<u32>,
    ) -> PageContext<'a> {
        PageContext {
            bitmap,
            matrix: page_matrix(),
            survey,
            calibration: cal,
            barcodes: &NoBarcodeReader,
            page_number,
        }
    }

    #[test]
    fn lookup_covers_table_and_reversal() {
        assert_eq!(corner_pattern_lookup([1, 0, 1, 1]).unwrap(), (3, false));
        assert_eq!(corner_pattern_lookup([1, 1, 0, 1]).unwrap(), (3, true));
        assert!(matches!(
            corner_pattern_lookup([1, 1, 1, 1]),
            Err(RecognitionError::UnknownCornerPattern { pattern: [1, 1, 1, 1] })
        ));
    }

    #[test]
    fn reads_page_and_ids_of_upright_page() {
        let survey = sample_survey(2, true);
        let cal = Calibration::default();
        let img = render(&survey, &cal, 2, Some(513), &page_matrix());
        let page = ctx(&img, &survey, &cal, Some(2));

        assert_eq!(ClassicStyle.get_page_rotation(&page).unwrap(), Some(false));
        assert_eq!(ClassicStyle.get_page_number(&page).unwrap(), Some(2));
        assert_eq!(ClassicStyle.get_survey_id(&page).unwrap(), Some(survey.survey_id));
        assert_eq!(ClassicStyle.get_questionnaire_id(&page).unwrap().as_deref(), Some("513"));
        assert_eq!(ClassicStyle.get_global_id(&page).unwrap(), None);
    }

    #[test]
    fn odd_pages_of_long_questionnaires_carry_no_ids() {
        let survey = sample_survey(2, true);
        let cal = Calibration::default();
        let img = render(&survey, &cal, 1, None, &page_matrix());
        let page = ctx(&img, &survey, &cal, Some(1));
        assert_eq!(ClassicStyle.get_page_number(&page).unwrap(), Some(1));
        assert_eq!(ClassicStyle.get_survey_id(&page).unwrap(), None);
        assert_eq!(ClassicStyle.get_questionnaire_id(&page).unwrap(), None);
    }

    #[test]
    fn upside_down_page_reads_as_rotated() {
        let survey = sample_survey(2, true);
        let cal = Calibration::default();
        let m = upside_down_matrix([survey.defs.paper_width, survey.defs.paper_height]);
        let img = render(&survey, &cal, 1, None, &m);
        let page = ctx(&img, &survey, &cal, None);
        assert_eq!(ClassicStyle.get_page_rotation(&page).unwrap(), Some(true));
        assert_eq!(ClassicStyle.get_page_number(&page), Err(RecognitionError::PageRotated));

        let upright = img.rotated180();
        let page = ctx(&upright, &survey, &cal, None);
        assert_eq!(ClassicStyle.get_page_number(&page).unwrap(), Some(1));
    }

    #[test]
    fn blank_page_has_unknown_pattern() {
        let survey = sample_survey(1, false);
        let cal = Calibration::default();
        let (w, h) = page_size_px(&survey);
        let img = Bitmap::from_fn(w, h, |_, _| false);
        let page = ctx(&img, &survey, &cal, None);
        assert!(matches!(
            ClassicStyle.get_page_rotation(&page),
            Err(RecognitionError::UnknownCornerPattern { pattern: [0, 0, 0, 0] })
        ));
    }
}
