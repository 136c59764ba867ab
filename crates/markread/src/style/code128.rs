//! Code-128 barcodes along the bottom edge.
//!
//! The page code (survey ID digits followed by a four digit page number)
//! sits bottom right, the questionnaire ID bottom left and the global ID in
//! the bottom centre. An upside-down page shows its page code top left.

use super::{page_from_code, survey_id_from_code, PageContext, PageStyle};
use crate::barcode::Symbology;
use crate::error::RecognitionError;

/// The Code-128 style.
#[derive(Debug, Clone, Copy, Default)]
pub struct Code128Style;

impl Code128Style {
    /// Height of the barcode strip and its top edge.
    fn strip(page: &PageContext<'_>) -> (f64, f64) {
        let cal = page.calibration;
        let height = cal.corner_mark_bottom + cal.code128_vpad + cal.code128_height + 5.0;
        (page.paper_height() - height, height)
    }

    fn read_at(page: &PageContext<'_>, x: f64, y: f64) -> Option<String> {
        let (_, height) = Self::strip(page);
        page.barcode(x, y, page.paper_width() / 2.0, height, Symbology::Code128)
    }

    fn bottom_right(page: &PageContext<'_>) -> Option<String> {
        let (top, _) = Self::strip(page);
        Self::read_at(page, page.paper_width() / 2.0, top)
    }
}

impl PageStyle for Code128Style {
    fn get_page_rotation(&self, page: &PageContext<'_>) -> Result<Option<bool>, RecognitionError> {
        if Self::bottom_right(page).is_some() {
            return Ok(Some(false));
        }
        if Self::read_at(page, 0.0, 0.0).is_some() {
            return Ok(Some(true));
        }
        Ok(None)
    }

    fn get_page_number(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        let code = Self::bottom_right(page).ok_or_else(|| RecognitionError::BarcodeUnreadable {
            symbology: Symbology::Code128.as_str().to_string(),
        })?;
        Ok(page_from_code(&code))
    }

    fn get_survey_id(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        Ok(Self::bottom_right(page).as_deref().and_then(survey_id_from_code))
    }

    fn get_questionnaire_id(
        &self,
        page: &PageContext<'_>,
    ) -> Result<Option<String>, RecognitionError> {
        let (top, _) = Self::strip(page);
        Ok(Self::read_at(page, 0.0, top))
    }

    fn get_global_id(&self, page: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
        let (top, _) = Self::strip(page);
        Ok(Self::read_at(page, page.paper_width() / 4.0, top))
    }
}
