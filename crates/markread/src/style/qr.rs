//! QR codes in the page quadrants.
//!
//! Same content layout as Code-128; the codes are searched in the
//! bottom-right, bottom-left and bottom-centre quarter windows.

use super::{page_from_code, survey_id_from_code, PageContext, PageStyle};
use crate::barcode::Symbology;
use crate::error::RecognitionError;

/// The QR style.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrStyle;

impl QrStyle {
    /// Decode inside the quarter-size window at fractions `(fx, fy)` of the page.
    fn read_quarter(page: &PageContext<'_>, fx: f64, fy: f64) -> Option<String> {
        let (pw, ph) = (page.paper_width(), page.paper_height());
        page.barcode(pw * fx, ph * fy, pw * 0.25, ph * 0.25, Symbology::Qr)
    }

    fn bottom_right(page: &PageContext<'_>) -> Option<String> {
        Self::read_quarter(page, 0.75, 0.75)
    }
}

impl PageStyle for QrStyle {
    fn get_page_rotation(&self, page: &PageContext<'_>) -> Result<Option<bool>, RecognitionError> {
        if Self::bottom_right(page).is_some() {
            return Ok(Some(false));
        }
        if Self::read_quarter(page, 0.0, 0.0).is_some() {
            return Ok(Some(true));
        }
        Ok(None)
    }

    fn get_page_number(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        let code = Self::bottom_right(page).ok_or_else(|| RecognitionError::BarcodeUnreadable {
            symbology: Symbology::Qr.as_str().to_string(),
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
        Ok(Self::read_quarter(page, 0.0, 0.75))
    }

    fn get_global_id(&self, page: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
        Ok(Self::read_quarter(page, 0.375, 0.75))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::BarcodeReader;
    use crate::calibration::Calibration;
    use crate::raster::Bitmap;
    use crate::test_utils::{page_matrix, sample_survey};
    use std::cell::RefCell;

    /// Records the pixel size of every window it is handed.
    struct Windows {
        answer: Option<&'static str>,
        seen: RefCell<Vec<(u32, u32)>>,
    }

    impl BarcodeReader for Windows {
        fn decode(&self, bitmap: &Bitmap, symbology: Symbology) -> Option<String> {
            assert_eq!(symbology, Symbology::Qr);
            self.seen.borrow_mut().push(bitmap.dimensions());
            self.answer.map(str::to_string)
        }
    }

    #[test]
    fn quarter_windows() {
        let survey = sample_survey(1, false);
        let cal = Calibration::default();
        let img = Bitmap::from_fn(1050, 1485, |_, _| false);
        let reader = Windows {
            answer: Some("42133370001"),
            seen: RefCell::new(Vec::new()),
        };
        let page = PageContext {
            bitmap: &img,
            matrix: page_matrix(),
            survey: &survey,
            calibration: &cal,
            barcodes: &reader,
            page_number: None,
        };
        assert_eq!(QrStyle.get_page_rotation(&page).unwrap(), Some(false));
        assert_eq!(QrStyle.get_page_number(&page).unwrap(), Some(1));
        assert_eq!(QrStyle.get_global_id(&page).unwrap().as_deref(), Some("42133370001"));
        let seen = reader.seen.borrow();
        assert_eq!(seen.len(), 3);
        // 52.5 x 74.25 mm at 5 px/mm, rounded outwards.
        assert!(seen.iter().all(|&(w, h)| (263..=264).contains(&w) && (372..=373).contains(&h)));
    }

    #[test]
    fn nothing_decoded() {
        let survey = sample_survey(1, false);
        let cal = Calibration::default();
        let img = Bitmap::from_fn(1050, 1485, |_, _| false);
        let reader = Windows {
            answer: None,
            seen: RefCell::new(Vec::new()),
        };
        let page = PageContext {
            bitmap: &img,
            matrix: page_matrix(),
            survey: &survey,
            calibration: &cal,
            barcodes: &reader,
            page_number: None,
        };
        assert_eq!(QrStyle.get_page_rotation(&page).unwrap(), None);
        assert!(QrStyle.get_page_number(&page).is_err());
        assert_eq!(QrStyle.get_questionnaire_id(&page).unwrap(), None);
    }
}
