//! Page identity styles.
//!
//! A style reads rotation, page number and the printed IDs of one page
//! image. The style is chosen once per survey through [`Style::from_kind`].

mod blank;
mod classic;
mod code128;
mod qr;

pub use blank::BlankStyle;
pub use classic::{corner_pattern_lookup, ClassicStyle, CORNER_BOXES};
pub use code128::Code128Style;
pub use qr::QrStyle;

use crate::barcode::{read_barcode, BarcodeReader, Symbology};
use crate::calibration::Calibration;
use crate::error::{ConfigError, RecognitionError};
use crate::geometry::Affine2;
use crate::raster::{get_coverage, Bitmap};
use crate::survey::{StyleKind, Survey};

/// Everything a style may look at on one page image.
pub struct PageContext<'a> {
    pub bitmap: &'a Bitmap,
    /// mm→px matrix of the page.
    pub matrix: Affine2,
    pub survey: &'a Survey,
    pub calibration: &'a Calibration,
    pub barcodes: &'a dyn BarcodeReader,
    /// Page number once it has been determined.
    pub page_number: Option<u32>,
}

impl PageContext<'_> {
    /// Ink coverage of a mm rectangle.
    pub fn coverage(&self, x: f64, y: f64, width: f64, height: f64) -> f64 {
        get_coverage(self.bitmap, &self.matrix, x, y, width, height)
    }

    /// Decode a barcode inside a mm window.
    pub fn barcode(&self, x: f64, y: f64, width: f64, height: f64, symbology: Symbology) -> Option<String> {
        read_barcode(
            self.bitmap,
            &self.matrix,
            x,
            y,
            width,
            height,
            symbology,
            self.barcodes,
        )
    }

    pub fn paper_width(&self) -> f64 {
        self.survey.defs.paper_width
    }

    pub fn paper_height(&self) -> f64 {
        self.survey.defs.paper_height
    }
}

/// Reads the identity of a page image.
///
/// `Ok(None)` means the value is not printed on this page; an `Err` means it
/// should be there but could not be read.
///
/// # Example
///
/// ```
/// use markread::style::{PageContext, PageStyle};
/// use markread::RecognitionError;
///
/// /// Every page is an upright first page without IDs.
/// struct SinglePage;
///
/// impl PageStyle for SinglePage {
///     fn get_page_rotation(&self, _: &PageContext<'_>) -> Result<Option<bool>, RecognitionError> {
///         Ok(Some(false))
///     }
///     fn get_page_number(&self, _: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
///         Ok(Some(1))
///     }
///     fn get_survey_id(&self, _: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
///         Ok(None)
///     }
///     fn get_questionnaire_id(&self, _: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
///         Ok(None)
///     }
///     fn get_global_id(&self, _: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
///         Ok(None)
///     }
/// }
/// ```
pub trait PageStyle {
    fn get_page_rotation(&self, page: &PageContext<'_>) -> Result<Option<bool>, RecognitionError>;
    /// Page number; the page must already be upright.
    fn get_page_number(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError>;
    fn get_survey_id(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError>;
    fn get_questionnaire_id(&self, page: &PageContext<'_>)
        -> Result<Option<String>, RecognitionError>;
    fn get_global_id(&self, page: &PageContext<'_>) -> Result<Option<String>, RecognitionError>;
}

/// The style of a survey.
pub enum Style {
    Classic(ClassicStyle),
    Code128(Code128Style),
    Qr(QrStyle),
    Custom(Box<dyn PageStyle + Send + Sync>),
}

impl Style {
    /// Build the style named by the survey. `custom` is required for
    /// [`StyleKind::Custom`] and ignored otherwise.
    pub fn from_kind(
        kind: StyleKind,
        custom: Option<Box<dyn PageStyle + Send + Sync>>,
    ) -> Result<Self, ConfigError> {
        Ok(match kind {
            StyleKind::Classic => Self::Classic(ClassicStyle),
            StyleKind::Code128 => Self::Code128(Code128Style),
            StyleKind::Qr => Self::Qr(QrStyle),
            StyleKind::Custom => Self::Custom(custom.ok_or(ConfigError::MissingCustomStyle)?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Classic(_) => "classic",
            Self::Code128(_) => "code128",
            Self::Qr(_) => "qr",
            Self::Custom(_) => "custom",
        }
    }

    fn inner(&self) -> &dyn PageStyle {
        match self {
            Self::Classic(s) => s,
            Self::Code128(s) => s,
            Self::Qr(s) => s,
            Self::Custom(s) => s.as_ref(),
        }
    }
}

impl std::fmt::Debug for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Style").field(&self.name()).finish()
    }
}

impl PageStyle for Style {
    fn get_page_rotation(&self, page: &PageContext<'_>) -> Result<Option<bool>, RecognitionError> {
        self.inner().get_page_rotation(page)
    }

    fn get_page_number(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        self.inner().get_page_number(page)
    }

    fn get_survey_id(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        self.inner().get_survey_id(page)
    }

    fn get_questionnaire_id(
        &self,
        page: &PageContext<'_>,
    ) -> Result<Option<String>, RecognitionError> {
        self.inner().get_questionnaire_id(page)
    }

    fn get_global_id(&self, page: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
        self.inner().get_global_id(page)
    }
}

// ── Barcode content helpers ──────────────────────────────────────────────

/// Page number in the last four digits of a numeric page code.
pub(crate) fn page_from_code(code: &str) -> Option<u32> {
    if code.len() < 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code[code.len() - 4..].parse().ok()
}

/// Survey ID in the digits before the page number.
pub(crate) fn survey_id_from_code(code: &str) -> Option<u32> {
    if code.len() <= 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code[..code.len() - 4].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_style_must_be_supplied() {
        assert!(matches!(
            Style::from_kind(StyleKind::Custom, None),
            Err(ConfigError::MissingCustomStyle)
        ));
        let style = Style::from_kind(StyleKind::Custom, Some(Box::new(BlankStyle))).unwrap();
        assert_eq!(style.name(), "custom");
        assert_eq!(Style::from_kind(StyleKind::Qr, None).unwrap().name(), "qr");
    }

    #[test]
    fn page_codes() {
        assert_eq!(page_from_code("12345670003"), Some(3));
        assert_eq!(page_from_code("0012"), Some(12));
        assert_eq!(page_from_code("12a4"), None);
        assert_eq!(page_from_code("123"), None);
        assert_eq!(survey_id_from_code("12345670003"), Some(1234567));
        assert_eq!(survey_id_from_code("0003"), None);
        assert_eq!(survey_id_from_code("99999999990001"), None);
    }
}
