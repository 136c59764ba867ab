use super::{PageContext, PageStyle};
use crate::error::RecognitionError;

/// Custom style for forms without any identity marks.
///
/// Every image is taken as an upright first page of the expected survey.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlankStyle;

impl PageStyle for BlankStyle {
    fn get_page_rotation(&self, _page: &PageContext<'_>) -> Result<Option<bool>, RecognitionError> {
        Ok(Some(false))
    }

    fn get_page_number(&self, _page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        Ok(Some(1))
    }

    fn get_survey_id(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
        Ok(Some(page.survey.survey_id))
    }

    fn get_questionnaire_id(
        &self,
        _page: &PageContext<'_>,
    ) -> Result<Option<String>, RecognitionError> {
        Ok(None)
    }

    fn get_global_id(&self, _page: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
        Ok(None)
    }
}
