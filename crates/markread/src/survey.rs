//! Survey definition: paper, marking style and questionnaire.

use std::collections::BTreeMap;
use std::path::Path;

use crate::calibration::Calibration;
use crate::error::ConfigError;
use crate::questionnaire::{BoxKind, Questionnaire};

/// Schema tag of a survey definition document.
pub const SURVEY_SCHEMA: &str = "markread.survey.v1";

/// How page identity is printed on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    /// Corner boxes plus bit-box codes.
    #[default]
    Classic,
    Code128,
    Qr,
    /// Identity decoded by an externally supplied implementation.
    Custom,
}

impl StyleKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Code128 => "code128",
            Self::Qr => "qr",
            Self::Custom => "custom",
        }
    }
}

/// Which checkbox metric table applies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Checked boxes; a filled box cancels a check.
    #[default]
    CheckCorrect,
    Check,
    Fill,
}

impl CheckMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckCorrect => "checkcorrect",
            Self::Check => "check",
            Self::Fill => "fill",
        }
    }
}

fn default_engine() -> String {
    "pdflatex".to_string()
}

/// Settings fixed when the survey is set up.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SurveyDefs {
    pub paper_width: f64,
    pub paper_height: f64,
    #[serde(default)]
    pub print_questionnaire_id: bool,
    #[serde(default)]
    pub print_survey_id: bool,
    #[serde(default)]
    pub style: StyleKind,
    #[serde(default)]
    pub duplex: bool,
    #[serde(default)]
    pub checkmode: CheckMode,
    /// Typesetting engine used for stamping; ignored by recognition.
    #[serde(default = "default_engine")]
    pub engine: String,
}

impl Default for SurveyDefs {
    fn default() -> Self {
        Self {
            paper_width: 210.0,
            paper_height: 297.0,
            print_questionnaire_id: false,
            print_survey_id: true,
            style: StyleKind::Classic,
            duplex: true,
            checkmode: CheckMode::CheckCorrect,
            engine: default_engine(),
        }
    }
}

/// Classic-style codebox row: left (msb) and right (lsb) x, and y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeboxRow {
    pub msb_x: f64,
    pub lsb_x: f64,
    pub y: f64,
}

fn survey_schema() -> String {
    SURVEY_SCHEMA.to_string()
}

/// A survey definition document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Survey {
    #[serde(default = "survey_schema")]
    pub schema: String,
    #[serde(default)]
    pub title: String,
    /// Expected survey ID printed on every sheet.
    #[serde(default)]
    pub survey_id: u32,
    #[serde(default)]
    pub global_id: Option<String>,
    pub defs: SurveyDefs,
    pub questionnaire: Questionnaire,
    #[serde(default)]
    pub info: BTreeMap<String, String>,
}

impl Survey {
    pub fn new(defs: SurveyDefs, mut questionnaire: Questionnaire) -> Self {
        questionnaire.finalize();
        Self {
            schema: survey_schema(),
            title: String::new(),
            survey_id: 0,
            global_id: None,
            defs,
            questionnaire,
            info: BTreeMap::new(),
        }
    }

    /// Parse a survey document and check its schema tag.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let mut survey: Survey = serde_json::from_str(text)?;
        if survey.schema != SURVEY_SCHEMA {
            return Err(ConfigError::UnsupportedSchema {
                found: survey.schema,
                expected: SURVEY_SCHEMA,
            });
        }
        survey.questionnaire.finalize();
        Ok(survey)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn write_json_file(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn page_count(&self) -> u32 {
        self.questionnaire.page_count
    }

    /// Scan images per sheet: one per page in duplex mode, otherwise each
    /// page followed by a dummy back side.
    pub fn images_per_sheet(&self) -> usize {
        let pages = self.page_count() as usize;
        if self.defs.duplex {
            pages
        } else {
            pages * 2
        }
    }

    /// Sanity checks on the survey settings.
    pub fn check_settings(&self) -> Result<(), ConfigError> {
        if self.defs.duplex && self.page_count() % 2 != 0 {
            return Err(ConfigError::InvalidSettings(
                "a questionnaire printed in duplex needs an even number of pages".to_string(),
            ));
        }
        if self.defs.style == StyleKind::Classic && self.page_count() > 6 {
            return Err(ConfigError::InvalidSettings(
                "the classic style supports at most six pages; use code128 or qr for more"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Survey ID derived from the box positions and the survey settings.
    ///
    /// Only geometry enters the hash, so text edits keep the ID stable.
    pub fn calculate_survey_id(&self) -> u32 {
        let mut ctx = md5::Context::new();
        for q in self.questionnaire.qobjects.iter().filter(|q| q.is_question()) {
            for b in &q.boxes {
                for v in [b.x, b.y, b.width, b.height] {
                    ctx.consume((v as f32).to_be_bytes());
                }
                if let BoxKind::Checkbox { form } = b.kind {
                    let form = match form {
                        crate::raster::MaskShape::Box => "box",
                        crate::raster::MaskShape::Ellipse => "ellipse",
                    };
                    ctx.consume(form.as_bytes());
                }
            }
        }

        let defs = &self.defs;
        let round1 = |v: f64| format!("{:?}", (v * 10.0).round() / 10.0);
        let py_bool = |b: bool| if b { "True" } else { "False" };
        ctx.consume(round1(defs.paper_width).as_bytes());
        ctx.consume(round1(defs.paper_height).as_bytes());
        ctx.consume(py_bool(defs.print_questionnaire_id).as_bytes());
        ctx.consume(py_bool(defs.print_survey_id).as_bytes());
        ctx.consume(defs.style.as_str().as_bytes());
        ctx.consume(py_bool(defs.duplex).as_bytes());
        // Surveys created before check modes existed hash without it.
        if defs.checkmode != CheckMode::CheckCorrect {
            ctx.consume(defs.checkmode.as_str().as_bytes());
        }

        let digest = ctx.compute();
        u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
    }

    /// Position of the classic survey ID codeboxes.
    pub fn survey_id_pos(&self, cal: &Calibration) -> CodeboxRow {
        let y = self.defs.paper_height
            - cal.corner_mark_bottom
            - cal.corner_box_padding
            - cal.codebox_height;
        let left = cal.corner_mark_left + 2.0 * cal.corner_box_padding + cal.corner_box_width;
        let right = cal.corner_mark_right + 2.0 * cal.corner_box_padding + cal.corner_box_width;
        CodeboxRow {
            msb_x: left,
            lsb_x: self.defs.paper_width - right - cal.codebox_width(),
            y,
        }
    }

    /// Position of the classic questionnaire ID codeboxes; one row above the
    /// survey ID when that is printed too.
    pub fn questionnaire_id_pos(&self, cal: &Calibration) -> CodeboxRow {
        let mut row = self.survey_id_pos(cal);
        if self.defs.print_survey_id {
            row.y -= cal.codebox_height + cal.corner_box_padding;
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn survey_json(schema: &str) -> String {
        format!(
            r#"{{
                "schema": "{schema}",
                "title": "Test",
                "defs": {{"paper_width": 210.0, "paper_height": 297.0, "duplex": false,
                          "print_survey_id": true}},
                "questionnaire": {{
                    "page_count": 1,
                    "qobjects": [
                        {{"id": [1, 1], "type": "choice", "page_number": 1,
                          "boxes": [{{"type": "checkbox", "x": 20.0, "y": 40.0,
                                      "width": 3.5, "height": 3.5}}]}}
                    ]
                }}
            }}"#
        )
    }

    #[test]
    fn loads_and_checks_schema() {
        let s = Survey::from_json_str(&survey_json(SURVEY_SCHEMA)).unwrap();
        assert_eq!(s.page_count(), 1);
        assert_eq!(s.images_per_sheet(), 2);
        assert_eq!(s.questionnaire.qobjects[0].boxes[0].id.to_string(), "1.1.1");

        let err = Survey::from_json_str(&survey_json("other.v9")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedSchema { .. }));
    }

    #[test]
    fn unknown_root_fields_are_rejected() {
        let text = survey_json(SURVEY_SCHEMA).replacen('{', r#"{"bogus": 1,"#, 1);
        assert!(matches!(Survey::from_json_str(&text), Err(ConfigError::Json(_))));
    }

    #[test]
    fn settings_checks() {
        let mut s = Survey::from_json_str(&survey_json(SURVEY_SCHEMA)).unwrap();
        s.defs.duplex = true;
        assert!(s.check_settings().is_err());
        s.questionnaire.page_count = 8;
        assert!(s.check_settings().is_err());
        s.defs.style = StyleKind::Code128;
        assert!(s.check_settings().is_ok());
    }

    #[test]
    fn survey_id_depends_on_geometry_only() {
        let mut s = Survey::from_json_str(&survey_json(SURVEY_SCHEMA)).unwrap();
        let id = s.calculate_survey_id();
        assert_eq!(id, s.calculate_survey_id());

        s.title = "Renamed".to_string();
        s.questionnaire.qobjects[0].title = "Other question text".to_string();
        assert_eq!(id, s.calculate_survey_id());

        s.questionnaire.qobjects[0].boxes[0].x = 21.0;
        assert_ne!(id, s.calculate_survey_id());
    }

    #[test]
    fn classic_codebox_rows() {
        let mut s = Survey::from_json_str(&survey_json(SURVEY_SCHEMA)).unwrap();
        let cal = Calibration::default();
        let sid = s.survey_id_pos(&cal);
        assert_abs_diff_eq!(sid.msb_x, 18.5);
        assert_abs_diff_eq!(sid.lsb_x, 210.0 - 18.5 - 56.0);
        assert_abs_diff_eq!(sid.y, 297.0 - 12.0 - 1.5 - 3.5);

        let qid = s.questionnaire_id_pos(&cal);
        assert_abs_diff_eq!(qid.y, sid.y - 5.0);
        s.defs.print_survey_id = false;
        assert_abs_diff_eq!(s.questionnaire_id_pos(&cal).y, sid.y);
    }
}
