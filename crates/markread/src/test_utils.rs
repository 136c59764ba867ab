//! Shared fixtures for unit tests.

pub(crate) use crate::testing::*;

use crate::survey::{Survey, SurveyDefs};

/// One- or two-page classic survey with a few checkboxes and a textbox.
pub(crate) fn sample_survey(page_count: u32, duplex: bool) -> Survey {
    let mut qobjects = vec![
        serde_json::json!({"id": [1, 0], "type": "head", "title": "About you"}),
        serde_json::json!({
            "id": [1, 1], "type": "choice", "title": "Channels", "page_number": 1,
            "boxes": [
                {"type": "checkbox", "x": 30.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 60.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 90.0, "y": 60.0, "width": 3.5, "height": 3.5, "form": "ellipse"}
            ]
        }),
        serde_json::json!({
            "id": [1, 2], "type": "text", "title": "Comments", "page_number": 1,
            "boxes": [{"type": "textbox", "x": 30.0, "y": 100.0, "width": 120.0, "height": 30.0}]
        }),
    ];
    if page_count > 1 {
        qobjects.push(serde_json::json!({
            "id": [2, 1], "type": "mark", "title": "Overall", "page_number": 2,
            "answers": ["bad", "good"],
            "boxes": [
                {"type": "checkbox", "x": 30.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 45.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 60.0, "y": 60.0, "width": 3.5, "height": 3.5}
            ]
        }));
    }
    let questionnaire = serde_json::from_value(serde_json::json!({
        "page_count": page_count,
        "qobjects": qobjects,
    }))
    .expect("sample questionnaire");
    let defs = SurveyDefs {
        duplex,
        ..SurveyDefs::default()
    };
    let mut survey = Survey::new(defs, questionnaire);
    survey.survey_id = 0x0042_1337;
    survey
}
