//! Synthetic classic-style scans and an in-memory page loader.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use markread::testing::PX_PER_MM;
use markread::testing::{
    classic_corner_boxes, classic_id_rects, outline_rects, page_corner_marks, page_matrix,
    page_size_px, render_rects, upside_down_matrix,
};
use markread::{Bitmap, Calibration, PageLoader, RecognitionError, Rect, SheetImage, Survey};

/// Serves rendered pages by file name and counts the loads.
#[derive(Default)]
pub struct MemoryLoader {
    pages: BTreeMap<PathBuf, Bitmap>,
    pub loads: Cell<usize>,
}

impl MemoryLoader {
    pub fn insert(&mut self, name: &str, page: Bitmap) {
        self.pages.insert(PathBuf::from(name), page);
    }
}

impl PageLoader for MemoryLoader {
    fn load(&self, image: &SheetImage, rotated: bool) -> Result<Bitmap, RecognitionError> {
        self.loads.set(self.loads.get() + 1);
        let page = self
            .pages
            .get(&image.filename)
            .ok_or_else(|| RecognitionError::ImageLoad {
                path: image.filename.clone(),
                message: "no such page".to_string(),
            })?;
        Ok(if rotated {
            page.rotated180()
        } else {
            page.clone()
        })
    }
}

/// Two-page classic survey: a choice question on page 1 and a scale on
/// page 2.
pub fn survey(duplex: bool, page_count: u32) -> Survey {
    let mut qobjects = vec![
        serde_json::json!({"id": [1, 0], "type": "head", "title": "Shopping"}),
        serde_json::json!({
            "id": [1, 1], "type": "choice", "title": "Where do you shop?", "page_number": 1,
            "boxes": [
                {"type": "checkbox", "x": 30.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 60.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 90.0, "y": 60.0, "width": 3.5, "height": 3.5}
            ]
        }),
        serde_json::json!({
            "id": [1, 2], "type": "text", "title": "Anything else?", "page_number": 1,
            "boxes": [{"type": "textbox", "x": 30.0, "y": 100.0, "width": 120.0, "height": 30.0}]
        }),
    ];
    if page_count > 1 {
        qobjects.push(serde_json::json!({
            "id": [2, 1], "type": "mark", "title": "Overall", "page_number": 2,
            "answers": ["poor", "great"],
            "boxes": [
                {"type": "checkbox", "x": 30.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 45.0, "y": 60.0, "width": 3.5, "height": 3.5},
                {"type": "checkbox", "x": 60.0, "y": 60.0, "width": 3.5, "height": 3.5}
            ]
        }));
    }
    let doc = serde_json::json!({
        "schema": markread::SURVEY_SCHEMA,
        "title": "Shop survey",
        "survey_id": 0x0042_1337u32,
        "defs": {
            "paper_width": 210.0,
            "paper_height": 297.0,
            "duplex": duplex,
            "print_survey_id": true,
            "style": "classic"
        },
        "questionnaire": {"page_count": page_count, "qobjects": qobjects}
    });
    Survey::from_json_str(&doc.to_string()).unwrap()
}

/// What to print on a synthetic page.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Ink added on top of the printed form, in mm.
    pub marks: Vec<Rect>,
    /// Print this survey ID instead of the survey's own.
    pub survey_id: Option<u32>,
    /// Questionnaire ID printed next to the survey ID.
    pub questionnaire_id: Option<u32>,
    /// Leave out the corner boxes so the page number cannot be read.
    pub no_corner_boxes: bool,
    pub upside_down: bool,
}

/// Rectangle centred in the checkbox at `(x, y)`.
pub fn cross(x: f64, y: f64) -> Rect {
    Rect::new(x + 0.9, y + 0.9, 1.7, 1.7)
}

/// Render page `page` of `survey` at [`PX_PER_MM`].
pub fn render_page(survey: &Survey, page: u32, opts: &PageOptions) -> Bitmap {
    let cal = Calibration::default();
    let mut rects = page_corner_marks(survey, &cal);
    if !opts.no_corner_boxes {
        rects.extend(classic_corner_boxes(survey, &cal, page));
    }
    if survey.page_count() == 1 || page % 2 == 0 {
        let id = opts.survey_id.unwrap_or(survey.survey_id);
        rects.extend(classic_id_rects(survey, &cal, id, opts.questionnaire_id));
    }
    for b in survey.questionnaire.boxes().filter(|b| b.page_number == page) {
        rects.extend(outline_rects(&b.rect(), b.lw));
    }
    rects.extend_from_slice(&opts.marks);

    let matrix = if opts.upside_down {
        upside_down_matrix([survey.defs.paper_width, survey.defs.paper_height])
    } else {
        page_matrix()
    };
    let (w, h) = page_size_px(survey);
    render_rects(w, h, &matrix, &rects)
}
