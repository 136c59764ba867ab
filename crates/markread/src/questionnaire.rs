//! Static layout model: questionnaire → objects → boxes.
//!
//! Loaded once with the survey and read-only afterwards. Runtime
//! measurements are kept per sheet in [`crate::data::BoxData`], keyed by
//! [`BoxId`].

use std::collections::BTreeMap;
use std::fmt;

use crate::data::BoxData;
use crate::geometry::Rect;
use crate::raster::MaskShape;

/// Identifier of a questionnaire object, `(major, minor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct QObjectId(pub u32, pub u32);

/// Identifier of a box: its question id plus a 1-based index.
///
/// Serialized as `"major.minor.index"` so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BoxId {
    pub question: QObjectId,
    pub index: u32,
}

impl fmt::Display for QObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.question, self.index)
    }
}

impl From<BoxId> for String {
    fn from(id: BoxId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for BoxId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let parts: Vec<u32> = s
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|e| format!("box id '{}': {}", s, e)))
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [major, minor, index] => Ok(BoxId {
                question: QObjectId(*major, *minor),
                index: *index,
            }),
            _ => Err(format!("box id '{}' needs three components", s)),
        }
    }
}

/// Default printed line width (1 pt).
fn default_line_width() -> f64 {
    25.4 / 72.0
}

/// Kind-specific part of a box.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoxKind {
    Checkbox {
        #[serde(default)]
        form: MaskShape,
    },
    Textbox,
    /// A barcode printed or written into the form and decoded as text.
    Codebox,
}

/// One box with its nominal geometry in millimetres.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoxSpec {
    #[serde(skip)]
    pub id: BoxId,
    /// Answer value; defaults to the 1-based position in the question.
    #[serde(default)]
    pub value: Option<i64>,
    /// Page the box is printed on; `0` inherits the question's page.
    #[serde(default)]
    pub page_number: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_line_width")]
    pub lw: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub var: Option<String>,
    #[serde(flatten)]
    pub kind: BoxKind,
}

impl BoxSpec {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Answer value (always set after [`Questionnaire::finalize`]).
    pub fn value(&self) -> i64 {
        self.value.unwrap_or(i64::from(self.id.index))
    }

    pub fn is_checkbox(&self) -> bool {
        matches!(self.kind, BoxKind::Checkbox { .. })
    }
}

/// Kind-specific part of a questionnaire object.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QObjectKind {
    Head,
    /// Any number of boxes may be checked.
    Choice,
    /// Exactly one box is expected.
    #[serde(rename = "option")]
    SingleChoice,
    /// A scale; boxes `range[0]..=range[1]` carry numeric values.
    Range {
        range: [usize; 2],
        #[serde(default)]
        answers: [String; 2],
    },
    /// A scale over every box.
    Mark {
        #[serde(default)]
        answers: [String; 2],
    },
    Text,
    AdditionalHead,
    /// A value entered after recognition, not printed as boxes.
    AdditionalMark {
        #[serde(default)]
        answers: Vec<String>,
    },
}

/// A heading or question with its boxes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QObject {
    pub id: QObjectId,
    #[serde(flatten)]
    pub kind: QObjectKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub var: Option<String>,
    #[serde(default)]
    pub boxes: Vec<BoxSpec>,
}

/// Value of a single-answer question with no box checked.
pub const VALUE_NONE: i64 = 0;
/// Value of a single-answer question with several boxes checked.
pub const VALUE_INVALID: i64 = -1;

/// The answer of one question on one sheet.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Answer {
    /// Values of every checked box.
    Multiple(Vec<i64>),
    /// One value, [`VALUE_NONE`] or [`VALUE_INVALID`].
    Single(i64),
    /// Decoded text, or whether anything was written.
    Text(Option<String>, bool),
}

impl QObject {
    pub fn is_question(&self) -> bool {
        !matches!(self.kind, QObjectKind::Head | QObjectKind::AdditionalHead)
    }

    /// Box values that form the numeric scale of a range or mark question.
    pub fn range_values(&self) -> Vec<i64> {
        match &self.kind {
            QObjectKind::Range { range, .. } => self
                .boxes
                .iter()
                .skip(range[0])
                .take(range[1].saturating_sub(range[0]) + 1)
                .map(BoxSpec::value)
                .collect(),
            QObjectKind::Mark { .. } => self.boxes.iter().map(BoxSpec::value).collect(),
            _ => Vec::new(),
        }
    }

    fn checked(&self, data: &BTreeMap<BoxId, BoxData>) -> Vec<i64> {
        self.boxes
            .iter()
            .filter(|b| data.get(&b.id).is_some_and(|d| d.state))
            .map(BoxSpec::value)
            .collect()
    }

    /// The answer given on a sheet, `None` for objects without answers.
    pub fn answer(&self, data: &BTreeMap<BoxId, BoxData>) -> Option<Answer> {
        match &self.kind {
            QObjectKind::Choice => Some(Answer::Multiple(self.checked(data))),
            QObjectKind::SingleChoice | QObjectKind::Range { .. } | QObjectKind::Mark { .. } => {
                let checked = self.checked(data);
                Some(Answer::Single(match checked.as_slice() {
                    [] => VALUE_NONE,
                    [one] => *one,
                    _ => VALUE_INVALID,
                }))
            }
            QObjectKind::Text => {
                let mut text = String::new();
                let mut filled = false;
                for b in &self.boxes {
                    if let Some(d) = data.get(&b.id) {
                        filled |= d.state;
                        if let Some(t) = &d.text {
                            text.push_str(t);
                        }
                    }
                }
                Some(Answer::Text((!text.is_empty()).then_some(text), filled))
            }
            _ => None,
        }
    }
}

/// The printed questionnaire.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Questionnaire {
    pub page_count: u32,
    #[serde(default)]
    pub qobjects: Vec<QObject>,
}

impl Questionnaire {
    /// Assign box ids, default values and inherited page numbers.
    pub fn finalize(&mut self) {
        for q in &mut self.qobjects {
            for (i, b) in q.boxes.iter_mut().enumerate() {
                b.id = BoxId {
                    question: q.id,
                    index: i as u32 + 1,
                };
                if b.value.is_none() {
                    b.value = Some(i as i64 + 1);
                }
                if b.page_number == 0 {
                    b.page_number = q.page_number;
                }
            }
        }
    }

    pub fn boxes(&self) -> impl Iterator<Item = &BoxSpec> {
        self.qobjects.iter().flat_map(|q| q.boxes.iter())
    }

    pub fn find_box(&self, id: BoxId) -> Option<&BoxSpec> {
        self.boxes().find(|b| b.id == id)
    }

    pub fn find_qobject(&self, id: QObjectId) -> Option<&QObject> {
        self.qobjects.iter().find(|q| q.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Questionnaire {
        let mut q: Questionnaire = serde_json::from_value(serde_json::json!({
            "page_count": 1,
            "qobjects": [
                {"id": [1, 0], "type": "head", "title": "General"},
                {"id": [1, 1], "type": "option", "title": "Gender", "page_number": 1,
                 "boxes": [
                    {"type": "checkbox", "x": 20.0, "y": 40.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 40.0, "y": 40.0, "width": 3.5, "height": 3.5, "form": "ellipse"}
                 ]},
                {"id": [1, 2], "type": "range", "range": [0, 2], "page_number": 1,
                 "boxes": [
                    {"type": "checkbox", "x": 20.0, "y": 60.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 30.0, "y": 60.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 40.0, "y": 60.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 60.0, "y": 60.0, "width": 3.5, "height": 3.5, "value": 0}
                 ]},
                {"id": [1, 3], "type": "text", "page_number": 1,
                 "boxes": [{"type": "textbox", "x": 20.0, "y": 80.0, "width": 170.0, "height": 20.0}]}
            ]
        }))
        .unwrap();
        q.finalize();
        q
    }

    fn checked(ids: &[BoxId]) -> BTreeMap<BoxId, BoxData> {
        ids.iter()
            .map(|&id| {
                let mut d = BoxData::default();
                d.state = true;
                (id, d)
            })
            .collect()
    }

    #[test]
    fn finalize_assigns_ids_and_pages() {
        let q = sample();
        let b = &q.qobjects[1].boxes[1];
        assert_eq!(b.id.to_string(), "1.1.2");
        assert_eq!(b.value(), 2);
        assert_eq!(b.page_number, 1);
        assert_eq!(b.kind, BoxKind::Checkbox { form: MaskShape::Ellipse });
        assert_eq!(q.qobjects[2].boxes[3].value(), 0);
    }

    #[test]
    fn box_id_parses_back() {
        let id = BoxId::try_from("3.14.2".to_string()).unwrap();
        assert_eq!(id.question, QObjectId(3, 14));
        assert_eq!(id.index, 2);
        assert!(BoxId::try_from("3.x.2".to_string()).is_err());
        assert!(BoxId::try_from("3.2".to_string()).is_err());
    }

    #[test]
    fn single_answers() {
        let q = sample();
        let option = &q.qobjects[1];
        let ids: Vec<BoxId> = option.boxes.iter().map(|b| b.id).collect();
        assert_eq!(option.answer(&checked(&[])), Some(Answer::Single(VALUE_NONE)));
        assert_eq!(option.answer(&checked(&ids[1..])), Some(Answer::Single(2)));
        assert_eq!(option.answer(&checked(&ids)), Some(Answer::Single(VALUE_INVALID)));
        assert_eq!(q.qobjects[0].answer(&checked(&[])), None);
    }

    #[test]
    fn range_values_exclude_extra_boxes() {
        let q = sample();
        assert_eq!(q.qobjects[2].range_values(), vec![1, 2, 3]);
    }
}
