//! Per-sheet box measurements and change notification.

use std::collections::BTreeMap;
use std::sync::mpsc::Sender;

use crate::geometry::Rect;
use crate::questionnaire::{BoxId, BoxSpec};

/// Recognition result of one box on one sheet.
///
/// Geometry is the measured position in millimetres; it equals the nominal
/// box until recognition moves it.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct BoxData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub state: bool,
    pub quality: f64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// Decoded codebox content.
    #[serde(default)]
    pub text: Option<String>,
}

impl BoxData {
    /// Unmeasured data at the nominal position.
    pub fn nominal(spec: &BoxSpec) -> Self {
        Self {
            x: spec.x,
            y: spec.y,
            width: spec.width,
            height: spec.height,
            state: false,
            quality: 1.0,
            metrics: BTreeMap::new(),
            text: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_rect(&mut self, r: &Rect) {
        self.x = r.x;
        self.y = r.y;
        self.width = r.width;
        self.height = r.height;
    }

    /// Fields that differ from `old`, with their old values.
    pub fn changed_fields(&self, old: &BoxData) -> Vec<(&'static str, serde_json::Value)> {
        let mut out = Vec::new();
        if self.state != old.state {
            out.push(("state", serde_json::json!(old.state)));
        }
        if self.quality != old.quality {
            out.push(("quality", serde_json::json!(old.quality)));
        }
        if self.rect() != old.rect() {
            out.push(("geometry", serde_json::json!([old.x, old.y, old.width, old.height])));
        }
        if self.metrics != old.metrics {
            out.push(("metrics", serde_json::json!(old.metrics)));
        }
        if self.text != old.text {
            out.push(("text", serde_json::json!(old.text)));
        }
        out
    }
}

/// Object whose field changed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOwner {
    Sheet,
    Image(usize),
    Box(BoxId),
}

/// A field of a sheet, image or box changed value.
#[derive(Debug, Clone, PartialEq)]
pub struct DataChanged {
    pub owner: ChangeOwner,
    pub field: &'static str,
    pub old_value: serde_json::Value,
}

/// Receiving end of change notifications, typically a GUI.
pub type DataObserver = Sender<DataChanged>;
