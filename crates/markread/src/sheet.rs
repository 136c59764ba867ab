//! Scanned sheets and their page images.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::data::{BoxData, ChangeOwner, DataChanged, DataObserver};
use crate::geometry::Affine2;
use crate::questionnaire::BoxId;

/// File name of the placeholder back side added to simplex scans.
pub const DUMMY_FILENAME: &str = "DUMMY";

/// One page of a scan file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    pub file: PathBuf,
    /// Zero-based page within the file.
    pub page: u32,
}

impl ScanPage {
    pub fn new(file: impl Into<PathBuf>, page: u32) -> Self {
        Self {
            file: file.into(),
            page,
        }
    }
}

/// One scanned page.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SheetImage {
    pub filename: PathBuf,
    /// Page within a multi-page file.
    #[serde(default)]
    pub tiff_page: u32,
    /// `None` until rotation detection ran.
    #[serde(default)]
    pub rotated: Option<bool>,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub survey_id: Option<u32>,
    #[serde(default)]
    pub questionnaire_id: Option<String>,
    #[serde(default)]
    pub global_id: Option<String>,
    /// Blank back side or placeholder; skipped by recognition.
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub verified: bool,
    /// px→mm matrix once the corner marks were found.
    #[serde(default)]
    pub raw_matrix: Option<Affine2>,
    /// Pixel size of the loaded image.
    #[serde(default)]
    pub size_px: Option<[u32; 2]>,
}

impl SheetImage {
    pub fn new(filename: impl Into<PathBuf>, tiff_page: u32) -> Self {
        let filename = filename.into();
        let ignored = filename == Path::new(DUMMY_FILENAME);
        Self {
            filename,
            tiff_page,
            rotated: None,
            page_number: None,
            survey_id: None,
            questionnaire_id: None,
            global_id: None,
            ignored,
            verified: false,
            raw_matrix: None,
            size_px: None,
        }
    }

    pub fn dummy() -> Self {
        Self::new(DUMMY_FILENAME, 0)
    }

    pub fn is_dummy(&self) -> bool {
        self.filename == Path::new(DUMMY_FILENAME)
    }

    /// px→mm matrix. Without detected marks and with `fallback`, the raw
    /// pixel extent is scaled onto the paper.
    pub fn px_to_mm(&self, fallback: bool, paper: [f64; 2]) -> Option<Affine2> {
        if let Some(m) = self.raw_matrix {
            return Some(m);
        }
        if !fallback {
            return None;
        }
        let [w, h] = self.size_px?;
        if w == 0 || h == 0 {
            return None;
        }
        Some(Affine2::scale(paper[0] / f64::from(w), paper[1] / f64::from(h)))
    }

    /// mm→px matrix, the inverse of [`SheetImage::px_to_mm`].
    pub fn mm_to_px(&self, fallback: bool, paper: [f64; 2]) -> Option<Affine2> {
        self.px_to_mm(fallback, paper)?.inverse()
    }

    /// Recognition fields that differ from `old`, with their old values.
    pub fn changed_fields(&self, old: &SheetImage) -> Vec<(&'static str, serde_json::Value)> {
        let mut out = Vec::new();
        if self.rotated != old.rotated {
            out.push(("rotated", serde_json::json!(old.rotated)));
        }
        if self.page_number != old.page_number {
            out.push(("page_number", serde_json::json!(old.page_number)));
        }
        if self.survey_id != old.survey_id {
            out.push(("survey_id", serde_json::json!(old.survey_id)));
        }
        if self.questionnaire_id != old.questionnaire_id {
            out.push(("questionnaire_id", serde_json::json!(old.questionnaire_id)));
        }
        if self.global_id != old.global_id {
            out.push(("global_id", serde_json::json!(old.global_id)));
        }
        if self.ignored != old.ignored {
            out.push(("ignored", serde_json::json!(old.ignored)));
        }
        if self.verified != old.verified {
            out.push(("verified", serde_json::json!(old.verified)));
        }
        if self.raw_matrix != old.raw_matrix {
            out.push(("raw_matrix", serde_json::json!(old.raw_matrix.map(|m| m.params()))));
        }
        out
    }
}

/// One physical questionnaire instance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Sheet {
    pub images: Vec<SheetImage>,
    #[serde(default)]
    pub data: BTreeMap<BoxId, BoxData>,
    #[serde(default)]
    pub survey_id: Option<u32>,
    #[serde(default)]
    pub questionnaire_id: Option<String>,
    #[serde(default)]
    pub global_id: Option<String>,
    pub valid: bool,
    pub quality: f64,
    #[serde(default)]
    pub recognized: bool,
    #[serde(default)]
    pub review_comment: Option<String>,
    #[serde(skip)]
    observer: Option<DataObserver>,
}

impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.images == other.images
            && self.data == other.data
            && self.survey_id == other.survey_id
            && self.questionnaire_id == other.questionnaire_id
            && self.global_id == other.global_id
            && self.valid == other.valid
            && self.quality == other.quality
            && self.recognized == other.recognized
            && self.review_comment == other.review_comment
    }
}

impl Sheet {
    pub fn new(images: Vec<SheetImage>) -> Self {
        Self {
            images,
            data: BTreeMap::new(),
            survey_id: None,
            questionnaire_id: None,
            global_id: None,
            valid: true,
            quality: 1.0,
            recognized: false,
            review_comment: None,
            observer: None,
        }
    }

    /// Group scan files into sheets of `images_per_sheet` images. In simplex
    /// mode every scan is followed by a dummy back side. Trailing scans that
    /// do not fill a sheet are returned separately.
    pub fn from_scans(
        files: &[PathBuf],
        duplex: bool,
        images_per_sheet: usize,
    ) -> (Vec<Sheet>, Vec<PathBuf>) {
        let pages: Vec<ScanPage> = files.iter().map(|f| ScanPage::new(f.clone(), 0)).collect();
        let (sheets, leftover) = Self::from_scan_pages(&pages, !duplex, images_per_sheet);
        (sheets, leftover.into_iter().map(|p| p.file).collect())
    }

    /// Group scanned pages into sheets of `images_per_sheet` images, with a
    /// dummy back side after every page when `insert_dummies` is set.
    /// Trailing pages that do not fill a sheet are returned separately.
    pub fn from_scan_pages(
        pages: &[ScanPage],
        insert_dummies: bool,
        images_per_sheet: usize,
    ) -> (Vec<Sheet>, Vec<ScanPage>) {
        if images_per_sheet == 0 {
            return (Vec::new(), pages.to_vec());
        }
        let mut images = Vec::new();
        for p in pages {
            images.push(SheetImage::new(p.file.clone(), p.page));
            if insert_dummies {
                images.push(SheetImage::dummy());
            }
        }

        let full = images.len() / images_per_sheet * images_per_sheet;
        let leftover = images[full..]
            .iter()
            .filter(|i| !i.is_dummy())
            .map(|i| ScanPage::new(i.filename.clone(), i.tiff_page))
            .collect();
        let sheets = images[..full]
            .chunks(images_per_sheet)
            .map(|chunk| Sheet::new(chunk.to_vec()))
            .collect();
        (sheets, leftover)
    }

    /// Attach a change observer; events are dropped when it disconnects.
    pub fn set_observer(&mut self, observer: Option<DataObserver>) {
        self.observer = observer;
    }

    pub fn observer(&self) -> Option<&DataObserver> {
        self.observer.as_ref()
    }

    pub(crate) fn publish(&self, owner: ChangeOwner, field: &'static str, old_value: serde_json::Value) {
        if let Some(tx) = &self.observer {
            // A closed channel only means nobody listens any more.
            let _ = tx.send(DataChanged {
                owner,
                field,
                old_value,
            });
        }
    }

    /// Publish every image and sheet field that differs from `before`.
    /// Box data is published by [`Sheet::update_box`] as it changes.
    pub(crate) fn publish_changes(&self, before: &Sheet) {
        if self.observer.is_none() {
            return;
        }
        for (idx, (new, old)) in self.images.iter().zip(&before.images).enumerate() {
            for (field, old_value) in new.changed_fields(old) {
                self.publish(ChangeOwner::Image(idx), field, old_value);
            }
        }
        if self.survey_id != before.survey_id {
            self.publish(ChangeOwner::Sheet, "survey_id", serde_json::json!(before.survey_id));
        }
        if self.questionnaire_id != before.questionnaire_id {
            self.publish(
                ChangeOwner::Sheet,
                "questionnaire_id",
                serde_json::json!(before.questionnaire_id),
            );
        }
        if self.global_id != before.global_id {
            self.publish(ChangeOwner::Sheet, "global_id", serde_json::json!(before.global_id));
        }
        if self.valid != before.valid {
            self.publish(ChangeOwner::Sheet, "valid", serde_json::json!(before.valid));
        }
        if self.quality != before.quality {
            self.publish(ChangeOwner::Sheet, "quality", serde_json::json!(before.quality));
        }
        if self.recognized != before.recognized {
            self.publish(ChangeOwner::Sheet, "recognized", serde_json::json!(before.recognized));
        }
    }

    /// Replace the data of one box and publish every changed field.
    pub fn update_box(&mut self, id: BoxId, new: BoxData) {
        let old = self.data.insert(id, new);
        if self.observer.is_none() {
            return;
        }
        let Some(new) = self.data.get(&id) else {
            return;
        };
        let changes = match &old {
            Some(old) => new.changed_fields(old),
            None => vec![("state", serde_json::Value::Null)],
        };
        for (field, old_value) in changes {
            self.publish(ChangeOwner::Box(id), field, old_value);
        }
    }

    /// Image showing `page` of the survey `survey_id`; the first one wins
    /// when a page was scanned twice.
    pub fn get_page_image(&self, page: u32, survey_id: u32) -> Option<&SheetImage> {
        self.images
            .iter()
            .find(|img| img.page_number == Some(page) && img.survey_id == Some(survey_id))
    }

    /// Index of the image returned by [`Sheet::get_page_image`].
    pub fn page_image_index(&self, page: u32, survey_id: u32) -> Option<usize> {
        self.images
            .iter()
            .position(|img| img.page_number == Some(page) && img.survey_id == Some(survey_id))
    }

    /// Every image that is not ignored has been verified by an operator.
    pub fn verified(&self) -> bool {
        self.images.iter().filter(|i| !i.ignored).all(|i| i.verified)
    }

    /// Every page of the questionnaire was identified.
    pub fn complete(&self, page_count: u32, survey_id: u32) -> bool {
        (1..=page_count).all(|p| self.get_page_image(p, survey_id).is_some())
    }

    /// No box carries a positive state.
    pub fn empty(&self) -> bool {
        self.data.values().all(|d| !d.state)
    }
}
