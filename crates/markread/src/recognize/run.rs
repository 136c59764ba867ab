//! One recognition pass over one sheet.
//!
//! Stages run in a fixed order: load -> matrix -> rotation -> matrix
//! (rotated pages) -> page numbers -> duplex pairing -> IDs -> boxes.
//! Failures on one image are logged and recorded in the report; the pass
//! always runs to completion.

use std::collections::{BTreeMap, BTreeSet};

use crate::barcode::BarcodeReader;
use crate::calibration::{Calibration, MetricTable};
use crate::error::RecognitionError;
use crate::geometry::Affine2;
use crate::raster::calculate_matrix;
use crate::sheet::Sheet;
use crate::style::{PageContext, PageStyle, Style};
use crate::survey::Survey;

use super::boxes::{recognize_box, unrecognized_box};
use super::duplex::{duplex_copy, pair_page_numbers, CopyOutcome};
use super::loader::{PageLoader, PageSurfaces};
use super::result::{ImageFailure, RecognitionStage, SheetReport};

/// Shared, read-only inputs of every sheet pass.
pub(crate) struct PassInputs<'a> {
    pub survey: &'a Survey,
    pub calibration: &'a Calibration,
    pub style: &'a Style,
    pub loader: &'a dyn PageLoader,
    pub barcodes: &'a dyn BarcodeReader,
}

/// Recognize `sheet` in place. With `identify`, stop once the page
/// identities are known and leave box data untouched.
pub(crate) fn recognize_sheet(inputs: &PassInputs<'_>, sheet: &mut Sheet, identify: bool) -> SheetReport {
    let before = sheet.clone();
    let mut pass = SheetPass::new(inputs, sheet);
    pass.reset();

    pass.load_all();
    pass.report.stage = RecognitionStage::Loaded;
    for idx in 0..pass.len() {
        pass.find_matrix(idx);
    }
    pass.report.stage = RecognitionStage::MatrixAttempted;
    pass.resolve_rotation();
    pass.report.stage = RecognitionStage::RotationResolved;
    pass.reload_rotated();
    pass.report.stage = RecognitionStage::MatrixReattempted;
    pass.read_page_numbers();
    pass.report.stage = RecognitionStage::PageNumbersResolved;
    pass.pair_images();
    pass.check_page_numbers();
    pass.report.stage = RecognitionStage::DuplexPaired;
    pass.resolve_survey_id();
    pass.resolve_questionnaire_id();
    pass.resolve_global_id();
    pass.report.stage = RecognitionStage::IdsResolved;
    if !identify {
        pass.recognize_boxes();
        pass.report.stage = RecognitionStage::QualityAggregated;
    }
    let mut report = pass.finish();
    if identify {
        sheet.recognized = before.recognized;
    } else {
        report.stage = RecognitionStage::Done;
    }

    sheet.publish_changes(&before);
    report
}

struct SheetPass<'a, 's> {
    inputs: &'a PassInputs<'a>,
    sheet: &'s mut Sheet,
    surfaces: PageSurfaces,
    /// mm→px matrix per image.
    matrices: Vec<Option<Affine2>>,
    failed: BTreeSet<usize>,
    report: SheetReport,
}

impl<'a, 's> SheetPass<'a, 's> {
    fn new(inputs: &'a PassInputs<'a>, sheet: &'s mut Sheet) -> Self {
        let n = sheet.images.len();
        Self {
            inputs,
            sheet,
            surfaces: PageSurfaces::new(n),
            matrices: vec![None; n],
            failed: BTreeSet::new(),
            report: SheetReport::new(),
        }
    }

    fn len(&self) -> usize {
        self.sheet.images.len()
    }

    fn paper(&self) -> [f64; 2] {
        let defs = &self.inputs.survey.defs;
        [defs.paper_width, defs.paper_height]
    }

    fn duplex(&self) -> bool {
        self.inputs.survey.defs.duplex
    }

    fn name(&self, idx: usize) -> String {
        self.sheet.images[idx].filename.display().to_string()
    }

    /// Forget everything a previous pass derived.
    fn reset(&mut self) {
        for img in &mut self.sheet.images {
            img.ignored = img.is_dummy();
            img.rotated = None;
            img.page_number = None;
            img.survey_id = None;
            img.questionnaire_id = None;
            img.global_id = None;
            img.raw_matrix = None;
        }
        self.sheet.survey_id = None;
        self.sheet.questionnaire_id = None;
        self.sheet.global_id = None;
        self.sheet.valid = true;
        self.sheet.quality = 1.0;
    }

    /// Record a failed detection step; the image is excluded from now on.
    fn fail(&mut self, idx: usize, error: RecognitionError) {
        tracing::warn!("{}: {}", self.name(idx), error);
        self.failed.insert(idx);
        self.report.errors.push(ImageFailure { image: idx, error });
    }

    /// Record an unreadable value that later stages may still make up for.
    fn note(&mut self, idx: usize, error: RecognitionError) {
        tracing::warn!("{}: {}", self.name(idx), error);
        self.report.warnings += 1;
        self.report.errors.push(ImageFailure { image: idx, error });
    }

    fn warn(&mut self, message: &str) {
        tracing::warn!("{}", message);
        self.report.warnings += 1;
    }

    /// Images that take part in recognition and have a usable page.
    fn usable(&self) -> Vec<usize> {
        self.readable()
            .into_iter()
            .filter(|i| !self.failed.contains(i))
            .collect()
    }

    /// Images with a loaded page and a page matrix, including those failed
    /// by the page number checks. Their printed IDs still tell which
    /// questionnaire they belong to.
    fn readable(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| !self.sheet.images[i].ignored)
            .filter(|&i| self.surfaces.get(i).is_some() && self.matrices[i].is_some())
            .collect()
    }

    fn page(&self, idx: usize) -> Option<PageContext<'_>> {
        Some(PageContext {
            bitmap: self.surfaces.get(idx)?,
            matrix: self.matrices[idx]?,
            survey: self.inputs.survey,
            calibration: self.inputs.calibration,
            barcodes: self.inputs.barcodes,
            page_number: self.sheet.images[idx].page_number,
        })
    }

    /// Run `read` on the pages of `images`, recording errors as notes.
    fn read_each<T>(
        &mut self,
        images: Vec<usize>,
        read: impl Fn(&Style, &PageContext<'_>) -> Result<Option<T>, RecognitionError>,
    ) -> BTreeMap<usize, Option<T>> {
        let mut out = BTreeMap::new();
        for idx in images {
            let result = match self.page(idx) {
                Some(page) => read(self.inputs.style, &page),
                None => continue,
            };
            match result {
                Ok(v) => {
                    out.insert(idx, v);
                }
                Err(e) => {
                    self.note(idx, e);
                    out.insert(idx, None);
                }
            }
        }
        out
    }

    // ── Stages ───────────────────────────────────────────────────────────

    fn load(&mut self, idx: usize, rotated: bool) {
        match self.inputs.loader.load(&self.sheet.images[idx], rotated) {
            Ok(bitmap) => {
                let (w, h) = bitmap.dimensions();
                self.sheet.images[idx].size_px = Some([w, h]);
                self.surfaces.set(idx, bitmap);
            }
            Err(e) => {
                self.surfaces.release(idx);
                self.fail(idx, e);
            }
        }
    }

    fn load_all(&mut self) {
        for idx in 0..self.len() {
            if !self.sheet.images[idx].ignored {
                self.load(idx, false);
            }
        }
    }

    fn find_matrix(&mut self, idx: usize) {
        if self.sheet.images[idx].ignored {
            return;
        }
        let paper = self.paper();
        let cal = self.inputs.calibration;
        if self.surfaces.get(idx).is_none() {
            return;
        }
        let Some(estimate) = self.sheet.images[idx].mm_to_px(true, paper) else {
            self.fail(idx, RecognitionError::MissingMatrix);
            return;
        };
        let result = {
            let Some(bitmap) = self.surfaces.get(idx) else {
                return;
            };
            let [x, y, w, h] = cal.corner_mark_rect(paper[0], paper[1]);
            calculate_matrix(
                bitmap,
                &estimate,
                x,
                y,
                w,
                h,
                &cal.corner_search(),
                &cal.matrix_bounds(),
            )
        };
        match result {
            Ok(matrix) => {
                self.matrices[idx] = Some(matrix);
                self.sheet.images[idx].raw_matrix = matrix.inverse();
            }
            Err(e) => {
                self.matrices[idx] = None;
                self.report.matrix_errors.push(idx);
                self.fail(idx, e);
            }
        }
    }

    fn resolve_rotation(&mut self) {
        let found = self.read_each(self.usable(), |style, page| style.get_page_rotation(page));
        for (idx, rotated) in found {
            self.sheet.images[idx].rotated = rotated;
        }
        if !self.duplex() {
            return;
        }
        for i in (0..self.len().saturating_sub(1)).step_by(2) {
            let Some((a, b)) = pair_mut(&mut self.sheet.images, i) else {
                continue;
            };
            if duplex_copy(&mut a.rotated, &mut b.rotated) == CopyOutcome::BothMissing
                && !self.failed.contains(&i)
                && !self.failed.contains(&(i + 1))
            {
                let msg = format!(
                    "{} / {}: rotation unknown on both sides of the leaf",
                    self.name(i),
                    self.name(i + 1)
                );
                self.warn(&msg);
            }
        }
    }

    /// Load rotated images upside down and look for the corner marks again.
    fn reload_rotated(&mut self) {
        for idx in 0..self.len() {
            let img = &self.sheet.images[idx];
            if img.ignored || img.rotated != Some(true) {
                continue;
            }
            tracing::debug!("{}: page is upside down, reloading", self.name(idx));
            self.failed.remove(&idx);
            self.report.matrix_errors.retain(|&i| i != idx);
            self.report.errors.retain(|f| f.image != idx);
            self.sheet.images[idx].raw_matrix = None;
            self.matrices[idx] = None;
            self.load(idx, true);
            self.find_matrix(idx);
        }
    }

    fn read_page_numbers(&mut self) {
        let found = self.read_each(self.usable(), |style, page| style.get_page_number(page));
        for (idx, page) in found {
            self.sheet.images[idx].page_number = page;
        }
    }

    fn pair_images(&mut self) {
        let duplex = self.duplex();
        let n = self.len();
        for i in (0..n).step_by(2) {
            if i + 1 >= n {
                continue;
            }
            let a = self.sheet.images[i].page_number;
            let b = self.sheet.images[i + 1].page_number;
            let decision = pair_page_numbers(a, b, duplex);
            for (side, idx) in [i, i + 1].into_iter().enumerate() {
                self.sheet.images[idx].page_number = decision.pages[side];
                if decision.ignored[side] {
                    self.sheet.images[idx].ignored = true;
                    self.failed.remove(&idx);
                }
                if decision.failed[side] {
                    self.failed.insert(idx);
                }
            }
            if let Some(w) = decision.warning {
                let msg = format!("{} / {}: {}", self.name(i), self.name(i + 1), w);
                self.warn(&msg);
            }
        }
    }

    /// Fail images without a valid, unique page number and list the pages
    /// nobody scanned.
    fn check_page_numbers(&mut self) {
        let page_count = self.inputs.survey.page_count();
        let mut seen: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for idx in 0..self.len() {
            if self.sheet.images[idx].ignored {
                continue;
            }
            match self.sheet.images[idx].page_number {
                Some(p) if (1..=page_count).contains(&p) => seen.entry(p).or_default().push(idx),
                Some(p) => {
                    let msg = format!("{}: page number {} out of range", self.name(idx), p);
                    self.warn(&msg);
                    self.failed.insert(idx);
                }
                None => {
                    tracing::warn!("{}: page number unknown", self.name(idx));
                    self.failed.insert(idx);
                }
            }
        }
        for (page, images) in &seen {
            if images.len() > 1 {
                tracing::warn!("page {} appears {} times on the sheet", page, images.len());
                self.report.warnings += 1;
                self.failed.extend(images.iter().copied());
            }
        }
        self.report.missing_pages = (1..=page_count).filter(|p| !seen.contains_key(p)).collect();
        if !self.report.missing_pages.is_empty() {
            tracing::warn!("pages {:?} are missing", self.report.missing_pages);
            self.sheet.valid = false;
        }
    }

    /// Copy known values across duplex pairs. When the value is `expected`,
    /// a pair with it on neither side warns unless one of its images
    /// already failed.
    fn duplex_fill<T: Clone>(&mut self, what: &str, expected: bool, values: &mut [Option<T>]) {
        if !self.duplex() {
            return;
        }
        for i in (0..values.len().saturating_sub(1)).step_by(2) {
            let Some((a, b)) = pair_mut(values, i) else {
                continue;
            };
            if duplex_copy(a, b) != CopyOutcome::BothMissing || !expected {
                continue;
            }
            let skip = [i, i + 1]
                .iter()
                .any(|idx| self.failed.contains(idx) || self.sheet.images[*idx].ignored);
            if !skip {
                let msg = format!(
                    "{} / {}: {} unknown on both sides of the leaf",
                    self.name(i),
                    self.name(i + 1),
                    what
                );
                self.warn(&msg);
            }
        }
    }

    /// First value among the images taking part, with a warning when the
    /// images disagree.
    fn agreed<T: Clone + PartialEq + std::fmt::Debug>(
        &mut self,
        what: &str,
        values: &[Option<T>],
    ) -> Option<T> {
        let mut known = (0..values.len())
            .filter(|&i| !self.sheet.images[i].ignored)
            .filter_map(|i| values[i].clone());
        let first = known.next()?;
        if let Some(other) = known.find(|v| *v != first) {
            let msg = format!("sheet has conflicting {}s {:?} and {:?}", what, first, other);
            self.warn(&msg);
        }
        Some(first)
    }

    fn resolve_survey_id(&mut self) {
        let expected = self.inputs.survey.survey_id;
        if !self.inputs.survey.defs.print_survey_id {
            self.sheet.survey_id = Some(expected);
            for img in self.sheet.images.iter_mut().filter(|i| !i.ignored) {
                img.survey_id = Some(expected);
            }
            return;
        }

        let found = self.read_each(self.readable(), |style, page| style.get_survey_id(page));
        let mut values: Vec<Option<u32>> = vec![None; self.len()];
        for (idx, id) in found {
            values[idx] = id;
        }
        self.duplex_fill("survey id", true, &mut values);

        let mismatched: Vec<u32> = values
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.sheet.images[*i].ignored)
            .filter_map(|(_, v)| *v)
            .filter(|&v| v != expected)
            .collect();
        let sheet_id = self.agreed("survey id", &values);
        if !mismatched.is_empty() {
            let msg = format!("survey id {:?} does not match the survey ({})", mismatched, expected);
            self.warn(&msg);
            self.sheet.valid = false;
        }
        if sheet_id.is_none() {
            self.warn("no survey id could be read");
            self.sheet.valid = false;
        }
        self.sheet.survey_id = sheet_id;
        for (img, v) in self.sheet.images.iter_mut().zip(values) {
            if !img.ignored {
                img.survey_id = v.or(sheet_id);
            }
        }
    }

    fn resolve_questionnaire_id(&mut self) {
        if !self.inputs.survey.defs.print_questionnaire_id {
            return;
        }
        let found = self.read_each(self.readable(), |style, page| style.get_questionnaire_id(page));
        let mut values: Vec<Option<String>> = vec![None; self.len()];
        for (idx, id) in found {
            values[idx] = id;
        }
        self.duplex_fill("questionnaire id", true, &mut values);
        self.sheet.questionnaire_id = self.agreed("questionnaire id", &values);
        for (img, v) in self.sheet.images.iter_mut().zip(values) {
            img.questionnaire_id = v;
        }
    }

    fn resolve_global_id(&mut self) {
        let found = self.read_each(self.readable(), |style, page| style.get_global_id(page));
        let mut values: Vec<Option<String>> = vec![None; self.len()];
        for (idx, id) in found {
            values[idx] = id;
        }
        // Only surveys that print a global id expect one on every leaf.
        let expected = self.inputs.survey.global_id.is_some();
        self.duplex_fill("global id", expected, &mut values);
        self.sheet.global_id = self.agreed("global id", &values);
        for (img, v) in self.sheet.images.iter_mut().zip(values) {
            img.global_id = v;
        }
    }

    /// Measure every box and aggregate the quality per question and sheet.
    fn recognize_boxes(&mut self) {
        let inputs = self.inputs;
        let survey_id = inputs.survey.survey_id;
        let empty = MetricTable::new();
        let table = inputs
            .calibration
            .metrics_for(inputs.survey.defs.checkmode)
            .unwrap_or(&empty);

        let mut sheet_quality: f64 = 1.0;
        for q in &inputs.survey.questionnaire.qobjects {
            if q.boxes.is_empty() {
                continue;
            }
            let mut question_quality: f64 = 1.0;
            for spec in &q.boxes {
                let idx = self
                    .sheet
                    .page_image_index(spec.page_number, survey_id)
                    .filter(|i| !self.failed.contains(i));
                let data = match idx.and_then(|i| Some((self.surfaces.get(i)?, self.matrices[i]?))) {
                    Some((bitmap, matrix)) => recognize_box(
                        bitmap,
                        &matrix,
                        spec,
                        inputs.calibration,
                        table,
                        inputs.barcodes,
                    ),
                    None => {
                        tracing::debug!("box {}: page {} not available", spec.id, spec.page_number);
                        unrecognized_box(spec)
                    }
                };
                question_quality = question_quality.min(data.quality);
                self.sheet.update_box(spec.id, data);
            }
            tracing::debug!("question {}: quality {:.3}", q.id, question_quality);
            sheet_quality = sheet_quality.min(question_quality);
        }
        self.sheet.quality = sheet_quality;
    }

    fn finish(mut self) -> SheetReport {
        if !self.failed.is_empty() {
            self.sheet.valid = false;
        }
        self.sheet.recognized = true;
        for img in &mut self.sheet.images {
            img.verified = false;
        }
        self.report.failed_pages = self.failed.iter().copied().collect();
        self.report.valid = self.sheet.valid;
        self.report.quality = self.sheet.quality;
        tracing::info!(
            "sheet {:?}: valid {} quality {:.3} failed pages {:?}",
            self.sheet.images.first().map(|i| i.filename.display().to_string()),
            self.sheet.valid,
            self.sheet.quality,
            self.report.failed_pages
        );
        self.report
    }
}

/// Both elements of the pair starting at `i`.
fn pair_mut<T>(items: &mut [T], i: usize) -> Option<(&mut T, &mut T)> {
    if i + 1 >= items.len() {
        return None;
    }
    let (left, right) = items.split_at_mut(i + 1);
    Some((left.get_mut(i)?, right.first_mut()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use crate::barcode::NoBarcodeReader;
    use crate::geometry::Rect;
    use crate::questionnaire::{BoxId, QObjectId};
    use crate::raster::Bitmap;
    use crate::sheet::SheetImage;
    use crate::style::ClassicStyle;
    use crate::test_utils::{
        classic_corner_boxes, classic_id_rects, outline_rects, page_corner_marks, page_matrix,
        page_size_px, render_rects, sample_survey, upside_down_matrix,
    };

    struct MemoryLoader(BTreeMap<PathBuf, Bitmap>);

    impl PageLoader for MemoryLoader {
        fn load(&self, image: &SheetImage, rotated: bool) -> Result<Bitmap, RecognitionError> {
            let bitmap = self.0.get(&image.filename).ok_or_else(|| RecognitionError::ImageLoad {
                path: image.filename.clone(),
                message: "not in memory".to_string(),
            })?;
            Ok(if rotated {
                bitmap.rotated180()
            } else {
                bitmap.clone()
            })
        }
    }

    fn render_page(survey: &Survey, cal: &Calibration, page: u32, marks: &[Rect], m: &Affine2) -> Bitmap {
        let mut rects = page_corner_marks(survey, cal);
        rects.extend(classic_corner_boxes(survey, cal, page));
        if survey.page_count() == 1 || page % 2 == 0 {
            rects.extend(classic_id_rects(survey, cal, survey.survey_id, None));
        }
        for b in survey.questionnaire.boxes().filter(|b| b.page_number == page) {
            rects.extend(outline_rects(&b.rect(), b.lw));
        }
        rects.extend_from_slice(marks);
        let (w, h) = page_size_px(survey);
        render_rects(w, h, m, &rects)
    }

    fn box_id(q: (u32, u32), index: u32) -> BoxId {
        BoxId {
            question: QObjectId(q.0, q.1),
            index,
        }
    }

    fn run(survey: &Survey, pages: Vec<(&str, Bitmap)>, sheet: &mut Sheet) -> SheetReport {
        let style = Style::from_kind(survey.defs.style, None).unwrap();
        run_with_style(survey, &style, pages, sheet)
    }

    fn run_with_style(
        survey: &Survey,
        style: &Style,
        pages: Vec<(&str, Bitmap)>,
        sheet: &mut Sheet,
    ) -> SheetReport {
        let cal = Calibration::default();
        let loader = MemoryLoader(pages.into_iter().map(|(n, b)| (PathBuf::from(n), b)).collect());
        let inputs = PassInputs {
            survey,
            calibration: &cal,
            style,
            loader: &loader,
            barcodes: &NoBarcodeReader,
        };
        recognize_sheet(&inputs, sheet, false)
    }

    #[test]
    fn single_page_sheet_is_recognized() {
        let survey = sample_survey(1, false);
        let cal = Calibration::default();
        let blot = Rect::new(30.9, 60.9, 1.7, 1.7);
        let page = render_page(&survey, &cal, 1, &[blot], &page_matrix());
        let mut sheet = Sheet::new(vec![SheetImage::new("p1.png", 0), SheetImage::dummy()]);

        let report = run(&survey, vec![("p1.png", page)], &mut sheet);
        assert_eq!(report.stage, RecognitionStage::Done);
        assert!(report.failed_pages.is_empty(), "{report:?}");
        assert!(sheet.valid && sheet.recognized);
        assert_eq!(sheet.images[0].page_number, Some(1));
        assert_eq!(sheet.images[0].rotated, Some(false));
        assert_eq!(sheet.survey_id, Some(survey.survey_id));
        assert!(sheet.images[1].ignored);
        assert!(sheet.data[&box_id((1, 1), 1)].state);
        assert!(!sheet.data[&box_id((1, 1), 2)].state);
        assert!(!sheet.data[&box_id((1, 2), 1)].state);
        assert_eq!(sheet.data.len(), 4);
    }

    #[test]
    fn upside_down_page_is_reloaded() {
        let survey = sample_survey(1, false);
        let cal = Calibration::default();
        let paper = [survey.defs.paper_width, survey.defs.paper_height];
        let page = render_page(&survey, &cal, 1, &[], &upside_down_matrix(paper));
        let mut sheet = Sheet::new(vec![SheetImage::new("p1.png", 0), SheetImage::dummy()]);

        let report = run(&survey, vec![("p1.png", page)], &mut sheet);
        assert!(sheet.valid, "{report:?}");
        assert_eq!(sheet.images[0].rotated, Some(true));
        assert_eq!(sheet.images[0].page_number, Some(1));
    }

    #[test]
    fn missing_scan_fails_the_sheet() {
        let survey = sample_survey(1, false);
        let mut sheet = Sheet::new(vec![SheetImage::new("lost.png", 0), SheetImage::dummy()]);
        let report = run(&survey, Vec::new(), &mut sheet);
        assert_eq!(report.stage, RecognitionStage::Done);
        assert!(!sheet.valid);
        assert_eq!(report.failed_pages, vec![0]);
        assert_eq!(report.missing_pages, vec![1]);
        assert_eq!(report.errors[0].error.code(), "image_load");
        // Every box still gets data, at zero quality.
        assert!(sheet.data.values().all(|d| d.quality == 0.0));
        assert_eq!(sheet.quality, 0.0);
    }

    #[test]
    fn wrong_survey_id_invalidates() {
        let mut printed = sample_survey(1, false);
        printed.survey_id = 0x0001_0001;
        let expected = sample_survey(1, false);
        let cal = Calibration::default();
        let page = render_page(&printed, &cal, 1, &[], &page_matrix());
        let mut sheet = Sheet::new(vec![SheetImage::new("p1.png", 0), SheetImage::dummy()]);

        run(&expected, vec![("p1.png", page)], &mut sheet);
        assert!(!sheet.valid);
        assert_eq!(sheet.survey_id, Some(0x0001_0001));
    }

    /// Classic pages whose questionnaire ID cannot be found anywhere.
    struct WithoutQuestionnaireId;

    impl PageStyle for WithoutQuestionnaireId {
        fn get_page_rotation(&self, page: &PageContext<'_>) -> Result<Option<bool>, RecognitionError> {
            ClassicStyle.get_page_rotation(page)
        }
        fn get_page_number(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
            ClassicStyle.get_page_number(page)
        }
        fn get_survey_id(&self, page: &PageContext<'_>) -> Result<Option<u32>, RecognitionError> {
            ClassicStyle.get_survey_id(page)
        }
        fn get_questionnaire_id(
            &self,
            _page: &PageContext<'_>,
        ) -> Result<Option<String>, RecognitionError> {
            Ok(None)
        }
        fn get_global_id(&self, page: &PageContext<'_>) -> Result<Option<String>, RecognitionError> {
            ClassicStyle.get_global_id(page)
        }
    }

    fn duplex_pages(survey: &Survey) -> Vec<(&'static str, Bitmap)> {
        let cal = Calibration::default();
        vec![
            ("front.png", render_page(survey, &cal, 1, &[], &page_matrix())),
            ("back.png", render_page(survey, &cal, 2, &[], &page_matrix())),
        ]
    }

    fn duplex_sheet() -> Sheet {
        Sheet::new(vec![SheetImage::new("front.png", 0), SheetImage::new("back.png", 0)])
    }

    #[test]
    fn clean_duplex_leaf_has_no_warnings() {
        let survey = sample_survey(2, true);
        let mut sheet = duplex_sheet();
        let report = run(&survey, duplex_pages(&survey), &mut sheet);
        assert!(sheet.valid, "{report:?}");
        assert_eq!(report.warnings, 0);
        assert_eq!(sheet.images[0].survey_id, Some(survey.survey_id));
    }

    #[test]
    fn id_missing_on_both_sides_warns_once_per_leaf() {
        let mut survey = sample_survey(2, true);
        survey.defs.print_questionnaire_id = true;
        let style = Style::Custom(Box::new(WithoutQuestionnaireId));
        let mut sheet = duplex_sheet();

        let report = run_with_style(&survey, &style, duplex_pages(&survey), &mut sheet);
        assert_eq!(report.warnings, 1, "{report:?}");
        assert_eq!(sheet.questionnaire_id, None);
        assert!(sheet.images.iter().all(|i| i.questionnaire_id.is_none()));
        assert!(report.failed_pages.is_empty());
    }

    #[test]
    fn failed_leaf_does_not_warn_about_ids_again() {
        let mut survey = sample_survey(2, true);
        survey.defs.print_questionnaire_id = true;
        let style = Style::Custom(Box::new(WithoutQuestionnaireId));
        let mut sheet = duplex_sheet();

        // Both sides show page 1: pairing fails the leaf.
        let cal = Calibration::default();
        let pages = vec![
            ("front.png", render_page(&survey, &cal, 1, &[], &page_matrix())),
            ("back.png", render_page(&survey, &cal, 1, &[], &page_matrix())),
        ];
        let report = run_with_style(&survey, &style, pages, &mut sheet);
        assert_eq!(report.failed_pages, vec![0, 1]);
        assert!(!sheet.valid);
        // Pairing, the duplicate page and the unread survey id; no per-leaf
        // ID warnings on top.
        assert_eq!(report.warnings, 3, "{report:?}");
    }

    #[test]
    fn pair_mut_splits_neighbours() {
        let mut v = [1, 2, 3];
        let (a, b) = pair_mut(&mut v, 0).unwrap();
        std::mem::swap(a, b);
        assert_eq!(v, [2, 1, 3]);
        assert!(pair_mut(&mut v, 2).is_none());
    }
}
