//! High-level recognition API.
//!
//! [`Recognizer`] is the primary entry point. It binds a survey to its
//! calibration, page style, image loader and barcode reader, and runs the
//! recognition pass over sheets.

use std::path::Path;

use crate::barcode::{BarcodeReader, BuiltinReader};
use crate::calibration::Calibration;
use crate::error::ConfigError;
use crate::recognize::{recognize_sheet, FileLoader, PageLoader, PassInputs, SheetReport};
use crate::sheet::Sheet;
use crate::store::SheetStore;
use crate::style::{PageStyle, Style};
use crate::survey::Survey;

/// Options of one recognition run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecognizeOptions {
    /// Recognize sheets again even when they were recognized before.
    pub rerun: bool,
    /// Only resolve page identities; box data is left untouched.
    pub identify: bool,
}

/// Primary recognition interface.
///
/// Create once per survey, recognize many sheets.
///
/// # Examples
///
/// ```no_run
/// use markread::{RecognizeOptions, Recognizer, Sheet, Survey};
/// use std::path::{Path, PathBuf};
///
/// let survey = Survey::from_json_file(Path::new("survey/info.json")).unwrap();
/// let recognizer = Recognizer::new(&survey).unwrap();
/// let (mut sheets, _) = Sheet::from_scans(
///     &[PathBuf::from("scan-0001.png")],
///     survey.defs.duplex,
///     survey.images_per_sheet(),
/// );
/// let reports = recognizer.recognize_all(&mut sheets, RecognizeOptions::default());
/// println!("{} sheets valid", reports.iter().filter(|r| r.valid).count());
/// ```
pub struct Recognizer<'s> {
    survey: &'s Survey,
    calibration: Calibration,
    style: Style,
    loader: Box<dyn PageLoader + 's>,
    barcodes: Box<dyn BarcodeReader + 's>,
}

impl<'s> Recognizer<'s> {
    /// Recognizer with the default calibration, a file loader and the
    /// built-in QR and Code-128 reader.
    ///
    /// Fails when the survey settings cannot describe a page layout or
    /// when the survey asks for a custom style.
    pub fn new(survey: &'s Survey) -> Result<Self, ConfigError> {
        Self::build(survey, None)
    }

    /// Recognizer for a survey with a caller-provided page style.
    pub fn with_custom_style(
        survey: &'s Survey,
        style: Box<dyn PageStyle + Send + Sync>,
    ) -> Result<Self, ConfigError> {
        Self::build(survey, Some(style))
    }

    fn build(
        survey: &'s Survey,
        custom: Option<Box<dyn PageStyle + Send + Sync>>,
    ) -> Result<Self, ConfigError> {
        survey.check_settings()?;
        let style = Style::from_kind(survey.defs.style, custom)?;
        tracing::debug!(
            "recognizer for survey {} ({} pages, style {})",
            survey.survey_id,
            survey.page_count(),
            style.name()
        );
        Ok(Self {
            survey,
            calibration: Calibration::default(),
            style,
            loader: Box::new(FileLoader::default()),
            barcodes: Box::new(BuiltinReader),
        })
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn with_loader(mut self, loader: impl PageLoader + 's) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Replace the barcode reader.
    pub fn with_barcode_reader(mut self, reader: impl BarcodeReader + 's) -> Self {
        self.barcodes = Box::new(reader);
        self
    }

    pub fn survey(&self) -> &Survey {
        self.survey
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    fn inputs(&self) -> PassInputs<'_> {
        PassInputs {
            survey: self.survey,
            calibration: &self.calibration,
            style: &self.style,
            loader: self.loader.as_ref(),
            barcodes: self.barcodes.as_ref(),
        }
    }

    /// Recognize one sheet in place.
    ///
    /// Sheets recognized before are skipped unless `options.rerun` is set.
    /// Per-image failures never abort; they end up in the report and mark
    /// the sheet invalid.
    pub fn recognize_sheet(&self, sheet: &mut Sheet, options: RecognizeOptions) -> SheetReport {
        if sheet.recognized && !options.rerun {
            tracing::debug!("sheet already recognized, skipping");
            return SheetReport::skipped(sheet.valid, sheet.quality);
        }
        recognize_sheet(&self.inputs(), sheet, options.identify)
    }

    /// Recognize every sheet in turn.
    pub fn recognize_all(&self, sheets: &mut [Sheet], options: RecognizeOptions) -> Vec<SheetReport> {
        let reports: Vec<SheetReport> = sheets
            .iter_mut()
            .map(|sheet| self.recognize_sheet(sheet, options))
            .collect();
        log_summary(&reports);
        reports
    }

    /// Recognize the sheets of a store in turn and write the store to
    /// `path` after every sheet that was recognized, so finished sheets
    /// survive a failure further down the stack.
    pub fn recognize_store(
        &self,
        store: &mut SheetStore,
        path: &Path,
        options: RecognizeOptions,
    ) -> Result<Vec<SheetReport>, ConfigError> {
        let mut reports = Vec::with_capacity(store.sheets.len());
        for idx in 0..store.sheets.len() {
            let report = self.recognize_sheet(&mut store.sheets[idx], options);
            if !report.skipped {
                store.save(path)?;
            }
            reports.push(report);
        }
        log_summary(&reports);
        Ok(reports)
    }
}

fn log_summary(reports: &[SheetReport]) {
    let done = reports.iter().filter(|r| !r.skipped).count();
    let invalid = reports.iter().filter(|r| !r.skipped && !r.valid).count();
    tracing::info!(
        "recognized {} of {} sheets, {} invalid",
        done,
        reports.len(),
        invalid
    );
}

impl std::fmt::Debug for Recognizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer")
            .field("survey_id", &self.survey.survey_id)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}
