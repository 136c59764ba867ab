//! markread — optical mark recognition for printed paper surveys.
//!
//! Scanned questionnaire pages are registered against the printed layout
//! and every box is measured. The pipeline stages are:
//!
//! 1. **Raster** – 1-bit page images with O(1) rectangle ink counts.
//! 2. **Matrix** – corner-mark search and the mm→px page matrix.
//! 3. **Style** – rotation, page number and printed IDs of each page
//!    (classic corner boxes, Code-128 or QR).
//! 4. **Sheet** – duplex pairing and ID consistency across the images of
//!    one questionnaire instance.
//! 5. **Boxes** – checkbox classification through metric tables, textbox
//!    handwriting extents, codebox decoding.
//! 6. **Calculate** – per-question answer statistics.
//!
//! # Public API
//! - [`Recognizer`] and [`RecognizeOptions`] as primary entry points
//! - [`Survey`], [`Sheet`] and [`SheetStore`] for the persisted model
//! - [`Calibration`] for tuning every measurement constant
//! - [`style::PageStyle`] and [`recognize::PageLoader`] as extension points

mod api;
pub mod barcode;
pub mod calculate;
pub mod calibration;
pub mod checkbox;
pub mod data;
mod error;
pub mod geometry;
pub mod questionnaire;
pub mod raster;
pub mod recognize;
pub mod reorder;
pub mod sheet;
mod store;
pub mod style;
pub mod survey;
#[doc(hidden)]
pub mod testing;
pub mod textbox;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::{RecognizeOptions, Recognizer};
pub use barcode::{BarcodeReader, BuiltinReader, Code128Reader, NoBarcodeReader, QrReader, Symbology};
pub use calculate::{Calculation, QuestionStats, Statistics};
pub use calibration::{Calibration, MetricKnot, MetricTable};
pub use data::{BoxData, ChangeOwner, DataChanged, DataObserver};
pub use error::{ConfigError, RecognitionError};
pub use geometry::{Affine2, Rect};
pub use questionnaire::{Answer, BoxId, BoxKind, BoxSpec, QObject, QObjectId, QObjectKind, Questionnaire};
pub use raster::{Bitmap, MaskShape};
pub use recognize::{FileLoader, PageLoader, RecognitionStage, SheetReport};
pub use reorder::{reorder, Reordered};
pub use sheet::{ScanPage, Sheet, SheetImage};
pub use store::{relative_scan_path, SheetStore, SHEETS_SCHEMA};
pub use survey::{CheckMode, StyleKind, Survey, SurveyDefs, SURVEY_SCHEMA};
