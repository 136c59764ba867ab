use crate::error::RecognitionError;

/// Furthest stage a sheet pass reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStage {
    Loaded,
    MatrixAttempted,
    RotationResolved,
    MatrixReattempted,
    PageNumbersResolved,
    DuplexPaired,
    IdsResolved,
    QualityAggregated,
    Done,
}

/// A recognition failure on one image.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ImageFailure {
    pub image: usize,
    pub error: RecognitionError,
}

/// Summary of one sheet pass.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SheetReport {
    pub stage: RecognitionStage,
    /// Image indices that failed any detection step.
    pub failed_pages: Vec<usize>,
    /// Image indices whose corner marks were not found.
    pub matrix_errors: Vec<usize>,
    /// Questionnaire pages without an image.
    pub missing_pages: Vec<u32>,
    pub errors: Vec<ImageFailure>,
    /// Consistency problems that were logged but tolerated.
    pub warnings: usize,
    pub valid: bool,
    pub quality: f64,
    /// The sheet was already recognized and left alone.
    pub skipped: bool,
}

impl SheetReport {
    pub(crate) fn new() -> Self {
        Self {
            stage: RecognitionStage::Loaded,
            failed_pages: Vec::new(),
            matrix_errors: Vec::new(),
            missing_pages: Vec::new(),
            errors: Vec::new(),
            warnings: 0,
            valid: true,
            quality: 1.0,
            skipped: false,
        }
    }

    pub(crate) fn skipped(valid: bool, quality: f64) -> Self {
        Self {
            stage: RecognitionStage::Done,
            valid,
            quality,
            skipped: true,
            ..Self::new()
        }
    }
}
