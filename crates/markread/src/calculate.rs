//! Answer statistics over a set of sheets.
//!
//! Feed sheets through [`Calculation::read`], then call
//! [`Calculation::calculate`]. After [`Calculation::reference`], later
//! results flag values that moved by more than [`SIGNIFICANCE_THRESHOLD`].

use std::collections::BTreeMap;

use crate::questionnaire::{Answer, QObject, QObjectId, QObjectKind, Questionnaire, VALUE_INVALID, VALUE_NONE};
use crate::sheet::Sheet;

/// Deviation from the reference that counts as significant.
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.1;

/// Statistics of one question.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionStats {
    /// Ratio of answers per box value.
    Choice {
        values: BTreeMap<i64, f64>,
        significant: BTreeMap<i64, bool>,
    },
    /// A scale. `range_values` holds the ratios of the scale values,
    /// `values` those of the remaining boxes.
    Range {
        values: BTreeMap<i64, f64>,
        range_values: BTreeMap<i64, f64>,
        mean: f64,
        standard_deviation: f64,
        significant: bool,
    },
    /// Number of sheets with something written.
    Text { filled: usize },
}

/// Statistics of one question with the number of answers counted.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QuestionSummary {
    pub id: QObjectId,
    pub title: String,
    /// Answers that entered the statistics.
    pub count: usize,
    pub stats: QuestionStats,
}

/// Result of one calculation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Statistics {
    /// Sheets read.
    pub count: usize,
    pub questions: Vec<QuestionSummary>,
}

impl Statistics {
    pub fn question(&self, id: QObjectId) -> Option<&QuestionSummary> {
        self.questions.iter().find(|q| q.id == id)
    }
}

#[derive(Debug, Clone, Default)]
struct Counts {
    count: usize,
    values: BTreeMap<i64, usize>,
    filled: usize,
}

/// Accumulates answers sheet by sheet.
#[derive(Debug, Clone)]
pub struct Calculation<'q> {
    questionnaire: &'q Questionnaire,
    count: usize,
    counts: Vec<Counts>,
    reference: Option<Statistics>,
}

fn counted(q: &QObject) -> bool {
    matches!(
        q.kind,
        QObjectKind::Choice
            | QObjectKind::SingleChoice
            | QObjectKind::Range { .. }
            | QObjectKind::Mark { .. }
            | QObjectKind::Text
    )
}

impl<'q> Calculation<'q> {
    pub fn new(questionnaire: &'q Questionnaire) -> Self {
        Self {
            questionnaire,
            count: 0,
            counts: vec![Counts::default(); questionnaire.qobjects.len()],
            reference: None,
        }
    }

    /// Forget the sheets read so far; the reference is kept.
    pub fn reset(&mut self) {
        self.count = 0;
        self.counts = vec![Counts::default(); self.questionnaire.qobjects.len()];
    }

    /// Number of sheets read.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Count the answers of one sheet.
    pub fn read(&mut self, sheet: &Sheet) {
        self.count += 1;
        for (q, counts) in self.questionnaire.qobjects.iter().zip(&mut self.counts) {
            match q.answer(&sheet.data) {
                Some(Answer::Multiple(values)) => {
                    counts.count += 1;
                    for v in values {
                        *counts.values.entry(v).or_default() += 1;
                    }
                }
                // Unanswered and invalid answers are left out.
                Some(Answer::Single(v)) if v != VALUE_NONE && v != VALUE_INVALID => {
                    counts.count += 1;
                    *counts.values.entry(v).or_default() += 1;
                }
                Some(Answer::Single(_)) => {}
                Some(Answer::Text(_, filled)) => {
                    counts.count += 1;
                    counts.filled += usize::from(filled);
                }
                None => {}
            }
        }
    }

    /// Statistics of the sheets read so far.
    pub fn calculate(&self) -> Statistics {
        let mut questions = Vec::new();
        for (q, counts) in self.questionnaire.qobjects.iter().zip(&self.counts) {
            if !counted(q) {
                continue;
            }
            let reference = self
                .reference
                .as_ref()
                .and_then(|r| r.question(q.id))
                .map(|s| &s.stats);
            questions.push(QuestionSummary {
                id: q.id,
                title: q.title.clone(),
                count: counts.count,
                stats: question_stats(q, counts, reference),
            });
        }
        Statistics {
            count: self.count,
            questions,
        }
    }

    /// Keep the current result as reference for later calculations.
    pub fn reference(&mut self) {
        self.reference = Some(self.calculate());
    }
}

fn ratio(n: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        n as f64 / total as f64
    }
}

fn question_stats(q: &QObject, counts: &Counts, reference: Option<&QuestionStats>) -> QuestionStats {
    match q.kind {
        QObjectKind::Text => QuestionStats::Text {
            filled: counts.filled,
        },
        QObjectKind::Range { .. } | QObjectKind::Mark { .. } => range_stats(q, counts, reference),
        _ => {
            let values: BTreeMap<i64, f64> = q
                .boxes
                .iter()
                .map(|b| {
                    let v = b.value();
                    (v, ratio(counts.values.get(&v).copied().unwrap_or(0), counts.count))
                })
                .collect();
            let significant = values
                .iter()
                .map(|(&v, &r)| {
                    let moved = match reference {
                        Some(QuestionStats::Choice { values: old, .. }) => old
                            .get(&v)
                            .is_some_and(|&o| (r - o).abs() > SIGNIFICANCE_THRESHOLD),
                        _ => false,
                    };
                    (v, moved)
                })
                .collect();
            QuestionStats::Choice {
                values,
                significant,
            }
        }
    }
}

fn range_stats(q: &QObject, counts: &Counts, reference: Option<&QuestionStats>) -> QuestionStats {
    let scale = q.range_values();
    let n = |v: i64| counts.values.get(&v).copied().unwrap_or(0);

    let values = q
        .boxes
        .iter()
        .map(|b| b.value())
        .filter(|v| !scale.contains(v))
        .map(|v| (v, ratio(n(v), counts.count)))
        .collect();
    let range_values = scale.iter().map(|&v| (v, ratio(n(v), counts.count))).collect();

    let range_count: usize = scale.iter().map(|&v| n(v)).sum();
    let (mut mean, mut standard_deviation) = (0.0, 0.0);
    if range_count > 0 {
        let total = range_count as f64;
        mean = scale.iter().map(|&v| v as f64 * n(v) as f64).sum::<f64>() / total;
        let var = scale
            .iter()
            .map(|&v| n(v) as f64 * (v as f64 - mean).powi(2))
            .sum::<f64>()
            / total;
        standard_deviation = var.sqrt();
    }
    let significant = match reference {
        Some(QuestionStats::Range { mean: old, .. }) => {
            range_count > 0 && (mean - old).abs() > SIGNIFICANCE_THRESHOLD
        }
        _ => false,
    };
    QuestionStats::Range {
        values,
        range_values,
        mean,
        standard_deviation,
        significant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BoxData;
    use crate::questionnaire::BoxId;
    use approx::assert_abs_diff_eq;

    fn questionnaire() -> Questionnaire {
        let mut q: Questionnaire = serde_json::from_value(serde_json::json!({
            "page_count": 1,
            "qobjects": [
                {"id": [1, 0], "type": "head", "title": "General"},
                {"id": [1, 1], "type": "choice", "title": "Hobbies", "page_number": 1,
                 "boxes": [
                    {"type": "checkbox", "x": 20.0, "y": 40.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 40.0, "y": 40.0, "width": 3.5, "height": 3.5}
                 ]},
                {"id": [1, 2], "type": "range", "range": [0, 2], "page_number": 1,
                 "boxes": [
                    {"type": "checkbox", "x": 20.0, "y": 60.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 30.0, "y": 60.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 40.0, "y": 60.0, "width": 3.5, "height": 3.5},
                    {"type": "checkbox", "x": 60.0, "y": 60.0, "width": 3.5, "height": 3.5}
                 ]},
                {"id": [1, 3], "type": "text", "page_number": 1,
                 "boxes": [{"type": "textbox", "x": 20.0, "y": 80.0, "width": 100.0, "height": 20.0}]}
            ]
        }))
        .unwrap();
        q.finalize();
        q
    }

    fn sheet(checked: &[(u32, u32, u32)]) -> Sheet {
        let mut s = Sheet::new(Vec::new());
        for &(q, sub, index) in checked {
            let id = BoxId {
                question: QObjectId(q, sub),
                index,
            };
            let data = BoxData {
                state: true,
                ..BoxData::default()
            };
            s.data.insert(id, data);
        }
        s
    }

    #[test]
    fn choice_ratios() {
        let q = questionnaire();
        let mut calc = Calculation::new(&q);
        calc.read(&sheet(&[(1, 1, 1)]));
        calc.read(&sheet(&[(1, 1, 1), (1, 1, 2)]));
        calc.read(&sheet(&[]));
        calc.read(&sheet(&[(1, 1, 2)]));
        let stats = calc.calculate();
        assert_eq!(stats.count, 4);
        let choice = stats.question(QObjectId(1, 1)).unwrap();
        assert_eq!(choice.count, 4);
        match &choice.stats {
            QuestionStats::Choice { values, .. } => {
                assert_abs_diff_eq!(values[&1], 0.5);
                assert_abs_diff_eq!(values[&2], 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(stats.question(QObjectId(1, 0)).is_none());
    }

    #[test]
    fn range_mean_skips_invalid_and_extra_boxes() {
        let q = questionnaire();
        let mut calc = Calculation::new(&q);
        calc.read(&sheet(&[(1, 2, 1)]));
        calc.read(&sheet(&[(1, 2, 3)]));
        calc.read(&sheet(&[(1, 2, 3)]));
        // Two boxes checked: invalid, not counted.
        calc.read(&sheet(&[(1, 2, 1), (1, 2, 2)]));
        // The box outside the scale counts as an answer but not for the mean.
        calc.read(&sheet(&[(1, 2, 4)]));
        let stats = calc.calculate();
        let range = stats.question(QObjectId(1, 2)).unwrap();
        assert_eq!(range.count, 4);
        match &range.stats {
            QuestionStats::Range {
                values,
                range_values,
                mean,
                standard_deviation,
                ..
            } => {
                assert_abs_diff_eq!(*mean, 7.0 / 3.0, epsilon = 1e-12);
                let var = (1.0 * (1.0 - 7.0 / 3.0f64).powi(2) + 2.0 * (3.0 - 7.0 / 3.0f64).powi(2)) / 3.0;
                assert_abs_diff_eq!(*standard_deviation, var.sqrt(), epsilon = 1e-12);
                assert_abs_diff_eq!(range_values[&3], 0.5);
                assert_abs_diff_eq!(values[&4], 0.25);
                assert!(!values.contains_key(&1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn text_counts_filled_boxes() {
        let q = questionnaire();
        let mut calc = Calculation::new(&q);
        calc.read(&sheet(&[(1, 3, 1)]));
        calc.read(&sheet(&[]));
        let stats = calc.calculate();
        let text = stats.question(QObjectId(1, 3)).unwrap();
        assert_eq!(text.count, 2);
        assert_eq!(text.stats, QuestionStats::Text { filled: 1 });
    }

    #[test]
    fn reference_flags_large_deviations() {
        let q = questionnaire();
        let mut calc = Calculation::new(&q);
        calc.read(&sheet(&[(1, 1, 1), (1, 2, 1)]));
        calc.read(&sheet(&[(1, 1, 2), (1, 2, 3)]));
        calc.reference();

        calc.reset();
        calc.read(&sheet(&[(1, 1, 1), (1, 2, 2)]));
        calc.read(&sheet(&[(1, 1, 2), (1, 2, 2)]));
        let stats = calc.calculate();
        match &stats.question(QObjectId(1, 1)).unwrap().stats {
            QuestionStats::Choice { significant, .. } => {
                assert!(!significant[&1] && !significant[&2])
            }
            other => panic!("unexpected {other:?}"),
        }
        // Same mean of 2, different spread.
        match &stats.question(QObjectId(1, 2)).unwrap().stats {
            QuestionStats::Range { significant, .. } => assert!(!significant),
            other => panic!("unexpected {other:?}"),
        }

        calc.reset();
        calc.read(&sheet(&[(1, 1, 1), (1, 2, 3)]));
        let stats = calc.calculate();
        match &stats.question(QObjectId(1, 1)).unwrap().stats {
            QuestionStats::Choice { significant, .. } => {
                assert!(significant[&1] && significant[&2])
            }
            other => panic!("unexpected {other:?}"),
        }
        match &stats.question(QObjectId(1, 2)).unwrap().stats {
            QuestionStats::Range { significant, .. } => assert!(significant),
            other => panic!("unexpected {other:?}"),
        }
    }
}
