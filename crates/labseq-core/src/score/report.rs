//! One-row performance report over every supported metric.

use super::{ClassifierScorer, Metric};
use labseq_common::Result;
use serde::{Deserialize, Serialize};

/// Class balance of the test labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positives: usize,
    pub negatives: usize,
}

/// One scored metric, under its report label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub label: String,
    pub value: f64,
}

/// Flat report row: identification, class balance, one entry per
/// supported metric, and the hyperparameter description.
///
/// `precision_at_k` appears as `precision_at_10_percent`, scored at
/// `k = test_size / 10` (at least 1). Entry order matches
/// [`Metric::SUPPORTED`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub model: String,
    pub test_size: usize,
    pub y_test_counts: LabelCounts,
    pub scores: Vec<ScoreEntry>,
    pub hyperparams: String,
}

impl ScoreReport {
    /// Column labels in row order, for tabular rendering.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec!["model", "test_size", "y_test_counts"];
        names.extend(self.scores.iter().map(|s| s.label.as_str()));
        names.push("hyperparams");
        names
    }
}

impl ClassifierScorer {
    /// Score every supported metric into one report row.
    pub fn build_report(&self, model: &str, hyperparams: &str) -> Result<ScoreReport> {
        let positives = self.y_test.iter().filter(|&&t| t).count();
        let mut scores = Vec::with_capacity(Metric::SUPPORTED.len());
        for metric in Metric::SUPPORTED {
            let entry = if metric == Metric::PrecisionAtK {
                let k = (self.test_size() / 10).max(1);
                ScoreEntry {
                    label: "precision_at_10_percent".to_string(),
                    value: self.score(metric, Some(k))?,
                }
            } else {
                ScoreEntry {
                    label: metric.name().to_string(),
                    value: self.score(metric, None)?,
                }
            };
            scores.push(entry);
        }
        Ok(ScoreReport {
            model: model.to_string(),
            test_size: self.test_size(),
            y_test_counts: LabelCounts {
                positives,
                negatives: self.test_size() - positives,
            },
            scores,
            hyperparams: hyperparams.to_string(),
        })
    }
}
