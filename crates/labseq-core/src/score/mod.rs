//! Binary classifier performance scoring.
//!
//! [`ClassifierScorer`] holds one test set's actual labels, predicted
//! labels, and predicted positive-class probabilities, validates them
//! once, and scores any [`Metric`] against them. Probability-ranked
//! metrics share a single precomputed ordering: indices sorted by
//! descending probability, ties keeping input order.

pub mod metrics;
mod report;

pub use metrics::{PrCurve, RocCurve};
pub use report::{LabelCounts, ScoreEntry, ScoreReport};

use labseq_common::{Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A supported performance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Accuracy,
    Recall,
    Precision,
    F1,
    AveragePrecision,
    PercentPredictablyPositive,
    /// Requires the `k` argument to [`ClassifierScorer::score`].
    PrecisionAtK,
    KPrecision99,
    KPrecision95,
    KPrecision90,
    RocAuc,
}

impl Metric {
    /// All metrics, in report column order.
    pub const SUPPORTED: [Metric; 11] = [
        Metric::Accuracy,
        Metric::Recall,
        Metric::Precision,
        Metric::F1,
        Metric::AveragePrecision,
        Metric::PercentPredictablyPositive,
        Metric::PrecisionAtK,
        Metric::KPrecision99,
        Metric::KPrecision95,
        Metric::KPrecision90,
        Metric::RocAuc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Recall => "recall",
            Metric::Precision => "precision",
            Metric::F1 => "f1",
            Metric::AveragePrecision => "average_precision",
            Metric::PercentPredictablyPositive => "percent_predictably_positive",
            Metric::PrecisionAtK => "precision_at_k",
            Metric::KPrecision99 => "k(precision=0.99)",
            Metric::KPrecision95 => "k(precision=0.95)",
            Metric::KPrecision90 => "k(precision=0.90)",
            Metric::RocAuc => "roc_auc",
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Accuracy
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Metric::SUPPORTED
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| Error::UnsupportedMetric {
                name: s.to_string(),
            })
    }
}

/// Scores a fixed test set against a classifier's outputs.
#[derive(Debug, Clone)]
pub struct ClassifierScorer {
    y_test: Vec<bool>,
    y_pred: Vec<bool>,
    y_prob: Vec<f64>,
    /// Indices into the arrays, sorted by descending probability; ties
    /// keep input order. Computed once, shared by all ranked metrics.
    order: Vec<usize>,
}

impl ClassifierScorer {
    /// Validate and take ownership of one test set's outputs.
    ///
    /// Fails on empty input, length mismatches, probabilities outside
    /// `[0, 1]`, and a `y_test` containing only one class; no metric is
    /// scored against invalid input.
    pub fn new(y_test: Vec<bool>, y_pred: Vec<bool>, y_prob: Vec<f64>) -> Result<Self> {
        if y_test.is_empty() {
            return Err(Error::EmptyInput("y_test".into()));
        }
        if y_pred.len() != y_test.len() {
            return Err(Error::LengthMismatch {
                field: "y_pred".into(),
                expected: y_test.len(),
                actual: y_pred.len(),
            });
        }
        if y_prob.len() != y_test.len() {
            return Err(Error::LengthMismatch {
                field: "y_prob".into(),
                expected: y_test.len(),
                actual: y_prob.len(),
            });
        }
        if let Some(&p) = y_prob.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(Error::InvalidProbability(p));
        }
        let positives = y_test.iter().filter(|&&t| t).count();
        if positives == 0 || positives == y_test.len() {
            return Err(Error::SingleClass {
                label: y_test[0].to_string(),
            });
        }
        debug!(
            test_size = y_test.len(),
            positives,
            negatives = y_test.len() - positives,
            "scorer input validated"
        );

        let mut order: Vec<usize> = (0..y_prob.len()).collect();
        order.sort_by(|&a, &b| y_prob[b].total_cmp(&y_prob[a]));
        Ok(ClassifierScorer {
            y_test,
            y_pred,
            y_prob,
            order,
        })
    }

    /// Number of test rows.
    pub fn test_size(&self) -> usize {
        self.y_test.len()
    }

    /// Compute one metric. `k` is consulted only by
    /// [`Metric::PrecisionAtK`], which requires `0 < k <= test_size`.
    pub fn score(&self, metric: Metric, k: Option<usize>) -> Result<f64> {
        let value = match metric {
            Metric::Accuracy => metrics::accuracy(&self.y_test, &self.y_pred),
            Metric::Recall => metrics::recall(&self.y_test, &self.y_pred),
            Metric::Precision => metrics::precision(&self.y_test, &self.y_pred),
            Metric::F1 => metrics::f1(&self.y_test, &self.y_pred),
            Metric::AveragePrecision => {
                metrics::average_precision(&self.y_test, &self.y_prob, &self.order)
            }
            Metric::RocAuc => metrics::roc_auc(&self.y_test, &self.y_prob, &self.order),
            Metric::KPrecision99 => self.k_percentile_precision(0.99),
            Metric::KPrecision95 => self.k_percentile_precision(0.95),
            Metric::KPrecision90 => self.k_percentile_precision(0.90),
            Metric::PercentPredictablyPositive => metrics::percent_predictably_positive(
                &self.y_test,
                &self.y_pred,
                &self.order,
                0.99,
            ),
            Metric::PrecisionAtK => {
                let k = k.ok_or_else(|| Error::MissingParameter {
                    metric: Metric::PrecisionAtK.name().into(),
                    name: "k".into(),
                })?;
                if k == 0 || k > self.y_test.len() {
                    return Err(Error::Config(format!(
                        "precision_at_k needs 0 < k <= {}, got {k}",
                        self.y_test.len()
                    )));
                }
                metrics::precision_at_k(&self.y_test, &self.y_pred, &self.order, k)
            }
        };
        Ok(value)
    }

    fn k_percentile_precision(&self, desired_precision: f64) -> f64 {
        metrics::k_percentile_precision(&self.y_test, &self.y_pred, &self.order, desired_precision)
    }

    /// Precision-at-k for every k in `1..=test_size`.
    pub fn precision_at_k_curve(&self) -> (Vec<usize>, Vec<f64>) {
        metrics::precision_at_k_curve(&self.y_test, &self.y_pred, &self.order)
    }

    pub fn precision_recall_curve(&self) -> PrCurve {
        metrics::precision_recall_curve(&self.y_test, &self.y_prob, &self.order)
    }

    pub fn roc_curve(&self) -> RocCurve {
        metrics::roc_curve(&self.y_test, &self.y_prob, &self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> ClassifierScorer {
        ClassifierScorer::new(
            vec![false, false, true, true],
            vec![false, true, true, true],
            vec![0.1, 0.6, 0.7, 0.9],
        )
        .unwrap()
    }

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::SUPPORTED {
            assert_eq!(metric.name().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_unknown_metric_name() {
        let err = "log_loss".parse::<Metric>().unwrap_err();
        assert_eq!(err.code(), 12);
    }

    #[test]
    fn test_scores_against_known_values() {
        let s = scorer();
        assert_eq!(s.score(Metric::Accuracy, None).unwrap(), 0.75);
        assert_eq!(s.score(Metric::Recall, None).unwrap(), 1.0);
        assert_eq!(s.score(Metric::Precision, None).unwrap(), 2.0 / 3.0);
        assert!((s.score(Metric::F1, None).unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(s.score(Metric::AveragePrecision, None).unwrap(), 1.0);
        assert_eq!(s.score(Metric::RocAuc, None).unwrap(), 1.0);
        assert_eq!(s.score(Metric::PrecisionAtK, Some(2)).unwrap(), 1.0);
        assert_eq!(s.score(Metric::KPrecision90, None).unwrap(), 0.5);
        assert_eq!(
            s.score(Metric::PercentPredictablyPositive, None).unwrap(),
            0.5
        );
    }

    #[test]
    fn test_precision_at_k_requires_k() {
        let err = scorer().score(Metric::PrecisionAtK, None).unwrap_err();
        assert_eq!(err.code(), 13);
        let err = scorer().score(Metric::PrecisionAtK, Some(0)).unwrap_err();
        assert_eq!(err.code(), 10);
        let err = scorer().score(Metric::PrecisionAtK, Some(5)).unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = ClassifierScorer::new(vec![], vec![], vec![]).unwrap_err();
        assert_eq!(err.code(), 20);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err =
            ClassifierScorer::new(vec![true, false], vec![true], vec![0.5, 0.5]).unwrap_err();
        assert_eq!(err.code(), 21);
        let err =
            ClassifierScorer::new(vec![true, false], vec![true, false], vec![0.5]).unwrap_err();
        assert_eq!(err.code(), 21);
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let err = ClassifierScorer::new(
            vec![true, false],
            vec![true, false],
            vec![0.5, 1.5],
        )
        .unwrap_err();
        assert_eq!(err.code(), 23);
        let err = ClassifierScorer::new(
            vec![true, false],
            vec![true, false],
            vec![f64::NAN, 0.5],
        )
        .unwrap_err();
        assert_eq!(err.code(), 23);
    }

    #[test]
    fn test_single_class_rejected() {
        let err = ClassifierScorer::new(
            vec![true, true],
            vec![true, false],
            vec![0.9, 0.8],
        )
        .unwrap_err();
        assert!(matches!(&err, Error::SingleClass { label } if label == "true"));
        assert_eq!(err.code(), 22);
    }
}
