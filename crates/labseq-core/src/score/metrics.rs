//! Metric kernels for binary classifier scoring.
//!
//! Every kernel takes plain slices plus, where probabilities matter, a
//! precomputed `order`: row indices sorted by descending probability with
//! ties kept in input order. Inputs are validated by the scorer before any
//! kernel runs, so slices are non-empty, equal length, and `y_test` holds
//! both classes.

/// Confusion counts over the full prediction vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Confusion {
    pub true_positive: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_negative: u64,
}

pub(crate) fn confusion(y_test: &[bool], y_pred: &[bool]) -> Confusion {
    let mut c = Confusion::default();
    for (&truth, &pred) in y_test.iter().zip(y_pred) {
        match (truth, pred) {
            (true, true) => c.true_positive += 1,
            (false, true) => c.false_positive += 1,
            (true, false) => c.false_negative += 1,
            (false, false) => c.true_negative += 1,
        }
    }
    c
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub(crate) fn accuracy(y_test: &[bool], y_pred: &[bool]) -> f64 {
    let c = confusion(y_test, y_pred);
    ratio(
        c.true_positive + c.true_negative,
        c.true_positive + c.true_negative + c.false_positive + c.false_negative,
    )
}

pub(crate) fn precision(y_test: &[bool], y_pred: &[bool]) -> f64 {
    let c = confusion(y_test, y_pred);
    ratio(c.true_positive, c.true_positive + c.false_positive)
}

pub(crate) fn recall(y_test: &[bool], y_pred: &[bool]) -> f64 {
    let c = confusion(y_test, y_pred);
    ratio(c.true_positive, c.true_positive + c.false_negative)
}

pub(crate) fn f1(y_test: &[bool], y_pred: &[bool]) -> f64 {
    let p = precision(y_test, y_pred);
    let r = recall(y_test, y_pred);
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

/// Precision over the top-`k` rows by probability, scored against the
/// predicted labels of that slice (zero when the slice predicts no
/// positives).
pub(crate) fn precision_at_k(y_test: &[bool], y_pred: &[bool], order: &[usize], k: usize) -> f64 {
    let mut true_positive = 0u64;
    let mut predicted_positive = 0u64;
    for &i in &order[..k] {
        if y_pred[i] {
            predicted_positive += 1;
            if y_test[i] {
                true_positive += 1;
            }
        }
    }
    ratio(true_positive, predicted_positive)
}

/// Precision-at-k for every k in `1..=n`, in one cumulative pass.
pub(crate) fn precision_at_k_curve(
    y_test: &[bool],
    y_pred: &[bool],
    order: &[usize],
) -> (Vec<usize>, Vec<f64>) {
    let mut k_vals = Vec::with_capacity(order.len());
    let mut precision_vals = Vec::with_capacity(order.len());
    let mut true_positive = 0u64;
    let mut predicted_positive = 0u64;
    for (k, &i) in order.iter().enumerate() {
        if y_pred[i] {
            predicted_positive += 1;
            if y_test[i] {
                true_positive += 1;
            }
        }
        k_vals.push(k + 1);
        precision_vals.push(ratio(true_positive, predicted_positive));
    }
    (k_vals, precision_vals)
}

/// Fraction `k*/n` where `k*` is the last k whose precision-at-k reaches
/// `desired_precision`, defaulting to 1 when no k qualifies.
pub(crate) fn k_percentile_precision(
    y_test: &[bool],
    y_pred: &[bool],
    order: &[usize],
    desired_precision: f64,
) -> f64 {
    let (k_vals, precision_vals) = precision_at_k_curve(y_test, y_pred, order);
    let mut threshold_k = k_vals[0];
    for (&k, &p) in k_vals.iter().zip(&precision_vals) {
        if p >= desired_precision {
            threshold_k = k;
        }
    }
    threshold_k as f64 / k_vals.len() as f64
}

/// Fraction of all rows that are actual positives within the deepest
/// top-k slice (k ranging over `1..n`) whose precision-at-k still reaches
/// `desired_precision`; zero when no k qualifies.
pub(crate) fn percent_predictably_positive(
    y_test: &[bool],
    y_pred: &[bool],
    order: &[usize],
    desired_precision: f64,
) -> f64 {
    let n = order.len();
    let mut true_positive = 0u64;
    let mut predicted_positive = 0u64;
    let mut actual_positive = 0u64;
    let mut qualifying_positives = 0u64;
    for &i in &order[..n - 1] {
        if y_test[i] {
            actual_positive += 1;
        }
        if y_pred[i] {
            predicted_positive += 1;
            if y_test[i] {
                true_positive += 1;
            }
        }
        if predicted_positive > 0
            && ratio(true_positive, predicted_positive) >= desired_precision
        {
            qualifying_positives = actual_positive;
        }
    }
    qualifying_positives as f64 / n as f64
}

/// Precision-recall pairs, one point per distinct probability in
/// decreasing-probability order.
#[derive(Debug, Clone, PartialEq)]
pub struct PrCurve {
    pub precisions: Vec<f64>,
    pub recalls: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// ROC points, one per distinct probability in decreasing-probability
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub false_positive_rates: Vec<f64>,
    pub true_positive_rates: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Walk `order` in descending-probability threshold groups, yielding the
/// cumulative (true positive, false positive) counts after each group.
fn threshold_groups(
    y_test: &[bool],
    y_prob: &[f64],
    order: &[usize],
) -> Vec<(f64, u64, u64)> {
    let mut points = Vec::new();
    let mut true_positive = 0u64;
    let mut false_positive = 0u64;
    let mut idx = 0;
    while idx < order.len() {
        let threshold = y_prob[order[idx]];
        while idx < order.len() && y_prob[order[idx]] == threshold {
            if y_test[order[idx]] {
                true_positive += 1;
            } else {
                false_positive += 1;
            }
            idx += 1;
        }
        points.push((threshold, true_positive, false_positive));
    }
    points
}

pub(crate) fn precision_recall_curve(
    y_test: &[bool],
    y_prob: &[f64],
    order: &[usize],
) -> PrCurve {
    let total_positive = y_test.iter().filter(|&&t| t).count() as u64;
    let mut curve = PrCurve {
        precisions: Vec::new(),
        recalls: Vec::new(),
        thresholds: Vec::new(),
    };
    for (threshold, tp, fp) in threshold_groups(y_test, y_prob, order) {
        curve.precisions.push(ratio(tp, tp + fp));
        curve.recalls.push(ratio(tp, total_positive));
        curve.thresholds.push(threshold);
    }
    curve
}

pub(crate) fn roc_curve(y_test: &[bool], y_prob: &[f64], order: &[usize]) -> RocCurve {
    let total_positive = y_test.iter().filter(|&&t| t).count() as u64;
    let total_negative = y_test.len() as u64 - total_positive;
    let mut curve = RocCurve {
        false_positive_rates: Vec::new(),
        true_positive_rates: Vec::new(),
        thresholds: Vec::new(),
    };
    for (threshold, tp, fp) in threshold_groups(y_test, y_prob, order) {
        curve.false_positive_rates.push(ratio(fp, total_negative));
        curve.true_positive_rates.push(ratio(tp, total_positive));
        curve.thresholds.push(threshold);
    }
    curve
}

/// Step-function average precision: sum of `(R_i - R_{i-1}) * P_i` over
/// threshold groups.
pub(crate) fn average_precision(y_test: &[bool], y_prob: &[f64], order: &[usize]) -> f64 {
    let total_positive = y_test.iter().filter(|&&t| t).count() as u64;
    let mut score = 0.0;
    let mut prev_recall = 0.0;
    for (_, tp, fp) in threshold_groups(y_test, y_prob, order) {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, total_positive);
        score += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    score
}

/// Trapezoidal area under the ROC curve, with equal probabilities folded
/// into one point so ties contribute a sloped segment instead of a step.
pub(crate) fn roc_auc(y_test: &[bool], y_prob: &[f64], order: &[usize]) -> f64 {
    let total_positive = y_test.iter().filter(|&&t| t).count() as u64;
    let total_negative = y_test.len() as u64 - total_positive;
    let mut area = 0.0;
    let mut prev_tp = 0u64;
    let mut prev_fp = 0u64;
    for (_, tp, fp) in threshold_groups(y_test, y_prob, order) {
        area += (fp - prev_fp) as f64 * (tp + prev_tp) as f64 / 2.0;
        prev_tp = tp;
        prev_fp = fp;
    }
    area / (total_positive as f64 * total_negative as f64)
}
