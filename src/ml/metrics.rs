use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[usize], predicted: &[usize]) -> Self {
        let mut m = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t == 1, p == 1) {
                (false, false) => m.true_negative += 1,
                (false, true) => m.false_positive += 1,
                (true, false) => m.false_negative += 1,
                (true, true) => m.true_positive += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negative + self.true_positive, self.total())
    }

    /// Precision, recall and F1 treating `class` as the positive label.
    pub fn scores(&self, class: usize) -> ClassScores {
        let (hits, false_alarms, misses) = if class == 1 {
            (self.true_positive, self.false_positive, self.false_negative)
        } else {
            (self.true_negative, self.false_negative, self.false_positive)
        };
        let precision = ratio(hits, hits + false_alarms);
        let recall = ratio(hits, hits + misses);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassScores {
            precision,
            recall,
            f1,
            support: hits + misses,
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.total().to_string().len();
        writeln!(f, "[[{:>width$} {:>width$}]", self.true_negative, self.false_positive)?;
        write!(f, " [{:>width$} {:>width$}]]", self.false_negative, self.true_positive)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Area under the ROC curve via the rank-sum statistic, ties averaged.
///
/// Returns `None` when only one class is present.
pub fn roc_auc(truth: &[usize], scores: &[f64]) -> Option<f64> {
    let positives = truth.iter().filter(|&&t| t == 1).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // 1-based average rank of the tied run
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }

    let positive_rank_sum: f64 = truth
        .iter()
        .zip(&ranks)
        .filter(|(&t, _)| t == 1)
        .map(|(_, r)| r)
        .sum();
    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Held-out test partition report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub no_stroke: ClassScores,
    pub stroke: ClassScores,
    pub accuracy: f64,
    pub roc_auc: Option<f64>,
}

impl Evaluation {
    pub fn new(truth: &[usize], probabilities: &[f64], threshold: f64) -> Self {
        let predicted: Vec<usize> = probabilities.iter().map(|&p| usize::from(p >= threshold)).collect();
        let confusion = ConfusionMatrix::from_predictions(truth, &predicted);
        Self {
            no_stroke: confusion.scores(0),
            stroke: confusion.scores(1),
            accuracy: confusion.accuracy(),
            roc_auc: roc_auc(truth, probabilities),
            confusion,
        }
    }

    pub fn macro_avg(&self) -> ClassScores {
        let (a, b) = (&self.no_stroke, &self.stroke);
        ClassScores {
            precision: (a.precision + b.precision) / 2.0,
            recall: (a.recall + b.recall) / 2.0,
            f1: (a.f1 + b.f1) / 2.0,
            support: a.support + b.support,
        }
    }

    pub fn weighted_avg(&self) -> ClassScores {
        let (a, b) = (&self.no_stroke, &self.stroke);
        let support = a.support + b.support;
        let weigh = |x: f64, y: f64| {
            if support == 0 {
                0.0
            } else {
                (x * a.support as f64 + y * b.support as f64) / support as f64
            }
        };
        ClassScores {
            precision: weigh(a.precision, b.precision),
            recall: weigh(a.recall, b.recall),
            f1: weigh(a.f1, b.f1),
            support,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Confusion Matrix (Test Set):")?;
        writeln!(f, "{}", self.confusion)?;
        writeln!(f)?;
        writeln!(f, "Classification Report (Test Set):")?;
        writeln!(f, "{:>16} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for (name, s) in [("No Stroke (0)", &self.no_stroke), ("Stroke (1)", &self.stroke)] {
            writeln!(
                f,
                "{:>16} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, s.precision, s.recall, s.f1, s.support
            )?;
        }
        let total = self.no_stroke.support + self.stroke.support;
        writeln!(f)?;
        writeln!(f, "{:>16} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, total)?;

        for (name, avg) in [("macro avg", self.macro_avg()), ("weighted avg", self.weighted_avg())] {
            writeln!(
                f,
                "{:>16} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, total
            )?;
        }
        writeln!(f)?;
        match self.roc_auc {
            Some(auc) => write!(f, "ROC AUC Score (Test Set): {auc:.4}"),
            None => write!(f, "ROC AUC Score (Test Set): undefined (single class)"),
        }
    }
}
