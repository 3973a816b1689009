use {
    crate::{
        domain::Move,
        utils::{f1_from, mean, safe_ratio},
    },
    serde::{Deserialize, Serialize},
};

/// 3x3 counts indexed `[true][predicted]` in the fixed order down, neutral, up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[u64; 3]; 3],
}

impl ConfusionMatrix {
    pub fn from_counts(counts: [[u64; 3]; 3]) -> Self {
        Self { counts }
    }

    /// Counts one pair. Returns false (and counts nothing) when either side is `Unknown`.
    pub fn record(&mut self, truth: Move, predicted: Move) -> bool {
        match (truth.index(), predicted.index()) {
            (Some(t), Some(p)) => {
                self.counts[t][p] += 1;
                true
            }
            _ => false,
        }
    }

    pub fn counts(&self) -> &[[u64; 3]; 3] {
        &self.counts
    }

    /// 0 for any `Unknown` coordinate.
    pub fn get(&self, truth: Move, predicted: Move) -> u64 {
        match (truth.index(), predicted.index()) {
            (Some(t), Some(p)) => self.counts[t][p],
            _ => 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Support of a true class.
    pub fn row_sum(&self, idx: usize) -> u64 {
        self.counts[idx].iter().sum()
    }

    /// How often a class was predicted.
    pub fn col_sum(&self, idx: usize) -> u64 {
        self.counts.iter().map(|row| row[idx]).sum()
    }

    pub fn diagonal_sum(&self) -> u64 {
        (0..3).map(|i| self.counts[i][i]).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: Move,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Classification report for one set of (true, predicted) pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub matrix: ConfusionMatrix,
    /// Always three entries, in `Move::SCORED` order.
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub weighted_precision: f64,
    pub weighted_recall: f64,
    pub weighted_f1: f64,
}

impl Evaluation {
    /// Number of scored pairs.
    pub fn total(&self) -> u64 {
        self.matrix.total()
    }

    pub fn class(&self, class: Move) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|m| m.class == class)
    }
}

pub struct Evaluator;

impl Evaluator {
    /// Builds the matrix from `pairs` (skipping any with an `Unknown` side) and derives the metrics.
    pub fn evaluate<I>(pairs: I) -> Evaluation
    where
        I: IntoIterator<Item = (Move, Move)>,
    {
        let mut matrix = ConfusionMatrix::default();
        let mut skipped = 0usize;
        for (truth, predicted) in pairs {
            if !matrix.record(truth, predicted) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::debug!("Evaluator skipped {} pairs with an unknown side", skipped);
        }
        Self::from_matrix(matrix)
    }

    /// Metrics for an existing matrix (e.g. one read back from disk).
    pub fn from_matrix(matrix: ConfusionMatrix) -> Evaluation {
        let per_class: Vec<ClassMetrics> = Move::SCORED
            .iter()
            .enumerate()
            .map(|(i, &class)| {
                let tp = matrix.counts()[i][i] as f64;
                let precision = safe_ratio(tp, matrix.col_sum(i) as f64);
                let recall = safe_ratio(tp, matrix.row_sum(i) as f64);
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1: f1_from(precision, recall),
                    support: matrix.row_sum(i),
                }
            })
            .collect();

        let total = matrix.total() as f64;
        let weighted = |pick: fn(&ClassMetrics) -> f64| {
            safe_ratio(
                per_class.iter().map(|m| pick(m) * m.support as f64).sum(),
                total,
            )
        };
        let precisions: Vec<f64> = per_class.iter().map(|m| m.precision).collect();
        let recalls: Vec<f64> = per_class.iter().map(|m| m.recall).collect();
        let f1s: Vec<f64> = per_class.iter().map(|m| m.f1).collect();

        Evaluation {
            accuracy: safe_ratio(matrix.diagonal_sum() as f64, total),
            macro_precision: mean(&precisions),
            macro_recall: mean(&recalls),
            macro_f1: mean(&f1s),
            weighted_precision: weighted(|m| m.precision),
            weighted_recall: weighted(|m| m.recall),
            weighted_f1: weighted(|m| m.f1),
            per_class,
            matrix,
        }
    }

    /// Macro F1 only. Absent classes contribute 0.
    pub fn macro_f1<I>(pairs: I) -> f64
    where
        I: IntoIterator<Item = (Move, Move)>,
    {
        Self::evaluate(pairs).macro_f1
    }
}
