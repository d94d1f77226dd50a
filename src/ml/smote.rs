//! Synthetic minority oversampling.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ModelError;

/// Neighbour count used for a minority class of the given size.
///
/// Shrinks toward 1 so small minority classes can still be oversampled.
pub fn neighbor_count(minority: usize, max_neighbors: usize) -> usize {
    if minority > 1 {
        max_neighbors.min(minority - 1).max(1)
    } else {
        1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Smote {
    pub max_neighbors: usize,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct Resampled {
    pub records: Array2<f64>,
    pub labels: Vec<usize>,
    pub neighbors: usize,
}

fn distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

impl Smote {
    /// Tops the minority class of a binary problem up to the majority count.
    pub fn resample(&self, records: &Array2<f64>, labels: &[usize]) -> Result<Resampled, ModelError> {
        if labels.is_empty() {
            return Err(ModelError::Empty);
        }
        if records.nrows() != labels.len() {
            return Err(ModelError::Shape {
                expected: labels.len(),
                actual: records.nrows(),
            });
        }

        let positives = labels.iter().filter(|&&l| l == 1).count();
        let negatives = labels.len() - positives;
        if positives == 0 {
            return Err(ModelError::DegenerateClasses(1));
        }
        if negatives == 0 {
            return Err(ModelError::DegenerateClasses(0));
        }

        let (minority_label, minority_count, majority_count) = if positives <= negatives {
            (1, positives, negatives)
        } else {
            (0, negatives, positives)
        };
        let k = neighbor_count(minority_count, self.max_neighbors);

        let minority: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == minority_label)
            .map(|(i, _)| i)
            .collect();

        let neighbors: Vec<Vec<usize>> = minority
            .iter()
            .map(|&i| {
                if minority.len() == 1 {
                    return vec![i];
                }
                let mut ranked: Vec<(f64, usize)> = minority
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| (distance(records.row(i), records.row(j)), j))
                    .collect();
                ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                ranked.into_iter().take(k).map(|(_, j)| j).collect()
            })
            .collect();

        let n_new = majority_count - minority_count;
        let width = records.ncols();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut flat: Vec<f64> = records.iter().copied().collect();
        flat.reserve(n_new * width);

        for _ in 0..n_new {
            let pick = rng.gen_range(0..minority.len());
            let base = records.row(minority[pick]);
            let candidates = &neighbors[pick];
            let neighbor = records.row(candidates[rng.gen_range(0..candidates.len())]);
            let gap: f64 = rng.gen();
            flat.extend(base.iter().zip(neighbor.iter()).map(|(x, n)| x + gap * (n - x)));
        }

        let mut out_labels = labels.to_vec();
        out_labels.extend(std::iter::repeat(minority_label).take(n_new));

        let records = Array2::from_shape_vec((out_labels.len(), width), flat).map_err(|_| ModelError::Shape {
            expected: width,
            actual: 0,
        })?;

        Ok(Resampled {
            records,
            labels: out_labels,
            neighbors: k,
        })
    }
}
