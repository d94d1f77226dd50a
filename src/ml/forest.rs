//! Bootstrap-bagged ensemble of `linfa-trees` decision trees.

use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::ModelError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

/// Every tree considers all features at each split; diversity comes from
/// the bootstrap samples alone.
#[derive(Debug, Serialize, Deserialize)]
pub struct BaggedTrees {
    n_features: usize,
    trees: Vec<DecisionTree<f64, usize>>,
}

impl ForestParams {
    /// Fits every tree on its own bootstrap sample of the rows.
    ///
    /// Classes are weighted equally; rebalancing is the oversampler's job.
    pub fn fit(&self, records: &Array2<f64>, labels: &[usize]) -> Result<BaggedTrees, ModelError> {
        let n = records.nrows();
        if n == 0 || self.n_trees == 0 {
            return Err(ModelError::Empty);
        }
        if labels.len() != n {
            return Err(ModelError::Shape {
                expected: n,
                actual: labels.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut trees = Vec::with_capacity(self.n_trees);
        for _ in 0..self.n_trees {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let x = records.select(Axis(0), &sample);
            let y: Array1<usize> = sample.iter().map(|&i| labels[i]).collect();
            let dataset = Dataset::new(x, y);

            let tree = DecisionTree::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(self.max_depth)
                .fit(&dataset)
                .map_err(|e| ModelError::Fit(e.to_string()))?;
            trees.push(tree);
        }

        Ok(BaggedTrees {
            n_features: records.ncols(),
            trees,
        })
    }
}

impl BaggedTrees {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Share of trees voting for the positive class, per row.
    pub fn predict_proba(&self, records: &Array2<f64>) -> Result<Vec<f64>, ModelError> {
        if records.ncols() != self.n_features {
            return Err(ModelError::Shape {
                expected: self.n_features,
                actual: records.ncols(),
            });
        }

        let mut votes = vec![0usize; records.nrows()];
        for tree in &self.trees {
            let predicted: Array1<usize> = tree.predict(records);
            for (count, label) in votes.iter_mut().zip(predicted.iter()) {
                if *label == 1 {
                    *count += 1;
                }
            }
        }

        let total = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Vec<usize>) {
        let records = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.3],
            [0.3, 0.2],
            [5.0, 5.1],
            [5.2, 4.9],
            [4.8, 5.3],
            [5.1, 5.0]
        ];
        (records, vec![0, 0, 0, 0, 1, 1, 1, 1])
    }

    #[test]
    fn learns_a_separable_problem() {
        let (records, labels) = separable();
        let forest = ForestParams { n_trees: 25, ..Default::default() }
            .fit(&records, &labels)
            .unwrap();
        let probs = forest.predict_proba(&array![[0.1, 0.1], [5.0, 5.0]]).unwrap();
        assert!(probs[0] < 0.5);
        assert!(probs[1] >= 0.5);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn rejects_mismatched_width() {
        let (records, labels) = separable();
        let forest = ForestParams { n_trees: 3, ..Default::default() }
            .fit(&records, &labels)
            .unwrap();
        let err = forest.predict_proba(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert!(matches!(err, ModelError::Shape { expected: 2, actual: 3 }));
    }

    #[test]
    fn seeded_fits_agree() {
        let (records, labels) = separable();
        let params = ForestParams { n_trees: 10, seed: 9, max_depth: None };
        let queries = array![[2.5, 2.5], [1.0, 4.0]];
        let a = params.fit(&records, &labels).unwrap().predict_proba(&queries).unwrap();
        let b = params.fit(&records, &labels).unwrap().predict_proba(&queries).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_is_rejected() {
        let records = Array2::<f64>::zeros((0, 2));
        let err = ForestParams::default().fit(&records, &[]).unwrap_err();
        assert!(matches!(err, ModelError::Empty));
    }
}
