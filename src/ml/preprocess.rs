use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::dataset::{FeatureSchema, PatientFeatures};
use super::ModelError;

/// Mean imputation followed by standard scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericBranch {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl NumericBranch {
    pub fn fit(rows: &[PatientFeatures], width: usize) -> Self {
        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);

        for col in 0..width {
            let present: Vec<f64> = rows
                .iter()
                .map(|r| r.numeric[col])
                .filter(|v| !v.is_nan())
                .collect();
            let mean = if present.is_empty() {
                0.0
            } else {
                present.iter().sum::<f64>() / present.len() as f64
            };

            // imputed cells sit exactly on the mean, so they only grow the denominator
            let variance = if rows.is_empty() {
                0.0
            } else {
                present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / rows.len() as f64
            };
            let std = variance.sqrt();

            means.push(mean);
            scales.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        Self { means, scales }
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    fn transform_into(&self, values: &[f64], out: &mut Vec<f64>) {
        for ((value, mean), scale) in values.iter().zip(&self.means).zip(&self.scales) {
            let imputed = if value.is_nan() { *mean } else { *value };
            out.push((imputed - mean) / scale);
        }
    }
}

/// One-hot encoding over the categories seen during fitting.
///
/// A column with missing cells in training learns "missing" as its own
/// category, sorted last. Unseen categories encode as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalBranch {
    vocabularies: Vec<Vec<Option<String>>>,
}

impl CategoricalBranch {
    pub fn fit(rows: &[PatientFeatures], width: usize) -> Self {
        let vocabularies = (0..width)
            .map(|col| {
                let mut vocabulary: Vec<Option<String>> = rows
                    .iter()
                    .filter_map(|r| r.categorical[col].clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .map(Some)
                    .collect();
                if rows.iter().any(|r| r.categorical[col].is_none()) {
                    vocabulary.push(None);
                }
                vocabulary
            })
            .collect();
        Self { vocabularies }
    }

    pub fn width(&self) -> usize {
        self.vocabularies.len()
    }

    pub fn output_width(&self) -> usize {
        self.vocabularies.iter().map(Vec::len).sum()
    }

    fn transform_into(&self, values: &[Option<String>], out: &mut Vec<f64>) {
        for (value, vocabulary) in values.iter().zip(&self.vocabularies) {
            for category in vocabulary {
                let hit = value == category;
                out.push(if hit { 1.0 } else { 0.0 });
            }
        }
    }
}

/// Column-wise concatenation of the numeric and categorical branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: NumericBranch,
    categorical: CategoricalBranch,
    output_names: Vec<String>,
}

impl Preprocessor {
    pub fn fit(schema: &FeatureSchema, rows: &[PatientFeatures]) -> Self {
        let numeric = NumericBranch::fit(rows, schema.numeric.len());
        let categorical = CategoricalBranch::fit(rows, schema.categorical.len());

        let mut output_names: Vec<String> = schema.numeric.iter().map(|n| format!("num__{n}")).collect();
        for (name, vocabulary) in schema.categorical.iter().zip(&categorical.vocabularies) {
            output_names.extend(
                vocabulary
                    .iter()
                    .map(|c| format!("cat__{name}_{}", c.as_deref().unwrap_or("nan"))),
            );
        }

        Self {
            numeric,
            categorical,
            output_names,
        }
    }

    pub fn output_width(&self) -> usize {
        self.output_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn transform(&self, row: &PatientFeatures) -> Result<Vec<f64>, ModelError> {
        let expected = self.numeric.width() + self.categorical.width();
        let actual = row.numeric.len() + row.categorical.len();
        if row.numeric.len() != self.numeric.width() || row.categorical.len() != self.categorical.width() {
            return Err(ModelError::Shape { expected, actual });
        }

        let mut out = Vec::with_capacity(self.output_width());
        self.numeric.transform_into(&row.numeric, &mut out);
        self.categorical.transform_into(&row.categorical, &mut out);
        Ok(out)
    }

    pub fn transform_batch(&self, rows: &[PatientFeatures]) -> Result<Array2<f64>, ModelError> {
        let mut flat = Vec::with_capacity(rows.len() * self.output_width());
        for row in rows {
            flat.extend(self.transform(row)?);
        }
        Array2::from_shape_vec((rows.len(), self.output_width()), flat).map_err(|_| ModelError::Shape {
            expected: self.output_width(),
            actual: rows.first().map_or(0, |r| r.numeric.len() + r.categorical.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(numeric: &[f64], categorical: &[Option<&str>]) -> PatientFeatures {
        PatientFeatures {
            numeric: numeric.to_vec(),
            categorical: categorical.iter().map(|c| c.map(str::to_string)).collect(),
        }
    }

    fn schema() -> FeatureSchema {
        FeatureSchema {
            numeric: vec!["age".into(), "bmi".into()],
            categorical: vec!["work_type".into()],
        }
    }

    fn training_rows() -> Vec<PatientFeatures> {
        vec![
            row(&[20.0, 10.0], &[Some("Private")]),
            row(&[40.0, f64::NAN], &[Some("Govt_job")]),
            row(&[60.0, 30.0], &[None]),
        ]
    }

    #[test]
    fn scales_to_zero_mean_unit_variance() {
        let pre = Preprocessor::fit(&schema(), &training_rows());
        let batch = pre.transform_batch(&training_rows()).unwrap();
        let ages = batch.column(0);
        let mean = ages.sum() / 3.0;
        let var = ages.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn imputes_missing_with_training_mean() {
        let pre = Preprocessor::fit(&schema(), &training_rows());
        let out = pre.transform(&row(&[40.0, f64::NAN], &[None])).unwrap();
        // bmi mean is 20, which standardises to zero
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn unknown_category_is_all_zero() {
        let pre = Preprocessor::fit(&schema(), &training_rows());
        let out = pre.transform(&row(&[30.0, 20.0], &[Some("Never_worked")])).unwrap();
        assert_eq!(&out[2..], &[0.0, 0.0, 0.0]);
        let known = pre.transform(&row(&[30.0, 20.0], &[Some("Private")])).unwrap();
        assert_eq!(&known[2..], &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_category_seen_in_training_gets_its_own_column() {
        let pre = Preprocessor::fit(&schema(), &training_rows());
        let out = pre.transform(&row(&[30.0, 20.0], &[None])).unwrap();
        assert_eq!(&out[2..], &[0.0, 0.0, 1.0]);

        let complete = vec![row(&[1.0, 2.0], &[Some("Private")]), row(&[3.0, 4.0], &[Some("Govt_job")])];
        let pre = Preprocessor::fit(&schema(), &complete);
        assert_eq!(pre.output_width(), 4);
        assert_eq!(&pre.transform(&row(&[1.0, 2.0], &[None])).unwrap()[2..], &[0.0, 0.0]);
    }

    #[test]
    fn names_outputs_per_branch() {
        let pre = Preprocessor::fit(&schema(), &training_rows());
        assert_eq!(
            pre.feature_names(),
            &[
                "num__age",
                "num__bmi",
                "cat__work_type_Govt_job",
                "cat__work_type_Private",
                "cat__work_type_nan"
            ]
        );
    }

    #[test]
    fn constant_column_keeps_unit_scale() {
        let rows = vec![row(&[5.0, 5.0], &[None]), row(&[5.0, 5.0], &[None])];
        let pre = Preprocessor::fit(&schema(), &rows);
        assert_eq!(pre.transform(&rows[0]).unwrap(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_wrong_width() {
        let pre = Preprocessor::fit(&schema(), &training_rows());
        let err = pre.transform(&row(&[1.0], &[None])).unwrap_err();
        assert!(matches!(err, ModelError::Shape { expected: 3, actual: 2 }));
    }
}
