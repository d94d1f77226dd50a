//! CSV loading, column typing and patient record extraction.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Cell contents treated as "no value" in the dataset and in JSON strings.
pub const MISSING_TOKENS: &[&str] = &["", "N/A", "NA", "NaN", "nan", "null"];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset file `{}` not found", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column `{0}` is missing from the dataset")]
    MissingColumn(String),
    #[error("row {row}: target value `{value}` is not 0 or 1")]
    InvalidTarget { row: usize, value: String },
    #[error("dataset contains no usable rows")]
    Empty,
}

/// Why a JSON patient record could not be turned into model input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("missing data for feature `{0}`")]
    Missing(String),
    #[error("feature `{name}` has an unusable value: {value}")]
    InvalidValue { name: String, value: String },
}

/// Which columns feed the numeric and categorical branches, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

/// One patient's raw feature values, laid out per [`FeatureSchema`].
///
/// Missing numeric values are `NaN`; missing categorical values are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientFeatures {
    pub numeric: Vec<f64>,
    pub categorical: Vec<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub target_column: String,
    pub id_column: String,
    pub gender_column: String,
    /// Rows whose gender equals this value are dropped before anything else.
    pub excluded_gender: Option<String>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            target_column: "stroke".to_string(),
            id_column: "id".to_string(),
            gender_column: "gender".to_string(),
            excluded_gender: Some("Other".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub schema: FeatureSchema,
    pub rows: Vec<PatientFeatures>,
    pub labels: Vec<usize>,
}

fn is_missing(cell: &str) -> bool {
    MISSING_TOKENS.contains(&cell.trim())
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

impl LabeledDataset {
    pub fn from_path(path: &Path, options: &DatasetOptions) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        let dataset = Self::from_reader(file, options)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: io::Read>(reader: R, options: &DatasetOptions) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let position = |name: &str| headers.iter().position(|h| h == name);
        let target_idx = position(&options.target_column)
            .ok_or_else(|| DatasetError::MissingColumn(options.target_column.clone()))?;
        let id_idx = position(&options.id_column);
        let gender_idx = position(&options.gender_column);

        let mut raw_rows = Vec::new();
        let mut labels = Vec::new();
        let mut dropped = 0usize;
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            if let (Some(idx), Some(excluded)) = (gender_idx, options.excluded_gender.as_deref()) {
                if record.get(idx) == Some(excluded) {
                    dropped += 1;
                    continue;
                }
            }
            let target = record.get(target_idx).unwrap_or_default();
            let label = match parse_number(target) {
                Some(v) if v == 0.0 => 0,
                Some(v) if v == 1.0 => 1,
                _ => {
                    return Err(DatasetError::InvalidTarget {
                        row: line + 1,
                        value: target.to_string(),
                    })
                }
            };
            labels.push(label);
            raw_rows.push(record);
        }
        if raw_rows.is_empty() {
            return Err(DatasetError::Empty);
        }
        if dropped > 0 {
            info!(dropped, "removed rows with excluded gender category");
        }

        let feature_columns: Vec<usize> = (0..headers.len())
            .filter(|&idx| idx != target_idx && Some(idx) != id_idx)
            .collect();

        // a column is numeric when every present cell parses as a number
        let (numeric_idx, categorical_idx): (Vec<usize>, Vec<usize>) =
            feature_columns.into_iter().partition(|&idx| {
                raw_rows.iter().all(|row| {
                    let cell = row.get(idx).unwrap_or_default();
                    is_missing(cell) || parse_number(cell).is_some()
                })
            });

        let schema = FeatureSchema {
            numeric: numeric_idx.iter().map(|&i| headers[i].clone()).collect(),
            categorical: categorical_idx.iter().map(|&i| headers[i].clone()).collect(),
        };

        let rows = raw_rows
            .iter()
            .map(|row| PatientFeatures {
                numeric: numeric_idx
                    .iter()
                    .map(|&i| {
                        let cell = row.get(i).unwrap_or_default();
                        if is_missing(cell) {
                            f64::NAN
                        } else {
                            parse_number(cell).unwrap_or(f64::NAN)
                        }
                    })
                    .collect(),
                categorical: categorical_idx
                    .iter()
                    .map(|&i| {
                        let cell = row.get(i).unwrap_or_default();
                        (!is_missing(cell)).then(|| cell.to_string())
                    })
                    .collect(),
            })
            .collect();

        Ok(Self { schema, rows, labels })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Share of each class, `(negative, positive)`.
    pub fn class_ratio(&self) -> (f64, f64) {
        class_ratio(&self.labels)
    }
}

pub fn class_ratio(labels: &[usize]) -> (f64, f64) {
    if labels.is_empty() {
        return (0.0, 0.0);
    }
    let positive = labels.iter().filter(|&&l| l == 1).count() as f64;
    let total = labels.len() as f64;
    ((total - positive) / total, positive / total)
}

impl FeatureSchema {
    pub fn width(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    /// Pulls the schema's columns out of a JSON object.
    ///
    /// Keys outside the schema (including the identifier) are ignored. The
    /// first absent column is reported as [`FeatureError::Missing`].
    pub fn extract(&self, record: &Map<String, Value>) -> Result<PatientFeatures, FeatureError> {
        let lookup = |name: &String| record.get(name).ok_or_else(|| FeatureError::Missing(name.clone()));

        let numeric = self
            .numeric
            .iter()
            .map(|name| numeric_value(name, lookup(name)?))
            .collect::<Result<Vec<_>, _>>()?;
        let categorical = self
            .categorical
            .iter()
            .map(|name| categorical_value(name, lookup(name)?))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PatientFeatures { numeric, categorical })
    }
}

fn invalid(name: &str, value: &Value) -> FeatureError {
    FeatureError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn numeric_value(name: &str, value: &Value) -> Result<f64, FeatureError> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(name, value)),
        Value::String(s) if is_missing(s) => Ok(f64::NAN),
        Value::String(s) => parse_number(s).ok_or_else(|| invalid(name, value)),
        _ => Err(invalid(name, value)),
    }
}

fn categorical_value(name: &str, value: &Value) -> Result<Option<String>, FeatureError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if is_missing(s) => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        _ => Err(invalid(name, value)),
    }
}
