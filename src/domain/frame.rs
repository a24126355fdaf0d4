//! Single-row named feature table.
//!
//! The model consumes a positional vector, the form produces named fields.
//! `FeatureFrame` sits in between and only ever moves values by name.

use serde::Serialize;

use super::features::FeatureRecord;

/// A column expected by the model is absent from the frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected column {column:?} is missing from the feature frame")]
pub struct SchemaMismatch {
    pub column: String,
}

/// One row of named feature values, kept in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureFrame {
    columns: Vec<(String, f64)>,
}

impl FeatureFrame {
    /// Build a frame from a record under its canonical names (construction order).
    #[must_use]
    pub fn from_record(record: &FeatureRecord) -> Self {
        Self {
            columns: record
                .named_values()
                .iter()
                .map(|(name, value)| ((*name).to_string(), *value))
                .collect(),
        }
    }

    /// Build a frame from arbitrary `(name, value)` pairs.
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            columns: pairs.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    /// Project the frame onto `order`.
    ///
    /// Columns not named in `order` are dropped.
    ///
    /// # Errors
    /// Returns `SchemaMismatch` for the first name in `order` the frame lacks.
    pub fn select<S: AsRef<str>>(&self, order: &[S]) -> Result<Self, SchemaMismatch> {
        let columns = order
            .iter()
            .map(|wanted| {
                let wanted = wanted.as_ref();
                self.get(wanted)
                    .map(|v| (wanted.to_string(), v))
                    .ok_or_else(|| SchemaMismatch {
                        column: wanted.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }

    /// Value of a named column.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Positional values, the shape a model consumes.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.columns.iter().map(|(_, v)| *v).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), *v))
    }
}
