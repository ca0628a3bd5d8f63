//! Trained per-attribute classifiers and their dense schema.

use provenance_rf::RandomForest;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::class::ClassValue;
use crate::data::FeatureData;
use crate::error::ModelError;
use crate::feature::{FeatureValue, ModelFeature};
use crate::model::FeatureModel;

/// Category standing in for absent or unseen nominal values.
pub const UNKNOWN_NOMINAL: &str = "UNK";

/// Value standing in for absent numeric values.
pub const UNKNOWN_NUMERIC: f64 = -1.0;

/// Most predictions returned by [`TrainedForest::classify`].
pub const MAX_PREDICTIONS: usize = 5;

/// How a column is encoded in the dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Raw `f64`.
    Numeric,
    /// Index into the category list; index 0 is [`UNKNOWN_NOMINAL`].
    Nominal(Vec<String>),
}

/// One column of the dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
}

impl Column {
    pub(crate) fn from_feature(feature: &ModelFeature) -> Self {
        let kind = match feature.domain() {
            None => ColumnKind::Numeric,
            Some(domain) => {
                let mut values = Vec::with_capacity(domain.len() + 1);
                values.push(UNKNOWN_NOMINAL.to_string());
                values.extend(domain.values());
                ColumnKind::Nominal(values)
            }
        };
        Self {
            name: feature.name().to_string(),
            kind,
        }
    }

    /// Return the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the column kind.
    #[must_use]
    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    /// Index of a category, if the column is nominal and knows it.
    pub(crate) fn category(&self, text: &str) -> Option<usize> {
        match &self.kind {
            ColumnKind::Nominal(values) => values.iter().position(|v| v == text),
            ColumnKind::Numeric => None,
        }
    }

    /// Encode a value, using the sentinels for absent or unknown values.
    pub(crate) fn encode(&self, value: Option<&FeatureValue>) -> f64 {
        match (&self.kind, value) {
            (ColumnKind::Numeric, Some(FeatureValue::Numeric(v))) => *v,
            (ColumnKind::Numeric, _) => UNKNOWN_NUMERIC,
            (ColumnKind::Nominal(_), Some(FeatureValue::Nominal(text))) => {
                let text = text.trim().to_lowercase();
                match self.category(&text) {
                    Some(i) => i as f64,
                    None => {
                        debug!(feature = %self.name, value = %text, "novel category");
                        0.0
                    }
                }
            }
            (ColumnKind::Nominal(_), _) => 0.0,
        }
    }
}

/// Column layout of a trained forest: inputs in model order, then the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSchema {
    inputs: Vec<Column>,
    output: Column,
}

impl ForestSchema {
    pub(crate) fn from_model<C: ClassValue>(model: &FeatureModel<C>) -> Self {
        Self {
            inputs: model.input_features().iter().map(Column::from_feature).collect(),
            output: Column::from_feature(model.output().feature()),
        }
    }

    /// Return the input columns.
    #[must_use]
    pub fn inputs(&self) -> &[Column] {
        &self.inputs
    }

    /// Return the output column.
    #[must_use]
    pub fn output(&self) -> &Column {
        &self.output
    }

    /// Encode sparse feature values as a dense row.
    #[must_use]
    pub fn encode_row(&self, data: &FeatureData) -> Vec<f64> {
        self.inputs.iter().map(|c| c.encode(data.get(c.name()))).collect()
    }
}

/// The dense matrix a forest was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingMatrix {
    pub(crate) rows: Vec<Vec<f64>>,
    pub(crate) labels: Vec<usize>,
}

/// A forest trained to predict one attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "C: ClassValue", deserialize = "C: ClassValue"))]
pub struct TrainedForest<C> {
    model: FeatureModel<C>,
    schema: ForestSchema,
    forest: RandomForest,
    classes: Vec<Option<C>>,
    #[serde(skip)]
    matrix: Option<TrainingMatrix>,
}

impl<C: ClassValue> TrainedForest<C> {
    pub(crate) fn new(
        model: FeatureModel<C>,
        schema: ForestSchema,
        forest: RandomForest,
        classes: Vec<Option<C>>,
        matrix: Option<TrainingMatrix>,
    ) -> Self {
        Self {
            model,
            schema,
            forest,
            classes,
            matrix,
        }
    }

    /// Return the feature model, closed at build time.
    #[must_use]
    pub fn feature_model(&self) -> &FeatureModel<C> {
        &self.model
    }

    /// Return the column layout.
    #[must_use]
    pub fn schema(&self) -> &ForestSchema {
        &self.schema
    }

    /// Return the underlying forest.
    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// Return `true` if the training matrix was kept.
    #[must_use]
    pub fn has_training_matrix(&self) -> bool {
        self.matrix.is_some()
    }

    /// Predict classes for sparse feature values, most probable first.
    ///
    /// Only classes with non-zero probability are returned, at most
    /// [`MAX_PREDICTIONS`] of them.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Training`] if the forest rejects the row.
    pub fn classify(&self, data: &FeatureData) -> Result<Vec<(C, f64)>, ModelError> {
        let row = self.schema.encode_row(data);
        let distribution = self.forest.predict_proba(&row)?;
        Ok(distribution
            .top_k(MAX_PREDICTIONS)
            .into_iter()
            .filter_map(|(i, p)| self.classes.get(i).cloned().flatten().map(|c| (c, p)))
            .collect())
    }

    /// Render the kept training matrix as ARFF, or `None` if it was dropped.
    #[must_use]
    pub fn to_arff(&self, relation: &str) -> Option<String> {
        let matrix = self.matrix.as_ref()?;
        let mut out = String::new();
        out.push_str(&format!("@relation {}\n\n", arff_quote(relation)));
        for column in self.schema.inputs.iter().chain(std::iter::once(&self.schema.output)) {
            let kind = match &column.kind {
                ColumnKind::Numeric => "numeric".to_string(),
                ColumnKind::Nominal(values) => {
                    let values: Vec<String> = values.iter().map(|v| arff_quote(v)).collect();
                    format!("{{{}}}", values.join(","))
                }
            };
            out.push_str(&format!("@attribute {} {kind}\n", arff_quote(&column.name)));
        }
        out.push_str("\n@data\n");
        for (row, &label) in matrix.rows.iter().zip(&matrix.labels) {
            let mut cells: Vec<String> = row
                .iter()
                .zip(&self.schema.inputs)
                .map(|(&v, column)| arff_cell(column, v))
                .collect();
            cells.push(arff_cell(&self.schema.output, label as f64));
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        Some(out)
    }
}

fn arff_cell(column: &Column, value: f64) -> String {
    match &column.kind {
        ColumnKind::Numeric => value.to_string(),
        ColumnKind::Nominal(values) => values
            .get(value as usize)
            .map_or_else(|| UNKNOWN_NOMINAL.to_string(), |v| arff_quote(v)),
    }
}

fn arff_quote(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '{' | '}' | '\'' | '"' | '%' | '?'));
    if needs_quotes {
        format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        text.to_string()
    }
}
