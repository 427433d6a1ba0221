//! Query-shape payload carried by a query context.
//!
//! The built-in renderer never reads a [`QueryModel`]; it exists for custom
//! builders that derive a select from a dimensional description. Entries
//! refer to catalog fields by descriptor id.

use serde::{Deserialize, Serialize};

use crate::error::{CubeError, Result};
use crate::keyword::{Aggregate, Comparator, SortOrder};
use crate::types::Value;

/// A dimension or measure reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelField {
    pub field_id: String,
    /// Aggregate applied when the field is a measure.
    #[serde(default)]
    pub aggregate: Option<Aggregate>,
}

impl ModelField {
    #[must_use]
    pub fn dimension(field_id: &str) -> Self {
        ModelField {
            field_id: field_id.to_string(),
            aggregate: None,
        }
    }

    #[must_use]
    pub fn measure(field_id: &str, aggregate: Aggregate) -> Self {
        ModelField {
            field_id: field_id.to_string(),
            aggregate: Some(aggregate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFilter {
    pub field_id: String,
    pub operator: Comparator,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSort {
    pub field_id: String,
    pub order: SortOrder,
}

/// Dimensional description of a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryModel {
    pub rows: Vec<ModelField>,
    pub columns: Vec<ModelField>,
    pub measures: Vec<ModelField>,
    pub filters: Vec<ModelFilter>,
    pub sorts: Vec<ModelSort>,
}

impl QueryModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a model, ignoring unknown attributes.
    ///
    /// # Errors
    ///
    /// Returns a serialization error on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
            && self.columns.is_empty()
            && self.measures.is_empty()
            && self.filters.is_empty()
            && self.sorts.is_empty()
    }

    /// Replaces the dimension `field_id` with the finer `into_id`, keeping
    /// its position on the row or column axis.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `field_id` is not on either axis.
    pub fn drill(&mut self, field_id: &str, into_id: &str) -> Result<()> {
        let slot = self
            .rows
            .iter_mut()
            .chain(self.columns.iter_mut())
            .find(|f| f.field_id == field_id)
            .ok_or_else(|| CubeError::not_found("dimension", field_id))?;
        slot.field_id = into_id.to_string();
        Ok(())
    }

    /// Swaps the row and column axes.
    pub fn pivot(&mut self) {
        std::mem::swap(&mut self.rows, &mut self.columns);
    }

    /// Fixes the dimension `field_id` to `value`: the dimension leaves its
    /// axis and an equality filter takes its place.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `field_id` is not on either axis.
    pub fn slice(&mut self, field_id: &str, value: impl Into<Value>) -> Result<()> {
        let before = self.rows.len() + self.columns.len();
        self.rows.retain(|f| f.field_id != field_id);
        self.columns.retain(|f| f.field_id != field_id);
        if self.rows.len() + self.columns.len() == before {
            return Err(CubeError::not_found("dimension", field_id));
        }
        self.filters.push(ModelFilter {
            field_id: field_id.to_string(),
            operator: Comparator::Eq,
            values: vec![value.into()],
        });
        Ok(())
    }
}
