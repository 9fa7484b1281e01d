//! In-memory observation table shared by every validation test.
//!
//! Callers load data from whatever source they use (files, databases) into
//! this form; the tests only ever reference columns by name, never by
//! position. The accessors enforce the shared validation contract in a fixed
//! order: column existence, then column kind, then missing values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::RiskValidationError;
use crate::RiskValidationResult;

/// A single named column. `None` cells are missing values; a referenced
/// column containing any is rejected before computation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Column {
    Categorical(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Categorical(v) => v.len(),
            Column::Numeric(v) => v.len(),
        }
    }
}

/// Named columns of equal row count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    columns: HashMap<String, Column>,
    rows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Add a categorical column. The first column fixes the row count; every
    /// later column must match it.
    pub fn insert_categorical(
        &mut self,
        name: &str,
        values: Vec<Option<String>>,
    ) -> RiskValidationResult<()> {
        self.insert(name, Column::Categorical(values))
    }

    /// Add a numeric column.
    pub fn insert_numeric(
        &mut self,
        name: &str,
        values: Vec<Option<f64>>,
    ) -> RiskValidationResult<()> {
        self.insert(name, Column::Numeric(values))
    }

    fn insert(&mut self, name: &str, column: Column) -> RiskValidationResult<()> {
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(RiskValidationError::InvalidInput {
                field: name.to_string(),
                reason: format!(
                    "column has {} rows but the dataset has {}",
                    column.len(),
                    self.rows
                ),
            });
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    fn column(&self, name: &str) -> RiskValidationResult<&Column> {
        self.columns
            .get(name)
            .ok_or_else(|| RiskValidationError::UnknownColumn {
                column: name.to_string(),
            })
    }

    /// Materialize a categorical column as a null-free view.
    pub fn categorical(&self, name: &str) -> RiskValidationResult<Vec<&str>> {
        match self.column(name)? {
            Column::Categorical(values) => values
                .iter()
                .map(|v| {
                    v.as_deref()
                        .ok_or_else(|| RiskValidationError::MissingValues {
                            column: name.to_string(),
                        })
                })
                .collect(),
            Column::Numeric(_) => Err(RiskValidationError::ColumnType {
                column: name.to_string(),
                expected: "categorical",
            }),
        }
    }

    /// Materialize a numeric column as a null-free view.
    pub fn numeric(&self, name: &str) -> RiskValidationResult<Vec<f64>> {
        match self.column(name)? {
            Column::Numeric(values) => values
                .iter()
                .map(|v| {
                    v.ok_or_else(|| RiskValidationError::MissingValues {
                        column: name.to_string(),
                    })
                })
                .collect(),
            Column::Categorical(_) => Err(RiskValidationError::ColumnType {
                column: name.to_string(),
                expected: "numeric",
            }),
        }
    }
}
