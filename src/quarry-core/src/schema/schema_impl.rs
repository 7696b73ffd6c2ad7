//! Ordered row type of a plan node.

use std::fmt;
use std::sync::Arc;

use arrow_schema::{Field, Schema as ArrowSchema, SchemaRef};
use common_error::{QuarryError, QuarryResult};
use serde::{Deserialize, Serialize};

use crate::types::DataType;

/// Information about a column in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Data type.
    pub data_type: DataType,
    /// Whether this column can contain nulls.
    pub nullable: bool,
}

impl ColumnInfo {
    /// Create a new nullable column info.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    /// Set nullable for this column.
    #[must_use]
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Arrow field for this column.
    pub fn to_field(&self) -> Field {
        Field::new(&self.name, self.data_type.to_arrow(), self.nullable)
    }
}

/// Ordered `(name, type, nullable)` columns a plan node produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Columns in this schema.
    pub columns: Vec<ColumnInfo>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema with the given columns.
    pub fn with_columns(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    /// Build a schema from `(name, type)` pairs; all columns nullable.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, DataType)>) -> Self {
        Self::with_columns(
            pairs
                .into_iter()
                .map(|(name, ty)| ColumnInfo::new(name, ty))
                .collect(),
        )
    }

    /// Add a column to the schema.
    pub fn add_column(&mut self, column: ColumnInfo) {
        self.columns.push(column);
    }

    /// Get all column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Owned column names, as reconciliation and errors want them.
    pub fn field_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Project to the columns at `indices`, in that order.
    pub fn project(&self, indices: &[usize]) -> QuarryResult<Self> {
        let columns = indices
            .iter()
            .map(|&i| {
                self.columns.get(i).cloned().ok_or_else(|| {
                    QuarryError::schema_error(format!(
                        "projection index {i} out of range for {} columns",
                        self.columns.len()
                    ))
                })
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(Self::with_columns(columns))
    }

    /// Concatenate two schemas.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Self::with_columns(columns)
    }

    /// Arrow schema with the native type of every column.
    pub fn to_arrow(&self) -> SchemaRef {
        Arc::new(ArrowSchema::new(
            self.columns.iter().map(ColumnInfo::to_field).collect::<Vec<_>>(),
        ))
    }

    /// Semantic schema of an Arrow schema.
    pub fn from_arrow(schema: &ArrowSchema) -> QuarryResult<Self> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                let data_type = DataType::from_arrow(field.data_type()).ok_or_else(|| {
                    QuarryError::type_error(format!(
                        "column '{}' has unsupported Arrow type {}",
                        field.name(),
                        field.data_type()
                    ))
                })?;
                Ok(ColumnInfo::new(field.name().clone(), data_type)
                    .with_nullable(field.is_nullable()))
            })
            .collect::<QuarryResult<Vec<_>>>()?;
        Ok(Self::with_columns(columns))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Schema {{")?;
        for col in &self.columns {
            writeln!(
                f,
                "  {}: {} {}",
                col.name,
                col.data_type,
                if col.nullable { "(nullable)" } else { "" }
            )?;
        }
        write!(f, "}}")
    }
}
