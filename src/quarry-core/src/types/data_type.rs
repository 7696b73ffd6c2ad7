//! Semantic data types and their mapping to Arrow.

use std::fmt;
use std::str::FromStr;

use arrow_schema::{DataType as ArrowDataType, TimeUnit};
use common_error::QuarryError;
use serde::{Deserialize, Serialize};

/// Semantic column type as described by the planner's row-type metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Null type (unknown or absent).
    Null,
    /// Boolean type.
    Boolean,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Date (days since epoch).
    Date,
    /// Timestamp with microsecond precision, no time zone.
    Timestamp,
}

/// Broad type family. Columns whose current and target types share a
/// category are never cast by schema reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Temporal,
    /// Anything without a family; only an exact type match counts as similar.
    Other,
}

impl TypeCategory {
    /// Category of a native Arrow type.
    pub fn of_arrow(data_type: &ArrowDataType) -> Self {
        match data_type {
            ArrowDataType::Null => Self::Null,
            ArrowDataType::Boolean => Self::Boolean,
            ArrowDataType::Int8
            | ArrowDataType::Int16
            | ArrowDataType::Int32
            | ArrowDataType::Int64
            | ArrowDataType::UInt8
            | ArrowDataType::UInt16
            | ArrowDataType::UInt32
            | ArrowDataType::UInt64 => Self::Integer,
            ArrowDataType::Float16 | ArrowDataType::Float32 | ArrowDataType::Float64 => {
                Self::Float
            }
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 | ArrowDataType::Utf8View => {
                Self::String
            }
            ArrowDataType::Date32 | ArrowDataType::Date64 | ArrowDataType::Timestamp(_, _) => {
                Self::Temporal
            }
            _ => Self::Other,
        }
    }

    /// Whether two Arrow types are similar enough to skip a cast.
    pub fn similar(current: &ArrowDataType, target: &ArrowDataType) -> bool {
        if current == target {
            return true;
        }
        let category = Self::of_arrow(current);
        category != Self::Other && category == Self::of_arrow(target)
    }
}

impl DataType {
    /// The native Arrow type this semantic type is stored as.
    pub fn to_arrow(&self) -> ArrowDataType {
        match self {
            Self::Null => ArrowDataType::Null,
            Self::Boolean => ArrowDataType::Boolean,
            Self::Int8 => ArrowDataType::Int8,
            Self::Int16 => ArrowDataType::Int16,
            Self::Int32 => ArrowDataType::Int32,
            Self::Int64 => ArrowDataType::Int64,
            Self::UInt8 => ArrowDataType::UInt8,
            Self::UInt16 => ArrowDataType::UInt16,
            Self::UInt32 => ArrowDataType::UInt32,
            Self::UInt64 => ArrowDataType::UInt64,
            Self::Float32 => ArrowDataType::Float32,
            Self::Float64 => ArrowDataType::Float64,
            Self::Utf8 => ArrowDataType::Utf8,
            Self::Date => ArrowDataType::Date32,
            Self::Timestamp => ArrowDataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }

    /// The semantic type of a native Arrow type, if it has one.
    pub fn from_arrow(data_type: &ArrowDataType) -> Option<Self> {
        let ty = match data_type {
            ArrowDataType::Null => Self::Null,
            ArrowDataType::Boolean => Self::Boolean,
            ArrowDataType::Int8 => Self::Int8,
            ArrowDataType::Int16 => Self::Int16,
            ArrowDataType::Int32 => Self::Int32,
            ArrowDataType::Int64 => Self::Int64,
            ArrowDataType::UInt8 => Self::UInt8,
            ArrowDataType::UInt16 => Self::UInt16,
            ArrowDataType::UInt32 => Self::UInt32,
            ArrowDataType::UInt64 => Self::UInt64,
            ArrowDataType::Float32 => Self::Float32,
            ArrowDataType::Float64 => Self::Float64,
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 | ArrowDataType::Utf8View => Self::Utf8,
            ArrowDataType::Date32 | ArrowDataType::Date64 => Self::Date,
            ArrowDataType::Timestamp(_, _) => Self::Timestamp,
            _ => return None,
        };
        Some(ty)
    }

    /// The broad family of this type.
    pub const fn category(&self) -> TypeCategory {
        match self {
            Self::Null => TypeCategory::Null,
            Self::Boolean => TypeCategory::Boolean,
            Self::Int8
            | Self::Int16
            | Self::Int32
            | Self::Int64
            | Self::UInt8
            | Self::UInt16
            | Self::UInt32
            | Self::UInt64 => TypeCategory::Integer,
            Self::Float32 | Self::Float64 => TypeCategory::Float,
            Self::Utf8 => TypeCategory::String,
            Self::Date | Self::Timestamp => TypeCategory::Temporal,
        }
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self.category(),
            TypeCategory::Integer | TypeCategory::Float
        )
    }

    /// Get the display name for this type.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean => "Boolean",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Utf8 => "Utf8",
            Self::Date => "Date",
            Self::Timestamp => "Timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses planner type descriptors such as `BIGINT`, `DOUBLE` or
/// `VARCHAR(32)`. Arrow-style names (`Int64`, `Float64`) are accepted too.
impl FromStr for DataType {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        // Length and precision suffixes do not change the mapping.
        let base = upper.split('(').next().unwrap_or_default().trim();

        let ty = match base {
            "NULL" => Self::Null,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "TINYINT" | "INT8" => Self::Int8,
            "SMALLINT" | "INT16" => Self::Int16,
            "INTEGER" | "INT" | "INT32" => Self::Int32,
            "BIGINT" | "INT64" => Self::Int64,
            "UTINYINT" | "UINT8" => Self::UInt8,
            "USMALLINT" | "UINT16" => Self::UInt16,
            "UINTEGER" | "UINT32" => Self::UInt32,
            "UBIGINT" | "UINT64" => Self::UInt64,
            "REAL" | "FLOAT" | "FLOAT32" => Self::Float32,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT64" => Self::Float64,
            "VARCHAR" | "CHAR" | "TEXT" | "STRING" | "UTF8" => Self::Utf8,
            "DATE" => Self::Date,
            "TIMESTAMP" => Self::Timestamp,
            _ => {
                return Err(QuarryError::type_error(format!(
                    "unknown SQL type descriptor '{s}'"
                )));
            }
        };
        Ok(ty)
    }
}
