//! Column and type reconciliation at conversion boundaries.

use log::trace;

use common_error::{QuarryError, QuarryResult};
use quarry_core::{Schema, TypeCategory};

use crate::table::ResultTable;

/// Aligns handler results with the row type their parent expects.
///
/// All operations are pure: they take a result and return a new one.
pub struct SchemaReconciler;

impl SchemaReconciler {
    /// Rename the result's columns positionally to `target_names` and drop
    /// any trailing columns.
    ///
    /// Fails when `target_names` is longer than the result or repeats a name.
    pub fn align_columns(
        result: &ResultTable,
        target_names: &[String],
    ) -> QuarryResult<ResultTable> {
        let columns = result.columns().rename_prefix(target_names)?;
        let frame = result.frame().select(&columns.backend_names())?;
        ResultTable::new(frame, columns)
    }

    /// Check that the result's column names equal `target`'s, in order.
    pub fn assert_schema(result: &ResultTable, target: &Schema) -> QuarryResult<()> {
        let actual = result.frontend_names();
        let expected = target.field_names();
        if actual != expected {
            return Err(QuarryError::schema_mismatch(expected, actual));
        }
        Ok(())
    }

    /// Cast every column named in `target` whose type category differs from
    /// the target type's category.
    ///
    /// Same-category columns are left as they are, whatever their width or
    /// nullability.
    pub fn coerce_types(result: &ResultTable, target: &Schema) -> QuarryResult<ResultTable> {
        let (mut frame, mut columns) = result.clone().into_parts();

        for column in &target.columns {
            let backend = columns.backend(&column.name)?.to_string();
            let current = frame.field(&backend)?.data_type().clone();
            let expected = column.data_type.to_arrow();
            if TypeCategory::similar(&current, &expected) {
                continue;
            }

            // A shared backend keeps its type for the other names.
            let cast_name = if columns.references(&backend) > 1 {
                frame.fresh_name(&backend)
            } else {
                backend.clone()
            };
            trace!(
                "casting column '{}' from {current} to {expected} (backend '{cast_name}')",
                column.name
            );
            frame = frame.cast_column(&backend, &expected, &cast_name)?;
            if cast_name != backend {
                columns.remap(&column.name, cast_name)?;
            }
        }

        ResultTable::new(frame, columns)
    }

    /// Align to the row type's names, then coerce to its types.
    pub fn reconcile(result: &ResultTable, row_type: &Schema) -> QuarryResult<ResultTable> {
        let aligned = Self::align_columns(result, &row_type.field_names())?;
        Self::coerce_types(&aligned, row_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow::array::{Array, Float64Array, Int32Array, StringArray};
    use arrow::datatypes::{DataType as ArrowDataType, Field, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use proptest::prelude::*;
    use quarry_core::DataType;

    use crate::table::{ColumnContainer, Frame};

    fn result() -> ResultTable {
        let batch = RecordBatch::try_new(
            Arc::new(ArrowSchema::new(vec![
                Field::new("a", ArrowDataType::Int32, false),
                Field::new("b", ArrowDataType::Utf8, true),
                Field::new("c", ArrowDataType::Float64, true),
            ])),
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec!["1", "2", "x"])),
                Arc::new(Float64Array::from(vec![1.5, 2.5, 3.5])),
            ],
        )
        .unwrap();
        ResultTable::from_batch(batch).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_align_renames_positionally_and_truncates() {
        let aligned = SchemaReconciler::align_columns(&result(), &names(&["x", "y"])).unwrap();
        assert_eq!(aligned.frontend_names(), names(&["x", "y"]));
        assert_eq!(aligned.columns().backend("y").unwrap(), "b");
        assert_eq!(aligned.frame().column_names(), names(&["a", "b"]));
    }

    #[test]
    fn test_align_too_many_names() {
        let err =
            SchemaReconciler::align_columns(&result(), &names(&["w", "x", "y", "z"])).unwrap_err();
        assert!(matches!(err, QuarryError::SchemaError(_)));
    }

    #[test]
    fn test_assert_schema() {
        let target = Schema::from_pairs([
            ("a", DataType::Int32),
            ("b", DataType::Utf8),
            ("c", DataType::Float64),
        ]);
        SchemaReconciler::assert_schema(&result(), &target).unwrap();

        let reordered = Schema::from_pairs([
            ("b", DataType::Utf8),
            ("a", DataType::Int32),
            ("c", DataType::Float64),
        ]);
        let err = SchemaReconciler::assert_schema(&result(), &reordered).unwrap_err();
        assert!(matches!(err, QuarryError::SchemaMismatch { .. }));

        let shorter = Schema::from_pairs([("a", DataType::Int32)]);
        assert!(SchemaReconciler::assert_schema(&result(), &shorter).is_err());
    }

    #[test]
    fn test_coerce_skips_same_category() {
        let target = Schema::from_pairs([("a", DataType::Int64), ("c", DataType::Float32)]);
        let coerced = SchemaReconciler::coerce_types(&result(), &target).unwrap();
        assert_eq!(
            coerced.frame().field("a").unwrap().data_type(),
            &ArrowDataType::Int32
        );
        assert_eq!(
            coerced.frame().field("c").unwrap().data_type(),
            &ArrowDataType::Float64
        );
    }

    #[test]
    fn test_coerce_casts_across_categories() {
        let target = Schema::from_pairs([("b", DataType::Int64), ("a", DataType::Utf8)]);
        let coerced = SchemaReconciler::coerce_types(&result(), &target).unwrap();
        let batch = coerced.to_record_batch().unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &ArrowDataType::Utf8);
        assert_eq!(batch.schema().field(1).data_type(), &ArrowDataType::Int64);
        // "x" does not parse as an integer.
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_coerce_missing_column() {
        let target = Schema::from_pairs([("zzz", DataType::Int64)]);
        assert!(matches!(
            SchemaReconciler::coerce_types(&result(), &target),
            Err(QuarryError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_coerce_shared_backend_casts_one_name() {
        let base = result();
        let columns = ColumnContainer::from_pairs([("a", "a"), ("a_str", "a")]).unwrap();
        let shared = ResultTable::new(base.frame().clone(), columns).unwrap();

        let target = Schema::from_pairs([("a_str", DataType::Utf8)]);
        let coerced = SchemaReconciler::coerce_types(&shared, &target).unwrap();
        let batch = coerced.to_record_batch().unwrap();
        assert_eq!(batch.schema().field(0).data_type(), &ArrowDataType::Int32);
        assert_eq!(batch.schema().field(1).data_type(), &ArrowDataType::Utf8);
        assert_eq!(coerced.columns().backend("a_str").unwrap(), "a_1");
    }

    #[test]
    fn test_reconcile_aligns_then_coerces() {
        let row_type = Schema::from_pairs([("id", DataType::Utf8), ("label", DataType::Utf8)]);
        let out = SchemaReconciler::reconcile(&result(), &row_type).unwrap();
        let batch = out.to_record_batch().unwrap();
        assert_eq!(batch.schema().field(0).name(), "id");
        assert_eq!(batch.schema().field(0).data_type(), &ArrowDataType::Utf8);
        assert_eq!(batch.num_columns(), 2);
    }

    #[test]
    fn test_empty_frame_aligns() {
        let schema = Arc::new(ArrowSchema::new(vec![Field::new(
            "v",
            ArrowDataType::Int32,
            true,
        )]));
        let empty = ResultTable::from_frame(Frame::empty(schema)).unwrap();
        let aligned = SchemaReconciler::align_columns(&empty, &names(&["w"])).unwrap();
        assert_eq!(aligned.num_rows(), 0);
        assert_eq!(aligned.frontend_names(), names(&["w"]));
    }

    proptest! {
        #[test]
        fn prop_align_is_idempotent(take in 0usize..=3, prefix in "[a-z]{1,4}") {
            let targets: Vec<String> = (0..take).map(|i| format!("{prefix}{i}")).collect();
            let once = SchemaReconciler::align_columns(&result(), &targets).unwrap();
            let twice = SchemaReconciler::align_columns(&once, &targets).unwrap();
            prop_assert_eq!(once.columns(), twice.columns());
            prop_assert_eq!(once.frame().column_names(), twice.frame().column_names());
            prop_assert_eq!(
                once.to_record_batch().unwrap(),
                twice.to_record_batch().unwrap()
            );
        }
    }
}
