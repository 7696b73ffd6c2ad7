//! Unit tests for common-config crate

use common_config::{ConversionConfig, ExecutionConfig, QuarryConfig, DEFAULT_PARTITION_ROWS};
use common_error::QuarryError;

#[test]
fn test_quarry_config_default() {
    let config = QuarryConfig::default();

    assert!(config.conversion.check_terminal_schema);
    assert!(config.conversion.collect_metrics);
    assert_eq!(config.execution.partition_rows, DEFAULT_PARTITION_ROWS);
}

#[test]
fn test_config_roundtrip() {
    let mut config = QuarryConfig::default();
    config.conversion.collect_metrics = false;
    config.execution.partition_rows = 16;

    let json = config.to_json().unwrap();
    let parsed = QuarryConfig::from_json(&json).unwrap();

    assert_eq!(parsed, config);
}

#[test]
fn test_partial_json_uses_defaults() {
    let config = QuarryConfig::from_json(r#"{"execution": {"partition_rows": 2}}"#).unwrap();

    assert_eq!(config.execution.partition_rows, 2);
    assert_eq!(config.conversion, ConversionConfig::default());
}

#[test]
fn test_empty_json_is_default() {
    let config = QuarryConfig::from_json("{}").unwrap();
    assert_eq!(config, QuarryConfig::default());
}

#[test]
fn test_zero_partition_rows_rejected() {
    let err = QuarryConfig::from_json(r#"{"execution": {"partition_rows": 0}}"#).unwrap_err();
    assert!(matches!(err, QuarryError::InvalidParameter(_)));
}

#[test]
fn test_malformed_json_is_serde_error() {
    let err = QuarryConfig::from_json("{ not json").unwrap_err();
    assert!(matches!(err, QuarryError::SerdeJsonError(_)));
}

#[test]
fn test_execution_config_builder() {
    let config = ExecutionConfig::default().with_partition_rows(3);
    assert_eq!(config.partition_rows, 3);
}

#[test]
fn test_config_debug_format() {
    let config = QuarryConfig::default();
    let debug_str = format!("{:?}", config);
    assert!(debug_str.contains("QuarryConfig"));
    assert!(debug_str.contains("ConversionConfig"));
    assert!(debug_str.contains("ExecutionConfig"));
}
