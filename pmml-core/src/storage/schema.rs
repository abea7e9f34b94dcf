use polars::prelude::*;

/// Column layout of a feature partition.
pub struct FeatureSchema;

impl FeatureSchema {
    /// Column names and dtypes, in table order.
    pub const COLUMNS: [(&'static str, DataType); 24] = [
        ("condition_id", DataType::String),
        ("market_slug", DataType::String),
        ("token_id", DataType::String),
        ("end_period_ts", DataType::Int64),
        ("volume", DataType::Float64),
        ("open_interest", DataType::Float64),
        ("price_open_dollars", DataType::Float64),
        ("price_close_dollars", DataType::Float64),
        ("yes_ask_open_dollars", DataType::Float64),
        ("yes_ask_close_dollars", DataType::Float64),
        ("yes_bid_open_dollars", DataType::Float64),
        ("yes_bid_close_dollars", DataType::Float64),
        ("p_mkt", DataType::Float64),
        ("spread", DataType::Float64),
        ("y_final", DataType::Int32),
        ("market_end_time", DataType::Int64),
        ("market_start_time", DataType::Int64),
        ("market_category", DataType::String),
        ("market_volume_total", DataType::Float64),
        ("market_liquidity", DataType::Float64),
        ("time_to_close_sec", DataType::Int64),
        ("ret_1", DataType::Float64),
        ("vol_7", DataType::Float64),
        ("had_trade", DataType::Int32),
    ];

    /// Get the canonical feature schema
    pub fn schema() -> Schema {
        Schema::from_iter(
            Self::COLUMNS
                .iter()
                .map(|(name, dtype)| Field::new((*name).into(), dtype.clone())),
        )
    }

    /// Validate DataFrame against schema
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}
