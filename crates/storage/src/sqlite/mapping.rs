use std::str::FromStr;

use quiz_core::engine::EngineState;
use quiz_core::model::{Attempt, ResultId, TestConfig, TestResult};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn encode_state(state: &EngineState) -> Result<String, StorageError> {
    serde_json::to_string(state).map_err(ser)
}

/// Decodes a saved session blob. Structural checks happen later, when the
/// engine decides whether the state can be resumed.
pub(crate) fn decode_state(raw: &str) -> Result<EngineState, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn accuracy_to_i64(value: u32) -> i64 {
    i64::from(value)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<TestResult, StorageError> {
    let id_raw: String = row.try_get("id").map_err(ser)?;
    let id = ResultId::from_str(&id_raw).map_err(ser)?;

    let config_raw: String = row.try_get("config").map_err(ser)?;
    let config: TestConfig = serde_json::from_str(&config_raw).map_err(ser)?;

    let attempts_raw: String = row.try_get("attempts").map_err(ser)?;
    let attempts: Vec<Attempt> = serde_json::from_str(&attempts_raw).map_err(ser)?;

    let accuracy_i64: i64 = row.try_get("one_shot_accuracy").map_err(ser)?;
    let accuracy = u32::try_from(accuracy_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid one_shot_accuracy: {accuracy_i64}"))
    })?;

    TestResult::from_persisted(
        id,
        row.try_get("student_name").map_err(ser)?,
        config,
        attempts,
        row.try_get("start_time").map_err(ser)?,
        row.try_get("end_time").map_err(ser)?,
        accuracy,
    )
    .map_err(ser)
}
