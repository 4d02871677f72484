use chrono::Utc;
use quiz_core::engine::EngineState;
use quiz_core::model::SessionKey;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, decode_state, encode_state, ser};
use crate::repository::{QuizStateRepository, StorageError};

#[async_trait::async_trait]
impl QuizStateRepository for SqliteRepository {
    async fn save_state(&self, key: &SessionKey, state: &EngineState) -> Result<(), StorageError> {
        let blob = encode_state(state)?;

        sqlx::query(
            r"
            INSERT INTO quiz_states (session_key, student_name, subject, state, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(session_key) DO UPDATE SET
                student_name = excluded.student_name,
                subject = excluded.subject,
                state = excluded.state,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key.as_str())
        .bind(state.student_name())
        .bind(state.subject())
        .bind(blob)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_state(&self, key: &SessionKey) -> Result<Option<EngineState>, StorageError> {
        let row = sqlx::query("SELECT state FROM quiz_states WHERE session_key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("state").map_err(ser)?;
        decode_state(&raw).map(Some)
    }

    async fn erase_state(&self, key: &SessionKey) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_states WHERE session_key = ?1")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
