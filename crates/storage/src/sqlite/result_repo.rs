use quiz_core::model::{ResultId, TestResult};
use tracing::warn;

use super::SqliteRepository;
use super::mapping::{accuracy_to_i64, conn, map_result_row, ser};
use crate::repository::{ResultRepository, StorageError};

const RESULT_COLUMNS: &str = "id, student_name, config, attempts, start_time, end_time, one_shot_accuracy";

fn i64_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &TestResult) -> Result<(), StorageError> {
        let config = serde_json::to_string(result.config()).map_err(ser)?;
        let attempts = serde_json::to_string(result.attempts()).map_err(ser)?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let inserted = sqlx::query(
            r"
            INSERT INTO test_results (
                id, student_name, competition, class_name, subject,
                config, attempts, start_time, end_time, one_shot_accuracy
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(result.id().to_string())
        .bind(result.student_name())
        .bind(&result.config().competition)
        .bind(&result.config().class_name)
        .bind(&result.config().subject)
        .bind(config)
        .bind(attempts)
        .bind(result.start_time())
        .bind(result.end_time())
        .bind(accuracy_to_i64(result.one_shot_accuracy()))
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(StorageError::Conflict);
            }
            Err(e) => return Err(conn(e)),
        }

        let evicted = sqlx::query(
            r"
            DELETE FROM test_results
            WHERE seq NOT IN (
                SELECT seq FROM test_results ORDER BY seq DESC LIMIT ?1
            )
            ",
        )
        .bind(i64_limit(self.result_retention))
        .execute(&mut *tx)
        .await
        .map_err(conn)?
        .rows_affected();

        tx.commit().await.map_err(conn)?;

        if evicted > 0 {
            warn!(evicted, "evicted old results past retention");
        }
        Ok(())
    }

    async fn get_result(&self, id: ResultId) -> Result<TestResult, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} FROM test_results WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<TestResult>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} FROM test_results ORDER BY seq DESC LIMIT ?1"
        ))
        .bind(i64_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn list_for_class(&self, class_name: &str) -> Result<Vec<TestResult>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} FROM test_results WHERE class_name = ?1 ORDER BY seq DESC"
        ))
        .bind(class_name)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }
}
