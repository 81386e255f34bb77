use crate::error::Result;
use crate::models::{FailureStateRecord, Phase, PipelineName};
use crate::repository::DbPool;
use chrono::{DateTime, Utc};

#[derive(Debug, sqlx::FromRow)]
struct FailureStateRow {
    pipeline_name: String,
    phase: String,
    observed_at: i64,
}

impl FailureStateRow {
    fn into_record(self) -> Option<FailureStateRecord> {
        let pipeline = match self.pipeline_name.parse::<PipelineName>() {
            Ok(pipeline) => pipeline,
            Err(e) => {
                tracing::warn!("Ignoring failure state row: {}", e);
                return None;
            }
        };
        let phase = match self.phase.parse::<Phase>() {
            Ok(phase) => phase,
            Err(e) => {
                tracing::warn!("Ignoring failure state row for {}: {}", pipeline, e);
                return None;
            }
        };
        let observed_at = DateTime::<Utc>::from_timestamp_millis(self.observed_at)?;
        Some(FailureStateRecord {
            pipeline,
            phase,
            observed_at,
        })
    }
}

/// Durable "pipeline X last failed at phase Y" records.
///
/// Each pipeline owns at most one row: a newer failure replaces the older one.
#[derive(Clone)]
pub struct FailureStateRepository {
    pool: DbPool,
}

impl FailureStateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record_failure(
        &self,
        pipeline: PipelineName,
        phase: Phase,
        observed_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pipeline_failure_state (pipeline_name, phase, observed_at)
            VALUES (?, ?, ?)
            ON CONFLICT(pipeline_name) DO UPDATE
            SET phase = excluded.phase, observed_at = excluded.observed_at
            "#,
        )
        .bind(pipeline.as_str())
        .bind(phase.as_str())
        .bind(observed_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_failures(&self) -> Result<Vec<FailureStateRecord>> {
        let rows = sqlx::query_as::<_, FailureStateRow>(
            "SELECT pipeline_name, phase, observed_at FROM pipeline_failure_state ORDER BY observed_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(FailureStateRow::into_record)
            .collect())
    }

    pub async fn clear(&self, pipeline: PipelineName) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pipeline_failure_state WHERE pipeline_name = ?")
            .bind(pipeline.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
