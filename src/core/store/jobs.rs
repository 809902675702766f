//! Background job rows: queued → processing → completed/failed, with the
//! result or error kept on the row for later polling.

use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use super::WorkflowStore;
use super::types::JobRecord;

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        job_id: row.get(0)?,
        kind: row.get(1)?,
        conversation_id: row.get(2)?,
        status: row.get(3)?,
        payload_json: row.get(4)?,
        result: row.get(5)?,
        error: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        finished_at: row.get(9)?,
    })
}

const JOB_COLUMNS: &str = "job_id, kind, conversation_id, status, payload_json, result, error, \
                           created_at, updated_at, finished_at";

impl WorkflowStore {
    pub async fn create_job(
        &self,
        kind: &str,
        conversation_id: Option<&str>,
        payload_json: &str,
    ) -> Result<JobRecord> {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.with_db(|db| {
            db.execute(
                "INSERT INTO jobs (job_id, kind, conversation_id, status, payload_json)
                 VALUES (?1, ?2, ?3, 'queued', ?4)",
                params![job_id, kind, conversation_id, payload_json],
            )?;
            let rec = db.query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = ?1"),
                params![job_id],
                row_to_job,
            )?;
            Ok(rec)
        })
        .await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>> {
        self.with_db(|db| {
            let rec = db
                .query_row(
                    &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = ?1"),
                    params![job_id],
                    row_to_job,
                )
                .optional()?;
            Ok(rec)
        })
        .await
    }

    pub async fn update_job_status(
        &self,
        job_id: &str,
        status: &str,
        result: Option<&str>,
        error: Option<&str>,
    ) -> Result<bool> {
        self.with_db(|db| {
            let finished = matches!(status, "completed" | "failed");
            let rows = if finished {
                db.execute(
                    "UPDATE jobs
                     SET status = ?1, result = COALESCE(?2, result), error = COALESCE(?3, error),
                         updated_at = CURRENT_TIMESTAMP, finished_at = CURRENT_TIMESTAMP
                     WHERE job_id = ?4",
                    params![status, result, error, job_id],
                )?
            } else {
                db.execute(
                    "UPDATE jobs
                     SET status = ?1, result = COALESCE(?2, result), error = COALESCE(?3, error),
                         updated_at = CURRENT_TIMESTAMP
                     WHERE job_id = ?4",
                    params![status, result, error, job_id],
                )?
            };
            Ok(rows > 0)
        })
        .await
    }
}
