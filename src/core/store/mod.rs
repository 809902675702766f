mod jobs;
mod prompts;
mod templates;
pub mod types;

use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::core::coordinator::types::{StatePatch, WorkflowState};
use types::{ConversationRecord, MessageRecord};

/// Durable backing for conversations, the prompt registry, the template
/// catalog, and background job rows. One SQLite database behind a single
/// connection lock; state merges are therefore atomic at row granularity.
pub struct WorkflowStore {
    db: Arc<Mutex<Connection>>,
    #[allow(dead_code)]
    data_dir: PathBuf,
}

impl WorkflowStore {
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).await?;
        }

        let db_path = data_dir.join("draftloom.db");
        let db = Connection::open(&db_path)?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                title TEXT,
                state_json TEXT NOT NULL DEFAULT '{}',
                summary TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                agent_role TEXT,
                metadata_json TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS system_prompts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_role TEXT NOT NULL,
                version TEXT NOT NULL,
                prompt TEXT NOT NULL,
                is_current INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(agent_role, version)
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS content_templates (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                format TEXT NOT NULL,
                author TEXT,
                source_url TEXT,
                tags_json TEXT NOT NULL DEFAULT '[]',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS jobs (
                job_id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                conversation_id TEXT,
                status TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                result TEXT,
                error TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                finished_at DATETIME
            )",
            [],
        )?;

        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id, id)",
            [],
        )?;
        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_templates_category_format ON content_templates(category, format, created_at)",
            [],
        )?;
        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_prompts_role_current ON system_prompts(agent_role, is_current)",
            [],
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            data_dir,
        })
    }

    // Conversations

    pub async fn create_conversation(&self, title: Option<&str>) -> Result<ConversationRecord> {
        let id = uuid::Uuid::new_v4().to_string();
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO conversations (id, title) VALUES (?1, ?2)",
            params![id, title],
        )?;
        let rec = db.query_row(
            "SELECT id, title, created_at FROM conversations WHERE id = ?1",
            params![id],
            |row| {
                Ok(ConversationRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )?;
        Ok(rec)
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Option<ConversationRecord>> {
        let db = self.db.lock().await;
        let rec = db
            .query_row(
                "SELECT id, title, created_at FROM conversations WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ConversationRecord {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(rec)
    }

    // Messages (append-only log)

    pub async fn append_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
        agent_role: Option<&str>,
        metadata: Option<&serde_json::Value>,
    ) -> Result<MessageRecord> {
        let metadata_json = metadata.map(|m| m.to_string());
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO messages (conversation_id, role, content, agent_role, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, role, content, agent_role, metadata_json],
        )?;
        let id = db.last_insert_rowid();
        let rec = db.query_row(
            "SELECT id, conversation_id, role, content, agent_role, metadata_json, created_at
             FROM messages WHERE id = ?1",
            params![id],
            row_to_message,
        )?;
        Ok(rec)
    }

    /// Read the last `limit` messages in chronological order. `before_id`
    /// pages backwards through the log.
    pub async fn read_messages(
        &self,
        conversation_id: &str,
        limit: usize,
        before_id: Option<i64>,
    ) -> Result<Vec<MessageRecord>> {
        let db = self.db.lock().await;
        let mut out = Vec::new();
        if let Some(before) = before_id {
            let mut stmt = db.prepare(
                "SELECT id, conversation_id, role, content, agent_role, metadata_json, created_at
                 FROM messages WHERE conversation_id = ?1 AND id < ?2
                 ORDER BY id DESC LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![conversation_id, before, limit as i64], row_to_message)?;
            for row in rows {
                out.push(row?);
            }
        } else {
            let mut stmt = db.prepare(
                "SELECT id, conversation_id, role, content, agent_role, metadata_json, created_at
                 FROM messages WHERE conversation_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![conversation_id, limit as i64], row_to_message)?;
            for row in rows {
                out.push(row?);
            }
        }
        out.reverse();
        Ok(out)
    }

    // State blob

    pub async fn read_state(&self, conversation_id: &str) -> Result<WorkflowState> {
        let db = self.db.lock().await;
        let json: Option<String> = db
            .query_row(
                "SELECT state_json FROM conversations WHERE id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()?;
        let json = json.ok_or_else(|| anyhow!("conversation {} not found", conversation_id))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Shallow last-write-wins merge: the full prior blob is read, the set
    /// fields of the patch are overlaid, and the union is written back under
    /// the connection lock. Keys the patch does not mention are untouched.
    pub async fn merge_state(
        &self,
        conversation_id: &str,
        patch: &StatePatch,
    ) -> Result<WorkflowState> {
        let db = self.db.lock().await;
        let json: Option<String> = db
            .query_row(
                "SELECT state_json FROM conversations WHERE id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()?;
        let json = json.ok_or_else(|| anyhow!("conversation {} not found", conversation_id))?;

        let mut merged: serde_json::Value = serde_json::from_str(&json)?;
        let overlay = serde_json::to_value(patch)?;
        if let (Some(base), Some(patch_map)) = (merged.as_object_mut(), overlay.as_object()) {
            for (k, v) in patch_map {
                base.insert(k.clone(), v.clone());
            }
        }

        db.execute(
            "UPDATE conversations SET state_json = ?1 WHERE id = ?2",
            params![merged.to_string(), conversation_id],
        )?;
        Ok(serde_json::from_value(merged)?)
    }

    // Running summary

    pub async fn read_summary(&self, conversation_id: &str) -> Result<Option<String>> {
        let db = self.db.lock().await;
        let summary: Option<Option<String>> = db
            .query_row(
                "SELECT summary FROM conversations WHERE id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(summary.flatten())
    }

    pub async fn write_summary(&self, conversation_id: &str, summary: &str) -> Result<()> {
        let db = self.db.lock().await;
        let rows = db.execute(
            "UPDATE conversations SET summary = ?1 WHERE id = ?2",
            params![summary, conversation_id],
        )?;
        if rows == 0 {
            return Err(anyhow!("conversation {} not found", conversation_id));
        }
        Ok(())
    }

    pub(crate) async fn with_db<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let db = self.db.lock().await;
        f(&db)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    let metadata_json: Option<String> = row.get(5)?;
    Ok(MessageRecord {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        agent_role: row.get(4)?,
        metadata: metadata_json.and_then(|m| serde_json::from_str(&m).ok()),
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coordinator::types::{StatePatch, WorkflowStatus};

    async fn open_store() -> (WorkflowStore, tempfile::TempDir) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = WorkflowStore::open(tmp.path()).await.expect("store");
        (store, tmp)
    }

    #[tokio::test]
    async fn state_merge_is_shallow_and_preserves_unknown_keys() {
        let (store, _tmp) = open_store().await;
        let conv = store.create_conversation(Some("t")).await.unwrap();

        // Simulate state written by a newer build with a key this one does
        // not model.
        store
            .with_db(|db| {
                db.execute(
                    "UPDATE conversations SET state_json = ?1 WHERE id = ?2",
                    params![r#"{"campaign_tag":"q3-launch","waiting_for_user":true}"#, conv.id],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let merged = store
            .merge_state(
                &conv.id,
                &StatePatch {
                    status: Some(WorkflowStatus::InProgress),
                    waiting_for_user: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(merged.status, Some(WorkflowStatus::InProgress));
        assert!(!merged.waiting_for_user);
        assert_eq!(
            merged.extra.get("campaign_tag"),
            Some(&serde_json::Value::String("q3-launch".to_string()))
        );
    }

    #[tokio::test]
    async fn reading_state_of_a_missing_conversation_fails() {
        let (store, _tmp) = open_store().await;
        assert!(store.read_state("missing").await.is_err());
        assert!(
            store
                .merge_state("missing", &StatePatch::default())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn message_log_is_ordered_and_pageable() {
        let (store, _tmp) = open_store().await;
        let conv = store.create_conversation(Some("t")).await.unwrap();
        store
            .append_message(&conv.id, "user", "first", None, None)
            .await
            .unwrap();
        store
            .append_message(&conv.id, "assistant", "second", Some("Writer"), None)
            .await
            .unwrap();
        store
            .append_message(&conv.id, "user", "third", None, None)
            .await
            .unwrap();

        let recent = store.read_messages(&conv.id, 2, None).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "second");
        assert_eq!(recent[1].content, "third");

        let earlier = store
            .read_messages(&conv.id, 10, Some(recent[0].id))
            .await
            .unwrap();
        assert_eq!(earlier.len(), 1);
        assert_eq!(earlier[0].content, "first");
    }

    #[tokio::test]
    async fn summary_round_trips() {
        let (store, _tmp) = open_store().await;
        let conv = store.create_conversation(Some("t")).await.unwrap();
        assert_eq!(store.read_summary(&conv.id).await.unwrap(), None);
        store
            .write_summary(&conv.id, "user prefers short hooks")
            .await
            .unwrap();
        assert_eq!(
            store.read_summary(&conv.id).await.unwrap().as_deref(),
            Some("user prefers short hooks")
        );
    }
}
