//! Template catalog: reusable style exemplars keyed by id or by
//! (category, format), newest first.

use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use super::WorkflowStore;
use super::types::{NewTemplate, TemplateRecord};

fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<TemplateRecord> {
    let tags_json: String = row.get(7)?;
    Ok(TemplateRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get(3)?,
        format: row.get(4)?,
        author: row.get(5)?,
        source_url: row.get(6)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        created_at: row.get(8)?,
    })
}

const TEMPLATE_COLUMNS: &str =
    "id, title, content, category, format, author, source_url, tags_json, created_at";

impl WorkflowStore {
    pub async fn create_template(&self, new: &NewTemplate) -> Result<TemplateRecord> {
        let id = uuid::Uuid::new_v4().to_string();
        let tags_json = serde_json::to_string(&new.tags)?;
        self.with_db(|db| {
            db.execute(
                "INSERT INTO content_templates
                 (id, title, content, category, format, author, source_url, tags_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    new.title,
                    new.content,
                    new.category,
                    new.format,
                    new.author,
                    new.source_url,
                    tags_json
                ],
            )?;
            let rec = db.query_row(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM content_templates WHERE id = ?1"),
                params![id],
                row_to_template,
            )?;
            Ok(rec)
        })
        .await
    }

    pub async fn get_template(&self, id: &str) -> Result<Option<TemplateRecord>> {
        self.with_db(|db| {
            let rec = db
                .query_row(
                    &format!("SELECT {TEMPLATE_COLUMNS} FROM content_templates WHERE id = ?1"),
                    params![id],
                    row_to_template,
                )
                .optional()?;
            Ok(rec)
        })
        .await
    }

    pub async fn list_templates(
        &self,
        category: Option<&str>,
        format: Option<&str>,
        limit: usize,
    ) -> Result<Vec<TemplateRecord>> {
        self.with_db(|db| {
            let mut sql = format!(
                "SELECT {TEMPLATE_COLUMNS} FROM content_templates WHERE 1=1"
            );
            let mut args: Vec<&dyn rusqlite::ToSql> = Vec::new();
            if let Some(ref c) = category {
                sql.push_str(" AND category = ?");
                args.push(c);
            }
            if let Some(ref f) = format {
                sql.push_str(" AND format = ?");
                args.push(f);
            }
            sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT ?");
            let limit = limit as i64;
            args.push(&limit);

            let mut stmt = db.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(args), row_to_template)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }

    /// The most recently created template for a (category, format) pair.
    pub async fn latest_template(
        &self,
        category: &str,
        format: &str,
    ) -> Result<Option<TemplateRecord>> {
        self.with_db(|db| {
            let rec = db
                .query_row(
                    &format!(
                        "SELECT {TEMPLATE_COLUMNS} FROM content_templates
                         WHERE category = ?1 AND format = ?2
                         ORDER BY created_at DESC, rowid DESC LIMIT 1"
                    ),
                    params![category, format],
                    row_to_template,
                )
                .optional()?;
            Ok(rec)
        })
        .await
    }

    pub async fn delete_template(&self, id: &str) -> Result<bool> {
        self.with_db(|db| {
            let rows = db.execute(
                "DELETE FROM content_templates WHERE id = ?1",
                params![id],
            )?;
            Ok(rows > 0)
        })
        .await
    }
}
