//! Prompt registry: versioned system prompts per agent role, with one
//! version marked current per role.

use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use super::WorkflowStore;

impl WorkflowStore {
    /// The prompt text currently promoted for a role.
    pub async fn get_current_prompt(&self, agent_role: &str) -> Result<Option<String>> {
        self.with_db(|db| {
            let prompt = db
                .query_row(
                    "SELECT prompt FROM system_prompts
                     WHERE agent_role = ?1 AND is_current = 1
                     ORDER BY id DESC LIMIT 1",
                    params![agent_role],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(prompt)
        })
        .await
    }

    /// The version string of the currently promoted prompt, recorded in
    /// message metadata so outputs are traceable to the prompt that made them.
    pub async fn get_current_prompt_version(&self, agent_role: &str) -> Result<Option<String>> {
        self.with_db(|db| {
            let version = db
                .query_row(
                    "SELECT version FROM system_prompts
                     WHERE agent_role = ?1 AND is_current = 1
                     ORDER BY id DESC LIMIT 1",
                    params![agent_role],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(version)
        })
        .await
    }

    /// Store a new prompt version. With `promote`, it becomes current and
    /// every other version of the role is demoted.
    pub async fn set_prompt(
        &self,
        agent_role: &str,
        prompt: &str,
        version: &str,
        promote: bool,
    ) -> Result<()> {
        self.with_db(|db| {
            db.execute(
                "INSERT OR REPLACE INTO system_prompts (agent_role, version, prompt, is_current)
                 VALUES (?1, ?2, ?3, ?4)",
                params![agent_role, version, prompt, promote as i64],
            )?;
            if promote {
                db.execute(
                    "UPDATE system_prompts SET is_current = 0
                     WHERE agent_role = ?1 AND version != ?2",
                    params![agent_role, version],
                )?;
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::core::store::WorkflowStore;

    #[tokio::test]
    async fn promoting_a_version_demotes_its_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let store = WorkflowStore::open(tmp.path()).await.unwrap();

        store.set_prompt("Writer", "one", "v1.0", true).await.unwrap();
        assert_eq!(
            store.get_current_prompt("Writer").await.unwrap().as_deref(),
            Some("one")
        );

        store.set_prompt("Writer", "two", "v2.0", true).await.unwrap();
        assert_eq!(
            store.get_current_prompt("Writer").await.unwrap().as_deref(),
            Some("two")
        );
        assert_eq!(
            store
                .get_current_prompt_version("Writer")
                .await
                .unwrap()
                .as_deref(),
            Some("v2.0")
        );

        // A non-promoted version does not steal currency.
        store
            .set_prompt("Writer", "three", "v3.0", false)
            .await
            .unwrap();
        assert_eq!(
            store
                .get_current_prompt_version("Writer")
                .await
                .unwrap()
                .as_deref(),
            Some("v2.0")
        );

        // Roles are independent.
        assert_eq!(store.get_current_prompt("Strategist").await.unwrap(), None);
    }
}
