//! Background execution of coordinator calls. A submitted job is persisted
//! first, then driven on a spawned task; callers poll the job row. Re-running
//! a job only duplicates append-only message rows, so at-least-once delivery
//! is safe.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::coordinator::Coordinator;
use crate::core::store::WorkflowStore;
use crate::core::store::types::JobRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    CreatePost,
    GenerateIdeas,
    GenerateFromIdea,
    FormatWithFeedback,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::CreatePost => "create_post",
            JobKind::GenerateIdeas => "generate_ideas",
            JobKind::GenerateFromIdea => "generate_from_idea",
            JobKind::FormatWithFeedback => "format_with_feedback",
        }
    }
}

/// Union of the inputs the four job kinds need; each kind validates its own
/// required fields at execution time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPayload {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_request: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub idea_index: Option<usize>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub draft: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl JobPayload {
    fn conversation_id(&self) -> Result<&str> {
        self.conversation_id
            .as_deref()
            .ok_or_else(|| anyhow!("job payload is missing conversation_id"))
    }
}

pub struct JobQueue {
    store: Arc<WorkflowStore>,
    coordinator: Arc<Coordinator>,
}

impl JobQueue {
    pub fn new(store: Arc<WorkflowStore>, coordinator: Arc<Coordinator>) -> Self {
        Self { store, coordinator }
    }

    /// Persist a job row and start driving it in the background. Returns the
    /// queued record immediately; progress lands on the row.
    pub async fn submit(&self, kind: JobKind, payload: JobPayload) -> Result<JobRecord> {
        let payload_json = serde_json::to_string(&payload)?;
        let record = self
            .store
            .create_job(
                kind.as_str(),
                payload.conversation_id.as_deref(),
                &payload_json,
            )
            .await?;

        let store = self.store.clone();
        let coordinator = self.coordinator.clone();
        let job_id = record.job_id.clone();
        tokio::spawn(async move {
            if let Err(e) = store
                .update_job_status(&job_id, "processing", None, None)
                .await
            {
                error!("job {}: failed to mark processing: {}", job_id, e);
            }
            match execute(&coordinator, kind, &payload).await {
                Ok(result) => {
                    info!("job {} ({}) completed", job_id, kind.as_str());
                    if let Err(e) = store
                        .update_job_status(&job_id, "completed", Some(&result), None)
                        .await
                    {
                        error!("job {}: failed to record result: {}", job_id, e);
                    }
                }
                Err(e) => {
                    error!("job {} ({}) failed: {}", job_id, kind.as_str(), e);
                    if let Err(store_err) = store
                        .update_job_status(&job_id, "failed", None, Some(&e.to_string()))
                        .await
                    {
                        error!("job {}: failed to record error: {}", job_id, store_err);
                    }
                }
            }
        });

        Ok(record)
    }

    pub async fn status(&self, job_id: &str) -> Result<Option<JobRecord>> {
        self.store.get_job(job_id).await
    }
}

async fn execute(
    coordinator: &Coordinator,
    kind: JobKind,
    payload: &JobPayload,
) -> Result<String> {
    match kind {
        JobKind::CreatePost => {
            let conversation_id = payload.conversation_id()?;
            let request = payload
                .user_request
                .as_deref()
                .ok_or_else(|| anyhow!("job payload is missing user_request"))?;
            let outcome = coordinator
                .process_request(conversation_id, request, payload.category.as_deref())
                .await?;
            Ok(serde_json::to_string(&outcome)?)
        }
        JobKind::GenerateIdeas => {
            let conversation_id = payload.conversation_id()?;
            let url = payload
                .source_url
                .as_deref()
                .ok_or_else(|| anyhow!("job payload is missing source_url"))?;
            let outcome = coordinator.generate_ideas(conversation_id, url).await?;
            Ok(serde_json::to_string(&outcome)?)
        }
        JobKind::GenerateFromIdea => {
            let conversation_id = payload.conversation_id()?;
            let index = payload
                .idea_index
                .ok_or_else(|| anyhow!("job payload is missing idea_index"))?;
            let outcome = coordinator
                .generate_from_idea(conversation_id, index, payload.template_id.as_deref())
                .await?;
            Ok(serde_json::to_string(&outcome)?)
        }
        JobKind::FormatWithFeedback => {
            let conversation_id = payload.conversation_id()?;
            let draft = payload
                .draft
                .as_deref()
                .ok_or_else(|| anyhow!("job payload is missing draft"))?;
            let content = coordinator
                .format_draft(
                    conversation_id,
                    draft,
                    payload.template_id.as_deref(),
                    payload.category.as_deref(),
                    payload.format.as_deref(),
                    payload.feedback.as_deref(),
                )
                .await?;
            Ok(serde_json::json!({ "content": content }).to_string())
        }
    }
}
