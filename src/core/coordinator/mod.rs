//! The workflow coordinator: a persistent, resumable state machine that
//! sequences generation stages, tracks progress across asynchronous human
//! turns, and enforces retry/timeout/validation discipline around each stage.

mod error;
mod ideas;
mod labels;
mod stage;
pub mod types;

pub use error::WorkflowError;
pub use ideas::{IDEAS_PER_BATCH, IDEAS_PER_CATEGORY};
pub use labels::{derive_category, derive_format, normalize_label};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::core::llm::{GenerationEffort, TextGenerator};
use crate::core::source::instruction::parse_instruction;
use crate::core::source::{ReaderClient, extract_reader_url};
use crate::core::store::WorkflowStore;
use stage::StageConfig;
use types::{ContinueOutcome, StartOutcome, StatePatch, WorkflowState, WorkflowStatus};

pub const STRATEGIST_ROLE: &str = "Strategist";
pub const WRITER_ROLE: &str = "Writer";
pub const FORMAT_ROLE: &str = "Format Agent";

/// Phrases that classify a reviewer turn as approval rather than a revision
/// request. Case-insensitive substring match, anywhere in the message.
const SATISFACTION_INDICATORS: [&str; 10] = [
    "perfect",
    "great",
    "good",
    "looks good",
    "that works",
    "i'm satisfied",
    "done",
    "complete",
    "thanks",
    "approve",
];

pub fn is_satisfaction_response(text: &str) -> bool {
    let lower = text.to_lowercase();
    SATISFACTION_INDICATORS.iter().any(|k| lower.contains(k))
}

/// Allowed status transitions. Same-status writes are always fine (revision
/// loops re-enter `waiting_for_approval`); `error` is reachable from any
/// active state; a fresh request restarts a finished or failed conversation.
pub fn can_transition(from: WorkflowStatus, to: WorkflowStatus) -> bool {
    if from == to {
        return true;
    }
    match from {
        WorkflowStatus::InProgress => matches!(
            to,
            WorkflowStatus::IdeasGenerated
                | WorkflowStatus::WaitingForApproval
                | WorkflowStatus::Error
        ),
        WorkflowStatus::IdeasGenerated => {
            matches!(to, WorkflowStatus::InProgress | WorkflowStatus::Error)
        }
        WorkflowStatus::WaitingForApproval => matches!(
            to,
            WorkflowStatus::Completed | WorkflowStatus::InProgress | WorkflowStatus::Error
        ),
        WorkflowStatus::Completed => matches!(to, WorkflowStatus::InProgress),
        WorkflowStatus::Error => matches!(to, WorkflowStatus::InProgress),
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Total provider attempts per drafting/formatting call.
    pub max_retries: u32,
    /// Output shorter than this is treated as a failed attempt.
    pub min_output_chars: usize,
    /// Wall-clock budget per drafting call, anchored at the entry point.
    pub stage_deadline: Duration,
    /// Backoff unit; the delay doubles per attempt up to `backoff_cap`.
    pub backoff_unit: Duration,
    pub backoff_cap: Duration,
    /// How many recent messages enter the stage context window.
    pub history_window: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_output_chars: 50,
            stage_deadline: Duration::from_secs(300),
            backoff_unit: Duration::from_secs(1),
            backoff_cap: Duration::from_secs(10),
            history_window: 10,
        }
    }
}

pub struct Coordinator {
    store: Arc<WorkflowStore>,
    generator: Arc<dyn TextGenerator>,
    reader: Option<Arc<ReaderClient>>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        store: Arc<WorkflowStore>,
        generator: Arc<dyn TextGenerator>,
        reader: Option<Arc<ReaderClient>>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            generator,
            reader,
            config,
        }
    }

    /// Run the full initial workflow: Writer draft, then Format pass, then
    /// hand off to the human reviewer. Both stages run synchronously in
    /// sequence; failure of either propagates without transitioning.
    pub async fn process_request(
        &self,
        conversation_id: &str,
        user_request: &str,
        category_hint: Option<&str>,
    ) -> Result<StartOutcome, WorkflowError> {
        self.require_conversation(conversation_id).await?;
        self.store
            .append_message(conversation_id, "user", user_request, None, None)
            .await?;

        let instruction = parse_instruction(user_request);
        let category = category_hint
            .map(str::to_string)
            .or_else(|| instruction.category.clone())
            .map(|c| normalize_label(&c));

        self.merge_with_status(
            conversation_id,
            StatePatch {
                status: Some(WorkflowStatus::InProgress),
                waiting_for_user: Some(false),
                awaiting_selection: Some(false),
                writer_complete: Some(false),
                format_complete: Some(false),
                user_satisfied: Some(false),
                user_request: Some(user_request.to_string()),
                category: category.clone(),
                ..Default::default()
            },
        )
        .await?;

        // Writer pass: the raw request, enriched with fetched source
        // material, the parsed strategy block, and category guidance.
        let mut task = user_request.to_string();
        let source_url = extract_reader_url(user_request);
        if let Some(ref url) = source_url {
            if let Some(reader) = &self.reader {
                match reader.fetch_by_url(url).await {
                    Ok(doc) => {
                        task.push_str(&format!(
                            "\n\n--- SOURCE ARTICLE ---\nTitle: {}\nAuthor: {}\nContent: {}\n--- END SOURCE ARTICLE ---\n\
                             \nTASK: Summarize this article and draft content based on it.\n",
                            doc.title,
                            doc.author.as_deref().unwrap_or("Unknown"),
                            doc.content
                        ));
                    }
                    Err(e) => {
                        let err = WorkflowError::stage(e);
                        self.record_error(conversation_id, &err).await;
                        return Err(err);
                    }
                }
            } else {
                warn!("source URL present but no reader token configured; continuing without it");
            }
        }
        if !instruction.is_empty() {
            task.push_str("\n\n--- CONTENT STRATEGY ---\n");
            if let Some(ref icp) = instruction.icp {
                task.push_str(&format!("Target audience: {}\n", icp));
            }
            if let Some(ref dream) = instruction.dream {
                task.push_str(&format!("Desired outcome: {}\n", dream));
            }
            if let Some(ref c) = instruction.category {
                task.push_str(&format!("Content category: {}\n", c));
            }
            if let Some(ref f) = instruction.format {
                task.push_str(&format!("Content format: {}\n", f));
            }
            task.push_str("--- END CONTENT STRATEGY ---\n");
        }
        if let Some(ref category) = category {
            task.push_str(&category_guidance(category));
        }

        let writer_cfg = StageConfig {
            role: WRITER_ROLE,
            effort: GenerationEffort::Standard,
            prompt_required: false,
        };
        let writer_metadata = serde_json::json!({
            "source_url": source_url,
            "instruction": &instruction,
            "category": &category,
        });
        let draft = match self
            .run_stage(conversation_id, &writer_cfg, &task, writer_metadata)
            .await
        {
            Ok(draft) => draft,
            Err(err) => {
                self.record_error(conversation_id, &err).await;
                return Err(err);
            }
        };
        self.store
            .merge_state(
                conversation_id,
                &StatePatch {
                    writer_complete: Some(true),
                    current_draft: Some(draft.clone()),
                    ..Default::default()
                },
            )
            .await?;

        // Format pass over the fresh draft.
        let final_output = match self
            .format_draft(conversation_id, &draft, None, category.as_deref(), instruction.format.as_deref(), None)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                self.record_error(conversation_id, &err).await;
                return Err(err);
            }
        };

        self.merge_with_status(
            conversation_id,
            StatePatch {
                status: Some(WorkflowStatus::WaitingForApproval),
                waiting_for_user: Some(true),
                format_complete: Some(true),
                final_output: Some(final_output.clone()),
                ..Default::default()
            },
        )
        .await?;

        info!(
            "Workflow for conversation {} is waiting for approval",
            conversation_id
        );
        Ok(StartOutcome {
            status: WorkflowStatus::WaitingForApproval,
            final_output,
        })
    }

    /// Resume after a human turn. Only valid while the workflow is waiting on
    /// the reviewer; otherwise returns `NotWaiting` as a value with no
    /// provider call, no message append, and no state mutation.
    pub async fn continue_after_user_input(
        &self,
        conversation_id: &str,
        user_response: &str,
    ) -> Result<ContinueOutcome, WorkflowError> {
        self.require_conversation(conversation_id).await?;
        let state = self.store.read_state(conversation_id).await?;
        if !state.waiting_for_user {
            return Ok(ContinueOutcome::NotWaiting {
                error: "No conversation waiting for user input".to_string(),
            });
        }

        self.store
            .append_message(conversation_id, "user", user_response, None, None)
            .await?;

        if is_satisfaction_response(user_response) {
            self.merge_with_status(
                conversation_id,
                StatePatch {
                    status: Some(WorkflowStatus::Completed),
                    waiting_for_user: Some(false),
                    user_satisfied: Some(true),
                    ..Default::default()
                },
            )
            .await?;
            info!("Conversation {} completed", conversation_id);
            return Ok(ContinueOutcome::Completed {
                message: "Conversation completed successfully".to_string(),
            });
        }

        // Revision request: re-run the Format stage over the original draft
        // with the reviewer's message as feedback.
        let draft = state.current_draft.clone().unwrap_or_default();
        let final_output = match self
            .format_draft(
                conversation_id,
                &draft,
                None,
                None,
                None,
                Some(user_response),
            )
            .await
        {
            Ok(text) => text,
            Err(err) => {
                self.record_error(conversation_id, &err).await;
                return Err(err);
            }
        };

        self.merge_with_status(
            conversation_id,
            StatePatch {
                status: Some(WorkflowStatus::WaitingForApproval),
                waiting_for_user: Some(true),
                format_complete: Some(true),
                final_output: Some(final_output.clone()),
                ..Default::default()
            },
        )
        .await?;

        Ok(ContinueOutcome::WaitingForApproval { final_output })
    }

    /// Reformat a draft against a resolved template, optionally weaving in
    /// reviewer feedback. Used by `process_request`, the revision loop, and
    /// the standalone transform endpoint.
    pub async fn format_draft(
        &self,
        conversation_id: &str,
        draft: &str,
        template_id: Option<&str>,
        category: Option<&str>,
        format: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<String, WorkflowError> {
        self.require_conversation(conversation_id).await?;
        let template = self.resolve_template(template_id, category, format).await?;

        let mut task = String::from(
            "Review and transform this draft into a publish-ready post following the required format.\n\n",
        );
        if let Some(ref t) = template {
            task.push_str(&format!(
                "Template to follow (style/structure):\n{}\n\n",
                t.content
            ));
        }
        task.push_str(&format!("Draft:\n{}", draft));
        if let Some(feedback) = feedback {
            task.push_str(&format!("\n\nUser feedback to incorporate:\n{}", feedback));
        }

        let metadata = serde_json::json!({
            "template_id": template.as_ref().map(|t| t.id.clone()),
            "template_category": template.as_ref().map(|t| t.category.clone()),
            "template_format": template.as_ref().map(|t| t.format.clone()),
            "feedback": feedback,
        });
        let cfg = StageConfig {
            role: FORMAT_ROLE,
            effort: GenerationEffort::Standard,
            prompt_required: false,
        };
        self.run_stage_with_retries(conversation_id, &cfg, &task, metadata, Instant::now())
            .await
    }

    /// A conversation is complete when its status says so, or when both
    /// completion flags were set by whichever code path ran last. The
    /// redundancy tolerates state written by either path.
    pub async fn is_complete(&self, conversation_id: &str) -> Result<bool, WorkflowError> {
        let state = self.store.read_state(conversation_id).await?;
        Ok(state.status == Some(WorkflowStatus::Completed)
            || (state.format_complete && state.user_satisfied))
    }

    // Internal helpers

    pub(crate) async fn require_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<(), WorkflowError> {
        match self.store.get_conversation(conversation_id).await? {
            Some(_) => Ok(()),
            None => Err(WorkflowError::precondition(
                "conversation_not_found",
                format!("Conversation {} not found", conversation_id),
            )),
        }
    }

    /// Merge a patch, logging when the status change steps outside the
    /// documented transition graph.
    pub(crate) async fn merge_with_status(
        &self,
        conversation_id: &str,
        patch: StatePatch,
    ) -> Result<WorkflowState, WorkflowError> {
        if let Some(next) = patch.status {
            let current = self.store.read_state(conversation_id).await?.status;
            if let Some(current) = current
                && !can_transition(current, next)
            {
                warn!(
                    "unexpected workflow transition {} -> {} for conversation {}",
                    current.as_str(),
                    next.as_str(),
                    conversation_id
                );
            }
        }
        Ok(self.store.merge_state(conversation_id, &patch).await?)
    }

    /// Record a failure into workflow state before it is returned, so a
    /// concurrent reader can observe the reason without the caller's error
    /// channel.
    pub(crate) async fn record_error(&self, conversation_id: &str, err: &WorkflowError) {
        let patch = StatePatch {
            status: Some(WorkflowStatus::Error),
            waiting_for_user: Some(false),
            error_message: Some(err.to_string()),
            error_time: Some(now_rfc3339()),
            ..Default::default()
        };
        if let Err(store_err) = self.store.merge_state(conversation_id, &patch).await {
            error!(
                "failed to record workflow error for {}: {}",
                conversation_id, store_err
            );
        }
    }

    pub(crate) async fn fail_precondition(
        &self,
        conversation_id: &str,
        code: &'static str,
        message: String,
    ) -> WorkflowError {
        let err = WorkflowError::precondition(code, message);
        self.record_error(conversation_id, &err).await;
        err
    }
}

fn category_guidance(category: &str) -> String {
    let mut out = format!(
        "\n\nContent strategy category: {}\nFocus on content that serves the {} goal:\n",
        category.to_uppercase(),
        category
    );
    match category {
        "attract" => {
            out.push_str("- Build awareness and trust\n- Get the right people to notice and remember you")
        }
        "nurture" => out.push_str(
            "- Show authority and create demand\n- Build trust and keep the audience engaged",
        ),
        "convert" => {
            out.push_str("- Qualify and filter buyers\n- Move them toward working with you")
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests;
