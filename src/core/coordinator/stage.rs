//! Unified stage invocation: one parameterized call path covers every agent
//! role, so prompt resolution, context assembly, output validation, and the
//! message-log append are never duplicated per role.

use std::time::{Duration, Instant};

use anyhow::anyhow;
use tracing::warn;

use super::Coordinator;
use super::error::WorkflowError;
use super::types::StatePatch;
use crate::core::llm::GenerationEffort;

/// Per-call stage parameters. Roles differ only in prompt source, effort,
/// and whether a missing prompt is a configuration fault.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StageConfig {
    pub role: &'static str,
    pub effort: GenerationEffort,
    pub prompt_required: bool,
}

pub(crate) struct StageOutput {
    pub text: String,
    pub prompt_version: Option<String>,
}

/// Exponential backoff: base-2 growth on the configured unit, capped.
pub(crate) fn backoff_delay(attempt: u32, unit: Duration, cap: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    unit.saturating_mul(factor).min(cap)
}

impl Coordinator {
    /// One provider attempt: resolve the role's prompt, assemble the input
    /// (summary, then bounded recent history, then the task payload), invoke
    /// the provider, and validate output length. No side effects on the
    /// conversation beyond reads.
    pub(crate) async fn invoke_stage(
        &self,
        conversation_id: &str,
        cfg: &StageConfig,
        task: &str,
    ) -> Result<StageOutput, WorkflowError> {
        let instructions = match self.store.get_current_prompt(cfg.role).await? {
            Some(prompt) => prompt,
            None if cfg.prompt_required => {
                return Err(WorkflowError::Configuration(format!(
                    "no current prompt registered for role '{}'",
                    cfg.role
                )));
            }
            None => String::new(),
        };
        let prompt_version = self.store.get_current_prompt_version(cfg.role).await?;

        let mut input = String::new();
        if let Some(summary) = self.store.read_summary(conversation_id).await? {
            input.push_str("Conversation summary:\n");
            input.push_str(&summary);
            input.push_str("\n\n");
        }
        let recent = self
            .store
            .read_messages(conversation_id, self.config.history_window, None)
            .await?;
        if !recent.is_empty() {
            input.push_str("Recent conversation:\n");
            for message in &recent {
                input.push_str(&message.role);
                input.push_str(": ");
                input.push_str(&message.content);
                input.push('\n');
            }
            input.push('\n');
        }
        input.push_str(task);

        let text = self
            .generator
            .generate(&instructions, &input, cfg.effort)
            .await
            .map_err(WorkflowError::stage)?;

        let trimmed_len = text.trim().chars().count();
        if trimmed_len < self.config.min_output_chars {
            return Err(WorkflowError::stage(anyhow!(
                "stage output below minimum length ({} chars)",
                trimmed_len
            )));
        }

        Ok(StageOutput {
            text,
            prompt_version,
        })
    }

    /// One attempt plus the success side effect: the tagged assistant message
    /// append, which is the only effect visible outside the call.
    pub(crate) async fn run_stage(
        &self,
        conversation_id: &str,
        cfg: &StageConfig,
        task: &str,
        metadata: serde_json::Value,
    ) -> Result<String, WorkflowError> {
        let out = self.invoke_stage(conversation_id, cfg, task).await?;
        self.append_stage_message(conversation_id, cfg.role, &out, metadata)
            .await?;
        Ok(out.text)
    }

    pub(crate) async fn append_stage_message(
        &self,
        conversation_id: &str,
        role: &'static str,
        out: &StageOutput,
        metadata: serde_json::Value,
    ) -> Result<(), WorkflowError> {
        let mut metadata = match metadata {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        metadata.insert(
            "model".to_string(),
            serde_json::Value::String(self.generator.model_id().to_string()),
        );
        metadata.insert(
            "prompt_version".to_string(),
            out.prompt_version
                .clone()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
        );
        self.store
            .append_message(
                conversation_id,
                "assistant",
                &out.text,
                Some(role),
                Some(&serde_json::Value::Object(metadata)),
            )
            .await?;
        Ok(())
    }

    /// Retry envelope: up to `max_retries` attempts against a wall-clock
    /// budget anchored at `started`. The budget is checked before the first
    /// attempt and re-checked before each retry; the incremented retry
    /// counter and last error are persisted before sleeping so an external
    /// reader can observe progress.
    pub(crate) async fn run_stage_with_retries(
        &self,
        conversation_id: &str,
        cfg: &StageConfig,
        task: &str,
        metadata: serde_json::Value,
        started: Instant,
    ) -> Result<String, WorkflowError> {
        let budget = self.config.stage_deadline;
        let mut last_err: Option<WorkflowError> = None;

        for attempt in 0..self.config.max_retries {
            let elapsed = started.elapsed();
            if elapsed >= budget {
                return Err(WorkflowError::Timeout {
                    elapsed_secs: elapsed.as_secs_f64(),
                    budget_secs: budget.as_secs(),
                });
            }

            match self
                .run_stage(conversation_id, cfg, task, metadata.clone())
                .await
            {
                Ok(text) => return Ok(text),
                Err(err @ WorkflowError::Configuration(_)) => return Err(err),
                Err(err @ WorkflowError::Precondition { .. }) => return Err(err),
                Err(err) => {
                    let retries_used = attempt + 1;
                    warn!(
                        "stage '{}' attempt {}/{} failed: {}",
                        cfg.role, retries_used, self.config.max_retries, err
                    );
                    if retries_used < self.config.max_retries {
                        let patch = StatePatch {
                            retry_count: Some(retries_used),
                            last_error: Some(err.to_string()),
                            ..Default::default()
                        };
                        self.store.merge_state(conversation_id, &patch).await?;
                        let delay = backoff_delay(
                            retries_used,
                            self.config.backoff_unit,
                            self.config.backoff_cap,
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_err = Some(err);
                }
            }
        }

        match last_err {
            Some(WorkflowError::Stage { source, .. }) => Err(WorkflowError::Stage {
                attempts: self.config.max_retries,
                source,
            }),
            Some(other) => Err(other),
            None => Err(WorkflowError::stage(anyhow!("stage made no attempts"))),
        }
    }
}
