//! Ideation and idea-to-draft expansion: a source article becomes an
//! immutable batch of twelve content angles, and a selected angle becomes a
//! full draft under the retry/deadline envelope.

use std::time::Instant;

use anyhow::anyhow;
use serde::Deserialize;
use tracing::info;

use super::labels::{CATEGORIES, derive_category, derive_format, normalize_label};
use super::stage::StageConfig;
use super::error::WorkflowError;
use super::types::{
    DraftOutcome, Idea, IdeaBatch, IdeasOutcome, SelectedIdea, StatePatch, WorkflowStatus,
};
use super::{Coordinator, FORMAT_ROLE, STRATEGIST_ROLE, now_rfc3339};
use crate::core::llm::GenerationEffort;
use crate::core::source::SourceDocument;
use crate::core::store::types::TemplateRecord;

/// Ideation is all-or-nothing: exactly this many ideas per batch.
pub const IDEAS_PER_BATCH: usize = 12;
/// Four angles per funnel-stage category.
pub const IDEAS_PER_CATEGORY: usize = 4;

/// Extract a JSON block from stage output. Tries fenced ```json ... ```
/// first, then raw JSON starting with `{` or `[`.
pub(crate) fn extract_json_block(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let content_start = start + 7;
        if let Some(end) = trimmed[content_start..].find("```") {
            let block = trimmed[content_start..content_start + end].trim();
            if !block.is_empty() {
                return Some(block);
            }
        }
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(trimmed);
    }
    None
}

#[derive(Deserialize)]
struct RawIdeaSet {
    ideas: Vec<Idea>,
}

/// Parse and validate a strategist response. Any structural defect is a hard
/// failure; there is no partial-idea recovery.
pub(crate) fn parse_idea_batch(text: &str, doc: &SourceDocument) -> Result<IdeaBatch, String> {
    let json = extract_json_block(text).ok_or("strategist output contained no JSON block")?;
    let raw: RawIdeaSet = serde_json::from_str(json)
        .map_err(|e| format!("strategist output was not a valid idea set: {}", e))?;

    if raw.ideas.len() != IDEAS_PER_BATCH {
        return Err(format!(
            "expected exactly {} ideas, got {}",
            IDEAS_PER_BATCH,
            raw.ideas.len()
        ));
    }
    for (i, idea) in raw.ideas.iter().enumerate() {
        if !idea.is_complete() {
            return Err(format!("idea {} is missing required fields", i + 1));
        }
    }
    for category in CATEGORIES {
        let count = raw
            .ideas
            .iter()
            .filter(|idea| derive_category(&idea.pillar_category) == Some(category))
            .count();
        if count != IDEAS_PER_CATEGORY {
            return Err(format!(
                "expected {} '{}' ideas, got {}",
                IDEAS_PER_CATEGORY, category, count
            ));
        }
    }

    Ok(IdeaBatch {
        source_title: doc.title.clone(),
        source_author: doc.author.clone(),
        source_excerpt: doc.content.clone(),
        ideas: raw.ideas,
    })
}

fn build_ideation_task(doc: &SourceDocument) -> String {
    format!(
        "Analyze the source article below and produce exactly {count} content ideas as JSON. \
         Output ONLY valid JSON, no other text.\n\n\
         JSON schema:\n\
         {{\n\
           \"ideas\": [\n\
             {{\n\
               \"pillar_category\": \"<the framework category, e.g. Attract/Growth>\",\n\
               \"pillar_type\": \"<the numbered angle, e.g. 3. Belief Shift>\",\n\
               \"content_idea\": \"<specific, compelling headline>\",\n\
               \"justification\": \"<why this angle works, tied to the source>\",\n\
               \"source_concept\": \"<the key source insight this builds on>\"\n\
             }}\n\
           ]\n\
         }}\n\n\
         Rules:\n\
         - Exactly one idea per pillar type, {per_cat} per category, {count} total\n\
         - Every idea must be traceable to the source material\n\n\
         SOURCE ARTICLE\n\
         Title: {title}\n\
         Author: {author}\n\
         Content: {content}",
        count = IDEAS_PER_BATCH,
        per_cat = IDEAS_PER_CATEGORY,
        title = doc.title,
        author = doc.author.as_deref().unwrap_or("Unknown"),
        content = doc.content,
    )
}

fn build_drafting_task(idea: &Idea, batch: &IdeaBatch, template: Option<&TemplateRecord>) -> String {
    let mut task = format!(
        "Write a complete, publish-ready post expanding the selected content idea.\n\n\
         Selected angle: {} ({})\n\
         Headline: {}\n\
         Why this angle works: {}\n\
         Core source concept: {}\n\n\
         Source article excerpt:\n{}\n\n",
        idea.pillar_type,
        idea.pillar_category,
        idea.content_idea,
        idea.justification,
        idea.source_concept,
        batch.source_excerpt,
    );
    match template {
        Some(t) => {
            task.push_str("Template to follow (style/structure):\n");
            task.push_str(&t.content);
        }
        None => task.push_str(
            "No template available. Use a strong one-line hook, short lines, generous \
             spacing, and a direct closing question.",
        ),
    }
    task
}

impl Coordinator {
    /// Ideation: fetch the source article and ask the Strategist stage for a
    /// schema-constrained batch of twelve ideas. A structurally invalid
    /// result is a hard failure with no partial state written.
    pub async fn generate_ideas(
        &self,
        conversation_id: &str,
        source_url: &str,
    ) -> Result<IdeasOutcome, WorkflowError> {
        self.require_conversation(conversation_id).await?;
        let reader = self.reader.as_ref().ok_or_else(|| {
            WorkflowError::Configuration(
                "reader API token not configured; cannot fetch source documents".to_string(),
            )
        })?;

        let doc = match reader.fetch_by_url(source_url).await {
            Ok(doc) => doc,
            Err(e) => {
                let err = WorkflowError::stage(e);
                self.record_error(conversation_id, &err).await;
                return Err(err);
            }
        };

        self.generate_ideas_from_document(conversation_id, &doc)
            .await
    }

    /// Ideation over an already-fetched source document.
    pub async fn generate_ideas_from_document(
        &self,
        conversation_id: &str,
        doc: &SourceDocument,
    ) -> Result<IdeasOutcome, WorkflowError> {
        self.require_conversation(conversation_id).await?;
        self.store
            .append_message(
                conversation_id,
                "user",
                &format!("Generate content ideas from: {}", doc.url),
                None,
                None,
            )
            .await?;
        self.merge_with_status(
            conversation_id,
            StatePatch {
                status: Some(WorkflowStatus::InProgress),
                waiting_for_user: Some(false),
                awaiting_selection: Some(false),
                user_request: Some(doc.url.clone()),
                ..Default::default()
            },
        )
        .await?;

        let cfg = StageConfig {
            role: STRATEGIST_ROLE,
            effort: GenerationEffort::Thorough,
            prompt_required: true,
        };
        let task = build_ideation_task(doc);
        let out = match self.invoke_stage(conversation_id, &cfg, &task).await {
            Ok(out) => out,
            Err(err) => {
                self.record_error(conversation_id, &err).await;
                return Err(err);
            }
        };

        let batch = match parse_idea_batch(&out.text, doc) {
            Ok(batch) => batch,
            Err(msg) => {
                let err = WorkflowError::stage(anyhow!(msg));
                self.record_error(conversation_id, &err).await;
                return Err(err);
            }
        };

        // The message body carries a short summary; the full payload rides in
        // metadata for later retrieval by front ends.
        let summary = format!(
            "Generated {} content ideas from \"{}\"",
            batch.ideas.len(),
            batch.source_title
        );
        let metadata = serde_json::json!({
            "ideas": batch,
            "model": self.generator.model_id(),
            "prompt_version": out.prompt_version,
            "source_url": doc.url,
        });
        self.store
            .append_message(
                conversation_id,
                "assistant",
                &summary,
                Some(STRATEGIST_ROLE),
                Some(&metadata),
            )
            .await?;
        self.merge_with_status(
            conversation_id,
            StatePatch {
                status: Some(WorkflowStatus::IdeasGenerated),
                awaiting_selection: Some(true),
                waiting_for_user: Some(false),
                ideas: Some(batch.clone()),
                ..Default::default()
            },
        )
        .await?;

        info!(
            "Ideation complete for conversation {}: {} ideas from '{}'",
            conversation_id,
            batch.ideas.len(),
            batch.source_title
        );
        Ok(IdeasOutcome {
            status: WorkflowStatus::IdeasGenerated,
            source_title: batch.source_title,
            ideas: batch.ideas,
        })
    }

    /// Expand one selected idea into a full draft. Preconditions are checked
    /// in order before any provider call; the drafting stage then runs at
    /// elevated thoroughness inside the retry/deadline envelope.
    pub async fn generate_from_idea(
        &self,
        conversation_id: &str,
        idea_index: usize,
        template_id: Option<&str>,
    ) -> Result<DraftOutcome, WorkflowError> {
        let started = Instant::now();
        self.require_conversation(conversation_id).await?;

        let state = self.store.read_state(conversation_id).await?;
        let Some(batch) = state.ideas else {
            return Err(self
                .fail_precondition(
                    conversation_id,
                    "no_ideas",
                    "No ideas found for this conversation. Generate ideas first.".to_string(),
                )
                .await);
        };
        if batch.ideas.is_empty() {
            return Err(self
                .fail_precondition(
                    conversation_id,
                    "empty_idea_batch",
                    "The stored idea batch is empty.".to_string(),
                )
                .await);
        }
        if idea_index >= batch.ideas.len() {
            return Err(self
                .fail_precondition(
                    conversation_id,
                    "invalid_idea_index",
                    format!(
                        "Invalid idea index {}; this conversation has {} ideas.",
                        idea_index,
                        batch.ideas.len()
                    ),
                )
                .await);
        }
        let idea = batch.ideas[idea_index].clone();
        if !idea.is_complete() {
            return Err(self
                .fail_precondition(
                    conversation_id,
                    "incomplete_idea",
                    format!("Idea {} is missing required fields.", idea_index),
                )
                .await);
        }

        let category = derive_category(&idea.pillar_category);
        let format = derive_format(&idea.pillar_type);
        let template = self
            .resolve_template(template_id, category, Some(&format))
            .await?;

        self.merge_with_status(
            conversation_id,
            StatePatch {
                status: Some(WorkflowStatus::InProgress),
                waiting_for_user: Some(false),
                awaiting_selection: Some(false),
                selected_idea: Some(SelectedIdea {
                    index: idea_index,
                    idea: idea.clone(),
                }),
                retry_count: Some(0),
                generation_started_at: Some(now_rfc3339()),
                ..Default::default()
            },
        )
        .await?;

        let task = build_drafting_task(&idea, &batch, template.as_ref());
        let metadata = serde_json::json!({
            "idea_index": idea_index,
            "pillar_type": idea.pillar_type,
            "template_id": template.as_ref().map(|t| t.id.clone()),
            "template_category": template.as_ref().map(|t| t.category.clone()),
            "template_format": template.as_ref().map(|t| t.format.clone()),
        });
        let cfg = StageConfig {
            role: FORMAT_ROLE,
            effort: GenerationEffort::Thorough,
            prompt_required: false,
        };
        let text = match self
            .run_stage_with_retries(conversation_id, &cfg, &task, metadata, started)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                self.record_error(conversation_id, &err).await;
                return Err(err);
            }
        };

        let generation_secs = started.elapsed().as_secs_f64();
        self.merge_with_status(
            conversation_id,
            StatePatch {
                status: Some(WorkflowStatus::WaitingForApproval),
                waiting_for_user: Some(true),
                format_complete: Some(true),
                current_draft: Some(text.clone()),
                final_output: Some(text.clone()),
                generation_completed_at: Some(now_rfc3339()),
                generation_secs: Some(generation_secs),
                ..Default::default()
            },
        )
        .await?;

        Ok(DraftOutcome {
            status: WorkflowStatus::WaitingForApproval,
            final_output: text,
            selected_idea: idea,
            generation_secs,
        })
    }

    /// Resolve at most one template: an explicit id wins outright; otherwise
    /// the most recent match for the normalized (category, format) pair.
    pub(crate) async fn resolve_template(
        &self,
        template_id: Option<&str>,
        category: Option<&str>,
        format: Option<&str>,
    ) -> Result<Option<TemplateRecord>, WorkflowError> {
        if let Some(id) = template_id {
            return Ok(self.store.get_template(id).await?);
        }
        if let (Some(category), Some(format)) = (category, format) {
            let category = normalize_label(category);
            let format = normalize_label(format);
            return Ok(self.store.latest_template(&category, &format).await?);
        }
        Ok(None)
    }
}
