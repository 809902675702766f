use serde::{Deserialize, Serialize};

/// Workflow status persisted in the conversation state blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    InProgress,
    IdeasGenerated,
    WaitingForApproval,
    Completed,
    Error,
}

impl WorkflowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::IdeasGenerated => "ideas_generated",
            WorkflowStatus::WaitingForApproval => "waiting_for_approval",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Error => "error",
        }
    }

    pub fn from_status(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(WorkflowStatus::InProgress),
            "ideas_generated" => Some(WorkflowStatus::IdeasGenerated),
            "waiting_for_approval" => Some(WorkflowStatus::WaitingForApproval),
            "completed" => Some(WorkflowStatus::Completed),
            "error" => Some(WorkflowStatus::Error),
            _ => None,
        }
    }
}

/// One generated content angle. Ideas are produced in immutable batches of
/// twelve and selected read-only by index; they are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub pillar_category: String,
    pub pillar_type: String,
    pub content_idea: String,
    pub justification: String,
    pub source_concept: String,
}

impl Idea {
    /// True when every required field carries non-whitespace content.
    pub fn is_complete(&self) -> bool {
        !self.pillar_category.trim().is_empty()
            && !self.pillar_type.trim().is_empty()
            && !self.content_idea.trim().is_empty()
            && !self.justification.trim().is_empty()
            && !self.source_concept.trim().is_empty()
    }
}

/// The batch produced by one ideation call, kept verbatim in workflow state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaBatch {
    pub source_title: String,
    #[serde(default)]
    pub source_author: Option<String>,
    #[serde(default)]
    pub source_excerpt: String,
    pub ideas: Vec<Idea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedIdea {
    pub index: usize,
    pub idea: Idea,
}

/// Typed view of the conversation state blob. Unknown keys survive a
/// read/merge cycle through `extra`, so state written by newer builds is not
/// silently dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(default)]
    pub waiting_for_user: bool,
    #[serde(default)]
    pub awaiting_selection: bool,
    #[serde(default)]
    pub writer_complete: bool,
    #[serde(default)]
    pub format_complete: bool,
    #[serde(default)]
    pub user_satisfied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideas: Option<IdeaBatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_idea: Option<SelectedIdea>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_secs: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Partial state update. Only the fields set here are written; everything
/// else in the stored blob is preserved (shallow last-write-wins union).
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_for_user: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awaiting_selection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_satisfied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_draft: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideas: Option<IdeaBatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_idea: Option<SelectedIdea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_secs: Option<f64>,
}

/// Result of `process_request`.
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    pub status: WorkflowStatus,
    pub final_output: String,
}

/// Result of `continue_after_user_input`. `NotWaiting` is an expected caller
/// mistake and is returned as a value so front ends can branch on it without
/// an error channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContinueOutcome {
    NotWaiting { error: String },
    Completed { message: String },
    WaitingForApproval { final_output: String },
}

/// Result of `generate_ideas`.
#[derive(Debug, Clone, Serialize)]
pub struct IdeasOutcome {
    pub status: WorkflowStatus,
    pub source_title: String,
    pub ideas: Vec<Idea>,
}

/// Result of `generate_from_idea`.
#[derive(Debug, Clone, Serialize)]
pub struct DraftOutcome {
    pub status: WorkflowStatus,
    pub final_output: String,
    pub selected_idea: Idea,
    pub generation_secs: f64,
}
