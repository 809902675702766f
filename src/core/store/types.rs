/// A conversation row. The state blob and summary are read through their own
/// accessors, not carried here.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationRecord {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
}

/// One entry of the append-only message log.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MessageRecord {
    pub id: i64,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub agent_role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

/// A stored style exemplar used to guide the formatting stage.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub format: String,
    pub author: Option<String>,
    pub source_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewTemplate {
    pub title: String,
    pub content: String,
    pub category: String,
    pub format: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A background job row.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobRecord {
    pub job_id: String,
    pub kind: String,
    pub conversation_id: Option<String>,
    pub status: String,
    pub payload_json: String,
    pub result: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub finished_at: Option<String>,
}
