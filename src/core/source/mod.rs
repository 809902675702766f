//! Source material retrieval: a reader-service client that turns a shared
//! article URL into a cleaned, bounded document the generation stages can
//! consume.

pub mod instruction;

use anyhow::{Result, anyhow};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

/// Character budget applied to fetched article bodies before they enter a
/// stage payload; reader documents can be far larger than provider limits.
pub const SOURCE_CONTENT_MAX_CHARS: usize = 8000;

/// A fetched source article, already cleaned for prompt use.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub content: String,
    pub word_count: u64,
}

#[derive(Deserialize)]
struct ReaderListResponse {
    #[serde(default)]
    results: Vec<ReaderDocument>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ReaderDocument {
    id: String,
    url: String,
    title: String,
    author: Option<String>,
    content: Option<String>,
    html_content: Option<String>,
    word_count: Option<u64>,
}

/// Extract a reader share URL from free text. Accepts both the YAML-ish
/// `- url: <url>` request format and a bare URL.
pub fn extract_reader_url(text: &str) -> Option<String> {
    let yaml = Regex::new(r"(?i)-\s*url:\s*(https://read\.readwise\.io/\S+)").unwrap();
    if let Some(cap) = yaml.captures(text) {
        return Some(cap[1].to_string());
    }
    let bare =
        Regex::new(r"https?://(?:www\.)?(?:read\.)?readwise\.io/(?:new/)?(?:read|reader/shared)/[\w-]+")
            .unwrap();
    bare.find(text).map(|m| m.as_str().to_string())
}

/// Pull the document id out of a share URL (`…/read/<id>`).
pub fn extract_document_id(url: &str) -> Option<String> {
    let re = Regex::new(r"/(?:read|shared)/([A-Za-z0-9-]+)").unwrap();
    re.captures(url).map(|cap| cap[1].to_string())
}

/// Strip HTML tags and collapse whitespace, then truncate to the budget.
pub fn clean_content(raw: &str, max_chars: usize) -> String {
    let no_tags = Regex::new(r"<[^>]+>").unwrap().replace_all(raw, " ");
    let collapsed = Regex::new(r"\s+")
        .unwrap()
        .replace_all(&no_tags, " ")
        .trim()
        .to_string();
    if collapsed.chars().count() > max_chars {
        let truncated: String = collapsed.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        collapsed
    }
}

pub struct ReaderClient {
    api_token: String,
    base_url: String,
    client: Client,
}

impl ReaderClient {
    pub fn new(api_token: String) -> Self {
        Self {
            api_token,
            base_url: "https://readwise.io/api/v3".to_string(),
            client: Client::new(),
        }
    }

    /// Fetch a document by share URL: id extraction, API call, content
    /// cleanup. The html body is preferred over the plain one when present.
    pub async fn fetch_by_url(&self, share_url: &str) -> Result<SourceDocument> {
        let document_id = extract_document_id(share_url)
            .ok_or_else(|| anyhow!("could not extract a document id from URL: {}", share_url))?;
        self.fetch_by_id(&document_id).await
    }

    pub async fn fetch_by_id(&self, document_id: &str) -> Result<SourceDocument> {
        let res = self
            .client
            .get(format!("{}/list/", self.base_url))
            .header("Authorization", format!("Token {}", self.api_token))
            .query(&[("id", document_id), ("withHtmlContent", "true")])
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(anyhow!(
                "reader API error {}: {}",
                res.status(),
                res.text().await.unwrap_or_default()
            ));
        }

        let parsed: ReaderListResponse = res.json().await?;
        let doc = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("document {} not found in reader", document_id))?;

        let raw = doc
            .html_content
            .filter(|c| !c.is_empty())
            .or(doc.content)
            .unwrap_or_default();
        let content = clean_content(&raw, SOURCE_CONTENT_MAX_CHARS);
        if content.is_empty() {
            return Err(anyhow!("document {} has no content", document_id));
        }

        info!(
            "Retrieved source document '{}' ({} cleaned chars)",
            doc.title,
            content.len()
        );

        Ok(SourceDocument {
            id: doc.id,
            url: doc.url,
            title: doc.title,
            author: doc.author.filter(|a| !a.is_empty()),
            content,
            word_count: doc.word_count.unwrap_or(0),
        })
    }
}
