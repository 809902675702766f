use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::llm::{GenerationEffort, TextGenerator};

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    instructions: &'a str,
    input: &'a str,
    reasoning: Reasoning<'a>,
}

#[derive(Serialize)]
struct Reasoning<'a> {
    effort: &'a str,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputBlock>,
}

#[derive(Deserialize)]
struct OutputBlock {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

pub struct OpenAiGenerator {
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: Client::new(),
        }
    }
}

/// Pull plain text out of a response. Tries the aggregated `output_text`
/// field first, then walks the structured output blocks.
fn extract_text(parsed: ResponsesResponse) -> Option<String> {
    if let Some(text) = parsed.output_text
        && !text.is_empty()
    {
        return Some(text);
    }
    for item in parsed.output {
        for block in item.content {
            if (block.kind == "output_text" || block.kind == "text") && !block.text.is_empty() {
                return Some(block.text);
            }
        }
    }
    None
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        instructions: &str,
        input: &str,
        effort: GenerationEffort,
    ) -> Result<String> {
        let req = ResponsesRequest {
            model: &self.model,
            instructions,
            input,
            reasoning: Reasoning {
                effort: match effort {
                    GenerationEffort::Standard => "medium",
                    GenerationEffort::Thorough => "high",
                },
            },
        };

        let res = self
            .client
            .post("https://api.openai.com/v1/responses")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(anyhow!(
                "OpenAI API Error: {}",
                res.text().await.unwrap_or_default()
            ));
        }
        let parsed: ResponsesResponse = res.json().await?;
        extract_text(parsed).ok_or_else(|| anyhow!("provider returned no text output"))
    }
}
