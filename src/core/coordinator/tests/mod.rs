mod continue_gate;
mod ideation;
mod labels;
mod state_machine;
mod templates;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::coordinator::types::{Idea, IdeaBatch};
use crate::core::coordinator::{Coordinator, CoordinatorConfig};
use crate::core::llm::{GenerationEffort, TextGenerator};
use crate::core::seeds::seed_default_prompts;
use crate::core::source::SourceDocument;
use crate::core::store::WorkflowStore;

/// The twelve pillar angles, four per funnel stage, as a strategist response
/// would label them.
pub(crate) const PILLARS: [(&str, &str); 12] = [
    ("Attract/Growth (Build awareness & trust)", "1. Transformation"),
    ("Attract/Growth (Build awareness & trust)", "2. Misconception"),
    ("Attract/Growth (Build awareness & trust)", "3. Belief Shift"),
    ("Attract/Growth (Build awareness & trust)", "4. Hidden Truth"),
    ("Nurture/Authority (Show authority & create demand)", "5. Step-by-Step"),
    ("Nurture/Authority (Show authority & create demand)", "6. FAQ Answer"),
    ("Nurture/Authority (Show authority & create demand)", "7. Process Breakdown"),
    ("Nurture/Authority (Show authority & create demand)", "8. Quick Win"),
    ("Convert/Lead Gen (Qualify buyers & drive action)", "9. Client Fix"),
    ("Convert/Lead Gen (Qualify buyers & drive action)", "10. Case Study"),
    ("Convert/Lead Gen (Qualify buyers & drive action)", "11. Objection Reframe"),
    ("Convert/Lead Gen (Qualify buyers & drive action)", "12. Client Quote"),
];

/// Scripted provider: pops canned responses in order, then falls back to the
/// optional default. Every call is counted, including failing ones.
pub(crate) struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub(crate) fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn always(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(response.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn model_id(&self) -> &str {
        "scripted-test-model"
    }

    async fn generate(
        &self,
        _instructions: &str,
        _input: &str,
        _effort: GenerationEffort,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().await.pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(anyhow!(msg)),
            None => match &self.fallback {
                Some(text) => Ok(text.clone()),
                None => Err(anyhow!("scripted generator exhausted")),
            },
        }
    }
}

pub(crate) struct Harness {
    pub(crate) coordinator: Coordinator,
    pub(crate) store: Arc<WorkflowStore>,
    pub(crate) generator: Arc<ScriptedGenerator>,
    _tmp: tempfile::TempDir,
}

pub(crate) fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        max_retries: 3,
        min_output_chars: 10,
        stage_deadline: Duration::from_secs(300),
        backoff_unit: Duration::from_millis(1),
        backoff_cap: Duration::from_millis(4),
        history_window: 10,
    }
}

pub(crate) async fn harness_with(
    generator: ScriptedGenerator,
    config: CoordinatorConfig,
) -> Harness {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(WorkflowStore::open(tmp.path()).await.expect("store"));
    seed_default_prompts(&store).await.expect("seed prompts");
    let generator = Arc::new(generator);
    let coordinator = Coordinator::new(store.clone(), generator.clone(), None, config);
    Harness {
        coordinator,
        store,
        generator,
        _tmp: tmp,
    }
}

pub(crate) async fn harness(generator: ScriptedGenerator) -> Harness {
    harness_with(generator, test_config()).await
}

pub(crate) fn sample_document() -> SourceDocument {
    SourceDocument {
        id: "01k56vzpz8cz9zncnsj2drsqer".to_string(),
        url: "https://read.readwise.io/new/read/01k56vzpz8cz9zncnsj2drsqer".to_string(),
        title: "How to Build Reliable AI Agents".to_string(),
        author: Some("Dave Ebbelaar".to_string()),
        content: "Most effective AI agents are mostly deterministic software with strategic \
                  LLM calls placed exactly where they add value. The seven building blocks are \
                  intelligence, memory, tools, validation, control, recovery, and feedback."
            .to_string(),
        word_count: 1200,
    }
}

pub(crate) fn sample_idea(pillar_category: &str, pillar_type: &str, n: usize) -> Idea {
    Idea {
        pillar_category: pillar_category.to_string(),
        pillar_type: pillar_type.to_string(),
        content_idea: format!("Idea {}: the overlooked lever in production AI", n),
        justification: format!("Angle {} ties the source insight to the category goal", n),
        source_concept: "Deterministic software with strategic LLM calls".to_string(),
    }
}

pub(crate) fn sample_batch() -> IdeaBatch {
    IdeaBatch {
        source_title: "How to Build Reliable AI Agents".to_string(),
        source_author: Some("Dave Ebbelaar".to_string()),
        source_excerpt: sample_document().content,
        ideas: PILLARS
            .iter()
            .enumerate()
            .map(|(i, &(cat, pt))| sample_idea(cat, pt, i + 1))
            .collect(),
    }
}

/// A strategist JSON response carrying the first `count` pillar ideas.
pub(crate) fn idea_set_json(count: usize) -> String {
    let ideas: Vec<Idea> = PILLARS
        .iter()
        .copied()
        .cycle()
        .take(count)
        .enumerate()
        .map(|(i, (cat, pt))| sample_idea(cat, pt, i + 1))
        .collect();
    serde_json::json!({ "ideas": ideas }).to_string()
}

/// A draft long enough to clear any length threshold used in tests.
pub(crate) fn long_draft(tag: &str) -> String {
    format!(
        "{tag}: Most teams chase model quality while the real risk lives in the plumbing. \
         Here is the production checklist that actually moves reliability."
    )
}
