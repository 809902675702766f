use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{error, info};

use crate::core::coordinator::{Coordinator, WorkflowError};
use crate::core::coordinator::types::ContinueOutcome;
use crate::core::store::WorkflowStore;

/// Telegram caps messages at 4096 chars; stay under it with room for headers.
const CHUNK_SIZE: usize = 4000;

const HELP_TEXT: &str = "\
draftloom bot

Commands:
/ideas <url> - Generate 12 content ideas from a source article
/select <conversation_id> <n> - Expand idea #n into a full post
/post <request> - Generate a post directly (supports the `- key: value` format)
/reply <conversation_id> <message> - Approve the draft or request changes
/help - Show this help message

12-idea workflow:
1. /ideas https://read.readwise.io/new/read/01abc123...
2. /select <conversation_id> 3
3. /reply <conversation_id> make the hook sharper
4. /reply <conversation_id> perfect, thanks

Advanced request format for /post:
- url: https://read.readwise.io/new/read/...
- icp: target audience
- dream: desired outcome
- category: attract|nurture|convert
- format: belief_shift|step_by_step|case_study|...";

fn chunk_text(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(CHUNK_SIZE)
        .map(|c| c.iter().collect())
        .collect()
}

/// Render a workflow failure for the chat: actionable input problems show
/// usage guidance, timeouts suggest a smaller input, the rest ask the user
/// to retry.
fn render_error(err: &WorkflowError) -> String {
    match err {
        WorkflowError::Precondition { message, .. } => {
            format!("{} Send /help for usage.", message)
        }
        WorkflowError::Configuration(msg) => format!("Configuration problem: {}", msg),
        WorkflowError::Timeout { .. } => {
            "Generation timed out. Try again, or pick a shorter source article.".to_string()
        }
        _ => "Generation failed after retries. Please try again shortly.".to_string(),
    }
}

pub struct TelegramInterface {
    token: String,
    store: Arc<WorkflowStore>,
    coordinator: Arc<Coordinator>,
}

impl TelegramInterface {
    pub fn new(token: String, store: Arc<WorkflowStore>, coordinator: Arc<Coordinator>) -> Self {
        Self {
            token,
            store,
            coordinator,
        }
    }

    pub fn start(&self) {
        let bot = Bot::new(&self.token);
        let store = self.store.clone();
        let coordinator = self.coordinator.clone();

        info!("Telegram interface starting");
        tokio::spawn(async move {
            teloxide::repl(bot, move |bot: Bot, msg: Message| {
                let store = store.clone();
                let coordinator = coordinator.clone();
                async move {
                    let Some(text) = msg.text() else {
                        return Ok(());
                    };
                    let trimmed = text.trim();

                    if trimmed == "/start" || trimmed == "/help" {
                        let _ = bot.send_message(msg.chat.id, HELP_TEXT).await;
                        return Ok(());
                    }

                    if let Some(rest) = trimmed.strip_prefix("/ideas") {
                        handle_ideas(&bot, &msg, &store, &coordinator, rest.trim()).await;
                        return Ok(());
                    }
                    if let Some(rest) = trimmed.strip_prefix("/select") {
                        handle_select(&bot, &msg, &coordinator, rest.trim()).await;
                        return Ok(());
                    }
                    if let Some(rest) = trimmed.strip_prefix("/reply") {
                        handle_reply(&bot, &msg, &coordinator, rest.trim()).await;
                        return Ok(());
                    }
                    if let Some(rest) = trimmed.strip_prefix("/post") {
                        handle_post(&bot, &msg, &store, &coordinator, rest.trim()).await;
                        return Ok(());
                    }

                    let _ = bot
                        .send_message(msg.chat.id, "Unknown command. Send /help for usage.")
                        .await;
                    Ok(())
                }
            })
            .await;
        });
    }
}

/// Send a long reply: the first chunk replaces the processing message, the
/// rest go out as follow-ups.
async fn deliver(bot: &Bot, chat_id: ChatId, processing_id: MessageId, text: &str) {
    let chunks = chunk_text(text);
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            let _ = bot.edit_message_text(chat_id, processing_id, chunk).await;
        } else {
            let _ = bot.send_message(chat_id, chunk).await;
        }
    }
}

async fn handle_ideas(
    bot: &Bot,
    msg: &Message,
    store: &Arc<WorkflowStore>,
    coordinator: &Arc<Coordinator>,
    args: &str,
) {
    if args.is_empty() || url::Url::parse(args).is_err() {
        let _ = bot
            .send_message(
                msg.chat.id,
                "Usage: /ideas <source url>\n\nExample: /ideas https://read.readwise.io/new/read/01abc123",
            )
            .await;
        return;
    }

    let processing = match bot
        .send_message(msg.chat.id, "Generating 12 content ideas from your article...")
        .await
    {
        Ok(m) => m,
        Err(e) => {
            error!("telegram send failed: {}", e);
            return;
        }
    };

    let conv = match store.create_conversation(Some("Ideas from source article")).await {
        Ok(conv) => conv,
        Err(e) => {
            error!("conversation create failed: {}", e);
            let _ = bot
                .edit_message_text(msg.chat.id, processing.id, "Internal error. Try again.")
                .await;
            return;
        }
    };

    match coordinator.generate_ideas(&conv.id, args).await {
        Ok(outcome) => {
            let mut reply = format!(
                "Generated {} content ideas\nSource: {}\n\nSelect an idea to expand into a full post:\n\n",
                outcome.ideas.len(),
                outcome.source_title
            );
            for (i, idea) in outcome.ideas.iter().enumerate() {
                let headline: String = idea.content_idea.chars().take(100).collect();
                reply.push_str(&format!(
                    "{}. {} ({})\n   {}\n\n",
                    i + 1,
                    idea.pillar_type,
                    idea.pillar_category,
                    headline
                ));
            }
            reply.push_str(&format!(
                "Conversation ID: {}\n\nTo generate a post from idea #3, reply with:\n/select {} 3",
                conv.id, conv.id
            ));
            deliver(bot, msg.chat.id, processing.id, &reply).await;
        }
        Err(err) => {
            let _ = bot
                .edit_message_text(msg.chat.id, processing.id, render_error(&err))
                .await;
        }
    }
}

async fn handle_select(bot: &Bot, msg: &Message, coordinator: &Arc<Coordinator>, args: &str) {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let (conv_id, index) = match (parts.first(), parts.get(1)) {
        (Some(id), Some(n)) => match n.parse::<usize>() {
            // Humans count from 1.
            Ok(n) if n >= 1 => (id.to_string(), n - 1),
            _ => {
                let _ = bot
                    .send_message(msg.chat.id, "Usage: /select <conversation_id> <idea_number>")
                    .await;
                return;
            }
        },
        _ => {
            let _ = bot
                .send_message(
                    msg.chat.id,
                    "Usage: /select <conversation_id> <idea_number>\n\nExample: /select abc123 3",
                )
                .await;
            return;
        }
    };

    let processing = match bot
        .send_message(
            msg.chat.id,
            format!(
                "Generating a full article from idea #{}...\nThis may take up to 5 minutes.",
                index + 1
            ),
        )
        .await
    {
        Ok(m) => m,
        Err(e) => {
            error!("telegram send failed: {}", e);
            return;
        }
    };

    match coordinator.generate_from_idea(&conv_id, index, None).await {
        Ok(outcome) => {
            let header = format!(
                "Generated from idea #{}\n{}\nGenerated in {:.1}s\n\n",
                index + 1,
                outcome.selected_idea.pillar_type,
                outcome.generation_secs
            );
            let reply = format!(
                "{}{}\n\nReply with /reply {} <feedback>, or /reply {} perfect to approve.",
                header, outcome.final_output, conv_id, conv_id
            );
            deliver(bot, msg.chat.id, processing.id, &reply).await;
        }
        Err(err) => {
            let _ = bot
                .edit_message_text(msg.chat.id, processing.id, render_error(&err))
                .await;
        }
    }
}

async fn handle_reply(bot: &Bot, msg: &Message, coordinator: &Arc<Coordinator>, args: &str) {
    let Some((conv_id, response)) = args.split_once(char::is_whitespace) else {
        let _ = bot
            .send_message(msg.chat.id, "Usage: /reply <conversation_id> <message>")
            .await;
        return;
    };

    let processing = match bot.send_message(msg.chat.id, "Processing your feedback...").await {
        Ok(m) => m,
        Err(e) => {
            error!("telegram send failed: {}", e);
            return;
        }
    };

    match coordinator
        .continue_after_user_input(conv_id, response.trim())
        .await
    {
        Ok(ContinueOutcome::Completed { message }) => {
            let _ = bot.edit_message_text(msg.chat.id, processing.id, message).await;
        }
        Ok(ContinueOutcome::WaitingForApproval { final_output }) => {
            let reply = format!(
                "Revised draft:\n\n{}\n\nReply with /reply {} <feedback>, or approve with /reply {} perfect.",
                final_output, conv_id, conv_id
            );
            deliver(bot, msg.chat.id, processing.id, &reply).await;
        }
        Ok(ContinueOutcome::NotWaiting { error }) => {
            let _ = bot
                .edit_message_text(
                    msg.chat.id,
                    processing.id,
                    format!("{}. Start with /post or /ideas first.", error),
                )
                .await;
        }
        Err(err) => {
            let _ = bot
                .edit_message_text(msg.chat.id, processing.id, render_error(&err))
                .await;
        }
    }
}

async fn handle_post(
    bot: &Bot,
    msg: &Message,
    store: &Arc<WorkflowStore>,
    coordinator: &Arc<Coordinator>,
    args: &str,
) {
    if args.is_empty() {
        let _ = bot
            .send_message(msg.chat.id, "Provide a request after /post. Send /help for the format.")
            .await;
        return;
    }

    let processing = match bot.send_message(msg.chat.id, "Processing your request...").await {
        Ok(m) => m,
        Err(e) => {
            error!("telegram send failed: {}", e);
            return;
        }
    };

    let conv = match store.create_conversation(Some("Telegram generated post")).await {
        Ok(conv) => conv,
        Err(e) => {
            error!("conversation create failed: {}", e);
            let _ = bot
                .edit_message_text(msg.chat.id, processing.id, "Internal error. Try again.")
                .await;
            return;
        }
    };

    match coordinator.process_request(&conv.id, args, None).await {
        Ok(outcome) => {
            let reply = format!(
                "Generated post:\n\n{}\n\nReply with /reply {} <feedback>, or approve with /reply {} perfect.",
                outcome.final_output, conv.id, conv.id
            );
            deliver(bot, msg.chat.id, processing.id, &reply).await;
        }
        Err(err) => {
            let _ = bot
                .edit_message_text(msg.chat.id, processing.id, render_error(&err))
                .await;
        }
    }
}
