use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use crate::config::Config;
use crate::core::coordinator::{Coordinator, CoordinatorConfig};
use crate::core::jobs::JobQueue;
use crate::core::llm::providers::OpenAiGenerator;
use crate::core::seeds::seed_default_prompts;
use crate::core::source::ReaderClient;
use crate::core::store::WorkflowStore;
use crate::interfaces::telegram::TelegramInterface;
use crate::interfaces::web::ApiServer;

fn print_help() {
    println!(
        "draftloom - human-in-the-loop content generation workflow\n\n\
         Usage: draftloom <command> [flags]\n\n\
         Commands:\n\
         \x20 serve    Start the API server (and the Telegram bot when a token is configured)\n\
         \x20 seed     Seed default agent prompts into the database\n\
         \x20 help     Show this help message\n\n\
         Flags for serve:\n\
         \x20 --api-host <host>   Bind address (default 127.0.0.1)\n\
         \x20 --api-port <port>   Bind port (default 8700)"
    );
}

fn parse_serve_flags(
    args: &[String],
    start: usize,
    mut api_host: String,
    mut api_port: u16,
) -> (String, u16) {
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--api-host" => {
                if i + 1 < args.len() {
                    api_host = args[i + 1].clone();
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--api-port" => {
                if i + 1 < args.len() {
                    if let Ok(port) = args[i + 1].parse() {
                        api_port = port;
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    (api_host, api_port)
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None | Some("serve") => {
            let config = Config::load()?;
            let (api_host, api_port) =
                parse_serve_flags(&args, 2, config.api_host.clone(), config.api_port);
            serve(config, api_host, api_port).await
        }
        Some("seed") => {
            let config = Config::load()?;
            let store = WorkflowStore::open(&config.data_dir).await?;
            seed_default_prompts(&store).await?;
            println!("Default prompts seeded.");
            Ok(())
        }
        Some("help") | Some("--help") | Some("-h") => {
            print_help();
            Ok(())
        }
        Some(other) => {
            print_help();
            bail!("unknown command: {}", other);
        }
    }
}

async fn serve(config: Config, api_host: String, api_port: u16) -> Result<()> {
    let Some(api_key) = config.openai_api_key.clone() else {
        bail!("OPENAI_API_KEY is required to serve (env var or config.toml)");
    };

    let store = Arc::new(WorkflowStore::open(&config.data_dir).await?);
    seed_default_prompts(&store).await?;

    let generator = Arc::new(OpenAiGenerator::new(api_key, config.model.clone()));
    let reader = config
        .reader_api_token
        .clone()
        .map(|token| Arc::new(ReaderClient::new(token)));
    if reader.is_none() {
        info!("No reader API token configured; source-article fetching is disabled");
    }

    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        generator,
        reader,
        CoordinatorConfig::default(),
    ));
    let jobs = Arc::new(JobQueue::new(store.clone(), coordinator.clone()));

    match config.telegram_bot_token.clone() {
        Some(token) => {
            TelegramInterface::new(token, store.clone(), coordinator.clone()).start();
        }
        None => info!("No Telegram bot token configured; bot interface is disabled"),
    }

    ApiServer::new(store, coordinator, jobs, api_host, api_port)
        .serve()
        .await
}
