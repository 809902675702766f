//! Runtime configuration: a TOML file in the data directory, overridable per
//! key via environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

const DEFAULT_API_HOST: &str = "127.0.0.1";
const DEFAULT_API_PORT: u16 = 8700;
const DEFAULT_MODEL: &str = "gpt-5-mini";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api_host: Option<String>,
    api_port: Option<u16>,
    model: Option<String>,
    openai_api_key: Option<String>,
    telegram_bot_token: Option<String>,
    reader_api_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub api_host: String,
    pub api_port: u16,
    pub model: String,
    pub openai_api_key: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub reader_api_token: Option<String>,
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = match env_var("DRAFTLOOM_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .context("could not resolve a platform data directory")?
                .join("draftloom"),
        };

        let config_path = data_dir.join("config.toml");
        let file: FileConfig = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            let parsed = toml::from_str(&raw)
                .with_context(|| format!("failed to parse {}", config_path.display()))?;
            info!("Loaded config from {}", config_path.display());
            parsed
        } else {
            FileConfig::default()
        };

        let api_port = match env_var("DRAFTLOOM_API_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid DRAFTLOOM_API_PORT: {}", raw))?,
            None => file.api_port.unwrap_or(DEFAULT_API_PORT),
        };

        Ok(Self {
            data_dir,
            api_host: env_var("DRAFTLOOM_API_HOST")
                .or(file.api_host)
                .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            api_port,
            model: env_var("DRAFTLOOM_MODEL")
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_api_key: env_var("OPENAI_API_KEY").or(file.openai_api_key),
            telegram_bot_token: env_var("TELEGRAM_BOT_TOKEN").or(file.telegram_bot_token),
            reader_api_token: env_var("READER_API_TOKEN").or(file.reader_api_token),
        })
    }
}
