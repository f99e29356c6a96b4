use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::PlayerErr;
use crate::error::Result;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_MODEL: &str = "o4-mini";
pub const DEFAULT_SUMMARY_MODEL: &str = "o3";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_SUMMARIZE_AFTER: u32 = 25;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SUMMARY_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SUMMARY_RETRY_DELAY_SECS: u64 = 1;
const DEFAULT_SUMMARY_LOG: &str = "summary.txt";
const DEFAULT_GAME_ROWS: u16 = 30;
const DEFAULT_GAME_COLS: u16 = 120;
const DEFAULT_STABILIZE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../templates/system_prompt.md");
const DEFAULT_SUMMARY_PROMPT: &str = include_str!("../templates/summary_prompt.md");

/// Raw deserialization target for the optional TOML config file. Every field
/// is optional; resolution fills in defaults and applies CLI overrides.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    pub model: Option<String>,
    pub summary_model: Option<String>,
    pub base_url: Option<String>,
    pub api_key_file: Option<PathBuf>,
    pub system_prompt_file: Option<PathBuf>,
    pub summary_prompt_file: Option<PathBuf>,
    pub summarize_after: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub summary_timeout_secs: Option<u64>,
    pub summary_retry_delay_secs: Option<u64>,
    pub summary_log: Option<PathBuf>,
    #[serde(default)]
    pub game: GameToml,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GameToml {
    pub command: Option<Vec<String>>,
    pub cwd: Option<PathBuf>,
    pub rows: Option<u16>,
    pub cols: Option<u16>,
    pub prompt_marker: Option<String>,
    pub stabilize_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
}

/// Values the CLI can force regardless of what the config file says.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub summary_model: Option<String>,
    pub summarize_after: Option<u32>,
    pub system_prompt_file: Option<PathBuf>,
    pub summary_prompt_file: Option<PathBuf>,
    pub summary_log: Option<PathBuf>,
    pub game_command: Option<Vec<String>>,
    pub game_cwd: Option<PathBuf>,
}

/// Fully resolved settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub model: String,
    pub summary_model: String,
    pub base_url: String,
    pub api_key: String,
    pub system_prompt: String,
    pub summary_prompt: String,
    pub summarize_after: u32,
    pub request_timeout: Duration,
    pub summary_timeout: Duration,
    pub summary_retry_delay: Duration,
    pub summary_log: PathBuf,
    pub game: GameConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Argv for the game process. First element is the program.
    pub command: Vec<String>,
    pub cwd: PathBuf,
    pub rows: u16,
    pub cols: u16,
    /// Text of the game's input prompt, used to trim echoed input when the
    /// command itself cannot be located in the new screen text.
    pub prompt_marker: Option<String>,
    pub stabilize_timeout: Duration,
    pub poll_interval: Duration,
}

impl Config {
    /// Reads the TOML file (when given), resolves the API key from the
    /// environment, and applies CLI overrides.
    pub fn load(config_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let toml = match config_path {
            Some(path) => read_config_toml(path)?,
            None => ConfigToml::default(),
        };
        let api_key_env = std::env::var(OPENAI_API_KEY_ENV).ok();
        Self::resolve(toml, overrides, api_key_env)
    }

    /// Pure resolution step, separated from `load` so it can run without
    /// touching the process environment.
    pub fn resolve(
        toml: ConfigToml,
        overrides: ConfigOverrides,
        api_key_env: Option<String>,
    ) -> Result<Self> {
        let api_key = resolve_api_key(api_key_env, toml.api_key_file.as_deref())?;

        let system_prompt = resolve_prompt(
            overrides
                .system_prompt_file
                .as_deref()
                .or(toml.system_prompt_file.as_deref()),
            DEFAULT_SYSTEM_PROMPT,
        )?;
        let summary_prompt = resolve_prompt(
            overrides
                .summary_prompt_file
                .as_deref()
                .or(toml.summary_prompt_file.as_deref()),
            DEFAULT_SUMMARY_PROMPT,
        )?;

        let command = overrides
            .game_command
            .or(toml.game.command)
            .unwrap_or_default();
        if command.is_empty() {
            return Err(PlayerErr::Config(
                "no game command configured: set [game].command in the config file or pass one after `--`".to_string(),
            ));
        }

        let cwd = match overrides.game_cwd.or(toml.game.cwd) {
            Some(cwd) => cwd,
            None => std::env::current_dir()?,
        };

        let summarize_after = overrides
            .summarize_after
            .or(toml.summarize_after)
            .unwrap_or(DEFAULT_SUMMARIZE_AFTER);
        if summarize_after == 0 {
            return Err(PlayerErr::Config(
                "summarize_after must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            model: overrides
                .model
                .or(toml.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            summary_model: overrides
                .summary_model
                .or(toml.summary_model)
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            base_url: toml
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            system_prompt,
            summary_prompt,
            summarize_after,
            request_timeout: Duration::from_secs(
                toml.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            summary_timeout: Duration::from_secs(
                toml.summary_timeout_secs
                    .unwrap_or(DEFAULT_SUMMARY_TIMEOUT_SECS),
            ),
            summary_retry_delay: Duration::from_secs(
                toml.summary_retry_delay_secs
                    .unwrap_or(DEFAULT_SUMMARY_RETRY_DELAY_SECS),
            ),
            summary_log: overrides
                .summary_log
                .or(toml.summary_log)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SUMMARY_LOG)),
            game: GameConfig {
                command,
                cwd,
                rows: toml.game.rows.unwrap_or(DEFAULT_GAME_ROWS),
                cols: toml.game.cols.unwrap_or(DEFAULT_GAME_COLS),
                prompt_marker: toml.game.prompt_marker,
                stabilize_timeout: Duration::from_secs(
                    toml.game
                        .stabilize_timeout_secs
                        .unwrap_or(DEFAULT_STABILIZE_TIMEOUT_SECS),
                ),
                poll_interval: Duration::from_secs(
                    toml.game
                        .poll_interval_secs
                        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
                ),
            },
        })
    }
}

fn read_config_toml(path: &Path) -> Result<ConfigToml> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|err| {
        PlayerErr::Config(format!("failed to parse {}: {err}", path.display()))
    })
}

fn resolve_api_key(api_key_env: Option<String>, api_key_file: Option<&Path>) -> Result<String> {
    if let Some(key) = api_key_env {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
    }
    if let Some(path) = api_key_file {
        let key = std::fs::read_to_string(path)?.trim().to_string();
        if !key.is_empty() {
            return Ok(key);
        }
        return Err(PlayerErr::Config(format!(
            "api key file {} is empty",
            path.display()
        )));
    }
    Err(PlayerErr::Config(format!(
        "no API key: set {OPENAI_API_KEY_ENV} or api_key_file in the config file"
    )))
}

fn resolve_prompt(path: Option<&Path>, embedded_default: &str) -> Result<String> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?.trim().to_string()),
        None => Ok(embedded_default.trim().to_string()),
    }
}
