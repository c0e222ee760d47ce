//! # Configuration Module
//!
//! Process settings read from the environment (after `.env` is loaded by
//! `main`). Only the bot token is required.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::PathBuf;

// Defaults
pub const DEFAULT_HIERARCHY_PATH: &str = "mapping.json";
pub const DEFAULT_DELIVERY_LANGUAGE: &str = "ru";
pub const DEFAULT_KEYBOARD_COLUMNS: usize = 2;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Settings for the intake bot
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram bot token, never logged
    pub telegram_token: String,
    /// JSON document with the location hierarchy
    pub hierarchy_path: PathBuf,
    /// Language of the headers sent to officials
    pub delivery_language: String,
    /// Buttons per row in menu keyboards
    pub keyboard_columns: usize,
    pub log_format: LogFormat,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("telegram_token", &"[REDACTED]")
            .field("hierarchy_path", &self.hierarchy_path)
            .field("delivery_language", &self.delivery_language)
            .field("keyboard_columns", &self.keyboard_columns)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl BotConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = var("TELEGRAM_BOT_TOKEN")
            .or_else(|| var("TOKEN"))
            .context("TELEGRAM_BOT_TOKEN must be set")?;

        let hierarchy_path = var("HIERARCHY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HIERARCHY_PATH));

        let delivery_language =
            var("DELIVERY_LANGUAGE").unwrap_or_else(|| DEFAULT_DELIVERY_LANGUAGE.to_string());

        let keyboard_columns = match var("KEYBOARD_COLUMNS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("KEYBOARD_COLUMNS is not a number: {raw}"))?,
            None => DEFAULT_KEYBOARD_COLUMNS,
        };
        if keyboard_columns == 0 {
            bail!("KEYBOARD_COLUMNS must be at least 1");
        }

        let log_format = match var("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        };

        Ok(Self {
            telegram_token,
            hierarchy_path,
            delivery_language,
            keyboard_columns,
            log_format,
        })
    }
}
