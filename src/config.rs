//! Process configuration from environment variables

use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_WEBHOOK_PATH: &str = "/flashy-bot-path";
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    pub webhook_path: String,
    pub page_size: usize,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("FLASHY_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(home).join(".flashy").join("flashy.db")
            },
            PathBuf::from,
        );

        let webhook_path = match lookup("FLASHY_WEBHOOK_PATH") {
            Some(path) if path.starts_with('/') && path.len() > 1 => path,
            Some(path) => {
                tracing::warn!(
                    value = %path,
                    "FLASHY_WEBHOOK_PATH must start with '/', using default"
                );
                DEFAULT_WEBHOOK_PATH.to_string()
            }
            None => DEFAULT_WEBHOOK_PATH.to_string(),
        };

        Self {
            db_path,
            port: parse_or(&lookup, "FLASHY_PORT", DEFAULT_PORT),
            webhook_path,
            page_size: parse_or(&lookup, "FLASHY_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1),
            max_body_bytes: parse_or(&lookup, "FLASHY_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, "Unparseable configuration value, using default");
        default
    })
}
