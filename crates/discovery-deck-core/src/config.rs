//! Deck configuration: defaults, optional TOML file, then `DECK__*` environment overrides.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | host | 127.0.0.1 | Gateway bind address. |
//! | port | 3000 | Gateway port. |
//! | storage_path | ./data | Base directory for the transcript store. |
//! | api_base | https://api.openai.com/v1 | OpenAI-compatible completion endpoint base. |
//! | chat_model | gpt-3.5-turbo-0125 | Model for `/chat`. |
//! | summary_model | gpt-4o-mini | Model for `/summarize`. |
//! | summary_temperature | 0.4 | Sampling temperature for summaries. |
//! | gateway_url | http://127.0.0.1:3000 | Where the presenter reaches the gateway. |
//! | reference_image | assets/aiuniverse.jpeg | Illustrative image embedded in exports. |
//! | export_dir | . | Directory the presenter writes exported documents to. |
//!
//! The completion API credential is never read from the file: it comes from
//! `OPENAI_API_KEY` so that the key stays in the backend environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckConfig {
    pub host: String,
    pub port: u16,
    pub storage_path: String,
    pub api_base: String,
    pub chat_model: String,
    pub summary_model: String,
    pub summary_temperature: f32,
    pub gateway_url: String,
    pub reference_image: String,
    pub export_dir: String,
    /// Populated from `OPENAI_API_KEY` after loading; absent is a reportable condition, not an error.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            storage_path: "./data".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo-0125".to_string(),
            summary_model: "gpt-4o-mini".to_string(),
            summary_temperature: 0.4,
            gateway_url: "http://127.0.0.1:3000".to_string(),
            reference_image: "assets/aiuniverse.jpeg".to_string(),
            export_dir: ".".to_string(),
            api_key: None,
        }
    }
}

impl DeckConfig {
    /// Load config. Precedence: env `DECK_CONFIG` path > `config/deck.toml` > defaults, then `DECK__*` env.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DECK_CONFIG").unwrap_or_else(|_| "config/deck".to_string());
        let mut cfg = Self::load_from(Some(Path::new(&config_path)))?;
        cfg.api_key = api_key_from_env();
        Ok(cfg)
    }

    /// Load from an explicit file (extension optional). Missing files fall back to defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("storage_path", d.storage_path)?
            .set_default("api_base", d.api_base)?
            .set_default("chat_model", d.chat_model)?
            .set_default("summary_model", d.summary_model)?
            .set_default("summary_temperature", f64::from(d.summary_temperature))?
            .set_default("gateway_url", d.gateway_url)?
            .set_default("reference_image", d.reference_image)?
            .set_default("export_dir", d.export_dir)?;

        let builder = match path {
            Some(p) => builder.add_source(config::File::from(p).required(false)),
            None => builder,
        };

        let built = builder
            .add_source(config::Environment::with_prefix("DECK").separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn transcript_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_path).join("transcript")
    }
}

/// Trimmed, non-empty `OPENAI_API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let cfg = DeckConfig::load_from(Some(Path::new("does/not/exist/deck"))).unwrap();
        assert_eq!(cfg.chat_model, "gpt-3.5-turbo-0125");
        assert_eq!(cfg.summary_model, "gpt-4o-mini");
        assert!((cfg.summary_temperature - 0.4).abs() < f32::EPSILON);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.toml");
        std::fs::write(&path, "port = 4100\nchat_model = \"gpt-4o\"\n").unwrap();
        let cfg = DeckConfig::load_from(Some(&path)).unwrap();
        assert_eq!(cfg.port, 4100);
        assert_eq!(cfg.chat_model, "gpt-4o");
        assert_eq!(cfg.bind_addr(), "127.0.0.1:4100");
        assert_eq!(cfg.transcript_path(), PathBuf::from("./data").join("transcript"));
    }
}
