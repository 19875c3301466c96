//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_STRATEGY__SHORT_MAX_CHARS=12`).
//! [`Settings`] is the typed view used by the search pipeline; every field has
//! a default so an empty figment yields a working configuration.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if let "prod" | "production" = env {
            let settings = self.settings()?;
            if settings.vector.fake_embeddings {
                anyhow::bail!("fake embeddings must not be enabled in production");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub search: SearchSettings,
    pub strategy: StrategySettings,
    pub keyword: KeywordSettings,
    pub vector: VectorSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.search.default_limit == 0 {
            return Err(Error::InvalidConfig("search.default_limit must be positive".into()));
        }
        if self.search.preview_chars == 0 {
            return Err(Error::InvalidConfig("search.preview_chars must be positive".into()));
        }
        self.keyword.validate()?;
        if self.strategy.short_max_words > self.strategy.long_min_words || self.strategy.short_max_chars > self.strategy.long_min_chars {
            return Err(Error::InvalidConfig("strategy short-query bounds must not exceed long-query bounds".into()));
        }
        if self.vector.max_chars == 0 {
            return Err(Error::InvalidConfig("vector.max_chars must be positive".into()));
        }
        Ok(())
    }
}

/// Locations of the knowledge store snapshots and the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub store_dir: String,
    pub lancedb_dir: String,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { store_dir: "./demo_data/kb".into(), lancedb_dir: "./demo_data/indexes/lancedb".into(), table: "knowledge_base".into() }
    }
}

impl DataSettings {
    pub fn store_path(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.store_dir) }
    pub fn lancedb_path(&self, base: &Path) -> PathBuf { resolve_with_base(base, &self.lancedb_dir) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_limit: usize,
    pub preview_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self { Self { default_limit: 10, preview_chars: 200 } }
}

/// Surface-feature thresholds for picking a search strategy.
///
/// A query is "short" when it has at most `short_max_words` words and
/// `short_max_chars` characters, and "long" when it has more than
/// `long_min_words` words or more than `long_min_chars` characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    pub short_max_words: usize,
    pub short_max_chars: usize,
    pub long_min_words: usize,
    pub long_min_chars: usize,
    pub quick_contexts: Vec<String>,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            short_max_words: 2,
            short_max_chars: 10,
            long_min_words: 5,
            long_min_chars: 20,
            quick_contexts: vec!["quick_search".into(), "tag_search".into()],
        }
    }
}

/// Fixed heuristic scores for keyword matches. These are not derived from any
/// relevance signal; only their ordering matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordSettings {
    pub session_score: f32,
    pub segment_score: f32,
    pub tag_score: f32,
    pub max_tags: usize,
    pub case_sensitive: bool,
}

pub const SESSION_MATCH_SCORE: f32 = 0.8;
pub const SEGMENT_MATCH_SCORE: f32 = 0.7;
pub const TAG_MATCH_SCORE: f32 = 0.6;

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            session_score: SESSION_MATCH_SCORE,
            segment_score: SEGMENT_MATCH_SCORE,
            tag_score: TAG_MATCH_SCORE,
            max_tags: 5,
            case_sensitive: false,
        }
    }
}

impl KeywordSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, score) in [("session_score", self.session_score), ("segment_score", self.segment_score), ("tag_score", self.tag_score)] {
            if !(score > 0.0 && score <= 1.0) {
                return Err(Error::InvalidConfig(format!("keyword.{} must be in (0, 1], got {}", name, score)));
            }
        }
        if !(self.session_score > self.segment_score && self.segment_score > self.tag_score) {
            return Err(Error::InvalidConfig(format!(
                "keyword scores must satisfy session > segment > tag, got {} / {} / {}",
                self.session_score, self.segment_score, self.tag_score
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    pub enabled: bool,
    pub model_dir: Option<String>,
    pub fake_embeddings: bool,
    pub max_chars: usize,
}

impl Default for VectorSettings {
    fn default() -> Self { Self { enabled: true, model_dir: None, fake_embeddings: false, max_chars: 512 } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
