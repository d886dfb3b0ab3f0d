//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults, `config.toml`, `config.<env>.toml`
//! and `APP_*` env vars (`__` separates nested keys). Paths may use `~` and
//! `${VAR}`.
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
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load with config files looked up in `dir` for the given environment.
    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The full typed settings tree, validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub index: IndexSettings,
    pub search: SearchSettings,
    pub citations: CitationSettings,
    pub qa: QaSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub documents_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self { Self { documents_dir: "data".to_string() } }
}

impl DataSettings {
    pub fn documents_dir(&self) -> PathBuf { expand_path(&self.documents_dir) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub sentences_per_chunk: usize,
    pub min_chunk_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { sentences_per_chunk: 2, min_chunk_chars: 20 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Upper bound on vocabulary size; the most frequent terms win.
    pub max_features: usize,
    /// Longest word n-gram in the vocabulary.
    pub ngram_max: usize,
}

impl Default for IndexSettings {
    fn default() -> Self { Self { max_features: 1000, ngram_max: 2 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub snippet_length: usize,
}

impl Default for SearchSettings {
    fn default() -> Self { Self { default_page_size: 10, max_page_size: 100, snippet_length: 300 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationSettings {
    pub max_citations: usize,
    /// Largest span a merged keyword window may cover before padding.
    pub window_cap: usize,
    pub padding: usize,
    pub top_keywords: usize,
    pub fallback_chars: usize,
    pub highlight_open: String,
    pub highlight_close: String,
}

impl Default for CitationSettings {
    fn default() -> Self {
        Self {
            max_citations: 3,
            window_cap: 1000,
            padding: 50,
            top_keywords: 3,
            fallback_chars: 500,
            highlight_open: "**".to_string(),
            highlight_close: "**".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    /// When set, answer from the top-N ranked fragments instead of the whole corpus.
    pub context_limit: Option<usize>,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: usize) -> Result<()> {
            if value == 0 { return Err(Error::InvalidConfig(format!("{} must be greater than zero", name))); }
            Ok(())
        }
        positive("chunking.sentences_per_chunk", self.chunking.sentences_per_chunk)?;
        positive("index.max_features", self.index.max_features)?;
        positive("index.ngram_max", self.index.ngram_max)?;
        positive("search.default_page_size", self.search.default_page_size)?;
        positive("search.max_page_size", self.search.max_page_size)?;
        positive("search.snippet_length", self.search.snippet_length)?;
        positive("citations.window_cap", self.citations.window_cap)?;
        positive("citations.top_keywords", self.citations.top_keywords)?;
        if self.search.default_page_size > self.search.max_page_size {
            return Err(Error::InvalidConfig(format!(
                "search.default_page_size ({}) exceeds search.max_page_size ({})",
                self.search.default_page_size, self.search.max_page_size
            )));
        }
        if self.qa.context_limit == Some(0) {
            return Err(Error::InvalidConfig("qa.context_limit must be greater than zero".to_string()));
        }
        Ok(())
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut s = Settings::default();
        s.search.default_page_size = 0;
        assert!(matches!(s.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn documents_dir_expands_env_vars() {
        let mut s = Settings::default();
        s.data.documents_dir = "${CARGO_MANIFEST_DIR}/data".to_string();
        assert_eq!(s.data.documents_dir(), Path::new(env!("CARGO_MANIFEST_DIR")).join("data"));
    }
}
