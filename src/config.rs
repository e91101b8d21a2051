// WHY: One JSON file overrides any table; omitted fields fall back to the built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::exclusions::{default_excluded_domains, ExcludedDomain};
use crate::highlight::{DEFAULT_GENDER_TERMS, DEFAULT_PRONOUN_SPEC_PATTERNS};
use crate::rewriter::analyzer::DEFAULT_MAX_TEXT_LEN;
use crate::rewriter::tables::default_pronoun_entries;
use crate::rewriter::PronounEntry;

/// Everything a page rewriter is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ordered pronoun table; compound phrases must come first
    pub pronouns: Vec<PronounEntry>,
    /// Regular expressions that detect personal pronoun specifications
    pub pronoun_spec_patterns: Vec<String>,
    /// Terms that mark a page as discussing gender
    pub gender_terms: Vec<String>,
    pub excluded_domains: Vec<ExcludedDomain>,
    pub expand_contractions: bool,
    /// Wrap each replacement in hidden `<del>`/`<ins>` markup
    pub mark_changes: bool,
    /// Longest text segment, in bytes, handed to the analyzer
    pub max_segment_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pronouns: default_pronoun_entries(),
            pronoun_spec_patterns: to_strings(DEFAULT_PRONOUN_SPEC_PATTERNS),
            gender_terms: to_strings(DEFAULT_GENDER_TERMS),
            excluded_domains: default_excluded_domains(),
            expand_contractions: true,
            mark_changes: false,
            max_segment_len: DEFAULT_MAX_TEXT_LEN,
        }
    }
}

impl Config {
    /// Load from a JSON file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse config JSON")?;
        if config.max_segment_len == 0 {
            anyhow::bail!("max_segment_len must be greater than zero");
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize config")
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
