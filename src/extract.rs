use std::collections::HashSet;
use regex::Regex;

use crate::config::ScanConfig;
use crate::error::{Result, ModpackError};

/// Finds the distinct source-script phrases embedded in arbitrary text
#[derive(Debug, Clone)]
pub struct PhraseExtractor {
    pattern: Regex,
}

impl PhraseExtractor {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| ModpackError::Config(format!("Invalid phrase pattern '{}': {}", pattern, e)))?;
        Ok(Self { pattern })
    }

    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        Self::new(&config.phrase_pattern)
    }

    /// Maximal matching runs in order of first appearance, each phrase listed once
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|phrase| !phrase.is_empty() && seen.insert(*phrase))
            .map(str::to_string)
            .collect()
    }
}
