use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use crate::error::{Result, ModpackError};

/// Default config file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "modpack-translate.toml";

/// Marker MyMemory puts in `translatedText` once the daily free allowance is spent
pub const MYMEMORY_QUOTA_MARKER: &str = "YOU USED ALL AVAILABLE FREE TRANSLATIONS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: TranslateConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// MyMemory `get` endpoint URL
    pub endpoint: String,
    /// Source language code
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// Maximum attempts per phrase before falling back to the original text
    pub max_retries: u32,
    /// Fixed delay between attempts (milliseconds)
    pub retry_delay_ms: u64,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    /// Substring of a translation that signals the service quota is exhausted
    pub quota_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions (without dot, case-insensitive) treated as translatable text
    pub extensions: Vec<String>,
    /// Name of the backup directory created under the scanned folder
    pub backup_dir: String,
    /// Copy every file to the backup directory before rewriting it
    pub make_backups: bool,
    /// Regex matching one phrase of the source script
    pub phrase_pattern: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.mymemory.translated.net/get".to_string(),
            source_lang: "zh".to_string(),
            target_lang: "en".to_string(),
            max_retries: 3,
            retry_delay_ms: 2000,
            timeout_secs: 15,
            quota_marker: MYMEMORY_QUOTA_MARKER.to_string(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: ["txt", "json", "toml", "cfg", "ini", "zs", "snbt", "mcfunction", "kubejs"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            backup_dir: "_backup".to_string(),
            make_backups: true,
            phrase_pattern: r"[\u{4e00}-\u{9fff}]+".to_string(),
        }
    }
}

impl TranslateConfig {
    /// Language pair in the `source|target` form the service expects
    pub fn langpair(&self) -> String {
        format!("{}|{}", self.source_lang, self.target_lang)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ScanConfig {
    /// Case-insensitive check against the extension allow-list
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ModpackError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ModpackError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ModpackError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.translate.max_retries == 0 {
            return Err(ModpackError::Config("translate.max_retries must be at least 1".to_string()));
        }
        if self.translate.quota_marker.is_empty() {
            return Err(ModpackError::Config("translate.quota_marker must not be empty".to_string()));
        }
        if self.scan.backup_dir.is_empty() {
            return Err(ModpackError::Config("scan.backup_dir must not be empty".to_string()));
        }
        Ok(())
    }
}
