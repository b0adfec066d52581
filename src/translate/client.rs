use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, ModpackError};
use super::{MyMemoryBackend, MyMemoryResponse, TranslationBackend};

/// Counters for one client's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationStats {
    pub cache_hits: usize,
    pub requests: usize,
    pub translated: usize,
    pub failed: usize,
}

/// Outcome of a single request that reached the service
enum Attempt {
    Translated(String),
    QuotaExhausted,
}

/// Translation client holding the per-run cache and the quota latch.
///
/// Once the service reports that its quota is spent the client is "dead": every later call
/// returns its input untouched without contacting the backend.
pub struct TranslationClient {
    backend: Box<dyn TranslationBackend>,
    langpair: String,
    max_retries: u32,
    retry_delay: Duration,
    quota_marker: String,
    cache: HashMap<String, String>,
    service_dead: bool,
    stats: TranslationStats,
}

impl TranslationClient {
    pub fn new(config: &TranslateConfig, backend: Box<dyn TranslationBackend>) -> Self {
        Self {
            backend,
            langpair: config.langpair(),
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            quota_marker: config.quota_marker.clone(),
            cache: HashMap::new(),
            service_dead: false,
            stats: TranslationStats::default(),
        }
    }

    /// Client talking to MyMemory over HTTP
    pub fn from_config(config: &TranslateConfig) -> Result<Self> {
        let backend = MyMemoryBackend::new(config)?;
        Ok(Self::new(config, Box::new(backend)))
    }

    pub fn is_service_dead(&self) -> bool {
        self.service_dead
    }

    pub fn cached(&self, phrase: &str) -> Option<&str> {
        self.cache.get(phrase.trim()).map(String::as_str)
    }

    pub fn stats(&self) -> TranslationStats {
        self.stats
    }

    /// Translate one phrase, falling back to the phrase itself on any failure
    pub async fn translate(&mut self, phrase: &str) -> String {
        let text = phrase.trim();
        if text.is_empty() || self.service_dead {
            return phrase.to_string();
        }

        if let Some(cached) = self.cache.get(text) {
            self.stats.cache_hits += 1;
            debug!("Translation cache hit: {}", text);
            return cached.clone();
        }

        for attempt in 1..=self.max_retries {
            self.stats.requests += 1;

            match self.request(text).await {
                Ok(Attempt::Translated(translation)) => {
                    debug!("{} -> {}", text, translation);
                    self.cache.insert(text.to_string(), translation.clone());
                    self.stats.translated += 1;
                    return translation;
                }
                Ok(Attempt::QuotaExhausted) => {
                    error!("Translation service quota reached, no further requests will be made");
                    self.service_dead = true;
                    return phrase.to_string();
                }
                Err(e) => {
                    warn!("Translation attempt {}/{} failed: {}", attempt, self.max_retries, e);
                }
            }

            if attempt < self.max_retries {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        error!("Translation failed for: {}", text);
        self.stats.failed += 1;
        phrase.to_string()
    }

    async fn request(&self, text: &str) -> Result<Attempt> {
        let reply = self.backend.fetch(text, &self.langpair).await?;

        if !reply.is_success() {
            return Err(ModpackError::Translation(format!(
                "MyMemory error {}: {}", reply.status, reply.body
            )));
        }

        let translation = MyMemoryResponse::translated_text(&reply.body)?
            .unwrap_or_else(|| text.to_string());

        if translation.contains(&self.quota_marker) {
            return Ok(Attempt::QuotaExhausted);
        }

        Ok(Attempt::Translated(translation))
    }
}
