use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, ModpackError};
use crate::extract::PhraseExtractor;
use crate::rewrite::{FileOutcome, FileRewriter, SkipReason};
use crate::translate::{TranslationClient, TranslationStats};

/// Summary of one directory run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files_found: usize,
    pub translated: usize,
    pub interrupted: usize,
    pub without_phrases: usize,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// The quota latch ended the run before every file was visited
    pub stopped_early: bool,
    /// The service reported its quota spent at some point during the run
    pub quota_reached: bool,
    pub backup_root: Option<PathBuf>,
    pub stats: TranslationStats,
}

impl RunReport {
    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Translated { .. } => self.translated += 1,
            FileOutcome::Interrupted { .. } => self.interrupted += 1,
            FileOutcome::NoPhrases => self.without_phrases += 1,
            FileOutcome::Skipped(reason) => self.skipped.push((path, reason)),
        }
    }

    /// Files the rewriter was run on
    pub fn processed(&self) -> usize {
        self.translated + self.interrupted + self.without_phrases + self.skipped.len()
    }
}

/// Phrases found in one file by a dry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseListing {
    pub path: PathBuf,
    pub phrases: Vec<String>,
}

pub struct Workflow {
    config: Config,
    client: TranslationClient,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let client = TranslationClient::from_config(&config.translate)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: Config, client: TranslationClient) -> Self {
        Self { config, client }
    }

    pub fn client(&self) -> &TranslationClient {
        &self.client
    }

    /// Translate every eligible file under `root`, one at a time
    pub async fn process_directory<P: AsRef<Path>>(&mut self, root: P) -> Result<RunReport> {
        let root = root.as_ref();
        info!("Scanning folder: {}", root.display());
        ensure_directory(root)?;

        let extractor = PhraseExtractor::from_config(&self.config.scan)?;
        let backup_root = self.config.scan.make_backups
            .then(|| root.join(&self.config.scan.backup_dir));
        let rewriter = FileRewriter::new(root, extractor, backup_root);

        let files = self.collect_files(root);
        info!("Found {} files", files.len());

        let mut report = RunReport {
            files_found: files.len(),
            backup_root: rewriter.backup_root().map(Path::to_path_buf),
            ..RunReport::default()
        };

        for path in files {
            if self.client.is_service_dead() {
                warn!("Quota reached, stopping run");
                report.stopped_early = true;
                break;
            }

            let outcome = rewriter.process(&mut self.client, &path).await;
            if let FileOutcome::Skipped(reason) = &outcome {
                warn!("Skipped {}: {}", path.display(), reason);
            }
            report.record(path, outcome);
        }

        report.quota_reached = self.client.is_service_dead();
        report.stats = self.client.stats();

        info!("Translation complete, {} of {} files processed", report.processed(), report.files_found);
        Ok(report)
    }

    /// List the phrases each eligible file would send, without translating or writing anything
    pub async fn extract_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PhraseListing>> {
        let root = root.as_ref();
        ensure_directory(root)?;

        let extractor = PhraseExtractor::from_config(&self.config.scan)?;
        let mut listings = Vec::new();

        for path in self.collect_files(root) {
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Cannot read file {}: {}", path.display(), e);
                    continue;
                }
            };

            let phrases = extractor.extract(&content);
            if !phrases.is_empty() {
                listings.push(PhraseListing { path, phrases });
            }
        }

        Ok(listings)
    }

    /// Eligible files under `root` in file-name order, skipping the backup directory
    pub fn collect_files(&self, root: &Path) -> Vec<PathBuf> {
        let scan = &self.config.scan;
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() > 0
                    && entry.file_type().is_dir()
                    && entry.file_name() == scan.backup_dir.as_str())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Cannot read directory entry: {}", e);
                    continue;
                }
            };

            // Follows symlinked files; linked directories are not descended into
            if !entry.path().is_file() {
                continue;
            }

            let accepted = entry.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| scan.accepts_extension(ext));

            if accepted {
                files.push(entry.into_path());
            }
        }

        files
    }
}

fn ensure_directory(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(ModpackError::InvalidFolder(root.display().to_string()));
    }
    Ok(())
}
