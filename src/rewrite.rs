use std::fmt;
use std::fs::{FileTimes, OpenOptions};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{Result, ModpackError};
use crate::extract::PhraseExtractor;
use crate::translate::TranslationClient;

/// Why a file was left alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unreadable(String),
    BackupFailed(String),
    WriteFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(e) => write!(f, "cannot read file: {}", e),
            Self::BackupFailed(e) => write!(f, "cannot back up file: {}", e),
            Self::WriteFailed(e) => write!(f, "cannot write file: {}", e),
        }
    }
}

/// Result of processing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Every phrase went through the client; `translated` of them came back changed
    Translated { phrases: usize, translated: usize },
    /// The quota latch tripped after `applied` of `total` phrases were substituted
    Interrupted { applied: usize, total: usize },
    /// Nothing to translate, file not rewritten
    NoPhrases,
    Skipped(SkipReason),
}

/// Text after substituting phrases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    pub applied: usize,
    pub translated: usize,
    pub interrupted: bool,
}

/// Substitute each phrase, in order, everywhere it occurs in the evolving text.
///
/// Replacement is literal and sequential: a translation containing a later phrase's text is
/// itself rewritten when that later phrase is processed.
pub async fn substitute_phrases(
    client: &mut TranslationClient,
    content: &str,
    phrases: &[String],
) -> Substitution {
    let mut text = content.to_string();
    let mut applied = 0;
    let mut translated = 0;
    let mut interrupted = false;

    for phrase in phrases {
        let translation = client.translate(phrase).await;

        // The phrase that hit the quota comes back untranslated and is not counted
        if client.is_service_dead() {
            warn!("Stopping further translations due to translation quota");
            interrupted = true;
            break;
        }

        if translation != *phrase {
            translated += 1;
        }
        text = text.replace(phrase.as_str(), &translation);
        applied += 1;
    }

    Substitution {
        text,
        applied,
        translated,
        interrupted,
    }
}

/// Rewrites files under one root folder, backing each one up first
pub struct FileRewriter {
    extractor: PhraseExtractor,
    root: PathBuf,
    backup_root: Option<PathBuf>,
}

impl FileRewriter {
    /// `backup_root` of `None` disables backups
    pub fn new(root: impl Into<PathBuf>, extractor: PhraseExtractor, backup_root: Option<PathBuf>) -> Self {
        Self {
            extractor,
            root: root.into(),
            backup_root,
        }
    }

    pub fn backup_root(&self) -> Option<&Path> {
        self.backup_root.as_deref()
    }

    /// Where `path` is mirrored under the backup root
    pub fn backup_path(&self, path: &Path) -> Result<Option<PathBuf>> {
        let Some(backup_root) = &self.backup_root else {
            return Ok(None);
        };

        let relative = pathdiff::diff_paths(path, &self.root)
            .filter(|rel| !rel.components().any(|c| matches!(c, Component::ParentDir)))
            .ok_or_else(|| ModpackError::Backup(format!(
                "{} is outside {}", path.display(), self.root.display()
            )))?;

        Ok(Some(backup_root.join(relative)))
    }

    /// Translate one file in place. Failures are logged and reported in the outcome.
    pub async fn process(&self, client: &mut TranslationClient, path: &Path) -> FileOutcome {
        info!("Processing: {}", path.display());

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot read file {}: {}", path.display(), e);
                return FileOutcome::Skipped(SkipReason::Unreadable(e.to_string()));
            }
        };

        if let Err(e) = self.backup(path).await {
            warn!("Cannot back up {}: {}", path.display(), e);
            return FileOutcome::Skipped(SkipReason::BackupFailed(e.to_string()));
        }

        let phrases = self.extractor.extract(&content);
        if phrases.is_empty() {
            info!("No phrases found");
            return FileOutcome::NoPhrases;
        }
        debug!("Found {} distinct phrases", phrases.len());

        let substitution = substitute_phrases(client, &content, &phrases).await;

        if let Err(e) = fs::write(path, &substitution.text).await {
            warn!("Failed to write {}: {}", path.display(), e);
            return FileOutcome::Skipped(SkipReason::WriteFailed(e.to_string()));
        }

        if substitution.interrupted {
            FileOutcome::Interrupted {
                applied: substitution.applied,
                total: phrases.len(),
            }
        } else {
            info!("File translated");
            FileOutcome::Translated {
                phrases: phrases.len(),
                translated: substitution.translated,
            }
        }
    }

    async fn backup(&self, path: &Path) -> Result<()> {
        let Some(backup_path) = self.backup_path(path)? else {
            return Ok(());
        };

        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        copy_preserving_times(path, &backup_path)?;

        debug!("Backed up {} -> {}", path.display(), backup_path.display());
        Ok(())
    }
}

/// Copy `src` to `dst` and carry over its access and modification times
fn copy_preserving_times(src: &Path, dst: &Path) -> Result<()> {
    let metadata = std::fs::metadata(src)?;
    std::fs::copy(src, dst)?;

    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    // Copies of read-only files cannot be opened for writing
    let file = OpenOptions::new()
        .write(true)
        .open(dst)
        .or_else(|_| std::fs::File::open(dst))?;
    file.set_times(times)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use std::time::{Duration, SystemTime};

    use crate::config::{MYMEMORY_QUOTA_MARKER, ScanConfig};
    use crate::translate::MockTranslationBackend;
    use crate::translate::testing::{scripted_backend, test_client};

    fn rewriter(temp: &TempDir, backups: bool) -> FileRewriter {
        let extractor = PhraseExtractor::from_config(&ScanConfig::default()).unwrap();
        let backup_root = backups.then(|| temp.path().join("_backup"));
        FileRewriter::new(temp.path(), extractor, backup_root)
    }

    fn set_mtime(path: &Path, mtime: SystemTime) {
        OpenOptions::new()
            .write(true)
            .open(path)
            .unwrap()
            .set_times(FileTimes::new().set_modified(mtime))
            .unwrap();
    }

    #[tokio::test]
    async fn test_every_occurrence_replaced_and_backed_up() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("greeting.txt");
        file.write_str("你好 world 你好").unwrap();

        let mut client = test_client(scripted_backend(&[("你好", "Hello")]));
        let outcome = rewriter(&temp, true).process(&mut client, file.path()).await;

        assert_eq!(outcome, FileOutcome::Translated { phrases: 1, translated: 1 });
        file.assert("Hello world Hello");
        temp.child("_backup/greeting.txt").assert("你好 world 你好");
    }

    #[tokio::test]
    async fn test_structure_around_phrases_preserved() {
        let temp = TempDir::new().unwrap();
        temp.child("config").create_dir_all().unwrap();
        let file = temp.child("config/quests.snbt");
        file.write_str("{\n\tdesc: [\"打造一把铁剑\", \"铁剑!\"]\n\ttitle: \"铁剑\"\n}\n").unwrap();

        let mut client = test_client(scripted_backend(&[
            ("铁剑", "Iron Sword"),
            ("打造一把铁剑", "Craft an iron sword"),
        ]));
        let outcome = rewriter(&temp, true).process(&mut client, file.path()).await;

        assert_eq!(outcome, FileOutcome::Translated { phrases: 2, translated: 2 });
        file.assert("{\n\tdesc: [\"Craft an iron sword\", \"Iron Sword!\"]\n\ttitle: \"Iron Sword\"\n}\n");
        temp.child("_backup/config/quests.snbt")
            .assert("{\n\tdesc: [\"打造一把铁剑\", \"铁剑!\"]\n\ttitle: \"铁剑\"\n}\n");
    }

    #[tokio::test]
    async fn test_no_phrases_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("recipes.zs");
        file.write_str("recipes.remove(<item:minecraft:stick>);\n").unwrap();
        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        set_mtime(file.path(), old);

        let mut backend = MockTranslationBackend::new();
        backend.expect_fetch().never();
        let mut client = test_client(backend);
        let outcome = rewriter(&temp, false).process(&mut client, file.path()).await;

        assert_eq!(outcome, FileOutcome::NoPhrases);
        file.assert("recipes.remove(<item:minecraft:stick>);\n");
        assert_eq!(std::fs::metadata(file.path()).unwrap().modified().unwrap(), old);
    }

    #[tokio::test]
    async fn test_backup_keeps_modification_time() {
        let temp = TempDir::new().unwrap();
        temp.child("a/b").create_dir_all().unwrap();
        let file = temp.child("a/b/lang.json");
        file.write_str(r#"{"k": "苹果"}"#).unwrap();
        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        set_mtime(file.path(), old);

        let mut client = test_client(scripted_backend(&[("苹果", "Apple")]));
        rewriter(&temp, true).process(&mut client, file.path()).await;

        let backup = temp.child("_backup/a/b/lang.json");
        backup.assert(r#"{"k": "苹果"}"#);
        assert_eq!(std::fs::metadata(backup.path()).unwrap().modified().unwrap(), old);
        file.assert(r#"{"k": "Apple"}"#);
    }

    #[tokio::test]
    async fn test_rerun_backs_up_current_content() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("a.txt");
        file.write_str("苹果").unwrap();

        let rewriter = rewriter(&temp, true);
        let mut client = test_client(scripted_backend(&[("苹果", "Apple"), ("香蕉", "Banana")]));
        rewriter.process(&mut client, file.path()).await;
        temp.child("_backup/a.txt").assert("苹果");

        // Edited between runs: the backup follows the file as it was just before rewriting
        file.write_str("香蕉 v2").unwrap();
        rewriter.process(&mut client, file.path()).await;

        file.assert("Banana v2");
        temp.child("_backup/a.txt").assert("香蕉 v2");
    }

    #[tokio::test]
    async fn test_backups_disabled() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("a.txt");
        file.write_str("苹果").unwrap();

        let mut client = test_client(scripted_backend(&[("苹果", "Apple")]));
        let rewriter = rewriter(&temp, false);
        assert_eq!(rewriter.backup_path(file.path()).unwrap(), None);
        rewriter.process(&mut client, file.path()).await;

        file.assert("Apple");
        assert!(!temp.path().join("_backup").exists());
    }

    #[tokio::test]
    async fn test_invalid_utf8_skipped() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("binary.txt");
        file.write_binary(&[0xff, 0xfe, 0x00, 0x41]).unwrap();

        let mut backend = MockTranslationBackend::new();
        backend.expect_fetch().never();
        let mut client = test_client(backend);
        let outcome = rewriter(&temp, true).process(&mut client, file.path()).await;

        assert!(matches!(outcome, FileOutcome::Skipped(SkipReason::Unreadable(_))));
        assert_eq!(std::fs::read(file.path()).unwrap(), vec![0xff, 0xfe, 0x00, 0x41]);
        assert!(!temp.path().join("_backup").exists());
    }

    #[tokio::test]
    async fn test_failed_phrase_stays_original() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("a.txt");
        file.write_str("甲 and 乙").unwrap();

        // 甲 is unknown to the backend and fails every attempt
        let mut client = test_client(scripted_backend(&[("乙", "B")]));
        let outcome = rewriter(&temp, false).process(&mut client, file.path()).await;

        assert_eq!(outcome, FileOutcome::Translated { phrases: 2, translated: 1 });
        file.assert("甲 and B");
        assert_eq!(client.stats().failed, 1);
        assert_eq!(client.stats().requests, 4);
    }

    #[tokio::test]
    async fn test_quota_stops_mid_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.child("a.txt");
        file.write_str("甲 乙 丙 甲").unwrap();

        let mut client = test_client(scripted_backend(&[
            ("甲", "A"),
            ("乙", MYMEMORY_QUOTA_MARKER),
            ("丙", "C"),
        ]));
        let outcome = rewriter(&temp, true).process(&mut client, file.path()).await;

        assert_eq!(outcome, FileOutcome::Interrupted { applied: 1, total: 3 });
        file.assert("A 乙 丙 A");
        temp.child("_backup/a.txt").assert("甲 乙 丙 甲");
        assert!(client.is_service_dead());
    }

    #[tokio::test]
    async fn test_substitution_runs_over_evolving_text() {
        let mut client = test_client(scripted_backend(&[("苹果", "香蕉"), ("香蕉", "Banana")]));
        let phrases = vec!["苹果".to_string(), "香蕉".to_string()];

        let substitution = substitute_phrases(&mut client, "苹果 香蕉", &phrases).await;

        // The first replacement introduced text the second phrase then matched
        assert_eq!(substitution.text, "Banana Banana");
        assert_eq!(substitution.applied, 2);
        assert!(!substitution.interrupted);
    }

    #[tokio::test]
    async fn test_quota_on_first_phrase_applies_nothing() {
        let mut client = test_client(scripted_backend(&[("甲", MYMEMORY_QUOTA_MARKER), ("乙", "B")]));
        let phrases = vec!["甲".to_string(), "乙".to_string()];

        let substitution = substitute_phrases(&mut client, "甲 乙", &phrases).await;

        assert_eq!(substitution.text, "甲 乙");
        assert_eq!(substitution.applied, 0);
        assert_eq!(substitution.translated, 0);
        assert!(substitution.interrupted);
    }

    #[tokio::test]
    async fn test_shorter_phrase_first_consumes_longer_one() {
        let mut client = test_client(scripted_backend(&[
            ("铁剑", "Iron Sword"),
            ("打造一把铁剑", "Craft an iron sword"),
        ]));
        let phrases = vec!["铁剑".to_string(), "打造一把铁剑".to_string()];

        let substitution = substitute_phrases(&mut client, "铁剑 打造一把铁剑", &phrases).await;

        assert_eq!(substitution.text, "Iron Sword 打造一把Iron Sword");
    }

    #[test]
    fn test_backup_path_mirrors_relative_layout() {
        let temp = TempDir::new().unwrap();
        let rewriter = rewriter(&temp, true);

        let path = temp.path().join("kubejs/server_scripts/main.js");
        assert_eq!(
            rewriter.backup_path(&path).unwrap(),
            Some(temp.path().join("_backup/kubejs/server_scripts/main.js"))
        );
        assert!(rewriter.backup_path(Path::new("/elsewhere/file.txt")).is_err());
    }
}
