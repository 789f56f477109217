//! Filesystem connector: walks a directory and yields matching text files.
//!
//! Filenames are paths relative to the configured root, so the same tree
//! synced from two machines produces the same document keys. `.git`,
//! `target`, and `node_modules` are always excluded.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::FilesystemConnectorConfig;
use crate::models::SourceItem;
use crate::traits::Connector;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

pub struct FilesystemConnector {
    name: String,
    config: FilesystemConnectorConfig,
}

impl FilesystemConnector {
    pub fn new(name: impl Into<String>, config: FilesystemConnectorConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

#[async_trait]
impl Connector for FilesystemConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Text and markdown files from a local directory"
    }

    fn connector_type(&self) -> &str {
        "filesystem"
    }

    async fn scan(&self) -> Result<Vec<SourceItem>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || scan_filesystem(&config))
            .await
            .context("filesystem scan task panicked")?
    }
}

/// Walk `config.root` and read every included, non-excluded file.
///
/// A missing root is an error. Individual files that cannot be read as
/// UTF-8 text are logged and skipped.
pub fn scan_filesystem(config: &FilesystemConnectorConfig) -> Result<Vec<SourceItem>> {
    let root = &config.root;
    if !root.exists() {
        bail!(
            "Filesystem connector root does not exist: {}",
            root.display()
        );
    }

    let include_set = build_globset(&config.include_globs)?;
    let excludes: Vec<String> = DEFAULT_EXCLUDES
        .iter()
        .map(|s| s.to_string())
        .chain(config.exclude_globs.iter().cloned())
        .collect();
    let exclude_set = build_globset(&excludes)?;

    let mut items = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        match read_item(path, &rel_str) {
            Ok(item) => items.push(item),
            Err(err) => tracing::warn!(file = %rel_str, error = %err, "skipping unreadable file"),
        }
    }

    items.sort_by(|a, b| a.filename.cmp(&b.filename));
    tracing::debug!(root = %root.display(), files = items.len(), "filesystem scan complete");
    Ok(items)
}

fn read_item(path: &Path, relative_path: &str) -> Result<SourceItem> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(SourceItem {
        filename: relative_path.to_string(),
        text,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_for(root: &Path) -> FilesystemConnectorConfig {
        FilesystemConnectorConfig {
            root: root.to_path_buf(),
            include_globs: vec!["**/*.md".into(), "**/*.txt".into()],
            exclude_globs: vec!["**/drafts/**".into()],
            follow_symlinks: false,
        }
    }

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("parks")).unwrap();
        fs::create_dir_all(dir.path().join("drafts")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("parks/etosha.md"), "Etosha guide").unwrap();
        fs::write(dir.path().join("coast.txt"), "Coast guide").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(dir.path().join("drafts/wip.md"), "draft").unwrap();
        fs::write(dir.path().join(".git/notes.txt"), "git").unwrap();

        let items = scan_filesystem(&config_for(dir.path())).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["coast.txt", "parks/etosha.md"]);
        assert_eq!(items[1].text, "Etosha guide");
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("nope"));
        assert!(scan_filesystem(&config).is_err());
    }

    #[test]
    fn test_non_utf8_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.txt"), [0xffu8, 0xfe, 0xfd]).unwrap();
        fs::write(dir.path().join("good.txt"), "fine").unwrap();
        let items = scan_filesystem(&config_for(dir.path())).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].filename, "good.txt");
    }

    #[tokio::test]
    async fn test_connector_scan_async() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let connector = FilesystemConnector::new("docs", config_for(dir.path()));
        let items = connector.scan().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(connector.label(), "filesystem:docs");
    }
}
