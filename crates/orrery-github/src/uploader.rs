//! Project file collection and batched upload.

use std::path::Path;
use std::time::Duration;

use orrery_config::GitHubConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::client::GitHubApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Repository path, `/`-separated.
    pub path: String,
    pub content: Vec<u8>,
}

/// Outcome of uploading one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub path: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn uploaded(path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: true,
            sha: Some(sha.into()),
            error: None,
        }
    }

    pub fn failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            success: false,
            sha: None,
            error: Some(error.into()),
        }
    }
}

/// True when any exclusion pattern occurs anywhere in `relative_path`.
pub fn is_excluded(relative_path: &str, exclude: &[String]) -> bool {
    exclude
        .iter()
        .any(|pattern| !pattern.is_empty() && relative_path.contains(pattern.as_str()))
}

/// Every readable file under `base_dir`, named `prefix/<relative path>`.
/// Excluded directories are not descended into.
pub fn collect_files(base_dir: &Path, prefix: &str, exclude: &[String]) -> Vec<ProjectFile> {
    let walker = WalkDir::new(base_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(&repository_path(base_dir, prefix, entry.path()), exclude));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Could not read directory {}: {err}", base_dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = repository_path(base_dir, prefix, entry.path());
        match std::fs::read(entry.path()) {
            Ok(content) => files.push(ProjectFile { path, content }),
            Err(err) => warn!("Could not read file {path}: {err}"),
        }
    }
    files
}

fn repository_path(base_dir: &Path, prefix: &str, path: &Path) -> String {
    let relative = path.strip_prefix(base_dir).unwrap_or(path);
    let prefix = prefix.trim_matches('/');
    let mut parts: Vec<String> = Vec::new();
    if !prefix.is_empty() {
        parts.push(prefix.to_string());
    }
    parts.extend(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// The configured source directories followed by the root files that exist.
pub fn collect_project_files(config: &GitHubConfig) -> Vec<ProjectFile> {
    let root = &config.project_root;
    let mut files = Vec::new();
    for dir in &config.source_dirs {
        files.extend(collect_files(&root.join(dir), dir, &config.exclude));
    }
    for name in &config.root_files {
        match std::fs::read(root.join(name)) {
            Ok(content) => files.push(ProjectFile {
                path: name.clone(),
                content,
            }),
            Err(_) => warn!("Could not read root file: {name}"),
        }
    }
    info!("Found {} files to upload", files.len());
    files
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSchedule {
    pub batch_size: usize,
    pub delay: Duration,
}

impl Default for BatchSchedule {
    fn default() -> Self {
        Self {
            batch_size: 10,
            delay: Duration::from_secs(1),
        }
    }
}

impl BatchSchedule {
    pub fn from_config(config: &GitHubConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            delay: Duration::from_millis(config.batch_delay_ms),
        }
    }

    pub fn batch_count(&self, files: usize) -> usize {
        files.div_ceil(self.batch_size.max(1))
    }
}

/// Upload `files` in order, one batch at a time, calling `sleep` between
/// batches but not after the last one. Failures are recorded per file and
/// never stop the run.
pub fn upload_in_batches(
    api: &dyn GitHubApi,
    owner: &str,
    repo: &str,
    files: &[ProjectFile],
    schedule: &BatchSchedule,
    mut sleep: impl FnMut(Duration),
) -> Vec<UploadResult> {
    let total_batches = schedule.batch_count(files.len());
    let mut results = Vec::with_capacity(files.len());

    for (index, batch) in files.chunks(schedule.batch_size.max(1)).enumerate() {
        info!("Uploading batch {}/{}", index + 1, total_batches);
        for file in batch {
            let result = match api.put_file(owner, repo, &file.path, &file.content, None) {
                Ok(sha) => UploadResult::uploaded(&file.path, sha),
                Err(err) => {
                    warn!("{err}");
                    UploadResult::failed(&file.path, err.to_string())
                }
            };
            results.push(result);
        }
        if index + 1 < total_batches {
            sleep(schedule.delay);
        }
    }

    let successful = results.iter().filter(|r| r.success).count();
    info!(
        "Upload complete: {} successful, {} failed",
        successful,
        results.len() - successful
    );
    results
}
