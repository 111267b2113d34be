//! The three publishing flows and their JSON outcomes.
//!
//! Each flow either succeeds with a flow-specific outcome or collapses into
//! `{"success": false, "error": "..."}`. Callers never see a `GitHubError`
//! through [`Publisher::run`].

use std::sync::Arc;
use std::time::Duration;

use orrery_config::GitHubConfig;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::{GITHUB_WEB, GitHubApi, NewPullRequest, RestClient};
use crate::error::GitHubError;
use crate::uploader::{BatchSchedule, UploadResult, collect_project_files, upload_in_batches};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Publish,
    PullRequest,
    Upload,
}

impl Flow {
    pub const ALL: [Flow; 3] = [Flow::Publish, Flow::PullRequest, Flow::Upload];

    /// POST route that triggers this flow on the publish server.
    pub fn route(self) -> &'static str {
        match self {
            Flow::Publish => "/api/publish-to-github",
            Flow::PullRequest => "/api/create-pull-request",
            Flow::Upload => "/api/upload-files",
        }
    }

    pub fn from_route(route: &str) -> Option<Flow> {
        Flow::ALL.into_iter().find(|flow| flow.route() == route)
    }

    pub fn label(self) -> &'static str {
        match self {
            Flow::Publish => "publish",
            Flow::PullRequest => "pull request",
            Flow::Upload => "upload",
        }
    }

    fn activity(self) -> &'static str {
        match self {
            Flow::Publish => "publishing to GitHub",
            Flow::PullRequest => "creating pull request",
            Flow::Upload => "uploading project files",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub success: bool,
    pub repository_url: String,
    pub clone_url: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestOutcome {
    pub success: bool,
    pub pull_request_url: String,
    pub pull_request_number: u64,
    pub branch_name: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success: bool,
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<UploadResult>,
    pub repository_url: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
}

impl Failure {
    /// A failure always carries a non-empty message.
    pub fn new(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            error: if error.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                error
            },
        }
    }
}

/// What a flow returns over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlowOutcome {
    Published(PublishOutcome),
    PullRequest(PullRequestOutcome),
    Uploaded(UploadOutcome),
    Failed(Failure),
}

impl FlowOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, FlowOutcome::Failed(_))
    }

    /// One-line description for the HUD and logs.
    pub fn summary(&self) -> String {
        match self {
            FlowOutcome::Published(p) => format!("Published {}", p.repository_url),
            FlowOutcome::PullRequest(p) => {
                format!("Opened PR #{} from {}", p.pull_request_number, p.branch_name)
            }
            FlowOutcome::Uploaded(u) => format!(
                "Uploaded {}/{} files ({} failed)",
                u.successful, u.total_files, u.failed
            ),
            FlowOutcome::Failed(f) => format!("Failed: {}", f.error),
        }
    }
}

pub struct Publisher {
    api: Arc<dyn GitHubApi>,
    config: GitHubConfig,
    sleep: fn(Duration),
}

impl Publisher {
    pub fn new(api: Arc<dyn GitHubApi>, config: GitHubConfig) -> Self {
        Self {
            api,
            config,
            sleep: std::thread::sleep,
        }
    }

    /// Publisher backed by the REST client and the configured token source.
    pub fn from_config(config: &GitHubConfig) -> Self {
        Self::new(Arc::new(RestClient::from_config(config)), config.clone())
    }

    /// Replace the pause taken between upload batches.
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn publish_to_github(&self) -> Result<PublishOutcome, GitHubError> {
        let user = self.api.authenticated_user()?;
        info!("Publishing to GitHub for user: {}", user.login);

        let repo = self.api.create_repository(
            &self.config.repository,
            &self.config.description,
            self.config.private,
        )?;
        info!("Repository created successfully: {}", repo.html_url);

        Ok(PublishOutcome {
            success: true,
            repository_url: repo.html_url,
            clone_url: repo.clone_url,
            user: user.login,
        })
    }

    pub fn create_feature_pull_request(&self) -> Result<PullRequestOutcome, GitHubError> {
        let user = self.api.authenticated_user()?;
        let owner = user.login;
        let repo = &self.config.repository;
        let branch = &self.config.feature_branch;
        info!("Creating pull request for repository: {owner}/{repo}");

        self.api
            .create_branch(&owner, repo, branch, &self.config.base_branch)?;
        let pull = self.api.create_pull_request(
            &owner,
            repo,
            &NewPullRequest {
                title: &self.config.pull_request_title,
                body: &self.config.pull_request_body,
                head: branch,
                base: &self.config.base_branch,
            },
        )?;
        info!("Pull request created successfully: {}", pull.html_url);

        Ok(PullRequestOutcome {
            success: true,
            pull_request_url: pull.html_url,
            pull_request_number: pull.number,
            branch_name: branch.clone(),
            user: owner,
        })
    }

    /// Upload every project file. Per-file failures are reported in
    /// `results` and do not fail the flow.
    pub fn upload_all_project_files(&self) -> Result<UploadOutcome, GitHubError> {
        let user = self.api.authenticated_user()?;
        let owner = user.login;
        let repo = &self.config.repository;
        info!("Uploading files to repository: {owner}/{repo}");

        let files = collect_project_files(&self.config);
        let results = upload_in_batches(
            self.api.as_ref(),
            &owner,
            repo,
            &files,
            &BatchSchedule::from_config(&self.config),
            self.sleep,
        );
        let successful = results.iter().filter(|r| r.success).count();

        Ok(UploadOutcome {
            success: true,
            total_files: files.len(),
            successful,
            failed: results.len() - successful,
            results,
            repository_url: format!("{GITHUB_WEB}/{owner}/{repo}"),
            user: owner,
        })
    }

    /// Run `flow`, folding any error into a [`Failure`].
    pub fn run(&self, flow: Flow) -> FlowOutcome {
        let outcome = match flow {
            Flow::Publish => self.publish_to_github().map(FlowOutcome::Published),
            Flow::PullRequest => self
                .create_feature_pull_request()
                .map(FlowOutcome::PullRequest),
            Flow::Upload => self.upload_all_project_files().map(FlowOutcome::Uploaded),
        };
        outcome.unwrap_or_else(|err| {
            error!("Error {}: {err}", flow.activity());
            FlowOutcome::Failed(Failure::new(err.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGitHub;
    use std::fs;

    fn no_sleep(_: Duration) {}

    fn publisher(api: FakeGitHub, config: GitHubConfig) -> (Arc<FakeGitHub>, Publisher) {
        let api = Arc::new(api);
        let publisher = Publisher::new(api.clone(), config).with_sleep(no_sleep);
        (api, publisher)
    }

    #[test]
    fn test_flow_routes() {
        for flow in Flow::ALL {
            assert_eq!(Flow::from_route(flow.route()), Some(flow));
        }
        assert_eq!(Flow::from_route("/api/unknown"), None);
    }

    #[test]
    fn test_publish_outcome() {
        let (_, publisher) = publisher(FakeGitHub::default(), GitHubConfig::default());
        let outcome = publisher.run(Flow::Publish);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "repositoryUrl": "https://github.com/octocat/solar-system-visualization",
                "cloneUrl": "https://github.com/octocat/solar-system-visualization.git",
                "user": "octocat",
            })
        );
    }

    #[test]
    fn test_publish_existing_repository_fails_as_data() {
        let api = FakeGitHub {
            repo_exists: true,
            ..Default::default()
        };
        let (_, publisher) = publisher(api, GitHubConfig::default());
        let outcome = publisher.run(Flow::Publish);
        assert!(!outcome.is_success());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(
            json["error"],
            "Repository 'solar-system-visualization' already exists"
        );
    }

    #[test]
    fn test_pull_request_flow() {
        let (api, publisher) = publisher(FakeGitHub::default(), GitHubConfig::default());
        let outcome = publisher.create_feature_pull_request().unwrap();
        assert_eq!(outcome.branch_name, "feature/enhanced-controls");
        assert_eq!(outcome.pull_request_number, 1);
        assert_eq!(
            api.calls(),
            vec![
                "user".to_string(),
                "create_branch octocat/solar-system-visualization feature/enhanced-controls from main".to_string(),
                "create_pull_request octocat/solar-system-visualization feature/enhanced-controls -> main".to_string(),
            ]
        );
        let json = serde_json::to_value(FlowOutcome::PullRequest(outcome)).unwrap();
        assert!(json.get("pullRequestUrl").is_some());
        assert!(json.get("branchName").is_some());
    }

    #[test]
    fn test_not_connected_error_is_never_empty() {
        let api = FakeGitHub {
            connected: false,
            ..Default::default()
        };
        let (_, publisher) = publisher(api, GitHubConfig::default());
        for flow in Flow::ALL {
            match publisher.run(flow) {
                FlowOutcome::Failed(failure) => {
                    assert!(!failure.success);
                    assert_eq!(failure.error, "GitHub not connected");
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_failure_message_fallback() {
        assert_eq!(Failure::new("").error, "Unknown error");
        assert_eq!(Failure::new("  ").error, "Unknown error");
        assert_eq!(Failure::new("boom").error, "boom");
    }

    #[test]
    fn test_upload_flow_counts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("crates/a/src")).unwrap();
        for i in 0..12 {
            fs::write(root.join(format!("crates/a/src/m{i:02}.rs")), "").unwrap();
        }
        fs::write(root.join("Cargo.toml"), "[workspace]").unwrap();

        let config = GitHubConfig {
            project_root: root.to_path_buf(),
            ..Default::default()
        };
        let api = FakeGitHub {
            failing_paths: vec!["crates/a/src/m05.rs".into()],
            ..Default::default()
        };
        let (_, publisher) = publisher(api, config);
        let outcome = publisher.upload_all_project_files().unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.total_files, 13);
        assert_eq!(outcome.successful, 12);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.results.len(), 13);
        assert_eq!(outcome.results[12].path, "Cargo.toml");
        assert_eq!(
            outcome.repository_url,
            "https://github.com/octocat/solar-system-visualization"
        );
    }

    #[test]
    fn test_outcome_round_trips_through_untagged_json() {
        let failure = FlowOutcome::Failed(Failure::new("nope"));
        let text = serde_json::to_string(&failure).unwrap();
        assert_eq!(serde_json::from_str::<FlowOutcome>(&text).unwrap(), failure);

        let upload = FlowOutcome::Uploaded(UploadOutcome {
            success: true,
            total_files: 1,
            successful: 1,
            failed: 0,
            results: vec![UploadResult::uploaded("a.rs", "s")],
            repository_url: "https://github.com/o/r".into(),
            user: "o".into(),
        });
        let text = serde_json::to_string(&upload).unwrap();
        assert_eq!(serde_json::from_str::<FlowOutcome>(&text).unwrap(), upload);
        assert_eq!(upload.summary(), "Uploaded 1/1 files (0 failed)");
    }
}
