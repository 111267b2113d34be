//! In-memory [`GitHubApi`] for flow tests.

use std::sync::Mutex;

use crate::client::{GitHubApi, GitHubUser, GitObject, GitRef, NewPullRequest, PullRequest, Repository};
use crate::error::GitHubError;

pub struct FakeGitHub {
    pub login: String,
    pub connected: bool,
    pub repo_exists: bool,
    pub failing_paths: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self {
            login: "octocat".into(),
            connected: true,
            repo_exists: false,
            failing_paths: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGitHub {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), GitHubError> {
        self.calls.lock().unwrap().push(call);
        if self.connected {
            Ok(())
        } else {
            Err(GitHubError::NotConnected)
        }
    }
}

impl GitHubApi for FakeGitHub {
    fn authenticated_user(&self) -> Result<GitHubUser, GitHubError> {
        self.record("user".into())?;
        Ok(GitHubUser {
            login: self.login.clone(),
            name: None,
        })
    }

    fn create_repository(
        &self,
        name: &str,
        _description: &str,
        _private: bool,
    ) -> Result<Repository, GitHubError> {
        self.record(format!("create_repository {name}"))?;
        if self.repo_exists {
            return Err(GitHubError::RepositoryExists(name.into()));
        }
        Ok(Repository {
            name: name.into(),
            full_name: format!("{}/{name}", self.login),
            html_url: format!("https://github.com/{}/{name}", self.login),
            clone_url: format!("https://github.com/{}/{name}.git", self.login),
        })
    }

    fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from: &str,
    ) -> Result<GitRef, GitHubError> {
        self.record(format!("create_branch {owner}/{repo} {branch} from {from}"))?;
        Ok(GitRef {
            name: format!("refs/heads/{branch}"),
            object: GitObject { sha: "base".into() },
        })
    }

    fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest<'_>,
    ) -> Result<PullRequest, GitHubError> {
        self.record(format!(
            "create_pull_request {owner}/{repo} {} -> {}",
            pull.head, pull.base
        ))?;
        Ok(PullRequest {
            number: 1,
            html_url: format!("https://github.com/{owner}/{repo}/pull/1"),
        })
    }

    fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
        _branch: Option<&str>,
    ) -> Result<String, GitHubError> {
        self.record(format!("put_file {owner}/{repo} {path}"))?;
        if self.failing_paths.iter().any(|p| p == path) {
            return Err(GitHubError::UploadFile {
                path: path.into(),
                message: "rejected".into(),
            });
        }
        Ok(format!("sha-{}", content.len()))
    }
}
