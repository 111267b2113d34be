//! Blocking GitHub REST client.

use std::sync::Arc;

use base64::Engine as _;
use orrery_config::GitHubConfig;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::GitHubError;
use crate::token::{TokenSource, token_source};

/// Web origin used to build repository links.
pub const GITHUB_WEB: &str = "https://github.com";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub clone_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: GitObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitObject {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

#[derive(Debug, Clone, Copy)]
pub struct NewPullRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub head: &'a str,
    pub base: &'a str,
}

/// The GitHub operations the publishing flows need.
pub trait GitHubApi: Send + Sync {
    fn authenticated_user(&self) -> Result<GitHubUser, GitHubError>;

    fn create_repository(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<Repository, GitHubError>;

    /// Create `branch` pointing at the current head of `from`.
    fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from: &str,
    ) -> Result<GitRef, GitHubError>;

    fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest<'_>,
    ) -> Result<PullRequest, GitHubError>;

    /// Create or update one file; returns the new blob sha.
    fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
        branch: Option<&str>,
    ) -> Result<String, GitHubError>;
}

/// Commit message used for every uploaded file.
pub fn commit_message(path: &str) -> String {
    format!("Add {path}")
}

pub struct RestClient {
    api_base: String,
    user_agent: String,
    tokens: Arc<dyn TokenSource>,
    agent: ureq::Agent,
}

impl RestClient {
    pub fn new(
        api_base: impl Into<String>,
        user_agent: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
            tokens,
            agent: ureq::Agent::new(),
        }
    }

    pub fn from_config(config: &GitHubConfig) -> Self {
        Self::new(&config.api_base, &config.user_agent, token_source(config))
    }

    /// Every request carries a token fetched just now.
    fn request(&self, method: &str, path: &str) -> Result<ureq::Request, GitHubError> {
        let token = self.tokens.access_token()?;
        debug!("{method} {path}");
        Ok(self
            .agent
            .request(method, &format!("{}{}", self.api_base, path))
            .set("Authorization", &format!("Bearer {token}"))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28")
            .set("User-Agent", &self.user_agent))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        decode(self.request("GET", path)?.call())
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        body: Value,
    ) -> Result<T, GitHubError> {
        decode(self.request(method, path)?.send_json(body))
    }

    fn existing_sha(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        branch: Option<&str>,
    ) -> Result<Option<String>, GitHubError> {
        let mut url = format!("/repos/{owner}/{repo}/contents/{}", encode_path(path));
        if let Some(branch) = branch {
            url.push_str(&format!("?ref={}", encode_path(branch)));
        }
        match self.get::<Value>(&url) {
            Ok(existing) => Ok(existing
                .get("sha")
                .and_then(Value::as_str)
                .map(str::to_string)),
            Err(err) if err.status() == Some(404) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn branch_from(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from: &str,
    ) -> Result<GitRef, GitHubError> {
        let head: GitRef = self.get(&format!("/repos/{owner}/{repo}/git/ref/heads/{from}"))?;
        self.send(
            "POST",
            &format!("/repos/{owner}/{repo}/git/refs"),
            json!({
                "ref": format!("refs/heads/{branch}"),
                "sha": head.object.sha,
            }),
        )
    }

    fn write_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
        branch: Option<&str>,
    ) -> Result<String, GitHubError> {
        let mut body = json!({
            "message": commit_message(path),
            "content": base64::engine::general_purpose::STANDARD.encode(content),
        });
        if let Some(sha) = self.existing_sha(owner, repo, path, branch)? {
            body["sha"] = Value::String(sha);
        }
        if let Some(branch) = branch {
            body["branch"] = Value::String(branch.to_string());
        }
        let written: Value = self.send(
            "PUT",
            &format!("/repos/{owner}/{repo}/contents/{}", encode_path(path)),
            body,
        )?;
        written
            .pointer("/content/sha")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| GitHubError::InvalidResponse("missing content.sha".into()))
    }
}

impl GitHubApi for RestClient {
    fn authenticated_user(&self) -> Result<GitHubUser, GitHubError> {
        self.get("/user")
    }

    fn create_repository(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<Repository, GitHubError> {
        let body = json!({
            "name": name,
            "description": description,
            "private": private,
            "auto_init": false,
        });
        match self.send("POST", "/user/repos", body) {
            Err(err) if err.status() == Some(422) => {
                Err(GitHubError::RepositoryExists(name.to_string()))
            }
            other => other,
        }
    }

    fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        from: &str,
    ) -> Result<GitRef, GitHubError> {
        let created = self
            .branch_from(owner, repo, branch, from)
            .map_err(|e| GitHubError::CreateBranch(e.detail()))?;
        info!("Created branch {branch} at {}", created.object.sha);
        Ok(created)
    }

    fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest<'_>,
    ) -> Result<PullRequest, GitHubError> {
        self.send(
            "POST",
            &format!("/repos/{owner}/{repo}/pulls"),
            json!({
                "title": pull.title,
                "body": pull.body,
                "head": pull.head,
                "base": pull.base,
            }),
        )
        .map_err(|e| GitHubError::CreatePullRequest(e.detail()))
    }

    fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
        branch: Option<&str>,
    ) -> Result<String, GitHubError> {
        self.write_file(owner, repo, path, content, branch)
            .map_err(|e| GitHubError::UploadFile {
                path: path.to_string(),
                message: e.detail(),
            })
    }
}

/// Turn a ureq result into a decoded body or a [`GitHubError`], pulling the
/// API's `message` field out of error responses.
pub(crate) fn decode<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, GitHubError> {
    match result {
        Ok(response) => response
            .into_json::<T>()
            .map_err(|e| GitHubError::InvalidResponse(e.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let message = response
                .into_json::<Value>()
                .ok()
                .and_then(|body| body.get("message")?.as_str().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(GitHubError::Api { status, message })
        }
        Err(ureq::Error::Transport(transport)) => {
            Err(GitHubError::Transport(transport.to_string()))
        }
    }
}

/// Percent-encode a repository path, keeping `/` separators.
fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockServer;
    use crate::token::StaticToken;

    fn client(server: &MockServer) -> RestClient {
        RestClient::new(&server.url, "orrery-test", Arc::new(StaticToken::new("t0ken")))
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("crates/a b/lib.rs"), "crates/a%20b/lib.rs");
        assert_eq!(encode_path("feature/x"), "feature/x");
    }

    #[test]
    fn test_authenticated_user_sends_headers() {
        let server = MockServer::start(|_| (200, r#"{"login":"octocat","name":"Mona"}"#.into()));
        let user = client(&server).authenticated_user().unwrap();
        assert_eq!(user.login, "octocat");

        let requests = server.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].url, "/user");
        assert_eq!(requests[0].header("Authorization"), Some("Bearer t0ken"));
        assert_eq!(requests[0].header("User-Agent"), Some("orrery-test"));
    }

    #[test]
    fn test_no_token_means_no_request() {
        let server = MockServer::start(|_| (200, "{}".into()));
        let client = RestClient::new(&server.url, "orrery-test", Arc::new(StaticToken::default()));
        let err = client.authenticated_user().unwrap_err();
        assert_eq!(err.to_string(), "GitHub not connected");
        assert!(server.requests().is_empty());
    }

    #[test]
    fn test_create_repository() {
        let server = MockServer::start(|_| {
            (
                201,
                serde_json::json!({
                    "name": "orrery",
                    "full_name": "octocat/orrery",
                    "html_url": "https://github.com/octocat/orrery",
                    "clone_url": "https://github.com/octocat/orrery.git",
                })
                .to_string(),
            )
        });
        let repo = client(&server)
            .create_repository("orrery", "Solar system", false)
            .unwrap();
        assert_eq!(repo.clone_url, "https://github.com/octocat/orrery.git");

        let body = server.requests()[0].json();
        assert_eq!(body["name"], "orrery");
        assert_eq!(body["private"], false);
        assert_eq!(body["auto_init"], false);
    }

    #[test]
    fn test_create_repository_conflict() {
        let server = MockServer::start(|_| {
            (422, r#"{"message":"Repository creation failed."}"#.into())
        });
        let err = client(&server)
            .create_repository("orrery", "", false)
            .unwrap_err();
        assert_eq!(err.to_string(), "Repository 'orrery' already exists");
    }

    #[test]
    fn test_create_branch_from_head() {
        let server = MockServer::start(|req| match req.method.as_str() {
            "GET" => (
                200,
                r#"{"ref":"refs/heads/main","object":{"sha":"abc123"}}"#.into(),
            ),
            _ => (
                201,
                r#"{"ref":"refs/heads/feature/x","object":{"sha":"abc123"}}"#.into(),
            ),
        });
        let created = client(&server)
            .create_branch("octocat", "orrery", "feature/x", "main")
            .unwrap();
        assert_eq!(created.name, "refs/heads/feature/x");

        let requests = server.requests();
        assert_eq!(requests[0].url, "/repos/octocat/orrery/git/ref/heads/main");
        assert_eq!(requests[1].url, "/repos/octocat/orrery/git/refs");
        let body = requests[1].json();
        assert_eq!(body["ref"], "refs/heads/feature/x");
        assert_eq!(body["sha"], "abc123");
    }

    #[test]
    fn test_create_branch_error_wrapped() {
        let server = MockServer::start(|_| (422, r#"{"message":"Reference already exists"}"#.into()));
        let err = client(&server)
            .create_branch("octocat", "orrery", "feature/x", "main")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to create branch: Reference already exists"
        );
    }

    #[test]
    fn test_create_pull_request() {
        let server = MockServer::start(|_| {
            (201, r#"{"number":7,"html_url":"https://github.com/o/r/pull/7"}"#.into())
        });
        let pull = NewPullRequest {
            title: "Controls",
            body: "Body",
            head: "feature/x",
            base: "main",
        };
        let pr = client(&server).create_pull_request("o", "r", &pull).unwrap();
        assert_eq!(pr.number, 7);
        let body = server.requests()[0].json();
        assert_eq!(body["head"], "feature/x");
        assert_eq!(body["base"], "main");
    }

    #[test]
    fn test_create_pull_request_error_wrapped() {
        let server = MockServer::start(|_| (422, r#"{"message":"No commits between main and feature/x"}"#.into()));
        let pull = NewPullRequest {
            title: "t",
            body: "b",
            head: "feature/x",
            base: "main",
        };
        let err = client(&server).create_pull_request("o", "r", &pull).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to create pull request: No commits between main and feature/x"
        );
    }

    #[test]
    fn test_put_file_creates_new() {
        let server = MockServer::start(|req| match req.method.as_str() {
            "GET" => (404, r#"{"message":"Not Found"}"#.into()),
            _ => (201, r#"{"content":{"sha":"new-sha"}}"#.into()),
        });
        let sha = client(&server)
            .put_file("o", "r", "src/main.rs", b"fn main() {}", None)
            .unwrap();
        assert_eq!(sha, "new-sha");

        let requests = server.requests();
        assert_eq!(requests[1].method, "PUT");
        assert_eq!(requests[1].url, "/repos/o/r/contents/src/main.rs");
        let body = requests[1].json();
        assert_eq!(body["message"], "Add src/main.rs");
        assert_eq!(body["content"], "Zm4gbWFpbigpIHt9");
        assert!(body.get("sha").is_none());
    }

    #[test]
    fn test_put_file_updates_existing() {
        let server = MockServer::start(|req| match req.method.as_str() {
            "GET" => (200, r#"{"sha":"old-sha"}"#.into()),
            _ => (200, r#"{"content":{"sha":"next-sha"}}"#.into()),
        });
        client(&server)
            .put_file("o", "r", "README.md", b"# Orrery", Some("main"))
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].url, "/repos/o/r/contents/README.md?ref=main");
        let body = requests[1].json();
        assert_eq!(body["sha"], "old-sha");
        assert_eq!(body["branch"], "main");
    }

    #[test]
    fn test_put_file_error_wrapped() {
        let server = MockServer::start(|req| match req.method.as_str() {
            "GET" => (404, "{}".into()),
            _ => (409, r#"{"message":"conflict"}"#.into()),
        });
        let err = client(&server)
            .put_file("o", "r", "Cargo.toml", b"[workspace]", None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload file Cargo.toml: conflict");
    }

    #[test]
    fn test_status_without_message() {
        let server = MockServer::start(|_| (500, "oops".into()));
        let err = client(&server).authenticated_user().unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.detail(), "HTTP 500");
    }
}
