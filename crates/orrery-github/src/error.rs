//! Error type shared by the token sources, the REST client and the flows.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("identity token not found")]
    MissingIdentity,
    #[error("GitHub not connected")]
    NotConnected,
    #[error("Repository '{0}' already exists")]
    RepositoryExists(String),
    #[error("Failed to create branch: {0}")]
    CreateBranch(String),
    #[error("Failed to create pull request: {0}")]
    CreatePullRequest(String),
    #[error("Failed to upload file {path}: {message}")]
    UploadFile { path: String, message: String },
    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("HTTP transport failed: {0}")]
    Transport(String),
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl GitHubError {
    /// HTTP status of a failed API call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The bare message, without the wrapping added by `Display`.
    pub(crate) fn detail(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
