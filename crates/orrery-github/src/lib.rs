//! Publishing the project to GitHub.
//!
//! A blocking REST client ([`RestClient`]) behind the [`GitHubApi`] trait,
//! token sources for personal and connector-managed tokens, project file
//! collection with batched upload, and the [`Publisher`] flows the publish
//! server exposes.

pub mod client;
pub mod error;
pub mod publish;
pub mod token;
pub mod uploader;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod testing;

pub use client::{GITHUB_WEB, GitHubApi, GitHubUser, GitRef, NewPullRequest, PullRequest, Repository, RestClient};
pub use error::GitHubError;
pub use publish::{Failure, Flow, FlowOutcome, PublishOutcome, Publisher, PullRequestOutcome, UploadOutcome};
pub use token::{ConnectorTokenSource, StaticToken, TokenSource, token_source};
pub use uploader::{BatchSchedule, ProjectFile, UploadResult, collect_files, collect_project_files, is_excluded, upload_in_batches};
