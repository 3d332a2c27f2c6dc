//! Remote directory client for the GitHub REST API.
//!
//! Two read-only calls are used:
//! - latest commit touching a path on a branch
//! - recursive file tree of a branch

mod client;
mod models;

pub use client::{
    FetchResult, GitHubClient, RepoClient, ACCEPT_V3, REQUEST_TIMEOUT, USER_AGENT,
};
pub use models::{CommitDetail, CommitInfo, Signature};
