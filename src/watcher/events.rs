//! Watch keys and detected update events.

use std::fmt;

use serde::Serialize;

use crate::github::CommitInfo;

/// Identity of one watched `(repo, branch, path)` triple.
///
/// Formatted as `repo:branch:path`; used for in-run de-duplication and as
/// the persistence key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchKey {
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl WatchKey {
    #[must_use]
    pub fn new(repo: impl Into<String>, branch: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for WatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.repo, self.branch, self.path)
    }
}

/// A detected change of the latest commit touching a watched path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateEvent {
    pub name: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub old_sha: String,
    pub new_sha: String,
    pub commit_message: String,
    pub commit_author: String,
    pub commit_date: String,
    pub compare_url: String,
    pub commit_url: String,
    pub file_url: String,
}

impl UpdateEvent {
    /// Build an event from the previous identifier and the new commit.
    #[must_use]
    pub fn new(
        web_url: &str,
        name: &str,
        key: &WatchKey,
        old_sha: &str,
        commit: &CommitInfo,
    ) -> Self {
        let web = web_url.trim_end_matches('/');
        let WatchKey { repo, branch, path } = key;
        let new_sha = commit.sha.as_str();

        Self {
            name: name.to_string(),
            repo: repo.clone(),
            branch: branch.clone(),
            path: path.clone(),
            old_sha: old_sha.to_string(),
            new_sha: new_sha.to_string(),
            commit_message: commit.summary().to_string(),
            commit_author: commit.author_name().to_string(),
            commit_date: commit.committed_at().to_string(),
            compare_url: format!(
                "{web}/{repo}/compare/{}...{}",
                short_sha(old_sha),
                short_sha(new_sha)
            ),
            commit_url: format!("{web}/{repo}/commit/{new_sha}"),
            file_url: format!("{web}/{repo}/blob/{branch}/{path}"),
        }
    }
}

/// First seven characters of a commit identifier.
#[must_use]
pub fn short_sha(sha: &str) -> &str {
    sha.char_indices().nth(7).map_or(sha, |(end, _)| &sha[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{CommitDetail, Signature};

    fn commit(sha: &str) -> CommitInfo {
        CommitInfo {
            sha: sha.to_string(),
            commit: CommitDetail {
                message: "Update fr\n\ndetails".to_string(),
                author: Some(Signature {
                    name: "Alice".to_string(),
                    date: "2024-05-01T09:00:00Z".to_string(),
                }),
                committer: Some(Signature {
                    name: "GitHub".to_string(),
                    date: "2024-05-01T10:00:00Z".to_string(),
                }),
            },
        }
    }

    #[test]
    fn test_watch_key_format() {
        let key = WatchKey::new("o/r", "main", "locales/fr.json");
        assert_eq!(key.to_string(), "o/r:main:locales/fr.json");
    }

    #[test]
    fn test_short_sha() {
        assert_eq!(short_sha("aaa1111bbbb"), "aaa1111");
        assert_eq!(short_sha("abc"), "abc");
        assert_eq!(short_sha(""), "");
    }

    #[test]
    fn test_update_event_urls() {
        let key = WatchKey::new("o/r", "dev", "a/b.json");
        let event = UpdateEvent::new(
            "https://github.com/",
            "r",
            &key,
            "aaa1111ffff",
            &commit("bbb2222eeee"),
        );

        assert_eq!(event.old_sha, "aaa1111ffff");
        assert_eq!(event.new_sha, "bbb2222eeee");
        assert_eq!(event.commit_message, "Update fr");
        assert_eq!(event.commit_author, "Alice");
        assert_eq!(event.commit_date, "2024-05-01T10:00:00Z");
        assert_eq!(
            event.compare_url,
            "https://github.com/o/r/compare/aaa1111...bbb2222"
        );
        assert_eq!(event.commit_url, "https://github.com/o/r/commit/bbb2222eeee");
        assert_eq!(event.file_url, "https://github.com/o/r/blob/dev/a/b.json");
    }
}
