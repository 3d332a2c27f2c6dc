//! Partial GitHub API response shapes.

use serde::Deserialize;

/// One entry of `GET /repos/{repo}/commits`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommitDetail {
    pub message: String,
    pub author: Option<Signature>,
    pub committer: Option<Signature>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Signature {
    pub name: String,
    pub date: String,
}

impl CommitInfo {
    /// First line of the commit message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.commit.message.lines().next().unwrap_or_default()
    }

    /// Author display name, empty when unknown.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.commit
            .author
            .as_ref()
            .map_or("", |a| a.name.as_str())
    }

    /// Committer date as reported by the API.
    #[must_use]
    pub fn committed_at(&self) -> &str {
        self.commit
            .committer
            .as_ref()
            .map_or("", |c| c.date.as_str())
    }
}

/// Response of `GET /repos/{repo}/git/trees/{branch}?recursive=1`.
#[derive(Debug, Deserialize)]
pub(crate) struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeResponse {
    /// File paths only; directories and submodules are dropped.
    pub fn into_blob_paths(self) -> Vec<String> {
        self.tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_accessors() {
        let commit: CommitInfo = serde_json::from_value(serde_json::json!({
            "sha": "abc1234def",
            "commit": {
                "message": "Update French strings\n\nCo-authored body",
                "author": {"name": "Alice", "date": "2024-05-01T10:00:00Z"},
                "committer": {"name": "GitHub", "date": "2024-05-01T10:05:00Z"}
            }
        }))
        .unwrap();

        assert_eq!(commit.summary(), "Update French strings");
        assert_eq!(commit.author_name(), "Alice");
        assert_eq!(commit.committed_at(), "2024-05-01T10:05:00Z");
    }

    #[test]
    fn test_commit_missing_metadata() {
        let commit: CommitInfo =
            serde_json::from_value(serde_json::json!({"sha": "abc", "commit": {}})).unwrap();
        assert_eq!(commit.summary(), "");
        assert_eq!(commit.author_name(), "");
        assert_eq!(commit.committed_at(), "");
    }

    #[test]
    fn test_tree_keeps_blobs_only() {
        let tree: TreeResponse = serde_json::from_value(serde_json::json!({
            "sha": "t1",
            "tree": [
                {"path": "a", "type": "tree"},
                {"path": "a/b.json", "type": "blob"},
                {"path": "vendor/lib", "type": "commit"},
                {"path": "a/c.yaml", "type": "blob"}
            ],
            "truncated": false
        }))
        .unwrap();

        assert_eq!(tree.into_blob_paths(), vec!["a/b.json", "a/c.yaml"]);
    }
}
