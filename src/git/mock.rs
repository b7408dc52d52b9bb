use crate::error::{AutopilotError, Result};
use crate::git::{sort_tags_by_version_desc, CommitInfo, Repository};
use std::sync::Mutex;

/// Mock repository for testing without actual git operations
///
/// Commits are held newest-first, matching `git log` order. A `base` passed to
/// the range operations may be a hash or a tag name attached to a commit; an
/// unknown base yields the full history, which is what the bounded-window
/// callers expect from a fresh fixture.
pub struct MockRepository {
    commits: Vec<CommitInfo>,
    tags: Vec<String>,
    changed_paths: Vec<String>,
    branch: String,
    failing: bool,
    failing_commit: bool,
    committed: Mutex<Vec<String>>,
    pushed: Mutex<Vec<String>>,
}

impl MockRepository {
    /// Create a new empty mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: Vec::new(),
            changed_paths: Vec::new(),
            branch: "main".to_string(),
            failing: false,
            failing_commit: false,
            committed: Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
        }
    }

    /// A mock where every operation fails
    pub fn failing() -> Self {
        MockRepository {
            failing: true,
            ..Self::new()
        }
    }

    /// Append a commit as the new newest entry
    pub fn add_commit(&mut self, hash: impl Into<String>, message: impl Into<String>) {
        let info = CommitInfo {
            hash: hash.into(),
            message: message.into(),
            author: "Test Author".to_string(),
            email: "test@example.com".to_string(),
            timestamp: 1_700_000_000 + self.commits.len() as i64,
            refs: String::new(),
            tags: Vec::new(),
        };
        self.commits.insert(0, info);
    }

    /// Attach a tag to an existing commit
    pub fn tag_commit(&mut self, tag: impl Into<String>, hash: &str) {
        let tag = tag.into();
        if let Some(commit) = self.commits.iter_mut().find(|c| c.hash == hash) {
            commit.tags.push(tag.clone());
            commit.refs = commit
                .tags
                .iter()
                .map(|t| format!("tag: {}", t))
                .collect::<Vec<_>>()
                .join(", ");
        }
        self.tags.push(tag);
    }

    /// Record a path as changed since any baseline
    pub fn add_changed_path(&mut self, path: impl Into<String>) {
        self.changed_paths.push(path.into());
    }

    /// Set the checked-out branch name
    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = branch.into();
    }

    /// Make only `commit` fail, as when there is nothing to commit
    pub fn fail_commits(&mut self) {
        self.failing_commit = true;
    }

    /// Messages passed to `commit`, in call order
    pub fn committed_messages(&self) -> Vec<String> {
        self.committed.lock().unwrap().clone()
    }

    /// `url -> refspec` pairs passed to the push operations
    pub fn pushed_refspecs(&self) -> Vec<String> {
        self.pushed.lock().unwrap().clone()
    }

    fn fail_if_configured(&self) -> Result<()> {
        if self.failing {
            Err(AutopilotError::command("mock failure"))
        } else {
            Ok(())
        }
    }

    fn position_of(&self, base: &str) -> Option<usize> {
        self.commits
            .iter()
            .position(|c| c.hash == base || c.tags.iter().any(|t| t == base))
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn recent_commits(&self, max_count: usize) -> Result<Vec<CommitInfo>> {
        self.fail_if_configured()?;
        Ok(self.commits.iter().take(max_count).cloned().collect())
    }

    fn commits_since(&self, base: &str) -> Result<Vec<CommitInfo>> {
        self.fail_if_configured()?;
        let newer = match self.position_of(base) {
            Some(pos) => &self.commits[..pos],
            None => &self.commits[..],
        };
        let mut commits: Vec<CommitInfo> = newer.to_vec();
        commits.reverse();
        Ok(commits)
    }

    fn changed_paths_since(&self, _base: &str) -> Result<Vec<String>> {
        self.fail_if_configured()?;
        Ok(self.changed_paths.clone())
    }

    fn sorted_version_tags(&self) -> Result<Vec<String>> {
        self.fail_if_configured()?;
        let mut tags = self.tags.clone();
        sort_tags_by_version_desc(&mut tags);
        Ok(tags)
    }

    fn current_branch(&self) -> Result<String> {
        self.fail_if_configured()?;
        Ok(self.branch.clone())
    }

    fn stage_all(&self) -> Result<()> {
        self.fail_if_configured()
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.fail_if_configured()?;
        if self.failing_commit {
            return Err(AutopilotError::command("nothing to commit"));
        }
        self.committed.lock().unwrap().push(message.to_string());
        Ok(())
    }

    fn push_branch(&self, url: &str, refspec: &str) -> Result<()> {
        self.fail_if_configured()?;
        self.pushed
            .lock()
            .unwrap()
            .push(format!("{} {}", url, refspec));
        Ok(())
    }

    fn push_tags(&self, url: &str) -> Result<()> {
        self.fail_if_configured()?;
        self.pushed
            .lock()
            .unwrap()
            .push(format!("{} --tags", url));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_log_order() {
        let mut repo = MockRepository::new();
        repo.add_commit("a1", "first commit");
        repo.add_commit("b2", "second commit");

        let recent = repo.recent_commits(10).unwrap();
        assert_eq!(recent[0].hash, "b2");
        assert_eq!(recent[1].hash, "a1");
    }

    #[test]
    fn test_mock_repository_commits_since_hash() {
        let mut repo = MockRepository::new();
        repo.add_commit("a1", "first");
        repo.add_commit("b2", "second");
        repo.add_commit("c3", "third");

        let since = repo.commits_since("a1").unwrap();
        let hashes: Vec<&str> = since.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["b2", "c3"]);
    }

    #[test]
    fn test_mock_repository_commits_since_tag() {
        let mut repo = MockRepository::new();
        repo.add_commit("a1", "first");
        repo.add_commit("b2", "second");
        repo.tag_commit("v1.0.0", "a1");

        let since = repo.commits_since("v1.0.0").unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].hash, "b2");
    }

    #[test]
    fn test_mock_repository_sorted_tags() {
        let mut repo = MockRepository::new();
        repo.add_commit("a1", "first");
        repo.tag_commit("v0.9.0", "a1");
        repo.tag_commit("v1.1.0", "a1");

        assert_eq!(
            repo.sorted_version_tags().unwrap(),
            vec!["v1.1.0", "v0.9.0"]
        );
    }

    #[test]
    fn test_mock_repository_failing() {
        let repo = MockRepository::failing();
        assert!(repo.recent_commits(10).is_err());
        assert!(repo.current_branch().is_err());
        assert!(repo.commit("x").is_err());
    }
}
