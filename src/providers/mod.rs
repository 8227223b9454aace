pub mod jira;
pub mod native;

use anyhow::Result;
use async_trait::async_trait;

use native::{IssueFieldsUpdate, NativeIssue, Transition};

/// The issue tracker's API as seen by the adapter.
///
/// Errors are passed through to callers unchanged. A missing issue must be
/// reported as [`crate::error::TrackerError::NotFound`].
#[async_trait]
pub trait IssueClient: Send + Sync {
    async fn get_issue(&self, key: &str) -> Result<NativeIssue>;
    async fn search_issues(&self, jql: &str, max_results: u32) -> Result<Vec<NativeIssue>>;
    async fn create_issue(&self, fields: &IssueFieldsUpdate) -> Result<NativeIssue>;
    async fn update_issue(
        &self,
        issue: &NativeIssue,
        fields: &IssueFieldsUpdate,
        notify: bool,
    ) -> Result<()>;
    async fn add_comment(&self, issue: &NativeIssue, body: &str) -> Result<()>;
    async fn watchers(&self, issue: &NativeIssue) -> Result<Vec<String>>;
    async fn add_watcher(&self, issue: &NativeIssue, user: &str) -> Result<()>;
    async fn remove_watcher(&self, issue: &NativeIssue, user: &str) -> Result<()>;
    async fn transitions(&self, issue: &NativeIssue) -> Result<Vec<Transition>>;
    async fn transition_issue(&self, issue: &NativeIssue, transition_id: &str) -> Result<()>;
}
