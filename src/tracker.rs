use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::ConfigProvider;
use crate::error::is_not_found;
use crate::model::issue::Issue;
use crate::providers::native::NativeIssue;
use crate::providers::IssueClient;
use crate::util::jql;

/// Entry point for working with issues of a single Jira project.
pub struct IssueTracker {
    client: Arc<dyn IssueClient>,
    config: Arc<dyn ConfigProvider>,
    project: String,
    max_results: u32,
}

impl IssueTracker {
    pub fn new(
        client: Arc<dyn IssueClient>,
        config: Arc<dyn ConfigProvider>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            client,
            config,
            project: project.into(),
            max_results: crate::config::DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// A blank issue in this project, created on its first save.
    pub fn new_issue(&self) -> Issue {
        Issue::new(self.client.clone(), &self.project)
    }

    /// Fetch an issue by key. Returns `None` when the tracker does not know it.
    pub async fn get_issue(&self, key: &str) -> Result<Option<Issue>> {
        let native = match self.client.get_issue(key).await {
            Ok(native) => native,
            Err(e) if is_not_found(&e) => {
                tracing::debug!(key, "issue not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.wrap(native).await.map(Some)
    }

    pub async fn find_issues<S: AsRef<str>>(
        &self,
        keywords: &[S],
        only_open: bool,
    ) -> Result<Vec<Issue>> {
        let query = jql::build_query(&self.project, keywords, only_open);
        let found = self.client.search_issues(&query, self.max_results).await?;
        tracing::debug!(query = %query, count = found.len(), "search finished");

        let mut issues = Vec::with_capacity(found.len());
        for native in found {
            issues.push(self.wrap(native).await?);
        }
        Ok(issues)
    }

    pub fn issue_url(&self, key: &str) -> Result<String> {
        let config = self.config.get().context("Failed to load Jira config")?;
        Ok(format!("{}/browse/{key}", config.base_url()))
    }

    pub fn find_issues_url<S: AsRef<str>>(&self, keywords: &[S], only_open: bool) -> Result<String> {
        let config = self.config.get().context("Failed to load Jira config")?;
        Ok(jql::build_search_url(
            config.base_url(),
            &self.project,
            keywords,
            only_open,
        ))
    }

    async fn wrap(&self, native: NativeIssue) -> Result<Issue> {
        let watchers = self.client.watchers(&native).await?;
        Ok(Issue::from_native(
            self.client.clone(),
            &self.project,
            native,
            watchers,
        ))
    }
}
