use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::native::{IssueFieldsUpdate, NativeIssue, Transition};
use super::IssueClient;
use crate::config::JiraConfig;
use crate::error::TrackerError;

/// [`IssueClient`] backed by Jira's REST API v2.
pub struct JiraClient {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
    cloud: bool,
}

impl JiraClient {
    pub fn new(base_url: &str, email: &str, api_token: &str) -> Self {
        let creds = format!("{email}:{api_token}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
            cloud: crate::config::is_cloud_url(base_url),
        }
    }

    pub fn from_config(config: &JiraConfig) -> Self {
        Self::new(config.base_url(), &config.email, &config.api_token).with_cloud(config.is_cloud())
    }

    pub fn with_cloud(mut self, cloud: bool) -> Self {
        self.cloud = cloud;
        self
    }

    /// Reference to a user in a request: `accountId` on Cloud, `name` elsewhere.
    fn user_ref(&self, identity: &str) -> Value {
        if self.cloud {
            json!({ "accountId": identity })
        } else {
            json!({ "name": identity })
        }
    }

    fn fields_payload(&self, fields: &IssueFieldsUpdate) -> Result<Value> {
        let mut payload = serde_json::to_value(fields).context("Failed to encode issue fields")?;
        if let (Some(assignee), Some(map)) = (&fields.assignee, payload.as_object_mut()) {
            let value = match assignee {
                Some(identity) => self.user_ref(identity),
                None => Value::Null,
            };
            map.insert("assignee".to_string(), value);
        }
        Ok(json!({ "fields": payload }))
    }

    fn issue_endpoint(&self, key: &str, suffix: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}{suffix}",
            self.base_url,
            urlencoding::encode(key)
        )
    }

    /// Send an authenticated request, mapping error statuses to [`TrackerError`].
    async fn send(&self, request: RequestBuilder, key: Option<&str>) -> Result<Response> {
        let resp = request
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Jira API request failed")?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(key) = key {
                return Err(TrackerError::NotFound {
                    key: key.to_string(),
                }
                .into());
            }
        }
        let body = resp.text().await.unwrap_or_default();
        Err(TrackerError::Api {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<NativeIssue>,
}

#[derive(Deserialize)]
struct WatchersResponse {
    #[serde(default)]
    watchers: Vec<super::native::NativeUser>,
}

#[derive(Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

#[async_trait]
impl IssueClient for JiraClient {
    async fn get_issue(&self, key: &str) -> Result<NativeIssue> {
        tracing::debug!(key, "fetching issue");
        let resp = self
            .send(self.client.get(self.issue_endpoint(key, "")), Some(key))
            .await?;
        resp.json().await.context("Failed to parse Jira issue")
    }

    async fn search_issues(&self, jql: &str, max_results: u32) -> Result<Vec<NativeIssue>> {
        tracing::debug!(jql, max_results, "searching issues");
        let url = format!(
            "{}/rest/api/2/search?jql={}&maxResults={max_results}&validateQuery=false",
            self.base_url,
            urlencoding::encode(jql)
        );
        let search: SearchResponse = self
            .send(self.client.get(&url), None)
            .await?
            .json()
            .await
            .context("Failed to parse Jira search response")?;
        Ok(search.issues)
    }

    async fn create_issue(&self, fields: &IssueFieldsUpdate) -> Result<NativeIssue> {
        let url = format!("{}/rest/api/2/issue", self.base_url);
        let created: CreatedIssue = self
            .send(self.client.post(&url).json(&self.fields_payload(fields)?), None)
            .await?
            .json()
            .await
            .context("Failed to parse Jira create response")?;
        tracing::info!(key = %created.key, "created issue");
        // The create response only carries identifiers; read back the full issue.
        self.get_issue(&created.key).await
    }

    async fn update_issue(
        &self,
        issue: &NativeIssue,
        fields: &IssueFieldsUpdate,
        notify: bool,
    ) -> Result<()> {
        let url = format!(
            "{}?notifyUsers={notify}",
            self.issue_endpoint(&issue.key, "")
        );
        self.send(
            self.client.put(&url).json(&self.fields_payload(fields)?),
            Some(issue.key.as_str()),
        )
        .await?;
        Ok(())
    }

    async fn add_comment(&self, issue: &NativeIssue, body: &str) -> Result<()> {
        self.send(
            self.client
                .post(self.issue_endpoint(&issue.key, "/comment"))
                .json(&json!({ "body": body })),
            Some(issue.key.as_str()),
        )
        .await?;
        Ok(())
    }

    async fn watchers(&self, issue: &NativeIssue) -> Result<Vec<String>> {
        let resp: WatchersResponse = self
            .send(
                self.client.get(self.issue_endpoint(&issue.key, "/watchers")),
                Some(issue.key.as_str()),
            )
            .await?
            .json()
            .await
            .context("Failed to parse Jira watchers")?;
        Ok(resp
            .watchers
            .iter()
            .filter_map(|w| w.identity().map(String::from))
            .collect())
    }

    async fn add_watcher(&self, issue: &NativeIssue, user: &str) -> Result<()> {
        // The endpoint takes the bare identity as a JSON string body.
        self.send(
            self.client
                .post(self.issue_endpoint(&issue.key, "/watchers"))
                .json(&user),
            Some(issue.key.as_str()),
        )
        .await?;
        Ok(())
    }

    async fn remove_watcher(&self, issue: &NativeIssue, user: &str) -> Result<()> {
        let param = if self.cloud { "accountId" } else { "username" };
        self.send(
            self.client
                .delete(self.issue_endpoint(&issue.key, "/watchers"))
                .query(&[(param, user)]),
            Some(issue.key.as_str()),
        )
        .await?;
        Ok(())
    }

    async fn transitions(&self, issue: &NativeIssue) -> Result<Vec<Transition>> {
        let resp: TransitionsResponse = self
            .send(
                self.client
                    .get(self.issue_endpoint(&issue.key, "/transitions")),
                Some(issue.key.as_str()),
            )
            .await?
            .json()
            .await
            .context("Failed to parse Jira transitions")?;
        Ok(resp.transitions)
    }

    async fn transition_issue(&self, issue: &NativeIssue, transition_id: &str) -> Result<()> {
        self.send(
            self.client
                .post(self.issue_endpoint(&issue.key, "/transitions"))
                .json(&json!({ "transition": { "id": transition_id } })),
            Some(issue.key.as_str()),
        )
        .await?;
        Ok(())
    }
}
