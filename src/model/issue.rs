use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::label_set::LabelStore;
use crate::error::TrackerError;
use crate::providers::native::{
    IssueFieldsUpdate, IssueTypeRef, NativeComponent, NativeIssue, NativeUser, ProjectRef,
};
use crate::providers::IssueClient;

/// Assignee value of an issue nobody owns.
pub const UNASSIGNED: &str = "Unassigned";

/// Issue type used when creating issues.
pub const DEFAULT_ISSUE_TYPE: &str = "Bug";

/// A tracker-neutral view of a Jira issue.
///
/// Fields are edited in place and written back with [`Issue::save`].
pub struct Issue {
    client: Arc<dyn IssueClient>,
    project: String,
    /// Last known server state; `None` until the issue has been created.
    native: Option<NativeIssue>,
    persisted_status: Option<String>,
    /// Assignee as last read from or written to the tracker.
    persisted_assignee: String,
    closed_time: Option<DateTime<Utc>>,

    pub title: String,
    pub body: String,
    pub reporter: String,
    pub status: String,
    pub assignee: String,
    pub labels: LabelStore,
    pub components: LabelStore,
    pub ccs: LabelStore,
}

impl Issue {
    /// An issue that does not exist on the tracker yet.
    pub fn new(client: Arc<dyn IssueClient>, project: &str) -> Self {
        Self {
            client,
            project: project.to_string(),
            native: None,
            persisted_status: None,
            persisted_assignee: UNASSIGNED.to_string(),
            closed_time: None,
            title: String::new(),
            body: String::new(),
            reporter: String::new(),
            status: String::new(),
            assignee: UNASSIGNED.to_string(),
            labels: LabelStore::default(),
            components: LabelStore::default(),
            ccs: LabelStore::default(),
        }
    }

    /// Wrap a fetched issue. All knowledge of Jira's field layout lives here.
    pub fn from_native(
        client: Arc<dyn IssueClient>,
        project: &str,
        native: NativeIssue,
        watchers: Vec<String>,
    ) -> Self {
        let fields = &native.fields;
        let status = fields
            .status
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let assignee = fields
            .assignee
            .as_ref()
            .and_then(assignee_value)
            .unwrap_or(UNASSIGNED)
            .to_string();

        Self {
            client,
            project: project.to_string(),
            persisted_status: Some(status.clone()),
            persisted_assignee: assignee.clone(),
            closed_time: fields.resolutiondate.as_deref().and_then(parse_closed_time),
            title: fields.summary.clone().unwrap_or_default(),
            body: fields.description.clone().unwrap_or_default(),
            reporter: fields
                .reporter
                .as_ref()
                .and_then(NativeUser::label)
                .unwrap_or_default()
                .to_string(),
            status,
            assignee,
            labels: LabelStore::new(&fields.labels),
            components: LabelStore::new(fields.components.iter().map(|c| &c.name)),
            ccs: LabelStore::new(watchers),
            native: Some(native),
        }
    }

    /// Tracker key such as `VSEC-3112`, or `None` before the issue is created.
    pub fn key(&self) -> Option<&str> {
        self.native.as_ref().map(|n| n.key.as_str())
    }

    /// Numeric suffix of the key.
    pub fn id(&self) -> Option<u64> {
        self.key().and_then(|key| parse_issue_id(key).ok())
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn closed_time(&self) -> Option<DateTime<Utc>> {
        self.closed_time
    }

    pub fn native(&self) -> Option<&NativeIssue> {
        self.native.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.native.is_none()
    }

    pub async fn save(&mut self, new_comment: Option<&str>) -> Result<()> {
        self.save_with(new_comment, true).await
    }

    /// Push local edits to the tracker.
    ///
    /// Creates the issue if it is new, otherwise updates its fields. Then
    /// moves it to `status` if that changed, posts `new_comment` and syncs
    /// added or removed CCs as watchers.
    pub async fn save_with(&mut self, new_comment: Option<&str>, notify: bool) -> Result<()> {
        if let Some(native) = &self.native {
            self.client
                .update_issue(native, &self.fields_update(false), notify)
                .await?;
            tracing::info!(key = %native.key, "updated issue");
        } else {
            let created = self.client.create_issue(&self.fields_update(true)).await?;
            self.persisted_status = created.fields.status.as_ref().map(|s| s.name.clone());
            self.native = Some(created);
        }
        let Some(native) = self.native.as_ref() else {
            return Ok(());
        };

        let wanted = self.status.as_str();
        if !wanted.is_empty() && self.persisted_status.as_deref() != Some(wanted) {
            let transition = self
                .client
                .transitions(native)
                .await?
                .into_iter()
                .find(|t| t.to.name.eq_ignore_ascii_case(wanted));
            match transition {
                Some(t) => {
                    tracing::debug!(key = %native.key, transition = %t.name, "transitioning issue");
                    self.client.transition_issue(native, &t.id).await?;
                }
                None => {
                    tracing::warn!(key = %native.key, status = wanted, "no transition leads to status");
                }
            }
        }

        if let Some(comment) = new_comment.filter(|c| !c.trim().is_empty()) {
            self.client.add_comment(native, comment).await?;
        }

        for cc in self.ccs.added().iter() {
            self.client.add_watcher(native, cc).await?;
        }
        for cc in self.ccs.removed().iter() {
            self.client.remove_watcher(native, cc).await?;
        }

        self.persisted_status = Some(self.status.clone());
        self.persisted_assignee = self.assignee.clone();
        self.labels.reset_tracking();
        self.components.reset_tracking();
        self.ccs.reset_tracking();
        Ok(())
    }

    fn fields_update(&self, creating: bool) -> IssueFieldsUpdate {
        let assignee = if self.assignee.is_empty() || self.assignee == UNASSIGNED {
            None
        } else {
            Some(self.assignee.clone())
        };
        IssueFieldsUpdate {
            project: creating.then(|| ProjectRef {
                key: self.project.clone(),
            }),
            issuetype: creating.then(|| IssueTypeRef {
                name: DEFAULT_ISSUE_TYPE.to_string(),
            }),
            summary: self.title.clone(),
            description: self.body.clone(),
            labels: self.labels.to_sorted_vec(),
            components: self
                .components
                .to_sorted_vec()
                .into_iter()
                .map(|name| NativeComponent { name })
                .collect(),
            // On create Jira applies its default assignee unless one is given.
            assignee: if creating {
                assignee.map(Some)
            } else if self.assignee != self.persisted_assignee {
                Some(assignee)
            } else {
                None
            },
        }
    }
}

/// What `Issue::assignee` shows for a fetched user: the writable identity
/// when Jira returned one, otherwise a display label. The label is only
/// ever compared against, never written back.
fn assignee_value(user: &NativeUser) -> Option<&str> {
    user.identity().or_else(|| user.label())
}

/// Numeric id from a key like `VSEC-3112`.
pub fn parse_issue_id(key: &str) -> Result<u64, TrackerError> {
    key.rsplit_once('-')
        .and_then(|(project, number)| {
            if project.is_empty() {
                None
            } else {
                number.parse().ok()
            }
        })
        .ok_or_else(|| TrackerError::InvalidKey {
            key: key.to_string(),
        })
}

/// Parse Jira's resolution date, e.g. `2020-01-14T11:46:34.000-0000`.
/// Unparseable values are logged and treated as absent.
pub fn parse_closed_time(raw: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw));
    match parsed {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "ignoring unparseable resolution date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_is_numeric_suffix() {
        assert_eq!(parse_issue_id("VSEC-3112").unwrap(), 3112);
        assert_eq!(parse_issue_id("MY-PROJ-7").unwrap(), 7);
    }

    #[test]
    fn key_without_number_is_invalid() {
        assert!(matches!(
            parse_issue_id("VSEC"),
            Err(TrackerError::InvalidKey { .. })
        ));
        assert!(parse_issue_id("VSEC-abc").is_err());
        assert!(parse_issue_id("-12").is_err());
    }

    #[test]
    fn closed_time_is_normalized_to_utc() {
        assert_eq!(
            parse_closed_time("2020-01-14T11:46:34.000-0000"),
            Some(Utc.with_ymd_and_hms(2020, 1, 14, 11, 46, 34).unwrap())
        );
        assert_eq!(
            parse_closed_time("2020-01-14T13:46:34.000+0200"),
            Some(Utc.with_ymd_and_hms(2020, 1, 14, 11, 46, 34).unwrap())
        );
    }

    #[test]
    fn closed_time_accepts_rfc3339() {
        assert_eq!(
            parse_closed_time("2020-01-14T11:46:34Z"),
            Some(Utc.with_ymd_and_hms(2020, 1, 14, 11, 46, 34).unwrap())
        );
    }

    #[test]
    fn malformed_closed_time_is_none() {
        assert_eq!(parse_closed_time("yesterday"), None);
        assert_eq!(parse_closed_time(""), None);
    }
}
