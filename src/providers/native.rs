//! Jira's own representation of issues, as returned by REST API v2.
//!
//! Only the fields the adapter reads or writes are modelled; everything
//! else in the payload is ignored on deserialization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NativeIssue {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub fields: NativeFields,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NativeFields {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<NativeUser>,
    pub reporter: Option<NativeUser>,
    pub status: Option<NativeStatus>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub components: Vec<NativeComponent>,
    pub resolutiondate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeUser {
    /// Login name. Jira Server and Data Center only.
    pub name: Option<String>,
    /// Opaque user id. Jira Cloud only.
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

impl NativeUser {
    /// Identifier Jira accepts when writing this user back: the login name
    /// on Server, the account id on Cloud.
    pub fn identity(&self) -> Option<&str> {
        self.name.as_deref().or(self.account_id.as_deref())
    }

    /// Best human-readable name, for display only.
    pub fn label(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.display_name.as_deref())
            .or(self.email_address.as_deref())
            .or(self.account_id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NativeStatus {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeComponent {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    pub to: NativeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueTypeRef {
    pub name: String,
}

/// Field values pushed to Jira on create or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueFieldsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuetype: Option<IssueTypeRef>,
    pub summary: String,
    pub description: String,
    pub labels: Vec<String>,
    pub components: Vec<NativeComponent>,
    /// User identity to assign. `Some(None)` clears the assignee, `None`
    /// leaves it untouched. Serialized by the client, which knows whether
    /// the server expects `name` or `accountId`.
    #[serde(skip)]
    pub assignee: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_rest_payload() {
        let issue: NativeIssue = serde_json::from_value(json!({
            "id": "10001",
            "key": "VSEC-3112",
            "self": "https://jira.company.com/rest/api/2/issue/10001",
            "fields": {
                "summary": "summary",
                "description": "body",
                "assignee": null,
                "reporter": {"name": "reporter", "displayName": "Reporter"},
                "status": {"name": "NOT STARTED", "id": "1"},
                "labels": ["label1"],
                "components": [{"name": "A>B", "id": "7"}],
                "resolutiondate": "2020-01-14T11:46:34.000-0000",
                "priority": {"name": "High"}
            }
        }))
        .unwrap();

        assert_eq!(issue.key, "VSEC-3112");
        assert!(issue.fields.assignee.is_none());
        assert_eq!(issue.fields.reporter.unwrap().identity(), Some("reporter"));
        assert_eq!(issue.fields.components[0].name, "A>B");
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let issue: NativeIssue =
            serde_json::from_value(json!({"key": "VSEC-1", "fields": {}})).unwrap();
        assert!(issue.fields.labels.is_empty());
        assert!(issue.fields.components.is_empty());
        assert!(issue.fields.resolutiondate.is_none());
    }

    #[test]
    fn cloud_user_identity_is_account_id() {
        let user: NativeUser = serde_json::from_value(json!({
            "accountId": "5b10ac8d82e05b22cc7d4ef5",
            "displayName": "Jane Doe"
        }))
        .unwrap();
        assert_eq!(user.identity(), Some("5b10ac8d82e05b22cc7d4ef5"));
        assert_eq!(user.label(), Some("Jane Doe"));
    }

    #[test]
    fn display_name_is_never_an_identity() {
        let user = NativeUser {
            display_name: Some("Jane Doe".into()),
            ..Default::default()
        };
        assert_eq!(user.identity(), None);
        assert_eq!(user.label(), Some("Jane Doe"));
    }

    #[test]
    fn assignee_is_left_to_the_client() {
        let update = IssueFieldsUpdate {
            assignee: Some(None),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("assignee").is_none());
        assert!(value.get("project").is_none());
    }
}
