use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Host request
// ---------------------------------------------------------------------------

/// A request handed over by the host integration: the JIRA body plus the
/// query string of the incoming webhook URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingRequest {
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub url: RequestUrl,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestUrl {
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

impl IncomingRequest {
    pub fn new(content: Value) -> Self {
        Self {
            content,
            url: RequestUrl::default(),
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.url.query.insert("channel".to_string(), channel.into());
        self
    }

    /// Destination channel requested through `?channel=`, normalized to a
    /// `#room` name unless it already names a room or user.
    pub fn channel_override(&self) -> Option<String> {
        let raw = self.url.query.get("channel")?.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with('#') || raw.starts_with('@') {
            Some(raw.to_string())
        } else {
            Some(format!("#{}", raw))
        }
    }
}

// ---------------------------------------------------------------------------
// JIRA webhook payload
// ---------------------------------------------------------------------------

/// The subset of a JIRA webhook body the transform reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(rename = "issue_event_type_name")]
    pub issue_event_type_name: Option<String>,
    pub user: Option<JiraUser>,
    pub issue: Option<Issue>,
    pub comment: Option<Comment>,
    pub changelog: Option<Changelog>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    pub key: Option<String>,
    #[serde(rename = "self")]
    pub self_url: Option<String>,
    pub fields: Option<IssueFields>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    pub issuetype: Option<IssueType>,
    pub summary: Option<String>,
    pub status: Option<NamedValue>,
    pub assignee: Option<JiraUser>,
    pub creator: Option<JiraUser>,
    pub resolution: Option<NamedValue>,
    pub description: Option<String>,
    pub attachment: Option<Vec<JiraAttachment>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueType {
    pub name: String,
    pub icon_url: Option<String>,
}

/// Any JIRA object only read for its `name` (status, resolution).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub name: Option<String>,
    pub key: Option<String>,
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub avatar_urls: Option<BTreeMap<String, String>>,
}

impl JiraUser {
    /// Best human-readable name available.
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .or(self.key.as_deref())
            .or(self.account_id.as_deref())
            .unwrap_or("unknown user")
    }

    /// Avatar for a size key such as `"48x48"`.
    pub fn avatar(&self, size: &str) -> Option<&str> {
        self.avatar_urls.as_ref()?.get(size).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: Option<JiraUser>,
    pub update_author: Option<JiraUser>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

/// One field-level change of an `issue_updated` event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeItem {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub fieldtype: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub from: Option<String>,
    #[serde(default, rename = "fromString")]
    pub from_display: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub to: Option<String>,
    #[serde(default, rename = "toString")]
    pub to_display: Option<String>,
}

impl ChangeItem {
    /// Dispatch key, e.g. `jira:fix version` or `custom:sprint`.
    pub fn action_key(&self) -> String {
        format!("{}:{}", self.fieldtype, self.field).to_lowercase()
    }

    pub fn from_text(&self) -> &str {
        self.from_display.as_deref().unwrap_or("")
    }

    pub fn to_text(&self) -> &str {
        self.to_display.as_deref().unwrap_or("")
    }

    /// True when the visible value did not change.
    pub fn is_noop(&self) -> bool {
        self.from_text() == self.to_text()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraAttachment {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub filename: String,
    pub mime_type: Option<String>,
}

impl JiraAttachment {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .and_then(|m| m.get(..5))
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image"))
    }
}

/// JIRA sends ids as strings on some endpoints and numbers on others.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Chat message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl AttachmentField {
    pub fn short(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short: true,
        }
    }
}

/// A structured block of a chat message (not a file attachment).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAttachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<AttachmentField>,
}

/// The message the host posts to the chat room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub alias: String,
    pub text: String,
    pub attachments: Vec<ChatAttachment>,
    pub link_names: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptError {
    pub success: bool,
    pub message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// What the host receives back for one request.
///
/// Serializes as `{"content": ...}`, `{"error": ...}` or `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptResponse {
    Content(ChatMessage),
    Error(ScriptError),
    Suppressed,
}

impl ScriptResponse {
    pub fn message(&self) -> Option<&ChatMessage> {
        match self {
            ScriptResponse::Content(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ScriptError> {
        match self {
            ScriptResponse::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, ScriptResponse::Suppressed)
    }

    pub fn outcome(&self) -> TransformOutcome {
        match self {
            ScriptResponse::Content(_) => TransformOutcome::Posted,
            ScriptResponse::Error(_) => TransformOutcome::Error,
            ScriptResponse::Suppressed => TransformOutcome::Suppressed,
        }
    }
}

impl Serialize for ScriptResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScriptResponse::Content(msg) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("content", msg)?;
                map.end()
            }
            ScriptResponse::Error(err) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", err)?;
                map.end()
            }
            ScriptResponse::Suppressed => serializer.serialize_bool(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome log
// ---------------------------------------------------------------------------

/// A structured record of one processed webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformLog {
    pub ts: DateTime<Utc>,
    pub event: Option<String>,
    pub issue_key: Option<String>,
    pub outcome: TransformOutcome,
    pub channel: Option<String>,
    pub duration_us: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOutcome {
    Posted,
    Suppressed,
    Error,
}
