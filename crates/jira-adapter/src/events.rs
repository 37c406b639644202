//! JIRA webhook event kinds.

use std::fmt;

/// What a webhook reports, resolved from its `webhookEvent` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    IssueCreated,
    IssueUpdated,
    IssueDeleted,
    CommentCreated,
    CommentUpdated,
    Worklog(String),
    Unknown(String),
}

impl EventKind {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "jira:issue_created" => EventKind::IssueCreated,
            "jira:issue_updated" => EventKind::IssueUpdated,
            "jira:issue_deleted" => EventKind::IssueDeleted,
            "comment_created" => EventKind::CommentCreated,
            "comment_updated" => EventKind::CommentUpdated,
            "jira:worklog_updated" | "worklog_created" | "worklog_updated" | "worklog_deleted" => {
                EventKind::Worklog(tag.to_string())
            }
            other => EventKind::Unknown(other.to_string()),
        }
    }

    /// Headline verb for events that describe an issue.
    pub fn issue_verb(&self) -> Option<&'static str> {
        match self {
            EventKind::IssueCreated => Some("created"),
            EventKind::IssueUpdated => Some("updated"),
            EventKind::IssueDeleted => Some("deleted"),
            _ => None,
        }
    }

    /// Standalone comment events carry no issue link, so they never post.
    pub fn is_comment(&self) -> bool {
        matches!(self, EventKind::CommentCreated | EventKind::CommentUpdated)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::IssueCreated => write!(f, "jira:issue_created"),
            EventKind::IssueUpdated => write!(f, "jira:issue_updated"),
            EventKind::IssueDeleted => write!(f, "jira:issue_deleted"),
            EventKind::CommentCreated => write!(f, "comment_created"),
            EventKind::CommentUpdated => write!(f, "comment_updated"),
            EventKind::Worklog(tag) | EventKind::Unknown(tag) => write!(f, "{}", tag),
        }
    }
}
