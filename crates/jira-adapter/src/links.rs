//! Browser URLs reconstructed from the REST `self` link of an issue.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::TransformError;
use crate::types::IssueType;

static SELF_URL: OnceLock<Regex> = OnceLock::new();

fn self_url_pattern() -> &'static Regex {
    SELF_URL.get_or_init(|| {
        Regex::new(r"^(\w+://)?([^/]+)(.*)$").expect("static self-url pattern is valid")
    })
}

/// Scheme and host of a REST URL, e.g. `https://jira.example.com` for
/// `https://jira.example.com/rest/api/2/issue/10001`.
pub fn origin(self_url: &str) -> Result<String, TransformError> {
    let caps = self_url_pattern()
        .captures(self_url.trim())
        .ok_or_else(|| TransformError::Url(self_url.to_string()))?;

    let scheme = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let host = caps
        .get(2)
        .map(|m| m.as_str())
        .ok_or_else(|| TransformError::Url(self_url.to_string()))?;

    Ok(format!("{}{}", scheme, host))
}

/// Where a human looks at the issue.
pub fn browse_url(origin: &str, key: &str) -> String {
    format!("{}/browse/{}", origin, key)
}

pub fn attachment_url(origin: &str, id: &str, filename: &str) -> String {
    format!("{}/secure/attachment/{}/{}", origin, id, filename)
}

/// `![Bug](icon) *[OPS-1](url)*`
pub fn issue_headline(issue_type: &IssueType, key: &str, url: &str) -> String {
    let link = format!("[{}]({})", key, url);
    match issue_type.icon_url.as_deref() {
        Some(icon) => format!("![{}]({}) *{}*", issue_type.name, icon, link),
        None => format!("{} *{}*", issue_type.name, link),
    }
}
