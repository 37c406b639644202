//! JIRA wiki-markup cleanup for comment and description bodies.
//!
//! Steps run in a fixed order: carriage returns are dropped, `{code}` and
//! `{noformat}` markers become fenced blocks, the body is truncated at a
//! word boundary, and `[~user]` mentions become `@user`.

use std::sync::OnceLock;

use regex::Regex;

/// Appended to a body that was cut short.
pub const ELLIPSIS: &str = "\n...";

static CODE_MARKER: OnceLock<Regex> = OnceLock::new();
static MENTION: OnceLock<Regex> = OnceLock::new();

fn code_marker() -> &'static Regex {
    CODE_MARKER.get_or_init(|| {
        Regex::new(r"\{(?:code|noformat)(?::[^}]*)?\}").expect("static code pattern is valid")
    })
}

fn mention() -> &'static Regex {
    MENTION.get_or_init(|| Regex::new(r"\[~([\w.@\-]+)\]").expect("static mention pattern is valid"))
}

/// A cleaned body plus the users it mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedComment {
    pub text: String,
    pub mentions: Vec<String>,
}

/// Full cleanup pipeline.
pub fn format_body(body: &str, max_len: usize) -> FormattedComment {
    let text = body.replace('\r', "");
    let text = rewrite_code_blocks(&text);
    let text = truncate(&text, max_len);
    let mentions = extract_mentions(&text);
    let text = rewrite_mentions(&text);
    FormattedComment { text, mentions }
}

/// `{code:java}` / `{code}` / `{noformat}` → triple backticks.
pub fn rewrite_code_blocks(text: &str) -> String {
    code_marker().replace_all(text, "```").into_owned()
}

/// Cut `text` to at most `max_len` characters, ending on a word boundary
/// followed by [`ELLIPSIS`]. Text already within the limit is returned as is,
/// so applying this twice gives the same result as applying it once.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let ellipsis_len = ELLIPSIS.chars().count();
    if max_len <= ellipsis_len {
        // No room for the marker.
        return text.chars().take(max_len).collect();
    }

    let keep = max_len - ellipsis_len;
    let prefix_end = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let prefix = &text[..prefix_end];

    // Prefer the last whitespace inside the kept prefix; a single long word
    // is hard-cut instead.
    let cut = match prefix.rfind(char::is_whitespace) {
        Some(i) if i > 0 => prefix[..i].trim_end(),
        _ => prefix,
    };

    format!("{}{}", cut, ELLIPSIS)
}

/// Mentioned user names in order of first appearance, without duplicates.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut users: Vec<String> = Vec::new();
    for caps in mention().captures_iter(text) {
        let user = &caps[1];
        if !users.iter().any(|u| u == user) {
            users.push(user.to_string());
        }
    }
    users
}

/// `[~jane.doe]` → `@jane.doe`
pub fn rewrite_mentions(text: &str) -> String {
    mention().replace_all(text, "@$1").into_owned()
}
