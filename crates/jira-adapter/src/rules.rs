//! Changelog field rules.
//!
//! Every changelog item is keyed by `fieldtype:field` (lower-cased) and looked
//! up in [`RULES`]. Each rule is a [`FieldRule`] variant; keys without an
//! entry are unknown and only show up in debug mode.

use crate::comment;
use crate::links;
use crate::types::{AttachmentField, ChangeItem, IssueFields};

/// How one kind of changelog item is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Current assignee, or "Unassigned".
    Assignee,
    /// Current status name.
    Status,
    /// Cleaned-up current description.
    Description,
    /// Current resolution name, or "Unresolved".
    Resolution,
    /// "changed <from> to <to>".
    Transition,
    /// The new display value.
    NewValue,
    /// The new version, only when one was set.
    FixVersion,
    /// Issue moved to another project; replaces the headline.
    ProjectMove,
    /// Issue key changed.
    KeyRename,
    /// File attached or removed.
    Attachment,
    /// Already visible in the message header.
    AlreadyShown,
    /// Bookkeeping noise.
    Ignored,
}

pub const RULES: &[(&str, FieldRule)] = &[
    ("jira:assignee", FieldRule::Assignee),
    ("jira:status", FieldRule::Status),
    ("jira:description", FieldRule::Description),
    ("jira:resolution", FieldRule::Resolution),
    ("jira:priority", FieldRule::Transition),
    ("custom:sprint", FieldRule::Transition),
    ("jira:labels", FieldRule::NewValue),
    ("jira:component", FieldRule::NewValue),
    ("custom:acceptance criteria", FieldRule::NewValue),
    ("custom:story points", FieldRule::NewValue),
    ("jira:fix version", FieldRule::FixVersion),
    ("jira:project", FieldRule::ProjectMove),
    ("jira:key", FieldRule::KeyRename),
    ("jira:attachment", FieldRule::Attachment),
    ("jira:summary", FieldRule::AlreadyShown),
    ("jira:timeestimate", FieldRule::Ignored),
    ("jira:timeoriginalestimate", FieldRule::Ignored),
    ("jira:timespent", FieldRule::Ignored),
    ("jira:worklogid", FieldRule::Ignored),
    ("jira:workflow", FieldRule::Ignored),
    ("custom:test link", FieldRule::Ignored),
    ("custom:epic status", FieldRule::Ignored),
    ("custom:rank", FieldRule::Ignored),
];

pub fn lookup(action_key: &str) -> Option<FieldRule> {
    RULES
        .iter()
        .find(|(key, _)| *key == action_key)
        .map(|(_, rule)| *rule)
}

/// What a rule contributes to the issue attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutput {
    Field(AttachmentField),
    /// Replaces the message text.
    Headline(String),
    /// Inline image preview for the attachment.
    Image(String),
}

/// Issue-level data the rules read from.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub fields: &'a IssueFields,
    pub origin: &'a str,
    /// Icon-and-link markup for the issue, reused by headline rewrites.
    pub issue_link: &'a str,
    pub max_len: usize,
    pub debug: bool,
}

/// Render one changelog item. No-op changes never produce output.
pub fn evaluate(item: &ChangeItem, ctx: &RuleContext<'_>) -> Vec<RuleOutput> {
    if item.is_noop() {
        return Vec::new();
    }

    let key = item.action_key();
    match lookup(&key) {
        Some(rule) => apply(rule, item, ctx),
        None if ctx.debug => vec![RuleOutput::Field(AttachmentField::short(
            "unknown action",
            format!("{} changed {} to {}", key, item.from_text(), item.to_text()),
        ))],
        None => {
            tracing::debug!(action = %key, "dropping unknown changelog action");
            Vec::new()
        }
    }
}

pub fn apply(rule: FieldRule, item: &ChangeItem, ctx: &RuleContext<'_>) -> Vec<RuleOutput> {
    let from = item.from_text();
    let to = item.to_text();
    let field = |value: String| vec![RuleOutput::Field(AttachmentField::short(&item.field, value))];

    match rule {
        FieldRule::Assignee => field(
            ctx.fields
                .assignee
                .as_ref()
                .map(|user| user.display().to_string())
                .unwrap_or_else(|| "Unassigned".to_string()),
        ),
        FieldRule::Status => field(
            ctx.fields
                .status
                .as_ref()
                .map(|status| status.name.clone())
                .unwrap_or_else(|| to.to_string()),
        ),
        FieldRule::Description => {
            let body = ctx.fields.description.as_deref().unwrap_or(to);
            if body.trim().is_empty() {
                field("removed".to_string())
            } else {
                field(comment::format_body(body, ctx.max_len).text)
            }
        }
        FieldRule::Resolution => field(
            ctx.fields
                .resolution
                .as_ref()
                .map(|resolution| resolution.name.clone())
                .filter(|name| !name.is_empty())
                .or_else(|| (!to.is_empty()).then(|| to.to_string()))
                .unwrap_or_else(|| "Unresolved".to_string()),
        ),
        FieldRule::Transition => field(describe_change(from, to)),
        FieldRule::NewValue => {
            if to.is_empty() {
                field(format!("removed {}", from))
            } else {
                field(to.to_string())
            }
        }
        FieldRule::FixVersion => {
            if to.is_empty() {
                Vec::new()
            } else {
                field(to.to_string())
            }
        }
        FieldRule::ProjectMove => vec![RuleOutput::Headline(format!(
            "issue moved from {} to {} {}",
            from, to, ctx.issue_link
        ))],
        FieldRule::KeyRename => vec![RuleOutput::Field(AttachmentField::short(
            "key",
            describe_change(from, to),
        ))],
        FieldRule::Attachment => attachment_change(item, ctx),
        FieldRule::AlreadyShown => Vec::new(),
        FieldRule::Ignored => {
            if ctx.debug {
                vec![RuleOutput::Field(AttachmentField::short(
                    "ignored action",
                    item.action_key(),
                ))]
            } else {
                Vec::new()
            }
        }
    }
}

fn describe_change(from: &str, to: &str) -> String {
    match (from.is_empty(), to.is_empty()) {
        (true, _) => format!("set to {}", to),
        (false, true) => format!("cleared {}", from),
        (false, false) => format!("changed {} to {}", from, to),
    }
}

fn attachment_change(item: &ChangeItem, ctx: &RuleContext<'_>) -> Vec<RuleOutput> {
    let added_id = item.to.as_deref().filter(|id| !id.is_empty());

    let Some(id) = added_id else {
        return vec![RuleOutput::Field(AttachmentField::short(
            "attachment",
            format!("deleted {}", item.from_text()),
        ))];
    };

    let found = ctx
        .fields
        .attachment
        .iter()
        .flatten()
        .find(|att| att.id.as_deref() == Some(id));

    match found {
        Some(att) => {
            let mut out = vec![RuleOutput::Field(AttachmentField::short(
                "attachment",
                format!("added {}", att.filename),
            ))];
            if att.is_image() {
                out.push(RuleOutput::Image(links::attachment_url(
                    ctx.origin,
                    id,
                    &att.filename,
                )));
            }
            out
        }
        None => vec![RuleOutput::Field(AttachmentField::short(
            "attachment",
            format!("added {}", item.to_text()),
        ))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JiraAttachment, JiraUser, NamedValue};

    fn item(fieldtype: &str, field: &str, from: Option<&str>, to: Option<&str>) -> ChangeItem {
        ChangeItem {
            field: field.to_string(),
            fieldtype: fieldtype.to_string(),
            from: None,
            from_display: from.map(str::to_string),
            to: None,
            to_display: to.map(str::to_string),
        }
    }

    fn ctx(fields: &IssueFields, debug: bool) -> RuleContext<'_> {
        RuleContext {
            fields,
            origin: "https://jira.example.com",
            issue_link: "*[OPS-1](https://jira.example.com/browse/OPS-1)*",
            max_len: 500,
            debug,
        }
    }

    fn only_field(out: Vec<RuleOutput>) -> AttachmentField {
        match out.as_slice() {
            [RuleOutput::Field(f)] => f.clone(),
            other => panic!("expected one field, got {:?}", other),
        }
    }

    #[test]
    fn table_keys_are_unique_and_lowercase() {
        for (i, (key, _)) in RULES.iter().enumerate() {
            assert_eq!(*key, key.to_lowercase());
            assert!(RULES[i + 1..].iter().all(|(other, _)| other != key), "{}", key);
        }
    }

    #[test]
    fn noop_change_is_filtered() {
        let fields = IssueFields::default();
        let same = item("jira", "priority", Some("High"), Some("High"));
        assert!(evaluate(&same, &ctx(&fields, true)).is_empty());

        let both_null = item("jira", "labels", None, Some(""));
        assert!(evaluate(&both_null, &ctx(&fields, true)).is_empty());
    }

    #[test]
    fn assignee_null_is_unassigned() {
        let fields = IssueFields::default();
        let f = only_field(evaluate(
            &item("jira", "assignee", Some("Jane"), None),
            &ctx(&fields, false),
        ));
        assert_eq!(f.title, "assignee");
        assert_eq!(f.value, "Unassigned");

        let fields = IssueFields {
            assignee: Some(JiraUser {
                display_name: Some("Bob Builder".to_string()),
                ..JiraUser::default()
            }),
            ..IssueFields::default()
        };
        let f = only_field(evaluate(
            &item("jira", "assignee", None, Some("Bob Builder")),
            &ctx(&fields, false),
        ));
        assert_eq!(f.value, "Bob Builder");
    }

    #[test]
    fn status_and_resolution_read_current_issue() {
        let fields = IssueFields {
            status: Some(NamedValue {
                name: "In Review".to_string(),
            }),
            ..IssueFields::default()
        };
        let f = only_field(evaluate(
            &item("jira", "status", Some("Open"), Some("In Review")),
            &ctx(&fields, false),
        ));
        assert_eq!(f.value, "In Review");

        let f = only_field(evaluate(
            &item("jira", "resolution", Some("Done"), None),
            &ctx(&fields, false),
        ));
        assert_eq!(f.value, "Unresolved");
    }

    #[test]
    fn resolution_falls_back_to_new_value() {
        let fields = IssueFields::default();
        let f = only_field(evaluate(
            &item("jira", "resolution", None, Some("Fixed")),
            &ctx(&fields, false),
        ));
        assert_eq!(f.title, "resolution");
        assert_eq!(f.value, "Fixed");
    }

    #[test]
    fn description_is_cleaned_up() {
        let fields = IssueFields {
            description: Some(
                "Repro for [~jane.doe]:\r\n{code:bash}\nmake run\n{code}\nthen it dies".to_string(),
            ),
            ..IssueFields::default()
        };
        let f = only_field(evaluate(
            &item("jira", "description", Some("old"), Some("new")),
            &ctx(&fields, false),
        ));
        assert_eq!(f.title, "description");
        assert_eq!(f.value, "Repro for @jane.doe:\n```\nmake run\n```\nthen it dies");
    }

    #[test]
    fn description_is_truncated() {
        let fields = IssueFields {
            description: Some("word ".repeat(40)),
            ..IssueFields::default()
        };
        let c = RuleContext {
            max_len: 24,
            ..ctx(&fields, false)
        };
        let f = only_field(evaluate(&item("jira", "description", None, Some("x")), &c));
        assert!(f.value.ends_with(crate::comment::ELLIPSIS));
        assert!(f.value.chars().count() <= 24);
    }

    #[test]
    fn description_removed() {
        let fields = IssueFields::default();
        let f = only_field(evaluate(
            &item("jira", "description", Some("old text"), None),
            &ctx(&fields, false),
        ));
        assert_eq!(f.value, "removed");
    }

    #[test]
    fn new_value_and_removal() {
        let fields = IssueFields::default();
        let c = ctx(&fields, false);

        let f = only_field(evaluate(&item("jira", "labels", None, Some("backend")), &c));
        assert_eq!(f.value, "backend");

        let f = only_field(evaluate(&item("jira", "Component", Some("API"), None), &c));
        assert_eq!(f.title, "Component");
        assert_eq!(f.value, "removed API");
    }

    #[test]
    fn transition_cleared() {
        let fields = IssueFields::default();
        let f = only_field(evaluate(
            &item("custom", "Sprint", Some("Sprint 11"), None),
            &ctx(&fields, false),
        ));
        assert_eq!(f.value, "cleared Sprint 11");
    }

    #[test]
    fn transition_wording() {
        let fields = IssueFields::default();
        let f = only_field(evaluate(
            &item("jira", "priority", Some("Low"), Some("High")),
            &ctx(&fields, false),
        ));
        assert_eq!(f.value, "changed Low to High");

        let f = only_field(evaluate(
            &item("custom", "Sprint", None, Some("Sprint 12")),
            &ctx(&fields, false),
        ));
        assert_eq!(f.title, "Sprint");
        assert_eq!(f.value, "set to Sprint 12");
    }

    #[test]
    fn fix_version_only_when_set() {
        let fields = IssueFields::default();
        let c = ctx(&fields, false);
        assert!(evaluate(&item("jira", "Fix Version", Some("1.0"), None), &c).is_empty());
        let f = only_field(evaluate(&item("jira", "Fix Version", None, Some("2.0")), &c));
        assert_eq!(f.value, "2.0");
    }

    #[test]
    fn project_move_rewrites_headline() {
        let fields = IssueFields::default();
        let out = evaluate(
            &item("jira", "project", Some("Ops"), Some("Platform")),
            &ctx(&fields, false),
        );
        assert_eq!(
            out,
            vec![RuleOutput::Headline(
                "issue moved from Ops to Platform *[OPS-1](https://jira.example.com/browse/OPS-1)*"
                    .to_string()
            )]
        );
    }

    #[test]
    fn key_rename() {
        let fields = IssueFields::default();
        let f = only_field(evaluate(
            &item("jira", "Key", Some("OPS-1"), Some("PLAT-9")),
            &ctx(&fields, false),
        ));
        assert_eq!(f.title, "key");
        assert_eq!(f.value, "changed OPS-1 to PLAT-9");
    }

    #[test]
    fn attachment_added_image_gets_preview() {
        let fields = IssueFields {
            attachment: Some(vec![JiraAttachment {
                id: Some("10042".to_string()),
                filename: "screen.png".to_string(),
                mime_type: Some("image/png".to_string()),
            }]),
            ..IssueFields::default()
        };
        let mut change = item("jira", "Attachment", None, Some("screen.png"));
        change.to = Some("10042".to_string());

        let out = evaluate(&change, &ctx(&fields, false));
        assert_eq!(
            out,
            vec![
                RuleOutput::Field(AttachmentField::short("attachment", "added screen.png")),
                RuleOutput::Image(
                    "https://jira.example.com/secure/attachment/10042/screen.png".to_string()
                ),
            ]
        );
    }

    #[test]
    fn attachment_deleted() {
        let fields = IssueFields::default();
        let mut change = item("jira", "Attachment", Some("old.log"), None);
        change.from = Some("10001".to_string());
        let f = only_field(evaluate(&change, &ctx(&fields, false)));
        assert_eq!(f.value, "deleted old.log");
    }

    #[test]
    fn summary_and_ignored_are_silent_in_production() {
        let fields = IssueFields::default();
        let c = ctx(&fields, false);
        assert!(evaluate(&item("jira", "summary", Some("a"), Some("b")), &c).is_empty());
        assert!(evaluate(&item("jira", "timespent", Some("60"), Some("120")), &c).is_empty());
        assert!(evaluate(&item("custom", "Rank", Some("a"), Some("b")), &c).is_empty());
    }

    #[test]
    fn debug_surfaces_ignored_and_unknown() {
        let fields = IssueFields::default();
        let c = ctx(&fields, true);

        let f = only_field(evaluate(&item("custom", "Rank", Some("a"), Some("b")), &c));
        assert_eq!(f.title, "ignored action");
        assert_eq!(f.value, "custom:rank");

        let f = only_field(evaluate(&item("custom", "Team", Some("Red"), Some("Blue")), &c));
        assert_eq!(f.title, "unknown action");
        assert_eq!(f.value, "custom:team changed Red to Blue");
    }

    #[test]
    fn unknown_dropped_in_production() {
        let fields = IssueFields::default();
        let out = evaluate(
            &item("custom", "Team", Some("Red"), Some("Blue")),
            &ctx(&fields, false),
        );
        assert!(out.is_empty());
    }
}
