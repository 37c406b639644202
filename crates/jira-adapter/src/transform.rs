//! JIRA event → chat message transform.
//!
//! One call handles one webhook body. The result is a chat message, a
//! suppression, or an error carrying the raw payload; failures never escape
//! as `Err` to the host.

use serde::Deserialize;
use serde_json::Value;

use crate::comment;
use crate::config::TransformConfig;
use crate::error::TransformError;
use crate::events::EventKind;
use crate::links;
use crate::rules::{self, RuleContext, RuleOutput};
use crate::traits::IncomingScript;
use crate::types::{
    AttachmentField, ChatAttachment, ChatMessage, Comment, IncomingRequest, IssueFields,
    IssueType, ScriptError, ScriptResponse, WebhookPayload,
};

/// JIRA's sub-tag for an edited comment riding on an issue event.
const COMMENT_EDITED: &str = "issue_comment_edited";

/// Turns JIRA webhook bodies into chat messages.
#[derive(Debug, Clone, Default)]
pub struct EventTransformer {
    config: TransformConfig,
}

impl EventTransformer {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Transform one webhook body. `channel` overrides the destination room.
    pub fn transform(&self, content: &Value, channel: Option<String>) -> ScriptResponse {
        if self.config.debug {
            tracing::debug!(payload = %content, "raw webhook payload");
        }

        match self.build_message(content) {
            Ok(Some(mut message)) => {
                message.channel = channel;
                tracing::info!(
                    event = event_tag(content).unwrap_or_default(),
                    issue = issue_key(content).unwrap_or_default(),
                    attachments = message.attachments.len(),
                    "webhook event transformed"
                );
                ScriptResponse::Content(message)
            }
            Ok(None) => {
                tracing::debug!(
                    event = event_tag(content).unwrap_or_default(),
                    "webhook event suppressed"
                );
                ScriptResponse::Suppressed
            }
            Err(TransformError::MissingEventKind) => {
                tracing::warn!("webhook without event kind");
                ScriptResponse::Error(ScriptError::new(
                    TransformError::MissingEventKind.to_string(),
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, payload = %content, "webhook event error");
                ScriptResponse::Error(ScriptError::new(format!("{} {}", e, content)))
            }
        }
    }

    fn build_message(&self, content: &Value) -> Result<Option<ChatMessage>, TransformError> {
        let tag = event_tag(content).ok_or(TransformError::MissingEventKind)?;
        let kind = EventKind::parse(tag);

        let issue_kind = kind.issue_verb().is_some();
        if kind.is_comment() || (!issue_kind && !self.config.debug) {
            return Ok(None);
        }

        let payload = match WebhookPayload::deserialize(content) {
            Ok(payload) => payload,
            // Diagnostics for dropped events still go out on odd payloads.
            Err(e) if !issue_kind => {
                tracing::debug!(error = %e, "unreadable payload for non-issue event");
                WebhookPayload::default()
            }
            Err(e) => return Err(e.into()),
        };

        let built = match &kind {
            EventKind::IssueCreated | EventKind::IssueUpdated | EventKind::IssueDeleted => {
                self.issue_event(&kind, &payload)?
            }
            EventKind::Worklog(tag) if self.config.debug => {
                Some(diagnostic("ignored event", tag, &payload))
            }
            EventKind::Unknown(tag) if self.config.debug => {
                Some(diagnostic("unknown web hook event", tag, &payload))
            }
            _ => None,
        };

        Ok(built.map(|(text, mut attachments)| {
            if let Some(comment) = &payload.comment {
                attachments.push(self.comment_attachment(comment, &payload));
            }
            self.message(text, attachments)
        }))
    }

    fn issue_event(
        &self,
        kind: &EventKind,
        payload: &WebhookPayload,
    ) -> Result<Option<(String, Vec<ChatAttachment>)>, TransformError> {
        let issue = IssueView::resolve(payload)?;
        let verb = kind.issue_verb().unwrap_or("event");
        let mut text = format!("issue {} {}", verb, issue.headline);
        let mut header = issue.header_attachment();

        match kind {
            EventKind::IssueCreated => {
                if let Some(creator) = &issue.fields.creator {
                    header
                        .fields
                        .push(AttachmentField::short("created by", creator.display()));
                }
            }
            EventKind::IssueDeleted => {
                if let Some(user) = &payload.user {
                    header
                        .fields
                        .push(AttachmentField::short("deleted by", user.display()));
                }
            }
            EventKind::IssueUpdated => {
                let ctx = RuleContext {
                    fields: issue.fields,
                    origin: &issue.origin,
                    issue_link: &issue.headline,
                    max_len: self.config.max_comment_length,
                    debug: self.config.debug,
                };

                let mut produced = false;
                let items = payload.changelog.iter().flat_map(|c| c.items.iter());
                for item in items {
                    for output in rules::evaluate(item, &ctx) {
                        produced = true;
                        match output {
                            RuleOutput::Field(field) => header.fields.push(field),
                            RuleOutput::Headline(headline) => text = headline,
                            RuleOutput::Image(url) => header.image_url = Some(url),
                        }
                    }
                }

                if !produced && payload.comment.is_none() {
                    return Ok(None);
                }
            }
            _ => {}
        }

        Ok(Some((text, vec![header])))
    }

    fn comment_attachment(&self, comment: &Comment, payload: &WebhookPayload) -> ChatAttachment {
        let edited = payload.issue_event_type_name.as_deref() == Some(COMMENT_EDITED);
        let actor = if edited {
            comment.update_author.as_ref().or(comment.author.as_ref())
        } else {
            comment.author.as_ref().or(comment.update_author.as_ref())
        };

        let name = actor.map(|a| a.display()).unwrap_or("someone");
        let verb = if edited { "edited" } else { "added" };
        let body = comment.body.as_deref().unwrap_or("");
        let formatted = comment::format_body(body, self.config.max_comment_length);

        let mut fields = Vec::new();
        if !formatted.mentions.is_empty() {
            let mentions: Vec<String> = formatted
                .mentions
                .iter()
                .map(|user| format!("@{}", user))
                .collect();
            fields.push(AttachmentField::short("mentions", mentions.join(", ")));
        }

        ChatAttachment {
            author_icon: actor.and_then(|a| a.avatar("48x48")).map(str::to_string),
            author_name: Some(format!("{} {} a comment", name, verb)),
            author_link: None,
            text: Some(formatted.text),
            image_url: None,
            fields,
        }
    }

    fn message(&self, text: String, attachments: Vec<ChatAttachment>) -> ChatMessage {
        ChatMessage {
            alias: self.config.alias.clone(),
            text,
            attachments,
            link_names: self.config.link_names,
            channel: None,
        }
    }
}

impl IncomingScript for EventTransformer {
    fn process_incoming_request(&self, request: &IncomingRequest) -> ScriptResponse {
        self.transform(&request.content, request.channel_override())
    }
}

/// Non-empty `webhookEvent` tag of a raw body.
pub fn event_tag(content: &Value) -> Option<&str> {
    content
        .get("webhookEvent")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
}

pub fn issue_key(content: &Value) -> Option<&str> {
    content.pointer("/issue/key").and_then(Value::as_str)
}

/// The parts of an issue every issue message needs.
struct IssueView<'a> {
    fields: &'a IssueFields,
    issue_type: &'a IssueType,
    summary: &'a str,
    origin: String,
    url: String,
    headline: String,
}

impl<'a> IssueView<'a> {
    fn resolve(payload: &'a WebhookPayload) -> Result<Self, TransformError> {
        let issue = payload
            .issue
            .as_ref()
            .ok_or(TransformError::MissingField("issue"))?;
        let key = issue
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(TransformError::MissingField("issue.key"))?;
        let self_url = issue
            .self_url
            .as_deref()
            .ok_or(TransformError::MissingField("issue.self"))?;
        let fields = issue
            .fields
            .as_ref()
            .ok_or(TransformError::MissingField("issue.fields"))?;
        let issue_type = fields
            .issuetype
            .as_ref()
            .ok_or(TransformError::MissingField("issue.fields.issuetype"))?;

        let origin = links::origin(self_url)?;
        let url = links::browse_url(&origin, key);
        let headline = links::issue_headline(issue_type, key, &url);

        Ok(Self {
            fields,
            issue_type,
            summary: fields.summary.as_deref().unwrap_or(key),
            origin,
            url,
            headline,
        })
    }

    fn header_attachment(&self) -> ChatAttachment {
        ChatAttachment {
            author_icon: self.issue_type.icon_url.clone(),
            author_name: Some(self.summary.to_string()),
            author_link: Some(self.url.clone()),
            ..ChatAttachment::default()
        }
    }
}

/// Debug-mode notice for events that would otherwise be dropped. The issue is
/// only referenced when the payload carries a resolvable one.
fn diagnostic(label: &str, tag: &str, payload: &WebhookPayload) -> (String, Vec<ChatAttachment>) {
    let event_field = AttachmentField::short(label, tag);

    match IssueView::resolve(payload) {
        Ok(issue) => {
            let mut attachment = issue.header_attachment();
            attachment.fields.push(event_field);
            attachment
                .fields
                .push(AttachmentField::short("issue", issue.summary));
            (format!("{} {}", label, issue.headline), vec![attachment])
        }
        Err(_) => {
            let attachment = ChatAttachment {
                fields: vec![event_field],
                ..ChatAttachment::default()
            };
            (label.to_string(), vec![attachment])
        }
    }
}
