//! JIRA webhook → chat message transform.
//!
//! Takes the JSON body of a JIRA webhook (issue created, updated or deleted,
//! with an optional comment) and produces the message an incoming-webhook chat
//! integration posts, a suppression, or an error result.
//!
//! - `EventTransformer` does the work and implements `IncomingScript`, the
//!   seam a host integration calls per request
//! - changelog items are rendered through the `rules` table
//! - `TransformLogger` records the outcome of every request as a JSON line

pub mod comment;
pub mod config;
pub mod error;
pub mod events;
pub mod links;
pub mod logging;
pub mod rules;
pub mod traits;
pub mod transform;
pub mod types;

// Re-export core types
pub use config::TransformConfig;
pub use error::{ConfigError, TransformError};
pub use events::EventKind;
pub use logging::{OutcomeCounts, TransformLogger};
pub use rules::FieldRule;
pub use traits::IncomingScript;
pub use transform::EventTransformer;
pub use types::{
    AttachmentField, ChatAttachment, ChatMessage, IncomingRequest, ScriptError, ScriptResponse,
    TransformLog, TransformOutcome, WebhookPayload,
};
