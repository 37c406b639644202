use crate::types::{IncomingRequest, ScriptResponse};

/// Entry point a host integration calls once per incoming webhook request.
///
/// The host owns the HTTP side and the actual chat post; implementors only
/// turn the request into a [`ScriptResponse`].
pub trait IncomingScript: Send + Sync {
    fn process_incoming_request(&self, request: &IncomingRequest) -> ScriptResponse;
}
