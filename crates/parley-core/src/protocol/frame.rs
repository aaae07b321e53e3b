//! Text frame framing (panic-free).
//!
//! Framing rules:
//! - A frame is UTF-8 text holding one or more documents separated by `\n`.
//! - Documents are decoded independently; one bad document never aborts the rest.
//! - Blank documents (empty or whitespace-only lines) are skipped.

use serde_json::{Map, Value};

use crate::error::{ChatError, Result};
use crate::protocol::envelope::Envelope;

/// Separator between documents inside one frame.
pub const DOCUMENT_DELIMITER: char = '\n';

/// Split a raw frame into its non-blank documents, in frame order.
pub fn split_documents(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .split(DOCUMENT_DELIMITER)
        .map(|doc| doc.trim_end_matches('\r'))
        .filter(|doc| !doc.trim().is_empty())
}

/// Join documents into one frame (the server's batching format).
pub fn join_documents<'a>(docs: impl IntoIterator<Item = &'a str>) -> String {
    docs.into_iter().collect::<Vec<_>>().join("\n")
}

/// Routing view of a document: a JSON object, maybe with an `action.type`.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHeader {
    /// `action.type`, when present and a string.
    pub action_type: Option<String>,
}

/// Header-only decode: accepts any JSON object, reads nothing but `action.type`.
pub fn peek_header(doc: &str) -> Result<DocumentHeader> {
    let obj: Map<String, Value> = serde_json::from_str(doc)
        .map_err(|e| ChatError::BadRequest(format!("invalid document json: {e}")))?;

    let action_type = obj
        .get("action")
        .and_then(|a| a.get("type"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_owned);

    Ok(DocumentHeader { action_type })
}

/// Full decode of one document into an [`Envelope`].
pub fn decode(doc: &str) -> Result<Envelope> {
    serde_json::from_str(doc).map_err(|e| {
        tracing::trace!(len = doc.len(), error = %e, "envelope decode failed");
        ChatError::MalformedResponse(format!("invalid envelope: {e}"))
    })
}

/// Encode one envelope as a single-line document.
pub fn encode(env: &Envelope) -> Result<String> {
    serde_json::to_string(env).map_err(|e| ChatError::BadRequest(format!("json encode failed: {e}")))
}
