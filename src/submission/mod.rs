use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::ticket::TicketDraft;

mod http;

pub use http::HttpSubmissionClient;

const MAX_SERVER_BODY_CHARS: usize = 200;
const UNREPORTED_TICKET_ID: &str = "pending";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("network error: {message}")]
    Network { message: String, timed_out: bool },
    #[error("ticketing backend rejected credentials (status {status})")]
    Auth { status: u16 },
    #[error("ticketing backend returned status {code}: {body}")]
    Server { code: u16, body: String },
    #[error("screenshot could not be attached: {message}")]
    Attachment { message: String },
}

impl SubmissionError {
    pub fn network(message: impl Into<String>) -> Self {
        SubmissionError::Network {
            message: message.into(),
            timed_out: false,
        }
    }

    /// Sentence shown inline in the ticket window.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Network {
                timed_out: true, ..
            } => "Request timed out. Please try again.".to_string(),
            SubmissionError::Network { message, .. } => {
                format!("Connection error ({message}). Check your network and try again.")
            }
            SubmissionError::Auth { .. } => {
                "The helpdesk rejected this computer's credentials. Please contact IT directly."
                    .to_string()
            }
            SubmissionError::Server { code, body } if body.is_empty() => {
                format!("Server returned status {code}.")
            }
            SubmissionError::Server { code, body } => {
                format!("Server returned status {code}: {body}")
            }
            SubmissionError::Attachment { message } => {
                format!("Could not attach the screenshot: {message}")
            }
        }
    }
}

/// One-shot ticket submission. Implementations never retry.
pub trait SubmissionClient: Send + Sync {
    fn submit(&self, draft: &TicketDraft) -> Result<TicketId, SubmissionError>;
}

pub fn classify_status(status: u16, body: &str) -> SubmissionError {
    match status {
        401 | 403 => SubmissionError::Auth { status },
        code => SubmissionError::Server {
            code,
            body: truncate_chars(body.trim(), MAX_SERVER_BODY_CHARS),
        },
    }
}

/// Pulls the ticket identifier out of a success response, tolerating the common shapes
/// (`{"id": ..}`, `{"ticket_id": ..}`, `{"display_id": ..}`, optionally under `"ticket"`).
pub fn parse_ticket_id(body: &str) -> TicketId {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| find_ticket_id(&value))
        .unwrap_or_else(|| {
            tracing::debug!("ticket id missing from success response");
            TicketId::new(UNREPORTED_TICKET_ID)
        })
}

fn find_ticket_id(value: &Value) -> Option<TicketId> {
    const KEYS: [&str; 3] = ["display_id", "ticket_id", "id"];

    let object = value.as_object()?;
    let direct = KEYS.iter().find_map(|key| match object.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(TicketId::new(text.trim())),
        Value::Number(number) => Some(TicketId::new(number.to_string())),
        _ => None,
    });
    direct.or_else(|| object.get("ticket").and_then(find_ticket_id))
}

pub fn compose_ticket_text(draft: &TicketDraft) -> String {
    format!("{}\n\n{}", draft.description, draft.host.system_block())
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => value[..cut].to_string(),
        None => value.to_string(),
    }
}
