pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindScope {
    Event,
    Message,
}

impl std::fmt::Display for KindScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KindScope::Event => f.write_str("event"),
            KindScope::Message => f.write_str("message"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unrecognized {scope} kind: {kind}")]
    UnrecognizedKind { scope: KindScope, kind: String },

    #[error("malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("content fetch failed for message {message_id}: {reason}")]
    ContentFetch { message_id: String, reason: String },

    #[error("reply delivery failed{}: {body}", status_suffix(.status))]
    ReplyDelivery { status: Option<u16>, body: String },

    #[error("event handling timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("reply catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl Error {
    #[must_use]
    pub fn unrecognized(scope: KindScope, kind: impl std::fmt::Display) -> Self {
        Self::UnrecognizedKind {
            scope,
            kind: kind.to_string(),
        }
    }

    #[must_use]
    pub fn content_fetch(message_id: &str, reason: impl std::fmt::Display) -> Self {
        Self::ContentFetch {
            message_id: message_id.to_string(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn reply_delivery(status: Option<u16>, body: impl std::fmt::Display) -> Self {
        Self::ReplyDelivery {
            status,
            body: body.to_string(),
        }
    }
}
