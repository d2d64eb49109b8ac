use cloudkit_records::RecordDecodeError;
use serde_json::Value;
use std::fmt;

/// Error body returned by the service, either for a whole request or for one
/// item of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerError {
    pub status: Option<u16>,
    pub server_error_code: String,
    pub reason: Option<String>,
    pub uuid: Option<String>,
    pub record_name: Option<String>,
}

impl ServerError {
    pub fn new(server_error_code: impl Into<String>) -> Self {
        Self {
            status: None,
            server_error_code: server_error_code.into(),
            reason: None,
            uuid: None,
            record_name: None,
        }
    }

    /// Reads `{serverErrorCode, reason?, uuid?, recordName?}`.
    pub fn from_document(document: &Value) -> Option<Self> {
        let text = |key: &str| document.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            status: None,
            server_error_code: text("serverErrorCode")?,
            reason: text("reason"),
            uuid: text("uuid"),
            record_name: text("recordName"),
        })
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.server_error_code)?;
        if let Some(status) = self.status {
            write!(f, " (http {status})")?;
        }
        if let Some(reason) = &self.reason {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("server error {0}")]
    Server(ServerError),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("response decode failed: {0}")]
    Decode(String),
    #[error("backend failure: {0}")]
    Backend(String),
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum OperationError {
    /// The request itself failed; carried unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// One item of a batch was rejected by the server.
    #[error("item rejected: {0}")]
    Item(ServerError),
    #[error(transparent)]
    Decode(#[from] RecordDecodeError),
    #[error("invalid operation state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}
