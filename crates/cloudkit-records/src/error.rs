/// Failure to turn one wire field into a native value.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FieldDecodeError {
    /// The payload has the right overall shape for its tag but cannot be read
    /// (bad base64, missing required sub-keys, out-of-range timestamp).
    #[error("malformed {tag} field: {reason}")]
    Malformed { tag: String, reason: String },

    /// The tag/payload combination is outside the registry.
    #[error("unsupported field type {tag} for {shape} payload")]
    UnsupportedType { tag: String, shape: &'static str },

    #[error("{tag} element {index}: {source}")]
    ListElement {
        tag: String,
        index: usize,
        source: Box<FieldDecodeError>,
    },
}

impl FieldDecodeError {
    pub fn malformed(tag: Option<&str>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            tag: tag.unwrap_or(UNTAGGED).to_string(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(tag: Option<&str>, shape: &'static str) -> Self {
        Self::UnsupportedType {
            tag: tag.unwrap_or(UNTAGGED).to_string(),
            shape,
        }
    }

    /// True when the field can be dropped without losing the surrounding
    /// record; false for registry mismatches.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Malformed { .. } => true,
            Self::UnsupportedType { .. } => false,
            Self::ListElement { source, .. } => source.is_malformed(),
        }
    }
}

pub(crate) const UNTAGGED: &str = "untagged";

/// Failure to rebuild a record from a wire document.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum RecordDecodeError {
    #[error("record document is not an object")]
    NotAnObject,

    #[error("record document missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("record document has an invalid '{0}' block")]
    InvalidBlock(&'static str),

    #[error("record '{record_name}' field '{field}': {source}")]
    Field {
        record_name: String,
        field: String,
        source: FieldDecodeError,
    },
}

impl RecordDecodeError {
    /// Malformed documents are expected in batch responses and are skipped by
    /// callers; field-level registry mismatches are not.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::Field { source, .. } => source.is_malformed(),
            _ => true,
        }
    }
}

/// An integer that does not fit the wire's signed 64-bit representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("integer {0} does not fit in INT64")]
pub struct IntegerOverflow(pub u64);

/// A NaN or infinite double, which JSON cannot carry.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("non-finite number {0} cannot be encoded")]
pub struct NonFiniteNumber(pub f64);
