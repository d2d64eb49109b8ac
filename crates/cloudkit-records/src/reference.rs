use crate::identifiers::RecordId;
use serde_json::{Map, Value};

/// What the server does to the referencing record when the target goes away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReferenceAction {
    #[default]
    None,
    DeleteSelf,
    Validate,
}

impl ReferenceAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            ReferenceAction::None => "NONE",
            ReferenceAction::DeleteSelf => "DELETE_SELF",
            ReferenceAction::Validate => "VALIDATE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "NONE" => Some(ReferenceAction::None),
            "DELETE_SELF" => Some(ReferenceAction::DeleteSelf),
            "VALIDATE" => Some(ReferenceAction::Validate),
            _ => None,
        }
    }
}

/// A link from one record to another.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    pub record_id: RecordId,
    pub action: ReferenceAction,
}

impl Reference {
    pub fn new(record_id: RecordId, action: ReferenceAction) -> Self {
        Self { record_id, action }
    }

    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        self.record_id.write_into(&mut document);
        document.insert(
            "action".to_string(),
            Value::String(self.action.as_str().to_string()),
        );
        Value::Object(document)
    }

    /// `recordName` is required; a missing `action` means `NONE`, an unknown
    /// one makes the reference unreadable.
    pub fn from_document(document: &Value) -> Option<Self> {
        let record_id = RecordId::read_from(document)?;
        let action = match document.get("action") {
            None | Some(Value::Null) => ReferenceAction::None,
            Some(raw) => ReferenceAction::parse(raw.as_str()?)?,
        };
        Some(Self::new(record_id, action))
    }
}
