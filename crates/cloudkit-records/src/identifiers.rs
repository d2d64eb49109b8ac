use serde_json::{Map, Value, json};
use std::fmt;

pub const DEFAULT_ZONE_NAME: &str = "_defaultZone";
pub const DEFAULT_OWNER_NAME: &str = "_defaultOwner";

/// A named partition of records under one owner.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ZoneId {
    pub zone_name: String,
    pub owner_name: String,
}

impl ZoneId {
    pub fn new(zone_name: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Self {
            zone_name: zone_name.into(),
            owner_name: owner_name.into(),
        }
    }

    /// Reads a `zoneID` block; `ownerName` falls back to the default owner.
    pub fn from_document(document: &Value) -> Option<Self> {
        let zone_name = document.get("zoneName").and_then(Value::as_str)?;
        let owner_name = document
            .get("ownerName")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_OWNER_NAME);
        Some(Self::new(zone_name, owner_name))
    }

    pub fn to_document(&self) -> Value {
        json!({
            "zoneName": self.zone_name,
            "ownerName": self.owner_name,
        })
    }

    pub fn is_default(&self) -> bool {
        self.zone_name == DEFAULT_ZONE_NAME && self.owner_name == DEFAULT_OWNER_NAME
    }
}

impl Default for ZoneId {
    fn default() -> Self {
        Self::new(DEFAULT_ZONE_NAME, DEFAULT_OWNER_NAME)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner_name, self.zone_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub record_name: String,
    pub zone_id: ZoneId,
}

impl RecordId {
    /// A record id in the default zone.
    pub fn new(record_name: impl Into<String>) -> Self {
        Self::in_zone(record_name, ZoneId::default())
    }

    pub fn in_zone(record_name: impl Into<String>, zone_id: ZoneId) -> Self {
        Self {
            record_name: record_name.into(),
            zone_id,
        }
    }

    /// Writes `recordName` and, outside the default zone, `zoneID` into `target`.
    pub(crate) fn write_into(&self, target: &mut Map<String, Value>) {
        target.insert(
            "recordName".to_string(),
            Value::String(self.record_name.clone()),
        );
        if !self.zone_id.is_default() {
            target.insert("zoneID".to_string(), self.zone_id.to_document());
        }
    }

    /// Reads `recordName` plus an optional `zoneID` from a nested document.
    pub(crate) fn read_from(document: &Value) -> Option<Self> {
        let record_name = document.get("recordName").and_then(Value::as_str)?;
        let zone_id = match document.get("zoneID") {
            Some(zone) => ZoneId::from_document(zone)?,
            None => ZoneId::default(),
        };
        Some(Self::in_zone(record_name, zone_id))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone_id, self.record_name)
    }
}
