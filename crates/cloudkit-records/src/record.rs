use crate::codec::{decode_field_document, encode_field};
use crate::error::RecordDecodeError;
use crate::identifiers::{RecordId, ZoneId};
use crate::reference::{Reference, ReferenceAction};
use crate::timestamp;
use crate::value::{RecordValue, ValueList};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::SystemTime;
use tracing::debug;

/// Record type of the per-user records the service creates.
pub const USER_RECORD_TYPE: &str = "Users";

/// Audit entry from a `created` / `modified` block.
#[derive(Clone, Debug, PartialEq, Eq)]
struct RecordLog {
    timestamp: SystemTime,
    user_record_name: String,
}

impl RecordLog {
    fn from_document(document: &Value) -> Option<Self> {
        Some(Self {
            timestamp: document.get("timestamp").and_then(timestamp::from_json)?,
            user_record_name: document
                .get("userRecordName")
                .and_then(Value::as_str)?
                .to_string(),
        })
    }
}

/// A change-tracked record document.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    record_id: RecordId,
    record_type: String,
    values: HashMap<String, RecordValue>,
    changed_keys: HashSet<String>,
    /// Server-issued freshness token, echoed on save.
    pub record_change_tag: Option<String>,
    pub creator_user_record_id: Option<RecordId>,
    pub creation_date: SystemTime,
    pub last_modified_user_record_id: Option<RecordId>,
    pub modification_date: Option<SystemTime>,
    pub parent: Option<Reference>,
}

impl Record {
    /// A fresh record in the default zone with a generated name.
    pub fn new(record_type: impl Into<String>) -> Self {
        let record_name = uuid::Uuid::new_v4().to_string().to_uppercase();
        Self::with_id(record_type, RecordId::new(record_name))
    }

    pub fn with_id(record_type: impl Into<String>, record_id: RecordId) -> Self {
        Self {
            record_id,
            record_type: record_type.into(),
            values: HashMap::new(),
            changed_keys: HashSet::new(),
            record_change_tag: None,
            creator_user_record_id: None,
            creation_date: SystemTime::now(),
            last_modified_user_record_id: None,
            modification_date: None,
            parent: None,
        }
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.values.get(key)
    }

    /// Sets or clears a field. Clearing counts as a change.
    pub fn set(&mut self, key: impl Into<String>, value: Option<RecordValue>) {
        let key = key.into();
        self.changed_keys.insert(key.clone());
        match value {
            Some(mut value) => {
                self.stamp_assets(&mut value);
                self.values.insert(key, value);
            }
            None => {
                self.values.remove(&key);
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RecordValue>) {
        self.set(key, Some(value.into()));
    }

    pub fn remove(&mut self, key: &str) -> Option<RecordValue> {
        let previous = self.values.get(key).cloned();
        self.set(key, None);
        previous
    }

    fn stamp_assets(&self, value: &mut RecordValue) {
        match value {
            RecordValue::Asset(asset) => asset.record_id = Some(self.record_id.clone()),
            RecordValue::List(ValueList::Asset(assets)) => {
                for asset in assets {
                    asset.record_id = Some(self.record_id.clone());
                }
            }
            _ => {}
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn changed_keys(&self) -> &HashSet<String> {
        &self.changed_keys
    }

    pub fn is_changed(&self, key: &str) -> bool {
        self.changed_keys.contains(key)
    }

    /// Forgets tracked changes, e.g. after a successful save.
    pub fn mark_clean(&mut self) {
        self.changed_keys.clear();
    }

    /// Rebuilds a record from a wire document.
    ///
    /// A document without `recordName` or `recordType` is rejected with a
    /// malformed error. Malformed fields are left out of the record; a field
    /// whose tag/payload pair is unsupported fails the whole decode.
    pub fn from_document(document: &Value) -> Result<Self, RecordDecodeError> {
        Self::decode(document, None)
    }

    /// Like [`Record::from_document`], keeping a caller-known record id.
    pub fn from_document_with_id(
        document: &Value,
        record_id: RecordId,
    ) -> Result<Self, RecordDecodeError> {
        Self::decode(document, Some(record_id))
    }

    fn decode(document: &Value, known_id: Option<RecordId>) -> Result<Self, RecordDecodeError> {
        if !document.is_object() {
            return Err(RecordDecodeError::NotAnObject);
        }
        let record_name = document
            .get("recordName")
            .and_then(Value::as_str)
            .ok_or(RecordDecodeError::MissingKey("recordName"))?;
        let record_type = document
            .get("recordType")
            .and_then(Value::as_str)
            .ok_or(RecordDecodeError::MissingKey("recordType"))?;

        let zone_id = match document.get("zoneID") {
            Some(zone) => {
                ZoneId::from_document(zone).ok_or(RecordDecodeError::InvalidBlock("zoneID"))?
            }
            None => ZoneId::default(),
        };
        let record_id =
            known_id.unwrap_or_else(|| RecordId::in_zone(record_name, zone_id.clone()));
        let mut record = Self::with_id(record_type, record_id);

        record.record_change_tag = document
            .get("recordChangeTag")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(created) = document.get("created").and_then(RecordLog::from_document) {
            record.creator_user_record_id = Some(RecordId::new(created.user_record_name));
            record.creation_date = created.timestamp;
        }
        if let Some(modified) = document.get("modified").and_then(RecordLog::from_document) {
            record.last_modified_user_record_id = Some(RecordId::new(modified.user_record_name));
            record.modification_date = Some(modified.timestamp);
        }

        if let Some(fields) = document.get("fields").and_then(Value::as_object) {
            for (key, field) in fields {
                match decode_field_document(field) {
                    Ok(mut value) => {
                        record.stamp_assets(&mut value);
                        record.values.insert(key.clone(), value);
                    }
                    Err(error) if error.is_malformed() => {
                        debug!(record = record_name, field = %key, %error, "dropping malformed field");
                    }
                    Err(source) => {
                        return Err(RecordDecodeError::Field {
                            record_name: record_name.to_string(),
                            field: key.clone(),
                            source,
                        });
                    }
                }
            }
        }

        if let Some(parent_name) = document
            .get("parent")
            .and_then(|parent| parent.get("recordName"))
            .and_then(Value::as_str)
        {
            record.parent = Some(Reference::new(
                RecordId::in_zone(parent_name, zone_id),
                ReferenceAction::None,
            ));
        }

        Ok(record)
    }

    /// Encodes the named fields that are present; absent keys are skipped.
    pub fn fields_document<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Map<String, Value> {
        keys.into_iter()
            .filter_map(|key| {
                self.values
                    .get(key)
                    .map(|value| (key.to_string(), encode_field(value)))
            })
            .collect()
    }

    pub fn changed_fields_document(&self) -> Map<String, Value> {
        self.fields_document(self.changed_keys.iter().map(String::as_str))
    }

    /// Save-request shape: `{fields, recordType, recordName}` plus the change
    /// tag when known, and `parent` with `createShortGUID` when a parent is set.
    pub fn to_document(&self) -> Value {
        let fields: Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| (key.clone(), encode_field(value)))
            .collect();

        let mut document = Map::new();
        document.insert("fields".to_string(), Value::Object(fields));
        document.insert(
            "recordType".to_string(),
            Value::String(self.record_type.clone()),
        );
        document.insert(
            "recordName".to_string(),
            Value::String(self.record_id.record_name.clone()),
        );
        if let Some(change_tag) = &self.record_change_tag {
            document.insert(
                "recordChangeTag".to_string(),
                Value::String(change_tag.clone()),
            );
        }
        if let Some(parent) = &self.parent {
            document.insert("createShortGUID".to_string(), Value::from(1));
            let mut parent_document = Map::new();
            parent_document.insert(
                "recordName".to_string(),
                Value::String(parent.record_id.record_name.clone()),
            );
            document.insert("parent".to_string(), Value::Object(parent_document));
        }
        Value::Object(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn new_record_expected_uppercase_uuid_in_default_zone() {
        let record = Record::new("Note");
        assert_eq!(record.record_type(), "Note");
        assert_eq!(record.record_id().record_name.len(), 36);
        assert_eq!(
            record.record_id().record_name,
            record.record_id().record_name.to_uppercase()
        );
        assert!(record.record_id().zone_id.is_default());
        assert!(record.changed_keys().is_empty());
    }

    #[test]
    fn setting_same_key_twice_expected_single_change() {
        let mut record = Record::new("Note");
        record.insert("a", 1_i64);
        record.insert("a", 2_i64);

        assert_eq!(record.changed_keys().len(), 1);
        assert!(record.is_changed("a"));
        assert_eq!(record.get("a"), Some(&RecordValue::Int64(2)));
    }

    #[test]
    fn clearing_key_expected_tracked_change() {
        let mut record = Record::new("Note");
        record.set("a", None);

        assert!(record.is_changed("a"));
        assert!(record.get("a").is_none());
        assert!(record.is_empty());
    }

    #[test]
    fn mark_clean_expected_no_changed_keys() {
        let mut record = Record::new("Note");
        record.insert("title", "hello");
        record.mark_clean();
        assert!(record.changed_keys().is_empty());
        assert_eq!(record.get("title").and_then(RecordValue::as_str), Some("hello"));

        record.remove("title");
        assert!(record.is_changed("title"));
    }

    #[test]
    fn setting_asset_stamps_owning_record() {
        let mut record = Record::new("Photo");
        record.insert("image", Asset::new("sum", 10));

        let stored = record
            .get("image")
            .and_then(RecordValue::as_asset)
            .expect("asset should be stored");
        assert_eq!(stored.record_id.as_ref(), Some(record.record_id()));
    }

    #[test]
    fn document_missing_record_type_expected_missing_key() {
        let error = Record::from_document(&json!({"recordName": "X"}))
            .expect_err("record without type should fail");
        assert_eq!(error, RecordDecodeError::MissingKey("recordType"));
        assert!(error.is_malformed());

        let error = Record::from_document(&json!({"recordType": "T"}))
            .expect_err("record without name should fail");
        assert_eq!(error, RecordDecodeError::MissingKey("recordName"));
    }

    #[test]
    fn created_block_sets_creator_and_creation_date() {
        let document = json!({
            "recordName": "X",
            "recordType": "T",
            "created": {"timestamp": 1_468_000_000_999_i64, "userRecordName": "_user1", "deviceID": "2"},
            "modified": {"timestamp": 1_468_000_100_000_i64, "userRecordName": "_user2"},
        });
        let record = Record::from_document(&document).expect("record should decode");

        assert_eq!(record.creator_user_record_id, Some(RecordId::new("_user1")));
        let created_secs = record
            .creation_date
            .duration_since(UNIX_EPOCH)
            .expect("after epoch")
            .as_secs();
        assert_eq!(created_secs, 1_468_000_000);
        assert_eq!(
            record.last_modified_user_record_id,
            Some(RecordId::new("_user2"))
        );
        assert_eq!(
            record.modification_date,
            Some(UNIX_EPOCH + Duration::from_millis(1_468_000_100_000))
        );
    }

    #[test]
    fn fractional_audit_timestamps_still_set_creator_and_dates() {
        let document = json!({
            "recordName": "X",
            "recordType": "T",
            "created": {"timestamp": 1_468_000_000_999.0, "userRecordName": "_user1"},
            "modified": {"timestamp": 1_468_000_100_000.5, "userRecordName": "_user2"},
        });
        let record = Record::from_document(&document).expect("record should decode");

        assert_eq!(record.creator_user_record_id, Some(RecordId::new("_user1")));
        assert_eq!(
            record
                .creation_date
                .duration_since(UNIX_EPOCH)
                .expect("after epoch")
                .as_secs(),
            1_468_000_000
        );
        assert_eq!(
            record.last_modified_user_record_id,
            Some(RecordId::new("_user2"))
        );
        let modified_secs = record
            .modification_date
            .expect("modification date should be set")
            .duration_since(UNIX_EPOCH)
            .expect("after epoch")
            .as_secs();
        assert_eq!(modified_secs, 1_468_000_100);
    }

    #[test]
    fn zone_and_parent_blocks_decode() {
        let document = json!({
            "recordName": "child",
            "recordType": "Item",
            "recordChangeTag": "ct-1",
            "zoneID": {"zoneName": "Lists", "ownerName": "_owner"},
            "parent": {"recordName": "root"},
        });
        let record = Record::from_document(&document).expect("record should decode");

        let zone = ZoneId::new("Lists", "_owner");
        assert_eq!(record.record_id(), &RecordId::in_zone("child", zone.clone()));
        assert_eq!(record.record_change_tag.as_deref(), Some("ct-1"));
        assert_eq!(
            record.parent,
            Some(Reference::new(RecordId::in_zone("root", zone), ReferenceAction::None))
        );
        assert!(record.changed_keys().is_empty());
    }

    #[test]
    fn malformed_field_is_dropped_and_unsupported_fails() {
        let document = json!({
            "recordName": "X",
            "recordType": "T",
            "fields": {
                "ok": {"value": "hi", "type": "STRING"},
                "broken": {"value": "!!", "type": "BYTES"},
            },
        });
        let record = Record::from_document(&document).expect("malformed field is skipped");
        assert_eq!(record.len(), 1);
        assert!(record.get("broken").is_none());

        let document = json!({
            "recordName": "X",
            "recordType": "T",
            "fields": {"weird": {"value": {"a": 1}, "type": "MYSTERY"}},
        });
        let error = Record::from_document(&document).expect_err("unsupported field should fail");
        assert!(matches!(error, RecordDecodeError::Field { ref field, .. } if field == "weird"));
        assert!(!error.is_malformed());
    }

    #[test]
    fn to_document_with_parent_requests_short_guid() {
        let mut record = Record::with_id("Item", RecordId::new("child"));
        record.insert("count", 3_i64);
        record.parent = Some(Reference::new(RecordId::new("root"), ReferenceAction::None));

        assert_eq!(
            record.to_document(),
            json!({
                "fields": {"count": {"value": 3, "type": "INT64"}},
                "recordType": "Item",
                "recordName": "child",
                "createShortGUID": 1,
                "parent": {"recordName": "root"},
            })
        );
    }

    #[test]
    fn changed_fields_document_only_holds_present_changes() {
        let mut record = Record::from_document(&json!({
            "recordName": "X",
            "recordType": "T",
            "fields": {"kept": {"value": "a", "type": "STRING"}},
        }))
        .expect("record should decode");
        record.insert("title", "new");
        record.set("gone", None);

        let fields = record.changed_fields_document();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["title"], json!({"value": "new", "type": "STRING"}));
    }
}
