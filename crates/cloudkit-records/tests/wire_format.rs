use cloudkit_records::{
    Asset, FieldTag, Location, Record, RecordDecodeError, RecordId, RecordValue, Reference,
    ReferenceAction, ValueList, ZoneId, decode_field_document, encode_field,
};
use serde_json::{Value, json};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn batch_records(document: &Value) -> Vec<Record> {
    document
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|item| Record::from_document(item).ok())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn batch_document_with_int64_field_expected_single_record() {
    let document = json!({
        "results": [{
            "recordName": "X",
            "recordType": "T",
            "fields": {"n": {"value": 5, "type": "INT64"}},
        }]
    });

    let records = batch_records(&document);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_id().record_name, "X");
    assert_eq!(records[0].record_type(), "T");
    assert_eq!(records[0].get("n"), Some(&RecordValue::Int64(5)));
}

#[test]
fn batch_document_skips_items_missing_required_keys() {
    let document = json!({
        "results": [
            {"recordType": "T"},
            {"recordName": "Y", "recordType": "T"},
            {"serverErrorCode": "NOT_FOUND", "reason": "gone"},
        ]
    });

    let records = batch_records(&document);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_id().record_name, "Y");
}

#[test]
fn bytes_field_encodes_as_standard_base64() {
    let mut record = Record::with_id("Blob", RecordId::new("b1"));
    record.insert("payload", vec![1_u8, 2, 3]);

    let document = record.to_document();

    assert_eq!(
        document["fields"]["payload"],
        json!({"value": "AQID", "type": "BYTES"})
    );
}

#[test]
fn full_record_round_trips_through_wire_document() {
    let zone = ZoneId::new("Projects", "_owner");
    let mut record = Record::with_id("Task", RecordId::in_zone("task-1", zone.clone()));
    let due = UNIX_EPOCH + Duration::from_millis(1_700_000_000_250);
    let mut location = Location::new(52.52, 13.405);
    location.horizontal_accuracy = Some(5.0);

    record.insert("title", "write docs");
    record.insert("priority", 2_u8);
    record.insert("done", false);
    record.insert("progress", 0.75_f64);
    record.insert("due", due);
    record.insert("tags", vec!["a", "b"]);
    record.insert("where", location.clone());
    record.insert("attachment", Asset::new("abc123", 1024));
    record.insert(
        "owner",
        Reference::new(RecordId::in_zone("user-1", zone.clone()), ReferenceAction::Validate),
    );
    record.record_change_tag = Some("ct-7".to_string());

    let mut document = record.to_document();
    document["zoneID"] = zone.to_document();
    let decoded = Record::from_document(&document).expect("record should round trip");

    assert_eq!(decoded.record_id(), record.record_id());
    assert_eq!(decoded.record_change_tag.as_deref(), Some("ct-7"));
    assert_eq!(decoded.get("title"), Some(&RecordValue::from("write docs")));
    assert_eq!(decoded.get("priority"), Some(&RecordValue::Int64(2)));
    assert_eq!(decoded.get("done"), Some(&RecordValue::Int64(0)));
    assert_eq!(decoded.get("progress"), Some(&RecordValue::Double(0.75)));
    assert_eq!(decoded.get("due").and_then(RecordValue::as_timestamp), Some(due));
    assert_eq!(
        decoded.get("tags").and_then(RecordValue::as_list),
        Some(&ValueList::String(vec!["a".to_string(), "b".to_string()]))
    );
    assert_eq!(decoded.get("where").and_then(RecordValue::as_location), Some(&location));
    let attachment = decoded
        .get("attachment")
        .and_then(RecordValue::as_asset)
        .expect("asset should decode");
    assert_eq!(attachment.file_checksum, "abc123");
    assert_eq!(attachment.record_id.as_ref(), Some(decoded.record_id()));
    assert_eq!(
        decoded
            .get("owner")
            .and_then(RecordValue::as_reference)
            .map(|reference| reference.action),
        Some(ReferenceAction::Validate)
    );
}

#[test]
fn timestamp_round_trip_within_one_millisecond() {
    let now = SystemTime::now();
    let decoded = decode_field_document(&encode_field(&RecordValue::from(now)))
        .expect("timestamp should decode")
        .as_timestamp()
        .expect("timestamp kind");

    let drift = match decoded.duration_since(now) {
        Ok(ahead) => ahead,
        Err(behind) => behind.duration(),
    };
    assert!(drift <= Duration::from_micros(500), "drift was {drift:?}");
}

#[test]
fn every_tag_parses_back_to_itself() {
    let tags: Vec<FieldTag> = FieldTag::all().collect();
    assert_eq!(tags.len(), 16);
    for tag in tags {
        assert_eq!(tag.as_str().parse::<FieldTag>(), Ok(tag));
    }
}

#[test]
fn unsupported_field_surfaces_record_error() {
    let document = json!({
        "recordName": "X",
        "recordType": "T",
        "fields": {"odd": {"value": "text", "type": "INT64"}},
    });

    let error = Record::from_document(&document).expect_err("string tagged INT64 is unsupported");

    assert!(matches!(error, RecordDecodeError::Field { .. }));
    assert!(!error.is_malformed());
}
