//! Native value ⇄ tagged wire field.
//!
//! | Kind | Wire value | Tag |
//! | --- | --- | --- |
//! | generic number | JSON number | none |
//! | integers, bool | i64 (`true` = 1) | `INT64` |
//! | f32, f64 | f64 | `DOUBLE` |
//! | timestamp | integer ms since epoch | `TIMESTAMP` |
//! | bytes | standard base64 | `BYTES` |
//! | string | verbatim | `STRING` |
//! | location | `{latitude, longitude, ...}` | `LOCATION` |
//! | asset | `{fileChecksum, size, ...}` | `ASSETID` |
//! | reference | `{recordName, zoneID?, action}` | `REFERENCE` |
//! | list of kind K | array of K's wire values | `<K>_LIST` or none |

use crate::asset::Asset;
use crate::error::{FieldDecodeError, NonFiniteNumber};
use crate::location::Location;
use crate::reference::Reference;
use crate::tags::{FieldTag, ScalarTag};
use crate::timestamp;
use crate::value::{RecordValue, ValueList};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record attribute as it appears under a record's `fields` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireField {
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

impl WireField {
    pub fn new(value: Value, tag: Option<FieldTag>) -> Self {
        Self {
            value,
            field_type: tag.map(|tag| tag.as_str().to_string()),
        }
    }

    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        document.insert("value".to_string(), self.value.clone());
        if let Some(field_type) = &self.field_type {
            document.insert("type".to_string(), Value::String(field_type.clone()));
        }
        Value::Object(document)
    }

    pub fn from_document(document: &Value) -> Result<Self, FieldDecodeError> {
        let Some(object) = document.as_object() else {
            return Err(FieldDecodeError::malformed(
                None,
                "field entry is not an object",
            ));
        };
        let field_type = match object.get("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(_) => {
                return Err(FieldDecodeError::malformed(
                    None,
                    "field type is not a string",
                ));
            }
        };
        Ok(Self {
            value: object.get("value").cloned().unwrap_or(Value::Null),
            field_type,
        })
    }
}

/// Total encoder. A NaN or infinite double comes out as JSON `null`; use
/// [`try_encode_value`] where such values can occur.
pub fn encode_value(value: &RecordValue) -> WireField {
    WireField::new(wire_value(value), value.tag())
}

/// Encodes straight to the `{value, type}` document form.
pub fn encode_field(value: &RecordValue) -> Value {
    encode_value(value).to_document()
}

/// Like [`encode_value`], but refuses doubles and location components that
/// have no JSON representation.
pub fn try_encode_value(value: &RecordValue) -> Result<WireField, NonFiniteNumber> {
    match first_non_finite(value) {
        Some(number) => Err(NonFiniteNumber(number)),
        None => Ok(encode_value(value)),
    }
}

pub fn try_encode_field(value: &RecordValue) -> Result<Value, NonFiniteNumber> {
    try_encode_value(value).map(|field| field.to_document())
}

fn first_non_finite(value: &RecordValue) -> Option<f64> {
    match value {
        RecordValue::Double(double) => Some(*double).filter(|double| !double.is_finite()),
        RecordValue::Location(location) => location_non_finite(location),
        RecordValue::List(ValueList::Double(items)) => {
            items.iter().copied().find(|double| !double.is_finite())
        }
        RecordValue::List(ValueList::Location(items)) => {
            items.iter().find_map(location_non_finite)
        }
        _ => None,
    }
}

fn location_non_finite(location: &Location) -> Option<f64> {
    [
        Some(location.latitude),
        Some(location.longitude),
        location.horizontal_accuracy,
        location.vertical_accuracy,
        location.altitude,
        location.speed,
        location.course,
    ]
    .into_iter()
    .flatten()
    .find(|component| !component.is_finite())
}

fn wire_value(value: &RecordValue) -> Value {
    match value {
        RecordValue::Number(number) => Value::Number(number.clone()),
        RecordValue::String(text) => Value::String(text.clone()),
        RecordValue::Int64(integer) => Value::from(*integer),
        RecordValue::Double(double) => Value::from(*double),
        RecordValue::Timestamp(time) => Value::from(timestamp::to_millis(*time)),
        RecordValue::Bytes(bytes) => Value::String(BASE64.encode(bytes)),
        RecordValue::Location(location) => location.to_document(),
        RecordValue::Asset(asset) => asset.to_document(),
        RecordValue::Reference(reference) => reference.to_document(),
        RecordValue::List(list) => Value::Array(wire_list(list)),
    }
}

fn wire_list(list: &ValueList) -> Vec<Value> {
    match list {
        ValueList::Number(items) => items.iter().cloned().map(Value::Number).collect(),
        ValueList::String(items) => items.iter().cloned().map(Value::String).collect(),
        ValueList::Int64(items) => items.iter().copied().map(Value::from).collect(),
        ValueList::Double(items) => items.iter().copied().map(Value::from).collect(),
        ValueList::Timestamp(items) => items
            .iter()
            .map(|time| Value::from(timestamp::to_millis(*time)))
            .collect(),
        ValueList::Bytes(items) => items
            .iter()
            .map(|bytes| Value::String(BASE64.encode(bytes)))
            .collect(),
        ValueList::Location(items) => items.iter().map(Location::to_document).collect(),
        ValueList::Asset(items) => items.iter().map(Asset::to_document).collect(),
        ValueList::Reference(items) => items.iter().map(Reference::to_document).collect(),
    }
}

/// Decodes a `{value, type}` document.
pub fn decode_field_document(document: &Value) -> Result<RecordValue, FieldDecodeError> {
    decode_field(&WireField::from_document(document)?)
}

pub fn decode_field(field: &WireField) -> Result<RecordValue, FieldDecodeError> {
    let raw_tag = field.field_type.as_deref();
    let tag = raw_tag.and_then(FieldTag::parse);

    match (&field.value, tag) {
        (Value::Array(items), Some(FieldTag::List(scalar))) => {
            decode_list(items, scalar).map(RecordValue::List)
        }
        (Value::Array(items), None) if raw_tag.is_none() => {
            decode_number_list(items).map(RecordValue::List)
        }
        (Value::Array(_), _) => Err(FieldDecodeError::unsupported(raw_tag, "array")),
        (value, Some(FieldTag::Scalar(scalar))) => decode_scalar(value, scalar),
        (Value::Number(number), _) => Ok(RecordValue::Number(number.clone())),
        (Value::Bool(flag), _) => Ok(RecordValue::Int64(i64::from(*flag))),
        (Value::Null, _) => Err(FieldDecodeError::malformed(raw_tag, "missing value")),
        (value, _) => Err(FieldDecodeError::unsupported(raw_tag, shape(value))),
    }
}

fn decode_scalar(value: &Value, scalar: ScalarTag) -> Result<RecordValue, FieldDecodeError> {
    let tag = Some(scalar.as_str());
    let widened;
    let value = match value {
        Value::Bool(flag) => {
            widened = Value::from(i64::from(*flag));
            &widened
        }
        other => other,
    };

    match (scalar, value) {
        (_, Value::Null) => Err(FieldDecodeError::malformed(tag, "missing value")),
        (ScalarTag::Int64, Value::Number(number)) => Ok(number
            .as_i64()
            .map(RecordValue::Int64)
            .unwrap_or_else(|| RecordValue::Number(number.clone()))),
        (ScalarTag::Double, Value::Number(number)) => Ok(number
            .as_f64()
            .map(RecordValue::Double)
            .unwrap_or_else(|| RecordValue::Number(number.clone()))),
        (ScalarTag::Timestamp, Value::Number(_)) => timestamp::from_json(value)
            .map(RecordValue::Timestamp)
            .ok_or_else(|| FieldDecodeError::malformed(tag, "timestamp out of range")),
        (_, Value::Number(number)) => Ok(RecordValue::Number(number.clone())),
        (ScalarTag::String, Value::String(text)) => Ok(RecordValue::String(text.clone())),
        (ScalarTag::Bytes, Value::String(text)) => BASE64
            .decode(text)
            .map(RecordValue::Bytes)
            .map_err(|error| FieldDecodeError::malformed(tag, format!("invalid base64: {error}"))),
        (ScalarTag::Location, Value::Object(_)) => Location::from_document(value)
            .map(RecordValue::Location)
            .ok_or_else(|| FieldDecodeError::malformed(tag, "missing latitude/longitude")),
        (ScalarTag::AssetId, Value::Object(_)) => Asset::from_document(value)
            .map(RecordValue::Asset)
            .ok_or_else(|| FieldDecodeError::malformed(tag, "missing fileChecksum/size")),
        (ScalarTag::Reference, Value::Object(_)) => Reference::from_document(value)
            .map(RecordValue::Reference)
            .ok_or_else(|| FieldDecodeError::malformed(tag, "missing recordName or bad action")),
        (_, other) => Err(FieldDecodeError::unsupported(tag, shape(other))),
    }
}

macro_rules! element {
    ($variant:ident) => {
        |value| match value {
            RecordValue::$variant(inner) => Some(inner),
            _ => None,
        }
    };
}

fn decode_list(items: &[Value], scalar: ScalarTag) -> Result<ValueList, FieldDecodeError> {
    Ok(match scalar {
        ScalarTag::String => ValueList::String(collect_elements(items, scalar, element!(String))?),
        ScalarTag::Int64 => ValueList::Int64(collect_elements(items, scalar, element!(Int64))?),
        ScalarTag::Double => ValueList::Double(collect_elements(items, scalar, element!(Double))?),
        ScalarTag::Timestamp => {
            ValueList::Timestamp(collect_elements(items, scalar, element!(Timestamp))?)
        }
        ScalarTag::Bytes => ValueList::Bytes(collect_elements(items, scalar, element!(Bytes))?),
        ScalarTag::Location => {
            ValueList::Location(collect_elements(items, scalar, element!(Location))?)
        }
        ScalarTag::AssetId => ValueList::Asset(collect_elements(items, scalar, element!(Asset))?),
        ScalarTag::Reference => {
            ValueList::Reference(collect_elements(items, scalar, element!(Reference))?)
        }
    })
}

/// Decodes each element with the scalar rule; an element that decodes to a
/// different kind (e.g. a fractional number in an INT64 list) is malformed.
fn collect_elements<T>(
    items: &[Value],
    scalar: ScalarTag,
    extract: impl Fn(RecordValue) -> Option<T>,
) -> Result<Vec<T>, FieldDecodeError> {
    let list_tag = FieldTag::List(scalar).as_str();
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            decode_scalar(item, scalar)
                .and_then(|decoded| {
                    extract(decoded).ok_or_else(|| {
                        FieldDecodeError::malformed(
                            Some(scalar.as_str()),
                            format!("{} element does not match its list type", shape(item)),
                        )
                    })
                })
                .map_err(|source| FieldDecodeError::ListElement {
                    tag: list_tag.to_string(),
                    index,
                    source: Box::new(source),
                })
        })
        .collect()
}

fn decode_number_list(items: &[Value]) -> Result<ValueList, FieldDecodeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Number(number) => Ok(number.clone()),
            other => Err(FieldDecodeError::ListElement {
                tag: crate::error::UNTAGGED.to_string(),
                index,
                source: Box::new(FieldDecodeError::malformed(
                    None,
                    format!("untagged list holds a {} element", shape(other)),
                )),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ValueList::Number)
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::RecordId;
    use crate::reference::ReferenceAction;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    fn round_trip(value: RecordValue) -> RecordValue {
        decode_field(&encode_value(&value)).expect("encoded value should decode")
    }

    #[test]
    fn non_finite_double_rejected_by_checked_encoder() {
        let error = try_encode_value(&RecordValue::Double(f64::INFINITY))
            .expect_err("infinite double should be refused");
        assert_eq!(error, NonFiniteNumber(f64::INFINITY));

        let error = try_encode_field(&RecordValue::Double(f64::NAN))
            .expect_err("NaN should be refused");
        assert!(error.0.is_nan());

        let list = RecordValue::List(ValueList::Double(vec![1.5, f64::NEG_INFINITY]));
        assert_eq!(
            try_encode_value(&list).expect_err("list with infinity should be refused"),
            NonFiniteNumber(f64::NEG_INFINITY)
        );

        let mut fix = Location::new(10.0, 20.0);
        fix.altitude = Some(f64::INFINITY);
        assert!(try_encode_value(&RecordValue::Location(fix)).is_err());
    }

    #[test]
    fn finite_double_passes_checked_encoder_unchanged() {
        let value = RecordValue::Double(2.25);
        let field = try_encode_value(&value).expect("finite double should encode");
        assert_eq!(field, encode_value(&value));
        assert_eq!(field.value, json!(2.25));
    }

    #[test]
    fn bytes_field_expected_base64_with_bytes_tag() {
        let field = encode_field(&RecordValue::from(vec![1_u8, 2, 3]));
        assert_eq!(field, json!({"value": "AQID", "type": "BYTES"}));
    }

    #[test]
    fn untagged_number_expected_value_only() {
        let field = encode_field(&RecordValue::Number(serde_json::Number::from(7)));
        assert_eq!(field, json!({"value": 7}));
    }

    #[test]
    fn bool_field_expected_int64_one() {
        let field = encode_field(&RecordValue::from(true));
        assert_eq!(field, json!({"value": 1, "type": "INT64"}));
    }

    #[test]
    fn timestamp_field_expected_rounded_millis() {
        let time = UNIX_EPOCH + Duration::from_micros(1_468_000_000_123_600);
        let field = encode_field(&RecordValue::from(time));
        assert_eq!(field, json!({"value": 1_468_000_000_124_i64, "type": "TIMESTAMP"}));
    }

    #[test]
    fn every_kind_round_trips() {
        let mut asset = Asset::new("checksum==", 512);
        asset.receipt = Some("receipt-1".to_string());
        let values = vec![
            RecordValue::Number(serde_json::Number::from(12)),
            RecordValue::from("hello"),
            RecordValue::from(-42_i64),
            RecordValue::from(2.25_f64),
            RecordValue::from(UNIX_EPOCH + Duration::from_millis(1_468_000_000_123)),
            RecordValue::from(vec![0_u8, 255, 16]),
            RecordValue::from(Location::new(-33.8688, 151.2093)),
            RecordValue::from(asset.clone()),
            RecordValue::from(Reference::new(RecordId::new("r1"), ReferenceAction::DeleteSelf)),
            RecordValue::from(vec!["a", "b"]),
            RecordValue::from(vec![1_i64, 2, 3]),
            RecordValue::from(vec![0.5_f64, 1.5]),
            RecordValue::from(vec![UNIX_EPOCH + Duration::from_millis(10)]),
            RecordValue::from(vec![vec![1_u8], vec![2_u8, 3]]),
            RecordValue::from(vec![Location::new(1.0, 2.0)]),
            RecordValue::from(vec![asset]),
            RecordValue::from(vec![Reference::new(RecordId::new("r2"), ReferenceAction::None)]),
            RecordValue::from(vec![serde_json::Number::from(1), serde_json::Number::from(2)]),
        ];

        for value in values {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn timestamp_round_trip_tolerates_sub_millisecond_loss() {
        let time = UNIX_EPOCH + Duration::from_nanos(1_468_000_000_123_456_789);
        let decoded = round_trip(RecordValue::from(time))
            .as_timestamp()
            .expect("timestamp should decode");
        let drift = decoded
            .duration_since(time)
            .unwrap_or_else(|error| error.duration());
        assert!(drift < Duration::from_millis(1));
    }

    #[test]
    fn number_with_unmatched_tag_expected_generic_number() {
        let decoded = decode_field_document(&json!({"value": 5, "type": "STRING"}))
            .expect("numbers pass through");
        assert_eq!(decoded, RecordValue::Number(serde_json::Number::from(5)));

        let decoded = decode_field_document(&json!({"value": 5.5, "type": "INT64"}))
            .expect("fractional INT64 passes through");
        assert_eq!(decoded.as_f64(), Some(5.5));
    }

    #[test]
    fn invalid_base64_expected_malformed() {
        let error = decode_field_document(&json!({"value": "@@@", "type": "BYTES"}))
            .expect_err("bad base64 should fail");
        assert!(error.is_malformed());
    }

    #[test]
    fn reference_missing_record_name_expected_malformed() {
        let error = decode_field_document(&json!({"value": {"action": "NONE"}, "type": "REFERENCE"}))
            .expect_err("reference without record name should fail");
        assert!(matches!(error, FieldDecodeError::Malformed { .. }));
    }

    #[test]
    fn object_with_unknown_tag_expected_unsupported() {
        let error = decode_field_document(&json!({"value": {"a": 1}, "type": "FOO"}))
            .expect_err("unknown tag should fail");
        assert_eq!(
            error,
            FieldDecodeError::UnsupportedType {
                tag: "FOO".to_string(),
                shape: "object",
            }
        );
    }

    #[test]
    fn string_with_location_tag_expected_unsupported() {
        let error = decode_field_document(&json!({"value": "here", "type": "LOCATION"}))
            .expect_err("string location should fail");
        assert!(!error.is_malformed());
    }

    #[test]
    fn list_with_bad_element_expected_indexed_error() {
        let error = decode_field_document(&json!({"value": [1, "two", 3], "type": "INT64_LIST"}))
            .expect_err("string in INT64 list should fail");
        match error {
            FieldDecodeError::ListElement { tag, index, .. } => {
                assert_eq!(tag, "INT64_LIST");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn array_with_scalar_tag_expected_unsupported() {
        let error = decode_field_document(&json!({"value": [1], "type": "INT64"}))
            .expect_err("array with scalar tag should fail");
        assert!(matches!(error, FieldDecodeError::UnsupportedType { shape: "array", .. }));
    }

    #[test]
    fn timestamp_list_decodes_millis() {
        let decoded = decode_field_document(&json!({"value": [1000, 2500], "type": "TIMESTAMP_LIST"}))
            .expect("timestamp list should decode");
        assert_eq!(
            decoded,
            RecordValue::List(ValueList::Timestamp(vec![
                UNIX_EPOCH + Duration::from_secs(1),
                UNIX_EPOCH + Duration::from_millis(2500),
            ]))
        );
    }

    #[test]
    fn field_document_without_value_expected_malformed() {
        let error = decode_field_document(&json!({"type": "STRING"}))
            .expect_err("missing value should fail");
        assert!(error.is_malformed());
    }
}
