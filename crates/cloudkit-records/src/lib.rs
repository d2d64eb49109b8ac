#![doc = r#"
Typed record values and the tagged JSON codec used by the CloudKit web
services.

Wire mapping:

| Native | Wire | Entry point |
| --- | --- | --- |
| `RecordValue` | `{"value": .., "type": TAG}` | `codec::encode_field` / `codec::decode_field_document` |
| `Record` | `{recordName, recordType, fields, ...}` | `Record::to_document` / `Record::from_document` |
| `RecordId` | `{recordName, zoneID?}` | `Reference::to_document` |
| `ZoneId` | `{zoneName, ownerName}` | `ZoneId::to_document` |

Implementation notes:
- Tags are a closed set: eight scalar tags and their `_LIST` forms.
- Untagged JSON numbers and untagged number arrays pass through as `Number`.
- NaN and infinite doubles have no JSON form: `codec::try_encode_value`
  refuses them, the total encoders write `null`.
- A field that fails to decode because its payload is malformed is dropped
  from the record; an unsupported tag/payload pairing fails the record.
"#]

pub mod asset;
pub mod codec;
pub mod error;
pub mod identifiers;
pub mod location;
pub mod record;
pub mod reference;
pub mod tags;
pub mod timestamp;
pub mod value;

pub use asset::Asset;
pub use codec::{
    WireField, decode_field, decode_field_document, encode_field, encode_value, try_encode_field,
    try_encode_value,
};
pub use error::{FieldDecodeError, IntegerOverflow, NonFiniteNumber, RecordDecodeError};
pub use identifiers::{DEFAULT_OWNER_NAME, DEFAULT_ZONE_NAME, RecordId, ZoneId};
pub use location::Location;
pub use record::{Record, USER_RECORD_TYPE};
pub use reference::{Reference, ReferenceAction};
pub use tags::{FieldTag, ScalarTag, UnknownTag, ValueKind};
pub use value::{RecordValue, ValueList};
