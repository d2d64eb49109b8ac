use crate::asset::Asset;
use crate::error::IntegerOverflow;
use crate::location::Location;
use crate::reference::Reference;
use crate::tags::{FieldTag, ValueKind};
use serde_json::Number;
use std::time::SystemTime;

/// Every native value a record field can hold.
///
/// The set is closed: values outside it cannot be stored, and lists are
/// homogeneous by construction.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordValue {
    /// Untagged JSON number passed through as received.
    Number(Number),
    String(String),
    Int64(i64),
    Double(f64),
    Timestamp(SystemTime),
    Bytes(Vec<u8>),
    Location(Location),
    Asset(Asset),
    Reference(Reference),
    List(ValueList),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ValueList {
    Number(Vec<Number>),
    String(Vec<String>),
    Int64(Vec<i64>),
    Double(Vec<f64>),
    Timestamp(Vec<SystemTime>),
    Bytes(Vec<Vec<u8>>),
    Location(Vec<Location>),
    Asset(Vec<Asset>),
    Reference(Vec<Reference>),
}

impl ValueList {
    pub fn element_kind(&self) -> ValueKind {
        match self {
            ValueList::Number(_) => ValueKind::Number,
            ValueList::String(_) => ValueKind::String,
            ValueList::Int64(_) => ValueKind::Int64,
            ValueList::Double(_) => ValueKind::Double,
            ValueList::Timestamp(_) => ValueKind::Timestamp,
            ValueList::Bytes(_) => ValueKind::Bytes,
            ValueList::Location(_) => ValueKind::Location,
            ValueList::Asset(_) => ValueKind::Asset,
            ValueList::Reference(_) => ValueKind::Reference,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueList::Number(items) => items.len(),
            ValueList::String(items) => items.len(),
            ValueList::Int64(items) => items.len(),
            ValueList::Double(items) => items.len(),
            ValueList::Timestamp(items) => items.len(),
            ValueList::Bytes(items) => items.len(),
            ValueList::Location(items) => items.len(),
            ValueList::Asset(items) => items.len(),
            ValueList::Reference(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordValue {
    /// Scalar kind of the value; for lists, the element kind.
    pub fn kind(&self) -> ValueKind {
        match self {
            RecordValue::Number(_) => ValueKind::Number,
            RecordValue::String(_) => ValueKind::String,
            RecordValue::Int64(_) => ValueKind::Int64,
            RecordValue::Double(_) => ValueKind::Double,
            RecordValue::Timestamp(_) => ValueKind::Timestamp,
            RecordValue::Bytes(_) => ValueKind::Bytes,
            RecordValue::Location(_) => ValueKind::Location,
            RecordValue::Asset(_) => ValueKind::Asset,
            RecordValue::Reference(_) => ValueKind::Reference,
            RecordValue::List(list) => list.element_kind(),
        }
    }

    pub fn tag(&self) -> Option<FieldTag> {
        match self {
            RecordValue::List(list) => list.element_kind().list_tag(),
            scalar => scalar.kind().tag(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RecordValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integer view; untagged numbers qualify when they are integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RecordValue::Int64(value) => Some(*value),
            RecordValue::Number(number) => number.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RecordValue::Double(value) => Some(*value),
            RecordValue::Int64(value) => Some(*value as f64),
            RecordValue::Number(number) => number.as_f64(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<SystemTime> {
        match self {
            RecordValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RecordValue::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&Location> {
        match self {
            RecordValue::Location(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            RecordValue::Asset(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            RecordValue::Reference(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ValueList> {
        match self {
            RecordValue::List(value) => Some(value),
            _ => None,
        }
    }
}

macro_rules! integer_values {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RecordValue {
                fn from(value: $ty) -> Self {
                    RecordValue::Int64(i64::from(value))
                }
            }
        )*
    };
}

integer_values!(i8, i16, i32, i64, u8, u16, u32, bool);

impl From<isize> for RecordValue {
    fn from(value: isize) -> Self {
        RecordValue::Int64(value as i64)
    }
}

impl TryFrom<u64> for RecordValue {
    type Error = IntegerOverflow;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(RecordValue::Int64)
            .map_err(|_| IntegerOverflow(value))
    }
}

impl TryFrom<usize> for RecordValue {
    type Error = IntegerOverflow;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        RecordValue::try_from(value as u64)
    }
}

impl From<f32> for RecordValue {
    fn from(value: f32) -> Self {
        RecordValue::Double(f64::from(value))
    }
}

impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        RecordValue::Double(value)
    }
}

impl From<Number> for RecordValue {
    fn from(value: Number) -> Self {
        RecordValue::Number(value)
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        RecordValue::String(value)
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::String(value.to_string())
    }
}

impl From<SystemTime> for RecordValue {
    fn from(value: SystemTime) -> Self {
        RecordValue::Timestamp(value)
    }
}

/// Raw bytes map to BYTES, not to a list of integers.
impl From<Vec<u8>> for RecordValue {
    fn from(value: Vec<u8>) -> Self {
        RecordValue::Bytes(value)
    }
}

impl From<&[u8]> for RecordValue {
    fn from(value: &[u8]) -> Self {
        RecordValue::Bytes(value.to_vec())
    }
}

impl From<Location> for RecordValue {
    fn from(value: Location) -> Self {
        RecordValue::Location(value)
    }
}

impl From<Asset> for RecordValue {
    fn from(value: Asset) -> Self {
        RecordValue::Asset(value)
    }
}

impl From<Reference> for RecordValue {
    fn from(value: Reference) -> Self {
        RecordValue::Reference(value)
    }
}

impl From<ValueList> for RecordValue {
    fn from(value: ValueList) -> Self {
        RecordValue::List(value)
    }
}

macro_rules! list_values {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for RecordValue {
                fn from(value: Vec<$ty>) -> Self {
                    RecordValue::List(ValueList::$variant(value))
                }
            }
        )*
    };
}

list_values!(
    Number => Number,
    String => String,
    i64 => Int64,
    f64 => Double,
    SystemTime => Timestamp,
    Vec<u8> => Bytes,
    Location => Location,
    Asset => Asset,
    Reference => Reference,
);

impl From<Vec<&str>> for RecordValue {
    fn from(value: Vec<&str>) -> Self {
        RecordValue::List(ValueList::String(
            value.into_iter().map(str::to_string).collect(),
        ))
    }
}

impl From<Vec<bool>> for RecordValue {
    fn from(value: Vec<bool>) -> Self {
        RecordValue::List(ValueList::Int64(
            value.into_iter().map(i64::from).collect(),
        ))
    }
}

impl From<Vec<i32>> for RecordValue {
    fn from(value: Vec<i32>) -> Self {
        RecordValue::List(ValueList::Int64(
            value.into_iter().map(i64::from).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_conversions_expected_int64() {
        assert_eq!(RecordValue::from(true), RecordValue::Int64(1));
        assert_eq!(RecordValue::from(false), RecordValue::Int64(0));
        assert_eq!(RecordValue::from(-7_i8), RecordValue::Int64(-7));
        assert_eq!(RecordValue::from(u32::MAX), RecordValue::Int64(4_294_967_295));
        assert_eq!(RecordValue::from(3.5_f32), RecordValue::Double(3.5));
    }

    #[test]
    fn u64_beyond_i64_expected_overflow_error() {
        assert_eq!(RecordValue::try_from(42_u64), Ok(RecordValue::Int64(42)));
        assert_eq!(
            RecordValue::try_from(u64::MAX),
            Err(IntegerOverflow(u64::MAX))
        );
    }

    #[test]
    fn byte_vector_expected_bytes_not_list() {
        let value = RecordValue::from(vec![1_u8, 2, 3]);
        assert_eq!(value.kind(), ValueKind::Bytes);
        assert_eq!(value.tag().map(FieldTag::as_str), Some("BYTES"));
    }

    #[test]
    fn list_tag_follows_element_kind() {
        let strings = RecordValue::from(vec!["a", "b"]);
        assert_eq!(strings.tag().map(FieldTag::as_str), Some("STRING_LIST"));

        let numbers = RecordValue::from(vec![Number::from(1), Number::from(2)]);
        assert_eq!(numbers.tag(), None);
        assert_eq!(numbers.as_list().map(ValueList::len), Some(2));
    }
}
