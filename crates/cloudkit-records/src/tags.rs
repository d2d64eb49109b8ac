//! Wire type discriminators and the native kinds they name.
//!
//! Both directions of the codec resolve tags through this module; nothing else
//! spells a tag string.

use std::fmt;
use std::str::FromStr;

const LIST_SUFFIX: &str = "_LIST";

/// Scalar discriminator carried in a wire field's `type` key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarTag {
    String,
    Int64,
    Double,
    Timestamp,
    Bytes,
    Location,
    AssetId,
    Reference,
}

impl ScalarTag {
    pub const ALL: [ScalarTag; 8] = [
        ScalarTag::String,
        ScalarTag::Int64,
        ScalarTag::Double,
        ScalarTag::Timestamp,
        ScalarTag::Bytes,
        ScalarTag::Location,
        ScalarTag::AssetId,
        ScalarTag::Reference,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ScalarTag::String => "STRING",
            ScalarTag::Int64 => "INT64",
            ScalarTag::Double => "DOUBLE",
            ScalarTag::Timestamp => "TIMESTAMP",
            ScalarTag::Bytes => "BYTES",
            ScalarTag::Location => "LOCATION",
            ScalarTag::AssetId => "ASSETID",
            ScalarTag::Reference => "REFERENCE",
        }
    }

    const fn list_str(self) -> &'static str {
        match self {
            ScalarTag::String => "STRING_LIST",
            ScalarTag::Int64 => "INT64_LIST",
            ScalarTag::Double => "DOUBLE_LIST",
            ScalarTag::Timestamp => "TIMESTAMP_LIST",
            ScalarTag::Bytes => "BYTES_LIST",
            ScalarTag::Location => "LOCATION_LIST",
            ScalarTag::AssetId => "ASSETID_LIST",
            ScalarTag::Reference => "REFERENCE_LIST",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == raw)
    }
}

/// Full field discriminator: a scalar tag or its `_LIST` variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldTag {
    Scalar(ScalarTag),
    List(ScalarTag),
}

impl FieldTag {
    /// Derives the tag of a homogeneous list from its element tag.
    ///
    /// Untagged elements (plain JSON numbers) produce an untagged list.
    pub const fn list_of(element: Option<ScalarTag>) -> Option<FieldTag> {
        match element {
            Some(scalar) => Some(FieldTag::List(scalar)),
            None => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FieldTag::Scalar(scalar) => scalar.as_str(),
            FieldTag::List(scalar) => scalar.list_str(),
        }
    }

    pub const fn scalar(self) -> ScalarTag {
        match self {
            FieldTag::Scalar(scalar) | FieldTag::List(scalar) => scalar,
        }
    }

    pub const fn is_list(self) -> bool {
        matches!(self, FieldTag::List(_))
    }

    pub fn parse(raw: &str) -> Option<FieldTag> {
        match raw.strip_suffix(LIST_SUFFIX) {
            Some(element) => ScalarTag::parse(element).map(FieldTag::List),
            None => ScalarTag::parse(raw).map(FieldTag::Scalar),
        }
    }

    /// Every tag the wire protocol defines, scalars first.
    pub fn all() -> impl Iterator<Item = FieldTag> {
        ScalarTag::ALL
            .into_iter()
            .map(FieldTag::Scalar)
            .chain(ScalarTag::ALL.into_iter().map(FieldTag::List))
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldTag {
    type Err = UnknownTag;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FieldTag::parse(raw).ok_or_else(|| UnknownTag(raw.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type tag: {0}")]
pub struct UnknownTag(pub String);

/// Native value kinds accepted by the codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Plain JSON number; self-describing on the wire, so never tagged.
    Number,
    String,
    Int64,
    Double,
    Timestamp,
    Bytes,
    Location,
    Asset,
    Reference,
}

impl ValueKind {
    pub const ALL: [ValueKind; 9] = [
        ValueKind::Number,
        ValueKind::String,
        ValueKind::Int64,
        ValueKind::Double,
        ValueKind::Timestamp,
        ValueKind::Bytes,
        ValueKind::Location,
        ValueKind::Asset,
        ValueKind::Reference,
    ];

    pub const fn scalar_tag(self) -> Option<ScalarTag> {
        match self {
            ValueKind::Number => None,
            ValueKind::String => Some(ScalarTag::String),
            ValueKind::Int64 => Some(ScalarTag::Int64),
            ValueKind::Double => Some(ScalarTag::Double),
            ValueKind::Timestamp => Some(ScalarTag::Timestamp),
            ValueKind::Bytes => Some(ScalarTag::Bytes),
            ValueKind::Location => Some(ScalarTag::Location),
            ValueKind::Asset => Some(ScalarTag::AssetId),
            ValueKind::Reference => Some(ScalarTag::Reference),
        }
    }

    pub const fn from_scalar_tag(tag: ScalarTag) -> ValueKind {
        match tag {
            ScalarTag::String => ValueKind::String,
            ScalarTag::Int64 => ValueKind::Int64,
            ScalarTag::Double => ValueKind::Double,
            ScalarTag::Timestamp => ValueKind::Timestamp,
            ScalarTag::Bytes => ValueKind::Bytes,
            ScalarTag::Location => ValueKind::Location,
            ScalarTag::AssetId => ValueKind::Asset,
            ScalarTag::Reference => ValueKind::Reference,
        }
    }

    pub const fn tag(self) -> Option<FieldTag> {
        match self.scalar_tag() {
            Some(scalar) => Some(FieldTag::Scalar(scalar)),
            None => None,
        }
    }

    pub const fn list_tag(self) -> Option<FieldTag> {
        FieldTag::list_of(self.scalar_tag())
    }
}
