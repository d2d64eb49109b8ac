use crate::identifiers::RecordId;
use serde_json::{Map, Value};

/// Descriptor of an uploaded file stored in an ASSETID field.
///
/// Only the descriptor travels in record documents; the binary transfer is
/// handled elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub file_checksum: String,
    pub size: u64,
    pub reference_checksum: Option<String>,
    pub wrapping_key: Option<String>,
    pub receipt: Option<String>,
    pub download_url: Option<String>,
    /// Owning record, stamped when the asset is stored in a record. Not sent
    /// on the wire.
    pub record_id: Option<RecordId>,
}

impl Asset {
    pub fn new(file_checksum: impl Into<String>, size: u64) -> Self {
        Self {
            file_checksum: file_checksum.into(),
            size,
            reference_checksum: None,
            wrapping_key: None,
            receipt: None,
            download_url: None,
            record_id: None,
        }
    }

    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        document.insert(
            "fileChecksum".to_string(),
            Value::String(self.file_checksum.clone()),
        );
        document.insert("size".to_string(), Value::from(self.size));
        let optional = [
            ("referenceChecksum", &self.reference_checksum),
            ("wrappingKey", &self.wrapping_key),
            ("receipt", &self.receipt),
            ("downloadURL", &self.download_url),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                document.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(document)
    }

    /// `fileChecksum` and `size` are required.
    pub fn from_document(document: &Value) -> Option<Self> {
        let text = |key: &str| {
            document
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Some(Self {
            file_checksum: text("fileChecksum")?,
            size: document.get("size").and_then(Value::as_u64)?,
            reference_checksum: text("referenceChecksum"),
            wrapping_key: text("wrappingKey"),
            receipt: text("receipt"),
            download_url: text("downloadURL"),
            record_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asset_document_missing_size_expected_none() {
        let document = json!({"fileChecksum": "abc", "downloadURL": "https://x/y"});
        assert_eq!(Asset::from_document(&document), None);
    }

    #[test]
    fn asset_document_with_download_url_parses() {
        let document = json!({
            "fileChecksum": "AbC=",
            "size": 2048,
            "downloadURL": "https://cvws.icloud-content.com/B/abc/${f}",
        });
        let asset = Asset::from_document(&document).expect("asset should parse");

        assert_eq!(asset.size, 2048);
        assert_eq!(
            asset.download_url.as_deref(),
            Some("https://cvws.icloud-content.com/B/abc/${f}")
        );
        assert_eq!(asset.to_document(), document);
    }
}
