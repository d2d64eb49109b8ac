use crate::error::{OperationError, ServerError};
use crate::operation::RemoteOperation;
use crate::transport::{DatabaseScope, Endpoint, Method};
use cloudkit_records::Record;
use serde_json::{Map, Value};
use tracing::debug;

/// Short identifier of a share, as found in a share URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortGuid {
    pub value: String,
    pub should_fetch_root_record: bool,
    pub root_record_desired_keys: Option<Vec<String>>,
}

impl ShortGuid {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            should_fetch_root_record: false,
            root_record_desired_keys: None,
        }
    }

    pub fn fetching_root_record(mut self, desired_keys: Option<Vec<String>>) -> Self {
        self.should_fetch_root_record = true;
        self.root_record_desired_keys = desired_keys;
        self
    }

    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        document.insert("value".to_string(), Value::String(self.value.clone()));
        document.insert(
            "shouldFetchRootRecord".to_string(),
            Value::Bool(self.should_fetch_root_record),
        );
        if let Some(keys) = &self.root_record_desired_keys {
            document.insert(
                "rootRecordDesiredKeys".to_string(),
                Value::Array(keys.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(document)
    }
}

/// One accepted share: the share record as returned by the server.
#[derive(Clone, Debug, PartialEq)]
pub struct ShareMetadata {
    pub share: Record,
    pub short_guid: Option<String>,
}

/// Accepts shares by short GUID. Each result is delivered as one item; the
/// overall completion carries no value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptSharesOperation {
    pub short_guids: Vec<ShortGuid>,
    pub database_scope: DatabaseScope,
}

impl AcceptSharesOperation {
    pub fn new(short_guids: Vec<ShortGuid>) -> Self {
        Self {
            short_guids,
            database_scope: DatabaseScope::default(),
        }
    }

    pub fn with_database_scope(mut self, database_scope: DatabaseScope) -> Self {
        self.database_scope = database_scope;
        self
    }
}

impl RemoteOperation for AcceptSharesOperation {
    type Output = ();
    type Item = ShareMetadata;
    const NAME: &'static str = "accept_shares";

    fn endpoint(&self) -> Endpoint {
        Endpoint::database(Method::Post, self.database_scope, "records/accept")
    }

    fn body(&self) -> Option<Value> {
        let guids = self.short_guids.iter().map(ShortGuid::to_document).collect();
        let mut body = Map::new();
        body.insert("shortGUIDs".to_string(), Value::Array(guids));
        Some(Value::Object(body))
    }

    fn interpret(
        &self,
        document: Value,
        items: &mut Vec<Result<ShareMetadata, OperationError>>,
    ) -> Result<(), OperationError> {
        let Some(results) = document.get("results").and_then(Value::as_array) else {
            return Ok(());
        };
        for result in results {
            if let Some(error) = ServerError::from_document(result) {
                items.push(Err(OperationError::Item(error)));
                continue;
            }
            match Record::from_document(result) {
                Ok(share) => items.push(Ok(ShareMetadata {
                    share,
                    short_guid: result
                        .get("shortGUID")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })),
                Err(error) if error.is_malformed() => {
                    debug!(operation = Self::NAME, %error, "skipping malformed share result");
                }
                Err(error) => items.push(Err(OperationError::Decode(error))),
            }
        }
        Ok(())
    }
}
