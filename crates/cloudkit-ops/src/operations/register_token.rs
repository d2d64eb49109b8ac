use crate::config::Environment;
use crate::error::OperationError;
use crate::operation::RemoteOperation;
use crate::operations::token::PushTokenInfo;
use crate::transport::{Endpoint, Method};
use base64::Engine;
use serde_json::{Value, json};
use tracing::debug;

/// Registers an APNs device token for push delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterTokenOperation {
    pub apns_environment: Environment,
    pub apns_token: Vec<u8>,
}

impl RegisterTokenOperation {
    pub fn new(apns_environment: Environment, apns_token: impl Into<Vec<u8>>) -> Self {
        Self {
            apns_environment,
            apns_token: apns_token.into(),
        }
    }
}

impl RemoteOperation for RegisterTokenOperation {
    type Output = Option<PushTokenInfo>;
    type Item = ();
    const NAME: &'static str = "register_token";

    fn endpoint(&self) -> Endpoint {
        Endpoint::device(Method::Post, "tokens/register")
    }

    fn body(&self) -> Option<Value> {
        Some(json!({
            "apnsEnvironment": self.apns_environment.as_str(),
            "apnsToken": base64::engine::general_purpose::STANDARD.encode(&self.apns_token),
        }))
    }

    fn interpret(
        &self,
        document: Value,
        _items: &mut Vec<Result<(), OperationError>>,
    ) -> Result<Self::Output, OperationError> {
        let info = PushTokenInfo::from_document(&document);
        if info.is_none() {
            debug!(operation = Self::NAME, "token registration response was not a token document");
        }
        Ok(info)
    }
}
