use crate::config::{ContainerConfig, Environment};
use crate::error::OperationError;
use crate::operation::RemoteOperation;
use crate::operations::token::PushTokenInfo;
use crate::transport::{Endpoint, Method};
use serde_json::{Value, json};

/// Asks the service to mint an APNs token for web push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTokenOperation {
    pub apns_environment: Environment,
}

impl CreateTokenOperation {
    pub fn new(apns_environment: Environment) -> Self {
        Self { apns_environment }
    }

    pub fn for_container(container: &ContainerConfig) -> Self {
        Self::new(container.apns_environment)
    }
}

impl RemoteOperation for CreateTokenOperation {
    type Output = Option<PushTokenInfo>;
    type Item = ();
    const NAME: &'static str = "create_token";

    fn endpoint(&self) -> Endpoint {
        Endpoint::device(Method::Post, "tokens/create")
    }

    fn body(&self) -> Option<Value> {
        Some(json!({ "apnsEnvironment": self.apns_environment.as_str() }))
    }

    fn interpret(
        &self,
        document: Value,
        _items: &mut Vec<Result<(), OperationError>>,
    ) -> Result<Self::Output, OperationError> {
        Ok(PushTokenInfo::from_document(&document))
    }
}
