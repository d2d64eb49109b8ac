use crate::config::{ConfigError, ContainerConfig};
use crate::http::ReqwestTransport;
use crate::operation::{Operation, OperationHandle, RemoteOperation};
use crate::transport::Transport;
use std::sync::Arc;

/// A configured container plus the transport its operations run over.
#[derive(Clone)]
pub struct Container {
    config: ContainerConfig,
    transport: Arc<dyn Transport>,
}

impl Container {
    pub fn new(config: ContainerConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            ContainerConfig::from_env()?,
            Arc::new(ReqwestTransport::from_env()),
        ))
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Runs the operation to completion on the current task.
    pub async fn execute<R: RemoteOperation>(&self, operation: Operation<R>) {
        operation
            .execute(self.transport.as_ref(), &self.config)
            .await;
    }

    /// Runs the operation on its own tokio task.
    pub fn spawn<R: RemoteOperation>(&self, operation: Operation<R>) -> OperationHandle {
        let handle = operation.handle();
        let container = self.clone();
        tokio::spawn(async move {
            container.execute(operation).await;
        });
        handle
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
