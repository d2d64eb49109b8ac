use crate::config::{AuthContext, ContainerConfig, Environment};
use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Web-service protocol version segment.
pub const API_VERSION: &str = "1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Which of the two service front ends handles the request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerType {
    Database,
    Device,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Device => "device",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DatabaseScope {
    #[default]
    Public,
    Private,
    Shared,
}

impl DatabaseScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Shared => "shared",
        }
    }
}

/// Where an operation sends its request, relative to the container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub server_type: ServerType,
    pub database_scope: Option<DatabaseScope>,
    pub path: String,
}

impl Endpoint {
    pub fn device(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            server_type: ServerType::Device,
            database_scope: None,
            path: path.into(),
        }
    }

    pub fn database(method: Method, scope: DatabaseScope, path: impl Into<String>) -> Self {
        Self {
            method,
            server_type: ServerType::Database,
            database_scope: Some(scope),
            path: path.into(),
        }
    }
}

/// A single outbound call, fully bound to a container.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub endpoint: Endpoint,
    pub body: Option<Value>,
    pub container_identifier: String,
    pub environment: Environment,
    pub auth: AuthContext,
}

impl TransportRequest {
    pub fn new(endpoint: Endpoint, body: Option<Value>, container: &ContainerConfig) -> Self {
        Self {
            endpoint,
            body,
            container_identifier: container.container_identifier.clone(),
            environment: container.environment,
            auth: container.auth.clone(),
        }
    }

    /// `/{server}/1/{container}/{environment}[/{scope}]/{path}`
    pub fn subpath(&self) -> String {
        let mut subpath = format!(
            "/{}/{}/{}/{}",
            self.endpoint.server_type.as_str(),
            API_VERSION,
            self.container_identifier,
            self.environment.as_str()
        );
        if let Some(scope) = self.endpoint.database_scope {
            subpath.push('/');
            subpath.push_str(scope.as_str());
        }
        subpath.push('/');
        subpath.push_str(self.endpoint.path.trim_start_matches('/'));
        subpath
    }
}

/// Performs one request and yields the parsed response document.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform_request(&self, request: TransportRequest) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn perform_request(&self, request: TransportRequest) -> Result<Value, TransportError> {
        (**self).perform_request(request).await
    }
}
