use std::fmt;
use std::str::FromStr;

pub const CONTAINER_ENV: &str = "CLOUDKIT_CONTAINER";
pub const ENVIRONMENT_ENV: &str = "CLOUDKIT_ENVIRONMENT";
pub const APNS_ENVIRONMENT_ENV: &str = "CLOUDKIT_APNS_ENVIRONMENT";
pub const API_TOKEN_ENV: &str = "CLOUDKIT_API_TOKEN";
pub const KEY_ID_ENV: &str = "CLOUDKIT_KEY_ID";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),
    #[error("unknown environment '{0}' (expected development or production)")]
    InvalidEnvironment(String),
    #[error("container '{0}' has no api token or server-to-server key")]
    MissingAuth(String),
}

/// Server-side environment of a container, also used for APNs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "development" => Some(Self::Development),
            "production" => Some(Self::Production),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw.trim()).ok_or_else(|| ConfigError::InvalidEnvironment(raw.to_string()))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiTokenAuth {
    pub api_token: String,
    /// Per-user token obtained through the web sign-in flow.
    pub web_auth_token: Option<String>,
}

impl fmt::Debug for ApiTokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiTokenAuth")
            .field("api_token", &"<redacted>")
            .field("web_auth_token", &self.web_auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Identifies a server-to-server key. Loading and using the private key is
/// left to the transport's [`RequestSigner`](crate::http::RequestSigner).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerToServerKey {
    pub key_id: String,
    pub private_key_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthContext {
    ApiToken(ApiTokenAuth),
    ServerToServer(ServerToServerKey),
}

impl AuthContext {
    pub fn api_token(token: impl Into<String>) -> Self {
        Self::ApiToken(ApiTokenAuth {
            api_token: token.into(),
            web_auth_token: None,
        })
    }

    pub fn server_to_server(key_id: impl Into<String>) -> Self {
        Self::ServerToServer(ServerToServerKey {
            key_id: key_id.into(),
            private_key_path: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerConfig {
    pub container_identifier: String,
    pub environment: Environment,
    pub apns_environment: Environment,
    pub auth: AuthContext,
}

impl ContainerConfig {
    /// The APNs environment follows `environment` unless overridden.
    pub fn new(
        container_identifier: impl Into<String>,
        environment: Environment,
        auth: AuthContext,
    ) -> Self {
        Self {
            container_identifier: container_identifier.into(),
            environment,
            apns_environment: environment,
            auth,
        }
    }

    pub fn with_apns_environment(mut self, apns_environment: Environment) -> Self {
        self.apns_environment = apns_environment;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let container_identifier = value(CONTAINER_ENV).ok_or(ConfigError::Missing(CONTAINER_ENV))?;
        let environment = match value(ENVIRONMENT_ENV) {
            Some(raw) => raw.parse()?,
            None => Environment::default(),
        };
        let auth = if let Some(token) = value(API_TOKEN_ENV) {
            AuthContext::api_token(token)
        } else if let Some(key_id) = value(KEY_ID_ENV) {
            AuthContext::server_to_server(key_id)
        } else {
            return Err(ConfigError::MissingAuth(container_identifier));
        };

        let mut config = Self::new(container_identifier, environment, auth);
        if let Some(raw) = value(APNS_ENVIRONMENT_ENV) {
            config.apns_environment = raw.parse()?;
        }
        Ok(config)
    }
}

/// The set of containers an application talks to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloudConfig {
    pub containers: Vec<ContainerConfig>,
}

impl CloudConfig {
    pub fn new(containers: Vec<ContainerConfig>) -> Self {
        Self { containers }
    }

    pub fn single(container: ContainerConfig) -> Self {
        Self::new(vec![container])
    }

    pub fn container(&self, container_identifier: &str) -> Option<&ContainerConfig> {
        self.containers
            .iter()
            .find(|config| config.container_identifier == container_identifier)
    }

    pub fn auth_context(&self, container_identifier: &str) -> Option<&AuthContext> {
        self.container(container_identifier).map(|config| &config.auth)
    }

    pub fn default_container(&self) -> Option<&ContainerConfig> {
        self.containers.first()
    }
}
