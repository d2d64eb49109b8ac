use crate::config::Environment;
use base64::Engine;
use serde_json::Value;

/// Push registration returned by the token endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushTokenInfo {
    pub apns_token: Vec<u8>,
    pub apns_environment: Environment,
    pub webcourier_url: reqwest::Url,
}

impl PushTokenInfo {
    /// All three keys are required; the token must be base64 and the URL
    /// must parse. Anything else yields `None`.
    pub fn from_document(document: &Value) -> Option<Self> {
        let apns_environment = document
            .get("apnsEnvironment")
            .and_then(Value::as_str)
            .and_then(Environment::parse)?;
        let apns_token = document
            .get("apnsToken")
            .and_then(Value::as_str)
            .and_then(|raw| base64::engine::general_purpose::STANDARD.decode(raw).ok())?;
        let webcourier_url = document
            .get("webcourierURL")
            .and_then(Value::as_str)
            .and_then(|raw| reqwest::Url::parse(raw).ok())?;
        Some(Self {
            apns_token,
            apns_environment,
            webcourier_url,
        })
    }
}
