use crate::config::{AuthContext, ServerToServerKey};
use crate::error::{ServerError, TransportError};
use crate::transport::{Method, Transport, TransportRequest};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const DEFAULT_CLOUDKIT_BASE_URL: &str = "https://api.apple-cloudkit.com";
pub const BASE_URL_ENV: &str = "CLOUDKIT_BASE_URL";

/// Inputs to a server-to-server request signature.
#[derive(Clone, Debug)]
pub struct SigningRequest<'a> {
    pub key: &'a ServerToServerKey,
    /// Path portion of the URL, starting at `/database` or `/device`.
    pub subpath: &'a str,
    pub body: &'a [u8],
}

/// Produces the `X-Apple-CloudKit-Request-*` headers for server-to-server
/// keys. Key loading and the signature algorithm live with the implementor.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: &SigningRequest<'_>) -> Result<Vec<(String, String)>, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url)
            .field("signer", &self.signer.is_some())
            .finish()
    }
}

impl ReqwestTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a preconfigured client, e.g. one with a request timeout.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            signer: None,
        }
    }

    pub fn from_env() -> Self {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLOUDKIT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    fn endpoint(&self, subpath: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            subpath.trim_start_matches('/')
        )
    }

    fn build_url(&self, request: &TransportRequest, subpath: &str) -> Result<reqwest::Url, TransportError> {
        let mut url = reqwest::Url::parse(&self.endpoint(subpath))
            .map_err(|err| TransportError::InvalidRequest(format!("bad request url: {err}")))?;
        if let AuthContext::ApiToken(auth) = &request.auth {
            let mut query = url.query_pairs_mut();
            query.append_pair("ckAPIToken", &auth.api_token);
            if let Some(web_auth_token) = &auth.web_auth_token {
                query.append_pair("ckWebAuthToken", web_auth_token);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(
        skip(self, request),
        fields(
            server = request.endpoint.server_type.as_str(),
            path = %request.endpoint.path,
            container = %request.container_identifier,
        )
    )]
    async fn perform_request(&self, request: TransportRequest) -> Result<Value, TransportError> {
        let subpath = request.subpath();
        let url = self.build_url(&request, &subpath)?;
        let body = match &request.body {
            Some(body) => serde_json::to_vec(body)
                .map_err(|err| TransportError::InvalidRequest(format!("body encode failed: {err}")))?,
            None => Vec::new(),
        };

        let method = match request.endpoint.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        let mut builder = self.client.request(method, url);

        if let AuthContext::ServerToServer(key) = &request.auth {
            let signer = self.signer.as_ref().ok_or_else(|| {
                TransportError::Unauthorized(format!(
                    "server-to-server key {} configured without a request signer",
                    key.key_id
                ))
            })?;
            let headers = signer.sign(&SigningRequest {
                key,
                subpath: &subpath,
                body: &body,
            })?;
            for (name, value) in headers {
                builder = builder.header(name, value);
            }
        }
        if request.body.is_some() {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        debug!(method = request.endpoint.method.as_str(), "dispatching request");
        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::Network(format!("http request failed: {err}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| TransportError::Network(format!("http read body failed: {err}")))?;
        debug!(status = status.as_u16(), bytes = text.len(), "response received");

        if !status.is_success() {
            return Err(map_http_status(status, text));
        }
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&text)
            .map_err(|err| TransportError::Decode(format!("http json decode failed: {err}")))
    }
}

fn map_http_status(status: reqwest::StatusCode, body: String) -> TransportError {
    let parsed = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|document| ServerError::from_document(&document));
    if let Some(mut error) = parsed {
        error.status = Some(status.as_u16());
        return TransportError::Server(error);
    }
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            TransportError::Unauthorized(body)
        }
        reqwest::StatusCode::BAD_REQUEST => TransportError::InvalidRequest(body),
        _ => TransportError::Backend(format!("http request failed with status {status}: {body}")),
    }
}
