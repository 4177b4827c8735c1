//! `reqwest` transport for the identity endpoints and REST resources.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use portal::api::{self, AuthApi, LOGIN_PATH, ME_PATH, SIGNUP_PATH};
use portal::endpoints::{Endpoint, Method};
use portal::types::{AuthResponse, Credentials, IdentityPayload, SignupProfile};
use portal::ApiError;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client bound to one API base URL.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("portal-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a resource request and return the JSON body (`null` when empty).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for transport failures, non-success statuses and
    /// bodies that are not JSON.
    pub async fn send(&self, endpoint: &Endpoint, token: Option<&str>, body: Option<&Value>) -> Result<Value, ApiError> {
        let url = api::join_url(&self.base_url, &endpoint.path);
        tracing::debug!(method = ?endpoint.method, %url, "api request");
        let mut request = self.client.request(to_reqwest(endpoint.method), &url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, api::bearer(token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let text = read_body(request).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        api::decode_body(&text)
    }

    async fn get_json(&self, path: &str, token: &str) -> Result<String, ApiError> {
        let request = self
            .client
            .get(api::join_url(&self.base_url, path))
            .header(AUTHORIZATION, api::bearer(token));
        read_body(request).await
    }

    async fn post_json<B: serde::Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let request = self.client.post(api::join_url(&self.base_url, path)).json(body);
        read_body(request).await
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn transport_error(error: &reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Transport("request timed out".to_owned())
    } else {
        ApiError::Transport(error.to_string())
    }
}

async fn read_body(request: reqwest::RequestBuilder) -> Result<String, ApiError> {
    let response = request.send().await.map_err(|e| transport_error(&e))?;
    let status = response.status();
    let text = response.text().await.map_err(|e| transport_error(&e))?;
    if !status.is_success() {
        return Err(api::status_error(status.as_u16(), &text));
    }
    Ok(text)
}

#[async_trait::async_trait(?Send)]
impl AuthApi for HttpApi {
    async fn me(&self, token: &str) -> Result<IdentityPayload, ApiError> {
        let body = self.get_json(ME_PATH, token).await?;
        api::decode_body(&body)
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let body = self.post_json(LOGIN_PATH, credentials).await?;
        api::decode_body(&body)
    }

    async fn signup(&self, profile: &SignupProfile) -> Result<AuthResponse, ApiError> {
        let body = self.post_json(SIGNUP_PATH, profile).await?;
        api::decode_body(&body)
    }
}
