//! reqwest-based panel API client.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use reseller_panel_core::{KeyBatch, LicenseKey, SessionToken, Transaction, UserProfile};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{ApiError, Credentials, ImportSummary, LoginResponse, PanelApi};
use crate::config::PanelConfig;

const LOGIN_PATH: &str = "auth/login";
const PROFILE_PATH: &str = "auth/profile";
const ADMIN_VERIFY_PATH: &str = "admin/verify";
const TRANSACTIONS_PATH: &str = "admin/transactions";
const KEY_IMPORT_PATH: &str = "admin/keys/import";

/// HTTP client for the panel API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpPanelApi {
    inner: Arc<HttpPanelApiInner>,
}

struct HttpPanelApiInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpPanelApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPanelApi")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

/// Loose shape of an error body; anything may be missing.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    transactions: Vec<Transaction>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct KeyImportRequest<'a> {
    product: &'a str,
    keys: Vec<&'a str>,
}

impl HttpPanelApi {
    /// Create a client for the API at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Request` if the HTTP client cannot be built.
    pub fn new(config: &PanelConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpPanelApiInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn authorized_get(&self, path: &str, token: &SessionToken) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .inner
            .client
            .get(self.endpoint(path)?)
            .bearer_auth(token.expose()))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }
}

/// Turn a status and body into the envelope's `data`, or an error.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if !status.is_success() {
        let message = error_message(body);
        return Err(match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden(
                message.unwrap_or_else(|| "admin access required".to_string()),
            ),
            _ => {
                warn!(status = status.as_u16(), "Panel API request failed");
                ApiError::Status {
                    status: status.as_u16(),
                    message: message.unwrap_or_else(|| "no details".to_string()),
                }
            }
        });
    }

    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

    if !envelope.success {
        return Err(ApiError::Api(
            envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string()),
        ));
    }

    envelope
        .data
        .ok_or_else(|| ApiError::InvalidResponse("missing data".to_string()))
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

impl PanelApi for HttpPanelApi {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(LOGIN_PATH)?)
            .json(&LoginRequest {
                username: &credentials.username,
                password: credentials.password.expose_secret(),
            });

        let response: LoginResponse = self.send(request).await?;
        debug!(user_id = %response.user.id, role = %response.user.role, "Logged in");
        Ok(response)
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, token: &SessionToken) -> Result<UserProfile, ApiError> {
        let data: UserData = self.send(self.authorized_get(PROFILE_PATH, token)?).await?;
        Ok(data.user)
    }

    #[instrument(skip_all)]
    async fn verify_admin(&self, token: &SessionToken) -> Result<UserProfile, ApiError> {
        let data: UserData = self
            .send(self.authorized_get(ADMIN_VERIFY_PATH, token)?)
            .await?;
        debug!(user_id = %data.user.id, role = %data.user.role, "Admin verification answered");
        Ok(data.user)
    }

    #[instrument(skip_all)]
    async fn list_transactions(&self, token: &SessionToken) -> Result<Vec<Transaction>, ApiError> {
        let data: TransactionsData = self
            .send(self.authorized_get(TRANSACTIONS_PATH, token)?)
            .await?;
        debug!(count = data.transactions.len(), "Fetched transactions");
        Ok(data.transactions)
    }

    #[instrument(skip(self, token, batch), fields(keys = batch.len()))]
    async fn import_keys(
        &self,
        token: &SessionToken,
        product: &str,
        batch: &KeyBatch,
    ) -> Result<ImportSummary, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(KEY_IMPORT_PATH)?)
            .bearer_auth(token.expose())
            .json(&KeyImportRequest {
                product,
                keys: batch.keys().iter().map(LicenseKey::as_str).collect(),
            });

        self.send(request).await
    }
}
