//! Authenticated request context for the hub.

use reqwest::header::{
    ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, SET_COOKIE, USER_AGENT,
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::HubTransport;
use crate::config::{AuthMethod, Credentials, HubConfig};
use crate::constants::{
    BEARER_COOKIE, CSRF_HEADER, HUB_MEDIA_TYPE, LOGIN_PATH, TOKEN_AUTH_PATH,
};
use crate::core::HubError;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Media type of the token exchange response.
const TOKEN_MEDIA_TYPE: &str = "application/vnd.blackducksoftware.user-4+json";

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "bearerToken")]
    bearer_token: String,
}

/// An authenticated connection to a hub server.
///
/// Holds the normalized base URL, the default headers (including the bearer
/// token), the TLS verification flag and the request timeout. A session is
/// opened once per resolution and closed afterwards; closing drops the
/// credential material and makes further requests fail with
/// [`HubError::Auth`].
///
/// # Examples
///
/// ```rust,no_run
/// use bdmetrics::config::{Credentials, HubConfig};
/// use bdmetrics::hub::Session;
///
/// # async fn example() -> Result<(), bdmetrics::core::HubError> {
/// let config = HubConfig::new("https://blackduck.example.com/", Credentials::token("..."));
/// let mut session = Session::open(&config).await?;
/// assert_eq!(session.base_url(), "https://blackduck.example.com");
/// session.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    base_url: String,
    client: Client,
    headers: HeaderMap,
    verify_tls: bool,
    timeout: Duration,
    credentials: Credentials,
    closed: bool,
}

impl Session {
    /// Authenticate against the hub described by `config`.
    ///
    /// An API token is exchanged for a bearer token; otherwise a
    /// username/password login is performed.
    ///
    /// # Errors
    ///
    /// - [`HubError::Config`] if no base URL is configured or the timeout is 0
    /// - [`HubError::Auth`] if credentials are missing or rejected
    /// - [`HubError::Transport`] if the server cannot be reached
    pub async fn open(config: &HubConfig) -> Result<Self, HubError> {
        let base_url = config.normalized_base_url()?;
        let method = config.credentials.resolve()?;
        let timeout = config.checked_timeout()?;

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| transport_error(&base_url, &e))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(HUB_MEDIA_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("bdmetrics/{VERSION}"))
                .unwrap_or_else(|_| HeaderValue::from_static("bdmetrics")),
        );

        let auth_headers = match &method {
            AuthMethod::ApiToken(token) => exchange_token(&client, &base_url, token).await?,
            AuthMethod::Password {
                username,
                password,
            } => login(&client, &base_url, username, password).await?,
        };
        headers.extend(auth_headers);

        info!("Connected to Black Duck at {}", base_url);

        Ok(Self {
            base_url,
            client,
            headers,
            verify_tls: !config.insecure,
            timeout,
            credentials: config.credentials.clone(),
            closed: false,
        })
    }

    /// Base URL without a trailing separator.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether server certificates are verified.
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether [`Session::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Discard credential material and the authorization headers.
    ///
    /// Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.credentials.clear();
        self.headers.remove(AUTHORIZATION);
        self.headers.remove(CSRF_HEADER);
        self.closed = true;
        debug!("Disconnected from Black Duck at {}", self.base_url);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl HubTransport for Session {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, HubError> {
        if self.closed {
            return Err(HubError::Auth {
                reason: "session is closed".to_string(),
            });
        }

        debug!("GET {} {:?}", url, query);
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let response = check_status(url, response)?;
        response.json::<Value>().await.map_err(|e| HubError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, HubError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(HubError::Auth {
            reason: format!("server rejected the session credentials for {url}"),
        });
    }
    if !status.is_success() {
        return Err(HubError::Api {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

async fn exchange_token(client: &Client, base_url: &str, token: &str) -> Result<HeaderMap, HubError> {
    let url = format!("{base_url}{TOKEN_AUTH_PATH}");
    let response = client
        .post(&url)
        .header(AUTHORIZATION, format!("token {token}"))
        .header(ACCEPT, TOKEN_MEDIA_TYPE)
        .send()
        .await
        .map_err(|e| transport_error(&url, &e))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(HubError::Auth {
            reason: format!("API token rejected (HTTP {})", status.as_u16()),
        });
    }
    let response = check_status(&url, response)?;

    let body: TokenResponse = response.json().await.map_err(|e| HubError::Parse {
        url: url.clone(),
        message: e.to_string(),
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer_header(&body.bearer_token)?);
    Ok(headers)
}

async fn login(
    client: &Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<HeaderMap, HubError> {
    let url = format!("{base_url}{LOGIN_PATH}");
    let response = client
        .post(&url)
        .form(&[("j_username", username), ("j_password", password)])
        .send()
        .await
        .map_err(|e| transport_error(&url, &e))?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(HubError::Auth {
            reason: format!("username/password rejected (HTTP {})", status.as_u16()),
        });
    }
    let response = check_status(&url, response)?;

    let bearer = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| cookie_value(cookie, BEARER_COOKIE))
        .ok_or_else(|| HubError::Auth {
            reason: "login response did not include a bearer token".to_string(),
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer_header(bearer)?);
    if let Some(csrf) = response.headers().get(CSRF_HEADER) {
        headers.insert(HeaderName::from_static("x-csrf-token"), csrf.clone());
    }
    Ok(headers)
}

fn bearer_header(token: &str) -> Result<HeaderValue, HubError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| HubError::Auth {
        reason: "bearer token is not a valid header value".to_string(),
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Value of cookie `name` in a `Set-Cookie` header, if that is the cookie it sets.
pub(crate) fn cookie_value<'a>(set_cookie: &'a str, name: &str) -> Option<&'a str> {
    let pair = set_cookie.split(';').next()?;
    let (key, value) = pair.split_once('=')?;
    (key.trim() == name).then(|| value.trim()).filter(|v| !v.is_empty())
}

/// Flatten a reqwest error and its sources into one message.
fn transport_error(url: &str, error: &reqwest::Error) -> HubError {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    if error.is_timeout() {
        message.push_str(" (timed out)");
    }
    HubError::Transport {
        url: url.to_string(),
        message,
    }
}
