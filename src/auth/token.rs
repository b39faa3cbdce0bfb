// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authorization code exchange.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ParseError, TokenExchangeError};
use crate::types::TokenSet;

/// Parameters of a token endpoint exchange.
#[derive(Clone, Copy)]
pub struct TokenRequest<'a> {
    /// OAuth client identifier.
    pub client_id: &'a str,
    /// OAuth client secret.
    pub client_secret: &'a str,
    /// Redirect URI used for the authorization request.
    pub redirect_uri: &'a str,
    /// Single-use authorization code.
    pub code: &'a str,
}

impl TokenRequest<'_> {
    /// Returns the form body sent to the token endpoint.
    #[must_use]
    pub fn form_params(&self) -> [(&'static str, &str); 5] {
        [
            ("grant_type", "authorization_code"),
            ("code", self.code),
            ("client_id", self.client_id),
            ("client_secret", self.client_secret),
            ("redirect_uri", self.redirect_uri),
        ]
    }
}

/// Trades an authorization code for a [`TokenSet`].
#[allow(async_fn_in_trait)]
pub trait TokenExchanger {
    /// Performs the exchange.
    ///
    /// # Errors
    ///
    /// Returns [`TokenExchangeError::Rejected`] when the provider refuses the
    /// code, or a transport/decoding error.
    async fn exchange_code(&self, request: &TokenRequest<'_>)
    -> Result<TokenSet, TokenExchangeError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_on: Option<Value>,
    expires_in: Option<Value>,
}

/// Decodes a token endpoint response body.
///
/// `expires_on` may be epoch seconds (number or digit string) or an RFC 3339
/// timestamp. Without it, `expires_in` seconds are added to `now`.
///
/// # Errors
///
/// Returns [`ParseError`] if the body is not JSON, a token is missing, or no
/// usable expiry is present.
pub fn parse_token_response(body: &str, now: DateTime<Utc>) -> Result<TokenSet, ParseError> {
    let response: TokenResponse = serde_json::from_str(body)?;

    let access_token = response
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ParseError::MissingField("access_token".to_string()))?;
    let refresh_token = response
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ParseError::MissingField("refresh_token".to_string()))?;

    let expires_on = match (response.expires_on, response.expires_in) {
        (Some(value), _) => parse_expires_on(&value)?,
        (None, Some(value)) => {
            let secs = seconds(&value, "expires_in")?;
            TimeDelta::try_seconds(secs)
                .and_then(|delta| now.checked_add_signed(delta))
                .ok_or_else(|| ParseError::InvalidValue {
                    field: "expires_in".to_string(),
                    message: format!("{secs} seconds out of range"),
                })?
        }
        (None, None) => return Err(ParseError::MissingField("expires_on".to_string())),
    };

    Ok(TokenSet::new(access_token, refresh_token, expires_on))
}

fn parse_expires_on(value: &Value) -> Result<DateTime<Utc>, ParseError> {
    if let Some(text) = value.as_str() {
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Ok(at.with_timezone(&Utc));
        }
    }

    let secs = seconds(value, "expires_on")?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| ParseError::InvalidValue {
        field: "expires_on".to_string(),
        message: format!("timestamp {secs} out of range"),
    })
}

fn seconds(value: &Value, field: &str) -> Result<i64, ParseError> {
    let invalid = || ParseError::InvalidValue {
        field: field.to_string(),
        message: format!("expected seconds, got {value}"),
    };

    match value {
        Value::Number(n) => n.as_i64().ok_or_else(invalid),
        Value::String(s) => s.trim().parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(feature = "http")]
mod http {
    use chrono::Utc;
    use reqwest::Client;
    use reqwest::header::ACCEPT;

    use super::{TokenExchanger, TokenRequest, parse_token_response};
    use crate::config::ProviderConfig;
    use crate::error::{ProtocolError, TokenExchangeError};
    use crate::types::TokenSet;

    /// [`TokenExchanger`] posting to the provider token endpoint.
    #[derive(Debug, Clone)]
    pub struct OAuthClient {
        client: Client,
        token_url: String,
    }

    impl OAuthClient {
        /// Creates a client for the token endpoint of `config`.
        ///
        /// # Errors
        ///
        /// Returns error if the HTTP client cannot be created.
        pub fn new(config: &ProviderConfig) -> Result<Self, ProtocolError> {
            let client = Client::builder()
                .timeout(config.timeout())
                .build()
                .map_err(ProtocolError::Http)?;

            Ok(Self {
                client,
                token_url: config.token_url().to_string(),
            })
        }
    }

    impl TokenExchanger for OAuthClient {
        async fn exchange_code(
            &self,
            request: &TokenRequest<'_>,
        ) -> Result<TokenSet, TokenExchangeError> {
            tracing::debug!(url = %self.token_url, "Exchanging authorization code");

            let response = self
                .client
                .post(&self.token_url)
                .header(ACCEPT, "application/json")
                .form(&request.form_params())
                .send()
                .await
                .map_err(ProtocolError::Http)?;

            let status = response.status();
            let body = response.text().await.map_err(ProtocolError::Http)?;

            if !status.is_success() {
                tracing::warn!(status = status.as_u16(), "Token endpoint rejected the code");
                return Err(TokenExchangeError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(parse_token_response(&body, Utc::now())?)
        }
    }
}

#[cfg(feature = "http")]
pub use http::OAuthClient;
