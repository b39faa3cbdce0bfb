// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Provider endpoint configuration.

use std::time::Duration;

/// Endpoints and limits used to talk to the provider.
///
/// The defaults point at the production Legrand/BTicino services; tests and
/// staging setups override individual endpoints.
///
/// # Examples
///
/// ```
/// use bticino_x8000::ProviderConfig;
/// use std::time::Duration;
///
/// // Production endpoints
/// let config = ProviderConfig::default();
///
/// // Local mock server
/// let config = ProviderConfig::default()
///     .with_auth_base_url("http://127.0.0.1:8080")
///     .with_token_url("http://127.0.0.1:8080/token")
///     .with_api_base_url("http://127.0.0.1:8080/api")
///     .with_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    auth_base_url: String,
    auth_endpoint: String,
    token_url: String,
    redirect_uri: String,
    api_base_url: String,
    webhook_path: String,
    timeout: Duration,
}

impl ProviderConfig {
    /// Default authorization server.
    pub const DEFAULT_AUTH_BASE_URL: &'static str = "https://partners-login.eliotbylegrand.com";
    /// Default authorization endpoint, relative to the authorization server.
    pub const DEFAULT_AUTH_ENDPOINT: &'static str = "/authorize";
    /// Default token endpoint.
    pub const DEFAULT_TOKEN_URL: &'static str = "https://partners-login.eliotbylegrand.com/token";
    /// Default redirect URI registered for the client.
    pub const DEFAULT_REDIRECT_URI: &'static str = "https://localhost";
    /// Default device API base URL.
    pub const DEFAULT_API_BASE_URL: &'static str =
        "https://api.developer.legrand.com/smarther/v2.0";
    /// Path under the external URL where webhooks are received.
    pub const DEFAULT_WEBHOOK_PATH: &'static str = "/api/webhook/";
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Sets the authorization server base URL.
    #[must_use]
    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = url.into();
        self
    }

    /// Sets the authorization endpoint path.
    #[must_use]
    pub fn with_auth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.auth_endpoint = endpoint.into();
        self
    }

    /// Sets the token endpoint URL.
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    /// Sets the device API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Sets the webhook path appended to the external URL.
    #[must_use]
    pub fn with_webhook_path(mut self, path: impl Into<String>) -> Self {
        self.webhook_path = path.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the full authorization endpoint URL.
    #[must_use]
    pub fn authorization_endpoint(&self) -> String {
        format!("{}{}", self.auth_base_url, self.auth_endpoint)
    }

    /// Returns the token endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns the device API base URL.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Returns the webhook path.
    #[must_use]
    pub fn webhook_path(&self) -> &str {
        &self.webhook_path
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            auth_base_url: Self::DEFAULT_AUTH_BASE_URL.to_string(),
            auth_endpoint: Self::DEFAULT_AUTH_ENDPOINT.to_string(),
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            redirect_uri: Self::DEFAULT_REDIRECT_URI.to_string(),
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            webhook_path: Self::DEFAULT_WEBHOOK_PATH.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}
