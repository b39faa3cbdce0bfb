// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-supplied application credentials.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FlowError;

/// Credentials entered on the first onboarding step.
///
/// `external_url` is the base URL under which the home-automation platform
/// is reachable from the provider's network; webhook delivery URLs are built
/// on top of it.
///
/// The `Debug` output redacts the client secret and the subscription key.
///
/// # Examples
///
/// ```
/// use bticino_x8000::types::Credentials;
///
/// let creds = Credentials::new("id", "secret", "key", "https://home.example.com:8123/");
/// assert!(creds.validate().is_ok());
/// assert_eq!(creds.external_base_url(), "https://home.example.com:8123");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// OAuth client identifier.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// API management subscription key sent with every device API call.
    pub subscription_key: String,
    /// Externally reachable base URL of the platform.
    pub external_url: String,
}

impl Credentials {
    /// Creates a credentials set.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        subscription_key: impl Into<String>,
        external_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            subscription_key: subscription_key.into(),
            external_url: external_url.into(),
        }
    }

    /// Checks that every field is filled and that `external_url` is an
    /// absolute `http`/`https` URL.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidCredentials`] naming the first bad field.
    pub fn validate(&self) -> Result<(), FlowError> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("subscription_key", &self.subscription_key),
        ] {
            if value.trim().is_empty() {
                return Err(FlowError::InvalidCredentials {
                    field,
                    message: "must not be empty".to_string(),
                });
            }
        }

        let url = Url::parse(self.external_url.trim()).map_err(|e| {
            FlowError::InvalidCredentials {
                field: "external_url",
                message: e.to_string(),
            }
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(FlowError::InvalidCredentials {
                field: "external_url",
                message: format!("expected an http(s) base URL, got {}", self.external_url),
            });
        }

        Ok(())
    }

    /// Returns `external_url` without surrounding whitespace or trailing `/`.
    #[must_use]
    pub fn external_base_url(&self) -> &str {
        self.external_url.trim().trim_end_matches('/')
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("subscription_key", &"<redacted>")
            .field("external_url", &self.external_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Credentials {
        Credentials::new("client", "secret", "key", "https://home.example.com")
    }

    #[test]
    fn valid_credentials_pass() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn empty_field_is_rejected() {
        let creds = Credentials {
            client_secret: "  ".to_string(),
            ..valid()
        };
        let err = creds.validate().unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidCredentials {
                field: "client_secret",
                ..
            }
        ));
    }

    #[test]
    fn placeholder_external_url_is_rejected() {
        let creds = Credentials {
            external_url: "My HA external url".to_string(),
            ..valid()
        };
        let err = creds.validate().unwrap_err();
        assert_eq!(err.error_key(), "invalid_external_url");
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let creds = Credentials {
            external_url: "ftp://home.example.com".to_string(),
            ..valid()
        };
        assert!(creds.validate().is_err());
    }

    #[test]
    fn external_base_url_strips_trailing_slash() {
        let creds = Credentials {
            external_url: "https://home.example.com:8123/ ".to_string(),
            ..valid()
        };
        assert_eq!(creds.external_base_url(), "https://home.example.com:8123");
    }

    #[test]
    fn debug_redacts_secrets() {
        let debug = format!("{:?}", valid());
        assert!(debug.contains("client"));
        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("\"key\""));
        assert!(debug.contains("<redacted>"));
    }
}
