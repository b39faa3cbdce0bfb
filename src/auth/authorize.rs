// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authorization URL and anti-forgery state.

use std::fmt::Write as _;

use rand::RngCore as _;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{CallbackError, ProtocolError};

use super::AuthorizationCallback;

/// Random token binding a callback to the authorization attempt that
/// produced it.
///
/// Carries 128 bits of entropy, hex encoded (32 lowercase characters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationState(String);

impl AuthorizationState {
    /// Number of random bytes behind a state token.
    pub const ENTROPY_BYTES: usize = 16;

    /// Generates a fresh state token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::ENTROPY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let hex = bytes
            .iter()
            .fold(String::with_capacity(Self::ENTROPY_BYTES * 2), |mut s, b| {
                let _ = write!(s, "{b:02x}");
                s
            });
        Self(hex)
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Builds the provider authorization URL.
///
/// The query carries exactly `client_id`, `response_type=code`, `state` and
/// `redirect_uri`, each percent-encoded.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidAddress`] if the configured authorization
/// endpoint is not an absolute URL.
pub fn authorization_url(
    config: &ProviderConfig,
    client_id: &str,
    state: &AuthorizationState,
) -> Result<String, ProtocolError> {
    let endpoint = config.authorization_endpoint();
    let url = Url::parse_with_params(
        &endpoint,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("state", state.as_str()),
            ("redirect_uri", config.redirect_uri()),
        ],
    )
    .map_err(|e| ProtocolError::InvalidAddress(format!("{endpoint}: {e}")))?;

    Ok(url.into())
}

/// An authorization attempt waiting for its callback.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    state: AuthorizationState,
    url: String,
}

impl PendingAuthorization {
    /// Starts an authorization attempt with a fresh state token.
    ///
    /// # Errors
    ///
    /// Returns error if the authorization URL cannot be built.
    pub fn new(config: &ProviderConfig, client_id: &str) -> Result<Self, ProtocolError> {
        let state = AuthorizationState::generate();
        let url = authorization_url(config, client_id, &state)?;
        Ok(Self { state, url })
    }

    /// Returns the URL the user must open.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the state token of this attempt.
    #[must_use]
    pub fn state(&self) -> &AuthorizationState {
        &self.state
    }

    /// Checks that the callback belongs to this attempt and returns its
    /// authorization code.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::StateMismatch`] if the callback carries a
    /// different `state`.
    pub fn verify<'a>(
        &self,
        callback: &'a AuthorizationCallback,
    ) -> Result<&'a str, CallbackError> {
        if callback.state() != self.state.as_str() {
            return Err(CallbackError::StateMismatch);
        }
        Ok(callback.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::parse_callback;

    fn query_values(url: &str, key: &str) -> Vec<String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    #[test]
    fn state_is_32_lowercase_hex_chars() {
        let state = AuthorizationState::generate();
        assert_eq!(state.as_str().len(), 32);
        assert!(
            state
                .as_str()
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn states_differ_between_calls() {
        assert_ne!(AuthorizationState::generate(), AuthorizationState::generate());
    }

    #[test]
    fn url_carries_each_parameter_once() {
        let config = ProviderConfig::default();
        let state = AuthorizationState::generate();
        let url = authorization_url(&config, "client-42", &state).unwrap();

        assert!(url.starts_with("https://partners-login.eliotbylegrand.com/authorize?"));
        assert_eq!(query_values(&url, "client_id"), ["client-42"]);
        assert_eq!(query_values(&url, "response_type"), ["code"]);
        assert_eq!(query_values(&url, "state"), [state.as_str()]);
        assert_eq!(query_values(&url, "redirect_uri"), ["https://localhost"]);
        assert_eq!(Url::parse(&url).unwrap().query_pairs().count(), 4);
    }

    #[test]
    fn client_id_is_percent_encoded() {
        let config = ProviderConfig::default();
        let state = AuthorizationState::generate();
        let url = authorization_url(&config, "a&b=c", &state).unwrap();

        assert_eq!(query_values(&url, "client_id"), ["a&b=c"]);
        assert_eq!(Url::parse(&url).unwrap().query_pairs().count(), 4);
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let config = ProviderConfig::default().with_auth_base_url("not a url");
        let state = AuthorizationState::generate();
        assert!(matches!(
            authorization_url(&config, "client", &state),
            Err(ProtocolError::InvalidAddress(_))
        ));
    }

    #[test]
    fn verify_accepts_matching_state() {
        let pending = PendingAuthorization::new(&ProviderConfig::default(), "client").unwrap();
        let pasted = format!(
            "https://localhost/?code=ABC&state={}",
            pending.state().as_str()
        );
        let callback = parse_callback(&pasted).unwrap();
        assert_eq!(pending.verify(&callback).unwrap(), "ABC");
    }

    #[test]
    fn verify_rejects_foreign_state() {
        let pending = PendingAuthorization::new(&ProviderConfig::default(), "client").unwrap();
        let callback = parse_callback("https://localhost/?code=ABC&state=XYZ").unwrap();
        assert_eq!(
            pending.verify(&callback).unwrap_err(),
            CallbackError::StateMismatch
        );
    }
}
