// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the onboarding library.
//!
//! The hierarchy separates transport failures ([`ProtocolError`]), payload
//! decoding failures ([`ParseError`]), persistence failures ([`StoreError`])
//! and the onboarding taxonomy itself ([`FlowError`]). Each [`FlowError`]
//! knows how the flow recovers from it, see [`FlowError::recovery`].

use thiserror::Error;

use crate::flow::AbortReason;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during communication with the remote API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a remote payload.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error raised by the onboarding flow.
    #[error("flow error: {0}")]
    Flow(#[from] FlowError),

    /// Error raised while reading or writing the configuration record.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors related to communication with the provider (HTTP).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote endpoint answered with a status the caller cannot use.
    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The endpoint that answered.
        endpoint: String,
    },

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The bearer token was refused.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Errors related to decoding provider responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors raised while reading the redirect URL pasted by the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The pasted text cannot be read as a URL.
    #[error("not a valid URL: {0}")]
    InvalidUrl(String),

    /// The `code` query parameter is absent or empty.
    #[error("authorization code missing from callback URL")]
    MissingCode,

    /// The `state` query parameter is absent or empty.
    #[error("state missing from callback URL")]
    MissingState,

    /// The `state` does not belong to the pending authorization.
    #[error("state does not match the pending authorization")]
    StateMismatch,
}

/// Errors raised while exchanging an authorization code for tokens.
#[derive(Debug, Error)]
pub enum TokenExchangeError {
    /// The token endpoint refused the exchange.
    #[error("token endpoint rejected the exchange with HTTP {status}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// The response body, as returned by the provider.
        body: String,
    },

    /// The token endpoint could not be reached.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The token response could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors raised while listing plants, topologies and programs.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A listing request failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A listing payload could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors raised while registering a C2C subscription for one device.
///
/// These never abort onboarding: the device is persisted without a
/// subscription id.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The provider answered with something other than `201 Created`.
    #[error("subscription rejected with HTTP {status}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
    },

    /// The subscription endpoint could not be reached.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The subscription response could not be decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors related to persisting the configuration record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A configuration record already exists.
    #[error("a configuration entry already exists")]
    AlreadyConfigured,

    /// No configuration directory could be determined.
    #[error("could not determine config directory")]
    NoConfigDir,

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors of the onboarding flow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A configuration entry already exists for this installation.
    #[error("already configured")]
    ConfigurationConflict,

    /// A credentials form field was rejected.
    #[error("invalid {field}: {message}")]
    InvalidCredentials {
        /// The offending form field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// The pasted callback URL was unusable.
    #[error("invalid callback: {0}")]
    InvalidCallback(#[from] CallbackError),

    /// The authorization code could not be exchanged.
    #[error("token exchange failed: {0}")]
    TokenExchange(#[from] TokenExchangeError),

    /// Tokens were issued but the device API refused or did not answer.
    #[error("device API health check failed")]
    AuthHealthCheckFailure,

    /// Plant, topology or program listing failed.
    #[error("device discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// The account holds no device.
    #[error("no thermostat found on the account")]
    NoDevicesFound,

    /// The selection form was submitted with nothing chosen.
    #[error("no thermostat selected")]
    NothingSelected,

    /// Input was submitted for a step that is not the current one.
    #[error("unexpected input: expected {expected}, got {received}")]
    UnexpectedInput {
        /// What the current step accepts.
        expected: &'static str,
        /// What was submitted.
        received: &'static str,
    },
}

/// Where the flow goes after a [`FlowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Show the same step again with an error message.
    RetryStep,
    /// Go back to the credentials form, pre-filled with the previous values.
    RestartFromCredentials,
    /// End the flow.
    Abort(AbortReason),
}

impl FlowError {
    /// Returns how the flow recovers from this error.
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::ConfigurationConflict => Recovery::Abort(AbortReason::SingleInstanceAllowed),
            Self::InvalidCredentials { .. }
            | Self::InvalidCallback(_)
            | Self::NothingSelected
            | Self::UnexpectedInput { .. } => Recovery::RetryStep,
            Self::TokenExchange(_) => Recovery::RestartFromCredentials,
            Self::AuthHealthCheckFailure => Recovery::Abort(AbortReason::AuthFailed),
            Self::Discovery(_) => Recovery::Abort(AbortReason::CannotConnect),
            Self::NoDevicesFound => Recovery::Abort(AbortReason::NoDevicesFound),
        }
    }

    /// Returns the key under which a recoverable error is shown on a form.
    #[must_use]
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::ConfigurationConflict => "single_instance_allowed",
            Self::InvalidCredentials { field, .. } => match *field {
                "external_url" => "invalid_external_url",
                _ => "missing_field",
            },
            Self::InvalidCallback(CallbackError::StateMismatch) => "state_mismatch",
            Self::InvalidCallback(_) => "invalid_callback",
            Self::TokenExchange(_) => "token_exchange_failed",
            Self::AuthHealthCheckFailure => "auth_failed",
            Self::Discovery(_) => "cannot_connect",
            Self::NoDevicesFound => "no_devices_found",
            Self::NothingSelected => "no_thermostats_selected",
            Self::UnexpectedInput { .. } => "unexpected_input",
        }
    }

    /// Returns the form field the error belongs to, `base` for the whole form.
    #[must_use]
    pub fn form_field(&self) -> &'static str {
        match self {
            Self::InvalidCredentials { field, .. } => field,
            _ => "base",
        }
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
