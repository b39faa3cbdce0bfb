// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Access to the remote device API.
//!
//! The onboarding flow only talks to the provider through the
//! [`ThermostatApi`] trait, which keeps the state machine independent from
//! the transport. [`HttpApi`] is the bearer-authenticated reqwest
//! implementation; an [`ApiConnector`] builds one once tokens exist.
//!
//! Responses come back as raw [`ApiResponse`] values and are decoded into the
//! typed payloads of this module by their consumers.

#[cfg(feature = "http")]
mod http;
mod payload;

#[cfg(feature = "http")]
pub use http::{HttpApi, HttpConnector};
pub use payload::{
    C2cSubscriptionPayload, C2cSubscriptionRequest, ChronothermostatPrograms, PlantsPayload,
    ProgramListPayload, TopologyPayload, TopologyPlant,
};

use crate::error::{ParseError, ProtocolError};
use crate::types::{Credentials, PlantId, TokenSet};

/// Response from the device API.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    /// Creates a response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails unless the status is exactly `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedStatus`] naming `endpoint`.
    pub fn expect_status(self, expected: u16, endpoint: &str) -> Result<Self, ProtocolError> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(ProtocolError::UnexpectedStatus {
                status: self.status,
                endpoint: endpoint.to_string(),
            })
        }
    }

    /// Parses the body as a specific type.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON cannot be parsed into the target type.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

/// Operations of the device API used during onboarding.
#[allow(async_fn_in_trait)]
pub trait ThermostatApi {
    /// Probes the API with the current tokens.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the probe cannot be sent.
    async fn check_health(&self) -> Result<bool, ProtocolError>;

    /// Lists the plants of the account.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    async fn plants(&self) -> Result<ApiResponse, ProtocolError>;

    /// Lists the devices of a plant.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    async fn topology(&self, plant_id: &PlantId) -> Result<ApiResponse, ProtocolError>;

    /// Lists the schedule programs stored on a device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    async fn program_list(
        &self,
        plant_id: &PlantId,
        module_id: &str,
    ) -> Result<ApiResponse, ProtocolError>;

    /// Registers a C2C push subscription for a plant.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails.
    async fn subscribe_c2c(
        &self,
        plant_id: &PlantId,
        request: &C2cSubscriptionRequest,
    ) -> Result<ApiResponse, ProtocolError>;
}

/// Builds an authenticated [`ThermostatApi`] once tokens are available.
pub trait ApiConnector {
    /// The API client produced.
    type Api: ThermostatApi;

    /// Creates a client acting with `tokens` on behalf of `credentials`.
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be created.
    fn connect(&self, credentials: &Credentials, tokens: &TokenSet)
    -> Result<Self::Api, ProtocolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(201, "").is_success());
        assert!(!ApiResponse::new(404, "").is_success());
    }

    #[test]
    fn expect_status_names_endpoint() {
        let err = ApiResponse::new(500, "")
            .expect_status(200, "/plants")
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedStatus { status: 500, ref endpoint } if endpoint == "/plants"
        ));
    }

    #[test]
    fn parse_typed_body() {
        let response = ApiResponse::new(200, r#"{"plants":[{"id":"p-1","name":"Home"}]}"#);
        let payload: PlantsPayload = response.parse().unwrap();
        assert_eq!(payload.plants.len(), 1);
        assert_eq!(payload.plants[0].id.as_str(), "p-1");
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let response = ApiResponse::new(200, "not json");
        assert!(response.parse::<PlantsPayload>().is_err());
    }
}
