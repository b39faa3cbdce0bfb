// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of the device API.

use reqwest::{Client, RequestBuilder, StatusCode};

use crate::config::ProviderConfig;
use crate::error::ProtocolError;
use crate::protocol::{ApiConnector, ApiResponse, C2cSubscriptionRequest, ThermostatApi};
use crate::types::{Credentials, PlantId, TokenSet};

/// Header carrying the API management subscription key.
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

const HEALTH_PATH: &str = "/status";
const PLANTS_PATH: &str = "/plants";

/// Bearer-authenticated client for the device API.
///
/// Every request carries `Authorization: Bearer <access_token>` and the
/// subscription key header. HTTP 401 is reported as
/// [`ProtocolError::AuthenticationFailed`]; any other status is handed back
/// to the caller inside the [`ApiResponse`].
///
/// # Examples
///
/// ```no_run
/// use bticino_x8000::ProviderConfig;
/// use bticino_x8000::protocol::{HttpApi, ThermostatApi};
/// use bticino_x8000::types::{Credentials, TokenSet};
///
/// # async fn example(credentials: Credentials, tokens: TokenSet) -> bticino_x8000::Result<()> {
/// let api = HttpApi::new(&ProviderConfig::default(), &credentials, &tokens)?;
/// let plants = api.plants().await?;
/// println!("{}", plants.body());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    client: Client,
    access_token: String,
    subscription_key: String,
}

impl HttpApi {
    /// Creates a client for the device API of `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        config: &ProviderConfig,
        credentials: &Credentials,
        tokens: &TokenSet,
    ) -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(Self {
            base_url: config.api_base_url().trim_end_matches('/').to_string(),
            client,
            access_token: tokens.access_token.clone(),
            subscription_key: credentials.subscription_key.clone(),
        })
    }

    /// Returns the base URL of the API.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<ApiResponse, ProtocolError> {
        tracing::debug!(path = %path, "Sending device API request");

        let response = request
            .bearer_auth(&self.access_token)
            .header(SUBSCRIPTION_KEY_HEADER, &self.subscription_key)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }

        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(path = %path, status = status.as_u16(), "Received device API response");

        Ok(ApiResponse::new(status.as_u16(), body))
    }

    async fn get(&self, path: &str) -> Result<ApiResponse, ProtocolError> {
        self.send(self.client.get(self.url(path)), path).await
    }
}

fn topology_path(plant_id: &PlantId) -> String {
    format!("/plants/{}/topology", urlencoding::encode(plant_id.as_str()))
}

fn program_list_path(plant_id: &PlantId, module_id: &str) -> String {
    format!(
        "/chronothermostat/thermoregulation/addressLocation/plants/{}/modules/parameter/id/value/{}/programlist",
        urlencoding::encode(plant_id.as_str()),
        urlencoding::encode(module_id)
    )
}

fn subscription_path(plant_id: &PlantId) -> String {
    format!("/plants/{}/subscription", urlencoding::encode(plant_id.as_str()))
}

impl ThermostatApi for HttpApi {
    async fn check_health(&self) -> Result<bool, ProtocolError> {
        match self.get(HEALTH_PATH).await {
            Ok(response) => Ok(response.is_success()),
            Err(ProtocolError::AuthenticationFailed) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn plants(&self) -> Result<ApiResponse, ProtocolError> {
        self.get(PLANTS_PATH).await
    }

    async fn topology(&self, plant_id: &PlantId) -> Result<ApiResponse, ProtocolError> {
        self.get(&topology_path(plant_id)).await
    }

    async fn program_list(
        &self,
        plant_id: &PlantId,
        module_id: &str,
    ) -> Result<ApiResponse, ProtocolError> {
        self.get(&program_list_path(plant_id, module_id)).await
    }

    async fn subscribe_c2c(
        &self,
        plant_id: &PlantId,
        request: &C2cSubscriptionRequest,
    ) -> Result<ApiResponse, ProtocolError> {
        let path = subscription_path(plant_id);
        self.send(self.client.post(self.url(&path)).json(request), &path)
            .await
    }
}

/// [`ApiConnector`] producing [`HttpApi`] clients.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: ProviderConfig,
}

impl HttpConnector {
    /// Creates a connector for the device API of `config`.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl ApiConnector for HttpConnector {
    type Api = HttpApi;

    fn connect(
        &self,
        credentials: &Credentials,
        tokens: &TokenSet,
    ) -> Result<HttpApi, ProtocolError> {
        HttpApi::new(&self.config, credentials, tokens)
    }
}
