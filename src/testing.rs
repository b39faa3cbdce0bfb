// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-process fakes of the provider.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::json;

use crate::auth::{TokenExchanger, TokenRequest};
use crate::error::{ProtocolError, TokenExchangeError};
use crate::protocol::{ApiConnector, ApiResponse, C2cSubscriptionRequest, ThermostatApi};
use crate::types::{
    ConfigRecord, Credentials, PlantId, SelectedThermostat, SubscriptionId, TokenSet, WebhookId,
};

pub(crate) fn credentials() -> Credentials {
    Credentials::new(
        "client-id",
        "client-secret",
        "subscription-key",
        "https://home.example.com",
    )
}

pub(crate) fn tokens() -> TokenSet {
    TokenSet::new(
        "tok_a",
        "tok_r",
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    )
}

pub(crate) fn sample_record() -> ConfigRecord {
    ConfigRecord {
        credentials: credentials(),
        tokens: tokens(),
        selected_thermostats: vec![SelectedThermostat {
            plant_id: PlantId::new("P1"),
            device_id: "D1".to_string(),
            name: "Living Room".to_string(),
            webhook_id: WebhookId::generate(),
            programs: vec![],
            subscription_id: Some(SubscriptionId::new("S1")),
        }],
    }
}

/// Scripted device API recording every call.
#[derive(Debug)]
pub(crate) struct FakeApi {
    healthy: bool,
    plants: ApiResponse,
    topologies: HashMap<String, ApiResponse>,
    programs: HashMap<String, ApiResponse>,
    subscriptions: Mutex<VecDeque<ApiResponse>>,
    calls: Mutex<Vec<String>>,
    endpoints: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            healthy: true,
            plants: ApiResponse::new(200, json!({"plants": []}).to_string()),
            topologies: HashMap::new(),
            programs: HashMap::new(),
            subscriptions: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            endpoints: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub(crate) fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub(crate) fn with_plants(mut self, ids: &[&str]) -> Self {
        let plants: Vec<_> = ids.iter().map(|id| json!({"id": id, "name": id})).collect();
        self.plants = ApiResponse::new(200, json!({ "plants": plants }).to_string());
        self
    }

    pub(crate) fn with_plants_response(mut self, response: ApiResponse) -> Self {
        self.plants = response;
        self
    }

    /// Adds a plant topology of `(device_id, name)` pairs.
    pub(crate) fn with_topology(mut self, plant_id: &str, devices: &[(&str, &str)]) -> Self {
        let modules: Vec<_> = devices
            .iter()
            .map(|(id, name)| json!({"id": id, "name": name, "device": "chronothermostat"}))
            .collect();
        let body = json!({"plant": {"id": plant_id, "modules": modules}});
        self.topologies
            .insert(plant_id.to_string(), ApiResponse::new(200, body.to_string()));
        self
    }

    /// Sets the programs of a device as `(number, name)` pairs.
    pub(crate) fn with_programs(mut self, device_id: &str, programs: &[(u32, &str)]) -> Self {
        let programs: Vec<_> = programs
            .iter()
            .map(|(number, name)| json!({"number": number, "name": name}))
            .collect();
        self.programs.insert(
            device_id.to_string(),
            ApiResponse::new(
                200,
                json!({"chronothermostats": [{"programs": programs}]}).to_string(),
            ),
        );
        self
    }

    /// Queues the response of the next subscription request.
    pub(crate) fn with_subscription_response(self, response: ApiResponse) -> Self {
        self.subscriptions.lock().push_back(response);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    /// Webhook URLs sent in subscription requests.
    pub(crate) fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

pub(crate) fn created(subscription_id: &str) -> ApiResponse {
    ApiResponse::new(201, json!({"subscriptionId": subscription_id}).to_string())
}

impl ThermostatApi for Arc<FakeApi> {
    async fn check_health(&self) -> Result<bool, ProtocolError> {
        self.record("health".to_string());
        Ok(self.healthy)
    }

    async fn plants(&self) -> Result<ApiResponse, ProtocolError> {
        self.record("plants".to_string());
        Ok(self.plants.clone())
    }

    async fn topology(&self, plant_id: &PlantId) -> Result<ApiResponse, ProtocolError> {
        self.record(format!("topology:{plant_id}"));
        Ok(self
            .topologies
            .get(plant_id.as_str())
            .cloned()
            .unwrap_or_else(|| ApiResponse::new(404, "")))
    }

    async fn program_list(
        &self,
        plant_id: &PlantId,
        module_id: &str,
    ) -> Result<ApiResponse, ProtocolError> {
        self.record(format!("programs:{plant_id}:{module_id}"));
        Ok(self.programs.get(module_id).cloned().unwrap_or_else(|| {
            ApiResponse::new(200, json!({"chronothermostats": [{"programs": []}]}).to_string())
        }))
    }

    async fn subscribe_c2c(
        &self,
        plant_id: &PlantId,
        request: &C2cSubscriptionRequest,
    ) -> Result<ApiResponse, ProtocolError> {
        self.record(format!("subscribe:{plant_id}"));
        self.endpoints.lock().push(request.endpoint_url.clone());
        Ok(self
            .subscriptions
            .lock()
            .pop_front()
            .unwrap_or_else(|| created("S-default")))
    }
}

/// Hands out the same [`FakeApi`].
#[derive(Debug, Clone)]
pub(crate) struct FakeConnector(pub(crate) Arc<FakeApi>);

impl ApiConnector for FakeConnector {
    type Api = Arc<FakeApi>;

    fn connect(
        &self,
        _credentials: &Credentials,
        _tokens: &TokenSet,
    ) -> Result<Arc<FakeApi>, ProtocolError> {
        Ok(Arc::clone(&self.0))
    }
}

/// Token endpoint accepting a single code.
#[derive(Debug)]
pub(crate) struct FakeExchanger {
    accepted_code: String,
    requests: Mutex<Vec<String>>,
}

impl FakeExchanger {
    pub(crate) fn accepting(code: &str) -> Self {
        Self {
            accepted_code: code.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Codes received so far.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl TokenExchanger for Arc<FakeExchanger> {
    async fn exchange_code(
        &self,
        request: &TokenRequest<'_>,
    ) -> Result<TokenSet, TokenExchangeError> {
        self.requests.lock().push(request.code.to_string());
        if request.code == self.accepted_code {
            Ok(tokens())
        } else {
            Err(TokenExchangeError::Rejected {
                status: 400,
                body: r#"{"error":"invalid_grant"}"#.to_string(),
            })
        }
    }
}
