// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire payloads of the device API.

use serde::{Deserialize, Serialize};

use crate::types::{Plant, PlantId, Program, TopologyDevice};

/// Body of `GET /plants`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlantsPayload {
    /// Plants of the account. The provider may list the same plant twice.
    #[serde(default)]
    pub plants: Vec<Plant>,
}

/// Body of `GET /plants/{plant}/topology`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyPayload {
    /// The plant and its modules.
    pub plant: TopologyPlant,
}

/// Plant section of a topology payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyPlant {
    /// Plant identifier.
    #[serde(default)]
    pub id: Option<PlantId>,
    /// Plant name.
    #[serde(default)]
    pub name: Option<String>,
    /// Devices of the plant.
    #[serde(default)]
    pub modules: Vec<TopologyDevice>,
}

/// Body of the program list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramListPayload {
    /// One entry per addressed chronothermostat.
    #[serde(default)]
    pub chronothermostats: Vec<ChronothermostatPrograms>,
}

/// Programs of one chronothermostat.
#[derive(Debug, Clone, Deserialize)]
pub struct ChronothermostatPrograms {
    /// Programs in provider order.
    #[serde(default)]
    pub programs: Vec<Program>,
}

impl ProgramListPayload {
    /// Returns every program in provider order.
    #[must_use]
    pub fn into_programs(self) -> Vec<Program> {
        self.chronothermostats
            .into_iter()
            .flat_map(|c| c.programs)
            .collect()
    }
}

/// Body of `POST /plants/{plant}/subscription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct C2cSubscriptionRequest {
    /// Where the provider delivers events.
    #[serde(rename = "EndPointUrl")]
    pub endpoint_url: String,
}

/// Body of a `201 Created` subscription response.
#[derive(Debug, Clone, Deserialize)]
pub struct C2cSubscriptionPayload {
    /// Identifier of the new subscription.
    #[serde(rename = "subscriptionId")]
    pub subscription_id: String,
    /// Plant the subscription belongs to.
    #[serde(rename = "plantId", default)]
    pub plant_id: Option<PlantId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_payload() {
        let json = r#"{
            "plant": {
                "id": "p-1",
                "name": "Home",
                "modules": [
                    {"device": "chronothermostat", "name": "Living Room", "id": "m-1"},
                    {"device": "chronothermostat", "name": "Bedroom", "id": "m-2"}
                ]
            }
        }"#;
        let payload: TopologyPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.plant.modules.len(), 2);
        assert_eq!(payload.plant.modules[1].name, "Bedroom");
        assert_eq!(
            payload.plant.modules[0].device.as_deref(),
            Some("chronothermostat")
        );
    }

    #[test]
    fn program_list_payload_flattens() {
        let json = r#"{
            "chronothermostats": [
                {"programs": [{"number": 0, "name": "Off"}, {"number": 1, "name": "Winter"}]}
            ]
        }"#;
        let payload: ProgramListPayload = serde_json::from_str(json).unwrap();
        let programs = payload.into_programs();
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[1].name, "Winter");
    }

    #[test]
    fn subscription_request_uses_provider_field_name() {
        let request = C2cSubscriptionRequest {
            endpoint_url: "https://home.example.com/api/webhook/abc".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["EndPointUrl"], "https://home.example.com/api/webhook/abc");
    }

    #[test]
    fn subscription_payload() {
        let json = r#"{"plantId":"p-1","subscriptionId":"sub-1","EndPointUrl":"https://x"}"#;
        let payload: C2cSubscriptionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.subscription_id, "sub-1");
        assert_eq!(payload.plant_id, Some(PlantId::new("p-1")));
    }
}
