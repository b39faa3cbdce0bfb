// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plants, devices and schedule programs.

use serde::{Deserialize, Serialize};

use super::{PlantId, SubscriptionId, WebhookId};

/// A plant as listed by the device API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    /// Plant identifier.
    pub id: PlantId,
    /// Display name, when the provider sends one.
    #[serde(default)]
    pub name: Option<String>,
}

/// A device (module) listed in a plant topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDevice {
    /// Module identifier, unique within the plant.
    pub id: String,
    /// User-facing device name.
    pub name: String,
    /// Device kind, e.g. `chronothermostat`.
    #[serde(default)]
    pub device: Option<String>,
}

/// A schedule program stored on a thermostat.
///
/// Program number `0` is the manual/off mode and is never offered to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Program number.
    pub number: u32,
    /// Program name.
    #[serde(default)]
    pub name: String,
}

impl Program {
    /// Number reserved for manual/off mode.
    pub const MANUAL: u32 = 0;

    /// Returns true if this is a user-defined schedule.
    #[must_use]
    pub fn is_schedule(&self) -> bool {
        self.number != Self::MANUAL
    }
}

/// A device found during discovery, offered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThermostatCandidate {
    /// Plant the device belongs to.
    pub plant_id: PlantId,
    /// Module identifier of the device.
    pub device_id: String,
    /// Display name, used as the selection key.
    pub name: String,
    /// Webhook id minted for this device at discovery time.
    pub webhook_id: WebhookId,
    /// User schedules, program 0 excluded.
    pub programs: Vec<Program>,
}

impl ThermostatCandidate {
    /// Turns the candidate into a selected thermostat carrying the outcome
    /// of its subscription.
    #[must_use]
    pub fn select(self, subscription_id: Option<SubscriptionId>) -> SelectedThermostat {
        SelectedThermostat {
            plant_id: self.plant_id,
            device_id: self.device_id,
            name: self.name,
            webhook_id: self.webhook_id,
            programs: self.programs,
            subscription_id,
        }
    }
}

/// A thermostat the user chose to add.
///
/// `subscription_id` is `None` when the C2C subscription could not be
/// registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedThermostat {
    /// Plant the device belongs to.
    pub plant_id: PlantId,
    /// Module identifier of the device.
    pub device_id: String,
    /// Display name.
    pub name: String,
    /// Webhook id the provider pushes events to.
    pub webhook_id: WebhookId,
    /// User schedules, program 0 excluded.
    pub programs: Vec<Program>,
    /// Provider subscription id.
    pub subscription_id: Option<SubscriptionId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_program_is_not_a_schedule() {
        let manual = Program {
            number: 0,
            name: "Manual".to_string(),
        };
        let comfort = Program {
            number: 1,
            name: "Comfort".to_string(),
        };
        assert!(!manual.is_schedule());
        assert!(comfort.is_schedule());
    }

    #[test]
    fn plant_name_is_optional() {
        let plant: Plant = serde_json::from_str(r#"{"id":"p-1"}"#).unwrap();
        assert_eq!(plant.id, PlantId::new("p-1"));
        assert!(plant.name.is_none());
    }

    #[test]
    fn select_keeps_candidate_fields() {
        let webhook_id = WebhookId::generate();
        let candidate = ThermostatCandidate {
            plant_id: PlantId::new("p-1"),
            device_id: "d-1".to_string(),
            name: "Living Room".to_string(),
            webhook_id: webhook_id.clone(),
            programs: vec![],
        };

        let selected = candidate.select(Some(SubscriptionId::new("sub-1")));
        assert_eq!(selected.name, "Living Room");
        assert_eq!(selected.webhook_id, webhook_id);
        assert_eq!(selected.subscription_id, Some(SubscriptionId::new("sub-1")));
    }
}
