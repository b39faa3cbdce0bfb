// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device discovery.
//!
//! Discovery runs once tokens have been obtained:
//!
//! 1. [`DeviceDiscovery::health_check`] probes the device API
//! 2. [`DeviceDiscovery::list_plants`] lists the plants, removing duplicates
//! 3. [`DeviceDiscovery::get_topology`] lists the devices of each plant,
//!    minting a [`WebhookId`] per device and fetching its schedule programs
//!
//! Plants are queried one after the other and the whole run fails if any
//! listing fails; partial results are never returned.
//!
//! # Examples
//!
//! ```no_run
//! use bticino_x8000::discovery::DeviceDiscovery;
//! use bticino_x8000::protocol::ThermostatApi;
//!
//! # async fn example(api: impl ThermostatApi) -> Result<(), bticino_x8000::error::FlowError> {
//! let candidates = DeviceDiscovery::new(&api).run().await?;
//! for candidate in &candidates {
//!     println!("{} ({} programs)", candidate.name, candidate.programs.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;

use crate::error::{DiscoveryError, FlowError};
use crate::protocol::{PlantsPayload, ProgramListPayload, ThermostatApi, TopologyPayload};
use crate::types::{Plant, PlantId, Program, ThermostatCandidate, WebhookId};

const STATUS_OK: u16 = 200;

/// Drops the reserved manual/off program (number 0), keeping order.
///
/// # Examples
///
/// ```
/// use bticino_x8000::discovery::filter_programs;
/// use bticino_x8000::types::Program;
///
/// let programs = vec![
///     Program { number: 0, name: "Off".into() },
///     Program { number: 1, name: "Winter".into() },
/// ];
/// let filtered = filter_programs(programs);
/// assert_eq!(filtered.len(), 1);
/// assert_eq!(filtered[0].name, "Winter");
/// ```
#[must_use]
pub fn filter_programs(mut programs: Vec<Program>) -> Vec<Program> {
    programs.retain(Program::is_schedule);
    programs
}

/// Returns plant identifiers with duplicates removed, in first-seen order.
#[must_use]
pub fn dedup_plants(plants: Vec<Plant>) -> Vec<PlantId> {
    let mut seen = HashSet::new();
    plants
        .into_iter()
        .map(|plant| plant.id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Discovers the devices reachable with an authenticated API client.
#[derive(Debug)]
pub struct DeviceDiscovery<'a, A> {
    api: &'a A,
    minted: HashSet<WebhookId>,
}

impl<'a, A: ThermostatApi> DeviceDiscovery<'a, A> {
    /// Creates a discovery over `api`.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            minted: HashSet::new(),
        }
    }

    /// Probes the device API.
    ///
    /// A probe that cannot be sent counts as unhealthy.
    pub async fn health_check(&self) -> bool {
        match self.api.check_health().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!(error = %e, "Device API health probe failed");
                false
            }
        }
    }

    /// Lists the plants of the account, deduplicated.
    ///
    /// # Errors
    ///
    /// Returns error if the listing fails or cannot be decoded.
    pub async fn list_plants(&self) -> Result<Vec<PlantId>, DiscoveryError> {
        let response = self
            .api
            .plants()
            .await?
            .expect_status(STATUS_OK, "plants")?;
        let payload: PlantsPayload = response.parse()?;

        let listed = payload.plants.len();
        let plants = dedup_plants(payload.plants);
        tracing::debug!(listed, unique = plants.len(), "Listed plants");

        Ok(plants)
    }

    /// Lists the devices of a plant as selection candidates.
    ///
    /// # Errors
    ///
    /// Returns error if the topology or a program list cannot be retrieved.
    pub async fn get_topology(
        &mut self,
        plant_id: &PlantId,
    ) -> Result<Vec<ThermostatCandidate>, DiscoveryError> {
        let response = self
            .api
            .topology(plant_id)
            .await?
            .expect_status(STATUS_OK, "topology")?;
        let payload: TopologyPayload = response.parse()?;

        let mut candidates = Vec::with_capacity(payload.plant.modules.len());
        for device in payload.plant.modules {
            let webhook_id = self.mint_webhook_id();
            let programs = self.get_programs(plant_id, &device.id).await?;

            tracing::debug!(
                plant_id = %plant_id,
                device_id = %device.id,
                programs = programs.len(),
                "Discovered device"
            );

            candidates.push(ThermostatCandidate {
                plant_id: plant_id.clone(),
                device_id: device.id,
                name: device.name,
                webhook_id,
                programs,
            });
        }

        Ok(candidates)
    }

    /// Retrieves the schedule programs of a device, without program 0.
    ///
    /// # Errors
    ///
    /// Returns error if the program list cannot be retrieved.
    pub async fn get_programs(
        &self,
        plant_id: &PlantId,
        device_id: &str,
    ) -> Result<Vec<Program>, DiscoveryError> {
        let response = self
            .api
            .program_list(plant_id, device_id)
            .await?
            .expect_status(STATUS_OK, "program list")?;
        let payload: ProgramListPayload = response.parse()?;

        Ok(filter_programs(payload.into_programs()))
    }

    /// Runs the full discovery: health check, plants, then every topology.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::AuthHealthCheckFailure`] if the probe fails and
    /// [`FlowError::Discovery`] if any listing fails.
    pub async fn run(mut self) -> Result<Vec<ThermostatCandidate>, FlowError> {
        if !self.health_check().await {
            return Err(FlowError::AuthHealthCheckFailure);
        }

        let plants = self.list_plants().await?;

        let mut candidates = Vec::new();
        for plant_id in &plants {
            candidates.extend(self.get_topology(plant_id).await?);
        }

        tracing::info!(
            plants = plants.len(),
            devices = candidates.len(),
            "Device discovery complete"
        );

        Ok(candidates)
    }

    fn mint_webhook_id(&mut self) -> WebhookId {
        loop {
            let id = WebhookId::generate();
            if self.minted.insert(id.clone()) {
                return id;
            }
        }
    }
}
