// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by every onboarding step.
//!
//! # Types
//!
//! - [`Credentials`] - Client id/secret, subscription key and external URL
//! - [`TokenSet`] - Access/refresh token pair with its expiry
//! - [`PlantId`], [`WebhookId`], [`SubscriptionId`] - Typed identifiers
//! - [`Plant`], [`TopologyDevice`], [`Program`] - Records decoded from the device API
//! - [`ThermostatCandidate`], [`SelectedThermostat`] - Discovered and chosen devices
//! - [`ConfigRecord`] - The persisted result of a completed onboarding

mod credentials;
mod ids;
mod record;
mod thermostat;
mod token;

pub use credentials::Credentials;
pub use ids::{PlantId, SubscriptionId, WebhookId};
pub use record::ConfigRecord;
pub use thermostat::{Plant, Program, SelectedThermostat, ThermostatCandidate, TopologyDevice};
pub use token::TokenSet;
