// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The persisted configuration record.

use serde::{Deserialize, Serialize};

use super::{Credentials, SelectedThermostat, TokenSet};

/// Result of a completed onboarding.
///
/// Credentials and tokens are flattened so the stored document reads
/// `client_id`, `client_secret`, `subscription_key`, `external_url`,
/// `access_token`, `refresh_token`, `access_token_expires_on`,
/// `selected_thermostats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Credentials entered by the user.
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Tokens obtained during onboarding.
    #[serde(flatten)]
    pub tokens: TokenSet,
    /// Selected thermostats, in discovery order.
    pub selected_thermostats: Vec<SelectedThermostat>,
}

impl ConfigRecord {
    /// Returns the selected thermostat with the given display name.
    #[must_use]
    pub fn thermostat(&self, name: &str) -> Option<&SelectedThermostat> {
        self.selected_thermostats.iter().find(|t| t.name == name)
    }
}
