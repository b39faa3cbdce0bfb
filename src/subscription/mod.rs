// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cloud-to-cloud (C2C) push subscriptions.
//!
//! For each selected device, the provider is asked to push events to
//! `{external_url}/api/webhook/{webhook_id}`. A subscription that fails is
//! not retried and does not stop the others: the device is kept with no
//! subscription id, and re-running the onboarding is the recovery path.
//!
//! ```no_run
//! use bticino_x8000::subscription::SubscriptionManager;
//! use bticino_x8000::protocol::ThermostatApi;
//! use bticino_x8000::types::{PlantId, WebhookId};
//!
//! # async fn example(api: impl ThermostatApi) {
//! let manager = SubscriptionManager::new(&api, "https://home.example.com:8123");
//! let webhook_id = WebhookId::generate();
//!
//! match manager.subscribe(&PlantId::new("plant"), &webhook_id).await {
//!     Some(id) => println!("subscribed: {id}"),
//!     None => println!("no subscription"),
//! }
//! # }
//! ```

use crate::config::ProviderConfig;
use crate::error::SubscriptionError;
use crate::protocol::{C2cSubscriptionPayload, C2cSubscriptionRequest, ThermostatApi};
use crate::types::{PlantId, SelectedThermostat, SubscriptionId, ThermostatCandidate, WebhookId};

const STATUS_CREATED: u16 = 201;

/// Registers webhook subscriptions with the provider.
#[derive(Debug)]
pub struct SubscriptionManager<'a, A> {
    api: &'a A,
    external_url: String,
    webhook_path: String,
}

impl<'a, A: ThermostatApi> SubscriptionManager<'a, A> {
    /// Creates a manager building webhook URLs under `external_url`.
    #[must_use]
    pub fn new(api: &'a A, external_url: &str) -> Self {
        Self {
            api,
            external_url: external_url.trim().trim_end_matches('/').to_string(),
            webhook_path: ProviderConfig::DEFAULT_WEBHOOK_PATH.to_string(),
        }
    }

    /// Overrides the webhook path (default `/api/webhook/`).
    #[must_use]
    pub fn with_webhook_path(mut self, path: impl Into<String>) -> Self {
        self.webhook_path = path.into();
        self
    }

    /// Returns the delivery URL registered for `webhook_id`.
    #[must_use]
    pub fn webhook_url(&self, webhook_id: &WebhookId) -> String {
        format!("{}{}{webhook_id}", self.external_url, self.webhook_path)
    }

    /// Registers a subscription, reporting why it failed.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionError::Rejected`] for any status but 201, or a
    /// transport/decoding error.
    pub async fn try_subscribe(
        &self,
        plant_id: &PlantId,
        webhook_id: &WebhookId,
    ) -> Result<SubscriptionId, SubscriptionError> {
        let request = C2cSubscriptionRequest {
            endpoint_url: self.webhook_url(webhook_id),
        };

        let response = self.api.subscribe_c2c(plant_id, &request).await?;
        if response.status() != STATUS_CREATED {
            return Err(SubscriptionError::Rejected {
                status: response.status(),
            });
        }

        let payload: C2cSubscriptionPayload = response.parse()?;
        Ok(SubscriptionId::new(payload.subscription_id))
    }

    /// Registers a subscription; `None` if it could not be registered.
    pub async fn subscribe(
        &self,
        plant_id: &PlantId,
        webhook_id: &WebhookId,
    ) -> Option<SubscriptionId> {
        match self.try_subscribe(plant_id, webhook_id).await {
            Ok(id) => {
                tracing::debug!(
                    plant_id = %plant_id,
                    subscription_id = %id,
                    "C2C subscription registered"
                );
                Some(id)
            }
            Err(e) => {
                tracing::warn!(plant_id = %plant_id, error = %e, "C2C subscription failed");
                None
            }
        }
    }

    /// Subscribes every candidate, one at a time, in order.
    pub async fn subscribe_all(
        &self,
        candidates: Vec<ThermostatCandidate>,
    ) -> Vec<SelectedThermostat> {
        let mut selected = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let subscription_id = self
                .subscribe(&candidate.plant_id, &candidate.webhook_id)
                .await;
            selected.push(candidate.select(subscription_id));
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::protocol::ApiResponse;
    use crate::testing::{FakeApi, created};

    fn candidate(plant: &str, device: &str) -> ThermostatCandidate {
        ThermostatCandidate {
            plant_id: PlantId::new(plant),
            device_id: device.to_string(),
            name: device.to_string(),
            webhook_id: WebhookId::generate(),
            programs: vec![],
        }
    }

    #[test]
    fn webhook_url_is_built_under_external_url() {
        let api = Arc::new(FakeApi::default());
        let id = WebhookId::from_string("abc123");

        let manager = SubscriptionManager::new(&api, " https://home.example.com:8123/ ");
        assert_eq!(
            manager.webhook_url(&id),
            "https://home.example.com:8123/api/webhook/abc123"
        );

        let manager = manager.with_webhook_path("/hooks/");
        assert_eq!(manager.webhook_url(&id), "https://home.example.com:8123/hooks/abc123");
    }

    #[tokio::test]
    async fn created_subscription_returns_id() {
        let api = Arc::new(FakeApi::default().with_subscription_response(created("S1")));
        let manager = SubscriptionManager::new(&api, "https://home.example.com");

        let id = manager
            .subscribe(&PlantId::new("P1"), &WebhookId::from_string("w1"))
            .await;

        assert_eq!(id, Some(SubscriptionId::new("S1")));
        assert_eq!(api.endpoints(), vec!["https://home.example.com/api/webhook/w1"]);
    }

    #[tokio::test]
    async fn other_statuses_are_rejections() {
        let api = Arc::new(
            FakeApi::default()
                .with_subscription_response(ApiResponse::new(200, r#"{"subscriptionId":"S1"}"#)),
        );
        let manager = SubscriptionManager::new(&api, "https://home.example.com");

        let err = manager
            .try_subscribe(&PlantId::new("P1"), &WebhookId::from_string("w1"))
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::Rejected { status: 200 }));
    }

    #[tokio::test]
    async fn failures_do_not_stop_later_devices() {
        let api = Arc::new(
            FakeApi::default()
                .with_subscription_response(ApiResponse::new(500, ""))
                .with_subscription_response(created("S2")),
        );
        let manager = SubscriptionManager::new(&api, "https://home.example.com");

        let selected = manager
            .subscribe_all(vec![candidate("P1", "D1"), candidate("P2", "D2")])
            .await;

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].subscription_id, None);
        assert_eq!(selected[1].subscription_id, Some(SubscriptionId::new("S2")));
        assert_eq!(api.calls(), vec!["subscribe:P1", "subscribe:P2"]);
    }
}
