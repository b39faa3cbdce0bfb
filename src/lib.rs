// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `bticino_x8000` - Onboarding for BTicino X8000 smart thermostats.
//!
//! This library connects a home-automation installation to the Legrand/BTicino
//! cloud: it obtains OAuth2 tokens, discovers the thermostats of the account
//! and registers cloud-to-cloud (C2C) webhook subscriptions for the ones the
//! user selects. The result is a persisted [`ConfigRecord`](types::ConfigRecord).
//!
//! # Steps
//!
//! - **Credentials**: client id, client secret, API subscription key and the
//!   externally reachable base URL of the installation
//! - **Authorization**: the user opens the authorization link, consents, and
//!   pastes back the URL the browser was redirected to
//! - **Discovery**: plants, their devices and each device's schedule programs
//! - **Selection**: the chosen devices are subscribed and the entry is saved
//!
//! # Quick Start
//!
//! ```no_run
//! use bticino_x8000::flow::{FlowOptions, FlowResult, OnboardingFlow, UserInput};
//! use bticino_x8000::store::JsonFileStore;
//! use bticino_x8000::types::Credentials;
//! use bticino_x8000::ProviderConfig;
//!
//! #[tokio::main]
//! async fn main() -> bticino_x8000::Result<()> {
//!     let store = JsonFileStore::default_location()?;
//!     let mut flow = OnboardingFlow::http(ProviderConfig::default(), FlowOptions::new(), store)?;
//!
//!     let mut result = flow.start().await?;
//!     result = flow
//!         .submit(UserInput::Credentials(Credentials::new(
//!             "client-id",
//!             "client-secret",
//!             "subscription-key",
//!             "https://home.example.com:8123",
//!         )))
//!         .await?;
//!
//!     // Show the link, let the user consent, read back the redirect URL
//!     let browser_url = String::from("https://localhost/?code=...&state=...");
//!     result = flow.submit(UserInput::callback(browser_url)).await?;
//!
//!     if let FlowResult::Form(form) = &result {
//!         println!("{:?}", form.field("selected_thermostats"));
//!     }
//!     result = flow.submit(UserInput::selection(["Living Room"])).await?;
//!
//!     if let FlowResult::CreateEntry { data, .. } = result {
//!         println!("{} thermostats configured", data.selected_thermostats.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `http` (default): reqwest clients for the token endpoint and the device
//!   API. Without it, bring your own [`TokenExchanger`](auth::TokenExchanger)
//!   and [`ApiConnector`](protocol::ApiConnector).

pub mod auth;
mod config;
pub mod discovery;
pub mod error;
pub mod flow;
pub mod protocol;
pub mod store;
pub mod subscription;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::ProviderConfig;
pub use error::{
    CallbackError, DiscoveryError, Error, FlowError, ParseError, ProtocolError, Recovery, Result,
    StoreError, SubscriptionError, TokenExchangeError,
};
#[cfg(feature = "http")]
pub use flow::HttpOnboardingFlow;
pub use flow::{AbortReason, FlowOptions, FlowResult, OnboardingFlow, StepId, UserInput};
pub use store::{ConfigStore, JsonFileStore, MemoryStore};
pub use types::{ConfigRecord, Credentials, SelectedThermostat, TokenSet};
