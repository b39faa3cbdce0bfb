// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive onboarding flow.
//!
//! The flow is a sequence of forms. Each call to
//! [`OnboardingFlow::submit`] answers the form currently shown and yields a
//! [`FlowResult`]: the next form, an abort, or the created entry.
//!
//! | Step                 | Answer                      | Next                    |
//! |----------------------|-----------------------------|-------------------------|
//! | `user`               | [`UserInput::Credentials`]  | `get_authorize_code`    |
//! | `get_authorize_code` | [`UserInput::Callback`]     | `select_thermostats`    |
//! | `select_thermostats` | [`UserInput::Selection`]    | entry created           |

mod form;
mod orchestrator;

pub use form::{AbortReason, FieldKind, FlowResult, Form, FormField, StepId, UserInput};
pub use orchestrator::{FlowOptions, OnboardingFlow};

/// Onboarding flow over the HTTP provider API.
#[cfg(feature = "http")]
pub type HttpOnboardingFlow<S> =
    OnboardingFlow<crate::auth::OAuthClient, crate::protocol::HttpConnector, S>;
