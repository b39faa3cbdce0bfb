// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OAuth2 authorization-code flow.
//!
//! The flow is browser mediated and manual: the user opens the URL built by
//! [`PendingAuthorization`], authorizes the application, then pastes the
//! address the provider redirected to. [`parse_callback`] extracts `code`
//! and `state` from it, [`PendingAuthorization::verify`] checks the `state`,
//! and a [`TokenExchanger`] trades the code for a [`TokenSet`].
//!
//! ```
//! use bticino_x8000::ProviderConfig;
//! use bticino_x8000::auth::{PendingAuthorization, parse_callback};
//!
//! let config = ProviderConfig::default();
//! let pending = PendingAuthorization::new(&config, "my-client-id").unwrap();
//! println!("Open {}", pending.url());
//!
//! let pasted = format!("https://localhost/?code=abc&state={}", pending.state().as_str());
//! let callback = parse_callback(&pasted).unwrap();
//! let code = pending.verify(&callback).unwrap();
//! assert_eq!(code, "abc");
//! ```
//!
//! [`TokenSet`]: crate::types::TokenSet

mod authorize;
mod callback;
mod token;

pub use authorize::{AuthorizationState, PendingAuthorization, authorization_url};
pub use callback::{AuthorizationCallback, parse_callback};
#[cfg(feature = "http")]
pub use token::OAuthClient;
pub use token::{TokenExchanger, TokenRequest, parse_token_response};
