// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! OAuth token pair.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tokens obtained by exchanging an authorization code.
///
/// `Debug` output never contains the tokens themselves.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer token for the device API.
    pub access_token: String,
    /// Token used later to obtain a new access token.
    pub refresh_token: String,
    /// When `access_token` stops being accepted.
    pub access_token_expires_on: DateTime<Utc>,
}

impl TokenSet {
    /// Creates a token set.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        access_token_expires_on: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            access_token_expires_on,
        }
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_token_expires_on", &self.access_token_expires_on)
            .finish()
    }
}
