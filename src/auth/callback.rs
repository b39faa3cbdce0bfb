// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of the redirect URL pasted by the user.

use std::fmt;

use url::Url;

use crate::error::CallbackError;

const RELATIVE_BASE: &str = "https://localhost/";

/// `code` and `state` extracted from a redirect URL.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationCallback {
    code: String,
    state: String,
}

impl AuthorizationCallback {
    /// Returns the authorization code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the state echoed back by the provider.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }
}

impl fmt::Debug for AuthorizationCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationCallback")
            .field("code", &"<redacted>")
            .field("state", &self.state)
            .finish()
    }
}

/// Extracts `code` and `state` from the address the browser was redirected to.
///
/// Surrounding whitespace is ignored, and so is a missing scheme:
/// `localhost/?code=..` and a bare `?code=..` are read like full URLs. When a
/// key repeats, the first non-empty value wins.
///
/// # Errors
///
/// Returns [`CallbackError::InvalidUrl`] if the input cannot be read as a URL,
/// [`CallbackError::MissingCode`] or [`CallbackError::MissingState`] if either
/// parameter is absent or empty.
///
/// # Examples
///
/// ```
/// use bticino_x8000::auth::parse_callback;
///
/// let callback = parse_callback("https://x/cb?code=ABC&state=XYZ").unwrap();
/// assert_eq!(callback.code(), "ABC");
/// assert_eq!(callback.state(), "XYZ");
///
/// assert!(parse_callback("https://x/cb?state=XYZ").is_err());
/// ```
pub fn parse_callback(input: &str) -> Result<AuthorizationCallback, CallbackError> {
    let input = input.trim();
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => parse_relative(input)?,
        Err(e) => return Err(CallbackError::InvalidUrl(e.to_string())),
    };

    let first_value = |key: &str| {
        url.query_pairs()
            .find(|(k, v)| k == key && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    };

    let code = first_value("code").ok_or(CallbackError::MissingCode)?;
    let state = first_value("state").ok_or(CallbackError::MissingState)?;

    Ok(AuthorizationCallback { code, state })
}

/// Resolves scheme-less input against a placeholder base.
fn parse_relative(input: &str) -> Result<Url, CallbackError> {
    let base = Url::parse(RELATIVE_BASE).map_err(|e| CallbackError::InvalidUrl(e.to_string()))?;
    Url::options()
        .base_url(Some(&base))
        .parse(input)
        .map_err(|e| CallbackError::InvalidUrl(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_and_state() {
        let callback = parse_callback("https://x/cb?code=ABC&state=XYZ").unwrap();
        assert_eq!(callback.code(), "ABC");
        assert_eq!(callback.state(), "XYZ");
    }

    #[test]
    fn decodes_percent_encoding() {
        let callback = parse_callback("https://localhost/?code=a%2Bb&state=s%20t").unwrap();
        assert_eq!(callback.code(), "a+b");
        assert_eq!(callback.state(), "s t");
    }

    #[test]
    fn trims_pasted_whitespace() {
        let callback = parse_callback("  https://localhost/?state=S&code=C\n").unwrap();
        assert_eq!(callback.code(), "C");
    }

    #[test]
    fn missing_code() {
        assert_eq!(
            parse_callback("https://x/cb?state=XYZ").unwrap_err(),
            CallbackError::MissingCode
        );
    }

    #[test]
    fn missing_state() {
        assert_eq!(
            parse_callback("https://x/cb?code=ABC").unwrap_err(),
            CallbackError::MissingState
        );
    }

    #[test]
    fn empty_values_count_as_missing() {
        assert_eq!(
            parse_callback("https://x/cb?code=&state=XYZ").unwrap_err(),
            CallbackError::MissingCode
        );
        assert_eq!(
            parse_callback("https://x/cb?code=ABC&state=").unwrap_err(),
            CallbackError::MissingState
        );
    }

    #[test]
    fn first_non_empty_value_wins() {
        let callback = parse_callback("https://x/cb?code=&code=ABC&state=1&state=2").unwrap();
        assert_eq!(callback.code(), "ABC");
        assert_eq!(callback.state(), "1");
    }

    #[test]
    fn no_query_at_all() {
        assert_eq!(
            parse_callback("https://x/cb").unwrap_err(),
            CallbackError::MissingCode
        );
    }

    #[test]
    fn host_without_scheme() {
        let callback = parse_callback("localhost/?code=ABC&state=XYZ").unwrap();
        assert_eq!(callback.code(), "ABC");
        assert_eq!(callback.state(), "XYZ");
    }

    #[test]
    fn bare_query_string() {
        let callback = parse_callback("?code=ABC&state=XYZ").unwrap();
        assert_eq!(callback.code(), "ABC");
        assert_eq!(callback.state(), "XYZ");
    }

    #[test]
    fn placeholder_text_has_no_code() {
        assert_eq!(
            parse_callback("Paste here the browser URL").unwrap_err(),
            CallbackError::MissingCode
        );
        assert_eq!(parse_callback("").unwrap_err(), CallbackError::MissingCode);
    }

    #[test]
    fn malformed_absolute_url() {
        assert!(matches!(
            parse_callback("https://[::1/?code=ABC&state=XYZ"),
            Err(CallbackError::InvalidUrl(_))
        ));
    }

    #[test]
    fn debug_redacts_code() {
        let callback = parse_callback("https://x/cb?code=SECRETCODE&state=XYZ").unwrap();
        assert!(!format!("{callback:?}").contains("SECRETCODE"));
    }
}
