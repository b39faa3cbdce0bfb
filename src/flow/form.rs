// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prompts shown to the user and the answers they send back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ConfigRecord, Credentials};

/// Interactive steps of the onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    /// Credentials form.
    User,
    /// Authorization link and callback URL field.
    GetAuthorizeCode,
    /// Device multi-select.
    SelectThermostats,
}

impl StepId {
    /// Returns the step identifier as used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::GetAuthorizeCode => "get_authorize_code",
            Self::SelectThermostats => "select_thermostats",
        }
    }
}

/// Why a flow ended without creating an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// A configuration entry already exists.
    SingleInstanceAllowed,
    /// Tokens were issued but the device API is unusable.
    AuthFailed,
    /// Device listing failed.
    CannotConnect,
    /// The account has no device.
    NoDevicesFound,
}

impl AbortReason {
    /// Returns the reason as used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleInstanceAllowed => "single_instance_allowed",
            Self::AuthFailed => "auth_failed",
            Self::CannotConnect => "cannot_connect",
            Self::NoDevicesFound => "no_devices_found",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Free text that should be masked.
    Secret,
    /// Any subset of `options`.
    MultiSelect {
        /// Selectable values.
        options: Vec<String>,
    },
}

/// A form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    /// Key of the answer.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Whether an answer is required.
    pub required: bool,
    /// Pre-filled value.
    pub default: serde_json::Value,
}

impl FormField {
    /// Creates a required text field.
    #[must_use]
    pub fn text(name: &str, label: &str, default: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            required: true,
            default: serde_json::Value::String(default.into()),
        }
    }

    /// Creates a required masked text field.
    #[must_use]
    pub fn secret(name: &str, label: &str, default: impl Into<String>) -> Self {
        Self {
            kind: FieldKind::Secret,
            ..Self::text(name, label, default)
        }
    }

    /// Creates a multi-select field with `defaults` pre-checked.
    #[must_use]
    pub fn multi_select(
        name: &str,
        label: &str,
        options: Vec<String>,
        defaults: &[String],
    ) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::MultiSelect { options },
            required: true,
            default: serde_json::Value::from(defaults.to_vec()),
        }
    }
}

/// A prompt shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Form {
    /// Step this form belongs to.
    pub step_id: StepId,
    /// Fields to fill.
    pub fields: Vec<FormField>,
    /// Errors of the previous submission, keyed by field (`base` for the form).
    pub errors: BTreeMap<String, String>,
    /// Values substituted into the step description (e.g. `authorization_url`).
    pub description_placeholders: BTreeMap<String, String>,
}

impl Form {
    /// Creates an empty form for `step_id`.
    #[must_use]
    pub fn new(step_id: StepId) -> Self {
        Self {
            step_id,
            fields: Vec::new(),
            errors: BTreeMap::new(),
            description_placeholders: BTreeMap::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds an error under `key`.
    #[must_use]
    pub fn with_error(mut self, key: &str, error: &str) -> Self {
        self.errors.insert(key.to_string(), error.to_string());
        self
    }

    /// Adds a description placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, key: &str, value: impl Into<String>) -> Self {
        self.description_placeholders
            .insert(key.to_string(), value.into());
        self
    }

    /// Returns the field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the error stored under `key`.
    #[must_use]
    pub fn error(&self, key: &str) -> Option<&str> {
        self.errors.get(key).map(String::as_str)
    }

    /// Returns the placeholder stored under `key`.
    #[must_use]
    pub fn placeholder(&self, key: &str) -> Option<&str> {
        self.description_placeholders.get(key).map(String::as_str)
    }
}

/// Outcome of a flow step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    /// Ask the user to fill a form.
    Form(Form),
    /// The flow ended without creating an entry.
    Abort {
        /// Why it ended.
        reason: AbortReason,
    },
    /// The flow completed and the entry was persisted.
    CreateEntry {
        /// Entry title.
        title: String,
        /// The persisted record.
        data: ConfigRecord,
    },
}

impl FlowResult {
    /// Returns the form, if this result asks for one.
    #[must_use]
    pub fn as_form(&self) -> Option<&Form> {
        match self {
            Self::Form(form) => Some(form),
            _ => None,
        }
    }
}

/// Answers submitted for a form.
///
/// Deserializes from the raw form answers: the variant is recognised by its
/// field names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserInput {
    /// Answers of the credentials form.
    Credentials(Credentials),
    /// Answer of the callback form.
    Callback {
        /// Address the browser was redirected to.
        browser_url: String,
    },
    /// Answer of the device multi-select.
    Selection {
        /// Display names of the chosen devices.
        selected_thermostats: Vec<String>,
    },
}

impl UserInput {
    /// Creates a callback answer.
    #[must_use]
    pub fn callback(browser_url: impl Into<String>) -> Self {
        Self::Callback {
            browser_url: browser_url.into(),
        }
    }

    /// Creates a selection answer.
    #[must_use]
    pub fn selection<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Selection {
            selected_thermostats: names.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "credentials",
            Self::Callback { .. } => "callback",
            Self::Selection { .. } => "selection",
        }
    }
}
