// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The onboarding state machine.

use crate::auth::{PendingAuthorization, TokenExchanger, TokenRequest, parse_callback};
use crate::config::ProviderConfig;
use crate::discovery::DeviceDiscovery;
use crate::error::{Error, FlowError, Recovery, StoreError};
use crate::protocol::ApiConnector;
use crate::store::ConfigStore;
use crate::subscription::SubscriptionManager;
use crate::types::{ConfigRecord, Credentials, ThermostatCandidate, TokenSet};

use super::form::{FlowResult, Form, FormField, StepId, UserInput};

/// Default entry title.
const DEFAULT_TITLE: &str = "Bticino X8000";

/// Shown in the external URL field when the platform does not know it.
const EXTERNAL_URL_PROMPT: &str =
    "Home external URL, e.g. https://home.example.com:8123 (include the port unless it is 443)";

/// Options supplied by the hosting platform.
#[derive(Debug, Clone)]
pub struct FlowOptions {
    external_url: Option<String>,
    title: String,
}

impl FlowOptions {
    /// Creates default options: no known external URL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the platform's external URL, used to pre-fill the credentials form.
    #[must_use]
    pub fn with_external_url(mut self, url: impl Into<String>) -> Self {
        self.external_url = Some(url.into());
        self
    }

    /// Sets the title of the created entry.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns the platform's external URL, if known.
    #[must_use]
    pub fn external_url(&self) -> Option<&str> {
        self.external_url.as_deref()
    }

    /// Returns the entry title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            external_url: None,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Session data of the device selection step.
struct DeviceSelection<A> {
    credentials: Credentials,
    tokens: TokenSet,
    api: A,
    candidates: Vec<ThermostatCandidate>,
}

/// Where the session currently stands.
///
/// Token exchange and discovery are not states of their own: they run while
/// the callback answer is being handled.
enum FlowState<A> {
    Idle,
    User {
        previous: Option<Credentials>,
    },
    AwaitingCallback {
        credentials: Credentials,
        authorization: PendingAuthorization,
    },
    SelectingDevices(Box<DeviceSelection<A>>),
    Done,
}

impl<A> FlowState<A> {
    fn step(&self) -> Option<StepId> {
        match self {
            Self::User { .. } => Some(StepId::User),
            Self::AwaitingCallback { .. } => Some(StepId::GetAuthorizeCode),
            Self::SelectingDevices(_) => Some(StepId::SelectThermostats),
            Self::Idle | Self::Done => None,
        }
    }

    fn expects(&self) -> &'static str {
        match self {
            Self::Idle => "start",
            Self::User { .. } => "credentials",
            Self::AwaitingCallback { .. } => "callback",
            Self::SelectingDevices(_) => "selection",
            Self::Done => "nothing",
        }
    }

    fn credentials(&self) -> Option<&Credentials> {
        match self {
            Self::User { previous } => previous.as_ref(),
            Self::AwaitingCallback { credentials, .. } => Some(credentials),
            Self::SelectingDevices(selection) => Some(&selection.credentials),
            Self::Idle | Self::Done => None,
        }
    }
}

/// Guided onboarding session.
///
/// Drives the user from credentials to a persisted [`ConfigRecord`]:
///
/// 1. [`start`](Self::start) shows the credentials form, or aborts with
///    `single_instance_allowed` if an entry already exists
/// 2. submitting credentials shows the authorization link and a field for
///    the callback URL
/// 3. submitting the callback URL verifies it, exchanges the code, discovers
///    devices and shows them as a multi-select, all pre-checked
/// 4. submitting the selection subscribes each chosen device and persists
///    the record
///
/// Recoverable errors re-show a form with an error message: a bad callback
/// URL re-shows the callback form, a rejected code goes back to the
/// credentials form pre-filled with the previous answers. A failed health
/// check or device listing aborts the session.
///
/// Each session owns its state; abandoning it is a matter of dropping the
/// flow. Nothing is persisted before the last step.
///
/// # Examples
///
/// ```no_run
/// use bticino_x8000::flow::{FlowOptions, FlowResult, OnboardingFlow, UserInput};
/// use bticino_x8000::store::MemoryStore;
/// use bticino_x8000::types::Credentials;
/// use bticino_x8000::ProviderConfig;
///
/// # async fn example() -> bticino_x8000::Result<()> {
/// let options = FlowOptions::new().with_external_url("https://home.example.com");
/// let mut flow = OnboardingFlow::http(ProviderConfig::default(), options, MemoryStore::new())?;
///
/// let _credentials_form = flow.start().await?;
/// let result = flow
///     .submit(UserInput::Credentials(Credentials::new(
///         "client-id",
///         "client-secret",
///         "subscription-key",
///         "https://home.example.com",
///     )))
///     .await?;
///
/// if let FlowResult::Form(form) = result {
///     println!("Open {}", form.placeholder("authorization_url").unwrap_or_default());
/// }
/// # Ok(())
/// # }
/// ```
pub struct OnboardingFlow<X, C: ApiConnector, S> {
    config: ProviderConfig,
    options: FlowOptions,
    exchanger: X,
    connector: C,
    store: S,
    state: FlowState<C::Api>,
}

#[cfg(feature = "http")]
impl<S: ConfigStore> OnboardingFlow<crate::auth::OAuthClient, crate::protocol::HttpConnector, S> {
    /// Creates a flow talking to the provider over HTTP.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn http(
        config: ProviderConfig,
        options: FlowOptions,
        store: S,
    ) -> Result<Self, crate::error::ProtocolError> {
        let exchanger = crate::auth::OAuthClient::new(&config)?;
        let connector = crate::protocol::HttpConnector::new(config.clone());
        Ok(Self::new(config, options, exchanger, connector, store))
    }
}

impl<X, C, S> OnboardingFlow<X, C, S>
where
    X: TokenExchanger,
    C: ApiConnector,
    S: ConfigStore,
{
    /// Creates a flow from its collaborators.
    #[must_use]
    pub fn new(
        config: ProviderConfig,
        options: FlowOptions,
        exchanger: X,
        connector: C,
        store: S,
    ) -> Self {
        Self {
            config,
            options,
            exchanger,
            connector,
            store,
            state: FlowState::Idle,
        }
    }

    /// Returns the step waiting for input, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<StepId> {
        self.state.step()
    }

    /// Returns true once the flow has aborted or created its entry.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, FlowState::Done)
    }

    /// Returns the configuration store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts the session.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be queried.
    pub async fn start(&mut self) -> Result<FlowResult, Error> {
        if self.store.has_entry().await? {
            return Ok(self.recover(FlowError::ConfigurationConflict, FlowState::Done));
        }

        tracing::debug!("Starting onboarding");
        self.state = FlowState::User { previous: None };
        Ok(FlowResult::Form(self.user_form(None, None)))
    }

    /// Submits the answers of the current form.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::UnexpectedInput`] if `input` does not answer the
    /// current step (the session is left as it was). Other errors (store or
    /// client construction failures) end the session.
    pub async fn submit(&mut self, input: UserInput) -> Result<FlowResult, Error> {
        let state = std::mem::replace(&mut self.state, FlowState::Done);

        match (state, input) {
            (FlowState::User { .. }, UserInput::Credentials(credentials)) => {
                self.on_credentials(credentials)
            }
            (
                FlowState::AwaitingCallback {
                    credentials,
                    authorization,
                },
                UserInput::Callback { browser_url },
            ) => {
                self.on_callback(credentials, authorization, &browser_url)
                    .await
            }
            (
                FlowState::SelectingDevices(selection),
                UserInput::Selection {
                    selected_thermostats,
                },
            ) => self.on_selection(*selection, &selected_thermostats).await,
            (state, input) => {
                let error = FlowError::UnexpectedInput {
                    expected: state.expects(),
                    received: input.kind(),
                };
                self.state = state;
                Err(error.into())
            }
        }
    }

    fn on_credentials(&mut self, credentials: Credentials) -> Result<FlowResult, Error> {
        if let Err(e) = credentials.validate() {
            return Ok(self.recover(
                e,
                FlowState::User {
                    previous: Some(credentials),
                },
            ));
        }

        let authorization = match PendingAuthorization::new(&self.config, &credentials.client_id) {
            Ok(authorization) => authorization,
            Err(e) => {
                self.state = FlowState::User {
                    previous: Some(credentials),
                };
                return Err(e.into());
            }
        };

        tracing::debug!(client_id = %credentials.client_id, "Authorization URL ready");

        let form = Self::callback_form(&authorization, None);
        self.state = FlowState::AwaitingCallback {
            credentials,
            authorization,
        };
        Ok(FlowResult::Form(form))
    }

    async fn authorize(
        &self,
        credentials: &Credentials,
        authorization: &PendingAuthorization,
        browser_url: &str,
    ) -> Result<TokenSet, FlowError> {
        let callback = parse_callback(browser_url)?;
        let code = authorization.verify(&callback)?;

        let request = TokenRequest {
            client_id: &credentials.client_id,
            client_secret: &credentials.client_secret,
            redirect_uri: self.config.redirect_uri(),
            code,
        };
        Ok(self.exchanger.exchange_code(&request).await?)
    }

    async fn on_callback(
        &mut self,
        credentials: Credentials,
        authorization: PendingAuthorization,
        browser_url: &str,
    ) -> Result<FlowResult, Error> {
        let tokens = match self.authorize(&credentials, &authorization, browser_url).await {
            Ok(tokens) => tokens,
            Err(e) => {
                return Ok(self.recover(
                    e,
                    FlowState::AwaitingCallback {
                        credentials,
                        authorization,
                    },
                ));
            }
        };

        tracing::info!(expires_on = %tokens.access_token_expires_on, "Obtained access tokens");

        let api = self.connector.connect(&credentials, &tokens)?;
        let discovered = DeviceDiscovery::new(&api)
            .run()
            .await
            .and_then(|candidates| {
                if candidates.is_empty() {
                    Err(FlowError::NoDevicesFound)
                } else {
                    Ok(candidates)
                }
            });

        let candidates = match discovered {
            Ok(candidates) => candidates,
            Err(e) => {
                return Ok(self.recover(
                    e,
                    FlowState::User {
                        previous: Some(credentials),
                    },
                ));
            }
        };

        let form = Self::selection_form(&candidates, None);
        self.state = FlowState::SelectingDevices(Box::new(DeviceSelection {
            credentials,
            tokens,
            api,
            candidates,
        }));
        Ok(FlowResult::Form(form))
    }

    async fn on_selection(
        &mut self,
        selection: DeviceSelection<C::Api>,
        names: &[String],
    ) -> Result<FlowResult, Error> {
        let chosen: Vec<ThermostatCandidate> = selection
            .candidates
            .iter()
            .filter(|c| names.contains(&c.name))
            .cloned()
            .collect();

        if chosen.is_empty() {
            return Ok(self.recover(
                FlowError::NothingSelected,
                FlowState::SelectingDevices(Box::new(selection)),
            ));
        }

        if self.store.has_entry().await? {
            return Ok(self.recover(FlowError::ConfigurationConflict, FlowState::Done));
        }

        let DeviceSelection {
            credentials,
            tokens,
            api,
            ..
        } = selection;

        let selected_thermostats = SubscriptionManager::new(&api, credentials.external_base_url())
            .with_webhook_path(self.config.webhook_path())
            .subscribe_all(chosen)
            .await;

        let record = ConfigRecord {
            credentials,
            tokens,
            selected_thermostats,
        };

        match self.store.create_entry(&record).await {
            Ok(()) => {}
            Err(StoreError::AlreadyConfigured) => {
                return Ok(self.recover(FlowError::ConfigurationConflict, FlowState::Done));
            }
            Err(e) => return Err(e.into()),
        }

        let subscribed = record
            .selected_thermostats
            .iter()
            .filter(|t| t.subscription_id.is_some())
            .count();
        tracing::info!(
            thermostats = record.selected_thermostats.len(),
            subscribed,
            "Created configuration entry"
        );

        Ok(FlowResult::CreateEntry {
            title: self.options.title().to_string(),
            data: record,
        })
    }

    /// Applies the recovery of `error`; `retry` is the state to return to
    /// when the same step is shown again.
    fn recover(&mut self, error: FlowError, retry: FlowState<C::Api>) -> FlowResult {
        match error.recovery() {
            Recovery::RetryStep => {
                tracing::warn!(error = %error, "Step failed, asking again");
                let form = self.form_for(&retry, &error);
                self.state = retry;
                FlowResult::Form(form)
            }
            Recovery::RestartFromCredentials => {
                tracing::warn!(error = %error, "Authorization failed, restarting from credentials");
                let previous = retry.credentials().cloned();
                let form = self.user_form(previous.as_ref(), Some(&error));
                self.state = FlowState::User { previous };
                FlowResult::Form(form)
            }
            Recovery::Abort(reason) => {
                tracing::error!(error = %error, reason = %reason, "Onboarding aborted");
                self.state = FlowState::Done;
                FlowResult::Abort { reason }
            }
        }
    }

    fn form_for(&self, state: &FlowState<C::Api>, error: &FlowError) -> Form {
        match state {
            FlowState::AwaitingCallback { authorization, .. } => {
                Self::callback_form(authorization, Some(error))
            }
            FlowState::SelectingDevices(selection) => {
                Self::selection_form(&selection.candidates, Some(error))
            }
            FlowState::User { previous } => self.user_form(previous.as_ref(), Some(error)),
            FlowState::Idle | FlowState::Done => self.user_form(None, Some(error)),
        }
    }

    fn user_form(&self, previous: Option<&Credentials>, error: Option<&FlowError>) -> Form {
        let value = |get: fn(&Credentials) -> String| previous.map(get).unwrap_or_default();
        let external_url = previous
            .map(|c| c.external_url.clone())
            .or_else(|| self.options.external_url().map(str::to_string))
            .unwrap_or_else(|| EXTERNAL_URL_PROMPT.to_string());

        let form = Form::new(StepId::User)
            .with_field(FormField::text(
                "client_id",
                "Client ID",
                value(|c| c.client_id.clone()),
            ))
            .with_field(FormField::secret(
                "client_secret",
                "Client Secret",
                value(|c| c.client_secret.clone()),
            ))
            .with_field(FormField::secret(
                "subscription_key",
                "Subscription Key",
                value(|c| c.subscription_key.clone()),
            ))
            .with_field(FormField::text(
                "external_url",
                "External URL",
                external_url,
            ));

        with_flow_error(form, error)
    }

    fn callback_form(authorization: &PendingAuthorization, error: Option<&FlowError>) -> Form {
        let form = Form::new(StepId::GetAuthorizeCode)
            .with_placeholder("authorization_url", authorization.url())
            .with_field(FormField::text(
                "browser_url",
                "Paste here the browser URL",
                "",
            ));

        with_flow_error(form, error)
    }

    fn selection_form(candidates: &[ThermostatCandidate], error: Option<&FlowError>) -> Form {
        let mut names: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !names.contains(&candidate.name) {
                names.push(candidate.name.clone());
            }
        }

        let form = Form::new(StepId::SelectThermostats).with_field(FormField::multi_select(
            "selected_thermostats",
            "Select Thermostats",
            names.clone(),
            &names,
        ));

        with_flow_error(form, error)
    }
}

fn with_flow_error(form: Form, error: Option<&FlowError>) -> Form {
    match error {
        Some(e) => form.with_error(e.form_field(), e.error_key()),
        None => form,
    }
}
