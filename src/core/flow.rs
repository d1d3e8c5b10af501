//! Setup flow
//!
//! Two-step interaction that turns operator input (or an imported record)
//! into an [`EntryDescriptor`]. The flow starts in
//! [`FlowState::AwaitingInput`]; a submission either completes it or
//! re-shows the form with an error. The import path has no form to re-show,
//! so it aborts instead.
//!
//! The duplicate check always runs before any network I/O.

use crate::config::SetupConfig;
use crate::core::classify::{classify, ErrorCode};
use crate::core::probe::Probe;
use crate::core::registry::DeviceRegistry;
use crate::core::transport::ConnectionTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Step identifier of the operator form
pub const USER_STEP_ID: &str = "user";

/// Form field that carries errors not tied to a single input
pub const BASE_ERROR_FIELD: &str = "base";

/// Flow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Waiting for a (re)submission
    AwaitingInput,
    /// An entry was produced; the flow is finished
    Completed,
}

/// Flow misuse errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlowError {
    /// A step was invoked after the flow produced its entry
    #[error("setup flow already completed")]
    AlreadyCompleted,
}

/// Form submission from an operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    /// Device host name or address
    pub host: String,
    /// Device port; the configured default applies when absent
    pub port: Option<u16>,
    /// Optional entry title
    pub display_name: Option<String>,
}

impl UserInput {
    /// Create input for `host` with no port or name
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            display_name: None,
        }
    }

    /// Set the port
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the display name
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Fully populated setup request, as supplied by an import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRequest {
    /// Device host name or address
    pub host: String,
    /// Device port
    pub port: u16,
    /// Optional entry title
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SetupRequest {
    /// Create a request with no display name
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            display_name: None,
        }
    }

    /// Set the display name
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Network target of this request
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.host.clone(), self.port)
    }
}

/// Entry handed to the host for persistence once a device validates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDescriptor {
    /// Entry title: display name, or `"host:port"`
    pub title: String,
    /// Device host
    pub host: String,
    /// Device port
    pub port: u16,
    /// Display name as supplied
    #[serde(default)]
    pub display_name: Option<String>,
}

impl EntryDescriptor {
    fn from_request(request: SetupRequest) -> Self {
        let key = request.target().key();
        let title = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or(key, str::to_string);

        Self {
            title,
            host: request.host,
            port: request.port,
            display_name: request.display_name,
        }
    }

    /// Duplicate-detection key, `"host:port"`
    pub fn key(&self) -> String {
        self.target().key()
    }

    /// Network target of this entry
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.host.clone(), self.port)
    }
}

/// Kind of value a form field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text
    String,
    /// Integer
    Integer,
}

/// One field of the setup form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name
    pub name: String,
    /// Value kind
    pub kind: FieldKind,
    /// Whether the operator must fill it in
    pub required: bool,
    /// Default for integer fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
}

/// Shape of the setup form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Fields in display order
    pub fields: Vec<SchemaField>,
}

impl SchemaDescriptor {
    /// Setup form: `host` (required), `port` (defaulted), `display_name`
    pub fn setup(config: &SetupConfig) -> Self {
        Self {
            fields: vec![
                SchemaField {
                    name: "host".to_string(),
                    kind: FieldKind::String,
                    required: true,
                    default: None,
                },
                SchemaField {
                    name: "port".to_string(),
                    kind: FieldKind::Integer,
                    required: false,
                    default: Some(i64::from(config.default_port)),
                },
                SchemaField {
                    name: "display_name".to_string(),
                    kind: FieldKind::String,
                    required: false,
                    default: None,
                },
            ],
        }
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Form to (re)display to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResult {
    /// Step identifier
    pub step_id: String,
    /// Form schema
    pub schema: SchemaDescriptor,
    /// Errors keyed by field (`base` for form-wide errors)
    pub errors: BTreeMap<String, ErrorCode>,
}

impl FormResult {
    /// Error shown for the whole form, if any
    pub fn base_error(&self) -> Option<ErrorCode> {
        self.errors.get(BASE_ERROR_FIELD).copied()
    }
}

/// Why an import was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Device unreachable or not speaking the protocol
    CannotConnect,
    /// Device already configured
    AlreadySetup,
}

impl AbortReason {
    /// Wire/display form of the reason
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CannotConnect => "cannot_connect",
            Self::AlreadySetup => "already_setup",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the operator step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStep {
    /// Show the form, possibly annotated with errors
    ShowForm(FormResult),
    /// Device validated; persist this entry
    CreateEntry(EntryDescriptor),
}

/// Result of the import step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStep {
    /// Device validated; persist this entry
    CreateEntry(EntryDescriptor),
    /// Import abandoned
    Abort(AbortReason),
}

/// Setup flow controller
pub struct SetupFlow<P, R> {
    prober: P,
    registry: R,
    config: SetupConfig,
    state: FlowState,
}

impl<P: Probe, R: DeviceRegistry> SetupFlow<P, R> {
    /// Create a flow in [`FlowState::AwaitingInput`]
    pub fn new(prober: P, registry: R, config: SetupConfig) -> Self {
        Self {
            prober,
            registry,
            config,
            state: FlowState::AwaitingInput,
        }
    }

    /// Current state
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Consume the flow, handing the registry back to the host
    pub fn into_registry(self) -> R {
        self.registry
    }

    /// Operator step
    ///
    /// `None` shows the empty form. A submission is validated and either
    /// completes the flow or re-shows the form with an error.
    pub async fn start_with_user_input(
        &mut self,
        input: Option<UserInput>,
    ) -> Result<UserStep, FlowError> {
        self.ensure_awaiting()?;

        let Some(input) = input else {
            return Ok(UserStep::ShowForm(self.form(BTreeMap::new())));
        };

        let request = SetupRequest {
            host: input.host.trim().to_string(),
            port: input.port.unwrap_or(self.config.default_port),
            display_name: input.display_name,
        };

        let field = match self.validate(&request).await {
            None => return Ok(UserStep::CreateEntry(self.complete(request))),
            Some(ErrorCode::InvalidHost) => ("host", ErrorCode::InvalidHost),
            Some(code) => (BASE_ERROR_FIELD, code),
        };

        let mut errors = BTreeMap::new();
        errors.insert(field.0.to_string(), field.1);
        Ok(UserStep::ShowForm(self.form(errors)))
    }

    /// Import step: same validation, but failures abort the flow
    pub async fn start_with_import(
        &mut self,
        request: SetupRequest,
    ) -> Result<ImportStep, FlowError> {
        self.ensure_awaiting()?;

        let request = SetupRequest {
            host: request.host.trim().to_string(),
            ..request
        };

        let reason = match self.validate(&request).await {
            None => return Ok(ImportStep::CreateEntry(self.complete(request))),
            Some(ErrorCode::AlreadyConfigured) => AbortReason::AlreadySetup,
            Some(ErrorCode::CannotConnect | ErrorCode::InvalidHost) => AbortReason::CannotConnect,
        };

        info!(host = %request.host, port = request.port, reason = %reason, "import aborted");
        Ok(ImportStep::Abort(reason))
    }

    fn ensure_awaiting(&self) -> Result<(), FlowError> {
        match self.state {
            FlowState::AwaitingInput => Ok(()),
            FlowState::Completed => Err(FlowError::AlreadyCompleted),
        }
    }

    async fn validate(&self, request: &SetupRequest) -> Option<ErrorCode> {
        if request.host.is_empty() {
            return Some(ErrorCode::InvalidHost);
        }

        let target = request.target();
        if self.registry.is_configured(&target.key()) {
            info!(target = %target, "device already configured");
            return Some(ErrorCode::AlreadyConfigured);
        }

        let outcome = self
            .prober
            .probe(&target, self.config.connection_timeout())
            .await;
        debug!(target = %target, outcome = %outcome, "validation probe finished");
        classify(&outcome)
    }

    fn complete(&mut self, request: SetupRequest) -> EntryDescriptor {
        self.state = FlowState::Completed;
        let entry = EntryDescriptor::from_request(request);
        info!(title = %entry.title, key = %entry.key(), "device validated");
        entry
    }

    fn form(&self, errors: BTreeMap<String, ErrorCode>) -> FormResult {
        FormResult {
            step_id: USER_STEP_ID.to_string(),
            schema: SchemaDescriptor::setup(&self.config),
            errors,
        }
    }
}
