//! Module forms
//!
//! A form instance owns the display state of one mounted module: idle,
//! success (message or result table) or failed. Submitting validates the
//! model against the module schema, remaps it, posts it and maps the
//! response. Failures are reduced to a fixed message; the underlying error
//! only goes to the log.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error};

use crate::descriptor::{ModuleDescriptor, DEFAULT_SUBMIT_LABEL};
use crate::error::{Error, Result, ValidationErrors};
use crate::fields::{fields_from_schema, FieldSpec};
use crate::mapping::{remap_request, ResultTable, SuccessView};
use crate::transport::Transport;
use crate::validator::SchemaValidator;

/// Banner shown for any failed submission of a generic form
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to create";

/// Action name of the primary submit control
pub const SUBMIT_ACTION: &str = "submit";

/// Display state of a form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FormState {
    #[default]
    Idle,
    Success { view: SuccessView },
    Failed { message: String },
}

/// Banner tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Danger,
}

/// A message banner outside the main success/error slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

/// A button the form offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormAction {
    pub name: String,
    pub label: String,
}

/// Everything a front end needs to draw a form
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub id: String,
    pub label: String,
    pub fields: Vec<FieldSpec>,
    /// Model of the last submit, for re-filling inputs
    pub values: Map<String, Value>,
    pub field_errors: ValidationErrors,
    pub actions: Vec<FormAction>,
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<ResultTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A mounted module form
#[async_trait]
pub trait ModuleForm: Send + Sync {
    fn descriptor(&self) -> &ModuleDescriptor;

    fn state(&self) -> &FormState;

    /// Fields this form renders
    fn fields(&self) -> Vec<FieldSpec>;

    fn render(&self) -> FormView;

    /// Validate `model` and submit it.
    ///
    /// A validation failure blocks the submit and is returned as
    /// `Error::Validation`; every other failure lands in the display state.
    async fn submit(&mut self, transport: &dyn Transport, model: Value) -> Result<()>;

    /// Run a secondary action offered by the form
    async fn run_action(
        &mut self,
        action: &str,
        _transport: &dyn Transport,
        _model: Value,
    ) -> Result<()> {
        Err(Error::NotFound {
            kind: "action".to_string(),
            id: action.to_string(),
        })
    }
}

/// State and plumbing shared by every form kind
pub struct FormCore {
    pub descriptor: Arc<ModuleDescriptor>,
    validator: Arc<SchemaValidator>,
    pub state: FormState,
    pub field_errors: ValidationErrors,
    pub values: Map<String, Value>,
}

impl FormCore {
    pub fn new(descriptor: Arc<ModuleDescriptor>, validator: Arc<SchemaValidator>) -> Self {
        Self {
            descriptor,
            validator,
            state: FormState::Idle,
            field_errors: ValidationErrors::default(),
            values: Map::new(),
        }
    }

    /// Validate a candidate model, keeping the defaulted values and any
    /// field errors for the next render
    pub fn validate(&mut self, mut model: Value) -> Result<Value> {
        let outcome = self.validator.validate(&mut model);
        if let Value::Object(values) = &model {
            self.values = values.clone();
        }
        match outcome {
            Ok(()) => {
                self.field_errors = ValidationErrors::default();
                Ok(model)
            }
            Err(errors) => {
                debug!("Module {} blocked by {} field error(s)", self.descriptor.id, errors.len());
                self.field_errors = errors.clone();
                Err(Error::Validation(errors))
            }
        }
    }

    /// Start a submission cycle
    pub fn begin(&mut self) {
        self.state = FormState::Idle;
    }

    pub fn succeed(&mut self, view: SuccessView) {
        self.state = FormState::Success { view };
    }

    /// Record a failure: the user sees `message`, the log gets `err`
    pub fn fail(&mut self, message: &str, err: &Error) {
        error!("Error in module {}: {}", self.descriptor.id, err);
        self.state = FormState::Failed {
            message: message.to_string(),
        };
    }

    /// POST `payload` and parse a 2xx JSON body; any failure is recorded
    /// with `failure_message` and yields `None`
    pub async fn post(
        &mut self,
        transport: &dyn Transport,
        endpoint: &str,
        payload: &Value,
        failure_message: &str,
    ) -> Option<Value> {
        let outcome: Result<Value> = async {
            let reply = transport.post_json(endpoint, payload).await?;
            if !reply.is_success() {
                return Err(Error::Submission(format!(
                    "{} answered with HTTP {}",
                    endpoint, reply.status
                )));
            }
            reply.json()
        }
        .await;

        match outcome {
            Ok(body) => Some(body),
            Err(e) => {
                self.fail(failure_message, &e);
                None
            }
        }
    }

    /// Build a view with the main success/error slot filled from the state
    pub fn view(&self, fields: Vec<FieldSpec>, actions: Vec<FormAction>, notices: Vec<Notice>) -> FormView {
        let (success, table, error) = match &self.state {
            FormState::Idle => (None, None, None),
            FormState::Success {
                view: SuccessView::Message { text },
            } => ((!text.is_empty()).then(|| text.clone()), None, None),
            FormState::Success {
                view: SuccessView::Results { table },
            } => (None, table.clone(), None),
            FormState::Failed { message } => (None, None, Some(message.clone())),
        };

        FormView {
            id: self.descriptor.id.clone(),
            label: self.descriptor.label.clone(),
            fields,
            values: self.values.clone(),
            field_errors: self.field_errors.clone(),
            actions,
            notices,
            success,
            table,
            error,
        }
    }

    pub fn submit_action(&self, default_label: &str) -> FormAction {
        FormAction {
            name: SUBMIT_ACTION.to_string(),
            label: self
                .descriptor
                .meta
                .submit_label
                .clone()
                .unwrap_or_else(|| default_label.to_string()),
        }
    }
}

/// Form generated entirely from the module schema and meta data
pub struct GenericModuleForm {
    core: FormCore,
}

impl GenericModuleForm {
    pub fn new(descriptor: Arc<ModuleDescriptor>, validator: Arc<SchemaValidator>) -> Self {
        Self {
            core: FormCore::new(descriptor, validator),
        }
    }
}

#[async_trait]
impl ModuleForm for GenericModuleForm {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.core.descriptor
    }

    fn state(&self) -> &FormState {
        &self.core.state
    }

    fn fields(&self) -> Vec<FieldSpec> {
        fields_from_schema(&self.core.descriptor.schema)
    }

    fn render(&self) -> FormView {
        self.core.view(
            self.fields(),
            vec![self.core.submit_action(DEFAULT_SUBMIT_LABEL)],
            Vec::new(),
        )
    }

    async fn submit(&mut self, transport: &dyn Transport, model: Value) -> Result<()> {
        let data = self.core.validate(model)?;
        self.core.begin();

        let descriptor = self.core.descriptor.clone();
        let payload = remap_request(descriptor.meta.request_mapping.as_ref(), &data);

        if let Some(body) = self
            .core
            .post(transport, &descriptor.meta.endpoint, &payload, SUBMIT_FAILED_MESSAGE)
            .await
        {
            self.core.succeed(SuccessView::from_response(&descriptor, &body));
        }
        Ok(())
    }
}
