//! Hand-written module forms
//!
//! These render a fixed set of fields instead of the whole schema and build
//! their payloads by hand. Sign-up adds an address check that must pass
//! before the form may be submitted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::error;

use crate::descriptor::ModuleDescriptor;
use crate::error::{Error, Result};
use crate::fields::{fields_from_schema, fields_named, FieldSpec};
use crate::form::{FormAction, FormCore, FormState, FormView, ModuleForm, Notice, Tone, SUBMIT_FAILED_MESSAGE};
use crate::mapping::{display_value, remap_request, SuccessView};
use crate::transport::Transport;
use crate::validator::SchemaValidator;

pub const VALIDATE_ADDRESS_ACTION: &str = "validate-address";

const SIGNUP_FAILED_MESSAGE: &str = "Failed to sign up";
const SIGNUP_SUCCESS_FALLBACK: &str = "Sign up successful";
const ADDRESS_REQUIRED_MESSAGE: &str = "Please validate your address before signing up.";
const ADDRESS_CHECK_FAILED_MESSAGE: &str = "Address validation error";
const ADDRESS_FIELDS: [&str; 4] = ["address", "city", "state", "zip"];

/// Which hand-written form a module uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BespokeKind {
    CreateWidget,
    CreateThing,
    SignUp,
}

impl BespokeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BespokeKind::CreateWidget => "createWidget",
            BespokeKind::CreateThing => "createThing",
            BespokeKind::SignUp => "signUp",
        }
    }

    /// Mount a fresh form instance of this kind
    pub fn mount(
        &self,
        descriptor: Arc<ModuleDescriptor>,
        validator: Arc<SchemaValidator>,
    ) -> Box<dyn ModuleForm> {
        let core = FormCore::new(descriptor, validator);
        match self {
            BespokeKind::CreateWidget => Box::new(FixedFieldsForm {
                core,
                fields: &["name"],
            }),
            BespokeKind::CreateThing => Box::new(FixedFieldsForm {
                core,
                fields: &["firstname", "phone"],
            }),
            BespokeKind::SignUp => Box::new(SignUpForm {
                core,
                address: None,
            }),
        }
    }
}

impl std::fmt::Display for BespokeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BespokeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "createWidget" => Ok(BespokeKind::CreateWidget),
            "createThing" => Ok(BespokeKind::CreateThing),
            "signUp" => Ok(BespokeKind::SignUp),
            other => Err(Error::InvalidConfig(format!("unknown bespoke form: {}", other))),
        }
    }
}

/// Form that renders and sends only a fixed list of fields
pub struct FixedFieldsForm {
    core: FormCore,
    fields: &'static [&'static str],
}

#[async_trait]
impl ModuleForm for FixedFieldsForm {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.core.descriptor
    }

    fn state(&self) -> &FormState {
        &self.core.state
    }

    fn fields(&self) -> Vec<FieldSpec> {
        fields_named(&self.core.descriptor.schema, self.fields)
    }

    fn render(&self) -> FormView {
        self.core
            .view(self.fields(), vec![self.core.submit_action("Submit")], Vec::new())
    }

    async fn submit(&mut self, transport: &dyn Transport, model: Value) -> Result<()> {
        let data = self.core.validate(model)?;
        self.core.begin();

        let mut payload = Map::new();
        for name in self.fields {
            if let Some(value) = data.get(*name) {
                payload.insert(name.to_string(), value.clone());
            }
        }

        let endpoint = self.core.descriptor.meta.endpoint.clone();
        if let Some(body) = self
            .core
            .post(transport, &endpoint, &Value::Object(payload), SUBMIT_FAILED_MESSAGE)
            .await
        {
            let text = body.get("message").map(display_value).unwrap_or_default();
            self.core.succeed(SuccessView::Message { text });
        }
        Ok(())
    }
}

/// Outcome of the last address check
#[derive(Debug, Clone, PartialEq, Eq)]
struct AddressCheck {
    valid: bool,
    message: String,
}

/// Sign-up form: schema-driven fields plus a required address check
pub struct SignUpForm {
    core: FormCore,
    address: Option<AddressCheck>,
}

impl SignUpForm {
    fn address_valid(&self) -> bool {
        self.address.as_ref().map(|a| a.valid).unwrap_or(false)
    }

    async fn validate_address(&mut self, transport: &dyn Transport, model: Value) {
        if let Value::Object(values) = &model {
            self.core.values = values.clone();
        }

        let query: Vec<(String, String)> = ADDRESS_FIELDS
            .iter()
            .map(|name| {
                let value = model.get(*name).map(display_value).unwrap_or_default();
                (name.to_string(), value)
            })
            .collect();

        let endpoint = self
            .core
            .descriptor
            .extra_str("validateAddressEndpoint")
            .map(str::to_string);

        let outcome: Result<AddressCheck> = async {
            let endpoint = endpoint.ok_or_else(|| {
                Error::InvalidConfig("meta.validateAddressEndpoint is not set".into())
            })?;
            let reply = transport.get(&endpoint, &query).await?;
            if !reply.is_success() {
                return Err(Error::Submission(format!(
                    "address validation answered with HTTP {}",
                    reply.status
                )));
            }
            let body = reply.json()?;
            Ok(AddressCheck {
                valid: body.get("valid").and_then(Value::as_bool).unwrap_or(false),
                message: body.get("message").map(display_value).unwrap_or_default(),
            })
        }
        .await;

        self.address = Some(match outcome {
            Ok(check) => check,
            Err(e) => {
                error!("Error validating address in module {}: {}", self.core.descriptor.id, e);
                AddressCheck {
                    valid: false,
                    message: ADDRESS_CHECK_FAILED_MESSAGE.to_string(),
                }
            }
        });
    }
}

#[async_trait]
impl ModuleForm for SignUpForm {
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
        let validate_label = self
            .core
            .descriptor
            .extra_str("validateLabel")
            .unwrap_or("Validate Address")
            .to_string();
        let actions = vec![
            self.core.submit_action("Sign Up"),
            FormAction {
                name: VALIDATE_ADDRESS_ACTION.to_string(),
                label: validate_label,
            },
        ];

        let notices = self
            .address
            .iter()
            .filter(|check| !check.message.is_empty())
            .map(|check| Notice {
                tone: if check.valid { Tone::Success } else { Tone::Warning },
                text: check.message.clone(),
            })
            .collect();

        self.core.view(self.fields(), actions, notices)
    }

    async fn submit(&mut self, transport: &dyn Transport, model: Value) -> Result<()> {
        let data = self.core.validate(model)?;
        self.core.begin();

        if !self.address_valid() {
            self.core.state = FormState::Failed {
                message: ADDRESS_REQUIRED_MESSAGE.to_string(),
            };
            return Ok(());
        }

        let descriptor = self.core.descriptor.clone();
        let payload = remap_request(descriptor.meta.request_mapping.as_ref(), &data);

        if let Some(body) = self
            .core
            .post(transport, &descriptor.meta.endpoint, &payload, SIGNUP_FAILED_MESSAGE)
            .await
        {
            let text = body
                .get(descriptor.message_key())
                .map(display_value)
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| SIGNUP_SUCCESS_FALLBACK.to_string());
            self.core.succeed(SuccessView::Message { text });
        }
        Ok(())
    }

    async fn run_action(
        &mut self,
        action: &str,
        transport: &dyn Transport,
        model: Value,
    ) -> Result<()> {
        match action {
            VALIDATE_ADDRESS_ACTION => {
                self.validate_address(transport, model).await;
                Ok(())
            }
            other => Err(Error::NotFound {
                kind: "action".to_string(),
                id: other.to_string(),
            }),
        }
    }
}
