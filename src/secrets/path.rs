//! Secret path templating.
//!
//! Secret paths are rendered from two templates, one per [`SecretKind`]:
//!
//! ```text
//! indicator:  mysql/{env}/active-user    ->  mysql/staging/active-user
//! credential: mysql/{env}/user-{slot}    ->  mysql/staging/user-two
//! ```
//!
//! [`SecretPath`] is the typed request: a credential path cannot be built
//! without a [`Slot`]. [`PathTemplates::resolve`] is the untyped entry point
//! and reports a missing slot as [`SecretsError::InvalidTemplateArgs`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Result, SecretsError};
use crate::rotation::Slot;

const ENV_PLACEHOLDER: &str = "{env}";
const SLOT_PLACEHOLDER: &str = "{slot}";

pub const DEFAULT_INDICATOR_TEMPLATE: &str = "mysql/{env}/active-user";
pub const DEFAULT_CREDENTIAL_TEMPLATE: &str = "mysql/{env}/user-{slot}";

/// The two logical secrets read per resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretKind {
    /// Names the active slot and its promotion time.
    Indicator,
    /// Host, user and password for one slot.
    Credential,
}

impl SecretKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SecretKind::Indicator => "indicator",
            SecretKind::Credential => "credential",
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully specified secret lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPath<'a> {
    Indicator { env: &'a str },
    Credential { env: &'a str, slot: Slot },
}

impl SecretPath<'_> {
    pub fn kind(&self) -> SecretKind {
        match self {
            SecretPath::Indicator { .. } => SecretKind::Indicator,
            SecretPath::Credential { .. } => SecretKind::Credential,
        }
    }
}

/// Validated pair of path templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathTemplates {
    indicator: String,
    credential: String,
}

impl Default for PathTemplates {
    fn default() -> Self {
        Self {
            indicator: DEFAULT_INDICATOR_TEMPLATE.to_string(),
            credential: DEFAULT_CREDENTIAL_TEMPLATE.to_string(),
        }
    }
}

impl PathTemplates {
    /// Builds a template pair, checking placeholder usage.
    ///
    /// Both templates must contain `{env}`. The credential template must
    /// contain `{slot}`; the indicator template must not.
    pub fn new(indicator: impl Into<String>, credential: impl Into<String>) -> Result<Self> {
        let indicator = indicator.into();
        let credential = credential.into();

        if !indicator.contains(ENV_PLACEHOLDER) {
            return Err(SecretsError::invalid_template(
                SecretKind::Indicator,
                indicator,
                "missing {env} placeholder",
            ));
        }
        if indicator.contains(SLOT_PLACEHOLDER) {
            return Err(SecretsError::invalid_template(
                SecretKind::Indicator,
                indicator,
                "the indicator secret is shared by both slots and cannot use {slot}",
            ));
        }
        if !credential.contains(ENV_PLACEHOLDER) {
            return Err(SecretsError::invalid_template(
                SecretKind::Credential,
                credential,
                "missing {env} placeholder",
            ));
        }
        if !credential.contains(SLOT_PLACEHOLDER) {
            return Err(SecretsError::invalid_template(
                SecretKind::Credential,
                credential,
                "missing {slot} placeholder",
            ));
        }

        Ok(Self { indicator, credential })
    }

    pub fn indicator_template(&self) -> &str {
        &self.indicator
    }

    pub fn credential_template(&self) -> &str {
        &self.credential
    }

    /// Renders a typed path request.
    pub fn render(&self, path: SecretPath<'_>) -> String {
        match path {
            SecretPath::Indicator { env } => self.indicator.replace(ENV_PLACEHOLDER, env),
            SecretPath::Credential { env, slot } => self
                .credential
                .replace(ENV_PLACEHOLDER, env)
                .replace(SLOT_PLACEHOLDER, slot.as_str()),
        }
    }

    pub fn indicator_path(&self, env: &str) -> String {
        self.render(SecretPath::Indicator { env })
    }

    pub fn credential_path(&self, env: &str, slot: Slot) -> String {
        self.render(SecretPath::Credential { env, slot })
    }

    /// Renders a path from loose arguments.
    ///
    /// A slot passed for an indicator lookup is ignored.
    pub fn resolve(&self, kind: SecretKind, env: &str, slot: Option<Slot>) -> Result<String> {
        match (kind, slot) {
            (SecretKind::Indicator, _) => Ok(self.indicator_path(env)),
            (SecretKind::Credential, Some(slot)) => Ok(self.credential_path(env, slot)),
            (SecretKind::Credential, None) => {
                Err(SecretsError::InvalidTemplateArgs { kind, missing: "slot" })
            }
        }
    }
}
