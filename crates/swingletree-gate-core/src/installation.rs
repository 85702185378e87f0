//! GitHub App installation events.
//!
//! Only the fields needed to tell the installation service which account
//! installed or removed the app are modelled; the rest of the GitHub payload is
//! ignored.

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Event name GitHub sends in `X-GitHub-Event` for installation changes
pub const INSTALLATION_EVENT: &str = "installation";

/// What happened to the installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationAction {
    Created,
    Deleted,

    /// Suspend, unsuspend, new_permissions_accepted, ...
    Other(String),
}

impl From<&str> for InstallationAction {
    fn from(value: &str) -> Self {
        match value {
            "created" => Self::Created,
            "deleted" => Self::Deleted,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallationAccount {
    pub login: String,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Installation {
    pub id: u64,
    pub account: InstallationAccount,
}

/// Subset of the GitHub `installation` webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallationEvent {
    pub action: String,
    pub installation: Installation,
}

impl InstallationEvent {
    /// Parse the raw webhook body.
    pub fn from_slice(payload: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(payload).map_err(|e| ValidationError::InvalidFormat {
            field: "payload".to_string(),
            message: e.to_string(),
        })
    }

    pub fn action(&self) -> InstallationAction {
        InstallationAction::from(self.action.as_str())
    }

    /// Reference sent to the installation service.
    pub fn reference(&self) -> InstallationReference {
        InstallationReference {
            account: self.installation.account.login.clone(),
            account_id: self.installation.account.id,
            installation_id: self.installation.id,
        }
    }
}

/// Body of `POST|DELETE <installation service>/installation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationReference {
    pub account: String,
    pub account_id: u64,
    pub installation_id: u64,
}

#[cfg(test)]
#[path = "installation_tests.rs"]
mod tests;
