//! Identity categories of portal users

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Identity category of a portal user. Fixed for the life of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Physician,
    Nurse,
    Patient,
    Administrator,
    Pharmacist,
    Technician,
    Researcher,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 7] = [
        Role::Physician,
        Role::Nurse,
        Role::Patient,
        Role::Administrator,
        Role::Pharmacist,
        Role::Technician,
        Role::Researcher,
    ];

    /// Stable token used in session payloads and audit records
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Physician => "physician",
            Role::Nurse => "nurse",
            Role::Patient => "patient",
            Role::Administrator => "administrator",
            Role::Pharmacist => "pharmacist",
            Role::Technician => "technician",
            Role::Researcher => "researcher",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == token)
            .ok_or_else(|| CoreError::UnknownRole(s.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
