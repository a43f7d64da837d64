//! Organizational breadth at which permissions are exercised

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Organizational level of a caller, from narrowest to broadest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationScope {
    Unit,
    Department,
    Facility,
    Network,
}

impl OrganizationScope {
    pub const ALL: [OrganizationScope; 4] = [
        OrganizationScope::Unit,
        OrganizationScope::Department,
        OrganizationScope::Facility,
        OrganizationScope::Network,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationScope::Unit => "unit",
            OrganizationScope::Department => "department",
            OrganizationScope::Facility => "facility",
            OrganizationScope::Network => "network",
        }
    }
}

impl Default for OrganizationScope {
    fn default() -> Self {
        OrganizationScope::Unit
    }
}

impl FromStr for OrganizationScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        OrganizationScope::ALL
            .into_iter()
            .find(|level| level.as_str() == token)
            .ok_or_else(|| CoreError::UnknownOrganizationLevel(s.to_string()))
    }
}

impl fmt::Display for OrganizationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
