//! Portal users and authenticated sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::organization::OrganizationScope;
use super::role::Role;

/// Profile of the signed-in user as delivered by the login endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier (e.g., "user:dr.haddad")
    pub id: String,

    /// Display name shown in the portal header
    #[serde(default)]
    pub display_name: String,

    /// Identity category; a profile without a role is denied everything
    #[serde(default)]
    pub role: Option<Role>,

    /// Organization the user belongs to
    #[serde(default)]
    pub organization_id: Option<String>,

    /// Organizational level of the user's membership
    #[serde(default)]
    pub organization_level: Option<OrganizationScope>,

    /// Name of the assigned shift window (e.g., "night_shift")
    #[serde(default)]
    pub shift: Option<String>,

    /// Explicit resource assignments. `None` means the resource gate does
    /// not apply; `Some` (even empty) must contain the requested resource.
    #[serde(default)]
    pub assigned_resources: Option<Vec<String>>,
}

impl UserProfile {
    /// Create a profile with an id and a role
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            role: Some(role),
            organization_id: None,
            organization_level: None,
            shift: None,
            assigned_resources: None,
        }
    }

    /// Create a profile that carries no role
    pub fn without_role(id: impl Into<String>) -> Self {
        Self {
            role: None,
            ..Self::new(id, Role::Patient)
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_organization(
        mut self,
        organization_id: impl Into<String>,
        level: OrganizationScope,
    ) -> Self {
        self.organization_id = Some(organization_id.into());
        self.organization_level = Some(level);
        self
    }

    pub fn with_shift(mut self, shift: impl Into<String>) -> Self {
        self.shift = Some(shift.into());
        self
    }

    pub fn with_assigned_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned_resources = Some(resources.into_iter().map(Into::into).collect());
        self
    }
}

/// Authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token issued by the backend
    pub token: String,

    /// Signed-in user
    pub user: UserProfile,

    /// Issue time
    pub issued_at: DateTime<Utc>,

    /// Expiry; sessions without one never expire client-side
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: UserProfile, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            user,
            issued_at,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the session has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| now >= expires_at)
    }
}
