//! Production wiring of the portal

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use carelink_authz::{
    AccessDecision, AuditSink, AuthorizationEngine, DecisionOptions, EngineConfig,
    TracingAuditSink,
};
use carelink_core::{Clock, ManualClock, OrganizationScope, Permission, Role, SystemClock, UserProfile};
use carelink_store::{Collaborators, EcosystemStateStore, FileSessionStore};
use carelink_sync::HttpDataSource;

use crate::config::PortalConfig;

/// Open the ecosystem store against the configured API and session file
pub async fn open_store(config: &PortalConfig) -> Result<EcosystemStateStore> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let engine = Arc::new(AuthorizationEngine::new(config.engine_config(), audit, clock.clone()));

    let data_source = HttpDataSource::new(config.api.base_url.clone(), config.api_timeout())
        .context("Failed to create HTTP client")?;
    let session_store = FileSessionStore::new(config.session.path.clone());

    let store = EcosystemStateStore::open(
        config.store_config(),
        Collaborators {
            engine,
            data_source: Arc::new(data_source),
            session_store: Arc::new(session_store),
            clock,
        },
    )
    .await
    .context("Failed to open portal state")?;

    info!("Portal state opened against {}", config.api.base_url);
    Ok(store)
}

/// One ad-hoc permission check
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub role: String,
    pub permission: String,
    pub shift: Option<String>,
    /// Evaluate at this local hour instead of now
    pub hour: Option<u32>,
    pub organization_id: Option<String>,
    pub organization_level: Option<String>,
    pub target_organization: Option<String>,
    pub resource_id: Option<String>,
    pub resource_type: Option<String>,
    pub assigned_resources: Option<Vec<String>>,
}

impl CheckRequest {
    /// Caller profile described by the request
    ///
    /// An unknown role token yields a profile without a role, which every
    /// check denies.
    pub fn user(&self) -> Result<UserProfile> {
        let mut user = match self.role.parse::<Role>() {
            Ok(role) => UserProfile::new("cli", role),
            Err(_) => UserProfile::without_role("cli"),
        };

        if let Some(org) = &self.organization_id {
            let level = match &self.organization_level {
                Some(level) => level
                    .parse::<OrganizationScope>()
                    .with_context(|| format!("Unknown organization level '{}'", level))?,
                None => OrganizationScope::default(),
            };
            user = user.with_organization(org.clone(), level);
        }
        if let Some(shift) = &self.shift {
            user = user.with_shift(shift.clone());
        }
        if let Some(assigned) = &self.assigned_resources {
            user = user.with_assigned_resources(assigned.iter().cloned());
        }
        Ok(user)
    }

    pub fn permission(&self) -> Result<Permission> {
        self.permission
            .parse()
            .with_context(|| format!("Unknown permission '{}'", self.permission))
    }

    /// A named shift turns on the shift-window check
    pub fn options(&self) -> DecisionOptions {
        let mut options = DecisionOptions::new();
        if self.shift.is_some() {
            options = options.with_shift_access();
        }
        if let Some(target) = &self.target_organization {
            options = options.with_organization(target.clone());
        }
        if let Some(resource) = &self.resource_id {
            options = options.with_resource(resource.clone());
        }
        if let Some(resource_type) = &self.resource_type {
            options = options.with_resource_type(resource_type.clone());
        }
        options
    }

    /// Run the check through an engine auditing to the tracing sink
    pub async fn decide(&self, engine_config: EngineConfig) -> Result<AccessDecision> {
        let clock: Arc<dyn Clock> = match self.hour {
            Some(hour) if hour < 24 => Arc::new(ManualClock::at_hour(hour)),
            Some(hour) => anyhow::bail!("Hour must be below 24, got {}", hour),
            None => Arc::new(SystemClock),
        };
        let engine = AuthorizationEngine::new(engine_config, Arc::new(TracingAuditSink), clock);

        let user = self.user()?;
        let permission = self.permission()?;
        Ok(engine.decide(&user, permission, &self.options()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelink_authz::DecisionReason;

    fn request(role: &str, permission: &str) -> CheckRequest {
        CheckRequest {
            role: role.to_string(),
            permission: permission.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_nurse_outside_shift_is_denied() {
        let check = CheckRequest {
            shift: Some("day_shift".to_string()),
            hour: Some(22),
            ..request("nurse", "administer_medication")
        };

        let decision = check.decide(EngineConfig::default()).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.reason, DecisionReason::OutsideShiftWindow);
    }

    #[tokio::test]
    async fn test_unknown_role_fails_closed() {
        let decision = request("janitor", "view_dashboard")
            .decide(EngineConfig::default())
            .await
            .unwrap();

        assert_eq!(decision.reason, DecisionReason::NoRole);
    }

    #[tokio::test]
    async fn test_unknown_permission_is_error() {
        assert!(request("nurse", "fly").decide(EngineConfig::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_cross_facility_check() {
        let check = CheckRequest {
            organization_id: Some("org:north".to_string()),
            organization_level: Some("network".to_string()),
            target_organization: Some("org:south".to_string()),
            ..request("physician", "view_patient_records")
        };

        let decision = check.decide(EngineConfig::default()).await.unwrap();
        assert!(decision.allowed);
    }

    #[test]
    fn test_invalid_hour() {
        let check = CheckRequest {
            hour: Some(24),
            ..request("nurse", "update_vitals")
        };
        let rt = tokio::runtime::Runtime::new().unwrap();
        assert!(rt.block_on(check.decide(EngineConfig::default())).is_err());
    }
}
