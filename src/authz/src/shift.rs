//! Shift windows and the access-window evaluator
//!
//! A shift window is a recurring daily hour range `[start_hour, end_hour)`.
//! `end_hour < start_hour` wraps past midnight, and `start_hour == end_hour`
//! means the window is always open. Override permissions stay exercisable
//! outside the window so critical-care staff are never locked out by the
//! clock.

use chrono::{DateTime, FixedOffset, Timelike};
use std::collections::HashMap;

use carelink_core::Permission;

use crate::catalog::PermissionSet;
use crate::error::{AuthzError, Result};

/// Named recurring hour range plus its emergency overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftWindow {
    name: String,
    start_hour: u32,
    end_hour: u32,
    overrides: PermissionSet,
}

impl ShiftWindow {
    /// Create a shift window; hours must be in `0..24`
    pub fn new<I>(name: impl Into<String>, start_hour: u32, end_hour: u32, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = Permission>,
    {
        let name = name.into();

        for (label, hour) in [("start", start_hour), ("end", end_hour)] {
            if hour >= 24 {
                return Err(AuthzError::InvalidShiftWindow {
                    name,
                    reason: format!("{} hour {} is outside 0..24", label, hour),
                });
            }
        }

        Ok(Self {
            name,
            start_hour,
            end_hour,
            overrides: overrides.into_iter().collect(),
        })
    }

    /// Window with hours checked at compile time
    fn fixed<const START: u32, const END: u32, I>(name: &str, overrides: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        let () = FixedHours::<START, END>::VALID;

        Self {
            name: name.to_string(),
            start_hour: START,
            end_hour: END,
            overrides: overrides.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn overrides(&self) -> &PermissionSet {
        &self.overrides
    }

    /// Whether the window wraps past midnight
    pub fn wraps_midnight(&self) -> bool {
        self.start_hour > self.end_hour
    }

    /// Whether `hour` falls inside the window
    pub fn contains_hour(&self, hour: u32) -> bool {
        // Zero-length window: always open.
        if self.start_hour == self.end_hour {
            return true;
        }

        if self.start_hour < self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Whether `permission` is exempt from the window
    pub fn is_override(&self, permission: Permission) -> bool {
        self.overrides.contains(&permission)
    }
}

struct FixedHours<const START: u32, const END: u32>;

impl<const START: u32, const END: u32> FixedHours<START, END> {
    const VALID: () = assert!(START < 24 && END < 24, "shift hours must be in 0..24");
}

/// Named shift windows known to the engine
#[derive(Debug, Clone, Default)]
pub struct ShiftCatalog {
    windows: HashMap<String, ShiftWindow>,
}

impl ShiftCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the standard hospital shifts
    pub fn standard() -> Self {
        let emergency = [Permission::EmergencyOverride];
        let mut catalog = Self::new();

        catalog.insert(ShiftWindow::fixed::<7, 19, _>("day_shift", emergency));
        catalog.insert(ShiftWindow::fixed::<15, 23, _>("evening_shift", emergency));
        catalog.insert(ShiftWindow::fixed::<18, 6, _>("night_shift", emergency));
        catalog.insert(ShiftWindow::fixed::<0, 0, _>(
            "on_call",
            [Permission::EmergencyOverride, Permission::CriticalOverride],
        ));

        catalog
    }

    /// Add or replace a window by name
    pub fn insert(&mut self, window: ShiftWindow) {
        self.windows.insert(window.name.clone(), window);
    }

    pub fn get(&self, name: &str) -> Option<&ShiftWindow> {
        self.windows.get(name)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Decides whether a permission is exercisable at a given local time
pub struct AccessWindowEvaluator;

impl AccessWindowEvaluator {
    /// Within-window check with override escape hatch
    pub fn is_within_window(
        shift: &ShiftWindow,
        permission: Permission,
        now: &DateTime<FixedOffset>,
    ) -> bool {
        shift.contains_hour(now.hour()) || shift.is_override(permission)
    }
}
