//! Plan limits and user settings
//!
//! The metered service offers a small set of named plans with fixed
//! limits. The engine itself never compares usage against limits; it only
//! exposes them so the presentation layer can render thresholds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// User-selectable plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    Pro,
    Max5,
    Max20,
    Custom,
}

impl Default for PlanType {
    fn default() -> Self {
        Self::Max5
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pro => write!(f, "Pro"),
            Self::Max5 => write!(f, "Max 5"),
            Self::Max20 => write!(f, "Max 20"),
            Self::Custom => write!(f, "Custom"),
        }
    }
}

impl std::str::FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pro" => Ok(Self::Pro),
            "max 5" | "max5" => Ok(Self::Max5),
            "max 20" | "max20" => Ok(Self::Max20),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Invalid plan: {s}")),
        }
    }
}

/// Fixed limits for one plan, per session window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Token limit
    pub token_limit: u64,
    /// Cost limit in USD
    pub cost_limit: f64,
    /// Message limit
    pub message_limit: u64,
}

impl PlanLimits {
    pub const PRO: PlanLimits = PlanLimits {
        token_limit: 19_000,
        cost_limit: 18.0,
        message_limit: 250,
    };

    pub const MAX5: PlanLimits = PlanLimits {
        token_limit: 88_000,
        cost_limit: 35.0,
        message_limit: 1_000,
    };

    pub const MAX20: PlanLimits = PlanLimits {
        token_limit: 220_000,
        cost_limit: 140.0,
        message_limit: 2_000,
    };

    pub const CUSTOM: PlanLimits = PlanLimits {
        token_limit: 44_000,
        cost_limit: 50.0,
        message_limit: 250,
    };

    /// The limits for a plan
    pub fn for_plan(plan: PlanType) -> PlanLimits {
        match plan {
            PlanType::Pro => Self::PRO,
            PlanType::Max5 => Self::MAX5,
            PlanType::Max20 => Self::MAX20,
            PlanType::Custom => Self::CUSTOM,
        }
    }
}

/// The settings surface the engine consumes
///
/// Storage and editing of settings belong to the hosting application;
/// the engine only reads the selected plan and the refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Selected plan
    pub plan: PlanType,
    /// Periodic refresh interval in seconds
    pub refresh_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plan: PlanType::default(),
            refresh_interval_secs: 300,
        }
    }
}

impl Settings {
    /// Limits for the selected plan
    pub fn limits(&self) -> PlanLimits {
        PlanLimits::for_plan(self.plan)
    }

    /// Refresh interval as a duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
