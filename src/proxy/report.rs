//! Connectivity report models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of probing one reference endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Reachable,
    Unreachable,
    Error,
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Reachable => write!(f, "reachable"),
            TargetStatus::Unreachable => write!(f, "unreachable"),
            TargetStatus::Error => write!(f, "error"),
        }
    }
}

/// Result for a single reference endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResult {
    pub name: String,
    pub elapsed_time_ms: u64,
    pub status: TargetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TargetResult {
    pub fn reachable(name: impl Into<String>, elapsed_time_ms: u64) -> Self {
        Self {
            name: name.into(),
            elapsed_time_ms,
            status: TargetStatus::Reachable,
            reason: None,
        }
    }

    pub fn unreachable(name: impl Into<String>, elapsed_time_ms: u64, reason: String) -> Self {
        Self {
            name: name.into(),
            elapsed_time_ms,
            status: TargetStatus::Unreachable,
            reason: Some(reason),
        }
    }

    pub fn error(name: impl Into<String>, elapsed_time_ms: u64, reason: String) -> Self {
        Self {
            name: name.into(),
            elapsed_time_ms,
            status: TargetStatus::Error,
            reason: Some(reason),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.status == TargetStatus::Reachable
    }
}

impl fmt::Display for TargetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({}ms)", self.name, self.status, self.elapsed_time_ms)?;
        if let Some(reason) = &self.reason {
            write!(f, ": {}", reason)?;
        }
        Ok(())
    }
}

/// Per-endpoint results in configured endpoint order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectivityReport {
    pub targets: Vec<TargetResult>,
}

impl ConnectivityReport {
    pub fn new(targets: Vec<TargetResult>) -> Self {
        Self { targets }
    }

    /// Single-entry report for a probe that could not start
    pub fn setup_failure(reason: String) -> Self {
        Self {
            targets: vec![TargetResult::error("setup", 0, reason)],
        }
    }

    pub fn reachable_count(&self) -> usize {
        self.targets.iter().filter(|t| t.is_reachable()).count()
    }

    /// Check if at least one endpoint answered
    pub fn any_reachable(&self) -> bool {
        self.reachable_count() > 0
    }
}
