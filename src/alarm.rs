use std::fmt;

use serde::{Deserialize, Serialize};

/// How urgently an alarm needs operator attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmSeverity {
    Info,
    Warning,
    Fault,
}

/// A severity-tagged status message derived from module state.
///
/// Alarms are data for the panel display, not errors: they are recomputed on
/// demand from the current state and never stored, so there is no cached list
/// to go stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub severity: AlarmSeverity,
    pub message: String,
}

impl Alarm {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: AlarmSeverity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: AlarmSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            severity: AlarmSeverity::Fault,
            message: message.into(),
        }
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self.severity {
            AlarmSeverity::Info => "INFO",
            AlarmSeverity::Warning => "WARN",
            AlarmSeverity::Fault => "FAULT",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}
