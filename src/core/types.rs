use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Detail reported when the child closes its pipe without a message
pub const NO_REPORT_DETAIL: &str = "probe exited without reporting";

/// Classified result of one mount probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy { detail: String },
    TimedOut,
}

impl ProbeOutcome {
    /// Classify the trimmed message written by the probe child
    pub fn from_message(message: &str) -> Self {
        match message.trim() {
            "ok" => ProbeOutcome::Healthy,
            "" => ProbeOutcome::Unhealthy {
                detail: NO_REPORT_DETAIL.to_string(),
            },
            other => ProbeOutcome::Unhealthy {
                detail: other.to_string(),
            },
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }

    /// Error text carried into emitted records; `None` when healthy
    pub fn error_text(&self) -> Option<String> {
        match self {
            ProbeOutcome::Healthy => None,
            ProbeOutcome::Unhealthy { detail } => Some(detail.clone()),
            ProbeOutcome::TimedOut => Some("timeout".to_string()),
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Healthy => write!(f, "ok"),
            ProbeOutcome::Unhealthy { detail } => write!(f, "{}", detail),
            ProbeOutcome::TimedOut => write!(f, "timeout"),
        }
    }
}

/// How the probe child ended, as seen by the reap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildExit {
    Exited(i32),
    Signaled(i32),
    /// waitpid failed; the error text is kept for diagnostics
    ReapFailed(String),
}

/// Lifecycle evidence for one probe: the outcome plus what happened to the child.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    pub child_pid: i32,
    pub elapsed: Duration,
    pub kill_sent: bool,
    pub child_exit: ChildExit,
    pub notes: Vec<String>,
}

impl ProbeReport {
    pub fn reaped(&self) -> bool {
        !matches!(self.child_exit, ChildExit::ReapFailed(_))
    }
}
