use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::message::MessageType;

/// What the dispatcher does when a handler fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure; later handlers are not invoked.
    #[default]
    FailFast,
    /// Invoke every handler and report all failures in order.
    CollectAll,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(FailurePolicy::FailFast),
            "collect_all" => Ok(FailurePolicy::CollectAll),
            other => Err(format!(
                "unknown failure policy '{}', expected fail_fast or collect_all",
                other
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => f.write_str("fail_fast"),
            FailurePolicy::CollectAll => f.write_str("collect_all"),
        }
    }
}

/// Result of dispatching one message.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub message_type: MessageType,
    /// Handlers invoked, the failing ones included.
    pub invoked: usize,
    /// Failures captured under the active policy, in order.
    pub failures: Vec<DispatchError>,
}

impl DispatchOutcome {
    pub(crate) fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            invoked: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse into a `Result`: the single failure as-is, several failures
    /// as [`DispatchError::Failures`].
    pub fn into_result(mut self) -> Result<usize, DispatchError> {
        match self.failures.len() {
            0 => Ok(self.invoked),
            1 => Err(self.failures.remove(0)),
            _ => Err(DispatchError::Failures(self.failures)),
        }
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            message_type: self.message_type.name().to_string(),
            invoked: self.invoked,
            failures: self.failures.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Serializable view of a [`DispatchOutcome`], for audit trails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub message_type: String,
    pub invoked: usize,
    pub failures: Vec<String>,
}

impl DispatchSummary {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "message_type": self.message_type,
            "invoked": self.invoked,
            "failures": self.failures,
        })
    }
}
