//! Wizard state, API payloads and outcomes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::resilience::DeadlineExceeded;

/// Wizard progress. Ordered: later steps compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DemoStep {
    Idle = 0,
    InstanceDetected = 1,
    InstanceStressed = 2,
    FailoverConfirmed = 3,
}

impl fmt::Display for DemoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DemoStep::Idle => "idle",
            DemoStep::InstanceDetected => "instance detected",
            DemoStep::InstanceStressed => "instance stressed",
            DemoStep::FailoverConfirmed => "failover confirmed",
        };
        write!(f, "{} ({})", name, *self as u8)
    }
}

/// Instance ids may arrive as JSON strings or numbers.
fn instance_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected instance id, got {}",
            other
        ))),
    }
}

/// The parts of a health report the wizard reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstanceHealth {
    pub status: String,
    #[serde(deserialize_with = "instance_id")]
    pub instance: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Successful `POST /api/stress` body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressReceipt {
    #[serde(deserialize_with = "instance_id")]
    pub instance: String,
    pub chunks_allocated: usize,
    #[serde(rename = "allocatedMB")]
    pub allocated_mb: u64,
    #[serde(rename = "rssMB")]
    pub rss_mb: u64,
}

/// Successful `POST /api/stress/clear` body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReceipt {
    #[serde(deserialize_with = "instance_id")]
    pub instance: String,
    pub previous_chunks: usize,
    #[serde(rename = "rssMB")]
    pub rss_mb: u64,
}

/// Result of the retry-until-target stress step.
#[derive(Debug, Clone, PartialEq)]
pub enum StressOutcome {
    /// The intended instance was stressed.
    Hit { receipt: StressReceipt, attempts: u32 },
    /// Every attempt missed or failed.
    Exhausted {
        target: String,
        attempts: u32,
        /// Instances that answered instead of the target, in order.
        misses: Vec<String>,
        last_error: Option<String>,
    },
    /// Stopped by the canceller.
    Cancelled { attempts: u32 },
}

impl StressOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, StressOutcome::Hit { .. })
    }
}

impl fmt::Display for StressOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressOutcome::Hit { receipt, attempts } => write!(
                f,
                "stress active on instance {} after {} attempt(s): {} MB allocated, rss {} MB",
                receipt.instance, attempts, receipt.allocated_mb, receipt.rss_mb
            ),
            StressOutcome::Exhausted {
                target,
                attempts,
                misses,
                last_error,
            } => {
                write!(
                    f,
                    "could not reach instance {} in {} attempt(s)",
                    target, attempts
                )?;
                if !misses.is_empty() {
                    write!(f, "; answered by {}", misses.join(", "))?;
                }
                if let Some(e) = last_error {
                    write!(f, "; last error: {}", e)?;
                }
                Ok(())
            }
            StressOutcome::Cancelled { attempts } => {
                write!(f, "cancelled after {} attempt(s)", attempts)
            }
        }
    }
}

/// Result of one failover verification poll.
#[derive(Debug, Clone, PartialEq)]
pub enum FailoverCheck {
    /// A different instance answered.
    Confirmed { from: String, to: String },
    /// The stressed instance is still serving.
    SameInstance { instance: String, status: String },
}

impl FailoverCheck {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, FailoverCheck::Confirmed { .. })
    }
}

impl fmt::Display for FailoverCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailoverCheck::Confirmed { from, to } => {
                write!(f, "failover confirmed: traffic moved from instance {} to {}", from, to)
            }
            FailoverCheck::SameInstance { instance, status } => write!(
                f,
                "still on instance {} (status {}); wait a few seconds and retry",
                instance, status
            ),
        }
    }
}

/// Errors surfaced by the demo client and wizard.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Timeout(#[from] DeadlineExceeded),

    #[error("{operation} needs step {required} or later, wizard is at {current}")]
    InvalidStep {
        operation: &'static str,
        required: DemoStep,
        current: DemoStep,
    },

    #[error("{operation} is not allowed at {current}, reset first")]
    AlreadyAdvanced {
        operation: &'static str,
        current: DemoStep,
    },

    #[error("cancelled")]
    Cancelled,
}
