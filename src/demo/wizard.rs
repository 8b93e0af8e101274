//! Failover wizard state machine.
//!
//! # Responsibilities
//! - Detect which instance the balancer currently routes to
//! - Stress that exact instance through the balancer (retry until target)
//! - Confirm the balancer moved traffic to a sibling
//! - Reset stress on every instance and start over
//!
//! # Design Decisions
//! - No direct addressing: every call goes through the balancer and the
//!   wizard keeps trying until the routing lands on the target
//! - A miss is undone with a best-effort clear before the next attempt
//! - Attempt failures are absorbed; only exhaustion is reported, as a value

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join;
use tokio::sync::watch;

use crate::demo::client::DemoApi;
use crate::demo::types::{DemoError, DemoStep, FailoverCheck, StressOutcome};
use crate::resilience::{with_deadline, AttemptFailure, RetryPolicy};

/// Stops a running wizard operation from another task.
#[derive(Debug, Clone)]
pub struct DemoCanceller {
    tx: Arc<watch::Sender<bool>>,
}

impl DemoCanceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Client-side failover demonstration.
pub struct FailoverDemo<A> {
    api: A,
    policy: RetryPolicy,
    step: DemoStep,
    initial_instance: Option<String>,
    stressed_instance: Option<String>,
    cancel: Arc<watch::Sender<bool>>,
}

impl<A: DemoApi> FailoverDemo<A> {
    pub fn new(api: A, policy: RetryPolicy) -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            api,
            policy,
            step: DemoStep::Idle,
            initial_instance: None,
            stressed_instance: None,
            cancel: Arc::new(tx),
        }
    }

    pub fn step(&self) -> DemoStep {
        self.step
    }

    pub fn initial_instance(&self) -> Option<&str> {
        self.initial_instance.as_deref()
    }

    pub fn stressed_instance(&self) -> Option<&str> {
        self.stressed_instance.as_deref()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn canceller(&self) -> DemoCanceller {
        DemoCanceller {
            tx: self.cancel.clone(),
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolve once cancelled.
    async fn cancelled(&self) {
        let mut rx = self.cancel.subscribe();
        // The sender lives in `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleep unless cancelled first. Returns false on cancel.
    async fn pause(&self, delay: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        if delay.is_zero() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => !self.is_cancelled(),
            _ = self.cancelled() => false,
        }
    }

    fn require(&self, operation: &'static str, required: DemoStep) -> Result<(), DemoError> {
        if self.step < required {
            return Err(DemoError::InvalidStep {
                operation,
                required,
                current: self.step,
            });
        }
        Ok(())
    }

    /// Step 1: record the instance currently answering health checks.
    pub async fn detect_instance(&mut self) -> Result<String, DemoError> {
        if self.step >= DemoStep::InstanceStressed {
            return Err(DemoError::AlreadyAdvanced {
                operation: "detect instance",
                current: self.step,
            });
        }

        let health = with_deadline(self.policy.attempt_timeout, self.api.health()).await??;
        tracing::info!(
            instance = %health.instance,
            status = %health.status,
            "Detected serving instance"
        );

        self.initial_instance = Some(health.instance.clone());
        self.stressed_instance = None;
        self.step = DemoStep::InstanceDetected;
        Ok(health.instance)
    }

    /// Step 2: stress the detected instance through the balancer.
    ///
    /// Each attempt goes to whichever instance the balancer picks. A
    /// response from another instance is undone with a clear before the
    /// next attempt. Exhaustion and cancellation are returned as outcomes,
    /// leaving the wizard at its current step.
    pub async fn stress_target_instance(&mut self) -> Result<StressOutcome, DemoError> {
        self.require("stress target instance", DemoStep::InstanceDetected)?;
        let target = self
            .initial_instance
            .clone()
            .ok_or(DemoError::InvalidStep {
                operation: "stress target instance",
                required: DemoStep::InstanceDetected,
                current: self.step,
            })?;

        let max_attempts = self.policy.max_attempts.max(1);
        let mut misses = Vec::new();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if self.is_cancelled() {
                return Ok(StressOutcome::Cancelled { attempts: attempt - 1 });
            }

            let result = tokio::select! {
                r = with_deadline(self.policy.attempt_timeout, self.api.stress()) => r,
                _ = self.cancelled() => {
                    return Ok(StressOutcome::Cancelled { attempts: attempt });
                }
            };

            let failure = match result {
                Ok(Ok(receipt)) if receipt.instance == target => {
                    tracing::info!(
                        instance = %receipt.instance,
                        attempt,
                        allocated_mb = receipt.allocated_mb,
                        "Stress landed on target instance"
                    );
                    self.stressed_instance = Some(receipt.instance.clone());
                    self.step = self.step.max(DemoStep::InstanceStressed);
                    return Ok(StressOutcome::Hit {
                        receipt,
                        attempts: attempt,
                    });
                }
                Ok(Ok(receipt)) => {
                    tracing::info!(
                        target = %target,
                        answered = %receipt.instance,
                        attempt,
                        "Stress hit another instance, clearing it"
                    );
                    misses.push(receipt.instance);
                    match with_deadline(self.policy.attempt_timeout, self.api.clear_stress()).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => tracing::debug!(error = %e, "Best-effort clear failed"),
                        Err(e) => tracing::debug!(error = %e, "Best-effort clear timed out"),
                    }
                    AttemptFailure::Miss
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, attempt, "Stress attempt failed");
                    last_error = Some(e.to_string());
                    AttemptFailure::Error
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Stress attempt timed out");
                    last_error = Some(e.to_string());
                    AttemptFailure::Error
                }
            };

            if attempt < max_attempts && !self.pause(self.policy.delay_for(failure)).await {
                return Ok(StressOutcome::Cancelled { attempts: attempt });
            }
        }

        tracing::warn!(target = %target, attempts = max_attempts, "Could not stress target instance");
        Ok(StressOutcome::Exhausted {
            target,
            attempts: max_attempts,
            misses,
            last_error,
        })
    }

    /// Step 3: one health poll; confirmed when another instance answers.
    pub async fn verify_failover(&mut self) -> Result<FailoverCheck, DemoError> {
        self.require("verify failover", DemoStep::InstanceStressed)?;
        let stressed = self
            .stressed_instance
            .clone()
            .ok_or(DemoError::InvalidStep {
                operation: "verify failover",
                required: DemoStep::InstanceStressed,
                current: self.step,
            })?;

        let health = with_deadline(self.policy.attempt_timeout, self.api.health()).await??;
        if health.instance != stressed {
            tracing::info!(from = %stressed, to = %health.instance, "Failover confirmed");
            self.step = DemoStep::FailoverConfirmed;
            return Ok(FailoverCheck::Confirmed {
                from: stressed,
                to: health.instance,
            });
        }

        tracing::info!(instance = %health.instance, status = %health.status, "Stressed instance still serving");
        Ok(FailoverCheck::SameInstance {
            instance: health.instance,
            status: health.status,
        })
    }

    /// Poll `verify_failover` up to `polls` times, `interval` apart.
    pub async fn await_failover(
        &mut self,
        polls: u32,
        interval: Duration,
    ) -> Result<FailoverCheck, DemoError> {
        let polls = polls.max(1);
        let mut last = None;
        for poll in 1..=polls {
            match self.verify_failover().await {
                Ok(check) if check.is_confirmed() => return Ok(check),
                Ok(check) => last = Some(Ok(check)),
                Err(e @ DemoError::InvalidStep { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, poll, "Failover poll failed");
                    last = Some(Err(e));
                }
            }
            if poll < polls && !self.pause(interval).await {
                return Err(DemoError::Cancelled);
            }
        }
        last.unwrap_or(Err(DemoError::Cancelled))
    }

    /// Clear stress on both instances (errors ignored) and return to idle.
    ///
    /// Returns how many clear requests were acknowledged.
    pub async fn reset(&mut self) -> usize {
        let timeout = self.policy.attempt_timeout;
        let (first, second) = join(
            with_deadline(timeout, self.api.clear_stress()),
            with_deadline(timeout, self.api.clear_stress()),
        )
        .await;

        let acknowledged = [first, second]
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(_))))
            .count();
        tracing::info!(acknowledged, "Demo reset");

        self.step = DemoStep::Idle;
        self.initial_instance = None;
        self.stressed_instance = None;
        self.cancel.send_replace(false);
        acknowledged
    }
}
