//! Capability-keyed executor that vets a task per kind before submission.
//!
//! [`KindRouter`] extracts the typed fields each [`TaskKind`] requires,
//! consults the injected [`DecisionHooks`], and forwards an [`Action`] to an
//! external [`Submitter`]. A hook rejection is a reported failure
//! (`Ok(false)`); a malformed payload is a fault.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::agent::Agent;
use super::error::ExecutionError;
use super::executor::TaskExecutor;
use super::hooks::{
    commission_for, distribution_within_limits, liquidity_favourable, ContactRecord,
    DecisionHooks,
};
use super::task::{Payload, Task, TaskKind};
use crate::util::clock::{Clock, SystemClock};

/// Upper bound on the gas limit attached to any submission.
pub const GAS_LIMIT_CEILING: u64 = 2_000_000;

/// Vetted, typed action derived from a task payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Transfer `amount` base units to `recipient`.
    TokenDistribution {
        /// Recipient address.
        recipient: String,
        /// Amount in base units.
        amount: u128,
        /// Free-form reason recorded with the transfer.
        reason: String,
    },
    /// Pay a referral commission.
    Commission {
        /// Broker address.
        broker: String,
        /// Sale amount in base units.
        sale_amount: u128,
        /// Referral depth, 1-based.
        level: u32,
        /// Computed commission in base units.
        commission: u128,
    },
    /// Add or remove liquidity.
    Liquidity {
        /// ETH side of the position.
        eth_amount: u128,
        /// Token side of the position.
        token_amount: u128,
        /// `true` to add, `false` to remove.
        is_addition: bool,
    },
    /// Release or refund an escrowed payment.
    Payment {
        /// Order identifier.
        order_id: u64,
        /// `true` to release to the seller.
        is_release: bool,
    },
    /// Record a KYC decision.
    Kyc {
        /// User address.
        user: String,
        /// Verification outcome.
        is_verified: bool,
        /// Risk score after enhancement.
        risk_score: u64,
    },
    /// Record a proof-of-contact check-in.
    Poc {
        /// User address.
        user: String,
        /// Reported latitude.
        latitude: f64,
        /// Reported longitude.
        longitude: f64,
        /// Beacon identifier.
        beacon_id: String,
    },
}

/// Everything the external collaborator needs to perform one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    /// Task identifier.
    pub task_id: String,
    /// Executing agent identifier.
    pub agent_id: String,
    /// Task target reference.
    pub target: String,
    /// Gas limit: the agent's budget capped at [`GAS_LIMIT_CEILING`].
    pub gas_limit: u64,
    /// Vetted action.
    pub action: Action,
}

/// External collaborator that performs a vetted submission.
#[async_trait]
pub trait Submitter: Send + Sync + 'static {
    /// Perform the submission; `Ok(true)` when it was accepted.
    async fn submit(&self, submission: Submission) -> Result<bool, ExecutionError>;
}

/// Executor that routes each task kind through payload extraction and hooks.
pub struct KindRouter<H, S> {
    hooks: H,
    submitter: S,
    clock: Arc<dyn Clock>,
}

impl<H, S> KindRouter<H, S>
where
    H: DecisionHooks,
    S: Submitter,
{
    /// Create a router stamping contact records with the system clock.
    pub fn new(hooks: H, submitter: S) -> Self {
        Self {
            hooks,
            submitter,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used for contact records.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the action for `task`, or `None` when a hook rejects it.
    pub async fn vet(&self, task: &Task) -> Result<Option<Action>, ExecutionError> {
        let p = &task.payload;
        let action = match task.kind {
            TaskKind::TokenDistribution => {
                let recipient = field_str(p, "recipient")?;
                let amount = field_u128(p, "amount")?;
                let reason = optional_str(p, "reason")?.unwrap_or("Automated distribution");
                if !distribution_within_limits(recipient, amount)
                    || !self.hooks.approve_distribution(recipient, amount, reason).await
                {
                    tracing::warn!(task = %task.id, recipient, "token distribution rejected");
                    return Ok(None);
                }
                Action::TokenDistribution {
                    recipient: recipient.to_string(),
                    amount,
                    reason: reason.to_string(),
                }
            }
            TaskKind::CommissionCalculation => {
                let broker = field_str(p, "broker")?;
                let sale_amount = field_u128(p, "sale_amount")?;
                let level = u32::try_from(field_u64(p, "level")?)
                    .map_err(|_| ExecutionError::invalid_payload("level", "out of range"))?;
                let multiplier = self.hooks.broker_multiplier(broker).await;
                Action::Commission {
                    broker: broker.to_string(),
                    sale_amount,
                    level,
                    commission: commission_for(sale_amount, level, multiplier),
                }
            }
            TaskKind::LiquidityManagement => {
                let eth_amount = field_u128(p, "eth_amount")?;
                let token_amount = field_u128(p, "token_amount")?;
                let is_addition = field_bool(p, "is_addition")?;
                let eth_price = self.hooks.eth_price().await;
                let avg_price = self.hooks.historical_avg_price().await;
                let favourable = liquidity_favourable(
                    eth_amount,
                    token_amount,
                    is_addition,
                    eth_price,
                    avg_price,
                );
                if !favourable {
                    tracing::info!(task = %task.id, "market conditions unfavourable, deferring");
                    return Ok(None);
                }
                Action::Liquidity {
                    eth_amount,
                    token_amount,
                    is_addition,
                }
            }
            TaskKind::PaymentProcessing => {
                let order_id = field_u64(p, "order_id")?;
                let is_release = field_bool(p, "is_release")?;
                if !self.hooks.approve_payment(order_id, is_release).await {
                    tracing::warn!(task = %task.id, order_id, "payment flagged by fraud screen");
                    return Ok(None);
                }
                Action::Payment {
                    order_id,
                    is_release,
                }
            }
            TaskKind::KycVerification => {
                let user = field_str(p, "user")?;
                let is_verified = field_bool(p, "is_verified")?;
                let base = field_u64(p, "risk_score")?;
                Action::Kyc {
                    user: user.to_string(),
                    is_verified,
                    risk_score: self.hooks.enhanced_risk(user, base).await,
                }
            }
            TaskKind::PocVerification => {
                let user = field_str(p, "user")?;
                let latitude = field_f64(p, "latitude")?;
                let longitude = field_f64(p, "longitude")?;
                let beacon_id = field_str(p, "beacon_id")?;
                if !self
                    .hooks
                    .validate_location(user, latitude, longitude, beacon_id)
                    .await
                {
                    tracing::warn!(task = %task.id, user, "location validation failed");
                    return Ok(None);
                }
                let record = ContactRecord {
                    user: user.to_string(),
                    latitude,
                    longitude,
                    beacon_id: beacon_id.to_string(),
                    timestamp_ms: self.clock.now_ms(),
                };
                tracing::info!(
                    task = %task.id,
                    user,
                    location = %record.location(),
                    "recording proof of contact"
                );
                self.hooks.record_contact(&record).await;
                Action::Poc {
                    user: user.to_string(),
                    latitude,
                    longitude,
                    beacon_id: beacon_id.to_string(),
                }
            }
        };
        Ok(Some(action))
    }
}

#[async_trait]
impl<H, S> TaskExecutor for KindRouter<H, S>
where
    H: DecisionHooks,
    S: Submitter,
{
    async fn execute(&self, task: &Task, agent: &Agent) -> Result<bool, ExecutionError> {
        let Some(action) = self.vet(task).await? else {
            return Ok(false);
        };
        let submission = Submission {
            task_id: task.id.clone(),
            agent_id: agent.id().to_string(),
            target: task.target.clone(),
            gas_limit: agent.config.max_gas.min(GAS_LIMIT_CEILING),
            action,
        };
        let gas = submission.gas_limit;
        tracing::debug!(task = %task.id, agent = agent.id(), gas, "submitting");
        self.submitter.submit(submission).await
    }
}

fn field<'a>(p: &'a Payload, name: &str) -> Result<&'a serde_json::Value, ExecutionError> {
    p.get(name)
        .ok_or_else(|| ExecutionError::invalid_payload(name, "missing"))
}

fn field_str<'a>(p: &'a Payload, name: &str) -> Result<&'a str, ExecutionError> {
    field(p, name)?
        .as_str()
        .ok_or_else(|| ExecutionError::invalid_payload(name, "expected string"))
}

fn optional_str<'a>(p: &'a Payload, name: &str) -> Result<Option<&'a str>, ExecutionError> {
    match p.get(name) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| ExecutionError::invalid_payload(name, "expected string")),
    }
}

fn field_u64(p: &Payload, name: &str) -> Result<u64, ExecutionError> {
    field(p, name)?
        .as_u64()
        .ok_or_else(|| ExecutionError::invalid_payload(name, "expected unsigned integer"))
}

/// Amounts may exceed `u64`, so decimal strings are accepted too.
fn field_u128(p: &Payload, name: &str) -> Result<u128, ExecutionError> {
    let value = field(p, name)?;
    if let Some(n) = value.as_u64() {
        return Ok(u128::from(n));
    }
    value
        .as_str()
        .and_then(|s| s.parse::<u128>().ok())
        .ok_or_else(|| ExecutionError::invalid_payload(name, "expected unsigned integer"))
}

fn field_bool(p: &Payload, name: &str) -> Result<bool, ExecutionError> {
    field(p, name)?
        .as_bool()
        .ok_or_else(|| ExecutionError::invalid_payload(name, "expected boolean"))
}

fn field_f64(p: &Payload, name: &str) -> Result<f64, ExecutionError> {
    field(p, name)?
        .as_f64()
        .ok_or_else(|| ExecutionError::invalid_payload(name, "expected number"))
}
