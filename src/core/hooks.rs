//! Pluggable decision hooks consulted before a task is submitted.
//!
//! Each hook receives the facts extracted from a task payload and answers with
//! an approval or a score. [`PermissiveHooks`] approves everything and is the
//! default; real fraud, risk, and market models implement [`DecisionHooks`]
//! and are injected into [`KindRouter`](super::KindRouter).

use async_trait::async_trait;
use serde::Serialize;

/// Largest single token distribution accepted: one million tokens at 18 decimals.
pub const MAX_SINGLE_DISTRIBUTION: u128 = 1_000_000 * 10u128.pow(18);

/// Referral commission rates in basis points, by level (1-based).
pub const COMMISSION_RATES_BPS: [u128; 4] = [5_000, 2_500, 1_250, 625];

/// Timestamped proof-of-contact check-in, kept once the location is validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactRecord {
    /// User address.
    pub user: String,
    /// Reported latitude.
    pub latitude: f64,
    /// Reported longitude.
    pub longitude: f64,
    /// Beacon identifier.
    pub beacon_id: String,
    /// When the check-in was vetted (ms since epoch).
    pub timestamp_ms: u128,
}

impl ContactRecord {
    /// `"<latitude>,<longitude>"`, the location string stored with the record.
    pub fn location(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Strategy interface for domain decisions.
///
/// Every method has a permissive default so implementations only override
/// the checks they care about.
#[async_trait]
pub trait DecisionHooks: Send + Sync + 'static {
    /// Approve a token distribution after the built-in address and amount checks.
    async fn approve_distribution(&self, _recipient: &str, _amount: u128, _reason: &str) -> bool {
        true
    }

    /// Performance multiplier applied to a broker's commission.
    async fn broker_multiplier(&self, _broker: &str) -> f64 {
        1.0
    }

    /// Current ETH price in quote units, `None` when unavailable.
    async fn eth_price(&self) -> Option<f64> {
        None
    }

    /// Historical average token price, `None` when unavailable.
    async fn historical_avg_price(&self) -> Option<f64> {
        None
    }

    /// Fraud screen for an order payment; `false` blocks it.
    async fn approve_payment(&self, _order_id: u64, _is_release: bool) -> bool {
        true
    }

    /// Enhanced risk score derived from the submitted base score.
    async fn enhanced_risk(&self, _user: &str, base_score: u64) -> u64 {
        base_score
    }

    /// Validate a proof-of-contact location report.
    async fn validate_location(
        &self,
        _user: &str,
        _latitude: f64,
        _longitude: f64,
        _beacon_id: &str,
    ) -> bool {
        true
    }

    /// Persist a validated check-in, e.g. by minting a timestamp token.
    /// Runs before the submission and cannot veto it.
    async fn record_contact(&self, _record: &ContactRecord) {}
}

/// Hooks that approve everything and leave scores untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveHooks;

impl DecisionHooks for PermissiveHooks {}

/// Whether `candidate` looks like a 20-byte hex address with `0x` prefix.
pub fn is_address(candidate: &str) -> bool {
    candidate
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Built-in distribution checks: a well-formed recipient and a bounded amount.
pub fn distribution_within_limits(recipient: &str, amount: u128) -> bool {
    is_address(recipient) && amount <= MAX_SINGLE_DISTRIBUTION
}

/// Commission owed for a sale at `level`, scaled by the broker multiplier.
/// Levels outside 1..=4 earn nothing.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn commission_for(sale_amount: u128, level: u32, multiplier: f64) -> u128 {
    let Some(rate) = level
        .checked_sub(1)
        .and_then(|i| COMMISSION_RATES_BPS.get(i as usize))
    else {
        return 0;
    };
    let base = sale_amount.saturating_mul(*rate) / 10_000;
    if (multiplier - 1.0).abs() < f64::EPSILON {
        return base;
    }
    (base as f64 * multiplier.max(0.0)) as u128
}

/// Whether a liquidity change is favourable given current and historical prices.
///
/// Additions need the implied token price at or above 95% of the historical
/// average, removals at or above 110%. Zero amounts and missing price data
/// allow the operation.
pub fn liquidity_favourable(
    eth_amount: u128,
    token_amount: u128,
    is_addition: bool,
    eth_price: Option<f64>,
    avg_price: Option<f64>,
) -> bool {
    if eth_amount == 0 || token_amount == 0 {
        return true;
    }
    let (Some(eth_price), Some(avg_price)) = (eth_price, avg_price) else {
        return true;
    };
    #[allow(clippy::cast_precision_loss)]
    let implied = eth_amount as f64 * eth_price / token_amount as f64;
    let floor = if is_addition { 0.95 } else { 1.1 };
    implied >= avg_price * floor
}
