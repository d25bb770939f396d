//! Trader configuration loaded from the environment.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use std::fmt::Display;
use std::str::FromStr;

use crate::chain::wallet::Wallet;
use crate::trading::pricing::sol_to_lamports;
use crate::trading::types::DEFAULT_MAX_RETRIES;

/// Configuration for the trade executors and the RPC client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderConfig {
    /// JSON-RPC endpoint
    pub rpc_endpoint: String,
    /// Base58 or JSON byte-array keypair of the trading wallet
    #[serde(skip_serializing)]
    pub private_key: Option<String>,
    /// SOL spent by a buy that does not name an amount
    pub buy_amount_sol: Decimal,
    pub buy_slippage: Decimal,
    pub sell_slippage: Decimal,
    /// Resubmissions of a signed transaction after the first attempt
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub rpc_timeout_seconds: u64,
    pub confirm_timeout_seconds: u64,
    pub confirm_poll_interval_ms: u64,
    /// Commitment a signature must reach to count as confirmed
    pub commitment: CommitmentLevel,
    /// How long the background monitor follows a fire-and-forget trade
    pub monitor_window_seconds: u64,
    pub priority_fee_micro_lamports: Option<u64>,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "https://api.mainnet-beta.solana.com".to_string(),
            private_key: None,
            buy_amount_sol: Decimal::new(4, 3),
            buy_slippage: Decimal::new(2, 1),
            sell_slippage: Decimal::new(2, 1),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: 500,
            max_retry_delay_ms: 5_000,
            rpc_timeout_seconds: 30,
            confirm_timeout_seconds: 60,
            confirm_poll_interval_ms: 1_000,
            commitment: CommitmentLevel::Finalized,
            monitor_window_seconds: 90,
            priority_fee_micro_lamports: None,
        }
    }
}

impl TraderConfig {
    /// Load `.env` if present, then read every known key from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults for
    /// missing or empty keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = get("RPC_ENDPOINT") {
            config.rpc_endpoint = endpoint;
        }
        config.private_key = get("PRIVATE_KEY");

        if let Some(v) = parse_value(get("BUY_AMOUNT"), "BUY_AMOUNT")? {
            config.buy_amount_sol = v;
        }
        if let Some(v) = parse_value(get("BUY_SLIPPAGE"), "BUY_SLIPPAGE")? {
            config.buy_slippage = v;
        }
        if let Some(v) = parse_value(get("SELL_SLIPPAGE"), "SELL_SLIPPAGE")? {
            config.sell_slippage = v;
        }
        if let Some(v) = parse_value(get("MAX_RETRIES"), "MAX_RETRIES")? {
            config.max_retries = v;
        }
        if let Some(v) = parse_value(get("RETRY_BASE_DELAY_MS"), "RETRY_BASE_DELAY_MS")? {
            config.retry_base_delay_ms = v;
        }
        if let Some(v) = parse_value(get("MAX_RETRY_DELAY_MS"), "MAX_RETRY_DELAY_MS")? {
            config.max_retry_delay_ms = v;
        }
        if let Some(v) = parse_value(get("RPC_TIMEOUT_SECS"), "RPC_TIMEOUT_SECS")? {
            config.rpc_timeout_seconds = v;
        }
        if let Some(v) = parse_value(get("CONFIRM_TIMEOUT_SECS"), "CONFIRM_TIMEOUT_SECS")? {
            config.confirm_timeout_seconds = v;
        }
        if let Some(v) = parse_value(get("CONFIRM_POLL_INTERVAL_MS"), "CONFIRM_POLL_INTERVAL_MS")? {
            config.confirm_poll_interval_ms = v;
        }
        if let Some(v) = parse_value(get("COMMITMENT"), "COMMITMENT")? {
            config.commitment = v;
        }
        if let Some(v) = parse_value(get("MONITOR_WINDOW_SECS"), "MONITOR_WINDOW_SECS")? {
            config.monitor_window_seconds = v;
        }
        config.priority_fee_micro_lamports =
            parse_value(get("PRIORITY_FEE_MICRO_LAMPORTS"), "PRIORITY_FEE_MICRO_LAMPORTS")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_endpoint.is_empty() {
            bail!("RPC_ENDPOINT must not be empty");
        }
        for (name, slippage) in [("BUY_SLIPPAGE", self.buy_slippage), ("SELL_SLIPPAGE", self.sell_slippage)] {
            if slippage < Decimal::ZERO || slippage >= Decimal::ONE {
                bail!("{} must be in [0, 1), got {}", name, slippage);
            }
        }
        if self.buy_amount_sol <= Decimal::ZERO {
            bail!("BUY_AMOUNT must be positive, got {}", self.buy_amount_sol);
        }
        if self.confirm_poll_interval_ms == 0 {
            bail!("CONFIRM_POLL_INTERVAL_MS must be positive");
        }
        Ok(())
    }

    /// Default buy size in lamports.
    pub fn buy_amount_lamports(&self) -> Result<u64> {
        sol_to_lamports(self.buy_amount_sol)
            .with_context(|| format!("BUY_AMOUNT {} is not a valid SOL amount", self.buy_amount_sol))
    }

    pub fn confirm_commitment(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn wallet(&self) -> Result<Wallet> {
        let key = self
            .private_key
            .as_deref()
            .context("PRIVATE_KEY is not set")?;
        Wallet::from_private_key(key).context("PRIVATE_KEY could not be parsed")
    }
}

fn parse_value<T>(raw: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {} value '{}': {}", key, value, e))
    })
    .transpose()
}
