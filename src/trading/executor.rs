//! Shared trade lifecycle: submission with retries, confirmation, dispatch.
//!
//! A trade signs its transaction exactly once. Every retry resubmits the same bytes,
//! so the ledger deduplicates by signature and a retry can never execute twice.

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signature};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, instrument, warn};

use crate::chain::client::{ClientError, NetworkClient, SubmitOptions};
use crate::chain::curve::{CurveReader, CurveState};
use crate::chain::wallet::TransactionSigner;
use crate::config::TraderConfig;
use crate::trading::buyer::TokenBuyer;
use crate::trading::instructions::{compute_unit_price, InstructionError};
use crate::trading::monitor::{PendingTrade, PendingTradeSender};
use crate::trading::pricing::PricingError;
use crate::trading::seller::TokenSeller;
use crate::trading::types::{ConfirmationMode, TradeDirection, TradeError, TradeFill, TradeIntent, TradeResult};
use crate::types::TokenInfo;

/// Tunables shared by every executor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSettings {
    /// Budget of a buy intent that does not name one
    pub default_buy_lamports: u64,
    pub retry_base_delay_ms: u64,
    pub max_retry_delay: Duration,
    /// How long the monitor follows a fire-and-forget trade
    pub monitor_window: Duration,
    pub priority_fee_micro_lamports: Option<u64>,
    pub submit_options: SubmitOptions,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            default_buy_lamports: 4_000_000,
            retry_base_delay_ms: 500,
            max_retry_delay: Duration::from_secs(5),
            monitor_window: Duration::from_secs(90),
            priority_fee_micro_lamports: None,
            submit_options: SubmitOptions::default(),
        }
    }
}

impl ExecutionSettings {
    pub fn from_config(config: &TraderConfig) -> anyhow::Result<Self> {
        Ok(Self {
            default_buy_lamports: config.buy_amount_lamports()?,
            retry_base_delay_ms: config.retry_base_delay_ms,
            max_retry_delay: Duration::from_millis(config.max_retry_delay_ms),
            monitor_window: Duration::from_secs(config.monitor_window_seconds),
            priority_fee_micro_lamports: config.priority_fee_micro_lamports,
            submit_options: SubmitOptions::default(),
        })
    }
}

/// Collaborators an executor works through. Cheap to clone, everything is shared.
#[derive(Clone)]
pub struct ExecutionContext {
    pub client: Arc<dyn NetworkClient>,
    pub signer: Arc<dyn TransactionSigner>,
    pub curve_reader: Arc<dyn CurveReader>,
    pub settings: ExecutionSettings,
    pub monitor: Option<PendingTradeSender>,
}

impl ExecutionContext {
    pub fn new(
        client: Arc<dyn NetworkClient>,
        signer: Arc<dyn TransactionSigner>,
        curve_reader: Arc<dyn CurveReader>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            client,
            signer,
            curve_reader,
            settings,
            monitor: None,
        }
    }

    /// Hand fire-and-forget trades to a running `ConfirmationMonitor`.
    pub fn with_monitor(mut self, monitor: PendingTradeSender) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Fresh curve snapshot of a token that can still trade, with its spot price.
    pub async fn quote(&self, token: &TokenInfo) -> Result<(CurveState, Decimal), TradeError> {
        self.curve_reader
            .get_curve_state(&token.bonding_curve)
            .await
            .and_then(|state| Ok((state, state.tradable_price()?)))
            .map_err(|e| TradeError::PriceUnavailable(e.to_string()))
    }

    /// Instructions every transaction starts with.
    pub fn preamble(&self) -> Vec<Instruction> {
        self.settings
            .priority_fee_micro_lamports
            .map(compute_unit_price)
            .into_iter()
            .collect()
    }

    /// Sign `instructions` once and submit them, resubmitting the identical
    /// transaction up to `max_retries` times on transient failures.
    #[instrument(skip(self, instructions))]
    pub async fn submit(
        &self,
        instructions: &[Instruction],
        max_retries: usize,
    ) -> Result<Signature, TradeError> {
        let blockhash = self
            .client
            .get_latest_blockhash()
            .await
            .map_err(|e| TradeError::SubmissionFailed(format!("failed to fetch blockhash: {}", e)))?;

        let transaction = self
            .signer
            .sign_transaction(instructions, blockhash)
            .map_err(|e| TradeError::Unexpected(format!("failed to sign transaction: {}", e)))?;
        let signature = transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| TradeError::Unexpected("signed transaction has no signature".to_string()))?;

        let retry_strategy = ExponentialBackoff::from_millis(self.settings.retry_base_delay_ms)
            .max_delay(self.settings.max_retry_delay)
            .take(max_retries);

        let tx = &transaction;
        let options = &self.settings.submit_options;
        let client = &self.client;

        let result = RetryIf::spawn(
            retry_strategy,
            || async move {
                debug!("Sending transaction {}", signature);
                client.send_transaction(tx, options).await
            },
            |err: &ClientError| {
                if err.is_retryable() {
                    warn!("Submission of {} failed, retrying: {}", signature, err);
                    true
                } else {
                    false
                }
            },
        )
        .await;

        match result {
            Ok(sent) => {
                info!("Transaction sent: {}", sent);
                Ok(sent)
            }
            Err(ClientError::AlreadyProcessed) => {
                info!("Transaction {} was already processed", signature);
                Ok(signature)
            }
            Err(e) => Err(TradeError::SubmissionFailed(e.to_string())),
        }
    }

    /// Block until `signature` settles or the client's wait budget runs out.
    pub async fn confirm(&self, signature: &Signature) -> Result<(), TradeError> {
        match self.client.confirm_transaction(signature).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TradeError::ConfirmationTimeout(*signature)),
            Err(ClientError::TransactionFailed(reason)) => Err(TradeError::SubmissionFailed(reason)),
            Err(e) => Err(TradeError::Unexpected(format!(
                "confirmation of {} failed: {}",
                signature, e
            ))),
        }
    }

    /// Confirm a submitted trade, or hand it off when the caller does not wait.
    pub async fn finish(
        &self,
        mint: &Pubkey,
        direction: TradeDirection,
        mut fill: TradeFill,
        mode: ConfirmationMode,
    ) -> Result<TradeFill, TradeError> {
        match mode {
            ConfirmationMode::Await => {
                self.confirm(&fill.signature).await?;
                fill.confirmed = true;
            }
            ConfirmationMode::FireAndForget => self.track(mint, direction, &fill).await,
        }
        Ok(fill)
    }

    async fn track(&self, mint: &Pubkey, direction: TradeDirection, fill: &TradeFill) {
        let Some(monitor) = &self.monitor else {
            debug!("No monitor attached, {} is not tracked", fill.signature);
            return;
        };

        let pending = PendingTrade {
            signature: fill.signature,
            mint: *mint,
            direction,
            amount: fill.amount,
            price: fill.price,
            monitor_until: chrono::Utc::now().timestamp_millis() as u64
                + self.settings.monitor_window.as_millis() as u64,
        };
        if let Err(e) = monitor.send(pending).await {
            warn!("Failed to hand {} to the monitor: {}", fill.signature, e);
        }
    }
}

impl From<PricingError> for TradeError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidSlippage(_) => TradeError::InvalidIntent(err.to_string()),
            PricingError::EmptyReserves => TradeError::PriceUnavailable(err.to_string()),
            _ => TradeError::Unexpected(err.to_string()),
        }
    }
}

impl From<InstructionError> for TradeError {
    fn from(err: InstructionError) -> Self {
        TradeError::Unexpected(format!("failed to build instruction: {}", err))
    }
}

pub(crate) fn ensure_direction(intent: &TradeIntent, expected: TradeDirection) -> Result<(), TradeError> {
    if intent.direction != expected {
        return Err(TradeError::InvalidIntent(format!(
            "{} intent given to the {} executor",
            intent.direction, expected
        )));
    }
    Ok(())
}

/// Log the terminal state of a trade.
pub(crate) fn log_outcome(direction: TradeDirection, token: &TokenInfo, result: &TradeResult) {
    match result {
        TradeResult::Success(fill) if fill.confirmed => info!(
            "{} of {} {} at {} SOL confirmed: {}",
            direction, fill.amount, token.mint, fill.price, fill.signature
        ),
        TradeResult::Success(fill) => info!(
            "{} of {} {} at {} SOL submitted without waiting: {}",
            direction, fill.amount, token.mint, fill.price, fill.signature
        ),
        TradeResult::Failure(TradeError::NoInventory) => {
            info!("Nothing to {} for {}", direction, token.mint)
        }
        TradeResult::Failure(TradeError::ConfirmationTimeout(signature)) => warn!(
            "{} of {} not confirmed in time, it may still land: {}",
            direction, token.mint, signature
        ),
        TradeResult::Failure(err) => error!("{} of {} failed: {}", direction, token.mint, err),
    }
}

/// Anything that can carry out a [`TradeIntent`].
#[async_trait]
pub trait Trader: Send + Sync {
    /// Run one trade to completion. Never panics, every failure is a `TradeResult::Failure`.
    async fn execute(&self, token: &TokenInfo, intent: &TradeIntent) -> TradeResult;
}

/// The closed set of executors.
pub enum TradeExecutor {
    Buy(TokenBuyer),
    Sell(TokenSeller),
}

impl TradeExecutor {
    pub fn for_direction(direction: TradeDirection, ctx: ExecutionContext) -> Self {
        match direction {
            TradeDirection::Buy => TradeExecutor::Buy(TokenBuyer::new(ctx)),
            TradeDirection::Sell => TradeExecutor::Sell(TokenSeller::new(ctx)),
        }
    }

    pub fn direction(&self) -> TradeDirection {
        match self {
            TradeExecutor::Buy(_) => TradeDirection::Buy,
            TradeExecutor::Sell(_) => TradeDirection::Sell,
        }
    }
}

#[async_trait]
impl Trader for TradeExecutor {
    async fn execute(&self, token: &TokenInfo, intent: &TradeIntent) -> TradeResult {
        match self {
            TradeExecutor::Buy(buyer) => buyer.execute(token, intent).await,
            TradeExecutor::Sell(seller) => seller.execute(token, intent).await,
        }
    }
}
