//! ConfirmationMonitor - follows fire-and-forget trades until they settle
//!
//! Executors running in fire-and-forget mode hand their signature to this monitor
//! instead of blocking on confirmation. The monitor polls signature statuses and
//! publishes one final `TradeResult` per tracked trade.

use rust_decimal::Decimal;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{error, info, warn};

use crate::chain::client::{NetworkClient, SignatureStatus};
use crate::trading::types::{TradeDirection, TradeError, TradeFill, TradeResult};

/// A submitted trade whose settlement has not been observed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTrade {
    pub signature: Signature,
    pub mint: Pubkey,
    pub direction: TradeDirection,
    /// Whole tokens sold or bought
    pub amount: Decimal,
    pub price: Decimal,
    /// Unix timestamp in milliseconds after which the trade is reported as timed out
    pub monitor_until: u64,
}

impl PendingTrade {
    fn fill(&self, confirmed: bool) -> TradeFill {
        TradeFill {
            signature: self.signature,
            amount: self.amount,
            price: self.price,
            confirmed,
        }
    }
}

pub type PendingTradeSender = mpsc::Sender<PendingTrade>;
pub type PendingTradeReceiver = mpsc::Receiver<PendingTrade>;
pub type TradeUpdateSender = mpsc::Sender<(Signature, TradeResult)>;
pub type TradeUpdateReceiver = mpsc::Receiver<(Signature, TradeResult)>;

pub struct ConfirmationMonitor {
    client: Arc<dyn NetworkClient>,
    active_trades: Vec<PendingTrade>,
    update_sender: TradeUpdateSender,
    monitor_interval: Duration,
}

impl ConfirmationMonitor {
    pub fn new(
        client: Arc<dyn NetworkClient>,
        update_sender: TradeUpdateSender,
        monitor_interval_ms: u64,
    ) -> Self {
        Self {
            client,
            active_trades: Vec::new(),
            update_sender,
            // a zero period would make `interval` panic
            monitor_interval: Duration::from_millis(monitor_interval_ms.max(1)),
        }
    }

    /// Track new trades and poll the active ones until every sender is gone and
    /// nothing is left to resolve.
    pub async fn run(mut self, mut pending_receiver: PendingTradeReceiver) {
        info!("ConfirmationMonitor is running...");
        let mut receiver_open = true;
        let mut ticker = interval(self.monitor_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                pending = pending_receiver.recv(), if receiver_open => {
                    match pending {
                        Some(trade) => {
                            info!("Tracking {} of {}: {}", trade.direction, trade.mint, trade.signature);
                            self.active_trades.push(trade);
                        }
                        None => receiver_open = false,
                    }
                },
                _ = ticker.tick() => {
                    self.process_active_trades().await;
                },
            }

            if !receiver_open && self.active_trades.is_empty() {
                info!("ConfirmationMonitor has nothing left to track. Shutting down.");
                break;
            }
        }
    }

    async fn process_active_trades(&mut self) {
        let now = chrono::Utc::now().timestamp_millis() as u64;
        let mut resolved = Vec::new();

        for (i, trade) in self.active_trades.iter().enumerate() {
            let outcome = match self.client.signature_status(&trade.signature).await {
                Ok(SignatureStatus::Confirmed) => {
                    info!("Trade {} confirmed", trade.signature);
                    Some(TradeResult::Success(trade.fill(true)))
                }
                Ok(SignatureStatus::Failed(reason)) => {
                    error!("Trade {} failed on-chain: {}", trade.signature, reason);
                    Some(TradeResult::Failure(TradeError::SubmissionFailed(reason)))
                }
                Ok(SignatureStatus::Pending) => None,
                Err(e) => {
                    warn!("Status lookup for {} failed: {}", trade.signature, e);
                    None
                }
            };

            let outcome = outcome.or_else(|| {
                (trade.monitor_until < now).then(|| {
                    warn!("Monitoring for trade {} expired", trade.signature);
                    TradeResult::Failure(TradeError::ConfirmationTimeout(trade.signature))
                })
            });

            if let Some(result) = outcome {
                if let Err(e) = self.update_sender.send((trade.signature, result)).await {
                    error!("Failed to send trade update: {}", e);
                }
                resolved.push(i);
            }
        }

        for i in resolved.into_iter().rev() {
            self.active_trades.remove(i);
        }
    }

    /// Trades still waiting for settlement.
    pub fn get_active_trades(&self) -> &[PendingTrade] {
        &self.active_trades
    }
}
