//! Trade intents, results and the executor error taxonomy.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Signature;
use std::fmt;
use thiserror::Error;

/// Retry budget used when an intent does not name one.
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `execute` waits for settlement before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfirmationMode {
    /// Poll until the signature settles or the client's wait budget runs out
    #[default]
    Await,
    /// Return right after submission; settlement is tracked elsewhere
    FireAndForget,
}

/// What the caller wants traded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub direction: TradeDirection,
    /// Sell: raw token units, `None` sells the whole balance.
    /// Buy: lamports to spend, `None` uses the configured buy size.
    pub amount: Option<u64>,
    /// Tolerated adverse price move as a fraction in [0, 1)
    pub slippage: Decimal,
    /// Resubmissions of the signed transaction after the first attempt
    pub max_retries: usize,
    pub confirmation: ConfirmationMode,
}

impl TradeIntent {
    /// Sell the whole token balance.
    pub fn sell_all(slippage: Decimal) -> Self {
        Self {
            direction: TradeDirection::Sell,
            amount: None,
            slippage,
            max_retries: DEFAULT_MAX_RETRIES,
            confirmation: ConfirmationMode::Await,
        }
    }

    /// Sell exactly `token_amount` raw units.
    pub fn sell(token_amount: u64, slippage: Decimal) -> Self {
        Self {
            amount: Some(token_amount),
            ..Self::sell_all(slippage)
        }
    }

    /// Spend `lamports` on the token.
    pub fn buy(lamports: u64, slippage: Decimal) -> Self {
        Self {
            direction: TradeDirection::Buy,
            amount: Some(lamports),
            ..Self::sell_all(slippage)
        }
    }

    /// Spend the configured default buy size.
    pub fn buy_default(slippage: Decimal) -> Self {
        Self {
            direction: TradeDirection::Buy,
            ..Self::sell_all(slippage)
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationMode) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Reject intents no executor can act on.
    pub fn validate(&self) -> Result<(), TradeError> {
        if self.slippage < Decimal::ZERO || self.slippage >= Decimal::ONE {
            return Err(TradeError::InvalidIntent(format!(
                "slippage {} outside [0, 1)",
                self.slippage
            )));
        }
        if self.amount == Some(0) {
            return Err(TradeError::InvalidIntent(format!(
                "{} amount must be positive",
                self.direction
            )));
        }
        Ok(())
    }
}

/// A submitted trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFill {
    pub signature: Signature,
    /// Tokens sold or bought, in whole-token units
    pub amount: Decimal,
    /// Spot price in SOL per token the bound was computed from
    pub price: Decimal,
    /// False only when the caller chose not to wait for settlement
    pub confirmed: bool,
}

/// Terminal failure classification of a trade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    /// Nothing to trade with, a no-op rather than a fault
    #[error("no balance to trade")]
    NoInventory,
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u64, available: u64 },
    #[error("invalid trade intent: {0}")]
    InvalidIntent(String),
    #[error("price unavailable: {0}")]
    PriceUnavailable(String),
    /// The network or the program rejected the transaction
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    /// Submitted but not seen settled in time, the transaction may still land
    #[error("transaction {0} not confirmed in time")]
    ConfirmationTimeout(Signature),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// The only externally observable output of a trade.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeResult {
    Success(TradeFill),
    Failure(TradeError),
}

impl TradeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TradeResult::Success(_))
    }

    pub fn fill(&self) -> Option<&TradeFill> {
        match self {
            TradeResult::Success(fill) => Some(fill),
            TradeResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TradeError> {
        match self {
            TradeResult::Success(_) => None,
            TradeResult::Failure(err) => Some(err),
        }
    }

    /// Signature of whatever was submitted, including unconfirmed submissions.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            TradeResult::Success(fill) => Some(fill.signature),
            TradeResult::Failure(TradeError::ConfirmationTimeout(signature)) => Some(*signature),
            TradeResult::Failure(_) => None,
        }
    }
}

impl From<Result<TradeFill, TradeError>> for TradeResult {
    fn from(result: Result<TradeFill, TradeError>) -> Self {
        match result {
            Ok(fill) => TradeResult::Success(fill),
            Err(err) => TradeResult::Failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sell_all_defaults() {
        let intent = TradeIntent::sell_all(Decimal::new(2, 1));

        assert_eq!(intent.direction, TradeDirection::Sell);
        assert_eq!(intent.amount, None);
        assert_eq!(intent.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(intent.confirmation, ConfirmationMode::Await);
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_validate_slippage_bounds() {
        assert!(TradeIntent::sell_all(Decimal::ZERO).validate().is_ok());
        assert!(TradeIntent::sell_all(Decimal::new(9999, 4)).validate().is_ok());
        assert!(matches!(
            TradeIntent::sell_all(Decimal::ONE).validate(),
            Err(TradeError::InvalidIntent(_))
        ));
        assert!(matches!(
            TradeIntent::sell_all(Decimal::new(-1, 2)).validate(),
            Err(TradeError::InvalidIntent(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_amount() {
        let intent = TradeIntent::buy(0, Decimal::new(2, 1));
        assert!(matches!(intent.validate(), Err(TradeError::InvalidIntent(_))));
    }

    #[test]
    fn test_result_signature_covers_timeouts() {
        let signature = Signature::new_unique();

        let timed_out = TradeResult::Failure(TradeError::ConfirmationTimeout(signature));
        assert_eq!(timed_out.signature(), Some(signature));
        assert!(!timed_out.is_success());

        let no_inventory = TradeResult::Failure(TradeError::NoInventory);
        assert_eq!(no_inventory.signature(), None);
        assert_eq!(no_inventory.error(), Some(&TradeError::NoInventory));
    }
}
