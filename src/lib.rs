//! pump-trader - Trade execution engine for pump.fun bonding curves
//!
//! This crate turns a trading intent ("sell all tokens of mint M") into a correctly
//! encoded, slippage-bounded, retried and confirmed Solana transaction.

pub mod config;
pub mod chain;
pub mod trading;
pub mod types;

// Re-export main types for convenience
pub use config::TraderConfig;
pub use trading::{
    ConfirmationMode, TradeDirection, TradeError, TradeExecutor, TradeFill, TradeIntent,
    TradeResult, Trader,
};
pub use types::TokenInfo;
