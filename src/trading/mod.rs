//! Trading module - turns trade intents into confirmed transactions
//!
//! This module contains the pricing math, the pump.fun instruction builder, the buy
//! and sell executors, and the background confirmation monitor.

pub mod types;
pub mod pricing;
pub mod instructions;
pub mod executor;
pub mod seller;
pub mod buyer;
pub mod monitor;

// Re-export main types
pub use buyer::TokenBuyer;
pub use executor::{ExecutionContext, ExecutionSettings, TradeExecutor, Trader};
pub use monitor::{ConfirmationMonitor, PendingTrade, PendingTradeSender, TradeUpdateSender};
pub use seller::TokenSeller;
pub use types::{ConfirmationMode, TradeDirection, TradeError, TradeFill, TradeIntent, TradeResult};
