//! Chain module - everything that touches Solana directly
//!
//! This module contains the static address registry, the network client and signer
//! seams consumed by the trade executors, and the bonding curve state reader.

pub mod pubkeys;
pub mod client;
pub mod wallet;
pub mod curve;

// Re-export main types
pub use client::{
    poll_confirmation, ClientError, NetworkClient, SignatureStatus, SolanaClient, SubmitOptions,
};
pub use curve::{BondingCurveManager, CurveError, CurveReader, CurveState};
pub use wallet::{TransactionSigner, Wallet, WalletError};
