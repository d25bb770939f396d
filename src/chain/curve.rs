//! Bonding curve state reader.
//!
//! The curve account stores the virtual and real reserves the program prices every
//! trade against. Reserves move with every trade on the ledger, so callers fetch a
//! fresh [`CurveState`] before each decision instead of caching one.

use async_trait::async_trait;
use borsh::{BorshDeserialize, BorshSerialize};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::chain::client::{ClientError, NetworkClient};
use crate::chain::pubkeys::{LAMPORTS_PER_SOL, PUMP_PROGRAM, TOKEN_DECIMALS};

/// Anchor account discriminator of `BondingCurve`.
pub const BONDING_CURVE_DISCRIMINATOR: [u8; 8] = [23, 183, 248, 55, 96, 216, 172, 96];

/// Discriminator plus the six fields the executors price against.
pub const BONDING_CURVE_MIN_LEN: usize = 8 + 8 * 5 + 1;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CurveError {
    #[error("failed to fetch bonding curve: {0}")]
    Fetch(#[from] ClientError),
    #[error("bonding curve {account} is owned by {owner}, not the pump program")]
    WrongOwner { account: Pubkey, owner: Pubkey },
    #[error("bonding curve account is {0} bytes, too short")]
    TooShort(usize),
    #[error("invalid bonding curve discriminator")]
    InvalidDiscriminator,
    #[error("failed to decode bonding curve: {0}")]
    Decode(String),
    #[error("bonding curve has no token reserves")]
    EmptyReserves,
    #[error("bonding curve is complete, trading has migrated")]
    Complete,
}

/// Decoded snapshot of a bonding curve account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct CurveState {
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    pub complete: bool,
}

impl CurveState {
    /// Decode raw account data. Bytes past the known layout are ignored, newer program
    /// versions append fields there.
    pub fn from_account_data(data: &[u8]) -> Result<Self, CurveError> {
        if data.len() < BONDING_CURVE_MIN_LEN {
            return Err(CurveError::TooShort(data.len()));
        }
        if data[..8] != BONDING_CURVE_DISCRIMINATOR {
            return Err(CurveError::InvalidDiscriminator);
        }

        let mut fields = &data[8..];
        <CurveState as BorshDeserialize>::deserialize(&mut fields)
            .map_err(|e| CurveError::Decode(e.to_string()))
    }

    /// Spot price in SOL per whole token, from the virtual reserves.
    ///
    /// Real SOL reserves are zero on a fresh curve, so they cannot price a launch.
    /// The value is for reporting; trade bounds are computed from the reserves in
    /// `trading::pricing` without going through a rounded price.
    pub fn price(&self) -> Result<Decimal, CurveError> {
        if self.virtual_token_reserves == 0 {
            return Err(CurveError::EmptyReserves);
        }

        let ratio = Decimal::from(self.virtual_sol_reserves)
            .checked_div(Decimal::from(self.virtual_token_reserves))
            .ok_or(CurveError::EmptyReserves)?;
        let scale = Decimal::from(LAMPORTS_PER_SOL / 10u64.pow(TOKEN_DECIMALS));

        ratio
            .checked_div(scale)
            .ok_or_else(|| CurveError::Decode("price out of range".to_string()))
    }

    /// Price for a curve that can still be traded against.
    pub fn tradable_price(&self) -> Result<Decimal, CurveError> {
        if self.complete {
            return Err(CurveError::Complete);
        }
        self.price()
    }
}

/// Source of fresh curve snapshots.
#[async_trait]
pub trait CurveReader: Send + Sync {
    async fn get_curve_state(&self, bonding_curve: &Pubkey) -> Result<CurveState, CurveError>;
}

/// [`CurveReader`] that reads the account through a [`NetworkClient`].
pub struct BondingCurveManager {
    client: Arc<dyn NetworkClient>,
}

impl BondingCurveManager {
    pub fn new(client: Arc<dyn NetworkClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CurveReader for BondingCurveManager {
    #[instrument(skip(self))]
    async fn get_curve_state(&self, bonding_curve: &Pubkey) -> Result<CurveState, CurveError> {
        let account = self.client.get_account(bonding_curve).await?;

        if account.owner != PUMP_PROGRAM {
            return Err(CurveError::WrongOwner {
                account: *bonding_curve,
                owner: account.owner,
            });
        }

        let state = CurveState::from_account_data(&account.data)?;
        debug!(
            "Curve {}: virtual sol {} / virtual tokens {}",
            bonding_curve, state.virtual_sol_reserves, state.virtual_token_reserves
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(state: &CurveState) -> Vec<u8> {
        let mut data = BONDING_CURVE_DISCRIMINATOR.to_vec();
        data.extend(borsh::to_vec(state).unwrap());
        data
    }

    fn launch_curve() -> CurveState {
        CurveState {
            virtual_token_reserves: 1_073_000_000_000_000,
            virtual_sol_reserves: 30_000_000_000,
            real_token_reserves: 793_100_000_000_000,
            real_sol_reserves: 0,
            token_total_supply: 1_000_000_000_000_000,
            complete: false,
        }
    }

    #[test]
    fn test_decode_curve_account() {
        let state = CurveState::from_account_data(&encode(&launch_curve())).unwrap();

        assert_eq!(state.virtual_token_reserves, 1_073_000_000_000_000);
        assert_eq!(state.virtual_sol_reserves, 30_000_000_000);
        assert_eq!(state.real_token_reserves, 793_100_000_000_000);
        assert_eq!(state.real_sol_reserves, 0);
        assert!(!state.complete);
    }

    #[test]
    fn test_decode_ignores_trailing_creator_field() {
        let mut data = encode(&launch_curve());
        data.extend_from_slice(Pubkey::new_unique().as_ref());

        let state = CurveState::from_account_data(&data).unwrap();
        assert_eq!(state.token_total_supply, 1_000_000_000_000_000);
    }

    #[test]
    fn test_decode_rejects_short_and_foreign_accounts() {
        let data = encode(&launch_curve());
        assert_eq!(
            CurveState::from_account_data(&data[..20]),
            Err(CurveError::TooShort(20))
        );

        let mut foreign = data.clone();
        foreign[0] = 0;
        assert_eq!(
            CurveState::from_account_data(&foreign),
            Err(CurveError::InvalidDiscriminator)
        );
    }

    #[test]
    fn test_price_is_exact() {
        let state = CurveState {
            virtual_token_reserves: 1_000_000_000_000_000,
            virtual_sol_reserves: 50_000_000_000_000,
            real_token_reserves: 0,
            real_sol_reserves: 0,
            token_total_supply: 0,
            complete: false,
        };
        assert_eq!(state.price().unwrap(), Decimal::new(5, 5));
    }

    #[test]
    fn test_price_follows_virtual_reserves() {
        let state = CurveState {
            virtual_token_reserves: 1_000_000_000_000_000,
            virtual_sol_reserves: 50_000_000_000_000,
            real_token_reserves: 400_000_000_000_000,
            real_sol_reserves: 12_000_000_000,
            token_total_supply: 1_000_000_000_000_000,
            complete: false,
        };

        // real reserves alone would give 0.00000003
        assert_eq!(state.price().unwrap(), Decimal::new(5, 5));
    }

    #[test]
    fn test_launch_price() {
        let state = CurveState::from_account_data(&encode(&launch_curve())).unwrap();
        let price = state.price().unwrap();

        // 30 SOL / 1.073B tokens
        assert!(price > Decimal::new(2795, 11));
        assert!(price < Decimal::new(2796, 11));
    }

    #[test]
    fn test_price_rejects_empty_reserves() {
        let mut raw = launch_curve();
        raw.virtual_token_reserves = 0;
        let state = CurveState::from_account_data(&encode(&raw)).unwrap();
        assert_eq!(state.price(), Err(CurveError::EmptyReserves));
    }

    #[test]
    fn test_complete_curve_is_not_tradable() {
        let mut raw = launch_curve();
        raw.complete = true;
        let state = CurveState::from_account_data(&encode(&raw)).unwrap();

        assert!(state.price().is_ok());
        assert_eq!(state.tradable_price(), Err(CurveError::Complete));
    }
}
