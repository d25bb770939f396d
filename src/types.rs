//! Core types shared by the curve reader and the trade executors.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::chain::pubkeys;

/// A token tradable on the bonding curve program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The mint address of the token
    pub mint: Pubkey,
    /// The bonding curve account holding the curve state for this mint
    pub bonding_curve: Pubkey,
    /// The curve's associated token account holding its token reserves
    pub associated_bonding_curve: Pubkey,
}

impl TokenInfo {
    pub fn new(mint: Pubkey, bonding_curve: Pubkey, associated_bonding_curve: Pubkey) -> Self {
        Self {
            mint,
            bonding_curve,
            associated_bonding_curve,
        }
    }

    /// Derive the protocol-owned accounts for `mint`.
    pub fn from_mint(mint: Pubkey) -> Self {
        let bonding_curve = pubkeys::bonding_curve_address(&mint);
        let associated_bonding_curve =
            pubkeys::associated_bonding_curve_address(&bonding_curve, &mint);
        Self::new(mint, bonding_curve, associated_bonding_curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mint_is_deterministic() {
        let mint = Pubkey::new_unique();
        let first = TokenInfo::from_mint(mint);
        let second = TokenInfo::from_mint(mint);

        assert_eq!(first, second);
        assert_eq!(first.mint, mint);
        assert_ne!(first.bonding_curve, first.associated_bonding_curve);
    }

    #[test]
    fn test_from_mint_differs_per_mint() {
        let a = TokenInfo::from_mint(Pubkey::new_unique());
        let b = TokenInfo::from_mint(Pubkey::new_unique());
        assert_ne!(a.bonding_curve, b.bonding_curve);
    }
}
