//! Static addresses of the pump.fun program and the Solana system programs it uses.

use solana_sdk::{pubkey, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimals of every token minted by the bonding curve program.
pub const TOKEN_DECIMALS: u32 = 6;

/// Seed prefix of the bonding curve PDA.
pub const BONDING_CURVE_SEED: &[u8] = b"bonding-curve";

pub const PUMP_PROGRAM: Pubkey = pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");
pub const PUMP_GLOBAL: Pubkey = pubkey!("4wTV1YmiEkRvAtNtsSGPtUrqRYQMe5SKy2uB4Jjaxnjf");
pub const PUMP_EVENT_AUTHORITY: Pubkey = pubkey!("Ce6TQqeHC9p8KetsN6JsjHK7UTZk7nasjjnr7XxXp9F1");
pub const PUMP_FEE: Pubkey = pubkey!("CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM");
pub const PUMP_LIQUIDITY_MIGRATOR: Pubkey =
    pubkey!("39azUYFWPz3VHgKCf3VChUwbpURdCHRxjWVowf5jUJjg");

pub const SYSTEM_PROGRAM: Pubkey = pubkey!("11111111111111111111111111111111");
pub const SYSTEM_TOKEN_PROGRAM: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const SYSTEM_ASSOCIATED_TOKEN_ACCOUNT_PROGRAM: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
pub const SYSTEM_RENT: Pubkey = pubkey!("SysvarRent111111111111111111111111111111111");
pub const SOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

/// Bonding curve PDA for `mint`.
pub fn bonding_curve_address(mint: &Pubkey) -> Pubkey {
    let (bonding_curve, _bump) =
        Pubkey::find_program_address(&[BONDING_CURVE_SEED, mint.as_ref()], &PUMP_PROGRAM);
    bonding_curve
}

/// Token account holding the curve's reserves of `mint`.
pub fn associated_bonding_curve_address(bonding_curve: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(bonding_curve, mint)
}
