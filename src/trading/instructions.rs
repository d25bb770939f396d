//! Builds pump.fun buy/sell instructions.
//!
//! Account order, writable/signer flags and the payload layout are the program's ABI.
//! A deviation is not caught locally, the network rejects the transaction, so the
//! builders below are kept free of any conditional logic.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use std::io;
use thiserror::Error;

use crate::chain::pubkeys::{
    PUMP_EVENT_AUTHORITY, PUMP_FEE, PUMP_GLOBAL, PUMP_PROGRAM, SYSTEM_ASSOCIATED_TOKEN_ACCOUNT_PROGRAM,
    SYSTEM_PROGRAM, SYSTEM_RENT, SYSTEM_TOKEN_PROGRAM,
};
use crate::types::TokenInfo;

pub const SELL_DISCRIMINATOR: u64 = 12502976635542562355;
pub const BUY_DISCRIMINATOR: u64 = 16927863322537952870;

/// Discriminator plus amount plus bound.
pub const PAYLOAD_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("instruction payload is {0} bytes, expected 24")]
    InvalidLength(usize),
    #[error(transparent)]
    Serialization(#[from] io::Error),
}

/// Instruction data shared by buy and sell, all fields little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TradePayload {
    pub discriminator: u64,
    /// Sell: tokens to sell. Buy: tokens to receive.
    pub amount: u64,
    /// Sell: minimum lamports out. Buy: maximum lamports in.
    pub bound: u64,
}

impl TradePayload {
    pub fn sell(token_amount: u64, min_sol_output: u64) -> Self {
        Self {
            discriminator: SELL_DISCRIMINATOR,
            amount: token_amount,
            bound: min_sol_output,
        }
    }

    pub fn buy(token_amount: u64, max_sol_cost: u64) -> Self {
        Self {
            discriminator: BUY_DISCRIMINATOR,
            amount: token_amount,
            bound: max_sol_cost,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, InstructionError> {
        let mut data = Vec::with_capacity(PAYLOAD_LEN);
        self.serialize(&mut data)?;
        Ok(data)
    }

    pub fn decode(data: &[u8]) -> Result<Self, InstructionError> {
        if data.len() != PAYLOAD_LEN {
            return Err(InstructionError::InvalidLength(data.len()));
        }
        Ok(Self::try_from_slice(data)?)
    }
}

/// Split instruction data into `(discriminator, amount, bound)`.
pub fn decode_payload(data: &[u8]) -> Result<(u64, u64, u64), InstructionError> {
    let payload = TradePayload::decode(data)?;
    Ok((payload.discriminator, payload.amount, payload.bound))
}

/// Per-trade accounts. Everything else in the account list is a fixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeAccounts {
    pub mint: Pubkey,
    pub bonding_curve: Pubkey,
    pub associated_bonding_curve: Pubkey,
    pub user_token_account: Pubkey,
    pub user: Pubkey,
}

impl TradeAccounts {
    pub fn new(token: &TokenInfo, user: Pubkey, user_token_account: Pubkey) -> Self {
        Self {
            mint: token.mint,
            bonding_curve: token.bonding_curve,
            associated_bonding_curve: token.associated_bonding_curve,
            user_token_account,
            user,
        }
    }
}

fn sell_metas(accounts: &TradeAccounts) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(PUMP_GLOBAL, false),
        AccountMeta::new(PUMP_FEE, false),
        AccountMeta::new_readonly(accounts.mint, false),
        AccountMeta::new(accounts.bonding_curve, false),
        AccountMeta::new(accounts.associated_bonding_curve, false),
        AccountMeta::new(accounts.user_token_account, false),
        AccountMeta::new(accounts.user, true),
        AccountMeta::new_readonly(SYSTEM_PROGRAM, false),
        AccountMeta::new_readonly(SYSTEM_ASSOCIATED_TOKEN_ACCOUNT_PROGRAM, false),
        AccountMeta::new_readonly(SYSTEM_TOKEN_PROGRAM, false),
        AccountMeta::new_readonly(PUMP_EVENT_AUTHORITY, false),
        AccountMeta::new_readonly(PUMP_PROGRAM, false),
    ]
}

fn buy_metas(accounts: &TradeAccounts) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new_readonly(PUMP_GLOBAL, false),
        AccountMeta::new(PUMP_FEE, false),
        AccountMeta::new_readonly(accounts.mint, false),
        AccountMeta::new(accounts.bonding_curve, false),
        AccountMeta::new(accounts.associated_bonding_curve, false),
        AccountMeta::new(accounts.user_token_account, false),
        AccountMeta::new(accounts.user, true),
        AccountMeta::new_readonly(SYSTEM_PROGRAM, false),
        AccountMeta::new_readonly(SYSTEM_TOKEN_PROGRAM, false),
        AccountMeta::new_readonly(SYSTEM_RENT, false),
        AccountMeta::new_readonly(PUMP_EVENT_AUTHORITY, false),
        AccountMeta::new_readonly(PUMP_PROGRAM, false),
    ]
}

/// Sell `token_amount` raw units for at least `min_sol_output` lamports.
pub fn build_sell(
    accounts: &TradeAccounts,
    token_amount: u64,
    min_sol_output: u64,
) -> Result<Instruction, InstructionError> {
    Ok(Instruction {
        program_id: PUMP_PROGRAM,
        accounts: sell_metas(accounts),
        data: TradePayload::sell(token_amount, min_sol_output).encode()?,
    })
}

/// Buy `token_amount` raw units for at most `max_sol_cost` lamports.
pub fn build_buy(
    accounts: &TradeAccounts,
    token_amount: u64,
    max_sol_cost: u64,
) -> Result<Instruction, InstructionError> {
    Ok(Instruction {
        program_id: PUMP_PROGRAM,
        accounts: buy_metas(accounts),
        data: TradePayload::buy(token_amount, max_sol_cost).encode()?,
    })
}

/// Create the user's token account if it does not exist yet, a no-op otherwise.
pub fn create_user_token_account(accounts: &TradeAccounts) -> Instruction {
    create_associated_token_account_idempotent(
        &accounts.user,
        &accounts.user,
        &accounts.mint,
        &SYSTEM_TOKEN_PROGRAM,
    )
}

pub fn compute_unit_price(micro_lamports: u64) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_price(micro_lamports)
}
