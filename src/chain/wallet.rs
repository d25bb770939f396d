//! Signing wallet.

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    signer::SignerError,
    transaction::Transaction,
};
use spl_associated_token_account::get_associated_token_address;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("private key is not a valid base58 or JSON byte-array keypair")]
    InvalidPrivateKey,
    #[error(transparent)]
    Signing(#[from] SignerError),
}

/// Holder of the trading keypair.
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Build a transaction paid for by this signer and sign it against `recent_blockhash`.
    fn sign_transaction(
        &self,
        instructions: &[Instruction],
        recent_blockhash: Hash,
    ) -> Result<Transaction, WalletError>;

    /// This signer's associated token account for `mint`.
    fn associated_token_address(&self, mint: &Pubkey) -> Pubkey {
        get_associated_token_address(&self.pubkey(), mint)
    }
}

/// Keypair-backed [`TransactionSigner`].
#[derive(Clone)]
pub struct Wallet {
    keypair: Arc<Keypair>,
}

impl Wallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Parse a private key given either as base58 or as a JSON array of bytes.
    pub fn from_private_key(encoded: &str) -> Result<Self, WalletError> {
        let trimmed = encoded.trim();

        if let Ok(bytes) = bs58::decode(trimmed).into_vec() {
            if let Ok(keypair) = Keypair::from_bytes(&bytes) {
                return Ok(Self::new(keypair));
            }
        }

        if trimmed.starts_with('[') {
            if let Ok(bytes) = serde_json::from_str::<Vec<u8>>(trimmed) {
                if let Ok(keypair) = Keypair::from_bytes(&bytes) {
                    return Ok(Self::new(keypair));
                }
            }
        }

        Err(WalletError::InvalidPrivateKey)
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.keypair.pubkey())
            .finish()
    }
}

impl TransactionSigner for Wallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_transaction(
        &self,
        instructions: &[Instruction],
        recent_blockhash: Hash,
    ) -> Result<Transaction, WalletError> {
        let payer = self.keypair.pubkey();
        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer));
        transaction.try_sign(&[self.keypair.as_ref()], recent_blockhash)?;
        Ok(transaction)
    }
}
