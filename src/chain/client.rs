//! Network client seam and its Solana RPC implementation.
//!
//! The trade executors only talk to the ledger through [`NetworkClient`], which keeps
//! them testable against in-memory fakes and lets the RPC details live in one place.

use async_trait::async_trait;
use solana_client::{
    client_error::ClientError as RpcClientError, nonblocking::rpc_client::RpcClient,
    rpc_config::RpcSendTransactionConfig,
};
use solana_sdk::{
    account::Account,
    commitment_config::{CommitmentConfig, CommitmentLevel},
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};
use solana_transaction_status::UiTransactionEncoding;
use spl_token::{solana_program::program_pack::Pack, state::Account as TokenAccount};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument, warn};

use crate::config::TraderConfig;

/// Errors surfaced by a [`NetworkClient`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// The ledger has already processed this exact transaction.
    #[error("transaction already processed")]
    AlreadyProcessed,
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),
    /// The transaction reached the ledger and the program rejected it.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
    #[error("failed to decode account data: {0}")]
    Decode(String),
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl ClientError {
    /// Whether resubmitting the same signed transaction can still succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Rpc(_))
    }
}

impl From<RpcClientError> for ClientError {
    fn from(err: RpcClientError) -> Self {
        match err.get_transaction_error() {
            Some(TransactionError::AlreadyProcessed) => ClientError::AlreadyProcessed,
            Some(tx_err) => ClientError::TransactionFailed(tx_err.to_string()),
            None => ClientError::Rpc(err.to_string()),
        }
    }
}

/// Options applied to a single transaction submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Skip the node's pre-flight simulation
    pub skip_preflight: bool,
    /// Commitment used for pre-flight checks when they run
    pub preflight_commitment: Option<CommitmentLevel>,
    /// Rebroadcast attempts performed by the RPC node itself
    pub rpc_max_retries: Option<usize>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            skip_preflight: true,
            preflight_commitment: Some(CommitmentLevel::Processed),
            rpc_max_retries: None,
        }
    }
}

/// Settlement state of a submitted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Not yet observed at the target commitment
    Pending,
    /// Observed at the target commitment without error
    Confirmed,
    /// Landed but failed on-chain
    Failed(String),
}

/// Formal contract for everything the executors need from the ledger.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Raw token balance of an SPL token account. A missing account holds nothing.
    async fn get_token_account_balance(&self, account: &Pubkey) -> Result<u64, ClientError>;

    /// Native balance in lamports.
    async fn get_balance(&self, account: &Pubkey) -> Result<u64, ClientError>;

    /// Raw account, failing with [`ClientError::AccountNotFound`] when absent.
    async fn get_account(&self, account: &Pubkey) -> Result<Account, ClientError>;

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError>;

    /// Submits an already signed transaction and returns its signature.
    async fn send_transaction(
        &self,
        transaction: &Transaction,
        options: &SubmitOptions,
    ) -> Result<Signature, ClientError>;

    /// Polls until the signature settles. `Ok(false)` means the wait budget ran out.
    async fn confirm_transaction(&self, signature: &Signature) -> Result<bool, ClientError>;

    /// Single, non-blocking status lookup.
    async fn signature_status(&self, signature: &Signature)
        -> Result<SignatureStatus, ClientError>;
}

/// Poll `signature` until it confirms, fails on-chain, or `timeout` elapses.
///
/// Returns `Ok(false)` on timeout; the transaction may still land afterwards.
pub async fn poll_confirmation<C>(
    client: &C,
    signature: &Signature,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<bool, ClientError>
where
    C: NetworkClient + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        match client.signature_status(signature).await {
            Ok(SignatureStatus::Confirmed) => return Ok(true),
            Ok(SignatureStatus::Failed(reason)) => return Err(ClientError::TransactionFailed(reason)),
            Ok(SignatureStatus::Pending) => {}
            // Transient lookup failures do not settle anything, keep polling
            Err(e) => warn!("Signature status lookup for {} failed: {}", signature, e),
        }

        if Instant::now() >= deadline {
            warn!("Signature {} not confirmed within {:?}", signature, timeout);
            return Ok(false);
        }
        sleep(poll_interval).await;
    }
}

/// [`NetworkClient`] backed by a nonblocking Solana JSON-RPC client.
pub struct SolanaClient {
    rpc: Arc<RpcClient>,
    confirm_commitment: CommitmentConfig,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl SolanaClient {
    /// Create a new client around an existing RPC connection.
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self {
            rpc,
            confirm_commitment: CommitmentConfig::finalized(),
            confirm_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn from_config(config: &TraderConfig) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.rpc_endpoint.clone(),
            Duration::from_secs(config.rpc_timeout_seconds),
            CommitmentConfig::confirmed(),
        );
        Self::new(Arc::new(rpc)).with_confirmation(
            config.confirm_commitment(),
            Duration::from_secs(config.confirm_timeout_seconds),
            Duration::from_millis(config.confirm_poll_interval_ms),
        )
    }

    /// Set the commitment a signature must reach and how long to wait for it.
    pub fn with_confirmation(
        mut self,
        commitment: CommitmentConfig,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        self.confirm_commitment = commitment;
        self.confirm_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }
}

#[async_trait]
impl NetworkClient for SolanaClient {
    #[instrument(skip(self))]
    async fn get_token_account_balance(&self, account: &Pubkey) -> Result<u64, ClientError> {
        let response = self
            .rpc
            .get_account_with_commitment(account, self.rpc.commitment())
            .await?;

        let Some(token_account) = response.value else {
            debug!("Token account {} does not exist yet", account);
            return Ok(0);
        };

        // Token-2022 accounts append extensions after the base layout
        let base = token_account
            .data
            .get(..TokenAccount::LEN)
            .ok_or_else(|| {
                ClientError::Decode(format!(
                    "token account {} is {} bytes",
                    account,
                    token_account.data.len()
                ))
            })?;
        let unpacked =
            TokenAccount::unpack_from_slice(base).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(unpacked.amount)
    }

    #[instrument(skip(self))]
    async fn get_balance(&self, account: &Pubkey) -> Result<u64, ClientError> {
        Ok(self.rpc.get_balance(account).await?)
    }

    #[instrument(skip(self))]
    async fn get_account(&self, account: &Pubkey) -> Result<Account, ClientError> {
        self.rpc
            .get_account_with_commitment(account, self.rpc.commitment())
            .await?
            .value
            .ok_or(ClientError::AccountNotFound(*account))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    #[instrument(skip(self, transaction))]
    async fn send_transaction(
        &self,
        transaction: &Transaction,
        options: &SubmitOptions,
    ) -> Result<Signature, ClientError> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: options.preflight_commitment,
            encoding: Some(UiTransactionEncoding::Base64),
            max_retries: options.rpc_max_retries,
            ..RpcSendTransactionConfig::default()
        };
        Ok(self
            .rpc
            .send_transaction_with_config(transaction, config)
            .await?)
    }

    #[instrument(skip(self))]
    async fn confirm_transaction(&self, signature: &Signature) -> Result<bool, ClientError> {
        poll_confirmation(self, signature, self.confirm_timeout, self.poll_interval).await
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, ClientError> {
        let response = self.rpc.get_signature_statuses(&[*signature]).await?;
        let status = match response.value.into_iter().next().flatten() {
            Some(status) => status,
            None => return Ok(SignatureStatus::Pending),
        };

        if let Some(err) = status.err {
            return Ok(SignatureStatus::Failed(err.to_string()));
        }
        if status.satisfies_commitment(self.confirm_commitment) {
            Ok(SignatureStatus::Confirmed)
        } else {
            Ok(SignatureStatus::Pending)
        }
    }
}
