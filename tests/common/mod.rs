//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pump_trader::chain::curve::BONDING_CURVE_DISCRIMINATOR;
use pump_trader::chain::pubkeys::PUMP_PROGRAM;
use pump_trader::chain::{
    ClientError, CurveError, CurveReader, CurveState, NetworkClient, SignatureStatus, SubmitOptions,
    Wallet,
};
use pump_trader::trading::instructions::decode_payload;
use pump_trader::trading::{ExecutionContext, ExecutionSettings};
use pump_trader::TokenInfo;
use solana_sdk::{
    account::Account, hash::Hash, pubkey::Pubkey, signature::{Keypair, Signature},
    transaction::Transaction,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted ledger. Sends succeed with the transaction's own signature unless an
/// error is queued in `send_errors`.
pub struct MockNetworkClient {
    pub token_balance: Mutex<u64>,
    pub sol_balance: Mutex<u64>,
    pub send_errors: Mutex<VecDeque<ClientError>>,
    pub confirm_result: Mutex<Result<bool, ClientError>>,
    pub statuses: Mutex<HashMap<Signature, SignatureStatus>>,
    /// Failures returned by status lookups before `statuses` is consulted
    pub status_errors: Mutex<VecDeque<ClientError>>,
    pub accounts: Mutex<HashMap<Pubkey, Account>>,
    pub sent: Mutex<Vec<Transaction>>,
    pub send_calls: AtomicUsize,
    pub confirm_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl MockNetworkClient {
    pub fn new() -> Self {
        Self {
            token_balance: Mutex::new(0),
            sol_balance: Mutex::new(0),
            send_errors: Mutex::new(VecDeque::new()),
            confirm_result: Mutex::new(Ok(true)),
            statuses: Mutex::new(HashMap::new()),
            status_errors: Mutex::new(VecDeque::new()),
            accounts: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            send_calls: AtomicUsize::new(0),
            confirm_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_token_balance(self, balance: u64) -> Self {
        *self.token_balance.lock().unwrap() = balance;
        self
    }

    pub fn with_sol_balance(self, lamports: u64) -> Self {
        *self.sol_balance.lock().unwrap() = lamports;
        self
    }

    pub fn with_send_errors(self, errors: impl IntoIterator<Item = ClientError>) -> Self {
        self.send_errors.lock().unwrap().extend(errors);
        self
    }

    pub fn with_confirm_result(self, result: Result<bool, ClientError>) -> Self {
        *self.confirm_result.lock().unwrap() = result;
        self
    }

    pub fn with_status_errors(self, errors: impl IntoIterator<Item = ClientError>) -> Self {
        self.status_errors.lock().unwrap().extend(errors);
        self
    }

    pub fn with_account(self, address: Pubkey, account: Account) -> Self {
        self.accounts.lock().unwrap().insert(address, account);
        self
    }

    pub fn set_status(&self, signature: Signature, status: SignatureStatus) {
        self.statuses.lock().unwrap().insert(signature, status);
    }

    pub fn status_count(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn send_count(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_count(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }

    /// `(discriminator, amount, bound)` of the pump instruction in the last sent transaction.
    pub fn last_pump_payload(&self) -> Option<(u64, u64, u64)> {
        let sent = self.sent.lock().unwrap();
        let tx = sent.last()?;
        tx.message
            .instructions
            .iter()
            .find(|ix| tx.message.account_keys[ix.program_id_index as usize] == PUMP_PROGRAM)
            .and_then(|ix| decode_payload(&ix.data).ok())
    }

    /// Program ids of the last sent transaction, in instruction order.
    pub fn last_program_ids(&self) -> Vec<Pubkey> {
        let sent = self.sent.lock().unwrap();
        sent.last()
            .map(|tx| {
                tx.message
                    .instructions
                    .iter()
                    .map(|ix| tx.message.account_keys[ix.program_id_index as usize])
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl NetworkClient for MockNetworkClient {
    async fn get_token_account_balance(&self, _account: &Pubkey) -> Result<u64, ClientError> {
        Ok(*self.token_balance.lock().unwrap())
    }

    async fn get_balance(&self, _account: &Pubkey) -> Result<u64, ClientError> {
        Ok(*self.sol_balance.lock().unwrap())
    }

    async fn get_account(&self, account: &Pubkey) -> Result<Account, ClientError> {
        self.accounts
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .ok_or(ClientError::AccountNotFound(*account))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        Ok(Hash::new_unique())
    }

    async fn send_transaction(
        &self,
        transaction: &Transaction,
        _options: &SubmitOptions,
    ) -> Result<Signature, ClientError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(transaction.clone());

        match self.send_errors.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(transaction.signatures[0]),
        }
    }

    async fn confirm_transaction(&self, _signature: &Signature) -> Result<bool, ClientError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        self.confirm_result.lock().unwrap().clone()
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.status_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(signature)
            .cloned()
            .unwrap_or(SignatureStatus::Pending))
    }
}

pub struct MockCurveReader {
    pub result: Mutex<Result<CurveState, CurveError>>,
    pub calls: AtomicUsize,
}

impl MockCurveReader {
    pub fn new(result: Result<CurveState, CurveError>) -> Self {
        Self {
            result: Mutex::new(result),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CurveReader for MockCurveReader {
    async fn get_curve_state(&self, _bonding_curve: &Pubkey) -> Result<CurveState, CurveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

/// Curve priced at exactly 0.00005 SOL per token.
pub fn reference_curve() -> CurveState {
    CurveState {
        virtual_token_reserves: 1_000_000_000_000_000,
        virtual_sol_reserves: 50_000_000_000_000,
        real_token_reserves: 800_000_000_000_000,
        real_sol_reserves: 20_000_000_000,
        token_total_supply: 1_000_000_000_000_000,
        complete: false,
    }
}

/// Bonding curve account holding `state`, owned by `owner`.
pub fn curve_account(state: &CurveState, owner: Pubkey) -> Account {
    let mut data = BONDING_CURVE_DISCRIMINATOR.to_vec();
    data.extend(borsh::to_vec(state).unwrap());
    Account {
        lamports: 1_461_600,
        data,
        owner,
        executable: false,
        rent_epoch: 0,
    }
}

pub fn test_token() -> TokenInfo {
    TokenInfo::from_mint(Pubkey::new_unique())
}

pub fn test_settings() -> ExecutionSettings {
    ExecutionSettings {
        retry_base_delay_ms: 1,
        max_retry_delay: Duration::from_millis(1),
        ..ExecutionSettings::default()
    }
}

pub fn test_context(client: Arc<MockNetworkClient>, curve: Arc<MockCurveReader>) -> ExecutionContext {
    ExecutionContext::new(
        client,
        Arc::new(Wallet::new(Keypair::new())),
        curve,
        test_settings(),
    )
}
