//! In-memory collaborators for tests
//!
//! `MockLedger` and `InMemoryDirectory` stand in for the RPC node and the
//! pool directory so whole operations can run without a network.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};

use crate::client::{Ledger, PoolDirectory, TransactionSigner};
use crate::core::{
    BlockhashReference, MintInfo, PoolRecord, SdkError, SdkResult, SignatureState, TokenBalance,
    TradeRecord,
};
use crate::protocol::{holder_address, PdaBuilder};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct LedgerState {
    lamports: HashMap<Pubkey, u64>,
    accounts: HashSet<Pubkey>,
    token_accounts: HashMap<Pubkey, (Pubkey, u64)>,
    mints: HashMap<Pubkey, MintInfo>,
    statuses: VecDeque<SignatureState>,
    final_status: Option<SignatureState>,
    block_height: u64,
    last_valid_block_height: u64,
    send_error: Option<String>,
    sent: Vec<Transaction>,
}

/// Scriptable in-memory ledger
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                block_height: 100,
                last_valid_block_height: 250,
                ..LedgerState::default()
            }),
        }
    }

    pub fn set_lamports(&self, address: Pubkey, lamports: u64) {
        lock(&self.state).lamports.insert(address, lamports);
    }

    /// Mark a non-token account as existing
    pub fn add_account(&self, address: Pubkey) {
        lock(&self.state).accounts.insert(address);
    }

    pub fn add_mint(&self, mint: Pubkey, decimals: u8, supply: u64) {
        lock(&self.state).mints.insert(mint, MintInfo { decimals, supply });
    }

    /// Create or overwrite a token holder
    pub fn set_token_balance(&self, holder: Pubkey, mint: Pubkey, amount: u64) {
        lock(&self.state).token_accounts.insert(holder, (mint, amount));
    }

    /// Convenience for the canonical holder of `(owner, mint)`
    pub fn fund(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Pubkey {
        let holder = holder_address(owner, mint);
        self.set_token_balance(holder, *mint, amount);
        holder
    }

    /// Statuses returned by successive polls; afterwards the final status repeats
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = SignatureState>) {
        lock(&self.state).statuses.extend(statuses);
    }

    /// Status returned once the script is exhausted (default: confirmed)
    pub fn set_final_status(&self, status: SignatureState) {
        lock(&self.state).final_status = Some(status);
    }

    pub fn set_block_heights(&self, current: u64, last_valid: u64) {
        let mut state = lock(&self.state);
        state.block_height = current;
        state.last_valid_block_height = last_valid;
    }

    pub fn fail_sends(&self, message: &str) {
        lock(&self.state).send_error = Some(message.to_string());
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        lock(&self.state).sent.clone()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn get_balance(&self, address: &Pubkey) -> SdkResult<u64> {
        Ok(lock(&self.state).lamports.get(address).copied().unwrap_or(0))
    }

    async fn account_exists(&self, address: &Pubkey) -> SdkResult<bool> {
        let state = lock(&self.state);
        Ok(state.accounts.contains(address)
            || state.token_accounts.contains_key(address)
            || state.mints.contains_key(address)
            || state.lamports.contains_key(address))
    }

    async fn get_token_account_balance(&self, holder: &Pubkey) -> SdkResult<Option<TokenBalance>> {
        let state = lock(&self.state);
        Ok(state.token_accounts.get(holder).map(|(mint, amount)| TokenBalance {
            amount: *amount,
            decimals: state.mints.get(mint).map(|m| m.decimals).unwrap_or(0),
        }))
    }

    async fn get_mint(&self, mint: &Pubkey) -> SdkResult<MintInfo> {
        lock(&self.state)
            .mints
            .get(mint)
            .copied()
            .ok_or_else(|| SdkError::NotFound(format!("mint {}", mint)))
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64> {
        Ok((128 + data_len as u64) * 6_960)
    }

    async fn latest_blockhash(&self) -> SdkResult<BlockhashReference> {
        Ok(BlockhashReference {
            hash: Hash::new_unique(),
            last_valid_block_height: lock(&self.state).last_valid_block_height,
        })
    }

    async fn block_height(&self) -> SdkResult<u64> {
        Ok(lock(&self.state).block_height)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> SdkResult<Signature> {
        let mut state = lock(&self.state);
        if let Some(message) = &state.send_error {
            return Err(SdkError::Submission(message.clone()));
        }
        state.sent.push(transaction.clone());
        Ok(transaction.signatures.first().copied().unwrap_or_default())
    }

    async fn signature_status(&self, _signature: &Signature) -> SdkResult<SignatureState> {
        let mut state = lock(&self.state);
        Ok(match state.statuses.pop_front() {
            Some(status) => status,
            None => state.final_status.clone().unwrap_or(SignatureState::Confirmed),
        })
    }
}

/// Pool directory held in memory
#[derive(Default)]
pub struct InMemoryDirectory {
    pools: Mutex<Vec<PoolRecord>>,
    trades: Mutex<Vec<TradeRecord>>,
    fail_writes: Mutex<bool>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pool(&self, record: PoolRecord) {
        lock(&self.pools).push(record);
    }

    pub fn pools(&self) -> Vec<PoolRecord> {
        lock(&self.pools).clone()
    }

    pub fn trades(&self) -> Vec<TradeRecord> {
        lock(&self.trades).clone()
    }

    /// Make every insert fail
    pub fn fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }

    fn check_writable(&self) -> SdkResult<()> {
        if *lock(&self.fail_writes) {
            return Err(SdkError::Directory("directory unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PoolDirectory for InMemoryDirectory {
    async fn find_pools(&self, candidates: &[Pubkey]) -> SdkResult<Vec<PoolRecord>> {
        Ok(lock(&self.pools)
            .iter()
            .filter(|record| candidates.contains(&record.address))
            .cloned()
            .collect())
    }

    async fn find_pools_by_owner(&self, owner: &Pubkey) -> SdkResult<Vec<PoolRecord>> {
        Ok(lock(&self.pools)
            .iter()
            .filter(|record| &record.deployer == owner)
            .cloned()
            .collect())
    }

    async fn insert_pool(&self, record: PoolRecord) -> SdkResult<()> {
        self.check_writable()?;
        lock(&self.pools).push(record);
        Ok(())
    }

    async fn insert_trade(&self, trade: TradeRecord) -> SdkResult<()> {
        self.check_writable()?;
        lock(&self.trades).push(trade);
        Ok(())
    }
}

/// Signer that never signs; batches it handles stay unsigned
pub struct NullSigner {
    pubkey: Pubkey,
}

impl NullSigner {
    pub fn new(pubkey: Pubkey) -> Self {
        Self { pubkey }
    }
}

#[async_trait]
impl TransactionSigner for NullSigner {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transaction(&self, transaction: Transaction) -> SdkResult<Transaction> {
        Ok(transaction)
    }
}

/// Reserve and LP amounts used to seed a pool fixture
#[derive(Clone, Copy, Debug)]
pub struct PoolSeed {
    pub reserve_a: u64,
    pub reserve_b: u64,
    pub lp_supply: u64,
    pub fee_bps: u16,
}

/// Register a pool in `directory` and its reserves and LP mint in `ledger`.
/// The pool address is derived from `mint_b`.
pub fn seed_pool(
    ledger: &MockLedger,
    directory: &InMemoryDirectory,
    pda: &PdaBuilder,
    mint_a: Pubkey,
    mint_b: Pubkey,
    seed: PoolSeed,
) -> PoolRecord {
    let address = pda.pool(&mint_b).0;
    let lp_mint = Keypair::new().pubkey();
    let record = PoolRecord::new(
        address,
        mint_a,
        mint_b,
        lp_mint,
        seed.fee_bps,
        Pubkey::new_unique(),
        Utc::now(),
    );
    ledger.add_account(address);
    ledger.add_mint(lp_mint, crate::core::LP_DECIMALS, seed.lp_supply);
    ledger.set_token_balance(record.reserve_a, mint_a, seed.reserve_a);
    ledger.set_token_balance(record.reserve_b, mint_b, seed.reserve_b);
    directory.add_pool(record.clone());
    record
}

/// Fresh keypair signer and its key
pub fn keypair_signer() -> (Arc<crate::client::KeypairSigner>, Pubkey) {
    let keypair = Keypair::new();
    let pubkey = keypair.pubkey();
    (Arc::new(crate::client::KeypairSigner::new(keypair)), pubkey)
}
