#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use soondex_sdk::{
    client::SoondexClient,
    core::program_id,
    protocol::PdaBuilder,
    testing::{keypair_signer, InMemoryDirectory, MockLedger},
    SdkConfig,
};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, transaction::Transaction};

pub struct Harness {
    pub ledger: Arc<MockLedger>,
    pub directory: Arc<InMemoryDirectory>,
    pub client: SoondexClient,
    pub wallet: Pubkey,
    pub pda: PdaBuilder,
}

pub fn config() -> SdkConfig {
    SdkConfig::localnet()
        .with_confirm_timeout(Duration::from_secs(2))
        .with_confirm_poll_interval(Duration::from_millis(1))
}

pub fn harness() -> Harness {
    harness_with(config())
}

pub fn harness_with(config: SdkConfig) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("soondex_sdk=debug")
        .with_test_writer()
        .try_init();

    let ledger = Arc::new(MockLedger::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let (signer, wallet) = keypair_signer();
    ledger.set_lamports(wallet, 5_000_000_000);
    let client = SoondexClient::new(config, ledger.clone(), signer, directory.clone())
        .expect("valid config");

    Harness {
        ledger,
        directory,
        client,
        wallet,
        pda: PdaBuilder::new(program_id()),
    }
}

/// Fungible mint with `decimals`, registered on the ledger
pub fn mint(ledger: &MockLedger, decimals: u8) -> Pubkey {
    let mint = Pubkey::new_unique();
    ledger.add_mint(mint, decimals, 1_000_000_000_000);
    mint
}

pub fn only_transaction(ledger: &MockLedger) -> Transaction {
    let sent = ledger.sent_transactions();
    assert_eq!(sent.len(), 1, "expected exactly one submitted transaction");
    sent.into_iter().next().unwrap()
}

/// Program id of every instruction, in batch order
pub fn program_ids(instructions: &[Instruction]) -> Vec<Pubkey> {
    instructions.iter().map(|ix| ix.program_id).collect()
}

pub fn program_ids_of(transaction: &Transaction) -> Vec<Pubkey> {
    let keys = &transaction.message.account_keys;
    transaction
        .message
        .instructions
        .iter()
        .map(|ix| keys[ix.program_id_index as usize])
        .collect()
}

/// Data of the first instruction addressed to the AMM program
pub fn amm_data(instructions: &[Instruction]) -> Vec<u8> {
    instructions
        .iter()
        .find(|ix| ix.program_id == program_id())
        .map(|ix| ix.data.clone())
        .expect("batch has an AMM instruction")
}
