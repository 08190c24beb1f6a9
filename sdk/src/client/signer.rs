use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};

use crate::core::SdkResult;

/// External signing capability for the fee payer / trader
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Add this signer's signature; other signatures already present are kept
    async fn sign_transaction(&self, transaction: Transaction) -> SdkResult<Transaction>;
}

/// Signer backed by an in-process keypair
#[derive(Clone)]
pub struct KeypairSigner {
    keypair: Arc<Keypair>,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> SdkResult<Transaction> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_partial_sign(&[self.keypair.as_ref()], blockhash)?;
        Ok(transaction)
    }
}
