use std::sync::Arc;

use async_trait::async_trait;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, program_pack::Pack, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};

use crate::config::SdkConfig;
use crate::core::{
    BlockhashReference, MintInfo, SdkError, SdkResult, SignatureState, TokenBalance,
};

/// Ledger collaborator: reads, submission and signature status
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Native balance in lamports; 0 for an absent account
    async fn get_balance(&self, address: &Pubkey) -> SdkResult<u64>;

    async fn account_exists(&self, address: &Pubkey) -> SdkResult<bool>;

    /// Balance of a token holder, `None` when the account does not exist
    async fn get_token_account_balance(&self, holder: &Pubkey) -> SdkResult<Option<TokenBalance>>;

    /// Mint state; a missing mint is [`SdkError::NotFound`]
    async fn get_mint(&self, mint: &Pubkey) -> SdkResult<MintInfo>;

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64>;

    async fn latest_blockhash(&self) -> SdkResult<BlockhashReference>;

    async fn block_height(&self) -> SdkResult<u64>;

    /// Submit a signed transaction; failures are [`SdkError::Submission`]
    async fn send_transaction(&self, transaction: &Transaction) -> SdkResult<Signature>;

    async fn signature_status(&self, signature: &Signature) -> SdkResult<SignatureState>;
}

/// [`Ledger`] over the nonblocking Solana RPC client
pub struct RpcLedger {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
    send_config: RpcSendTransactionConfig,
}

impl RpcLedger {
    pub fn new(rpc: Arc<RpcClient>, config: &SdkConfig) -> SdkResult<Self> {
        let commitment = config.commitment_config()?;
        Ok(Self {
            rpc,
            commitment,
            send_config: RpcSendTransactionConfig {
                skip_preflight: config.skip_preflight,
                preflight_commitment: Some(commitment.commitment),
                max_retries: Some(config.max_send_retries),
                ..RpcSendTransactionConfig::default()
            },
        })
    }

    /// Connect to the endpoint named in `config`
    pub fn from_config(config: &SdkConfig) -> SdkResult<Self> {
        let rpc = RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment_config()?);
        Self::new(Arc::new(rpc), config)
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn get_balance(&self, address: &Pubkey) -> SdkResult<u64> {
        Ok(self
            .rpc
            .get_balance_with_commitment(address, self.commitment)
            .await?
            .value)
    }

    async fn account_exists(&self, address: &Pubkey) -> SdkResult<bool> {
        Ok(self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await?
            .value
            .is_some())
    }

    async fn get_token_account_balance(&self, holder: &Pubkey) -> SdkResult<Option<TokenBalance>> {
        let Some(account) = self
            .rpc
            .get_account_with_commitment(holder, self.commitment)
            .await?
            .value
        else {
            return Ok(None);
        };
        let state = spl_token::state::Account::unpack(&account.data)?;
        let mint = self.get_mint(&state.mint).await?;
        Ok(Some(TokenBalance {
            amount: state.amount,
            decimals: mint.decimals,
        }))
    }

    async fn get_mint(&self, mint: &Pubkey) -> SdkResult<MintInfo> {
        let account = self
            .rpc
            .get_account_with_commitment(mint, self.commitment)
            .await?
            .value
            .ok_or_else(|| SdkError::NotFound(format!("mint {}", mint)))?;
        let state = spl_token::state::Mint::unpack(&account.data)?;
        Ok(MintInfo {
            decimals: state.decimals,
            supply: state.supply,
        })
    }

    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> SdkResult<u64> {
        Ok(self.rpc.get_minimum_balance_for_rent_exemption(data_len).await?)
    }

    async fn latest_blockhash(&self) -> SdkResult<BlockhashReference> {
        let (hash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(BlockhashReference {
            hash,
            last_valid_block_height,
        })
    }

    async fn block_height(&self) -> SdkResult<u64> {
        Ok(self.rpc.get_block_height_with_commitment(self.commitment).await?)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> SdkResult<Signature> {
        self.rpc
            .send_transaction_with_config(transaction, self.send_config)
            .await
            .map_err(|e| SdkError::Submission(e.to_string()))
    }

    async fn signature_status(&self, signature: &Signature) -> SdkResult<SignatureState> {
        let status = self
            .rpc
            .get_signature_status_with_commitment(signature, self.commitment)
            .await?;
        Ok(match status {
            None => SignatureState::Pending,
            Some(Ok(())) => SignatureState::Confirmed,
            Some(Err(err)) => SignatureState::Failed(err.to_string()),
        })
    }
}
