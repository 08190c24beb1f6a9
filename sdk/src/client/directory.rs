use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use crate::core::{PoolRecord, SdkResult, TradeRecord};

/// Pool directory collaborator.
///
/// The engine only depends on this contract; the transport behind it
/// (query endpoint, database) lives outside the crate.
#[async_trait]
pub trait PoolDirectory: Send + Sync {
    /// Records whose address is any of `candidates`
    async fn find_pools(&self, candidates: &[Pubkey]) -> SdkResult<Vec<PoolRecord>>;

    async fn find_pools_by_owner(&self, owner: &Pubkey) -> SdkResult<Vec<PoolRecord>>;

    async fn insert_pool(&self, record: PoolRecord) -> SdkResult<()>;

    async fn insert_trade(&self, trade: TradeRecord) -> SdkResult<()>;
}
