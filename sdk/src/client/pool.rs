use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::client::{Ledger, PoolDirectory};
use crate::core::{AssetRef, PoolRecord, SdkError, SdkResult};
use crate::protocol::PdaBuilder;

/// Finds the pool for an unordered asset pair
pub struct PoolLocator {
    directory: Arc<dyn PoolDirectory>,
    pda: Arc<PdaBuilder>,
}

impl PoolLocator {
    pub fn new(directory: Arc<dyn PoolDirectory>, pda: Arc<PdaBuilder>) -> Self {
        Self { directory, pda }
    }

    /// Pool for the pair, or `None`. Lookup is independent of argument order.
    pub async fn find(&self, a: &AssetRef, b: &AssetRef) -> SdkResult<Option<PoolRecord>> {
        let candidates = self.pda.pool_candidates(a, b);
        let mut records = self.directory.find_pools(&candidates).await?;
        records.retain(|record| candidates.contains(&record.address));
        // A fixed candidate order keeps the result independent of how the
        // pair was passed.
        records.sort_by_key(|record| record.address);
        records.dedup_by_key(|record| record.address);

        if records.len() > 1 {
            warn!(
                first = %records[0].address,
                second = %records[1].address,
                "directory holds two distinct pools for one pair"
            );
        }
        let found = records.into_iter().next();
        debug!(asset_a = %a, asset_b = %b, found = found.is_some(), "pool lookup");
        Ok(found)
    }

    /// Like [`find`](Self::find) but absence is [`SdkError::NotFound`]
    pub async fn locate(&self, a: &AssetRef, b: &AssetRef) -> SdkResult<PoolRecord> {
        self.find(a, b)
            .await?
            .ok_or_else(|| SdkError::NotFound(format!("no pool for pair {} / {}", a, b)))
    }

    /// Address a new pool will get: the second asset of the pair seeds the PDA
    pub fn address_for_new_pool(&self, seed_asset: &AssetRef) -> Pubkey {
        self.pda.pool(&seed_asset.mint()).0
    }
}

/// Live reserve reads. Never cached.
pub struct ReserveOracle {
    ledger: Arc<dyn Ledger>,
}

impl ReserveOracle {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Balances of two reserve holders, read concurrently
    pub async fn read(&self, reserve_a: &Pubkey, reserve_b: &Pubkey) -> SdkResult<(u64, u64)> {
        let (a, b) = tokio::try_join!(
            self.read_one(reserve_a),
            self.read_one(reserve_b),
        )?;
        Ok((a, b))
    }

    /// Balance of one reserve holder at read time
    pub async fn read_one(&self, reserve: &Pubkey) -> SdkResult<u64> {
        self.ledger
            .get_token_account_balance(reserve)
            .await?
            .map(|balance| balance.amount)
            .ok_or_else(|| SdkError::NotFound(format!("reserve account {}", reserve)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::program_id;
    use crate::testing::{InMemoryDirectory, MockLedger};
    use chrono::Utc;

    fn record(pda: &PdaBuilder, a: Pubkey, b: Pubkey) -> PoolRecord {
        let address = pda.pool(&b).0;
        PoolRecord::new(address, a, b, Pubkey::new_unique(), 30, Pubkey::new_unique(), Utc::now())
    }

    #[tokio::test]
    async fn test_locate_is_order_independent() {
        let pda = Arc::new(PdaBuilder::new(program_id()));
        let directory = Arc::new(InMemoryDirectory::new());
        let (x, y) = (Pubkey::new_unique(), Pubkey::new_unique());
        let pool = record(&pda, x, y);
        directory.add_pool(pool.clone());

        let locator = PoolLocator::new(directory, pda);
        let (x, y) = (AssetRef::Fungible(x), AssetRef::Fungible(y));
        assert_eq!(locator.locate(&x, &y).await.unwrap(), pool);
        assert_eq!(locator.locate(&y, &x).await.unwrap(), pool);
    }

    #[tokio::test]
    async fn test_locate_missing_pool() {
        let pda = Arc::new(PdaBuilder::new(program_id()));
        let locator = PoolLocator::new(Arc::new(InMemoryDirectory::new()), pda);
        let err = locator
            .locate(&AssetRef::Native, &AssetRef::Fungible(Pubkey::new_unique()))
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_two_records_picks_consistently() {
        let pda = Arc::new(PdaBuilder::new(program_id()));
        let directory = Arc::new(InMemoryDirectory::new());
        let (x, y) = (Pubkey::new_unique(), Pubkey::new_unique());
        directory.add_pool(record(&pda, x, y));
        directory.add_pool(record(&pda, y, x));

        let locator = PoolLocator::new(directory, pda);
        let (x, y) = (AssetRef::Fungible(x), AssetRef::Fungible(y));
        let first = locator.locate(&x, &y).await.unwrap();
        let second = locator.locate(&y, &x).await.unwrap();
        assert_eq!(first.address, second.address);
    }

    #[tokio::test]
    async fn test_reserve_oracle_reads_live_balances() {
        let ledger = Arc::new(MockLedger::new());
        let (ra, rb) = (Pubkey::new_unique(), Pubkey::new_unique());
        let mint = Pubkey::new_unique();
        ledger.add_mint(mint, 6, 0);
        ledger.set_token_balance(ra, mint, 100);
        ledger.set_token_balance(rb, mint, 200);

        let oracle = ReserveOracle::new(ledger.clone());
        assert_eq!(oracle.read(&ra, &rb).await.unwrap(), (100, 200));

        ledger.set_token_balance(ra, mint, 150);
        assert_eq!(oracle.read(&ra, &rb).await.unwrap(), (150, 200));

        let missing = oracle.read(&ra, &Pubkey::new_unique()).await.unwrap_err();
        assert!(matches!(missing, SdkError::NotFound(_)));
    }
}
