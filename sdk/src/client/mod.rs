pub mod accounts;
pub mod assembler;
pub mod directory;
pub mod ledger;
pub mod liquidity;
pub mod pool;
pub mod signer;
pub mod swap;

use std::sync::Arc;

use crate::prelude::*;

use crate::{
    config::SdkConfig,
    core::{PoolRecord, SdkResult, TokenBalance},
    protocol::PdaBuilder,
};

pub use accounts::{HolderAccount, TokenAccountProvisioner};
pub use assembler::{
    Bookkeeping, CoreOperation, Lifecycle, OperationKind, OperationStage, PhaseBuilder,
    TransactionAssembler, TransactionPlan,
};
pub use directory::PoolDirectory;
pub use ledger::{Ledger, RpcLedger};
pub use liquidity::LiquidityService;
pub use pool::{PoolLocator, ReserveOracle};
pub use signer::{KeypairSigner, TransactionSigner};
pub use swap::SwapService;

/// Main Soondex client with service-based architecture
pub struct SoondexClient {
    /// Swap estimation and execution
    pub swap: SwapService,
    /// Liquidity management
    pub liquidity: LiquidityService,
    pub locator: Arc<PoolLocator>,
    pub provisioner: Arc<TokenAccountProvisioner>,
    pub pda: Arc<PdaBuilder>,
    directory: Arc<dyn PoolDirectory>,
    signer: Arc<dyn TransactionSigner>,
    config: Arc<SdkConfig>,
}

impl SoondexClient {
    /// Compose the services over explicit collaborators
    pub fn new(
        config: SdkConfig,
        ledger: Arc<dyn Ledger>,
        signer: Arc<dyn TransactionSigner>,
        directory: Arc<dyn PoolDirectory>,
    ) -> SdkResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let pda = Arc::new(PdaBuilder::new(config.program_id));

        let locator = Arc::new(PoolLocator::new(directory.clone(), pda.clone()));
        let oracle = Arc::new(ReserveOracle::new(ledger.clone()));
        let provisioner = Arc::new(TokenAccountProvisioner::new(
            ledger.clone(),
            config.native_fee_reserve_lamports,
        ));
        let assembler = Arc::new(TransactionAssembler::new(
            ledger.clone(),
            signer.clone(),
            directory.clone(),
            config.clone(),
        ));

        Ok(Self {
            swap: SwapService::new(
                locator.clone(),
                oracle.clone(),
                provisioner.clone(),
                assembler.clone(),
                signer.clone(),
                config.clone(),
            ),
            liquidity: LiquidityService::new(
                ledger,
                locator.clone(),
                oracle,
                provisioner.clone(),
                assembler,
                signer.clone(),
                config.clone(),
            ),
            locator,
            provisioner,
            pda,
            directory,
            signer,
            config,
        })
    }

    /// Client over the RPC endpoint named in `config`
    pub fn connect(
        config: SdkConfig,
        signer: Arc<dyn TransactionSigner>,
        directory: Arc<dyn PoolDirectory>,
    ) -> SdkResult<Self> {
        let ledger = Arc::new(RpcLedger::from_config(&config)?);
        Self::new(config, ledger, signer, directory)
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn program_id(&self) -> Pubkey {
        self.config.program_id
    }

    /// Wallet that pays for and signs every batch
    pub fn wallet(&self) -> Pubkey {
        self.signer.pubkey()
    }

    pub async fn find_pool(&self, a: &AssetRef, b: &AssetRef) -> SdkResult<Option<PoolRecord>> {
        self.locator.find(a, b).await
    }

    /// Pools deployed by `owner`
    pub async fn pools_of(&self, owner: &Pubkey) -> SdkResult<Vec<PoolRecord>> {
        self.directory.find_pools_by_owner(owner).await
    }

    /// Balance of `asset` held by `owner`, in base units
    pub async fn balance_of(&self, owner: &Pubkey, asset: &AssetRef) -> SdkResult<TokenBalance> {
        self.provisioner.balance(owner, asset).await
    }
}
