use std::sync::Arc;

use chrono::Utc;
use solana_sdk::{
    instruction::Instruction,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tracing::debug;

use crate::client::{
    accounts::TokenAccountProvisioner,
    assembler::{
        Bookkeeping, CoreOperation, Lifecycle, OperationKind, OperationStage, PhaseBuilder,
        TransactionAssembler, TransactionPlan,
    },
    pool::{PoolLocator, ReserveOracle},
    Ledger, TransactionSigner,
};
use crate::config::SdkConfig;
use crate::core::{AssetRef, LiquidityRequest, PoolRecord, SdkError, SdkResult};
use crate::instructions::{
    self, close_holder, create_holder, create_mint, InitializePoolAccounts, LiquidityAccounts,
};
use crate::protocol::{
    holder_address, plan_redemption_closures, pool_fee_bps, scale_amount, withdrawal_amount,
};

/// Pair with amounts, oriented to the pool's stored `(mint_a, mint_b)`
struct OrientedDeposit {
    asset_a: AssetRef,
    asset_b: AssetRef,
    amount_a: u64,
    amount_b: u64,
}

/// Batch contents produced by a prepare step
struct Built {
    instructions: Vec<Instruction>,
    bookkeeping: Option<Bookkeeping>,
    local_signers: Vec<Arc<Keypair>>,
}

/// Add-liquidity, pool creation and remove-liquidity
pub struct LiquidityService {
    ledger: Arc<dyn Ledger>,
    locator: Arc<PoolLocator>,
    oracle: Arc<ReserveOracle>,
    provisioner: Arc<TokenAccountProvisioner>,
    assembler: Arc<TransactionAssembler>,
    signer: Arc<dyn TransactionSigner>,
    config: Arc<SdkConfig>,
}

impl LiquidityService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<dyn Ledger>,
        locator: Arc<PoolLocator>,
        oracle: Arc<ReserveOracle>,
        provisioner: Arc<TokenAccountProvisioner>,
        assembler: Arc<TransactionAssembler>,
        signer: Arc<dyn TransactionSigner>,
        config: Arc<SdkConfig>,
    ) -> Self {
        Self {
            ledger,
            locator,
            oracle,
            provisioner,
            assembler,
            signer,
            config,
        }
    }

    /// Build the add-liquidity (or create-pool) batch without signing it
    pub async fn prepare_add_liquidity(&self, request: &LiquidityRequest) -> SdkResult<TransactionPlan> {
        let operation = if request.is_new_pool {
            OperationKind::CreatePool
        } else {
            OperationKind::AddLiquidity
        };
        let mut lifecycle = Lifecycle::new(operation);
        let built = if request.is_new_pool {
            self.build_create_pool(&mut lifecycle, request).await
        } else {
            self.build_add_liquidity(&mut lifecycle, request).await
        };
        self.finish(lifecycle, built)
    }

    /// Deposit into an existing pool, or create the pool and seed it when
    /// `request.is_new_pool` is set.
    pub async fn add_liquidity(&self, request: &LiquidityRequest) -> SdkResult<Signature> {
        let plan = self.prepare_add_liquidity(request).await?;
        self.assembler.execute(plan).await
    }

    /// Build the remove-liquidity batch without signing it.
    /// `liquidity` is a human amount of the pool's LP asset.
    pub async fn prepare_remove_liquidity(
        &self,
        asset_a: &AssetRef,
        asset_b: &AssetRef,
        liquidity: &str,
    ) -> SdkResult<TransactionPlan> {
        let mut lifecycle = Lifecycle::new(OperationKind::RemoveLiquidity);
        let built = self
            .build_remove_liquidity(&mut lifecycle, asset_a, asset_b, liquidity)
            .await;
        self.finish(lifecycle, built)
    }

    pub async fn remove_liquidity(
        &self,
        asset_a: &AssetRef,
        asset_b: &AssetRef,
        liquidity: &str,
    ) -> SdkResult<Signature> {
        let plan = self
            .prepare_remove_liquidity(asset_a, asset_b, liquidity)
            .await?;
        self.assembler.execute(plan).await
    }

    fn finish(&self, mut lifecycle: Lifecycle, built: SdkResult<Built>) -> SdkResult<TransactionPlan> {
        match built {
            Ok(built) => Ok(TransactionPlan::new(
                self.signer.pubkey(),
                built.instructions,
                built.bookkeeping,
                built.local_signers,
                lifecycle,
            )),
            Err(err) => Err(lifecycle.fail(err)),
        }
    }

    /// Validate the pair and scale both amounts with each asset's live decimals
    async fn scaled_amounts(&self, request: &LiquidityRequest) -> SdkResult<(u64, u64)> {
        if request.asset_a == request.asset_b {
            return Err(SdkError::Validation(
                "liquidity pair must contain two different assets".to_string(),
            ));
        }
        let (decimals_a, decimals_b) = tokio::try_join!(
            self.provisioner.decimals(&request.asset_a),
            self.provisioner.decimals(&request.asset_b),
        )?;
        let amount_a = scale_amount(&request.amount_a, decimals_a)?;
        let amount_b = scale_amount(&request.amount_b, decimals_b)?;
        if amount_a == 0 || amount_b == 0 {
            return Err(SdkError::Validation(
                "liquidity amounts must be positive".to_string(),
            ));
        }
        Ok((amount_a, amount_b))
    }

    /// Balance checks for both deposits (concurrent), then holder setup and wraps
    async fn provision_deposit(
        &self,
        phases: &mut PhaseBuilder,
        user: &Pubkey,
        deposit: &OrientedDeposit,
    ) -> SdkResult<()> {
        tokio::try_join!(
            self.provisioner
                .check_spendable(user, &deposit.asset_a, deposit.amount_a),
            self.provisioner
                .check_spendable(user, &deposit.asset_b, deposit.amount_b),
        )?;
        self.provisioner
            .provision_spend(phases, user, &deposit.asset_a, deposit.amount_a)
            .await?;
        self.provisioner
            .provision_spend(phases, user, &deposit.asset_b, deposit.amount_b)
            .await?;
        Ok(())
    }

    async fn build_add_liquidity(
        &self,
        lifecycle: &mut Lifecycle,
        request: &LiquidityRequest,
    ) -> SdkResult<Built> {
        let user = self.signer.pubkey();

        lifecycle.advance(OperationStage::Validating)?;
        let (amount_a, amount_b) = self.scaled_amounts(request).await?;

        lifecycle.advance(OperationStage::Locating)?;
        let pool = self
            .locator
            .locate(&request.asset_a, &request.asset_b)
            .await?;
        let deposit = orient(&pool, request, amount_a, amount_b)?;

        lifecycle.advance(OperationStage::Provisioning)?;
        let mut phases = PhaseBuilder::new();
        self.provision_deposit(&mut phases, &user, &deposit).await?;
        self.provisioner
            .provision_holder(&mut phases, &user, &user, &pool.lp_mint)
            .await?;

        lifecycle.advance(OperationStage::Building)?;
        let add = instructions::add_liquidity(
            self.config.program_id,
            liquidity_accounts(&pool, user),
            deposit.amount_a,
            deposit.amount_b,
        )?;
        phases.core(CoreOperation::AddLiquidity(add))?;

        Ok(Built {
            instructions: phases.build()?,
            bookkeeping: None,
            local_signers: Vec::new(),
        })
    }

    async fn build_create_pool(
        &self,
        lifecycle: &mut Lifecycle,
        request: &LiquidityRequest,
    ) -> SdkResult<Built> {
        let user = self.signer.pubkey();

        lifecycle.advance(OperationStage::Validating)?;
        let fee_bps = pool_fee_bps(&request.fee_percent, self.config.max_fee_percent)?;
        let (amount_a, amount_b) = self.scaled_amounts(request).await?;

        lifecycle.advance(OperationStage::Locating)?;
        if let Some(existing) = self
            .locator
            .find(&request.asset_a, &request.asset_b)
            .await?
        {
            return Err(SdkError::AlreadyExists {
                address: existing.address,
            });
        }
        let address = self.locator.address_for_new_pool(&request.asset_b);
        if self.ledger.account_exists(&address).await? {
            return Err(SdkError::AlreadyExists { address });
        }

        let lp_mint = Arc::new(Keypair::new());
        let record = PoolRecord::new(
            address,
            request.asset_a.mint(),
            request.asset_b.mint(),
            lp_mint.pubkey(),
            fee_bps,
            user,
            Utc::now(),
        );
        let deposit = OrientedDeposit {
            asset_a: request.asset_a,
            asset_b: request.asset_b,
            amount_a,
            amount_b,
        };

        lifecycle.advance(OperationStage::Provisioning)?;
        let mut phases = PhaseBuilder::new();
        tokio::try_join!(
            self.provisioner
                .check_spendable(&user, &deposit.asset_a, deposit.amount_a),
            self.provisioner
                .check_spendable(&user, &deposit.asset_b, deposit.amount_b),
        )?;
        let rent = self
            .ledger
            .minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN)
            .await?;
        phases.create(
            record.lp_mint,
            create_mint(&user, &record.lp_mint, &address, self.config.lp_decimals, rent)?,
        );
        self.provisioner
            .provision_holder(&mut phases, &user, &address, &record.mint_a)
            .await?;
        self.provisioner
            .provision_holder(&mut phases, &user, &address, &record.mint_b)
            .await?;
        self.provisioner
            .provision_spend(&mut phases, &user, &deposit.asset_a, deposit.amount_a)
            .await?;
        self.provisioner
            .provision_spend(&mut phases, &user, &deposit.asset_b, deposit.amount_b)
            .await?;
        let user_lp = holder_address(&user, &record.lp_mint);
        phases.create(user_lp, [create_holder(&user, &user, &record.lp_mint)]);

        lifecycle.advance(OperationStage::Building)?;
        let initialize = instructions::initialize_pool(
            self.config.program_id,
            InitializePoolAccounts {
                pool: address,
                mint_a: record.mint_a,
                mint_b: record.mint_b,
                user,
            },
            fee_bps,
        )?;
        let add_liquidity = instructions::add_liquidity(
            self.config.program_id,
            liquidity_accounts(&record, user),
            amount_a,
            amount_b,
        )?;
        phases.core(CoreOperation::CreatePool {
            initialize,
            add_liquidity,
        })?;

        debug!(pool = %address, lp_mint = %record.lp_mint, fee_bps, "new pool batch");
        Ok(Built {
            instructions: phases.build()?,
            bookkeeping: Some(Bookkeeping::Pool(record)),
            local_signers: vec![lp_mint],
        })
    }

    async fn build_remove_liquidity(
        &self,
        lifecycle: &mut Lifecycle,
        asset_a: &AssetRef,
        asset_b: &AssetRef,
        liquidity: &str,
    ) -> SdkResult<Built> {
        let user = self.signer.pubkey();

        lifecycle.advance(OperationStage::Validating)?;
        if asset_a == asset_b {
            return Err(SdkError::Validation(
                "liquidity pair must contain two different assets".to_string(),
            ));
        }
        // Syntax only; the LP decimals are known once the pool is located.
        scale_amount(liquidity, 0)?;

        lifecycle.advance(OperationStage::Locating)?;
        let pool = self.locator.locate(asset_a, asset_b).await?;
        let (pool_a, pool_b, lp_asset) = (pool.asset_a(), pool.asset_b(), pool.lp_asset());

        lifecycle.advance(OperationStage::Provisioning)?;
        let user_lp = holder_address(&user, &pool.lp_mint);
        let user_a = holder_address(&user, &pool.mint_a);
        let user_b = holder_address(&user, &pool.mint_b);
        let (lp_mint, lp_balance, (reserve_a, reserve_b), held_a, held_b) = tokio::try_join!(
            self.ledger.get_mint(&pool.lp_mint),
            self.ledger.get_token_account_balance(&user_lp),
            self.oracle.read(&pool.reserve_a, &pool.reserve_b),
            self.ledger.get_token_account_balance(&user_a),
            self.ledger.get_token_account_balance(&user_b),
        )?;

        let requested = scale_amount(liquidity, lp_mint.decimals)?;
        if requested == 0 {
            return Err(SdkError::Validation(
                "liquidity to remove must be positive".to_string(),
            ));
        }
        let lp_balance = lp_balance.map(|b| b.amount).unwrap_or(0);
        if requested > lp_balance {
            return Err(SdkError::insufficient(lp_asset, requested, lp_balance));
        }

        let withdrawn_a = withdrawal_amount(requested, reserve_a, lp_mint.supply)?;
        let withdrawn_b = withdrawal_amount(requested, reserve_b, lp_mint.supply)?;
        if withdrawn_a == 0 || withdrawn_b == 0 {
            return Err(SdkError::Validation(format!(
                "removing {} LP units pays out {} / {}; both sides must be positive",
                requested, withdrawn_a, withdrawn_b
            )));
        }
        // With both payouts positive a projected balance is never zero, so in
        // practice only native holders get closed below.
        let post_a = held_a.map(|b| b.amount).unwrap_or(0).saturating_add(withdrawn_a);
        let post_b = held_b.map(|b| b.amount).unwrap_or(0).saturating_add(withdrawn_b);
        let closures = plan_redemption_closures(requested, lp_balance, post_a, post_b);
        debug!(
            pool = %pool.address,
            requested,
            lp_balance,
            withdrawn_a,
            withdrawn_b,
            ?closures,
            "remove liquidity"
        );

        let mut phases = PhaseBuilder::new();
        if held_a.is_none() {
            phases.create(user_a, [create_holder(&user, &user, &pool.mint_a)]);
        }
        if held_b.is_none() {
            phases.create(user_b, [create_holder(&user, &user, &pool.mint_b)]);
        }

        lifecycle.advance(OperationStage::Building)?;
        let remove = instructions::remove_liquidity(
            self.config.program_id,
            liquidity_accounts(&pool, user),
            requested,
        )?;
        phases.core(CoreOperation::RemoveLiquidity(remove))?;

        if closures.lp {
            phases.close(user_lp, close_holder(&user_lp, &user)?);
        }
        let underlying = [
            (pool_a, user_a, closures.asset_a),
            (pool_b, user_b, closures.asset_b),
        ];
        for (asset, holder, close) in underlying {
            if close || asset.is_native() {
                phases.close(holder, close_holder(&holder, &user)?);
            }
        }

        Ok(Built {
            instructions: phases.build()?,
            bookkeeping: None,
            local_signers: Vec::new(),
        })
    }
}

fn liquidity_accounts(pool: &PoolRecord, user: Pubkey) -> LiquidityAccounts {
    LiquidityAccounts {
        pool: pool.address,
        mint_a: pool.mint_a,
        mint_b: pool.mint_b,
        lp_mint: pool.lp_mint,
        user,
    }
}

/// Match the caller's pair to the pool's stored order
fn orient(
    pool: &PoolRecord,
    request: &LiquidityRequest,
    amount_a: u64,
    amount_b: u64,
) -> SdkResult<OrientedDeposit> {
    let (asset_a, asset_b) = (request.asset_a, request.asset_b);
    if asset_a.mint() == pool.mint_a && asset_b.mint() == pool.mint_b {
        Ok(OrientedDeposit {
            asset_a,
            asset_b,
            amount_a,
            amount_b,
        })
    } else if asset_a.mint() == pool.mint_b && asset_b.mint() == pool.mint_a {
        Ok(OrientedDeposit {
            asset_a: asset_b,
            asset_b: asset_a,
            amount_a: amount_b,
            amount_b: amount_a,
        })
    } else {
        Err(SdkError::Validation(format!(
            "pool {} does not trade {} / {}",
            pool.address, asset_a, asset_b
        )))
    }
}
