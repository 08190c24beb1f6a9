use std::sync::Arc;

use solana_sdk::{instruction::Instruction, signature::Signature};
use tracing::debug;

use crate::client::{
    accounts::TokenAccountProvisioner,
    assembler::{
        Bookkeeping, CoreOperation, Lifecycle, OperationKind, OperationStage, PhaseBuilder,
        TransactionAssembler, TransactionPlan,
    },
    pool::{PoolLocator, ReserveOracle},
    TransactionSigner,
};
use crate::config::SdkConfig;
use crate::core::{AssetRef, FeeSide, SdkError, SdkResult, SwapEstimate};
use crate::instructions::{self, SwapAccounts};
use crate::protocol::{clamp_slippage_bps, estimate_swap, identity_estimate, scale_amount};

/// Swap estimation and execution
pub struct SwapService {
    locator: Arc<PoolLocator>,
    oracle: Arc<ReserveOracle>,
    provisioner: Arc<TokenAccountProvisioner>,
    assembler: Arc<TransactionAssembler>,
    signer: Arc<dyn TransactionSigner>,
    config: Arc<SdkConfig>,
}

impl SwapService {
    pub fn new(
        locator: Arc<PoolLocator>,
        oracle: Arc<ReserveOracle>,
        provisioner: Arc<TokenAccountProvisioner>,
        assembler: Arc<TransactionAssembler>,
        signer: Arc<dyn TransactionSigner>,
        config: Arc<SdkConfig>,
    ) -> Self {
        Self {
            locator,
            oracle,
            provisioner,
            assembler,
            signer,
            config,
        }
    }

    fn slippage(&self, slippage_bps: u16) -> u16 {
        clamp_slippage_bps(
            slippage_bps,
            self.config.min_slippage_bps,
            self.config.max_slippage_bps,
        )
    }

    /// Estimate the output of swapping a human `amount` of `input` for `output`
    pub async fn estimate(
        &self,
        input: &AssetRef,
        output: &AssetRef,
        amount: &str,
        slippage_bps: u16,
    ) -> SdkResult<SwapEstimate> {
        let decimals = self.provisioner.decimals(input).await?;
        let amount_in = scale_amount(amount, decimals)?;
        self.estimate_base_units(input, output, amount_in, slippage_bps)
            .await
    }

    /// Estimate with the input already in base units. Reads reserves live.
    pub async fn estimate_base_units(
        &self,
        input: &AssetRef,
        output: &AssetRef,
        amount_in: u64,
        slippage_bps: u16,
    ) -> SdkResult<SwapEstimate> {
        if input == output {
            return Ok(identity_estimate(amount_in));
        }
        if amount_in == 0 {
            return Ok(SwapEstimate::default());
        }

        let pool = self.locator.locate(input, output).await?;
        let direction = pool.direction_for(input)?;
        let (reserve_in, reserve_out) = pool.reserves_for(direction);
        let (reserve_in, reserve_out) = self.oracle.read(&reserve_in, &reserve_out).await?;

        let estimate = estimate_swap(
            reserve_in,
            reserve_out,
            amount_in,
            pool.fee_bps,
            self.slippage(slippage_bps),
            FeeSide::from(direction),
        )?;
        debug!(
            pool = %pool.address,
            ?direction,
            amount_in,
            output = estimate.estimated_output,
            minimum = estimate.minimum_received,
            "swap estimate"
        );
        Ok(estimate)
    }

    /// Build the swap batch without signing it
    pub async fn prepare_swap(
        &self,
        input: &AssetRef,
        output: &AssetRef,
        amount: &str,
        slippage_bps: u16,
    ) -> SdkResult<TransactionPlan> {
        let mut lifecycle = Lifecycle::new(OperationKind::Swap);
        match self
            .build_swap(&mut lifecycle, input, output, amount, slippage_bps)
            .await
        {
            Ok((instructions, bookkeeping)) => Ok(TransactionPlan::new(
                self.signer.pubkey(),
                instructions,
                Some(bookkeeping),
                Vec::new(),
                lifecycle,
            )),
            Err(err) => Err(lifecycle.fail(err)),
        }
    }

    async fn build_swap(
        &self,
        lifecycle: &mut Lifecycle,
        input: &AssetRef,
        output: &AssetRef,
        amount: &str,
        slippage_bps: u16,
    ) -> SdkResult<(Vec<Instruction>, Bookkeeping)> {
        let user = self.signer.pubkey();

        lifecycle.advance(OperationStage::Validating)?;
        if input == output {
            return Err(SdkError::Validation(
                "input and output assets are the same".to_string(),
            ));
        }
        let amount_in = scale_amount(amount, self.provisioner.decimals(input).await?)?;
        if amount_in == 0 {
            return Err(SdkError::Validation("swap amount must be positive".to_string()));
        }
        let slippage = self.slippage(slippage_bps);

        lifecycle.advance(OperationStage::Locating)?;
        let pool = self.locator.locate(input, output).await?;
        let direction = pool.direction_for(input)?;

        lifecycle.advance(OperationStage::Provisioning)?;
        let mut phases = PhaseBuilder::new();
        self.provisioner
            .provision_input(&mut phases, &user, input, amount_in)
            .await?;
        self.provisioner
            .provision_output(&mut phases, &user, output)
            .await?;

        lifecycle.advance(OperationStage::Building)?;
        let swap = instructions::swap(
            self.config.program_id,
            SwapAccounts {
                pool: pool.address,
                user,
                input_mint: input.mint(),
                output_mint: output.mint(),
            },
            direction,
            amount_in,
            slippage,
        )?;
        phases.core(CoreOperation::Swap(swap))?;

        let bookkeeping = Bookkeeping::Trade {
            trader: user,
            amount: amount_in,
            asset: input.mint(),
            pool: pool.address,
        };
        Ok((phases.build()?, bookkeeping))
    }

    /// Swap a human `amount` of `input` for `output`; records the trade once
    /// the transaction is confirmed.
    pub async fn swap(
        &self,
        input: &AssetRef,
        output: &AssetRef,
        amount: &str,
        slippage_bps: u16,
    ) -> SdkResult<Signature> {
        let plan = self.prepare_swap(input, output, amount, slippage_bps).await?;
        self.assembler.execute(plan).await
    }
}
