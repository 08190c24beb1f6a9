use std::{collections::HashSet, fmt, sync::Arc, time::Duration};

use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use tracing::{debug, info, warn};

use crate::client::{Ledger, PoolDirectory, TransactionSigner};
use crate::config::SdkConfig;
use crate::core::{
    BlockhashReference, ConfirmationFailure, PoolRecord, SdkError, SdkResult, SignatureState,
    TradeRecord,
};

/// Public operations that end in a submitted transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Swap,
    AddLiquidity,
    CreatePool,
    RemoveLiquidity,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Swap => "swap",
            OperationKind::AddLiquidity => "add_liquidity",
            OperationKind::CreatePool => "create_pool",
            OperationKind::RemoveLiquidity => "remove_liquidity",
        };
        f.write_str(name)
    }
}

/// Lifecycle stages of one operation, in the only order they may occur
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationStage {
    Idle,
    Validating,
    Locating,
    Provisioning,
    Building,
    Signing,
    Submitting,
    Confirming,
    Succeeded,
    Failed,
}

impl OperationStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStage::Succeeded | OperationStage::Failed)
    }

    /// The only stage `advance` may reach from this one. `Failed` is
    /// entered through [`Lifecycle::fail`] instead.
    pub fn successor(&self) -> Option<OperationStage> {
        use OperationStage::*;
        match self {
            Idle => Some(Validating),
            Validating => Some(Locating),
            Locating => Some(Provisioning),
            Provisioning => Some(Building),
            Building => Some(Signing),
            Signing => Some(Submitting),
            Submitting => Some(Confirming),
            Confirming => Some(Succeeded),
            Succeeded | Failed => None,
        }
    }
}

/// Strictly forward stage tracker for one operation
#[derive(Clone, Debug)]
pub struct Lifecycle {
    operation: OperationKind,
    history: Vec<OperationStage>,
}

impl Lifecycle {
    pub fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            history: vec![OperationStage::Idle],
        }
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn stage(&self) -> OperationStage {
        self.history
            .last()
            .copied()
            .unwrap_or(OperationStage::Idle)
    }

    pub fn history(&self) -> &[OperationStage] {
        &self.history
    }

    /// Move to `next`, which must be the direct successor of the current stage
    pub fn advance(&mut self, next: OperationStage) -> SdkResult<()> {
        let current = self.stage();
        if current.successor() != Some(next) {
            return Err(SdkError::Construction(format!(
                "{} cannot move from {:?} to {:?}",
                self.operation, current, next
            )));
        }
        debug!(operation = %self.operation, stage = ?next, "lifecycle");
        self.history.push(next);
        Ok(())
    }

    /// Record failure and hand the error back
    pub fn fail(&mut self, err: SdkError) -> SdkError {
        if !self.stage().is_terminal() {
            debug!(operation = %self.operation, from = ?self.stage(), error = %err, "lifecycle failed");
            self.history.push(OperationStage::Failed);
        }
        err
    }
}

/// The single program instruction (or pair) at the centre of a batch
#[derive(Clone, Debug)]
pub enum CoreOperation {
    Swap(Instruction),
    AddLiquidity(Instruction),
    CreatePool {
        initialize: Instruction,
        add_liquidity: Instruction,
    },
    RemoveLiquidity(Instruction),
}

impl CoreOperation {
    fn into_instructions(self) -> Vec<Instruction> {
        match self {
            CoreOperation::Swap(ix)
            | CoreOperation::AddLiquidity(ix)
            | CoreOperation::RemoveLiquidity(ix) => vec![ix],
            CoreOperation::CreatePool {
                initialize,
                add_liquidity,
            } => vec![initialize, add_liquidity],
        }
    }
}

/// Phase-ordered instruction builder: setup, wrap, core, cleanup.
///
/// Phases can be filled in any order; `build` always emits them in phase
/// order. Holder creations and closures are deduplicated by address.
#[derive(Default)]
pub struct PhaseBuilder {
    setup: Vec<Instruction>,
    wrap: Vec<Instruction>,
    core: Option<CoreOperation>,
    cleanup: Vec<Instruction>,
    created: HashSet<Pubkey>,
    closed: HashSet<Pubkey>,
}

impl PhaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account creation for `address` unless one is already queued
    pub fn create(&mut self, address: Pubkey, instructions: impl IntoIterator<Item = Instruction>) {
        if self.created.insert(address) {
            self.setup.extend(instructions);
        }
    }

    pub fn is_created(&self, address: &Pubkey) -> bool {
        self.created.contains(address)
    }

    pub fn wrap(&mut self, instructions: impl IntoIterator<Item = Instruction>) {
        self.wrap.extend(instructions);
    }

    pub fn core(&mut self, core: CoreOperation) -> SdkResult<()> {
        if self.core.is_some() {
            return Err(SdkError::Construction(
                "batch already has a core instruction".to_string(),
            ));
        }
        self.core = Some(core);
        Ok(())
    }

    /// Add a close for `holder` unless one is already queued
    pub fn close(&mut self, holder: Pubkey, instruction: Instruction) {
        if self.closed.insert(holder) {
            self.cleanup.push(instruction);
        }
    }

    pub fn build(self) -> SdkResult<Vec<Instruction>> {
        let core = self
            .core
            .ok_or_else(|| SdkError::Construction("batch has no core instruction".to_string()))?;
        let mut instructions = self.setup;
        instructions.extend(self.wrap);
        instructions.extend(core.into_instructions());
        instructions.extend(self.cleanup);
        Ok(instructions)
    }
}

/// Directory write owed once the batch is confirmed
#[derive(Clone, Debug)]
pub enum Bookkeeping {
    Trade {
        trader: Pubkey,
        amount: u64,
        asset: Pubkey,
        pool: Pubkey,
    },
    Pool(PoolRecord),
}

/// Fully built, unsigned batch ready for inspection or execution
pub struct TransactionPlan {
    pub payer: Pubkey,
    pub instructions: Vec<Instruction>,
    pub bookkeeping: Option<Bookkeeping>,
    local_signers: Vec<Arc<Keypair>>,
    lifecycle: Lifecycle,
}

impl TransactionPlan {
    pub fn new(
        payer: Pubkey,
        instructions: Vec<Instruction>,
        bookkeeping: Option<Bookkeeping>,
        local_signers: Vec<Arc<Keypair>>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            payer,
            instructions,
            bookkeeping,
            local_signers,
            lifecycle,
        }
    }

    pub fn operation(&self) -> OperationKind {
        self.lifecycle.operation()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Keys of locally generated keypairs that co-sign the batch
    pub fn local_signer_keys(&self) -> Vec<Pubkey> {
        use solana_sdk::signer::Signer;
        self.local_signers.iter().map(|k| k.pubkey()).collect()
    }
}

/// Signs, submits and confirms plans, then writes their bookkeeping
pub struct TransactionAssembler {
    ledger: Arc<dyn Ledger>,
    signer: Arc<dyn TransactionSigner>,
    directory: Arc<dyn PoolDirectory>,
    config: Arc<SdkConfig>,
}

impl TransactionAssembler {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        signer: Arc<dyn TransactionSigner>,
        directory: Arc<dyn PoolDirectory>,
        config: Arc<SdkConfig>,
    ) -> Self {
        Self {
            ledger,
            signer,
            directory,
            config,
        }
    }

    pub async fn execute(&self, plan: TransactionPlan) -> SdkResult<Signature> {
        let TransactionPlan {
            payer,
            instructions,
            bookkeeping,
            local_signers,
            mut lifecycle,
        } = plan;

        let result = self
            .sign_and_submit(&mut lifecycle, payer, &instructions, &local_signers)
            .await;
        let signature = match result {
            Ok(signature) => signature,
            Err(err) => return Err(lifecycle.fail(err)),
        };
        lifecycle.advance(OperationStage::Succeeded)?;
        info!(operation = %lifecycle.operation(), %signature, "transaction confirmed");

        if let Some(bookkeeping) = bookkeeping {
            self.record(signature, bookkeeping).await?;
        }
        Ok(signature)
    }

    async fn sign_and_submit(
        &self,
        lifecycle: &mut Lifecycle,
        payer: Pubkey,
        instructions: &[Instruction],
        local_signers: &[Arc<Keypair>],
    ) -> SdkResult<Signature> {
        lifecycle.advance(OperationStage::Signing)?;
        if payer != self.signer.pubkey() {
            return Err(SdkError::Construction(format!(
                "plan payer {} does not match signer {}",
                payer,
                self.signer.pubkey()
            )));
        }
        let reference = self.ledger.latest_blockhash().await?;
        let mut transaction = Transaction::new_with_payer(instructions, Some(&payer));
        transaction.message.recent_blockhash = reference.hash;
        if !local_signers.is_empty() {
            let keypairs: Vec<&Keypair> = local_signers.iter().map(|k| k.as_ref()).collect();
            transaction.try_partial_sign(keypairs.as_slice(), reference.hash)?;
        }
        let transaction = self.signer.sign_transaction(transaction).await?;
        if !transaction.is_signed() {
            return Err(SdkError::Submission(
                "transaction is missing required signatures".to_string(),
            ));
        }

        lifecycle.advance(OperationStage::Submitting)?;
        let signature = self.ledger.send_transaction(&transaction).await?;
        info!(operation = %lifecycle.operation(), %signature, "transaction submitted");

        lifecycle.advance(OperationStage::Confirming)?;
        self.confirm(&signature, &reference).await?;
        Ok(signature)
    }

    /// Poll until the signature is final, rejected, past its blockhash
    /// window, or the configured wait elapses.
    pub async fn confirm(&self, signature: &Signature, reference: &BlockhashReference) -> SdkResult<()> {
        let timeout = self.config.confirm_timeout();
        let poll = self.config.confirm_poll_interval();

        let outcome = match tokio::time::timeout(timeout, self.poll_until_final(signature, reference, poll)).await {
            Ok(outcome) => outcome?,
            Err(_) => Err(ConfirmationFailure::TimedOut {
                waited_secs: timeout.as_secs(),
            }),
        };
        outcome.map_err(|failure| {
            warn!(%signature, %failure, "transaction not confirmed");
            SdkError::Confirmation {
                signature: *signature,
                failure,
            }
        })
    }

    /// Outer error is a failed ledger read; inner is the confirmation outcome
    async fn poll_until_final(
        &self,
        signature: &Signature,
        reference: &BlockhashReference,
        poll: Duration,
    ) -> SdkResult<Result<(), ConfirmationFailure>> {
        loop {
            match self.ledger.signature_status(signature).await? {
                SignatureState::Confirmed => return Ok(Ok(())),
                SignatureState::Failed(reason) => return Ok(Err(ConfirmationFailure::Rejected(reason))),
                SignatureState::Pending => {}
            }
            if self.ledger.block_height().await? > reference.last_valid_block_height {
                return Ok(Err(ConfirmationFailure::Expired {
                    last_valid_block_height: reference.last_valid_block_height,
                }));
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Directory write after confirmation; failure never re-submits
    async fn record(&self, signature: Signature, bookkeeping: Bookkeeping) -> SdkResult<()> {
        let write = match bookkeeping {
            Bookkeeping::Trade {
                trader,
                amount,
                asset,
                pool,
            } => {
                self.directory
                    .insert_trade(TradeRecord {
                        trader,
                        amount,
                        asset,
                        pool,
                        signature,
                    })
                    .await
            }
            Bookkeeping::Pool(record) => self.directory.insert_pool(record).await,
        };
        write.map_err(|err| {
            warn!(%signature, error = %err, "confirmed transaction could not be recorded");
            SdkError::RecordingFailed {
                signature,
                message: err.to_string(),
            }
        })
    }
}
