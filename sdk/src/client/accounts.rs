use std::sync::Arc;

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use tracing::debug;

use crate::client::{assembler::PhaseBuilder, Ledger};
use crate::core::{AssetRef, SdkError, SdkResult, TokenBalance, NATIVE_DECIMALS};
use crate::instructions::{close_holder, create_holder, wrap_native};
use crate::protocol::holder_address;

/// Holder account for `(owner, asset)` and its creation if it is absent
#[derive(Clone, Debug)]
pub struct HolderAccount {
    pub address: Pubkey,
    pub create: Option<Instruction>,
}

/// Resolves holder accounts and wraps native balance
pub struct TokenAccountProvisioner {
    ledger: Arc<dyn Ledger>,
    native_fee_reserve: u64,
}

impl TokenAccountProvisioner {
    pub fn new(ledger: Arc<dyn Ledger>, native_fee_reserve: u64) -> Self {
        Self {
            ledger,
            native_fee_reserve,
        }
    }

    /// Derive the holder for `(owner, asset)` and check whether it exists.
    /// For native assets this is the wrapped holder.
    pub async fn ensure(&self, payer: &Pubkey, owner: &Pubkey, asset: &AssetRef) -> SdkResult<HolderAccount> {
        let mint = asset.mint();
        let address = holder_address(owner, &mint);
        let create = if self.ledger.account_exists(&address).await? {
            None
        } else {
            Some(create_holder(payer, owner, &mint))
        };
        Ok(HolderAccount { address, create })
    }

    pub async fn decimals(&self, asset: &AssetRef) -> SdkResult<u8> {
        match asset {
            AssetRef::Native => Ok(NATIVE_DECIMALS),
            AssetRef::Fungible(mint) => Ok(self.ledger.get_mint(mint).await?.decimals),
        }
    }

    /// Owner's spendable balance of `asset`. Native is the lamport balance;
    /// an absent fungible holder counts as 0.
    pub async fn balance(&self, owner: &Pubkey, asset: &AssetRef) -> SdkResult<TokenBalance> {
        match asset {
            AssetRef::Native => Ok(TokenBalance {
                amount: self.ledger.get_balance(owner).await?,
                decimals: NATIVE_DECIMALS,
            }),
            AssetRef::Fungible(mint) => {
                let holder = holder_address(owner, mint);
                let (balance, decimals) = tokio::try_join!(
                    self.ledger.get_token_account_balance(&holder),
                    self.decimals(asset),
                )?;
                Ok(TokenBalance {
                    amount: balance.map(|b| b.amount).unwrap_or(0),
                    decimals,
                })
            }
        }
    }

    /// Fail with [`SdkError::InsufficientBalance`] unless `owner` can spend
    /// `amount` of `asset`. Native spends also need the fee reserve.
    pub async fn check_spendable(&self, owner: &Pubkey, asset: &AssetRef, amount: u64) -> SdkResult<()> {
        let required = match asset {
            AssetRef::Native => amount.checked_add(self.native_fee_reserve).ok_or_else(|| {
                SdkError::Validation(format!("native amount {} overflows", amount))
            })?,
            AssetRef::Fungible(_) => amount,
        };
        let available = self.balance(owner, asset).await?.amount;
        if available < required {
            return Err(SdkError::insufficient(asset, required, available));
        }
        Ok(())
    }

    /// Check the balance, then provision the spend
    pub async fn provision_input(
        &self,
        phases: &mut PhaseBuilder,
        owner: &Pubkey,
        asset: &AssetRef,
        amount: u64,
    ) -> SdkResult<Pubkey> {
        self.check_spendable(owner, asset, amount).await?;
        self.provision_spend(phases, owner, asset, amount).await
    }

    /// Holder `owner` spends `amount` of `asset` from, without a balance check.
    ///
    /// A native spend creates the wrapped holder if absent, funds it in the
    /// wrap phase and closes it in cleanup.
    pub async fn provision_spend(
        &self,
        phases: &mut PhaseBuilder,
        owner: &Pubkey,
        asset: &AssetRef,
        amount: u64,
    ) -> SdkResult<Pubkey> {
        let holder = self.ensure(owner, owner, asset).await?;
        if let Some(create) = holder.create {
            phases.create(holder.address, [create]);
        }
        if asset.is_native() {
            phases.wrap(wrap_native(owner, &holder.address, amount)?);
            phases.close(holder.address, close_holder(&holder.address, owner)?);
            debug!(%owner, lamports = amount, "wrapping native balance");
        }
        Ok(holder.address)
    }

    /// Holder that receives `asset`. A native output is unwrapped in cleanup.
    pub async fn provision_output(
        &self,
        phases: &mut PhaseBuilder,
        owner: &Pubkey,
        asset: &AssetRef,
    ) -> SdkResult<Pubkey> {
        let holder = self.ensure(owner, owner, asset).await?;
        if let Some(create) = holder.create {
            phases.create(holder.address, [create]);
        }
        if asset.is_native() {
            phases.close(holder.address, close_holder(&holder.address, owner)?);
        }
        Ok(holder.address)
    }

    /// Create `(owner, mint)`'s holder, paid by `payer`, unless it exists
    pub async fn provision_holder(
        &self,
        phases: &mut PhaseBuilder,
        payer: &Pubkey,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> SdkResult<Pubkey> {
        let address = holder_address(owner, mint);
        if !phases.is_created(&address) && !self.ledger.account_exists(&address).await? {
            phases.create(address, [create_holder(payer, owner, mint)]);
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::assembler::CoreOperation;
    use crate::testing::MockLedger;

    const RESERVE: u64 = 10_000_000;

    fn core() -> CoreOperation {
        CoreOperation::Swap(Instruction::new_with_bytes(Pubkey::new_unique(), &[0], vec![]))
    }

    #[tokio::test]
    async fn test_native_input_wraps_and_closes() {
        let ledger = Arc::new(MockLedger::new());
        let owner = Pubkey::new_unique();
        ledger.set_lamports(owner, 2_000_000_000);
        let provisioner = TokenAccountProvisioner::new(ledger, RESERVE);

        let mut phases = PhaseBuilder::new();
        let holder = provisioner
            .provision_input(&mut phases, &owner, &AssetRef::Native, 1_000_000_000)
            .await
            .unwrap();
        assert_eq!(holder, holder_address(&owner, &spl_token::native_mint::id()));

        phases.core(core()).unwrap();
        let ixs = phases.build().unwrap();
        // create, transfer, sync, core, close
        assert_eq!(ixs.len(), 5);
        assert_eq!(ixs[0].program_id, spl_associated_token_account::id());
        assert_eq!(ixs[1].program_id, solana_sdk::system_program::id());
        assert_eq!(ixs[2].program_id, spl_token::id());
        assert_eq!(ixs[4].program_id, spl_token::id());
    }

    #[tokio::test]
    async fn test_native_input_requires_fee_reserve() {
        let ledger = Arc::new(MockLedger::new());
        let owner = Pubkey::new_unique();
        ledger.set_lamports(owner, 1_005_000_000);
        let provisioner = TokenAccountProvisioner::new(ledger, RESERVE);

        let err = provisioner
            .provision_input(&mut PhaseBuilder::new(), &owner, &AssetRef::Native, 1_000_000_000)
            .await
            .unwrap_err();
        match err {
            SdkError::InsufficientBalance {
                required, available, ..
            } => {
                assert_eq!(required, 1_010_000_000);
                assert_eq!(available, 1_005_000_000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_existing_fungible_holder_needs_no_setup() {
        let ledger = Arc::new(MockLedger::new());
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        ledger.add_mint(mint, 6, 1_000_000);
        ledger.set_token_balance(holder_address(&owner, &mint), mint, 500);
        let provisioner = TokenAccountProvisioner::new(ledger, RESERVE);

        let mut phases = PhaseBuilder::new();
        provisioner
            .provision_input(&mut phases, &owner, &AssetRef::Fungible(mint), 500)
            .await
            .unwrap();
        phases.core(core()).unwrap();
        assert_eq!(phases.build().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_fungible_holder_counts_as_zero() {
        let ledger = Arc::new(MockLedger::new());
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        ledger.add_mint(mint, 6, 0);
        let provisioner = TokenAccountProvisioner::new(ledger, RESERVE);

        let balance = provisioner.balance(&owner, &AssetRef::Fungible(mint)).await.unwrap();
        assert_eq!(balance, TokenBalance { amount: 0, decimals: 6 });

        let err = provisioner
            .provision_input(&mut PhaseBuilder::new(), &owner, &AssetRef::Fungible(mint), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::InsufficientBalance { available: 0, .. }));
    }

    #[tokio::test]
    async fn test_native_output_is_unwrapped_without_transfer() {
        let ledger = Arc::new(MockLedger::new());
        let owner = Pubkey::new_unique();
        let provisioner = TokenAccountProvisioner::new(ledger, RESERVE);

        let mut phases = PhaseBuilder::new();
        provisioner
            .provision_output(&mut phases, &owner, &AssetRef::Native)
            .await
            .unwrap();
        phases.core(core()).unwrap();
        let ixs = phases.build().unwrap();
        assert_eq!(ixs.len(), 3);
        assert_eq!(ixs[0].program_id, spl_associated_token_account::id());
        assert_eq!(ixs[2].program_id, spl_token::id());
    }
}
