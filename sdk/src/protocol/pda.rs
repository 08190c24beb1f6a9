use solana_sdk::pubkey::Pubkey;

use crate::core::{constants::*, AssetRef};

/// PDA builder for program addresses
#[derive(Clone, Debug)]
pub struct PdaBuilder {
    pub program_id: Pubkey,
}

impl PdaBuilder {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    /// Pool PDA for the asset used as seed at creation time
    pub fn pool(&self, seed_mint: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[seeds::POOL, seed_mint.as_ref()], &self.program_id)
    }

    /// Both candidate pool addresses for a pair, seeded by `a` then by `b`.
    ///
    /// Which asset seeded the pool is unknown to the caller, so both have to
    /// be looked up.
    pub fn pool_candidates(&self, a: &AssetRef, b: &AssetRef) -> [Pubkey; 2] {
        [self.pool(&a.mint()).0, self.pool(&b.mint()).0]
    }
}

/// Canonical holder (associated token) account for `(owner, mint)`. Pure.
pub fn holder_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address(owner, mint)
}

/// Convenience function for one-off pool derivations
pub fn find_pool_address(seed_mint: &Pubkey) -> (Pubkey, u8) {
    PdaBuilder::new(program_id()).pool(seed_mint)
}
