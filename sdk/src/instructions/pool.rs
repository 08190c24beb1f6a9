use anchor_lang::prelude::*;
use solana_sdk::{instruction::Instruction, system_program, sysvar};

use crate::{
    core::SdkResult,
    impl_instruction,
    instructions::{InstructionBuilder, SoondexInstructionBuilder},
    protocol::holder_address,
};

const INITIALIZE_POOL_DISCRIMINATOR: [u8; 8] = [95, 180, 10, 172, 84, 174, 232, 40];

/// Parameters for `initialize_pool`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitializePoolParams {
    /// Pool fee in bps
    pub fee: u64,
}

impl_instruction!(InitializePoolParams, INITIALIZE_POOL_DISCRIMINATOR);

/// Accounts for pool creation. `pool` must be derived from `mint_b`.
#[derive(Clone, Copy, Debug)]
pub struct InitializePoolAccounts {
    pub pool: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub user: Pubkey,
}

pub fn initialize_pool(
    program_id: Pubkey,
    accounts: InitializePoolAccounts,
    fee_bps: u16,
) -> SdkResult<Instruction> {
    let data = InitializePoolParams { fee: fee_bps as u64 }.build_data()?;

    Ok(SoondexInstructionBuilder::new(program_id)
        .add_writable(accounts.pool)
        .add_readonly(accounts.mint_a)
        .add_readonly(accounts.mint_b)
        .add_writable(holder_address(&accounts.pool, &accounts.mint_a))
        .add_writable(holder_address(&accounts.pool, &accounts.mint_b))
        .add_signer(accounts.user)
        .add_readonly(system_program::id())
        .add_readonly(spl_token::id())
        .add_readonly(spl_associated_token_account::id())
        .add_readonly(sysvar::rent::id())
        .with_data(data)
        .build())
}
