use anchor_lang::prelude::*;
use solana_sdk::{instruction::Instruction, system_program, sysvar};

use crate::{
    core::SdkResult,
    impl_instruction,
    instructions::{InstructionBuilder, SoondexInstructionBuilder},
    protocol::holder_address,
};

const ADD_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [181, 157, 89, 67, 143, 182, 52, 72];
const REMOVE_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [80, 85, 209, 72, 24, 206, 177, 108];

/// Parameters for `add_liquidity`, in base units of each asset
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct AddLiquidityParams {
    pub amount_one: u64,
    pub amount_two: u64,
}

/// Parameters for `remove_liquidity`, in LP base units
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct RemoveLiquidityParams {
    pub liquidity: u64,
}

impl_instruction!(AddLiquidityParams, ADD_LIQUIDITY_DISCRIMINATOR);
impl_instruction!(RemoveLiquidityParams, REMOVE_LIQUIDITY_DISCRIMINATOR);

/// Accounts shared by both liquidity instructions
#[derive(Clone, Copy, Debug)]
pub struct LiquidityAccounts {
    pub pool: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub lp_mint: Pubkey,
    pub user: Pubkey,
}

impl LiquidityAccounts {
    fn user_holder(&self, mint: &Pubkey) -> Pubkey {
        holder_address(&self.user, mint)
    }

    fn pool_holder(&self, mint: &Pubkey) -> Pubkey {
        holder_address(&self.pool, mint)
    }
}

pub fn add_liquidity(
    program_id: Pubkey,
    accounts: LiquidityAccounts,
    amount_a: u64,
    amount_b: u64,
) -> SdkResult<Instruction> {
    let data = AddLiquidityParams {
        amount_one: amount_a,
        amount_two: amount_b,
    }
    .build_data()?;

    Ok(SoondexInstructionBuilder::new(program_id)
        .add_writable(accounts.pool)
        .add_writable(accounts.mint_a)
        .add_writable(accounts.mint_b)
        .add_writable(accounts.user_holder(&accounts.mint_a))
        .add_writable(accounts.user_holder(&accounts.mint_b))
        .add_writable(accounts.pool_holder(&accounts.mint_a))
        .add_writable(accounts.pool_holder(&accounts.mint_b))
        .add_writable(accounts.lp_mint)
        .add_writable(accounts.user_holder(&accounts.lp_mint))
        .add_signer(accounts.user)
        .add_readonly(system_program::id())
        .add_readonly(spl_token::id())
        .add_readonly(spl_associated_token_account::id())
        .add_readonly(sysvar::rent::id())
        .with_data(data)
        .build())
}

pub fn remove_liquidity(
    program_id: Pubkey,
    accounts: LiquidityAccounts,
    liquidity: u64,
) -> SdkResult<Instruction> {
    let data = RemoveLiquidityParams { liquidity }.build_data()?;

    Ok(SoondexInstructionBuilder::new(program_id)
        .add_writable(accounts.pool)
        .add_writable(accounts.mint_a)
        .add_writable(accounts.mint_b)
        .add_writable(accounts.pool_holder(&accounts.mint_a))
        .add_writable(accounts.pool_holder(&accounts.mint_b))
        .add_writable(accounts.lp_mint)
        .add_writable(accounts.user_holder(&accounts.mint_a))
        .add_writable(accounts.user_holder(&accounts.mint_b))
        .add_writable(accounts.user_holder(&accounts.lp_mint))
        .add_signer(accounts.user)
        .add_readonly(spl_token::id())
        .add_readonly(system_program::id())
        .add_readonly(spl_associated_token_account::id())
        .add_readonly(sysvar::rent::id())
        .with_data(data)
        .build())
}
