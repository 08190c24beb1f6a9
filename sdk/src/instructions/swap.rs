use anchor_lang::prelude::*;
use solana_sdk::{instruction::Instruction, system_program, sysvar};

use crate::{
    core::{SdkResult, SwapDirection},
    impl_instruction,
    instructions::{InstructionBuilder, SoondexInstructionBuilder},
    protocol::holder_address,
};

const BUY_DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];
const SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];

/// Swap payload shared by `buy` and `sell`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapParams {
    /// Input amount in base units
    pub amount: u64,
    /// Slippage tolerance in bps
    pub slippage: u64,
    pub is_buy: bool,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct BuyData(pub SwapParams);

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct SellData(pub SwapParams);

impl_instruction!(BuyData, BUY_DISCRIMINATOR);
impl_instruction!(SellData, SELL_DISCRIMINATOR);

/// Accounts for a swap; mints are ordered (input, output)
#[derive(Clone, Copy, Debug)]
pub struct SwapAccounts {
    pub pool: Pubkey,
    pub user: Pubkey,
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
}

/// Build a `buy` or `sell` instruction depending on `direction`
pub fn swap(
    program_id: Pubkey,
    accounts: SwapAccounts,
    direction: SwapDirection,
    amount: u64,
    slippage_bps: u16,
) -> SdkResult<Instruction> {
    let params = SwapParams {
        amount,
        slippage: slippage_bps as u64,
        is_buy: direction.is_buy(),
    };
    let data = match direction {
        SwapDirection::Buy => BuyData(params).build_data()?,
        SwapDirection::Sell => SellData(params).build_data()?,
    };

    Ok(SoondexInstructionBuilder::new(program_id)
        .add_writable(accounts.pool)
        .add_writable(accounts.input_mint)
        .add_writable(accounts.output_mint)
        .add_writable(holder_address(&accounts.pool, &accounts.input_mint))
        .add_writable(holder_address(&accounts.pool, &accounts.output_mint))
        .add_writable(holder_address(&accounts.user, &accounts.input_mint))
        .add_writable(holder_address(&accounts.user, &accounts.output_mint))
        .add_signer(accounts.user)
        .add_readonly(sysvar::rent::id())
        .add_readonly(system_program::id())
        .add_readonly(spl_token::id())
        .add_readonly(spl_associated_token_account::id())
        .with_data(data)
        .build())
}
