use solana_sdk::{instruction::Instruction, program_pack::Pack, pubkey::Pubkey, system_instruction};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_token::instruction as token_instruction;

use crate::core::SdkResult;

/// Create the canonical holder account for `(owner, mint)`; tolerates a
/// concurrent creation by the same or another payer.
pub fn create_holder(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    create_associated_token_account_idempotent(payer, owner, mint, &spl_token::id())
}

/// Move `lamports` into a wrapped-native holder and synchronise its balance
pub fn wrap_native(owner: &Pubkey, holder: &Pubkey, lamports: u64) -> SdkResult<Vec<Instruction>> {
    Ok(vec![
        system_instruction::transfer(owner, holder, lamports),
        token_instruction::sync_native(&spl_token::id(), holder)?,
    ])
}

/// Close a holder account, returning its rent (and wrapped native balance) to `owner`
pub fn close_holder(holder: &Pubkey, owner: &Pubkey) -> SdkResult<Instruction> {
    Ok(token_instruction::close_account(
        &spl_token::id(),
        holder,
        owner,
        owner,
        &[],
    )?)
}

/// Allocate and initialise a new mint whose authority is `authority`
pub fn create_mint(
    payer: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    decimals: u8,
    rent_lamports: u64,
) -> SdkResult<Vec<Instruction>> {
    Ok(vec![
        system_instruction::create_account(
            payer,
            mint,
            rent_lamports,
            spl_token::state::Mint::LEN as u64,
            &spl_token::id(),
        ),
        token_instruction::initialize_mint2(&spl_token::id(), mint, authority, None, decimals)?,
    ])
}
