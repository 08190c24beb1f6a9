use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature};

use crate::core::{SdkError, SdkResult};
use crate::protocol::pda::holder_address;

/// Reference to a tradable asset.
///
/// The ledger's native currency is modelled explicitly instead of through its
/// wrapped mint address; use [`AssetRef::from_mint`] at the boundary so the
/// wrapped mint always normalises to [`AssetRef::Native`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetRef {
    Native,
    Fungible(Pubkey),
}

impl AssetRef {
    pub fn from_mint(mint: Pubkey) -> Self {
        if mint == spl_token::native_mint::id() {
            AssetRef::Native
        } else {
            AssetRef::Fungible(mint)
        }
    }

    /// Mint address used on the ledger (wrapped mint for native)
    pub fn mint(&self) -> Pubkey {
        match self {
            AssetRef::Native => spl_token::native_mint::id(),
            AssetRef::Fungible(mint) => *mint,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, AssetRef::Native)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Native => write!(f, "SOL"),
            AssetRef::Fungible(mint) => write!(f, "{}", mint),
        }
    }
}

/// Swap direction relative to the pool's stored mint order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapDirection {
    /// Input is the pool's `mint_a`
    Buy,
    /// Input is the pool's `mint_b`
    Sell,
}

impl SwapDirection {
    pub fn is_buy(&self) -> bool {
        matches!(self, SwapDirection::Buy)
    }
}

/// Where the program deducts the pool fee
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeSide {
    Input,
    Output,
}

impl From<SwapDirection> for FeeSide {
    fn from(direction: SwapDirection) -> Self {
        match direction {
            SwapDirection::Buy => FeeSide::Input,
            SwapDirection::Sell => FeeSide::Output,
        }
    }
}

/// Pool record as kept by the pool directory.
///
/// `address` is the PDA derived from `mint_b` (the seed asset supplied at
/// creation); the reserve holders are the pool's associated accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub address: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub lp_mint: Pubkey,
    pub reserve_a: Pubkey,
    pub reserve_b: Pubkey,
    pub fee_bps: u16,
    pub total_value_locked: u64,
    pub deployer: Pubkey,
    pub created_at: DateTime<Utc>,
}

impl PoolRecord {
    pub fn new(
        address: Pubkey,
        mint_a: Pubkey,
        mint_b: Pubkey,
        lp_mint: Pubkey,
        fee_bps: u16,
        deployer: Pubkey,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            address,
            mint_a,
            mint_b,
            lp_mint,
            reserve_a: holder_address(&address, &mint_a),
            reserve_b: holder_address(&address, &mint_b),
            fee_bps,
            total_value_locked: 0,
            deployer,
            created_at,
        }
    }

    pub fn asset_a(&self) -> AssetRef {
        AssetRef::from_mint(self.mint_a)
    }

    pub fn asset_b(&self) -> AssetRef {
        AssetRef::from_mint(self.mint_b)
    }

    pub fn lp_asset(&self) -> AssetRef {
        AssetRef::Fungible(self.lp_mint)
    }

    pub fn contains(&self, asset: &AssetRef) -> bool {
        let mint = asset.mint();
        mint == self.mint_a || mint == self.mint_b
    }

    /// Direction of a swap whose input is `input`
    pub fn direction_for(&self, input: &AssetRef) -> SdkResult<SwapDirection> {
        let mint = input.mint();
        if mint == self.mint_a {
            Ok(SwapDirection::Buy)
        } else if mint == self.mint_b {
            Ok(SwapDirection::Sell)
        } else {
            Err(SdkError::Validation(format!(
                "asset {} is not traded by pool {}",
                input, self.address
            )))
        }
    }

    /// Reserve holders ordered as (input side, output side)
    pub fn reserves_for(&self, direction: SwapDirection) -> (Pubkey, Pubkey) {
        match direction {
            SwapDirection::Buy => (self.reserve_a, self.reserve_b),
            SwapDirection::Sell => (self.reserve_b, self.reserve_a),
        }
    }
}

/// Advisory swap estimate in output base units; stale once reserves move
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapEstimate {
    pub amount_in: u64,
    pub fee: u64,
    pub estimated_output: u64,
    pub minimum_received: u64,
}

/// Add-liquidity request with human decimal amounts
#[derive(Clone, Debug)]
pub struct LiquidityRequest {
    pub asset_a: AssetRef,
    pub asset_b: AssetRef,
    pub amount_a: String,
    pub amount_b: String,
    pub is_new_pool: bool,
    /// Pool fee in percent, only read on the new-pool path
    pub fee_percent: String,
}

impl LiquidityRequest {
    pub fn existing(asset_a: AssetRef, asset_b: AssetRef, amount_a: &str, amount_b: &str) -> Self {
        Self {
            asset_a,
            asset_b,
            amount_a: amount_a.to_string(),
            amount_b: amount_b.to_string(),
            is_new_pool: false,
            fee_percent: "0".to_string(),
        }
    }

    pub fn new_pool(
        asset_a: AssetRef,
        asset_b: AssetRef,
        amount_a: &str,
        amount_b: &str,
        fee_percent: &str,
    ) -> Self {
        Self {
            asset_a,
            asset_b,
            amount_a: amount_a.to_string(),
            amount_b: amount_b.to_string(),
            is_new_pool: true,
            fee_percent: fee_percent.to_string(),
        }
    }
}

/// Append-only record of a confirmed trade
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trader: Pubkey,
    /// Input amount in base units
    pub amount: u64,
    /// Input mint
    pub asset: Pubkey,
    pub pool: Pubkey,
    pub signature: Signature,
}

/// Holder balance in base units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenBalance {
    pub amount: u64,
    pub decimals: u8,
}

/// Subset of mint state the engine reads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintInfo {
    pub decimals: u8,
    pub supply: u64,
}

/// Blockhash plus the last block height at which it is still accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockhashReference {
    pub hash: Hash,
    pub last_valid_block_height: u64,
}

/// Ledger view of a submitted signature
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureState {
    Pending,
    Confirmed,
    Failed(String),
}
