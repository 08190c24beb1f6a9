//! Prelude module for common imports
//!
//! Anchor is only used for the serialization traits of instruction payloads.

pub use anchor_lang::{AnchorDeserialize, AnchorSerialize};

pub use solana_sdk::{pubkey::Pubkey, signature::Signature};

pub use crate::client::{
    Ledger, LiquidityService, PoolDirectory, SoondexClient, SwapService, TransactionSigner,
};
pub use crate::config::SdkConfig;
pub use crate::core::{AssetRef, LiquidityRequest, PoolRecord, SdkError, SdkResult, SwapEstimate};
