//! Soondex SDK
//!
//! Client-side estimation and transaction assembly for the Soondex
//! constant-product AMM:
//! - Pool discovery and address derivation
//! - Exact amount scaling and constant-product estimates
//! - Native wrapping and holder account provisioning
//! - Phase-ordered batches for swaps, deposits, pool creation and withdrawals

pub mod client;
pub mod config;
pub mod core;
pub mod instructions;
pub mod prelude;
pub mod protocol;
pub mod testing;

pub use crate::core::*;
pub use client::{
    KeypairSigner, Ledger, LiquidityService, PoolDirectory, RpcLedger, SoondexClient, SwapService,
    TransactionPlan, TransactionSigner,
};
pub use config::SdkConfig;
pub use protocol::{
    estimate_constant_product, format_amount, percent_to_bps, scale_amount, PdaBuilder,
};
