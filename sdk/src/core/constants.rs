use solana_sdk::pubkey::Pubkey;

/// Program ID for the Soondex AMM
pub const PROGRAM_ID: Pubkey = solana_sdk::pubkey!("4hfWrBXXKKYuQ91bjfAiccq3WTJjWkuYjiwuHK8Xmmmr");

/// Get the program ID as a Pubkey
pub fn program_id() -> Pubkey {
    PROGRAM_ID
}

/// Seeds for program PDAs
pub mod seeds {
    pub const POOL: &[u8] = b"pool";
}

/// Denominator for all basis-point arithmetic
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Decimals of the native asset (lamports per SOL = 10^9)
pub const NATIVE_DECIMALS: u8 = 9;

/// Decimals the program requires for LP mints
pub const LP_DECIMALS: u8 = 6;

/// Lamports kept back for rent and fees whenever native balance is wrapped
pub const DEFAULT_NATIVE_FEE_RESERVE: u64 = 10_000_000;

/// Slippage policy bounds (0.1% .. 20%)
pub const MIN_SLIPPAGE_BPS: u16 = 10;
pub const MAX_SLIPPAGE_BPS: u16 = 2_000;

/// Highest fee `initialize_pool` accepts, in bps
pub const PROGRAM_MAX_FEE_BPS: u16 = 300;

/// Fee percent accepted for new pools by default policy
pub const MAX_POOL_FEE_PERCENT: u16 = 3;

/// Transport-level retries handed to the RPC node on submission
pub const DEFAULT_MAX_SEND_RETRIES: usize = 5;
