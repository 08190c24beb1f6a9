use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::core::{
    program_id, SdkError, SdkResult, BPS_DENOMINATOR, DEFAULT_MAX_SEND_RETRIES,
    DEFAULT_NATIVE_FEE_RESERVE, LP_DECIMALS, MAX_POOL_FEE_PERCENT, MAX_SLIPPAGE_BPS,
    MIN_SLIPPAGE_BPS, PROGRAM_MAX_FEE_BPS,
};

/// SDK configuration, passed explicitly into every service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Ledger RPC endpoint
    pub rpc_url: String,

    /// AMM program ID
    #[serde(with = "pubkey_serde")]
    pub program_id: Pubkey,

    /// Commitment for reads, preflight and confirmation
    pub commitment: String,

    /// Transport-level retries handed to the RPC node
    pub max_send_retries: usize,

    pub skip_preflight: bool,

    /// Maximum confirmation wait in seconds
    pub confirm_timeout_secs: u64,

    /// Confirmation polling cadence in milliseconds
    pub confirm_poll_interval_ms: u64,

    /// Lamports required on top of any amount that gets wrapped
    pub native_fee_reserve_lamports: u64,

    pub min_slippage_bps: u16,
    pub max_slippage_bps: u16,

    /// Policy cap for new-pool fee percent, at most the program's 3%
    pub max_fee_percent: u16,

    /// Decimals of newly created LP mints; the program only accepts 6
    pub lp_decimals: u8,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self::localnet()
    }
}

impl SdkConfig {
    pub fn localnet() -> Self {
        Self {
            rpc_url: "http://localhost:8899".to_string(),
            program_id: program_id(),
            commitment: "confirmed".to_string(),
            max_send_retries: DEFAULT_MAX_SEND_RETRIES,
            skip_preflight: true,
            confirm_timeout_secs: 60,
            confirm_poll_interval_ms: 500,
            native_fee_reserve_lamports: DEFAULT_NATIVE_FEE_RESERVE,
            min_slippage_bps: MIN_SLIPPAGE_BPS,
            max_slippage_bps: MAX_SLIPPAGE_BPS,
            max_fee_percent: MAX_POOL_FEE_PERCENT,
            lp_decimals: LP_DECIMALS,
        }
    }

    pub fn devnet() -> Self {
        Self::localnet().with_rpc_url("https://api.devnet.solana.com")
    }

    pub fn mainnet() -> Self {
        Self::localnet()
            .with_rpc_url("https://api.mainnet-beta.solana.com")
            .with_commitment("finalized")
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = commitment.into();
        self
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_confirm_poll_interval(mut self, interval: Duration) -> Self {
        self.confirm_poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_native_fee_reserve(mut self, lamports: u64) -> Self {
        self.native_fee_reserve_lamports = lamports;
        self
    }

    pub fn with_slippage_bounds(mut self, min_bps: u16, max_bps: u16) -> Self {
        self.min_slippage_bps = min_bps;
        self.max_slippage_bps = max_bps;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SdkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> SdkResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.rpc_url.is_empty() {
            return Err(invalid("rpc_url", "empty", "non-empty URL"));
        }
        self.commitment_config()?;

        if self.max_send_retries == 0 {
            return Err(invalid("max_send_retries", "0", "greater than 0"));
        }
        if self.confirm_timeout_secs == 0 {
            return Err(invalid("confirm_timeout_secs", "0", "greater than 0"));
        }
        if self.confirm_poll_interval_ms == 0 {
            return Err(invalid("confirm_poll_interval_ms", "0", "greater than 0"));
        }
        if self.max_slippage_bps as u64 > BPS_DENOMINATOR {
            return Err(invalid(
                "max_slippage_bps",
                &self.max_slippage_bps.to_string(),
                "at most 10000 (100%)",
            ));
        }
        if self.min_slippage_bps > self.max_slippage_bps {
            return Err(invalid(
                "min_slippage_bps",
                &self.min_slippage_bps.to_string(),
                &format!("at most max_slippage_bps ({})", self.max_slippage_bps),
            ));
        }
        if self.max_fee_percent as u32 * 100 > PROGRAM_MAX_FEE_BPS as u32 {
            return Err(invalid(
                "max_fee_percent",
                &self.max_fee_percent.to_string(),
                &format!("at most {}", PROGRAM_MAX_FEE_BPS / 100),
            ));
        }
        if self.lp_decimals != LP_DECIMALS {
            return Err(invalid(
                "lp_decimals",
                &self.lp_decimals.to_string(),
                &LP_DECIMALS.to_string(),
            ));
        }
        Ok(())
    }

    pub fn commitment_config(&self) -> SdkResult<CommitmentConfig> {
        match self.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(invalid("commitment", other, "processed, confirmed or finalized")),
        }
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}

fn invalid(field: &str, value: &str, expected: &str) -> SdkError {
    SdkError::Validation(format!(
        "invalid config {}: got {}, expected {}",
        field, value, expected
    ))
}

mod pubkey_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}
