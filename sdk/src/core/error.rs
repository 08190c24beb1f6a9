use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

/// Why a submitted batch did not reach confirmation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationFailure {
    #[error("ledger rejected transaction: {0}")]
    Rejected(String),

    #[error("blockhash expired after block height {last_valid_block_height}")]
    Expired { last_valid_block_height: u64 },

    #[error("no confirmation after {waited_secs}s")]
    TimedOut { waited_secs: u64 },
}

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Pool already exists at address: {address}")]
    AlreadyExists { address: Pubkey },

    #[error("Insufficient balance for {asset}: required {required} base units, available {available}")]
    InsufficientBalance {
        asset: String,
        required: u64,
        available: u64,
    },

    #[error("Construction error: {0}")]
    Construction(String),

    #[error("Submission error: {0}")]
    Submission(String),

    /// Submitted but not confirmed; the outcome of `signature` is unknown
    /// unless `failure` is a rejection.
    #[error("Confirmation error for {signature}: {failure}")]
    Confirmation {
        signature: Signature,
        failure: ConfirmationFailure,
    },

    /// The transaction is final on the ledger; only the directory write failed.
    #[error("Transaction {signature} confirmed but recording failed: {message}")]
    RecordingFailed { signature: Signature, message: String },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of [`SdkError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    AlreadyExists,
    InsufficientBalance,
    Construction,
    Submission,
    Confirmation,
    Recording,
    Transport,
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::Validation(_) => ErrorKind::Validation,
            SdkError::NotFound(_) => ErrorKind::NotFound,
            SdkError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            SdkError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            SdkError::Construction(_) | SdkError::Serialization(_) => ErrorKind::Construction,
            SdkError::Submission(_) => ErrorKind::Submission,
            SdkError::Confirmation { .. } => ErrorKind::Confirmation,
            SdkError::RecordingFailed { .. } => ErrorKind::Recording,
            SdkError::Rpc(_) | SdkError::Directory(_) => ErrorKind::Transport,
        }
    }

    /// Signature of a batch that is known to be final on the ledger
    pub fn confirmed_signature(&self) -> Option<&Signature> {
        match self {
            SdkError::RecordingFailed { signature, .. } => Some(signature),
            _ => None,
        }
    }

    /// Signature of a batch that reached the ledger, confirmed or not
    pub fn submitted_signature(&self) -> Option<&Signature> {
        match self {
            SdkError::RecordingFailed { signature, .. } | SdkError::Confirmation { signature, .. } => {
                Some(signature)
            }
            _ => None,
        }
    }

    pub(crate) fn insufficient(asset: impl ToString, required: u64, available: u64) -> Self {
        SdkError::InsufficientBalance {
            asset: asset.to_string(),
            required,
            available,
        }
    }
}

impl From<solana_client::client_error::ClientError> for SdkError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        SdkError::Rpc(err.to_string())
    }
}

impl From<solana_sdk::program_error::ProgramError> for SdkError {
    fn from(err: solana_sdk::program_error::ProgramError) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<solana_sdk::signer::SignerError> for SdkError {
    fn from(err: solana_sdk::signer::SignerError) -> Self {
        SdkError::Submission(err.to_string())
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SdkError {
    fn from(err: toml::de::Error) -> Self {
        SdkError::Validation(format!("invalid config: {}", err))
    }
}

impl From<toml::ser::Error> for SdkError {
    fn from(err: toml::ser::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
