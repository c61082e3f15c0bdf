use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid Address: {0:?}")]
    InvalidAddress(String),
    #[error("Invalid Input: {0:?}")]
    InvalidInput(String),
    #[error("Empty Call Set")]
    EmptyCallSet,
    #[error("Unsupported Recovery Id: {0}")]
    UnsupportedRecoveryId(u64),
    #[error("Invalid Signature: {0:?}")]
    InvalidSignature(String),
    #[error("Signing Rejected: {0:?}")]
    SigningRejected(String),
    #[error("No Account Available")]
    NoAccountAvailable,
    #[error("Chain Mismatch: {0:?}")]
    ChainMismatch(String),
    #[error("Wallet Error {code}: {message:?}")]
    WalletError { code: i32, message: String },
    #[error("Network Error: {0:?}")]
    NetworkError(String),
    #[error("Gateway Error {status_code}: {code} {message:?}")]
    GatewayError {
        status_code: u16,
        code: String,
        message: String,
    },
    #[error("Deserialization Error: {0:?}")]
    DeserializationError(String),
    #[error("Starknet Error: {0:?}")]
    StarknetError(String),
    #[error("Typed Data Error: {0:?}")]
    TypedDataError(String),
    #[error("Type Conversion Error: {0:?}")]
    TypeConversionError(String),
    #[error("Transaction Timeout: {0:?}")]
    TransactionTimeout(String),
    #[error("Unsupported: {0:?}")]
    Unsupported(String),
}

/// Wallet error code for a request the user declined (EIP-1193).
pub const USER_REJECTED_REQUEST: i32 = 4001;
/// Wallet error code for a chain the wallet does not know yet.
pub const UNRECOGNIZED_CHAIN: i32 = 4902;

impl Error {
    /// Map a wallet JSON-RPC error object onto the crate taxonomy.
    pub fn from_wallet(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_REQUEST => Error::SigningRejected(message),
            _ => Error::WalletError { code, message },
        }
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        matches!(self, Error::WalletError { code, .. } if *code == UNRECOGNIZED_CHAIN)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
