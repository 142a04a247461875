use std::io::Error as IoError;
use thiserror::Error;

/// Error taxonomy for wallet operations.
///
/// Polling loops never surface these to callers; they retry with a delay and
/// raise a flag instead. One-shot operations (build/sign/broadcast) propagate
/// immediately and leave no partial state behind.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("insufficient funds to cover the requested amount plus fees")]
    InsufficientFunds,
    #[error("invalid address for this coin: {0}")]
    InvalidAddress(String),
    /// Hardware devices refuse transactions with more than
    /// [`MAX_HARDWARE_INPUTS_OUTPUTS`] inputs or outputs.
    #[error("transaction has {count} {kind}, hardware wallets support at most {max}")]
    TooManyInputsOutputs {
        kind: &'static str,
        count: usize,
        max: usize,
    },
    #[error("node unreachable: {0}")]
    NodeUnreachable(#[from] IoError),
    #[error("node returned an unexpected response: {0}")]
    UnexpectedResponse(String),
    /// The signer returned a signature list that does not match the input
    /// list 1:1. Fatal; partial encoding is never attempted.
    #[error("signer returned {found} signatures for {expected} inputs")]
    InvalidSignatureCount { expected: usize, found: usize },
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("{0}")]
    InvalidParameters(String),
}

/// Hardware device UX/memory constraint on transaction shape.
pub const MAX_HARDWARE_INPUTS_OUTPUTS: usize = 8;
