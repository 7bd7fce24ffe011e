//! Builds commit-reveal transaction chains that inscribe a binary payload
//! onto legacy-P2SH UTXO networks

pub mod builders;
pub mod error;
pub mod inscription;
pub mod lock;
pub mod network_params;
pub mod parsers;
pub mod payment;
pub mod script;
pub mod wallet;

pub use builders::chain::{build_inscription_chain, ChainEntry, TransactionChain};
pub use builders::TxWithId;
pub use error::{BroadcastRejected, BuildError, InsufficientFunds, RejectionReason, ValidationError};
pub use inscription::Payload;
pub use network_params::{FeePolicy, NetworkParams};
pub use wallet::{Utxo, WalletState};

/// Maximum payload bytes carried by a single data-push chunk.
pub const MAX_CHUNK_LEN: usize = 240;

/// Upper bound on the serialized size of one partial script, bounding how
/// much of the inscription a single transaction reveals.
pub const MAX_PAYLOAD_LEN: usize = 1500;

/// Consensus ceiling for a single pushed script element.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
