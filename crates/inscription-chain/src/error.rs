//! This module provides the error types for the chain and payment builders.

use thiserror::Error;

use crate::MAX_SCRIPT_ELEMENT_SIZE;

/// The top level error type returned by the transaction builders.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Input rejected before any transaction was built.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The wallet cannot cover outputs plus fee.
    #[error(transparent)]
    InsufficientFunds(#[from] InsufficientFunds),
    /// A prior chain step failed to produce the commit output the next step
    /// must spend. The whole build is abandoned; a truncated chain is never
    /// returned.
    #[error("Chain build failed at transaction {transaction_number}: {reason}")]
    ChainBuild {
        transaction_number: usize,
        reason: String,
    },
    /// Sighash computation failed.
    #[error("Sighash computation failed: {0}")]
    Sighash(String),
}

/// Input problems detected up front.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Payload hex did not decode.
    #[error("Payload is not valid hex: {0}")]
    InvalidHexPayload(#[from] hex::FromHexError),
    /// Payload is empty.
    #[error("Payload is empty")]
    EmptyPayload,
    /// Content type does not fit in one script element.
    #[error("Content type is {0} bytes, must not exceed {MAX_SCRIPT_ELEMENT_SIZE}")]
    ContentTypeTooLong(usize),
    /// Wallet holds no UTXOs at all.
    #[error("Wallet has no UTXOs")]
    MissingUtxo,
    /// Recipient list is empty.
    #[error("Recipient list is empty")]
    NoRecipients,
    /// A recipient carries a zero amount.
    #[error("Recipient amount must be positive")]
    ZeroRecipientAmount,
    /// Fee must be positive.
    #[error("Fee must be positive")]
    ZeroFee,
    /// Whole-coin amount does not convert to satoshis.
    #[error("Amount {0} does not convert to satoshis")]
    BadAmount(f64),
}

/// The available inputs fall short of outputs plus fee.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not enough funds: {shortfall} sat short of {required} sat required")]
pub struct InsufficientFunds {
    /// Total the transaction had to cover, in satoshis.
    pub required: u64,
    /// How much was missing, in satoshis.
    pub shortfall: u64,
}

/// A node refused one of the chain's transactions at broadcast time.
///
/// Raised by the caller's broadcaster, not by the builders. Once transaction
/// k is rejected, transactions k+1.. spend outputs that will never confirm;
/// the only recovery is rebuilding from the wallet's true UTXO set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transaction {transaction_number} rejected at broadcast: {reason}")]
pub struct BroadcastRejected {
    /// 1-based position of the rejected transaction in the chain.
    pub transaction_number: usize,
    pub reason: RejectionReason,
}

impl BroadcastRejected {
    /// Whether any transaction after the rejected one can still be submitted.
    pub fn invalidates_remainder(&self) -> bool {
        self.reason.invalidates_remainder()
    }
}

/// Why a node refused a submitted transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// An input is missing or already spent.
    #[error("missing or spent inputs")]
    MissingInputs,
    /// Minimum relay fee not met.
    #[error("minimum relay fee not met")]
    FeeTooLow,
    /// Script or signature verification failed.
    #[error("script verification failed")]
    ScriptVerifyFailed,
    /// The node already has this transaction.
    #[error("transaction already known")]
    AlreadyKnown,
    /// Too many unconfirmed ancestors for the node's mempool policy.
    #[error("too-long-mempool-chain")]
    TooLongMempoolChain,
    /// Other rejection reason.
    #[error("{0}")]
    Other(String),
}

impl RejectionReason {
    /// Creates the reason from a node reject string.
    pub fn from_reason(reason: String) -> Self {
        if reason.contains("missing-inputs") || reason.contains("bad-txns-inputs-missingorspent") {
            RejectionReason::MissingInputs
        } else if reason.contains("min relay fee not met") || reason.contains("insufficient fee") {
            RejectionReason::FeeTooLow
        } else if reason.contains("non-mandatory-script-verify-flag")
            || reason.contains("mandatory-script-verify-flag-failed")
        {
            RejectionReason::ScriptVerifyFailed
        } else if reason.contains("txn-already-known") || reason.contains("already in block chain")
        {
            RejectionReason::AlreadyKnown
        } else if reason.contains("too-long-mempool-chain") {
            RejectionReason::TooLongMempoolChain
        } else {
            RejectionReason::Other(reason)
        }
    }

    /// Rejections that orphan the rest of the chain. A transaction the node
    /// already knows leaves the chain intact and submission can continue.
    pub fn invalidates_remainder(&self) -> bool {
        !matches!(self, Self::AlreadyKnown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reject_reasons() {
        assert_eq!(
            RejectionReason::from_reason("insufficient fee, rejecting replacement".to_string()),
            RejectionReason::FeeTooLow
        );
        assert_eq!(
            RejectionReason::from_reason("bad-txns-inputs-missingorspent".to_string()),
            RejectionReason::MissingInputs
        );
        assert_eq!(
            RejectionReason::from_reason(
                "mandatory-script-verify-flag-failed (Script failed an OP_EQUALVERIFY operation)"
                    .to_string()
            ),
            RejectionReason::ScriptVerifyFailed
        );
        assert_eq!(
            RejectionReason::from_reason("txn-already-known".to_string()),
            RejectionReason::AlreadyKnown
        );
        assert!(matches!(
            RejectionReason::from_reason("scriptpubkey".to_string()),
            RejectionReason::Other(_)
        ));
    }

    #[test]
    fn already_known_keeps_remainder_submittable() {
        let rejected = BroadcastRejected {
            transaction_number: 3,
            reason: RejectionReason::AlreadyKnown,
        };
        assert!(!rejected.invalidates_remainder());

        let rejected = BroadcastRejected {
            transaction_number: 3,
            reason: RejectionReason::ScriptVerifyFailed,
        };
        assert!(rejected.invalidates_remainder());
    }
}
