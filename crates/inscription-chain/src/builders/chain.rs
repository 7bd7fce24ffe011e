//! Drives a payload through partitioning, commit outputs, reveal spends and
//! funding until the whole chain of dependent transactions is signed.

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode;
use bitcoin::secp256k1::{self, SecretKey};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use secp256k1::SECP256K1;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::{build_unlock_script, commit_output, fund_transaction, sign_input, TxWithId};
use crate::error::{BuildError, ValidationError};
use crate::inscription::{build_inscription_script, partition_inscription, PartialScript, Payload};
use crate::lock::RevealLock;
use crate::network_params::NetworkParams;
use crate::wallet::WalletState;

/// One broadcast-ready transaction of a built chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainEntry {
    /// 1-based position. Broadcast strictly in this order.
    pub transaction_number: usize,
    /// Hex transaction ID.
    pub txid: String,
    /// Raw transaction, hex-encoded, ready for `sendrawtransaction`.
    pub hex: String,
}

/// An ordered chain of signed transactions.
///
/// Transaction k spends output 0 of transaction k−1, so the order is part
/// of the contract: each transaction must reach the network before the next
/// is submitted, and a rejection strands every later one.
#[derive(Debug, Clone)]
pub struct TransactionChain {
    pub transactions: Vec<TxWithId>,
}

impl TransactionChain {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The wire-facing form: numbered txid/hex records in broadcast order.
    pub fn entries(&self) -> Vec<ChainEntry> {
        self.transactions
            .iter()
            .enumerate()
            .map(|(index, tx)| ChainEntry {
                transaction_number: index + 1,
                txid: tx.id.to_string(),
                hex: encode::serialize_hex(&tx.tx),
            })
            .collect()
    }
}

/// Builds the complete commit-reveal chain carrying `payload`.
///
/// The payload is split into partial reveal scripts; every partial gets a
/// transaction paying a P2SH commit output for it, each spending the commit
/// output of its predecessor, and a final transaction reveals the last
/// partial while paying `recipient_script` the carrier value. Funding pulls
/// the wallet's first UTXO whenever a step cannot pay for itself; since each
/// step credits its change back to the wallet, a single sufficiently large
/// UTXO funds the whole chain. The wallet passed in is not mutated; either
/// the full chain builds or an error is returned and nothing is spent.
#[instrument(level = "debug", skip_all, fields(payload_bytes = payload.data().len()))]
pub fn build_inscription_chain(
    wallet: &WalletState,
    private_key: &SecretKey,
    payload: &Payload,
    recipient_script: ScriptBuf,
    params: &NetworkParams,
) -> Result<TransactionChain, BuildError> {
    if wallet.utxos.is_empty() {
        return Err(ValidationError::MissingUtxo.into());
    }
    let public_key =
        bitcoin::PublicKey::new(secp256k1::PublicKey::from_secret_key(SECP256K1, private_key));

    let partials = partition_inscription(build_inscription_script(payload));
    let mut wallet = wallet.clone();
    let mut transactions: Vec<TxWithId> = Vec::with_capacity(partials.len() + 1);
    let mut prior: Option<(PartialScript, RevealLock)> = None;

    for partial in partials {
        let lock = RevealLock::build(&partial, &public_key);
        let outputs = vec![commit_output(&lock, params.commit_output_value)];
        let tx = match prior.replace((partial, lock)) {
            None => bootstrap_transaction(outputs, &wallet, private_key, params)?,
            Some(prior_reveal) => {
                let prev = transactions.last().expect("a prior step was recorded");
                spend_prior_commit(
                    prev,
                    &prior_reveal,
                    outputs,
                    &wallet,
                    private_key,
                    params,
                    transactions.len() + 1,
                )?
            }
        };
        let id = tx.compute_txid();
        trace!(step = transactions.len() + 1, txid = %id, "built commit transaction");
        wallet = wallet.apply(&tx);
        transactions.push(TxWithId { id, tx });
    }

    let prior_reveal = prior.expect("a payload always yields at least one partial");
    let prev = transactions.last().expect("the commit steps come first");
    let outputs = vec![TxOut {
        value: Amount::from_sat(params.carrier_output_value),
        script_pubkey: recipient_script,
    }];
    let tx = spend_prior_commit(
        prev,
        &prior_reveal,
        outputs,
        &wallet,
        private_key,
        params,
        transactions.len() + 1,
    )?;
    let id = tx.compute_txid();
    debug!(transactions = transactions.len() + 1, txid = %id, "inscription chain complete");
    transactions.push(TxWithId { id, tx });

    Ok(TransactionChain { transactions })
}

/// First transaction of a chain: no reveal yet, just the commit output for
/// the first partial, paid for by the wallet.
fn bootstrap_transaction(
    outputs: Vec<TxOut>,
    wallet: &WalletState,
    private_key: &SecretKey,
    params: &NetworkParams,
) -> Result<Transaction, BuildError> {
    let mut tx = Transaction {
        version: Version(params.tx_version),
        lock_time: LockTime::ZERO,
        input: vec![],
        output: outputs,
    };
    let mut input_values = Vec::new();
    fund_transaction(&mut tx, &mut input_values, wallet, private_key, params)?;
    Ok(tx)
}

/// A linking or finalizing transaction: spends the predecessor's commit
/// output at input 0, revealing the prior partial, then funds and signs.
///
/// The reveal scriptSig is attached after funding so the wallet-input
/// signatures are made over the same skeleton the fee was charged on.
fn spend_prior_commit(
    prev: &TxWithId,
    prior_reveal: &(PartialScript, RevealLock),
    outputs: Vec<TxOut>,
    wallet: &WalletState,
    private_key: &SecretKey,
    params: &NetworkParams,
    transaction_number: usize,
) -> Result<Transaction, BuildError> {
    let (prior_partial, prior_lock) = prior_reveal;
    let (previous_output, value) = locate_commit_outpoint(prev, prior_lock, transaction_number)?;

    let mut tx = Transaction {
        version: Version(params.tx_version),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output,
            script_sig: ScriptBuf::new(),
            sequence: Sequence(params.sequence),
            witness: Witness::new(),
        }],
        output: outputs,
    };
    let mut input_values = vec![value];
    fund_transaction(&mut tx, &mut input_values, wallet, private_key, params)?;

    let signature = sign_input(&tx, 0, &prior_lock.to_script(), private_key, params.sighash_flag)?;
    tx.input[0].script_sig = build_unlock_script(prior_partial, signature, prior_lock);
    Ok(tx)
}

/// Finds the commit output the next transaction must spend.
fn locate_commit_outpoint(
    prev: &TxWithId,
    prior_lock: &RevealLock,
    transaction_number: usize,
) -> Result<(OutPoint, u64), BuildError> {
    let commit_script = prior_lock.commit_script_pubkey();
    let vout = prev
        .tx
        .output
        .iter()
        .position(|output| output.script_pubkey == commit_script)
        .ok_or_else(|| BuildError::ChainBuild {
            transaction_number,
            reason: format!(
                "transaction {} carries no commit output for the pending reveal",
                prev.id
            ),
        })?;
    Ok((
        OutPoint {
            txid: prev.id,
            vout: vout as u32,
        },
        prev.tx.output[vout].value.to_sat(),
    ))
}
