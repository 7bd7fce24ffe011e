//! Provides the shared machinery for building and signing the
//! commit-reveal transactions: fee sizing, funding, and unlock scripts.

pub mod chain;

use core::fmt;

use bitcoin::consensus::encode;
use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{self, Message, SecretKey};
use bitcoin::sighash::SighashCache;
use bitcoin::{
    Amount, PublicKey, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use secp256k1::SECP256K1;
use serde::Serialize;
use tracing::trace;

use crate::error::{BuildError, InsufficientFunds};
use crate::inscription::PartialScript;
use crate::lock::RevealLock;
use crate::network_params::NetworkParams;
use crate::script::{ElementScript, ScriptElement};
use crate::wallet::{Utxo, WalletState};

/// A signed transaction paired with its computed id.
#[derive(Clone, Serialize)]
pub struct TxWithId {
    /// Transaction id
    pub id: Txid,
    /// The full transaction
    pub tx: Transaction,
}

impl fmt::Debug for TxWithId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxWithId")
            .field("id", &self.id)
            .field("tx", &"...")
            .finish()
    }
}

/// Placeholder for a not-yet-signed P2PKH scriptSig: a 72-byte signature
/// push and a 33-byte key push.
pub(crate) const P2PKH_SCRIPT_SIG_SIZE: usize = 107;

/// Size the fee is charged on: the serialized skeleton plus a placeholder
/// scriptSig for every input that has none yet. Reveal scripts attached
/// after funding are deliberately not part of the estimate; the per-KB
/// rates of the supported networks are set with that in mind.
pub(crate) fn estimate_fee_size(tx: &Transaction) -> usize {
    let unsigned = tx
        .input
        .iter()
        .filter(|input| input.script_sig.is_empty())
        .count();
    encode::serialize(tx).len() + unsigned * P2PKH_SCRIPT_SIG_SIZE
}

pub(crate) fn change_output_size(script_pubkey: &ScriptBuf) -> usize {
    encode::serialize(&TxOut {
        value: Amount::ZERO,
        script_pubkey: script_pubkey.clone(),
    })
    .len()
}

fn attach_change(tx: &mut Transaction, wallet: &WalletState, change: u64, params: &NetworkParams) {
    if change >= params.dust_threshold {
        tx.output.push(TxOut {
            value: Amount::from_sat(change),
            script_pubkey: wallet.own_script_pubkey.clone(),
        });
    } else if change > 0 {
        trace!(change, "change below dust threshold, left to the fee");
    }
}

/// Balances a skeleton against its fee and returns the fee charged.
///
/// A change output paying the wallet's own script is attached whenever the
/// remainder clears the dust threshold. If the inputs already on the
/// skeleton cannot cover outputs plus fee, the wallet's first UTXO is pulled
/// in and every wallet-owned P2PKH input is signed; at most one UTXO is
/// pulled per transaction. `input_values` carries the satoshi value of each
/// input, index-aligned with `tx.input`, and is extended alongside it.
pub fn fund_transaction(
    tx: &mut Transaction,
    input_values: &mut Vec<u64>,
    wallet: &WalletState,
    private_key: &SecretKey,
    params: &NetworkParams,
) -> Result<u64, BuildError> {
    let output_value: u64 = tx.output.iter().map(|output| output.value.to_sat()).sum();
    let mut input_value: u64 = input_values.iter().sum();

    let mut fee = params
        .fee_policy
        .fee_for_size(estimate_fee_size(tx) + change_output_size(&wallet.own_script_pubkey));

    if !tx.input.is_empty() && !tx.output.is_empty() && input_value >= output_value + fee {
        attach_change(tx, wallet, input_value - output_value - fee, params);
        trace!(fee, "existing inputs cover the transaction");
        return Ok(fee);
    }

    // Head of the list, every time. Deliberately naive selection kept from
    // the original flow: the chain re-credits its change there, so
    // consecutive steps drain it in build order. Callers wanting smarter
    // selection can pre-attach inputs before funding.
    let Some(utxo) = wallet.utxos.first() else {
        return Err(InsufficientFunds {
            required: output_value + fee,
            shortfall: (output_value + fee).saturating_sub(input_value),
        }
        .into());
    };
    tx.input.push(TxIn {
        previous_output: utxo.outpoint(),
        script_sig: ScriptBuf::new(),
        sequence: Sequence(params.sequence),
        witness: Witness::new(),
    });
    input_values.push(utxo.amount);
    input_value += utxo.amount;

    fee = params
        .fee_policy
        .fee_for_size(estimate_fee_size(tx) + change_output_size(&wallet.own_script_pubkey));
    if input_value < output_value + fee {
        return Err(InsufficientFunds {
            required: output_value + fee,
            shortfall: output_value + fee - input_value,
        }
        .into());
    }
    attach_change(tx, wallet, input_value - output_value - fee, params);
    trace!(fee, pulled = %utxo.outpoint(), "funded from wallet");
    sign_p2pkh_inputs(tx, &wallet.utxos, private_key, params.sighash_flag)?;
    Ok(fee)
}

/// Signs every input that spends one of `utxos` through the key's own P2PKH
/// script. Inputs guarded by other scripts are left untouched.
pub fn sign_p2pkh_inputs(
    tx: &mut Transaction,
    utxos: &[Utxo],
    private_key: &SecretKey,
    sighash_flag: u8,
) -> Result<(), BuildError> {
    let public_key = PublicKey::new(secp256k1::PublicKey::from_secret_key(SECP256K1, private_key));
    let own_p2pkh = ScriptBuf::new_p2pkh(&public_key.pubkey_hash());

    let targets: Vec<(usize, ScriptBuf)> = tx
        .input
        .iter()
        .enumerate()
        .filter_map(|(index, input)| {
            utxos
                .iter()
                .find(|utxo| utxo.outpoint() == input.previous_output)
                .filter(|utxo| utxo.script_pubkey == own_p2pkh)
                .map(|utxo| (index, utxo.script_pubkey.clone()))
        })
        .collect();

    for (index, subscript) in targets {
        let signature = sign_input(tx, index, &subscript, private_key, sighash_flag)?;
        let signature = PushBytesBuf::try_from(signature)
            .expect("signature cannot exceed the push size limit");
        tx.input[index].script_sig = Builder::new()
            .push_slice(signature)
            .push_slice(public_key.inner.serialize())
            .into_script();
    }
    Ok(())
}

/// Legacy sighash plus ECDSA over it, returning the DER signature with the
/// sighash flag appended, the exact bytes a scriptSig pushes.
pub fn sign_input(
    tx: &Transaction,
    input_index: usize,
    subscript: &Script,
    private_key: &SecretKey,
    sighash_flag: u8,
) -> Result<Vec<u8>, BuildError> {
    let cache = SighashCache::new(tx);
    let sighash = cache
        .legacy_signature_hash(input_index, subscript, u32::from(sighash_flag))
        .map_err(|e| BuildError::Sighash(e.to_string()))?;
    let message = Message::from_digest(sighash.to_byte_array());
    let signature = SECP256K1.sign_ecdsa(&message, private_key);
    let mut bytes = signature.serialize_der().to_vec();
    bytes.push(sighash_flag);
    Ok(bytes)
}

/// ScriptSig revealing a partial: its elements in order, then the signature
/// and the serialized lock, satisfying the lock's
/// `OP_CHECKSIGVERIFY` + `OP_DROP`s + `OP_TRUE` predicate.
pub(crate) fn build_unlock_script(
    partial: &PartialScript,
    signature: Vec<u8>,
    lock: &RevealLock,
) -> ScriptBuf {
    let mut unlock = ElementScript::from_elements(partial.elements().to_vec());
    unlock.push(ScriptElement::DataPush(signature));
    unlock.push(ScriptElement::DataPush(lock.to_script().into_bytes()));
    unlock.to_script()
}

/// The P2SH output committing to a reveal lock.
pub(crate) fn commit_output(lock: &RevealLock, value: u64) -> TxOut {
    TxOut {
        value: Amount::from_sat(value),
        script_pubkey: lock.commit_script_pubkey(),
    }
}
