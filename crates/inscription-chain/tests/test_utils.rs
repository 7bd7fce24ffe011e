#![allow(dead_code)]

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{self, SecretKey, SECP256K1};
use bitcoin::{PublicKey, ScriptBuf, Txid};
use inscription_chain::network_params::{FeePolicy, NetworkParams, SIGHASH_ALL};
use inscription_chain::wallet::{Utxo, WalletState};

pub const DEFAULT_PRIVATE_KEY: &str =
    "e9873d79c6d87dc0fb6a5778633389f4453213303da61f20bd67fc233aa33262";

/// A destination that is not the wallet's own script.
pub const RECIPIENT_PRIVATE_KEY: &str =
    "c53f9a9a0647b89d820f9b1f93e8f1f2f4bd2a1f5a1e0e61bafdf4ed2d6155d2";

pub fn default_private_key() -> SecretKey {
    SecretKey::from_slice(&hex::decode(DEFAULT_PRIVATE_KEY).unwrap()).unwrap()
}

pub fn default_public_key() -> PublicKey {
    PublicKey::new(secp256k1::PublicKey::from_secret_key(
        SECP256K1,
        &default_private_key(),
    ))
}

pub fn own_script() -> ScriptBuf {
    ScriptBuf::new_p2pkh(&default_public_key().pubkey_hash())
}

pub fn recipient_script() -> ScriptBuf {
    let key = SecretKey::from_slice(&hex::decode(RECIPIENT_PRIVATE_KEY).unwrap()).unwrap();
    let public_key = PublicKey::new(secp256k1::PublicKey::from_secret_key(SECP256K1, &key));
    ScriptBuf::new_p2pkh(&public_key.pubkey_hash())
}

pub fn wallet_utxo(tag: u8, amount: u64) -> Utxo {
    Utxo {
        txid: Txid::from_byte_array([tag; 32]),
        vout: 0,
        script_pubkey: own_script(),
        amount,
        confirmations: 20,
    }
}

/// Wallet holding a single spendable output.
pub fn funded_wallet(amount: u64) -> WalletState {
    WalletState::new(own_script(), vec![wallet_utxo(0xa1, amount)])
}

/// Small flat-fee parameters that keep test arithmetic readable.
pub fn fixed_fee_params() -> NetworkParams {
    NetworkParams {
        fee_policy: FeePolicy::Fixed(1000),
        dust_threshold: 546,
        commit_output_value: 20_000,
        carrier_output_value: 10_000,
        tx_version: 1,
        sequence: 0xffff_ffff,
        sighash_flag: SIGHASH_ALL,
    }
}
