//! Plain payments out of the same wallet the chains spend from, for moving
//! an inscribed output onward or just sending coin.

use bitcoin::absolute::LockTime;
use bitcoin::secp256k1::SecretKey;
use bitcoin::transaction::Version;
use bitcoin::{Amount, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::builders::{change_output_size, estimate_fee_size, sign_p2pkh_inputs, TxWithId};
use crate::error::{BuildError, InsufficientFunds, ValidationError};
use crate::network_params::{FeePolicy, NetworkParams};
use crate::wallet::Utxo;

/// A payment destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub script_pubkey: ScriptBuf,
    pub amount: u64,
}

/// Builds and signs a payment spending `utxos` in the order given.
///
/// Outputs are the recipients in order, then a change output paying
/// `change_script` when the remainder clears the dust threshold. The fee
/// follows `params.fee_policy`. Every input matching the key's own P2PKH
/// script is signed.
pub fn build_payment(
    utxos: &[Utxo],
    private_key: &SecretKey,
    recipients: &[Recipient],
    change_script: ScriptBuf,
    params: &NetworkParams,
) -> Result<TxWithId, BuildError> {
    if utxos.is_empty() {
        return Err(ValidationError::MissingUtxo.into());
    }
    if recipients.is_empty() {
        return Err(ValidationError::NoRecipients.into());
    }
    if recipients.iter().any(|recipient| recipient.amount == 0) {
        return Err(ValidationError::ZeroRecipientAmount.into());
    }

    let mut tx = Transaction {
        version: Version(params.tx_version),
        lock_time: LockTime::ZERO,
        input: utxos
            .iter()
            .map(|utxo| TxIn {
                previous_output: utxo.outpoint(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence(params.sequence),
                witness: Witness::new(),
            })
            .collect(),
        output: recipients
            .iter()
            .map(|recipient| TxOut {
                value: Amount::from_sat(recipient.amount),
                script_pubkey: recipient.script_pubkey.clone(),
            })
            .collect(),
    };

    let fee = params
        .fee_policy
        .fee_for_size(estimate_fee_size(&tx) + change_output_size(&change_script));
    let input_total: u64 = utxos.iter().map(|utxo| utxo.amount).sum();
    let output_total: u64 = recipients.iter().map(|recipient| recipient.amount).sum();
    if input_total < output_total + fee {
        return Err(InsufficientFunds {
            required: output_total + fee,
            shortfall: output_total + fee - input_total,
        }
        .into());
    }

    let change = input_total - output_total - fee;
    if change >= params.dust_threshold {
        tx.output.push(TxOut {
            value: Amount::from_sat(change),
            script_pubkey: change_script,
        });
    } else if change > 0 {
        trace!(change, "change below dust threshold, left to the fee");
    }

    sign_p2pkh_inputs(&mut tx, utxos, private_key, params.sighash_flag)?;
    let id = tx.compute_txid();
    trace!(txid = %id, fee, "built payment");
    Ok(TxWithId { id, tx })
}

/// Payment over exactly two pinned inputs: the first UTXO is the one meant
/// for the recipients in full, the second covers the fee and takes its
/// leftover back as change. Keeping the carrier at input 0 is what ties an
/// inscribed output to where it goes next, so the fee is explicit here
/// rather than estimated.
pub fn build_two_utxo_payment(
    carrier: &Utxo,
    funding: &Utxo,
    private_key: &SecretKey,
    recipients: &[Recipient],
    fee: u64,
    change_script: ScriptBuf,
    params: &NetworkParams,
) -> Result<TxWithId, BuildError> {
    if fee == 0 {
        return Err(ValidationError::ZeroFee.into());
    }
    let pinned = NetworkParams {
        fee_policy: FeePolicy::Fixed(fee),
        ..params.clone()
    };
    build_payment(
        &[carrier.clone(), funding.clone()],
        private_key,
        recipients,
        change_script,
        &pinned,
    )
}

/// Whole coins to satoshis, rounding to the nearest satoshi.
pub fn coins_to_satoshis(coins: f64) -> Result<u64, ValidationError> {
    if !coins.is_finite() || coins < 0.0 {
        return Err(ValidationError::BadAmount(coins));
    }
    let satoshis = (coins * 100_000_000.0).round();
    if satoshis > u64::MAX as f64 {
        return Err(ValidationError::BadAmount(coins));
    }
    Ok(satoshis as u64)
}

/// Satoshis to whole coins.
pub fn satoshis_to_coins(satoshis: u64) -> f64 {
    Amount::from_sat(satoshis).to_btc()
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;
    use bitcoin::secp256k1::{self, SECP256K1};
    use bitcoin::{PublicKey, Txid};

    use super::*;
    use crate::network_params::SIGHASH_ALL;

    const TEST_KEY: &str = "1d99ad465b2c1c108b8fc469bbfceedae777ced833e24c96b2fa60fe12f1a2b3";

    fn test_private_key() -> SecretKey {
        SecretKey::from_slice(&hex::decode(TEST_KEY).unwrap()).unwrap()
    }

    fn own_script() -> ScriptBuf {
        let public_key = PublicKey::new(secp256k1::PublicKey::from_secret_key(
            SECP256K1,
            &test_private_key(),
        ));
        ScriptBuf::new_p2pkh(&public_key.pubkey_hash())
    }

    fn utxo(tag: u8, amount: u64) -> Utxo {
        Utxo {
            txid: Txid::from_byte_array([tag; 32]),
            vout: 0,
            script_pubkey: own_script(),
            amount,
            confirmations: 6,
        }
    }

    fn recipient(amount: u64) -> Recipient {
        Recipient {
            script_pubkey: ScriptBuf::from_bytes(vec![0x51]),
            amount,
        }
    }

    fn test_params() -> NetworkParams {
        NetworkParams {
            fee_policy: FeePolicy::Fixed(2000),
            dust_threshold: 546,
            commit_output_value: 20_000,
            carrier_output_value: 10_000,
            tx_version: 1,
            sequence: 0xffff_ffff,
            sighash_flag: SIGHASH_ALL,
        }
    }

    #[test]
    fn pays_recipients_then_change() {
        let utxos = vec![utxo(1, 80_000), utxo(2, 40_000)];
        let payment = build_payment(
            &utxos,
            &test_private_key(),
            &[recipient(50_000), recipient(30_000)],
            own_script(),
            &test_params(),
        )
        .unwrap();

        assert_eq!(payment.tx.input.len(), 2);
        assert_eq!(payment.tx.output.len(), 3);
        assert_eq!(payment.tx.output[0].value.to_sat(), 50_000);
        assert_eq!(payment.tx.output[1].value.to_sat(), 30_000);
        assert_eq!(payment.tx.output[2].value.to_sat(), 120_000 - 80_000 - 2000);
        assert_eq!(payment.tx.output[2].script_pubkey, own_script());
        assert!(payment.tx.input.iter().all(|input| !input.script_sig.is_empty()));
    }

    #[test]
    fn two_utxo_payment_pins_the_carrier_first() {
        let carrier = utxo(3, 100_000);
        let funding = utxo(4, 50_000);
        let payment = build_two_utxo_payment(
            &carrier,
            &funding,
            &test_private_key(),
            &[recipient(100_000)],
            5000,
            own_script(),
            &test_params(),
        )
        .unwrap();

        assert_eq!(payment.tx.input[0].previous_output, carrier.outpoint());
        assert_eq!(payment.tx.input[1].previous_output, funding.outpoint());
        // Funding leftover returns as change.
        assert_eq!(payment.tx.output[1].value.to_sat(), 45_000);
    }

    #[test]
    fn rejects_missing_recipients_and_zero_amounts() {
        let err = build_payment(
            &[utxo(1, 80_000)],
            &test_private_key(),
            &[],
            own_script(),
            &test_params(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Validation(ValidationError::NoRecipients)
        ));

        let err = build_payment(
            &[utxo(1, 80_000)],
            &test_private_key(),
            &[recipient(0)],
            own_script(),
            &test_params(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Validation(ValidationError::ZeroRecipientAmount)
        ));
    }

    #[test]
    fn rejects_zero_fee_in_two_utxo_mode() {
        let err = build_two_utxo_payment(
            &utxo(3, 100_000),
            &utxo(4, 50_000),
            &test_private_key(),
            &[recipient(100_000)],
            0,
            own_script(),
            &test_params(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Validation(ValidationError::ZeroFee)
        ));
    }

    #[test]
    fn reports_the_shortfall() {
        let err = build_payment(
            &[utxo(1, 30_000)],
            &test_private_key(),
            &[recipient(50_000)],
            own_script(),
            &test_params(),
        )
        .unwrap_err();
        match err {
            BuildError::InsufficientFunds(inner) => {
                assert_eq!(inner.required, 52_000);
                assert_eq!(inner.shortfall, 22_000);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }
    }

    #[test]
    fn coin_conversions_round_to_the_nearest_satoshi() {
        assert_eq!(coins_to_satoshis(1.5).unwrap(), 150_000_000);
        assert_eq!(coins_to_satoshis(0.000_000_01).unwrap(), 1);
        assert_eq!(coins_to_satoshis(1.234_567_89).unwrap(), 123_456_789);
        assert_eq!(coins_to_satoshis(0.0).unwrap(), 0);
        assert!(coins_to_satoshis(-1.0).is_err());
        assert!(coins_to_satoshis(f64::NAN).is_err());
        assert_eq!(satoshis_to_coins(150_000_000), 1.5);
    }
}
