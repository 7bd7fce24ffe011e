mod test_utils;

use inscription_chain::payment::{build_payment, build_two_utxo_payment, Recipient};
use inscription_chain::{build_inscription_chain, Payload};

use test_utils::{default_private_key, fixed_fee_params, funded_wallet, recipient_script};

#[test]
fn change_from_a_chain_funds_a_later_payment() {
    let params = fixed_fee_params();
    let mut wallet = funded_wallet(1_000_000);
    let payload = Payload::new(b"spend me later".to_vec(), "text/plain").unwrap();

    let chain = build_inscription_chain(
        &wallet,
        &default_private_key(),
        &payload,
        recipient_script(),
        &params,
    )
    .unwrap();
    for tx in &chain.transactions {
        wallet = wallet.apply(&tx.tx);
    }

    // The seed UTXO is spent; everything left is change the chain produced.
    let chain_ids: Vec<_> = chain.transactions.iter().map(|tx| tx.id).collect();
    assert!(!wallet.utxos.is_empty());
    assert!(wallet
        .utxos
        .iter()
        .all(|utxo| chain_ids.contains(&utxo.txid)));

    let recipients = [Recipient {
        script_pubkey: recipient_script(),
        amount: 10_000,
    }];
    let payment = build_payment(
        &wallet.utxos,
        &default_private_key(),
        &recipients,
        wallet.own_script_pubkey.clone(),
        &params,
    )
    .unwrap();

    assert_eq!(payment.tx.input.len(), wallet.utxos.len());
    assert!(payment
        .tx
        .input
        .iter()
        .all(|input| !input.script_sig.is_empty()));
    assert_eq!(payment.tx.output[0].value.to_sat(), 10_000);
    assert_eq!(
        payment.tx.output.last().unwrap().script_pubkey,
        wallet.own_script_pubkey
    );
}

#[test]
fn two_utxo_payment_balances_and_signs() {
    let params = fixed_fee_params();
    let wallet = funded_wallet(1_000_000);
    let carrier = test_utils::wallet_utxo(0xb2, 200_000);
    let funding = &wallet.utxos[0];

    let recipients = [Recipient {
        script_pubkey: recipient_script(),
        amount: 200_000,
    }];
    let payment = build_two_utxo_payment(
        &carrier,
        funding,
        &default_private_key(),
        &recipients,
        3000,
        wallet.own_script_pubkey.clone(),
        &params,
    )
    .unwrap();

    assert_eq!(payment.tx.input[0].previous_output, carrier.outpoint());
    assert_eq!(payment.tx.input[1].previous_output, funding.outpoint());
    assert!(payment
        .tx
        .input
        .iter()
        .all(|input| !input.script_sig.is_empty()));

    // The carrier goes to the recipient in full; the funding UTXO pays the
    // fee and takes the rest back.
    assert_eq!(payment.tx.output[0].value.to_sat(), 200_000);
    assert_eq!(
        payment.tx.output[1].value.to_sat(),
        funding.amount - 3000
    );
}
