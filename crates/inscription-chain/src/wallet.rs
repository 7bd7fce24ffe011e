//! The wallet as the builders see it: a script to pay change to and an
//! ephemeral UTXO set.

use bitcoin::{OutPoint, ScriptBuf, Transaction, Txid};
use serde::{Deserialize, Serialize};

/// One spendable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub script_pubkey: ScriptBuf,
    /// Value in satoshis.
    pub amount: u64,
    pub confirmations: u32,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

/// Snapshot of the wallet for the duration of one build.
///
/// The builders never mutate a snapshot in place; [`WalletState::apply`]
/// returns the next state, and the orchestrator alone owns the copy it
/// threads through a chain build. Nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
    /// Script that change returns to, and that marks outputs as the
    /// wallet's own. Chain building signs with a key whose P2PKH script
    /// must equal this.
    pub own_script_pubkey: ScriptBuf,
    /// Spendable outputs, consumed front-first by the funding engine.
    pub utxos: Vec<Utxo>,
}

impl WalletState {
    pub fn new(own_script_pubkey: ScriptBuf, utxos: Vec<Utxo>) -> Self {
        Self {
            own_script_pubkey,
            utxos,
        }
    }

    /// Total spendable satoshis.
    pub fn balance(&self) -> u64 {
        self.utxos.iter().map(|utxo| utxo.amount).sum()
    }

    /// Projects a built transaction onto the UTXO set: inputs spend matching
    /// UTXOs out of it, and every output paying `own_script_pubkey` is
    /// credited back as a zero-confirmation UTXO at the end of the list.
    #[must_use]
    pub fn apply(&self, tx: &Transaction) -> WalletState {
        let txid = tx.compute_txid();
        let mut utxos: Vec<Utxo> = self
            .utxos
            .iter()
            .filter(|utxo| {
                !tx.input
                    .iter()
                    .any(|input| input.previous_output == utxo.outpoint())
            })
            .cloned()
            .collect();
        for (vout, output) in tx.output.iter().enumerate() {
            if output.script_pubkey == self.own_script_pubkey {
                utxos.push(Utxo {
                    txid,
                    vout: vout as u32,
                    script_pubkey: output.script_pubkey.clone(),
                    amount: output.value.to_sat(),
                    confirmations: 0,
                });
            }
        }
        WalletState {
            own_script_pubkey: self.own_script_pubkey.clone(),
            utxos,
        }
    }
}
