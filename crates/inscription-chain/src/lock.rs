//! Reveal locks: the redeem scripts guarding commit outputs.

use bitcoin::hashes::{hash160, Hash};
use bitcoin::opcodes::all::{OP_CHECKSIGVERIFY, OP_DROP};
use bitcoin::opcodes::OP_TRUE;
use bitcoin::{PublicKey, ScriptBuf, ScriptHash};

use crate::inscription::PartialScript;
use crate::script::{ElementScript, ScriptElement};

/// Redeem script for one commit output.
///
/// Spending it presents the partial's elements followed by a signature; the
/// lock checks the signature against the committed key, then discards the
/// revealed elements one `OP_DROP` at a time and leaves true on the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealLock {
    script: ElementScript,
}

impl RevealLock {
    /// Pure function of `(partial, public_key)`: identical inputs always
    /// produce the identical lock and hash.
    pub fn build(partial: &PartialScript, public_key: &PublicKey) -> Self {
        let mut script = ElementScript::new();
        script.push(ScriptElement::DataPush(public_key.to_bytes()));
        script.push(ScriptElement::Opcode(OP_CHECKSIGVERIFY));
        for _ in 0..partial.element_count() {
            script.push(ScriptElement::Opcode(OP_DROP));
        }
        script.push(ScriptElement::Opcode(OP_TRUE));
        Self { script }
    }

    pub fn to_script(&self) -> ScriptBuf {
        self.script.to_script()
    }

    /// `RIPEMD160(SHA256(serialized lock))`.
    pub fn lock_hash(&self) -> hash160::Hash {
        hash160::Hash::hash(self.to_script().as_bytes())
    }

    /// The commit output script: `OP_HASH160 <lock hash> OP_EQUAL`.
    pub fn commit_script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2sh(&ScriptHash::from_raw_hash(self.lock_hash()))
    }
}
