//! Per-network configuration for the transaction builders.
//!
//! The coin forks this library targets differ only in these values; the
//! builders themselves are network-agnostic.

use serde::{Deserialize, Serialize};

/// How the funding engine prices a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeePolicy {
    /// `ceil(serialized size × rate / 1000)` satoshis, sized against the
    /// skeleton before reveal scripts are attached.
    PerKb(u64),
    /// A flat fee regardless of size.
    Fixed(u64),
}

impl FeePolicy {
    pub fn fee_for_size(&self, size_bytes: usize) -> u64 {
        match *self {
            FeePolicy::PerKb(rate) => (size_bytes as u64 * rate).div_ceil(1000),
            FeePolicy::Fixed(fee) => fee,
        }
    }
}

/// Everything that varies between the supported coin networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub fee_policy: FeePolicy,
    /// Change below this is absorbed into the fee instead of creating an
    /// output.
    pub dust_threshold: u64,
    /// Satoshis locked in each intermediate commit output.
    pub commit_output_value: u64,
    /// Satoshis the final transaction delivers to the recipient.
    pub carrier_output_value: u64,
    pub tx_version: i32,
    pub sequence: u32,
    /// Sighash flag byte appended to every signature.
    pub sighash_flag: u8,
}

/// SIGHASH_ALL, the only flag the reveal flow uses.
pub const SIGHASH_ALL: u8 = 0x01;

const FINAL_SEQUENCE: u32 = 0xffff_ffff;

/// Dogecoin-family defaults shared by the doginals-style forks.
pub const DOGECOIN: NetworkParams = NetworkParams {
    fee_policy: FeePolicy::PerKb(100_000_000),
    dust_threshold: 546,
    commit_output_value: 100_000,
    carrier_output_value: 100_000,
    tx_version: 1,
    sequence: FINAL_SEQUENCE,
    sighash_flag: SIGHASH_ALL,
};

pub const LITECOIN: NetworkParams = NetworkParams {
    fee_policy: FeePolicy::PerKb(15_000_000),
    dust_threshold: 546,
    commit_output_value: 5_000_000,
    carrier_output_value: 1_000_000,
    tx_version: 1,
    sequence: FINAL_SEQUENCE,
    sighash_flag: SIGHASH_ALL,
};

pub const FLOPCOIN: NetworkParams = NetworkParams {
    fee_policy: FeePolicy::PerKb(40_000_000),
    dust_threshold: 546,
    commit_output_value: 100_000,
    carrier_output_value: 100_000,
    tx_version: 1,
    sequence: FINAL_SEQUENCE,
    sighash_flag: SIGHASH_ALL,
};
