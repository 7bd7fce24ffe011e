//! Reads inscriptions back out of reveal scripts. The counterpart of the
//! builders: given the transactions of a chain in broadcast order, this
//! recovers the content type and reassembles the payload.

use bitcoin::opcodes::all::{OP_PUSHNUM_1, OP_PUSHNUM_16};
use bitcoin::script::Instruction;
use bitcoin::{Opcode, Script, Transaction};
use thiserror::Error;

use crate::inscription::INSCRIPTION_MARKER;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// The first reveal script does not open with the inscription marker.
    #[error("Missing inscription marker")]
    MissingMarker,
    /// Marker without a readable chunk count and content type behind it.
    #[error("Incomplete inscription header")]
    IncompleteHeader,
    /// Chunk indexes must run down to zero in script order.
    #[error("Chunk index mismatch: expected {expected}, found {found}")]
    ChunkIndexMismatch { expected: u32, found: u32 },
    /// The reveals carried a different number of chunks than announced.
    #[error("Expected {expected} chunks, found {found}")]
    ChunkCountMismatch { expected: u32, found: u32 },
    /// A chain is at least a commit and one reveal.
    #[error("Chain too short to carry a reveal")]
    ChainTooShort,
    /// Reveal transactions spend the prior commit at input 0.
    #[error("Transaction {0} has no reveal input")]
    MissingRevealInput(usize),
    /// Script error
    #[error("Script error: {0}")]
    Script(String),
}

impl From<bitcoin::blockdata::script::Error> for ParserError {
    fn from(e: bitcoin::blockdata::script::Error) -> Self {
        ParserError::Script(e.to_string())
    }
}

/// Payload recovered from a chain of reveal scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedInscription {
    pub content_type: Vec<u8>,
    pub data: Vec<u8>,
}

/// One decoded scriptSig element. Number reads are positional: a one or two
/// byte push doubles as a little-endian integer where the layout expects a
/// chunk index.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RevealItem {
    Push(Vec<u8>),
    Num(u32),
    Op(Opcode),
}

fn as_number(item: &RevealItem) -> Option<u32> {
    match item {
        RevealItem::Num(n) => Some(*n),
        RevealItem::Push(bytes) => match bytes.as_slice() {
            [b] => Some(u32::from(*b)),
            [lo, hi] => Some(u32::from_le_bytes([*lo, *hi, 0, 0])),
            _ => None,
        },
        RevealItem::Op(_) => None,
    }
}

fn small_int_value(op: Opcode) -> Option<u32> {
    let byte = op.to_u8();
    (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8())
        .contains(&byte)
        .then(|| u32::from(byte - OP_PUSHNUM_1.to_u8()) + 1)
}

fn script_items(script: &Script) -> Result<Vec<RevealItem>, ParserError> {
    script
        .instructions()
        .map(|instruction| {
            Ok(match instruction? {
                Instruction::PushBytes(push) if push.is_empty() => RevealItem::Num(0),
                Instruction::PushBytes(push) => RevealItem::Push(push.as_bytes().to_vec()),
                Instruction::Op(op) => match small_int_value(op) {
                    Some(n) => RevealItem::Num(n),
                    None => RevealItem::Op(op),
                },
            })
        })
        .collect()
}

fn reveal_items(tx: &Transaction, transaction_number: usize) -> Result<Vec<RevealItem>, ParserError> {
    let input = tx
        .input
        .first()
        .ok_or(ParserError::MissingRevealInput(transaction_number))?;
    script_items(&input.script_sig)
}

/// Consumes index/data pairs off the front of `items`, stopping at the first
/// element that cannot open a pair. The signature and lock pushes trailing
/// every reveal script end the walk naturally.
fn consume_pairs(
    items: &[RevealItem],
    chunk_count: u32,
    seen: &mut u32,
    data: &mut Vec<u8>,
) -> Result<(), ParserError> {
    let mut index = 0;
    while index + 1 < items.len() {
        let Some(found) = as_number(&items[index]) else {
            break;
        };
        let RevealItem::Push(chunk) = &items[index + 1] else {
            break;
        };
        let Some(expected) = (chunk_count - *seen).checked_sub(1) else {
            return Err(ParserError::ChunkCountMismatch {
                expected: chunk_count,
                found: *seen + 1,
            });
        };
        if found != expected {
            return Err(ParserError::ChunkIndexMismatch { expected, found });
        }
        data.extend_from_slice(chunk);
        *seen += 1;
        index += 2;
    }
    Ok(())
}

/// Recovers the inscription from a chain in broadcast order.
///
/// The first transaction only commits, so reading starts at the second; its
/// scriptSig must open with the marker and the header. Every later
/// transaction contributes the pairs at the front of its first input's
/// scriptSig. Chunk indexes are checked to count down to zero and the total
/// against the announced chunk count.
pub fn extract_inscription(
    transactions: &[Transaction],
) -> Result<ExtractedInscription, ParserError> {
    if transactions.len() < 2 {
        return Err(ParserError::ChainTooShort);
    }

    let items = reveal_items(&transactions[1], 2)?;
    match items.first() {
        Some(RevealItem::Push(marker)) if marker.as_slice() == INSCRIPTION_MARKER => {}
        _ => return Err(ParserError::MissingMarker),
    }
    let chunk_count = items
        .get(1)
        .and_then(as_number)
        .ok_or(ParserError::IncompleteHeader)?;
    let content_type = match items.get(2) {
        Some(RevealItem::Push(bytes)) => bytes.clone(),
        _ => return Err(ParserError::IncompleteHeader),
    };

    let mut data = Vec::new();
    let mut seen = 0u32;
    consume_pairs(&items[3..], chunk_count, &mut seen, &mut data)?;
    for (position, tx) in transactions.iter().enumerate().skip(2) {
        let items = reveal_items(tx, position + 1)?;
        consume_pairs(&items, chunk_count, &mut seen, &mut data)?;
    }

    if seen != chunk_count {
        return Err(ParserError::ChunkCountMismatch {
            expected: chunk_count,
            found: seen,
        });
    }
    Ok(ExtractedInscription { content_type, data })
}
