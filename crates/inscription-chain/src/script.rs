//! Script elements and their serialized form.
//!
//! Scripts are kept as ordered element lists until the bytes are needed, so
//! element counts and pair-wise moves stay cheap for the partitioner and the
//! lock builder.

use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::{Opcode, ScriptBuf};

/// One typed element of a script under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptElement {
    /// Raw bytes, encoded with the shortest push opcode for the length.
    /// An empty push serializes as the single byte `0x00`.
    DataPush(Vec<u8>),
    /// Non-negative integer in minimal script-number encoding: `OP_0` for
    /// zero, `OP_PUSHNUM_n` for 1–16, a 1-byte push for 17–127 and a 2-byte
    /// little-endian push from 128 up.
    SmallInt(u32),
    /// A bare opcode with no payload.
    Opcode(Opcode),
}

impl ScriptElement {
    /// Serialized length in bytes, without serializing.
    pub fn encoded_len(&self) -> usize {
        match self {
            ScriptElement::DataPush(bytes) => match bytes.len() {
                len if len <= 75 => 1 + len,
                len if len <= 255 => 2 + len,
                // PUSHDATA2; elements never get near u16::MAX
                len => 3 + len,
            },
            ScriptElement::SmallInt(n) => match n {
                0..=16 => 1,
                17..=127 => 2,
                _ => 3,
            },
            ScriptElement::Opcode(_) => 1,
        }
    }
}

/// An ordered sequence of script elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementScript {
    elements: Vec<ScriptElement>,
}

impl ElementScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<ScriptElement>) -> Self {
        Self { elements }
    }

    pub fn push(&mut self, element: ScriptElement) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[ScriptElement] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<ScriptElement> {
        self.elements
    }

    /// Number of elements, not bytes.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Length of the serialized script in bytes.
    pub fn byte_len(&self) -> usize {
        self.elements.iter().map(ScriptElement::encoded_len).sum()
    }

    /// Serializes per the push rules above, in element order.
    pub fn to_script(&self) -> ScriptBuf {
        let mut builder = Builder::new();
        for element in &self.elements {
            builder = match element {
                ScriptElement::DataPush(bytes) => {
                    let push = PushBytesBuf::try_from(bytes.clone())
                        .expect("element data cannot exceed the push size limit");
                    builder.push_slice(push)
                }
                ScriptElement::SmallInt(n) => builder.push_int(i64::from(*n)),
                ScriptElement::Opcode(op) => builder.push_opcode(*op),
            };
        }
        builder.into_script()
    }
}

/// Splits a payload into pieces no longer than `max_len` bytes.
///
/// Concatenating the pieces in order reproduces the payload exactly; only the
/// last piece may be shorter.
pub fn chunk_payload(payload: &[u8], max_len: usize) -> Vec<&[u8]> {
    payload.chunks(max_len).collect()
}
