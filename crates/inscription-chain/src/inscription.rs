//! Payload intake, the canonical inscription script and its partitioning.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::error::ValidationError;
use crate::script::{chunk_payload, ElementScript, ScriptElement};
use crate::{MAX_CHUNK_LEN, MAX_PAYLOAD_LEN, MAX_SCRIPT_ELEMENT_SIZE};

/// Marker push opening every inscription script.
pub const INSCRIPTION_MARKER: &[u8] = b"ord";

/// Number of leading header elements (marker, chunk count, content type).
pub(crate) const HEADER_ELEMENTS: usize = 3;

/// An inscription payload: raw bytes plus their MIME content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    data: Vec<u8>,
    content_type: String,
}

impl Payload {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Result<Self, ValidationError> {
        let content_type = content_type.into();
        if data.is_empty() {
            return Err(ValidationError::EmptyPayload);
        }
        if content_type.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ValidationError::ContentTypeTooLong(content_type.len()));
        }
        Ok(Self { data, content_type })
    }

    /// Hex intake, the form wallet front ends hand over.
    pub fn from_hex(
        data_hex: &str,
        content_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let data = hex::decode(data_hex)?;
        Self::new(data, content_type)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// A slice of the inscription script small enough for one transaction.
///
/// Partials after the first hold complete `(index, data)` pairs only; the
/// first additionally leads with the marker/count/content-type header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialScript {
    script: ElementScript,
}

impl PartialScript {
    pub fn elements(&self) -> &[ScriptElement] {
        self.script.elements()
    }

    /// Element count; the reveal lock emits one `OP_DROP` per element.
    pub fn element_count(&self) -> usize {
        self.script.len()
    }

    pub fn byte_len(&self) -> usize {
        self.script.byte_len()
    }
}

/// Builds the canonical inscription script for a payload.
///
/// `DataPush("ord")`, `SmallInt(chunk count)`, `DataPush(content type)`, then
/// per chunk a `SmallInt` index counting down to zero followed by the chunk
/// bytes. The final chunk carrying index 0 marks payload completion; the
/// ordering is part of the on-chain encoding.
pub fn build_inscription_script(payload: &Payload) -> ElementScript {
    let parts = chunk_payload(payload.data(), MAX_CHUNK_LEN);
    let mut script = ElementScript::new();
    script.push(ScriptElement::DataPush(INSCRIPTION_MARKER.to_vec()));
    script.push(ScriptElement::SmallInt(parts.len() as u32));
    script.push(ScriptElement::DataPush(
        payload.content_type().as_bytes().to_vec(),
    ));
    for (n, part) in parts.iter().enumerate() {
        script.push(ScriptElement::SmallInt((parts.len() - n - 1) as u32));
        script.push(ScriptElement::DataPush(part.to_vec()));
    }
    trace!(
        chunks = parts.len(),
        payload_bytes = payload.data().len(),
        script_bytes = script.byte_len(),
        "assembled inscription script"
    );
    script
}

/// Splits the inscription script into transaction-sized partials.
///
/// The first partial leads with the header as one unit; after that, elements
/// only move in complete `(index, data)` pairs. A pair that would push a
/// partial past [`MAX_PAYLOAD_LEN`] starts the next partial instead.
pub fn partition_inscription(script: ElementScript) -> Vec<PartialScript> {
    let mut queue: VecDeque<ScriptElement> = script.into_elements().into();
    let mut partials = Vec::new();
    let mut first = true;

    while !queue.is_empty() {
        let mut partial = ElementScript::new();
        if first {
            for _ in 0..HEADER_ELEMENTS {
                if let Some(element) = queue.pop_front() {
                    partial.push(element);
                }
            }
            first = false;
        }
        while let Some(pair_len) = peek_pair_len(&queue) {
            if partial.byte_len() + pair_len > MAX_PAYLOAD_LEN && !partial.is_empty() {
                break;
            }
            partial.push(queue.pop_front().expect("pair length was peeked"));
            partial.push(queue.pop_front().expect("pair length was peeked"));
        }
        partials.push(PartialScript { script: partial });
    }

    debug!(partials = partials.len(), "partitioned inscription script");
    partials
}

fn peek_pair_len(queue: &VecDeque<ScriptElement>) -> Option<usize> {
    let index = queue.front()?;
    let data = queue
        .get(1)
        .expect("inscription elements always come in index/data pairs");
    Some(index.encoded_len() + data.encoded_len())
}
