use core::fmt;
use core::ops::Deref;

use thiserror::Error;

pub const FIELD_ELEMENTS_PER_BLOB: usize = 4096;
pub const BYTES_PER_FIELD_ELEMENT: usize = 32;

/// Payload bytes carried by one field element. Byte `0` of every element is
/// the high-order byte and stays zero so the element remains canonical.
pub const USABLE_BYTES_PER_FIELD_ELEMENT: usize = BYTES_PER_FIELD_ELEMENT - 1;

pub const BYTES_PER_BLOB: usize = FIELD_ELEMENTS_PER_BLOB * BYTES_PER_FIELD_ELEMENT;

/// Largest payload a single blob can carry.
pub const MAX_BLOB_PAYLOAD: usize = FIELD_ELEMENTS_PER_BLOB * USABLE_BYTES_PER_FIELD_ELEMENT;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid blob length: expected {BYTES_PER_BLOB} bytes, got {0}")]
pub struct InvalidBlobLength(pub usize);

/// A zero-initialised, exactly [`BYTES_PER_BLOB`] long byte buffer.
#[derive(Clone, Eq, PartialEq)]
pub struct Blob(Box<[u8]>);

impl Blob {
    #[must_use]
    pub fn zeroed() -> Self {
        Self(vec![0; BYTES_PER_BLOB].into_boxed_slice())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Box<[u8]> {
        self.0
    }

    /// Iterates over the blob's field elements in order.
    pub fn field_elements(&self) -> impl Iterator<Item = &[u8]> {
        self.0.chunks_exact(BYTES_PER_FIELD_ELEMENT)
    }

    /// Packs at most [`MAX_BLOB_PAYLOAD`] bytes into a fresh blob, 31 bytes
    /// per field element. Anything past the capacity is ignored.
    fn pack(payload: &[u8]) -> Self {
        let mut blob = Self::zeroed();

        for (element, stride) in blob
            .0
            .chunks_exact_mut(BYTES_PER_FIELD_ELEMENT)
            .zip(payload.chunks(USABLE_BYTES_PER_FIELD_ELEMENT))
        {
            element[1..=stride.len()].copy_from_slice(stride);
        }

        blob
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Blob {
    type Error = InvalidBlobLength;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != BYTES_PER_BLOB {
            return Err(InvalidBlobLength(bytes.len()));
        }

        Ok(Self(bytes.into()))
    }
}

impl TryFrom<Vec<u8>> for Blob {
    type Error = InvalidBlobLength;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() != BYTES_PER_BLOB {
            return Err(InvalidBlobLength(bytes.len()));
        }

        Ok(Self(bytes.into_boxed_slice()))
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let used = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);

        f.debug_struct("Blob").field("used", &used).finish()
    }
}

/// Splits `data` into as many blobs as needed.
///
/// Blobs are allocated pre-zeroed, so the last one is implicitly padded.
/// Empty input still yields a single all-zero blob.
#[must_use]
pub fn encode_blobs(data: &[u8]) -> Vec<Blob> {
    if data.is_empty() {
        return vec![Blob::zeroed()];
    }

    data.chunks(MAX_BLOB_PAYLOAD).map(Blob::pack).collect()
}

/// Recovers the payload of one blob.
///
/// The usable bytes of every field element are concatenated, then trailing
/// zero bytes are trimmed. This is lossy: a payload that genuinely ends in
/// zero bytes comes back shorter, since padding and data look the same.
/// Multi-blob payloads are decoded blob by blob and concatenated by the
/// caller, so a full inner blob whose chunk ends in zeros loses them too.
#[must_use]
pub fn decode_blob(blob: &[u8]) -> Vec<u8> {
    let mut data: Vec<u8> = blob
        .chunks(BYTES_PER_FIELD_ELEMENT)
        .flat_map(|element| element.get(1..).unwrap_or_default())
        .copied()
        .collect();

    let len = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    data.truncate(len);

    data
}

#[cfg(test)]
#[path = "tests/blobs.rs"]
mod tests;
