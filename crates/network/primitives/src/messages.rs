use core::fmt;

use blobkit_primitives::blobs::{Blob, BYTES_PER_BLOB};
use bytes::{Buf, BufMut};

use crate::ssz::{expect_len, take_array, SszDecode, SszEncode, SszError, BYTES_PER_LENGTH_OFFSET};

pub const MAX_BLOBS_PER_BLOCK: usize = 4;
pub const MAX_ERROR_MESSAGE_LEN: usize = 256;

pub type Root = [u8; 32];
pub type KzgProof = [u8; 48];

/// Ping payload and response: the sender's metadata sequence number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceNumber(pub u64);

impl SszEncode for SequenceNumber {
    fn ssz_len(&self) -> usize {
        self.0.ssz_len()
    }

    fn ssz_append<B: BufMut>(&self, buf: &mut B) {
        self.0.ssz_append(buf);
    }
}

impl SszDecode for SequenceNumber {
    fn from_ssz(bytes: &[u8]) -> Result<Self, SszError> {
        u64::from_ssz(bytes).map(Self)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetaDataV1 {
    pub seq_number: u64,
    /// `Bitvector[64]`
    pub attnets: [u8; 8],
}

impl MetaDataV1 {
    const SSZ_LEN: usize = 16;
}

impl SszEncode for MetaDataV1 {
    fn ssz_len(&self) -> usize {
        Self::SSZ_LEN
    }

    fn ssz_append<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(self.seq_number);
        buf.put_slice(&self.attnets);
    }
}

impl SszDecode for MetaDataV1 {
    fn from_ssz(mut bytes: &[u8]) -> Result<Self, SszError> {
        expect_len(bytes, Self::SSZ_LEN)?;

        Ok(Self {
            seq_number: bytes.get_u64_le(),
            attnets: take_array(&mut bytes),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetaDataV2 {
    pub seq_number: u64,
    /// `Bitvector[64]`
    pub attnets: [u8; 8],
    /// `Bitvector[4]`, the high nibble must stay clear.
    pub syncnets: u8,
}

impl MetaDataV2 {
    const SSZ_LEN: usize = 17;
}

impl SszEncode for MetaDataV2 {
    fn ssz_len(&self) -> usize {
        Self::SSZ_LEN
    }

    fn ssz_append<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(self.seq_number);
        buf.put_slice(&self.attnets);
        buf.put_u8(self.syncnets);
    }
}

impl SszDecode for MetaDataV2 {
    fn from_ssz(mut bytes: &[u8]) -> Result<Self, SszError> {
        expect_len(bytes, Self::SSZ_LEN)?;

        let seq_number = bytes.get_u64_le();
        let attnets = take_array(&mut bytes);
        let syncnets = bytes.get_u8();

        if syncnets & 0xf0 != 0 {
            return Err(SszError::InvalidBitvector);
        }

        Ok(Self {
            seq_number,
            attnets,
            syncnets,
        })
    }
}

/// `List[byte, 256]` sent after a non-zero status code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorMessage(pub Vec<u8>);

impl ErrorMessage {
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bytes = message.as_bytes();
        let len = bytes.len().min(MAX_ERROR_MESSAGE_LEN);

        Self(bytes[..len].to_vec())
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&String::from_utf8_lossy(&self.0))
    }
}

impl SszEncode for ErrorMessage {
    fn ssz_len(&self) -> usize {
        self.0.len()
    }

    fn ssz_append<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.0);
    }
}

impl SszDecode for ErrorMessage {
    fn from_ssz(bytes: &[u8]) -> Result<Self, SszError> {
        if bytes.len() > MAX_ERROR_MESSAGE_LEN {
            return Err(SszError::TooManyItems {
                count: bytes.len(),
                max: MAX_ERROR_MESSAGE_LEN,
            });
        }

        Ok(Self(bytes.to_vec()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobsSidecarsByRangeRequest {
    pub start_slot: u64,
    pub count: u64,
}

impl BlobsSidecarsByRangeRequest {
    const SSZ_LEN: usize = 16;

    /// Requests the sidecar of exactly one slot.
    #[must_use]
    pub const fn single(slot: u64) -> Self {
        Self {
            start_slot: slot,
            count: 1,
        }
    }
}

impl SszEncode for BlobsSidecarsByRangeRequest {
    fn ssz_len(&self) -> usize {
        Self::SSZ_LEN
    }

    fn ssz_append<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(self.start_slot);
        buf.put_u64_le(self.count);
    }
}

impl SszDecode for BlobsSidecarsByRangeRequest {
    fn from_ssz(mut bytes: &[u8]) -> Result<Self, SszError> {
        expect_len(bytes, Self::SSZ_LEN)?;

        Ok(Self {
            start_slot: bytes.get_u64_le(),
            count: bytes.get_u64_le(),
        })
    }
}

/// The blobs a block at `beacon_block_slot` committed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobsSidecar {
    pub beacon_block_root: Root,
    pub beacon_block_slot: u64,
    pub blobs: Vec<Blob>,
    pub kzg_aggregated_proof: KzgProof,
}

impl BlobsSidecar {
    /// root + slot + blobs offset + proof
    const FIXED_LEN: usize = 32 + 8 + BYTES_PER_LENGTH_OFFSET + 48;

    #[must_use]
    pub const fn slot(&self) -> u64 {
        self.beacon_block_slot
    }
}

impl SszEncode for BlobsSidecar {
    fn ssz_len(&self) -> usize {
        Self::FIXED_LEN + self.blobs.len() * BYTES_PER_BLOB
    }

    fn ssz_append<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.beacon_block_root);
        buf.put_u64_le(self.beacon_block_slot);
        #[expect(clippy::cast_possible_truncation, reason = "FIXED_LEN is a small constant")]
        buf.put_u32_le(Self::FIXED_LEN as u32);
        buf.put_slice(&self.kzg_aggregated_proof);

        for blob in &self.blobs {
            buf.put_slice(blob.as_bytes());
        }
    }
}

impl SszDecode for BlobsSidecar {
    fn from_ssz(bytes: &[u8]) -> Result<Self, SszError> {
        if bytes.len() < Self::FIXED_LEN {
            return Err(SszError::InvalidLength {
                expected: Self::FIXED_LEN,
                actual: bytes.len(),
            });
        }

        let (mut fixed, variable) = bytes.split_at(Self::FIXED_LEN);

        let beacon_block_root = take_array(&mut fixed);
        let beacon_block_slot = fixed.get_u64_le();
        let offset = fixed.get_u32_le() as usize;
        let kzg_aggregated_proof = take_array(&mut fixed);

        if offset != Self::FIXED_LEN {
            return Err(SszError::InvalidOffset {
                offset,
                expected: Self::FIXED_LEN,
            });
        }

        if variable.len() % BYTES_PER_BLOB != 0 {
            return Err(SszError::RaggedList {
                len: variable.len(),
                item_size: BYTES_PER_BLOB,
            });
        }

        let count = variable.len() / BYTES_PER_BLOB;
        if count > MAX_BLOBS_PER_BLOCK {
            return Err(SszError::TooManyItems {
                count,
                max: MAX_BLOBS_PER_BLOCK,
            });
        }

        let blobs = variable
            .chunks_exact(BYTES_PER_BLOB)
            .map(Blob::try_from)
            .collect::<Result<_, _>>()
            .map_err(|err| SszError::InvalidLength {
                expected: BYTES_PER_BLOB,
                actual: err.0,
            })?;

        Ok(Self {
            beacon_block_root,
            beacon_block_slot,
            blobs,
            kzg_aggregated_proof,
        })
    }
}
