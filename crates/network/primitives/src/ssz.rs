//! Just enough SSZ for the req/resp containers this client exchanges.
//!
//! Only fixed-size fields and a single trailing variable-size list are
//! needed, so containers encode themselves by hand on top of these traits.

use bytes::{Buf, BufMut};
use thiserror::Error;

pub const BYTES_PER_LENGTH_OFFSET: usize = 4;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SszError {
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid offset {offset}, expected {expected}")]
    InvalidOffset { offset: usize, expected: usize },
    #[error("list of {count} items exceeds its limit of {max}")]
    TooManyItems { count: usize, max: usize },
    #[error("list byte length {len} is not a multiple of item size {item_size}")]
    RaggedList { len: usize, item_size: usize },
    #[error("unused bits set in bitvector")]
    InvalidBitvector,
}

pub trait SszEncode {
    fn ssz_len(&self) -> usize;

    fn ssz_append<B: BufMut>(&self, buf: &mut B);

    fn to_ssz(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.ssz_len());
        self.ssz_append(&mut buf);
        buf
    }
}

pub trait SszDecode: Sized {
    fn from_ssz(bytes: &[u8]) -> Result<Self, SszError>;
}

impl SszEncode for u64 {
    fn ssz_len(&self) -> usize {
        8
    }

    fn ssz_append<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(*self);
    }
}

impl SszDecode for u64 {
    fn from_ssz(mut bytes: &[u8]) -> Result<Self, SszError> {
        expect_len(bytes, 8)?;

        Ok(bytes.get_u64_le())
    }
}

pub fn expect_len(bytes: &[u8], expected: usize) -> Result<(), SszError> {
    if bytes.len() != expected {
        return Err(SszError::InvalidLength {
            expected,
            actual: bytes.len(),
        });
    }

    Ok(())
}

/// Reads `N` bytes off the front of `buf`. The caller has checked the length.
pub(crate) fn take_array<const N: usize>(buf: &mut &[u8]) -> [u8; N] {
    let mut array = [0; N];
    buf.copy_to_slice(&mut array);
    array
}
