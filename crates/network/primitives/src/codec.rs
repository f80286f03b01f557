//! `ssz_snappy` message encoding.
//!
//! A message is the unsigned varint of its uncompressed SSZ length followed
//! by the SSZ bytes compressed with the Snappy framing format. Decoding
//! reads exactly the frames needed to produce the announced length, so the
//! stream stays positioned at the start of whatever follows. An empty
//! message is the zero prefix alone.

use std::io::{self, Read, Write};

use snap::read::FrameDecoder;
use snap::write::FrameEncoder;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use unsigned_varint::{decode as varint_decode, encode as varint_encode};

use crate::ssz::{SszDecode, SszEncode, SszError};

const MAX_VARINT_LEN: usize = 10;

const STREAM_IDENTIFIER: u8 = 0xff;
const COMPRESSED_DATA: u8 = 0x00;
const UNCOMPRESSED_DATA: u8 = 0x01;
const CHECKSUM_LEN: usize = 4;
const HEADER_LEN: usize = 4;
const MAX_BLOCK_SIZE: usize = 1 << 16;
/// Header plus the `sNaPpY` magic.
const STREAM_IDENTIFIER_FRAME_LEN: usize = HEADER_LEN + 6;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid length prefix: {0}")]
    LengthPrefix(#[from] varint_decode::Error),
    #[error("message of {len} bytes exceeds the limit of {max}")]
    MessageTooLarge { len: usize, max: usize },
    #[error("malformed snappy frame: {0}")]
    Snappy(String),
    #[error("snappy frames of {len} bytes exceed the {max} bytes a message of this size may take")]
    EncodedTooLarge { len: usize, max: usize },
    #[error("snappy frames decompress to {actual} bytes, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Ssz(#[from] SszError),
}

impl CodecError {
    /// The peer closed the stream before a complete message arrived.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SszSnappyCodec {
    max_message_size: usize,
}

impl SszSnappyCodec {
    #[must_use]
    pub const fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    #[must_use]
    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    pub fn encode<T: SszEncode>(&self, message: &T) -> Result<Vec<u8>, CodecError> {
        let ssz = message.to_ssz();

        if ssz.len() > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                len: ssz.len(),
                max: self.max_message_size,
            });
        }

        let mut buf = varint_encode::usize(ssz.len(), &mut varint_encode::usize_buffer()).to_vec();

        if ssz.is_empty() {
            return Ok(buf);
        }

        let mut encoder = FrameEncoder::new(&mut buf);
        encoder.write_all(&ssz)?;
        encoder.flush()?;
        drop(encoder);

        Ok(buf)
    }

    pub async fn write<W, T>(&self, writer: &mut W, message: &T) -> Result<(), CodecError>
    where
        W: AsyncWrite + Unpin,
        T: SszEncode,
    {
        let bytes = self.encode(message)?;
        writer.write_all(&bytes).await?;
        writer.flush().await?;

        Ok(())
    }

    pub async fn read<R, T>(&self, reader: &mut R) -> Result<T, CodecError>
    where
        R: AsyncRead + Unpin,
        T: SszDecode,
    {
        let bytes = self.read_raw(reader).await?;

        Ok(T::from_ssz(&bytes)?)
    }

    /// Reads one message and returns its decompressed SSZ bytes.
    pub async fn read_raw<R>(&self, reader: &mut R) -> Result<Vec<u8>, CodecError>
    where
        R: AsyncRead + Unpin,
    {
        let len = read_length_prefix(reader).await?;

        if len > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                len,
                max: self.max_message_size,
            });
        }

        if len == 0 {
            return Ok(Vec::new());
        }

        let framed = read_snappy_frames(reader, len).await?;

        let mut ssz = Vec::with_capacity(len);
        let _ignored = FrameDecoder::new(&framed[..])
            .read_to_end(&mut ssz)
            .map_err(|err| CodecError::Snappy(err.to_string()))?;

        if ssz.len() != len {
            return Err(CodecError::LengthMismatch {
                expected: len,
                actual: ssz.len(),
            });
        }

        Ok(ssz)
    }
}

async fn read_length_prefix<R>(reader: &mut R) -> Result<usize, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0; MAX_VARINT_LEN];

    for index in 0..MAX_VARINT_LEN {
        buf[index] = reader.read_u8().await?;

        if varint_decode::is_last(buf[index]) {
            let (len, _) = varint_decode::usize(&buf[..=index])?;
            return Ok(len);
        }
    }

    Err(varint_decode::Error::Overflow.into())
}

/// Upper bound on the framed encoding of `len` uncompressed bytes: one
/// stream identifier, then every block in its worst compressed form.
fn max_encoded_len(len: usize) -> usize {
    let blocks = len.div_ceil(MAX_BLOCK_SIZE);
    let block_len = snap::raw::max_compress_len(len.min(MAX_BLOCK_SIZE));

    STREAM_IDENTIFIER_FRAME_LEN + blocks * (HEADER_LEN + CHECKSUM_LEN + block_len)
}

/// Collects whole Snappy frames until they account for `len` uncompressed
/// bytes. Checksums are verified later by the frame decoder.
///
/// Frames that carry no data still count against [`max_encoded_len`], so
/// padding cannot make the reader buffer more than the message could take.
async fn read_snappy_frames<R>(reader: &mut R, len: usize) -> Result<Vec<u8>, CodecError>
where
    R: AsyncRead + Unpin,
{
    let max_chunk_len = snap::raw::max_compress_len(MAX_BLOCK_SIZE) + CHECKSUM_LEN;
    let max_framed_len = max_encoded_len(len);

    let mut framed = Vec::new();
    let mut produced = 0;
    let mut header = [0; 4];

    while produced < len {
        reader.read_exact(&mut header).await?;

        let chunk_type = header[0];
        let chunk_len = u32::from_le_bytes([header[1], header[2], header[3], 0]) as usize;

        if chunk_len > max_chunk_len {
            return Err(CodecError::Snappy(format!(
                "chunk of {chunk_len} bytes exceeds {max_chunk_len}"
            )));
        }

        let start = framed.len();
        let framed_len = start + header.len() + chunk_len;

        if framed_len > max_framed_len {
            return Err(CodecError::EncodedTooLarge {
                len: framed_len,
                max: max_framed_len,
            });
        }

        framed.extend_from_slice(&header);
        framed.resize(framed_len, 0);
        reader.read_exact(&mut framed[start + header.len()..]).await?;

        let body = &framed[start + header.len()..];

        produced += match chunk_type {
            STREAM_IDENTIFIER => 0,
            COMPRESSED_DATA => {
                let data = body.get(CHECKSUM_LEN..).ok_or_else(|| {
                    CodecError::Snappy("compressed chunk shorter than its checksum".to_owned())
                })?;
                snap::raw::decompress_len(data).map_err(|err| CodecError::Snappy(err.to_string()))?
            }
            UNCOMPRESSED_DATA => body.len().checked_sub(CHECKSUM_LEN).ok_or_else(|| {
                CodecError::Snappy("uncompressed chunk shorter than its checksum".to_owned())
            })?,
            0x02..=0x7f => {
                return Err(CodecError::Snappy(format!(
                    "reserved unskippable chunk type {chunk_type:#04x}"
                )));
            }
            _ => 0,
        };

        if produced > len {
            return Err(CodecError::LengthMismatch {
                expected: len,
                actual: produced,
            });
        }
    }

    Ok(framed)
}
