//! Response chunk framing.
//!
//! Each chunk opens with a status byte. A success chunk carries a 4-byte
//! context followed by an `ssz_snappy` message, any other status is followed
//! by an encoded [`ErrorMessage`]. The responder ends the response by
//! closing its half of the stream.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{CodecError, SszSnappyCodec};
use crate::messages::ErrorMessage;
use crate::ssz::{SszDecode, SszEncode};

pub const SUCCESS: u8 = 0x00;
pub const INVALID_REQUEST: u8 = 0x01;
pub const SERVER_ERROR: u8 = 0x02;

pub const CONTEXT_LEN: usize = 4;

pub type Context = [u8; CONTEXT_LEN];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseChunk<T> {
    Success { context: Context, payload: T },
    Error { code: u8, message: ErrorMessage },
}

impl<T> ResponseChunk<T> {
    pub fn into_result(self) -> Result<T, (u8, ErrorMessage)> {
        match self {
            Self::Success { payload, .. } => Ok(payload),
            Self::Error { code, message } => Err((code, message)),
        }
    }
}

/// Reads the status byte, `None` when the stream ended cleanly instead.
pub async fn read_status<R>(reader: &mut R) -> Result<Option<u8>, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut status = [0; 1];

    if reader.read(&mut status).await? == 0 {
        return Ok(None);
    }

    Ok(Some(status[0]))
}

/// Reads one chunk, or `None` if the responder closed the stream where the
/// next status byte would be.
pub async fn read_chunk<R, T>(
    reader: &mut R,
    codec: &SszSnappyCodec,
) -> Result<Option<ResponseChunk<T>>, CodecError>
where
    R: AsyncRead + Unpin,
    T: SszDecode,
{
    let Some(code) = read_status(reader).await? else {
        return Ok(None);
    };

    if code != SUCCESS {
        let message = codec.read(reader).await?;
        return Ok(Some(ResponseChunk::Error { code, message }));
    }

    let mut context = [0; CONTEXT_LEN];
    let _ignored = reader.read_exact(&mut context).await?;

    let payload = codec.read(reader).await?;

    Ok(Some(ResponseChunk::Success { context, payload }))
}

pub async fn write_chunk<W, T>(
    writer: &mut W,
    codec: &SszSnappyCodec,
    chunk: &ResponseChunk<T>,
) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    T: SszEncode,
{
    match chunk {
        ResponseChunk::Success { context, payload } => {
            writer.write_u8(SUCCESS).await?;
            writer.write_all(context).await?;
            codec.write(writer, payload).await
        }
        ResponseChunk::Error { code, message } => {
            writer.write_u8(*code).await?;
            codec.write(writer, message).await
        }
    }
}

/// Writes a success status and the message without a context, the layout
/// of the handshake topics the local peer answers.
pub async fn write_success<W, T>(
    writer: &mut W,
    codec: &SszSnappyCodec,
    payload: &T,
) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
    T: SszEncode,
{
    writer.write_u8(SUCCESS).await?;
    codec.write(writer, payload).await
}

#[cfg(test)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;
    use crate::messages::{BlobsSidecarsByRangeRequest, SequenceNumber};

    const CODEC: SszSnappyCodec = SszSnappyCodec::new(1_024);

    async fn encoded<T: SszEncode>(chunk: &ResponseChunk<T>) -> Vec<u8> {
        let mut buf = Vec::new();
        write_chunk(&mut buf, &CODEC, chunk).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_success_chunk_layout() {
        let chunk = ResponseChunk::Success {
            context: [1, 2, 3, 4],
            payload: BlobsSidecarsByRangeRequest::single(5),
        };

        let bytes = encoded(&chunk).await;
        assert_eq!(&bytes[..5], &[SUCCESS, 1, 2, 3, 4]);

        let mut reader = &bytes[..];
        let read = read_chunk(&mut reader, &CODEC).await.unwrap();

        assert_eq!(read, Some(chunk));
        assert_eq!(read_chunk::<_, SequenceNumber>(&mut reader, &CODEC).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_chunk() {
        let bytes = encoded(&ResponseChunk::<SequenceNumber>::Error {
            code: SERVER_ERROR,
            message: ErrorMessage::new("boom"),
        })
        .await;

        let mut stream = Builder::new().read(&bytes).build();
        let chunk = read_chunk::<_, SequenceNumber>(&mut stream, &CODEC)
            .await
            .unwrap()
            .unwrap();

        let (code, message) = chunk.into_result().unwrap_err();
        assert_eq!(code, SERVER_ERROR);
        assert_eq!(message.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_clean_eof_is_end_of_response() {
        let mut stream = Builder::new().build();

        let chunk = read_chunk::<_, SequenceNumber>(&mut stream, &CODEC).await.unwrap();
        assert_eq!(chunk, None);
    }

    #[tokio::test]
    async fn test_eof_inside_chunk_is_an_error() {
        let mut stream = Builder::new().read(&[SUCCESS, 0, 0]).build();

        let err = read_chunk::<_, SequenceNumber>(&mut stream, &CODEC)
            .await
            .unwrap_err();
        assert!(err.is_eof());
    }

    #[tokio::test]
    async fn test_success_without_context() {
        let mut buf = Vec::new();
        write_success(&mut buf, &CODEC, &SequenceNumber(7)).await.unwrap();

        let mut reader = &buf[..];
        assert_eq!(read_status(&mut reader).await.unwrap(), Some(SUCCESS));

        let seq: SequenceNumber = CODEC.read(&mut reader).await.unwrap();
        assert_eq!(seq, SequenceNumber(7));
    }
}
