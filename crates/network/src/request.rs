use core::time::Duration;
use std::io;

use blobkit_network_primitives::chunk::{read_chunk, ResponseChunk};
use blobkit_network_primitives::codec::SszSnappyCodec;
use blobkit_network_primitives::config::RpcConfig;
use blobkit_network_primitives::ssz::{SszDecode, SszEncode};
use blobkit_network_primitives::topics::Topic;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::debug;

use crate::errors::{NetworkError, Phase};

/// Runs one request/response exchange over an open stream.
///
/// The request is written and the write side closed, then response chunks
/// are read until the remote closes the stream. The first chunk may take
/// arbitrarily long; each later chunk must arrive within the configured
/// chunk timeout.
#[derive(Clone, Copy, Debug)]
pub struct ChunkedRequestClient {
    codec: SszSnappyCodec,
    chunk_timeout: Duration,
}

impl ChunkedRequestClient {
    #[must_use]
    pub const fn new(config: &RpcConfig) -> Self {
        Self {
            codec: SszSnappyCodec::new(config.max_chunk_size),
            chunk_timeout: config.chunk_timeout,
        }
    }

    pub async fn exchange<S, Req, Resp>(
        &self,
        stream: &mut S,
        topic: Topic,
        request: &Req,
    ) -> Result<Vec<Resp>, NetworkError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        Req: SszEncode,
        Resp: SszDecode,
    {
        self.codec
            .write(stream, request)
            .await
            .map_err(|err| NetworkError::codec(topic, Phase::SendRequest, err))?;

        stream
            .shutdown()
            .await
            .map_err(|err| NetworkError::transport(topic, Phase::CloseWrite, err))?;

        debug!(%topic, "Request sent, awaiting response");

        let mut responses = Vec::new();

        loop {
            let index = responses.len();
            let phase = Phase::ReadChunk { index };

            let read = read_chunk(stream, &self.codec);

            let chunk = if index == 0 {
                read.await
            } else {
                timeout(self.chunk_timeout, read).await.map_err(|_| {
                    NetworkError::transport(
                        topic,
                        phase,
                        io::Error::new(io::ErrorKind::TimedOut, "response chunk timed out"),
                    )
                })?
            };

            match chunk.map_err(|err| NetworkError::codec(topic, phase, err))? {
                None => break,
                Some(ResponseChunk::Success { payload, .. }) => {
                    debug!(%topic, index, "Received response chunk");
                    responses.push(payload);
                }
                Some(ResponseChunk::Error { code, message }) => {
                    return Err(NetworkError::Remote {
                        code,
                        message: message.to_string(),
                    });
                }
            }
        }

        debug!(%topic, chunks = responses.len(), "Response complete");

        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use blobkit_network_primitives::chunk::{write_chunk, SERVER_ERROR};
    use blobkit_network_primitives::messages::{ErrorMessage, SequenceNumber};
    use tokio::io::duplex;
    use tokio_test::io::Builder;

    use super::*;

    const CODEC: SszSnappyCodec = SszSnappyCodec::new(1_024);

    fn client(chunk_timeout: Duration) -> ChunkedRequestClient {
        ChunkedRequestClient::new(&RpcConfig::new(1_024, chunk_timeout))
    }

    async fn chunk_bytes(chunk: ResponseChunk<SequenceNumber>) -> Vec<u8> {
        let mut buf = Vec::new();
        write_chunk(&mut buf, &CODEC, &chunk).await.unwrap();
        buf
    }

    fn success(seq: u64) -> ResponseChunk<SequenceNumber> {
        ResponseChunk::Success {
            context: [0xaa; 4],
            payload: SequenceNumber(seq),
        }
    }

    #[tokio::test]
    async fn test_request_is_written_before_reading() {
        let request = CODEC.encode(&SequenceNumber(3)).unwrap();
        let first = chunk_bytes(success(1)).await;

        let mut stream = Builder::new().write(&request).read(&first).build();

        let responses: Vec<SequenceNumber> = client(Duration::from_secs(1))
            .exchange(&mut stream, Topic::Ping, &SequenceNumber(3))
            .await
            .unwrap();

        assert_eq!(responses, [SequenceNumber(1)]);
    }

    #[tokio::test]
    async fn test_remote_error_stops_reading() {
        let request = CODEC.encode(&SequenceNumber(0)).unwrap();
        let error = chunk_bytes(ResponseChunk::Error {
            code: SERVER_ERROR,
            message: ErrorMessage::new("resource unavailable"),
        })
        .await;

        let mut stream = Builder::new().write(&request).read(&error).build();

        let err = client(Duration::from_secs(1))
            .exchange::<_, _, SequenceNumber>(&mut stream, Topic::Ping, &SequenceNumber(0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NetworkError::Remote { code: SERVER_ERROR, ref message } if message == "resource unavailable"
        ));
    }

    #[tokio::test]
    async fn test_truncated_chunk_is_a_transport_error() {
        let request = CODEC.encode(&SequenceNumber(0)).unwrap();
        let first = chunk_bytes(success(1)).await;

        let mut stream = Builder::new()
            .write(&request)
            .read(&first)
            .read(&[0, 1, 2])
            .build();

        let err = client(Duration::from_secs(1))
            .exchange::<_, _, SequenceNumber>(&mut stream, Topic::Ping, &SequenceNumber(0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NetworkError::Transport {
                phase: Phase::ReadChunk { index: 1 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_a_decode_error() {
        let request = CODEC.encode(&SequenceNumber(0)).unwrap();

        // a 3 byte payload where a uint64 is expected
        let mut chunk = vec![0, 0, 0, 0, 0];
        chunk.extend(CODEC.encode(&ErrorMessage(vec![1, 2, 3])).unwrap());

        let mut stream = Builder::new().write(&request).read(&chunk).build();

        let err = client(Duration::from_secs(1))
            .exchange::<_, _, SequenceNumber>(&mut stream, Topic::Ping, &SequenceNumber(0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NetworkError::Decode {
                phase: Phase::ReadChunk { index: 0 },
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_later_chunks_time_out() {
        let (mut local, mut remote) = duplex(4_096);

        let responder = tokio::spawn(async move {
            let _request: SequenceNumber = CODEC.read(&mut remote).await.unwrap();

            // the first chunk is late but still accepted
            tokio::time::sleep(Duration::from_secs(60)).await;
            remote.write_all(&chunk_bytes(success(1)).await).await.unwrap();

            // the second never arrives, the stream stays open
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            drop(remote);
        });

        let err = client(Duration::from_secs(10))
            .exchange::<_, _, SequenceNumber>(&mut local, Topic::Ping, &SequenceNumber(0))
            .await
            .unwrap_err();

        let NetworkError::Transport { phase, source, .. } = err else {
            panic!("expected a transport error");
        };
        assert_eq!(phase, Phase::ReadChunk { index: 1 });
        assert_eq!(source.kind(), io::ErrorKind::TimedOut);

        responder.abort();
    }
}
