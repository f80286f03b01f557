//! Answers the req/resp topics a consensus node exercises while it sets up a
//! connection, so that the local peer is accepted as a regular participant.

use core::time::Duration;
use std::io;

use blobkit_network_primitives::chunk::write_success;
use blobkit_network_primitives::codec::{CodecError, SszSnappyCodec};
use blobkit_network_primitives::config::RpcConfig;
use blobkit_network_primitives::messages::{MetaDataV1, MetaDataV2, SequenceNumber};
use blobkit_network_primitives::stream::Stream;
use blobkit_network_primitives::topics::{RequestShape, ResponseStrategy, Topic};
use futures_util::StreamExt;
use libp2p::PeerId;
use libp2p_stream::{Control, IncomingStreams};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::errors::NetworkError;

#[derive(Clone, Copy, Debug)]
pub struct HandshakeResponder {
    codec: SszSnappyCodec,
    /// Deadline for the inbound request body.
    request_timeout: Duration,
}

impl HandshakeResponder {
    #[must_use]
    pub const fn new(config: &RpcConfig) -> Self {
        Self {
            codec: SszSnappyCodec::new(config.max_chunk_size),
            request_timeout: config.chunk_timeout,
        }
    }

    /// Serves ping, goodbye and both metadata versions with synthesized
    /// answers.
    pub fn register_control_handlers(
        self,
        control: &mut Control,
    ) -> Result<Vec<JoinHandle<()>>, NetworkError> {
        self.register(control, Topic::ALL.into_iter().filter(|topic| topic.is_control()))
    }

    /// Accepts the bulk-data topics and resets every stream opened on them.
    pub fn register_passthrough_handlers(
        self,
        control: &mut Control,
    ) -> Result<Vec<JoinHandle<()>>, NetworkError> {
        self.register(control, Topic::ALL.into_iter().filter(|topic| !topic.is_control()))
    }

    fn register(
        self,
        control: &mut Control,
        topics: impl Iterator<Item = Topic>,
    ) -> Result<Vec<JoinHandle<()>>, NetworkError> {
        topics
            .map(|topic| {
                let incoming =
                    control
                        .accept(topic.protocol())
                        .map_err(|err| NetworkError::LocalPeer {
                            reason: format!("failed to accept {topic}: {err}"),
                        })?;

                Ok(spawn(self.serve(topic, incoming)))
            })
            .collect()
    }

    async fn serve(self, topic: Topic, mut incoming: IncomingStreams) {
        while let Some((peer_id, stream)) = incoming.next().await {
            debug!(%peer_id, %topic, "Inbound stream");

            drop(spawn(self.supervise(topic, peer_id, Stream::new(stream))));
        }
    }

    /// Runs the handler in its own task so a panic only costs this stream.
    async fn supervise<S>(self, topic: Topic, peer_id: PeerId, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let task = spawn(async move { self.respond(topic, stream).await });

        match task.await {
            Ok(Ok(())) => debug!(%peer_id, %topic, "Inbound stream handled"),
            Ok(Err(err)) => warn!(%peer_id, %topic, %err, "Failed to answer inbound stream"),
            Err(err) if err.is_panic() => error!(%peer_id, %topic, "Inbound stream handler panicked"),
            Err(err) => debug!(%peer_id, %topic, %err, "Inbound stream handler cancelled"),
        }
    }

    /// Services one inbound stream by protocol id. Unknown protocols are
    /// logged and the stream is dropped.
    pub async fn dispatch<S>(self, protocol_id: &str, stream: S) -> Result<(), CodecError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(topic) = Topic::from_protocol_id(protocol_id) else {
            warn!(%protocol_id, "No handler for inbound protocol");
            return Ok(());
        };

        self.respond(topic, stream).await
    }

    /// Services one inbound stream. Returning early drops `stream`, which
    /// resets it.
    pub async fn respond<S>(self, topic: Topic, mut stream: S) -> Result<(), CodecError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let handling = topic.handling();

        if handling.response == ResponseStrategy::Passthrough {
            return Ok(());
        }

        if handling.request == RequestShape::Uint64 {
            let read = timeout(self.request_timeout, self.codec.read::<_, u64>(&mut stream))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "inbound request timed out"))?;

            match read {
                Ok(value) => debug!(%topic, value, "Inbound request"),
                Err(err) if err.is_eof() => {}
                Err(err) => return Err(err),
            }
        }

        match handling.response {
            ResponseStrategy::SequenceNumber => {
                write_success(&mut stream, &self.codec, &SequenceNumber::default()).await?;
            }
            ResponseStrategy::MetaDataV1 => {
                write_success(&mut stream, &self.codec, &MetaDataV1::default()).await?;
            }
            ResponseStrategy::MetaDataV2 => {
                write_success(&mut stream, &self.codec, &MetaDataV2::default()).await?;
            }
            ResponseStrategy::Passthrough => {}
        }

        stream.shutdown().await?;

        Ok(())
    }
}
