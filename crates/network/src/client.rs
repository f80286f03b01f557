use core::fmt;
use std::io;

use async_trait::async_trait;
use blobkit_network_primitives::config::RpcConfig;
use blobkit_network_primitives::ssz::{SszDecode, SszEncode};
use blobkit_network_primitives::stream::Stream;
use blobkit_network_primitives::topics::Topic;
use libp2p::{Multiaddr, PeerId};
use libp2p_stream::Control;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::errors::{NetworkError, Phase};
use crate::request::ChunkedRequestClient;
use crate::resolver::{peer_id_of, ProbeOutcome, Prober};

#[derive(Debug)]
pub(crate) enum Command {
    Dial {
        peer_id: PeerId,
        address: Multiaddr,
        outcome: oneshot::Sender<ProbeOutcome>,
    },
    ListenOn {
        address: Multiaddr,
        outcome: oneshot::Sender<Result<Multiaddr, String>>,
    },
}

/// Handle to a running local peer.
#[derive(Clone)]
pub struct NetworkClient {
    sender: mpsc::Sender<Command>,
    control: Control,
    rpc: RpcConfig,
}

impl fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkClient")
            .field("rpc", &self.rpc)
            .finish_non_exhaustive()
    }
}

impl NetworkClient {
    pub(crate) const fn new(sender: mpsc::Sender<Command>, control: Control, rpc: RpcConfig) -> Self {
        Self {
            sender,
            control,
            rpc,
        }
    }

    async fn send<T>(
        &self,
        command: Command,
        receiver: oneshot::Receiver<T>,
    ) -> Result<T, NetworkError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| NetworkError::PeerClosed)?;

        receiver.await.map_err(|_| NetworkError::PeerClosed)
    }

    /// Dials `address` expecting the remote to authenticate as `peer_id`.
    pub async fn dial(
        &self,
        peer_id: PeerId,
        address: Multiaddr,
    ) -> Result<ProbeOutcome, NetworkError> {
        let (outcome, receiver) = oneshot::channel();

        self.send(
            Command::Dial {
                peer_id,
                address,
                outcome,
            },
            receiver,
        )
        .await
    }

    /// Listens on `address` and returns the address actually bound.
    pub async fn listen_on(&self, address: Multiaddr) -> Result<Multiaddr, NetworkError> {
        let (outcome, receiver) = oneshot::channel();

        self.send(
            Command::ListenOn {
                address: address.clone(),
                outcome,
            },
            receiver,
        )
        .await?
        .map_err(|reason| NetworkError::Connect { address, reason })
    }

    /// Connects to a fully qualified address and returns the remote peer id.
    pub async fn connect(&self, address: &Multiaddr) -> Result<PeerId, NetworkError> {
        let Some(peer_id) = peer_id_of(address) else {
            return Err(NetworkError::AddressParse {
                address: address.to_string(),
                reason: "missing /p2p/ component".to_owned(),
            });
        };

        let reason = match self.dial(peer_id, address.clone()).await? {
            ProbeOutcome::Connected => {
                debug!(%peer_id, %address, "Connected");
                return Ok(peer_id);
            }
            ProbeOutcome::WrongPeerId { obtained } => {
                format!("remote authenticated as {obtained}, expected {peer_id}")
            }
            ProbeOutcome::Failed(reason) => reason,
        };

        Err(NetworkError::Connect {
            address: address.clone(),
            reason,
        })
    }

    pub async fn open_stream(&self, peer_id: PeerId, topic: Topic) -> Result<Stream, NetworkError> {
        let mut control = self.control.clone();

        let stream = control
            .open_stream(peer_id, topic.protocol())
            .await
            .map_err(|err| NetworkError::transport(topic, Phase::OpenStream, io::Error::other(err)))?;

        Ok(Stream::new(stream))
    }

    /// Sends one request on a fresh stream and collects every response chunk.
    pub async fn request<Req, Resp>(
        &self,
        peer_id: PeerId,
        topic: Topic,
        request: &Req,
    ) -> Result<Vec<Resp>, NetworkError>
    where
        Req: SszEncode + Sync,
        Resp: SszDecode + Send,
    {
        let mut stream = self.open_stream(peer_id, topic).await?;

        debug!(%peer_id, %topic, "Opened request stream");

        let result = ChunkedRequestClient::new(&self.rpc)
            .exchange(&mut stream, topic, request)
            .await;

        if result.is_err() {
            stream.reset();
        }

        result
    }
}

#[async_trait]
impl Prober for NetworkClient {
    async fn probe(
        &self,
        expected: PeerId,
        address: Multiaddr,
    ) -> Result<ProbeOutcome, NetworkError> {
        self.dial(expected, address).await
    }
}
