//! Minimal consensus-layer peer for fetching blob sidecars.
//!
//! A [`LocalPeer`] owns a libp2p swarm speaking TCP, Noise and Yamux with a
//! secp256k1 identity. It answers the handshake topics a beacon node
//! exercises on connect while the caller runs one outbound request.

use std::collections::HashMap;

use blobkit_network_primitives::config::NetworkConfig;
use futures_util::StreamExt;
use libp2p::core::transport::ListenerId;
use libp2p::identify::{Behaviour as IdentifyBehaviour, Config as IdentifyConfig};
use libp2p::noise::Config as NoiseConfig;
use libp2p::ping::Behaviour as PingBehaviour;
use libp2p::swarm::{ConnectionId, NetworkBehaviour, Swarm};
use libp2p::tcp::Config as TcpConfig;
use libp2p::yamux::Config as YamuxConfig;
use libp2p::{Multiaddr, PeerId, SwarmBuilder};
use libp2p_stream::Behaviour as StreamBehaviour;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::{select, spawn};
use tracing::debug;

pub mod client;
mod commands;
pub mod download;
pub mod errors;
mod events;
pub mod request;
pub mod resolver;
pub mod responder;

pub use blobkit_network_primitives as primitives;

use client::{Command, NetworkClient};
use errors::NetworkError;
use events::EventHandler;
use resolver::ProbeOutcome;
use responder::HandshakeResponder;

/// Protocol version consensus clients advertise over identify.
const PROTOCOL_VERSION: &str = "eth2/1.0.0";
const AGENT_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(NetworkBehaviour)]
struct Behaviour {
    identify: IdentifyBehaviour,
    ping: PingBehaviour,
    stream: StreamBehaviour,
}

/// A running local peer. Dropping it stops the swarm and every handler.
#[derive(Debug)]
pub struct LocalPeer {
    peer_id: PeerId,
    client: NetworkClient,
    tasks: Vec<JoinHandle<()>>,
}

impl LocalPeer {
    /// Builds the swarm, installs the handshake handlers and spawns the
    /// event loop. Must be called within a tokio runtime.
    pub fn start(config: &NetworkConfig) -> Result<Self, NetworkError> {
        let peer_id = config.identity.public().to_peer_id();

        let swarm = SwarmBuilder::with_existing_identity(config.identity.clone())
            .with_tokio()
            .with_tcp(TcpConfig::default(), NoiseConfig::new, YamuxConfig::default)
            .map_err(|err| NetworkError::LocalPeer {
                reason: err.to_string(),
            })?
            .with_behaviour(|key| Behaviour {
                identify: IdentifyBehaviour::new(
                    IdentifyConfig::new(PROTOCOL_VERSION.to_owned(), key.public())
                        .with_agent_version(AGENT_VERSION.to_owned()),
                ),
                ping: PingBehaviour::default(),
                stream: StreamBehaviour::new(),
            })
            .map_err(|err| NetworkError::LocalPeer {
                reason: err.to_string(),
            })?
            .with_swarm_config(|cfg| {
                cfg.with_idle_connection_timeout(config.swarm.idle_connection_timeout)
            })
            .build();

        let mut control = swarm.behaviour().stream.new_control();

        let responder = HandshakeResponder::new(&config.rpc);
        let mut tasks = responder.register_control_handlers(&mut control)?;
        tasks.extend(responder.register_passthrough_handlers(&mut control)?);

        let (command_sender, command_receiver) = mpsc::channel(32);

        tasks.push(spawn(EventLoop::new(swarm, command_receiver).run()));

        debug!(%peer_id, "Local peer started");

        Ok(Self {
            peer_id,
            client: NetworkClient::new(command_sender, control, config.rpc),
            tasks,
        })
    }

    #[must_use]
    pub const fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    #[must_use]
    pub const fn client(&self) -> &NetworkClient {
        &self.client
    }
}

impl Drop for LocalPeer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub(crate) struct EventLoop {
    swarm: Box<Swarm<Behaviour>>,
    command_receiver: mpsc::Receiver<Command>,
    pending_dial: HashMap<ConnectionId, oneshot::Sender<ProbeOutcome>>,
    pending_listen: HashMap<ListenerId, oneshot::Sender<Result<Multiaddr, String>>>,
}

impl EventLoop {
    fn new(swarm: Swarm<Behaviour>, command_receiver: mpsc::Receiver<Command>) -> Self {
        Self {
            swarm: Box::new(swarm),
            command_receiver,
            pending_dial: HashMap::default(),
            pending_listen: HashMap::default(),
        }
    }

    async fn run(mut self) {
        #[expect(clippy::redundant_pub_crate, reason = "Needed for Tokio code")]
        loop {
            select! {
                event = self.swarm.next() => {
                    let Some(event) = event else { break };
                    self.handle(event);
                },
                command = self.command_receiver.recv() => {
                    let Some(command) = command else { break };
                    self.handle_command(command);
                }
            }
        }

        debug!("Event loop stopped");
    }
}
