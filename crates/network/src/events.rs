use libp2p::identify::Event as IdentifyEvent;
use libp2p::ping::Event as PingEvent;
use libp2p::swarm::{DialError, SwarmEvent};
use tracing::{debug, trace};

use crate::resolver::ProbeOutcome;
use crate::{BehaviourEvent, EventLoop};

mod identify;
mod ping;

pub(crate) trait EventHandler<E> {
    fn handle(&mut self, event: E);
}

impl EventHandler<SwarmEvent<BehaviourEvent>> for EventLoop {
    fn handle(&mut self, event: SwarmEvent<BehaviourEvent>) {
        match event {
            SwarmEvent::Behaviour(BehaviourEvent::Identify(event)) => {
                EventHandler::<IdentifyEvent>::handle(self, event);
            }
            SwarmEvent::Behaviour(BehaviourEvent::Ping(event)) => {
                EventHandler::<PingEvent>::handle(self, event);
            }
            SwarmEvent::Behaviour(BehaviourEvent::Stream(_)) => {}
            SwarmEvent::NewListenAddr {
                listener_id,
                address,
            } => {
                debug!(%address, "Listening");

                if let Some(sender) = self.pending_listen.remove(&listener_id) {
                    let _ignored = sender.send(Ok(address));
                }
            }
            SwarmEvent::ListenerError { listener_id, error } => {
                if let Some(sender) = self.pending_listen.remove(&listener_id) {
                    let _ignored = sender.send(Err(error.to_string()));
                }
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                connection_id,
                endpoint,
                ..
            } => {
                debug!(%peer_id, address = %endpoint.get_remote_address(), "Connection established");

                if let Some(sender) = self.pending_dial.remove(&connection_id) {
                    let _ignored = sender.send(ProbeOutcome::Connected);
                }
            }
            SwarmEvent::OutgoingConnectionError {
                connection_id,
                peer_id,
                error,
            } => {
                debug!(?peer_id, %error, "Outgoing connection failed");

                if let Some(sender) = self.pending_dial.remove(&connection_id) {
                    let _ignored = sender.send(dial_outcome(&error));
                }
            }
            SwarmEvent::ConnectionClosed { peer_id, cause, .. } => {
                debug!(%peer_id, ?cause, "Connection closed");
            }
            event => trace!(?event, "Unhandled swarm event"),
        }
    }
}

pub(crate) fn dial_outcome(error: &DialError) -> ProbeOutcome {
    match error {
        DialError::WrongPeerId { obtained, .. } => ProbeOutcome::WrongPeerId {
            obtained: *obtained,
        },
        error => ProbeOutcome::Failed(error.to_string()),
    }
}
