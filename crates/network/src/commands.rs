use libp2p::swarm::dial_opts::{DialOpts, PeerCondition};
use tracing::debug;

use crate::client::Command;
use crate::events::dial_outcome;
use crate::EventLoop;

impl EventLoop {
    pub(crate) fn handle_command(&mut self, command: Command) {
        match command {
            Command::Dial {
                peer_id,
                address,
                outcome,
            } => {
                let opts = DialOpts::peer_id(peer_id)
                    .addresses(vec![address.clone()])
                    .condition(PeerCondition::Always)
                    .build();
                let connection_id = opts.connection_id();

                debug!(%peer_id, %address, "Dialing");

                match self.swarm.dial(opts) {
                    Ok(()) => {
                        let _ignored = self.pending_dial.insert(connection_id, outcome);
                    }
                    Err(err) => {
                        let _ignored = outcome.send(dial_outcome(&err));
                    }
                }
            }
            Command::ListenOn { address, outcome } => match self.swarm.listen_on(address) {
                Ok(listener_id) => {
                    let _ignored = self.pending_listen.insert(listener_id, outcome);
                }
                Err(err) => {
                    let _ignored = outcome.send(Err(err.to_string()));
                }
            },
        }
    }
}
