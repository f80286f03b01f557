use libp2p::identify::Event;
use tracing::debug;

use super::{EventHandler, EventLoop};

impl EventHandler<Event> for EventLoop {
    fn handle(&mut self, event: Event) {
        if let Event::Received { peer_id, info, .. } = event {
            debug!(
                %peer_id,
                agent = %info.agent_version,
                protocols = info.protocols.len(),
                "Identified remote peer"
            );
            return;
        }

        debug!(?event, "identify");
    }
}
