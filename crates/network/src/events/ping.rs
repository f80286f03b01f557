use libp2p::ping::Event;
use tracing::debug;

use super::{EventHandler, EventLoop};

impl EventHandler<Event> for EventLoop {
    fn handle(&mut self, event: Event) {
        debug!(peer_id = %event.peer, result = ?event.result, "ping");
    }
}
