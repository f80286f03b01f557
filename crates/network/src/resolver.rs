//! Peer identity discovery for addresses given without a `/p2p/` component.
//!
//! The remote is dialed with a decoy peer id. The security handshake then
//! fails with an identity mismatch that names the key the remote actually
//! holds, which is appended to the address.

use core::str::FromStr;

use async_trait::async_trait;
use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};
use tracing::debug;

use crate::errors::{NetworkError, ResolutionError};

/// Valid secp256k1 peer id that no real node is expected to hold.
pub const DECOY_PEER_ID: &str = "16Uiu2HAmSifdT5QutTsaET8xqjWAMPp4obrQv7LN79f2RMmBe3nY";

/// Phrase some handshake implementations use when the remote key differs from
/// the expected one. The remote's peer id ends the message.
pub const MISMATCH_MARKER: &str = "but remote key matches";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeOutcome {
    Connected,
    /// The dial failed because the remote authenticated as `obtained`.
    WrongPeerId { obtained: PeerId },
    /// Any other dial failure, as reported by the transport.
    Failed(String),
}

/// Dials an address while expecting a given peer id.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, expected: PeerId, address: Multiaddr)
        -> Result<ProbeOutcome, NetworkError>;
}

pub fn parse_address(address: &str) -> Result<Multiaddr, NetworkError> {
    address
        .parse()
        .map_err(|err: libp2p::multiaddr::Error| NetworkError::AddressParse {
            address: address.to_owned(),
            reason: err.to_string(),
        })
}

#[must_use]
pub fn peer_id_of(address: &Multiaddr) -> Option<PeerId> {
    address.iter().find_map(|protocol| match protocol {
        Protocol::P2p(peer_id) => Some(peer_id),
        _ => None,
    })
}

/// Returns `address` with the remote's peer id, discovering it if missing.
pub async fn resolve<P>(prober: &P, address: Multiaddr) -> Result<Multiaddr, NetworkError>
where
    P: Prober + ?Sized,
{
    if peer_id_of(&address).is_some() {
        return Ok(address);
    }

    let decoy = PeerId::from_str(DECOY_PEER_ID)
        .map_err(|_| ResolutionError::InvalidPeerId(DECOY_PEER_ID.to_owned()))?;

    debug!(%address, "Probing remote for its peer id");

    let peer_id = match prober.probe(decoy, address.clone()).await? {
        ProbeOutcome::Connected => return Err(ResolutionError::UnexpectedSuccess.into()),
        ProbeOutcome::WrongPeerId { obtained } => obtained,
        ProbeOutcome::Failed(message) => peer_id_from_mismatch_message(&message)?,
    };

    debug!(%address, %peer_id, "Discovered remote peer id");

    Ok(address.with(Protocol::P2p(peer_id)))
}

/// Extracts the peer id ending a handshake mismatch message.
pub fn peer_id_from_mismatch_message(message: &str) -> Result<PeerId, ResolutionError> {
    if !message.contains(MISMATCH_MARKER) {
        return Err(ResolutionError::Unrecognised(message.to_owned()));
    }

    let token = message
        .split_whitespace()
        .next_back()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .unwrap_or_default();

    PeerId::from_str(token).map_err(|_| ResolutionError::InvalidPeerId(token.to_owned()))
}
