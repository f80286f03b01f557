use core::fmt;
use std::io;

use blobkit_network_primitives::codec::CodecError;
use blobkit_network_primitives::topics::Topic;
use libp2p::Multiaddr;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NetworkError {
    #[error("invalid address `{address}`: {reason}")]
    AddressParse { address: String, reason: String },

    #[error("failed to resolve peer identity: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("failed to connect to {address}: {reason}")]
    Connect { address: Multiaddr, reason: String },

    #[error("{topic}: transport failure while {phase}: {source}")]
    Transport {
        topic: Topic,
        phase: Phase,
        #[source]
        source: io::Error,
    },

    #[error("remote peer answered with status {code}: {message}")]
    Remote { code: u8, message: String },

    #[error("{topic}: malformed data while {phase}: {source}")]
    Decode {
        topic: Topic,
        phase: Phase,
        #[source]
        source: CodecError,
    },

    #[error("no blobs found for slot {slot} in {sidecars} sidecar(s)")]
    NoBlobsFound { slot: u64, sidecars: usize },

    #[error("local peer failed to start: {reason}")]
    LocalPeer { reason: String },

    #[error("local peer has shut down")]
    PeerClosed,

    #[error("operation cancelled")]
    Cancelled,
}

impl NetworkError {
    /// Splits codec failures into transport and decode errors.
    pub(crate) fn codec(topic: Topic, phase: Phase, err: CodecError) -> Self {
        match err {
            CodecError::Io(source) => Self::Transport {
                topic,
                phase,
                source,
            },
            source => Self::Decode {
                topic,
                phase,
                source,
            },
        }
    }

    pub(crate) const fn transport(topic: Topic, phase: Phase, source: io::Error) -> Self {
        Self::Transport {
            topic,
            phase,
            source,
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolutionError {
    #[error("dialing with a mismatched peer id unexpectedly succeeded")]
    UnexpectedSuccess,

    #[error("handshake failure did not reveal the remote identity: {0}")]
    Unrecognised(String),

    #[error("invalid peer id `{0}`")]
    InvalidPeerId(String),
}

/// Where in a request/response exchange a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Phase {
    OpenStream,
    SendRequest,
    CloseWrite,
    ReadChunk { index: usize },
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenStream => f.write_str("opening stream"),
            Self::SendRequest => f.write_str("sending request"),
            Self::CloseWrite => f.write_str("closing write side"),
            Self::ReadChunk { index } => write!(f, "reading chunk {index}"),
        }
    }
}
