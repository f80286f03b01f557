use core::time::Duration;

use libp2p::identity::Keypair;
use serde::{Deserialize, Serialize};

/// Upper bound for one length-prefixed message. Blob-carrying responses are
/// far larger than ordinary req/resp payloads.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 10 * 1_024 * 1_024;

pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
#[non_exhaustive]
pub struct NetworkConfig {
    pub identity: Keypair,

    pub swarm: SwarmConfig,
    pub rpc: RpcConfig,
}

impl NetworkConfig {
    #[must_use]
    pub const fn new(identity: Keypair, swarm: SwarmConfig, rpc: RpcConfig) -> Self {
        Self {
            identity,
            swarm,
            rpc,
        }
    }

    /// A throwaway secp256k1 identity, the key type consensus clients use.
    #[must_use]
    pub fn ephemeral(swarm: SwarmConfig, rpc: RpcConfig) -> Self {
        Self::new(Keypair::generate_secp256k1(), swarm, rpc)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct SwarmConfig {
    pub idle_connection_timeout: Duration,
}

impl SwarmConfig {
    #[must_use]
    pub const fn new(idle_connection_timeout: Duration) -> Self {
        Self {
            idle_connection_timeout,
        }
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_CONNECTION_TIMEOUT)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct RpcConfig {
    pub max_chunk_size: usize,

    /// Deadline for every response chunk after the first.
    pub chunk_timeout: Duration,
}

impl RpcConfig {
    #[must_use]
    pub const fn new(max_chunk_size: usize, chunk_timeout: Duration) -> Self {
        Self {
            max_chunk_size,
            chunk_timeout,
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SIZE, DEFAULT_CHUNK_TIMEOUT)
    }
}
