use blobkit_network::primitives::config::{NetworkConfig, RpcConfig, SwarmConfig};
use camino::Utf8Path;
use eyre::{Result as EyreResult, WrapErr};
use serde::{Deserialize, Serialize};
use tokio::fs::read_to_string;

/// Retrieval settings read from a TOML file. Missing tables and keys keep
/// their defaults.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
#[non_exhaustive]
pub struct ConfigFile {
    pub swarm: SwarmConfig,
    pub rpc: RpcConfig,
}

impl ConfigFile {
    pub async fn load(path: &Utf8Path) -> EyreResult<Self> {
        let content = read_to_string(path)
            .await
            .wrap_err_with(|| format!("failed to read configuration file {path}"))?;

        toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse configuration file {path}"))
    }

    /// Pairs the settings with a fresh local identity.
    pub fn into_network_config(self) -> NetworkConfig {
        NetworkConfig::ephemeral(self.swarm, self.rpc)
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use blobkit_network::primitives::config::{
        DEFAULT_CHUNK_TIMEOUT, DEFAULT_IDLE_CONNECTION_TIMEOUT, DEFAULT_MAX_CHUNK_SIZE,
    };

    use super::*;

    #[test]
    fn test_empty_file_keeps_defaults() {
        let config: ConfigFile = toml::from_str("").unwrap();

        assert_eq!(config.rpc.max_chunk_size, DEFAULT_MAX_CHUNK_SIZE);
        assert_eq!(config.rpc.chunk_timeout, DEFAULT_CHUNK_TIMEOUT);
        assert_eq!(
            config.swarm.idle_connection_timeout,
            DEFAULT_IDLE_CONNECTION_TIMEOUT
        );
    }

    #[test]
    fn test_partial_override() {
        let config: ConfigFile = toml::from_str(
            r"
            [rpc]
            max_chunk_size = 1048576
            chunk_timeout = { secs = 3, nanos = 0 }
            ",
        )
        .unwrap();

        assert_eq!(config.rpc.max_chunk_size, 1_048_576);
        assert_eq!(config.rpc.chunk_timeout, Duration::from_secs(3));
        assert_eq!(
            config.swarm.idle_connection_timeout,
            DEFAULT_IDLE_CONNECTION_TIMEOUT
        );
    }

    #[test]
    fn test_mistyped_value_is_rejected() {
        assert!(toml::from_str::<ConfigFile>("[rpc]\nmax_chunk_size = \"big\"").is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = ConfigFile::load(Utf8Path::new("/nonexistent/blobctl.toml"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("/nonexistent/blobctl.toml"));
    }
}
