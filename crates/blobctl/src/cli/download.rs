use blobkit_network::download::download_blobs;
use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{Result as EyreResult, WrapErr};
use tokio::io::{stdout, AsyncWriteExt};
use tokio::signal::ctrl_c;
use tokio::spawn;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::defaults;

/// Fetch the blobs of a slot from a beacon node and write them to stdout
#[derive(Debug, Parser)]
pub struct DownloadCommand {
    /// Beacon node libp2p address, the /p2p/ component is optional
    #[arg(long, value_name = "MULTIADDR", default_value = defaults::BEACON_P2P_ADDR)]
    pub beacon_p2p_addr: String,

    /// Slot whose blobs are fetched
    #[arg(long, value_name = "SLOT")]
    pub slot: u64,

    /// TOML file overriding swarm and request settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

impl DownloadCommand {
    pub async fn run(self) -> EyreResult<()> {
        let config = match &self.config {
            Some(path) => ConfigFile::load(path).await?,
            None => ConfigFile::default(),
        };

        let token = CancellationToken::new();

        let interrupt = spawn({
            let token = token.clone();
            async move {
                if let Err(err) = ctrl_c().await {
                    warn!(%err, "Failed to listen for interrupts");
                    return;
                }
                info!("Interrupted, cancelling download");
                token.cancel();
            }
        });

        let result = download_blobs(
            &config.into_network_config(),
            &self.beacon_p2p_addr,
            self.slot,
            &token,
        )
        .await;

        interrupt.abort();

        let payload = result.wrap_err_with(|| {
            format!(
                "failed to download blobs for slot {} from {}",
                self.slot, self.beacon_p2p_addr
            )
        })?;

        info!(slot = self.slot, bytes = payload.len(), "Downloaded blobs");

        let mut out = stdout();
        out.write_all(&payload)
            .await
            .wrap_err("failed to write payload to stdout")?;
        out.flush().await.wrap_err("failed to flush stdout")?;

        Ok(())
    }
}
