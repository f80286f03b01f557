use blobkit_network_primitives::config::NetworkConfig;
use blobkit_network_primitives::messages::{BlobsSidecar, BlobsSidecarsByRangeRequest};
use blobkit_network_primitives::topics::Topic;
use blobkit_primitives::blobs::decode_blob;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::NetworkError;
use crate::resolver::{parse_address, resolve};
use crate::LocalPeer;

/// Fetches the blobs a beacon node holds for `slot` and returns their
/// decoded payload.
///
/// `address` may omit the `/p2p/` component, in which case the remote peer
/// id is discovered first. Cancelling `token` aborts whichever step is in
/// progress.
pub async fn download_blobs(
    config: &NetworkConfig,
    address: &str,
    slot: u64,
    token: &CancellationToken,
) -> Result<Vec<u8>, NetworkError> {
    let address = parse_address(address)?;

    let peer = LocalPeer::start(config)?;

    let fetch = async {
        let client = peer.client();

        let address = resolve(client, address).await?;
        info!(%address, "Resolved beacon node address");

        let peer_id = client.connect(&address).await?;
        info!(%peer_id, "Connected to beacon node");

        let sidecars: Vec<BlobsSidecar> = client
            .request(
                peer_id,
                Topic::BlobsSidecarsByRangeV1,
                &BlobsSidecarsByRangeRequest::single(slot),
            )
            .await?;

        info!(slot, sidecars = sidecars.len(), "Received blobs sidecars");

        extract_blob_payload(&sidecars, slot)
    };

    #[expect(clippy::redundant_pub_crate, reason = "Needed for Tokio code")]
    let result = select! {
        biased;
        () = token.cancelled() => Err(NetworkError::Cancelled),
        result = fetch => result,
    };

    drop(peer);

    result
}

/// Decodes the blobs of the first sidecar at `slot` that carries any.
///
/// Sidecars are scanned in order and scanning stops at the first one for a
/// different slot.
pub fn extract_blob_payload(sidecars: &[BlobsSidecar], slot: u64) -> Result<Vec<u8>, NetworkError> {
    for sidecar in sidecars {
        if sidecar.slot() != slot {
            debug!(expected = slot, actual = sidecar.slot(), "Sidecar for another slot");
            break;
        }

        if sidecar.blobs.is_empty() {
            continue;
        }

        debug!(slot, blobs = sidecar.blobs.len(), "Decoding blobs");

        return Ok(sidecar
            .blobs
            .iter()
            .flat_map(|blob| decode_blob(blob))
            .collect());
    }

    Err(NetworkError::NoBlobsFound {
        slot,
        sidecars: sidecars.len(),
    })
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use blobkit_network_primitives::config::{RpcConfig, SwarmConfig};
    use blobkit_primitives::blobs::{encode_blobs, Blob};
    use tokio::net::TcpListener;
    use tokio::spawn;
    use tokio::time::{sleep, timeout};

    use super::*;

    fn sidecar(slot: u64, blobs: Vec<Blob>) -> BlobsSidecar {
        BlobsSidecar {
            beacon_block_root: [0; 32],
            beacon_block_slot: slot,
            blobs,
            kzg_aggregated_proof: [0; 48],
        }
    }

    #[test]
    fn test_first_sidecar_with_blobs_wins() {
        let sidecars = [
            sidecar(5, vec![]),
            sidecar(5, encode_blobs(b"first")),
            sidecar(5, encode_blobs(b"second")),
        ];

        assert_eq!(extract_blob_payload(&sidecars, 5).unwrap(), b"first");
    }

    #[test]
    fn test_blobs_are_concatenated() {
        let sidecars = [sidecar(
            5,
            [encode_blobs(b"hello "), encode_blobs(b"world")].concat(),
        )];

        assert_eq!(extract_blob_payload(&sidecars, 5).unwrap(), b"hello world");
    }

    #[test]
    fn test_other_slot_stops_the_scan() {
        let sidecars = [sidecar(6, vec![]), sidecar(5, encode_blobs(b"late"))];

        let err = extract_blob_payload(&sidecars, 5).unwrap_err();

        assert!(matches!(
            err,
            NetworkError::NoBlobsFound {
                slot: 5,
                sidecars: 2
            }
        ));
    }

    #[test]
    fn test_no_sidecars() {
        assert!(matches!(
            extract_blob_payload(&[], 1),
            Err(NetworkError::NoBlobsFound { sidecars: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();

        let config = NetworkConfig::ephemeral(SwarmConfig::default(), RpcConfig::default());

        let err = download_blobs(&config, "/ip4/127.0.0.1/tcp/1", 1, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, NetworkError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_unblocks_stalled_connection() {
        // accepts connections and never speaks, so the handshake hangs
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let stall = spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let token = CancellationToken::new();
        let canceller = spawn({
            let token = token.clone();
            async move {
                sleep(Duration::from_millis(300)).await;
                token.cancel();
            }
        });

        let config = NetworkConfig::ephemeral(SwarmConfig::default(), RpcConfig::default());
        let address = format!("/ip4/127.0.0.1/tcp/{port}");

        let result = timeout(
            Duration::from_secs(5),
            download_blobs(&config, &address, 1, &token),
        )
        .await
        .expect("cancellation must unblock the download");

        assert!(matches!(result, Err(NetworkError::Cancelled)), "{result:?}");

        canceller.await.unwrap();
        stall.abort();
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let config = NetworkConfig::ephemeral(SwarmConfig::default(), RpcConfig::default());

        let err = download_blobs(&config, "localhost:13000", 1, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, NetworkError::AddressParse { .. }));
    }
}
