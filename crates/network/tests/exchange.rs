use core::time::Duration;

use blobkit_network::download::extract_blob_payload;
use blobkit_network::errors::NetworkError;
use blobkit_network::request::ChunkedRequestClient;
use blobkit_network::primitives::chunk::{write_chunk, ResponseChunk, INVALID_REQUEST};
use blobkit_network::primitives::codec::SszSnappyCodec;
use blobkit_network::primitives::config::{RpcConfig, DEFAULT_MAX_CHUNK_SIZE};
use blobkit_network::primitives::messages::{
    BlobsSidecar, BlobsSidecarsByRangeRequest, ErrorMessage,
};
use blobkit_network::primitives::topics::Topic;
use blobkit_primitives::blobs::{encode_blobs, Blob, BYTES_PER_BLOB};
use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
use tokio::spawn;
use tokio::task::JoinHandle;

const CODEC: SszSnappyCodec = SszSnappyCodec::new(DEFAULT_MAX_CHUNK_SIZE);

const CONTEXT: [u8; 4] = [0x6a, 0x95, 0xa1, 0xa9];

fn sidecar(slot: u64, blobs: Vec<Blob>) -> BlobsSidecar {
    BlobsSidecar {
        beacon_block_root: [7; 32],
        beacon_block_slot: slot,
        blobs,
        kzg_aggregated_proof: [0xc0; 48],
    }
}

/// Plays a beacon node answering one blobs request with `chunks`, then
/// closing the stream.
fn beacon_node(
    mut stream: DuplexStream,
    chunks: Vec<ResponseChunk<BlobsSidecar>>,
) -> JoinHandle<BlobsSidecarsByRangeRequest> {
    spawn(async move {
        let request: BlobsSidecarsByRangeRequest = CODEC.read(&mut stream).await.unwrap();

        for chunk in &chunks {
            write_chunk(&mut stream, &CODEC, chunk).await.unwrap();
        }

        stream.shutdown().await.unwrap();

        request
    })
}

async fn fetch(
    chunks: Vec<ResponseChunk<BlobsSidecar>>,
) -> (Result<Vec<BlobsSidecar>, NetworkError>, BlobsSidecarsByRangeRequest) {
    let (mut local, remote) = duplex(4 * BYTES_PER_BLOB);
    let node = beacon_node(remote, chunks);

    let client = ChunkedRequestClient::new(&RpcConfig::new(
        DEFAULT_MAX_CHUNK_SIZE,
        Duration::from_secs(10),
    ));

    let result = client
        .exchange(
            &mut local,
            Topic::BlobsSidecarsByRangeV1,
            &BlobsSidecarsByRangeRequest::single(100),
        )
        .await;

    (result, node.await.unwrap())
}

fn success(sidecar: BlobsSidecar) -> ResponseChunk<BlobsSidecar> {
    ResponseChunk::Success {
        context: CONTEXT,
        payload: sidecar,
    }
}

#[tokio::test]
async fn test_every_chunk_is_returned_in_order() {
    let chunks = (0..3)
        .map(|index| success(sidecar(100 + index, vec![])))
        .collect();

    let (result, request) = fetch(chunks).await;

    assert_eq!(request, BlobsSidecarsByRangeRequest::single(100));

    let slots: Vec<_> = result.unwrap().iter().map(BlobsSidecar::slot).collect();
    assert_eq!(slots, [100, 101, 102]);
}

#[tokio::test]
async fn test_empty_response() {
    let (result, _) = fetch(vec![]).await;

    assert!(result.unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_error_carries_message() {
    let chunks = vec![
        ResponseChunk::Error {
            code: INVALID_REQUEST,
            message: ErrorMessage::new("slot out of range"),
        },
        success(sidecar(100, vec![])),
    ];

    let (result, _) = fetch(chunks).await;

    let Err(NetworkError::Remote { code, message }) = result else {
        panic!("expected a remote error");
    };
    assert_eq!(code, INVALID_REQUEST);
    assert_eq!(message, "slot out of range");
}

#[tokio::test]
async fn test_slot_with_two_blobs_yields_their_payload() {
    let first = vec![0x42; 5_000];
    let second = b"tail of the payload".to_vec();

    let blobs = [encode_blobs(&first), encode_blobs(&second)].concat();
    assert_eq!(blobs.len(), 2);

    let (result, _) = fetch(vec![success(sidecar(100, blobs))]).await;

    let payload = extract_blob_payload(&result.unwrap(), 100).unwrap();

    assert_eq!(payload, [first, second].concat());
}

#[tokio::test]
async fn test_trailing_zero_padding_is_dropped() {
    let mut data = b"payload".to_vec();
    data.extend([0; 3]);

    let (result, _) = fetch(vec![success(sidecar(100, encode_blobs(&data)))]).await;

    let payload = extract_blob_payload(&result.unwrap(), 100).unwrap();

    assert_eq!(payload, b"payload");
}
