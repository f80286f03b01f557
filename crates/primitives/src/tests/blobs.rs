use super::*;

fn make_payload(size: usize) -> Vec<u8> {
    // 1..=255 so the final byte is never zero
    (0..size).map(|i| (i % 255 + 1) as u8).collect()
}

#[test]
fn test_single_blob_roundtrip() {
    for size in [1, 5, 31, 32, 95, MAX_BLOB_PAYLOAD] {
        let payload = make_payload(size);

        let blobs = encode_blobs(&payload);
        assert_eq!(blobs.len(), 1, "size {size} should fit in one blob");

        assert_eq!(decode_blob(&blobs[0]), payload, "size {size}");
    }
}

#[test]
fn test_multi_blob_roundtrip() {
    let payload = make_payload(BYTES_PER_BLOB + 10);

    let blobs = encode_blobs(&payload);
    assert_eq!(blobs.len(), 2);

    let decoded: Vec<u8> = blobs.iter().flat_map(|blob| decode_blob(blob)).collect();
    assert_eq!(decoded, payload);
}

#[test]
fn test_capacity_boundary() {
    let mut payload = make_payload(MAX_BLOB_PAYLOAD);
    payload.push(0xab);

    let blobs = encode_blobs(&payload);
    assert_eq!(blobs.len(), 2);

    let second = &blobs[1];
    let mut elements = second.field_elements();
    let first = elements.next().unwrap();
    assert_eq!(first[0], 0, "reserved byte must stay zero");
    assert_eq!(first[1], 0xab);
    assert!(first[2..].iter().all(|&b| b == 0));
    assert!(elements.all(|element| element.iter().all(|&b| b == 0)));
}

#[test]
fn test_empty_input() {
    let blobs = encode_blobs(&[]);
    assert_eq!(blobs.len(), 1);
    assert!(blobs[0].iter().all(|&b| b == 0));

    assert!(decode_blob(&blobs[0]).is_empty());
}

#[test]
fn test_reserved_byte_is_zero() {
    let payload = vec![0xff; MAX_BLOB_PAYLOAD];
    let blobs = encode_blobs(&payload);

    assert!(blobs[0].field_elements().all(|element| element[0] == 0));
}

#[test]
fn test_trailing_zeros_are_lost() {
    let payload = [1, 2, 3, 0, 0];

    let blobs = encode_blobs(&payload);

    assert_eq!(decode_blob(&blobs[0]), [1, 2, 3]);
}

#[test]
fn test_blob_length_is_checked() {
    assert_eq!(
        Blob::try_from(&[0_u8; 10][..]),
        Err(InvalidBlobLength(10))
    );
    assert!(Blob::try_from(vec![0; BYTES_PER_BLOB]).is_ok());
}
