use core::fmt;

use const_format::concatcp;
use libp2p::StreamProtocol;

pub const PROTOCOL_PREFIX: &str = "/eth2/beacon_chain/req";
pub const ENCODING_SUFFIX: &str = "/ssz_snappy";

macro_rules! protocol_id {
    ($name:literal, $version:literal) => {
        concatcp!(PROTOCOL_PREFIX, "/", $name, "/", $version, ENCODING_SUFFIX)
    };
}

const PING_V1: &str = protocol_id!("ping", "1");
const GOODBYE_V1: &str = protocol_id!("goodbye", "1");
const METADATA_V1: &str = protocol_id!("metadata", "1");
const METADATA_V2: &str = protocol_id!("metadata", "2");
const BEACON_BLOCKS_BY_RANGE_V1: &str = protocol_id!("beacon_blocks_by_range", "1");
const BEACON_BLOCKS_BY_RANGE_V2: &str = protocol_id!("beacon_blocks_by_range", "2");
const BLOBS_SIDECARS_BY_RANGE_V1: &str = protocol_id!("blobs_sidecars_by_range", "1");

/// The closed set of req/resp topics the client knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    Ping,
    Goodbye,
    MetaDataV1,
    MetaDataV2,
    BeaconBlocksByRangeV1,
    BeaconBlocksByRangeV2,
    BlobsSidecarsByRangeV1,
}

/// Body an inbound request on a topic carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestShape {
    Empty,
    /// A single SSZ `uint64` (ping sequence number, goodbye reason).
    Uint64,
}

/// What the local peer answers on a topic it services.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStrategy {
    SequenceNumber,
    MetaDataV1,
    MetaDataV2,
    /// Drop the stream without writing; the remote sees a reset.
    Passthrough,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handling {
    pub request: RequestShape,
    pub response: ResponseStrategy,
}

impl Topic {
    pub const ALL: [Self; 7] = [
        Self::Ping,
        Self::Goodbye,
        Self::MetaDataV1,
        Self::MetaDataV2,
        Self::BeaconBlocksByRangeV1,
        Self::BeaconBlocksByRangeV2,
        Self::BlobsSidecarsByRangeV1,
    ];

    /// Full protocol id, encoding suffix included.
    #[must_use]
    pub const fn protocol_id(self) -> &'static str {
        match self {
            Self::Ping => PING_V1,
            Self::Goodbye => GOODBYE_V1,
            Self::MetaDataV1 => METADATA_V1,
            Self::MetaDataV2 => METADATA_V2,
            Self::BeaconBlocksByRangeV1 => BEACON_BLOCKS_BY_RANGE_V1,
            Self::BeaconBlocksByRangeV2 => BEACON_BLOCKS_BY_RANGE_V2,
            Self::BlobsSidecarsByRangeV1 => BLOBS_SIDECARS_BY_RANGE_V1,
        }
    }

    #[must_use]
    pub const fn protocol(self) -> StreamProtocol {
        StreamProtocol::new(self.protocol_id())
    }

    #[must_use]
    pub fn from_protocol_id(protocol_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.protocol_id() == protocol_id)
    }

    #[must_use]
    pub const fn handling(self) -> Handling {
        let (request, response) = match self {
            Self::Ping | Self::Goodbye => (RequestShape::Uint64, ResponseStrategy::SequenceNumber),
            Self::MetaDataV1 => (RequestShape::Empty, ResponseStrategy::MetaDataV1),
            Self::MetaDataV2 => (RequestShape::Empty, ResponseStrategy::MetaDataV2),
            Self::BeaconBlocksByRangeV1
            | Self::BeaconBlocksByRangeV2
            | Self::BlobsSidecarsByRangeV1 => (RequestShape::Empty, ResponseStrategy::Passthrough),
        };

        Handling { request, response }
    }

    /// Topics whose inbound streams get a synthesized answer.
    #[must_use]
    pub const fn is_control(self) -> bool {
        !matches!(self.handling().response, ResponseStrategy::Passthrough)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.protocol_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_ids() {
        assert_eq!(
            Topic::Ping.protocol_id(),
            "/eth2/beacon_chain/req/ping/1/ssz_snappy"
        );
        assert_eq!(
            Topic::MetaDataV2.protocol_id(),
            "/eth2/beacon_chain/req/metadata/2/ssz_snappy"
        );
        assert_eq!(
            Topic::BlobsSidecarsByRangeV1.protocol().as_ref(),
            "/eth2/beacon_chain/req/blobs_sidecars_by_range/1/ssz_snappy"
        );
    }

    #[test]
    fn test_lookup_by_protocol_id() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_protocol_id(topic.protocol_id()), Some(topic));
        }

        assert_eq!(Topic::from_protocol_id("/eth2/beacon_chain/req/status/1/ssz_snappy"), None);
    }

    #[test]
    fn test_control_topics() {
        let control: Vec<_> = Topic::ALL.into_iter().filter(|t| t.is_control()).collect();

        assert_eq!(
            control,
            [Topic::Ping, Topic::Goodbye, Topic::MetaDataV1, Topic::MetaDataV2]
        );
        assert_eq!(Topic::Goodbye.handling(), Topic::Ping.handling());
        assert_eq!(Topic::MetaDataV1.handling().request, RequestShape::Empty);
    }
}
