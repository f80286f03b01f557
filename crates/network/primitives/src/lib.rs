//! Wire types shared by the blobkit network client.
//!
//! Everything here speaks the consensus-layer req/resp dialect: SSZ
//! containers, compressed with Snappy framing and prefixed with their
//! uncompressed length, sent over one stream per request.

pub mod chunk;
pub mod codec;
pub mod config;
pub mod messages;
pub mod ssz;
pub mod stream;
pub mod topics;
