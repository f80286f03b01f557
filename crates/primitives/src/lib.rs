//! Blob layout shared by every blobkit crate.
//!
//! A blob is the fixed-size data-availability unit of the network:
//! [`FIELD_ELEMENTS_PER_BLOB`] field elements of [`BYTES_PER_FIELD_ELEMENT`]
//! bytes each. The [`blobs`] module packs arbitrary payloads into blobs and
//! unpacks them again.

pub mod blobs;
