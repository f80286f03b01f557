use core::fmt;

use blobkit_primitives::blobs::Blob;
use c_kzg::{ethereum_kzg_settings, Blob as KzgBlob, Bytes32, KzgSettings};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

pub const COMMITMENT_LEN: usize = 48;
pub const PROOF_LEN: usize = 48;
pub const SCALAR_LEN: usize = 32;

/// Length of the point evaluation precompile input:
/// `versioned_hash ‖ x ‖ y ‖ commitment ‖ proof`.
pub const POINT_EVALUATION_INPUT_LEN: usize =
    SCALAR_LEN + SCALAR_LEN + SCALAR_LEN + COMMITMENT_LEN + PROOF_LEN;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KzgError {
    #[error("blob rejected by the kzg library: {0:?}")]
    InvalidBlob(c_kzg::Error),
    #[error("failed to compute commitment: {0:?}")]
    Commitment(c_kzg::Error),
    #[error("failed to compute proof: {0:?}")]
    Proof(c_kzg::Error),
}

/// Commitment, blob proof and versioned hash of one blob, in blob order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobCommitment {
    pub commitment: [u8; COMMITMENT_LEN],
    pub proof: [u8; PROOF_LEN],
    pub versioned_hash: [u8; SCALAR_LEN],
}

/// Proof that the blob polynomial evaluates to `value` at `point`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvaluationProof {
    pub versioned_hash: [u8; SCALAR_LEN],
    pub point: [u8; SCALAR_LEN],
    pub value: [u8; SCALAR_LEN],
    pub commitment: [u8; COMMITMENT_LEN],
    pub proof: [u8; PROOF_LEN],
}

impl EvaluationProof {
    #[must_use]
    pub fn point_evaluation_input(&self) -> Vec<u8> {
        let mut input = Vec::with_capacity(POINT_EVALUATION_INPUT_LEN);
        input.extend_from_slice(&self.versioned_hash);
        input.extend_from_slice(&self.point);
        input.extend_from_slice(&self.value);
        input.extend_from_slice(&self.commitment);
        input.extend_from_slice(&self.proof);
        input
    }
}

#[derive(Clone, Copy)]
pub struct Kzg {
    settings: &'static KzgSettings,
}

impl fmt::Debug for Kzg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kzg").finish_non_exhaustive()
    }
}

impl Kzg {
    /// Uses the trusted setup of the Ethereum KZG ceremony.
    #[must_use]
    pub fn ethereum() -> Self {
        Self {
            settings: ethereum_kzg_settings(0),
        }
    }

    pub fn commit(&self, blob: &Blob) -> Result<BlobCommitment, KzgError> {
        let blob = to_kzg_blob(blob)?;

        let commitment = self
            .settings
            .blob_to_kzg_commitment(&blob)
            .map_err(KzgError::Commitment)?
            .to_bytes();

        let proof = self
            .settings
            .compute_blob_kzg_proof(&blob, &commitment)
            .map_err(KzgError::Proof)?
            .to_bytes();

        Ok(BlobCommitment {
            commitment: *commitment,
            proof: *proof,
            versioned_hash: versioned_hash(commitment.as_slice()),
        })
    }

    pub fn commit_all(&self, blobs: &[Blob]) -> Result<Vec<BlobCommitment>, KzgError> {
        blobs.iter().map(|blob| self.commit(blob)).collect()
    }

    pub fn evaluation_proof(
        &self,
        blob: &Blob,
        point: [u8; SCALAR_LEN],
    ) -> Result<EvaluationProof, KzgError> {
        let BlobCommitment {
            commitment,
            versioned_hash,
            ..
        } = self.commit(blob)?;

        let kzg_blob = to_kzg_blob(blob)?;

        let (proof, value) = self
            .settings
            .compute_kzg_proof(&kzg_blob, &Bytes32::from(point))
            .map_err(KzgError::Proof)?;

        Ok(EvaluationProof {
            versioned_hash,
            point,
            value: *value,
            commitment,
            proof: *proof.to_bytes(),
        })
    }
}

#[must_use]
pub fn versioned_hash(commitment: &[u8]) -> [u8; SCALAR_LEN] {
    let mut hash: [u8; SCALAR_LEN] = Sha256::digest(commitment).into();
    hash[0] = VERSIONED_HASH_VERSION_KZG;
    hash
}

fn to_kzg_blob(blob: &Blob) -> Result<KzgBlob, KzgError> {
    KzgBlob::from_bytes(blob.as_bytes()).map_err(KzgError::InvalidBlob)
}

#[cfg(test)]
mod tests {
    use blobkit_primitives::blobs::encode_blobs;

    use super::*;

    const POINT_AT_INFINITY: [u8; COMMITMENT_LEN] = {
        let mut bytes = [0; COMMITMENT_LEN];
        bytes[0] = 0xc0;
        bytes
    };

    #[test]
    fn test_versioned_hash_prefix() {
        let hash = versioned_hash(&[0xaa; COMMITMENT_LEN]);

        assert_eq!(hash[0], VERSIONED_HASH_VERSION_KZG);
        assert_eq!(
            hash[1..],
            Sha256::digest([0xaa; COMMITMENT_LEN])[1..],
            "remaining bytes are the sha256 digest"
        );
    }

    #[test]
    fn test_zero_blob_commits_to_infinity() {
        let kzg = Kzg::ethereum();

        let commitment = kzg.commit(&Blob::zeroed()).unwrap();

        assert_eq!(commitment.commitment, POINT_AT_INFINITY);
        assert_eq!(commitment.proof, POINT_AT_INFINITY);
        assert_eq!(
            commitment.versioned_hash,
            versioned_hash(&POINT_AT_INFINITY)
        );
    }

    #[test]
    fn test_zero_blob_evaluates_to_zero() {
        let kzg = Kzg::ethereum();

        let mut point = [0; SCALAR_LEN];
        point[SCALAR_LEN - 1] = 7;

        let proof = kzg.evaluation_proof(&Blob::zeroed(), point).unwrap();

        assert_eq!(proof.value, [0; SCALAR_LEN]);
        assert_eq!(proof.point, point);

        let input = proof.point_evaluation_input();
        assert_eq!(input.len(), POINT_EVALUATION_INPUT_LEN);
        assert_eq!(input[..SCALAR_LEN], proof.versioned_hash);
        assert_eq!(input[SCALAR_LEN..SCALAR_LEN * 2], point);
    }

    #[test]
    fn test_encoded_payload_is_accepted() {
        let kzg = Kzg::ethereum();

        let blobs = encode_blobs(&[0xff; 4096]);
        let commitments = kzg.commit_all(&blobs).unwrap();

        assert_eq!(commitments.len(), 1);
        assert_ne!(commitments[0].commitment, POINT_AT_INFINITY);
        assert_eq!(
            commitments[0].versioned_hash[0], VERSIONED_HASH_VERSION_KZG,
            "versioned hash is tagged with the kzg version"
        );
    }
}
