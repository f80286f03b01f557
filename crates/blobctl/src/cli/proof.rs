use blobkit_crypto::{EvaluationProof, Kzg};
use blobkit_primitives::blobs::encode_blobs;
use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use tracing::info;

use crate::common::{parse_hex32, read_payload};

/// Compute a point-evaluation proof for one blob of a file
#[derive(Debug, Parser)]
pub struct ProofCommand {
    /// File whose contents are packed into blobs
    #[arg(long, value_name = "PATH")]
    pub blob_file: Utf8PathBuf,

    /// Index of the blob to prove
    #[arg(long, value_name = "INDEX")]
    pub blob_index: usize,

    /// Evaluation point, 32 bytes as 64 hex characters
    #[arg(long, value_name = "HEX")]
    pub input_point: String,
}

impl ProofCommand {
    pub async fn run(self) -> EyreResult<()> {
        let point = parse_hex32("input-point", &self.input_point)?;

        let data = read_payload(&self.blob_file).await?;
        let blobs = encode_blobs(&data);

        let Some(blob) = blobs.get(self.blob_index) else {
            bail!(
                "blob index {} out of range, {} packs into {} blob(s)",
                self.blob_index,
                self.blob_file,
                blobs.len()
            );
        };

        let proof = Kzg::ethereum()
            .evaluation_proof(blob, point)
            .wrap_err_with(|| format!("failed to prove blob {}", self.blob_index))?;

        info!(index = self.blob_index, "Computed evaluation proof");

        println!("{}", render(&proof));

        Ok(())
    }
}

fn render(proof: &EvaluationProof) -> String {
    [
        ("versionedHash", hex::encode(proof.versioned_hash)),
        ("x", hex::encode(proof.point)),
        ("y", hex::encode(proof.value)),
        ("commitment", hex::encode(proof.commitment)),
        ("proof", hex::encode(proof.proof)),
        ("pointEvalInput", hex::encode(proof.point_evaluation_input())),
    ]
    .iter()
    .map(|(label, value)| format!("{label}: {value}"))
    .collect::<Vec<_>>()
    .join("\n")
}
