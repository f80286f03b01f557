use std::process::ExitCode;

use blobkit_network::errors::NetworkError;
use clap::{Parser, Subcommand};
use const_format::concatcp;
use eyre::Report as EyreReport;
use thiserror::Error as ThisError;

mod download;
mod proof;
mod tx;

use download::DownloadCommand;
use proof::ProofCommand;
use tx::TxCommand;

pub const EXAMPLES: &str = r"
  # Submit a blob transaction carrying a file
  $ blobctl tx --blob-file payload.bin --to 0x000000000000000000000000000000000000dEaD \
      --private-key $KEY

  # Fetch the blobs of slot 42 from a local beacon node
  $ blobctl download --slot 42 > payload.bin

  # Prove the first blob of a file at a point
  $ blobctl proof --blob-file payload.bin --blob-index 0 \
      --input-point 0000000000000000000000000000000000000000000000000000000000000001
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = concatcp!(
    "Environment variables:\n",
    "  BLOBCTL_RPC_URL        Execution endpoint used by `tx`\n",
    "  BLOBCTL_PRIVATE_KEY    Signing key used by `tx`\n",
    "  RUST_LOG               Log directives, logs go to stderr\n\n",
    "Examples:",
    EXAMPLES
))]
pub struct RootCommand {
    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    Tx(TxCommand),
    Download(DownloadCommand),
    Proof(ProofCommand),
}

impl RootCommand {
    pub async fn run(self) -> Result<(), CliError> {
        let result = match self.action {
            SubCommands::Tx(tx) => tx.run().await,
            SubCommands::Download(download) => download.run().await,
            SubCommands::Proof(proof) => proof.run().await,
        };

        result.map_err(CliError::from)
    }
}

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("interrupted")]
    Cancelled,

    #[error(transparent)]
    Other(EyreReport),
}

impl From<EyreReport> for CliError {
    fn from(report: EyreReport) -> Self {
        match report.downcast_ref::<NetworkError>() {
            Some(NetworkError::Cancelled) => Self::Cancelled,
            _ => Self::Other(report),
        }
    }
}

impl From<CliError> for ExitCode {
    fn from(error: CliError) -> Self {
        match error {
            CliError::Cancelled => Self::from(130),
            CliError::Other(_) => Self::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use eyre::eyre;

    use super::*;

    #[test]
    fn test_command_definition() {
        RootCommand::command().debug_assert();
    }

    #[test]
    fn test_cancellation_is_recognised_through_context() {
        let report = EyreReport::new(NetworkError::Cancelled).wrap_err("Download failed");

        assert!(matches!(CliError::from(report), CliError::Cancelled));
    }

    #[test]
    fn test_other_failures() {
        let err = CliError::from(eyre!("boom"));

        assert!(matches!(err, CliError::Other(_)));
    }
}
