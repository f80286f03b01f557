use alloy::consensus::BlobTransactionSidecar;
use alloy::eips::eip4844::{Blob as SidecarBlob, Bytes48};
use alloy::network::{EthereumWallet, TransactionBuilder, TransactionBuilder4844};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use blobkit_crypto::{BlobCommitment, Kzg};
use blobkit_primitives::blobs::{encode_blobs, Blob};
use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{Result as EyreResult, WrapErr};
use tracing::{debug, info};
use url::Url;

use crate::common::{parse_calldata, parse_u128, parse_u256, read_payload};
use crate::defaults;

/// Submit an EIP-4844 transaction carrying a file as blobs
#[derive(Debug, Parser)]
pub struct TxCommand {
    /// Execution endpoint
    #[arg(long, value_name = "URL", default_value = defaults::RPC_URL)]
    #[arg(env = "BLOBCTL_RPC_URL")]
    pub rpc_url: Url,

    /// File whose contents are packed into blobs
    #[arg(long, value_name = "PATH")]
    pub blob_file: Utf8PathBuf,

    /// Recipient address
    #[arg(long, value_name = "ADDRESS")]
    pub to: Address,

    /// Amount transferred, hex or decimal
    #[arg(long, value_name = "WEI", default_value = "0x0")]
    pub value: String,

    /// Signing key, hex encoded
    #[arg(long, value_name = "HEX")]
    #[arg(env = "BLOBCTL_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    /// Transaction nonce, -1 asks the endpoint for the pending nonce
    #[arg(long, value_name = "NONCE", default_value_t = -1, allow_negative_numbers = true)]
    pub nonce: i64,

    #[arg(long, value_name = "GAS", default_value_t = defaults::GAS_LIMIT)]
    pub gas_limit: u64,

    /// Max fee per gas, defaults to the endpoint's suggested gas price
    #[arg(long, value_name = "WEI")]
    pub gas_price: Option<String>,

    #[arg(long, value_name = "WEI", default_value = defaults::PRIORITY_GAS_PRICE)]
    pub priority_gas_price: String,

    #[arg(long, value_name = "WEI", default_value = defaults::MAX_FEE_PER_BLOB_GAS)]
    pub max_fee_per_blob_gas: String,

    #[arg(long, value_name = "ID", default_value_t = defaults::CHAIN_ID)]
    pub chain_id: u64,

    /// Hex when 0x-prefixed, raw bytes otherwise
    #[arg(long, value_name = "DATA", default_value = "0x")]
    pub calldata: String,
}

/// Fee and routing fields of the transaction, parsed and validated.
#[derive(Clone, Debug)]
struct TxParams {
    to: Address,
    value: U256,
    gas_limit: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_blob_gas: u128,
    chain_id: u64,
    input: Vec<u8>,
}

impl TxCommand {
    pub async fn run(self) -> EyreResult<()> {
        let params = TxParams {
            to: self.to,
            value: parse_u256("value", &self.value)?,
            gas_limit: self.gas_limit,
            max_priority_fee_per_gas: parse_u128("priority-gas-price", &self.priority_gas_price)?,
            max_fee_per_blob_gas: parse_u128("max-fee-per-blob-gas", &self.max_fee_per_blob_gas)?,
            chain_id: self.chain_id,
            input: parse_calldata(&self.calldata)?,
        };
        let gas_price = self
            .gas_price
            .as_deref()
            .map(|price| parse_u128("gas-price", price))
            .transpose()?;

        let signer: PrivateKeySigner = self
            .private_key
            .parse()
            .wrap_err("invalid private-key")?;
        let sender = signer.address();

        let data = read_payload(&self.blob_file).await?;
        let blobs = encode_blobs(&data);

        let commitments = Kzg::ethereum()
            .commit_all(&blobs)
            .wrap_err("failed to commit to blobs")?;

        for (index, commitment) in commitments.iter().enumerate() {
            debug!(
                index,
                versioned_hash = %B256::from(commitment.versioned_hash),
                "Committed to blob"
            );
        }

        let sidecar = build_sidecar(&blobs, &commitments)?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.rpc_url.clone());

        let max_fee_per_gas = match gas_price {
            Some(price) => price,
            None => provider
                .get_gas_price()
                .await
                .wrap_err("failed to fetch the suggested gas price")?,
        };

        let nonce = match u64::try_from(self.nonce) {
            Ok(nonce) => nonce,
            Err(_) => provider
                .get_transaction_count(sender)
                .pending()
                .await
                .wrap_err("failed to fetch the pending nonce")?,
        };

        let request = build_request(&params, sidecar, &commitments, nonce, max_fee_per_gas);

        info!(
            %sender,
            nonce,
            blobs = blobs.len(),
            bytes = data.len(),
            "Submitting blob transaction"
        );

        let pending = provider
            .send_transaction(request)
            .await
            .wrap_err_with(|| format!("failed to submit transaction to {}", self.rpc_url))?;

        let hash = *pending.tx_hash();
        info!(%hash, "Transaction submitted");

        let receipt = pending
            .get_receipt()
            .await
            .wrap_err_with(|| format!("failed to await receipt of {hash}"))?;

        info!(
            nonce,
            hash = %receipt.transaction_hash,
            block = ?receipt.block_number,
            success = receipt.status(),
            "Transaction included"
        );

        Ok(())
    }
}

fn build_sidecar(
    blobs: &[Blob],
    commitments: &[BlobCommitment],
) -> EyreResult<BlobTransactionSidecar> {
    let blobs = blobs
        .iter()
        .map(|blob| SidecarBlob::try_from(blob.as_bytes()))
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("blob has an unexpected length")?;

    let (commitments, proofs) = commitments
        .iter()
        .map(|c| (Bytes48::from(c.commitment), Bytes48::from(c.proof)))
        .unzip();

    Ok(BlobTransactionSidecar::new(blobs, commitments, proofs))
}

fn build_request(
    params: &TxParams,
    sidecar: BlobTransactionSidecar,
    commitments: &[BlobCommitment],
    nonce: u64,
    max_fee_per_gas: u128,
) -> TransactionRequest {
    let mut request = TransactionRequest::default()
        .with_to(params.to)
        .with_value(params.value)
        .with_input(params.input.clone())
        .with_nonce(nonce)
        .with_chain_id(params.chain_id)
        .with_gas_limit(params.gas_limit)
        .with_max_fee_per_gas(max_fee_per_gas)
        .with_max_priority_fee_per_gas(params.max_priority_fee_per_gas)
        .with_max_fee_per_blob_gas(params.max_fee_per_blob_gas)
        .with_blob_sidecar(sidecar.into());

    request.blob_versioned_hashes = Some(
        commitments
            .iter()
            .map(|c| B256::from(c.versioned_hash))
            .collect(),
    );

    request
}
