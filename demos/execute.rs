//! Signs and submits a call from an Ethereum controlled account using an
//! in-process key, then waits for the sequencer to accept it.

use clap::Parser;

#[cfg(feature = "local-signer")]
use starknet_eth_account::{
    adapter::StarknetAdapter,
    config::{AccountConfig, SigningScheme},
    gateway::GatewayClient,
    structs::{Call, InvocationDetails},
    url::Network,
    wallet::local::LocalWallet,
};

#[derive(Parser, Debug)]
#[command(version, about = "Execute a call through an Ethereum controlled StarkNet account", long_about = None)]
struct Args {
    /// Use a local devnet instead of Goerli
    #[arg(long, action)]
    devnet: bool,

    /// Hex-encoded Ethereum private key controlling the account
    #[arg(long)]
    ethereum_private_key: String,

    /// Sign the transaction hash with eth_sign instead of EIP-712 typed data
    #[arg(long, action)]
    raw_hash: bool,

    /// Contract to call
    #[arg(long)]
    to: String,

    #[arg(long)]
    entrypoint: String,

    /// Calldata, decimal or 0x hex
    #[arg(long, num_args = 0..)]
    calldata: Vec<String>,
}

#[cfg(not(feature = "local-signer"))]
fn main() {
    eprintln!("Rebuild with --features local-signer to run this example");
}

#[cfg(feature = "local-signer")]
#[tokio::main]
async fn main() {
    use starknet_core::types::Felt;
    use starknet_eth_account::hash::parse_felt;

    simple_logger::init_with_level(log::Level::Info).unwrap();

    let args = Args::parse();
    let network = if args.devnet {
        Network::Devnet
    } else {
        Network::Goerli
    };
    let scheme = if args.raw_hash {
        SigningScheme::TransactionHash
    } else {
        SigningScheme::TypedData
    };
    let config = AccountConfig::new(
        Felt::from_hex_unchecked("0x3530cc4759d78042f1b543bf797f5f3d647cde0388c33734cf91b7f7b9314a9"),
        Felt::from(1234u64),
        Felt::from_hex_unchecked("0x7156fb3c40b9636425931f57a87c507aa472d1b97d52859e5c68b9ba2b3570"),
        network.chain(),
    )
    .with_signing_scheme(scheme);

    let wallet = LocalWallet::from_private_key(args.ethereum_private_key.trim())
        .expect("invalid private key");
    let adapter = StarknetAdapter::new(config, wallet, GatewayClient::new(network));
    let accounts = adapter.connect().await.expect("wallet refused to connect");
    let account = accounts.first().expect("wallet exposed no account");
    log::info!(
        "{} controls {}",
        account.eth_address(),
        account.starknet_address().to_hex_string()
    );

    if !account.is_deployed().await.expect("failed to query account code") {
        log::warn!("account is not deployed yet, deploy it first");
        return;
    }

    let calldata = args
        .calldata
        .iter()
        .map(|value| parse_felt(value))
        .collect::<Result<Vec<_>, _>>()
        .expect("invalid calldata");
    let call = Call::new(parse_felt(&args.to).expect("invalid contract"), &args.entrypoint, calldata)
        .expect("invalid entrypoint");

    let response = account
        .execute(&[call], InvocationDetails::default())
        .await
        .expect("failed to submit transaction");
    log::info!("submitted {}", response.transaction_hash.to_hex_string());

    let status = account
        .wait_for_transaction(response.transaction_hash)
        .await
        .expect("transaction did not go through");
    log::info!("final status {:?}", status.tx_status);
}
