//! Prints the StarkNet account address an Ethereum address controls, along with
//! the proxy constructor arguments used to deploy it.

use clap::Parser;
use log::info;
use starknet_core::types::Felt;
use starknet_eth_account::{
    address::{constructor_arguments, derive_address, parse_eth_address},
    config::{AccountConfig, Chain},
};

#[derive(Parser, Debug)]
#[command(version, about = "Derive the StarkNet account address of an Ethereum address", long_about = None)]
struct Args {
    /// Ethereum address controlling the account (0x + 40 hex digits)
    #[arg(long)]
    eth_address: String,

    /// Class hash of the account proxy
    #[arg(long, default_value = "0x3530cc4759d78042f1b543bf797f5f3d647cde0388c33734cf91b7f7b9314a9")]
    class_hash: String,

    /// Implementation the proxy forwards to
    #[arg(long, default_value = "0x7156fb3c40b9636425931f57a87c507aa472d1b97d52859e5c68b9ba2b3570")]
    implementation: String,

    #[arg(long, default_value = "1234")]
    salt: String,

    /// Short string chain id, e.g. SN_GOERLI or SN_MAIN
    #[arg(long, default_value = "SN_GOERLI")]
    chain: String,

    /// Leave the chain id out of the constructor arguments
    #[arg(long, action)]
    unbound: bool,
}

fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap();

    let args = Args::parse();
    let mut config = AccountConfig::new(
        Felt::from_hex(&args.class_hash).expect("invalid class hash"),
        Felt::from_dec_str(&args.salt)
            .or_else(|_| Felt::from_hex(&args.salt))
            .expect("invalid salt"),
        Felt::from_hex(&args.implementation).expect("invalid implementation"),
        Chain::short_string(&args.chain).expect("invalid chain"),
    );
    if args.unbound {
        config = config.without_chain_binding();
    }

    let eth_address = parse_eth_address(&args.eth_address).expect("invalid Ethereum address");
    let arguments = constructor_arguments(&eth_address, &config).unwrap();
    info!(
        "constructor arguments {:?}",
        arguments.iter().map(|felt| felt.to_hex_string()).collect::<Vec<_>>()
    );
    info!(
        "account address {}",
        derive_address(&args.eth_address, &config)
            .unwrap()
            .to_hex_string()
    );
}
