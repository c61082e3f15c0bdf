use std::str::FromStr;

use alloy_primitives::Address;
use starknet_core::{types::Felt, utils::get_contract_address};

use crate::config::AccountConfig;
use crate::error::{Error, Result};
use crate::hash::selector;

/// Parse an Ethereum address. Requires `0x` followed by 40 hex digits, the
/// checksum casing is not checked.
pub fn parse_eth_address(value: &str) -> Result<Address> {
    let hex = value
        .strip_prefix("0x")
        .ok_or_else(|| Error::InvalidAddress(value.to_string()))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidAddress(value.to_string()));
    }
    Address::from_str(value).map_err(|e| Error::InvalidAddress(format!("{value}: {e}")))
}

pub fn eth_address_felt(address: &Address) -> Felt {
    Felt::from_bytes_be_slice(address.as_slice())
}

/// Constructor calldata of the account proxy:
/// `[implementation, selector(initializer), 2, eth_address, chain_id]`, or
/// `[implementation, selector(initializer), 1, eth_address]` without chain binding.
///
/// Both the address derivation and the DEPLOY transaction use this, any other
/// encoding yields an address the deployed contract never occupies.
pub fn constructor_arguments(eth_address: &Address, config: &AccountConfig) -> Result<Vec<Felt>> {
    let mut arguments = vec![
        config.implementation_address,
        selector(config.initializer.clone())?,
    ];
    if config.bind_chain_id {
        arguments.extend([Felt::TWO, eth_address_felt(eth_address), config.chain.felt()?]);
    } else {
        arguments.extend([Felt::ONE, eth_address_felt(eth_address)]);
    }
    Ok(arguments)
}

/// Address of a contract deployed without a deployer (the legacy DEPLOY
/// transaction), i.e. with caller address zero. The result is reduced below
/// `2^251 - 256`.
pub fn contract_address(salt: Felt, class_hash: Felt, constructor_arguments: &[Felt]) -> Felt {
    get_contract_address(salt, class_hash, constructor_arguments, Felt::ZERO)
}

/// StarkNet account address controlled by `eth_address`.
pub fn derive_address(eth_address: &str, config: &AccountConfig) -> Result<Felt> {
    let address = parse_eth_address(eth_address)?;
    derive_address_from(&address, config)
}

pub fn derive_address_from(eth_address: &Address, config: &AccountConfig) -> Result<Felt> {
    let arguments = constructor_arguments(eth_address, config)?;
    Ok(contract_address(
        config.contract_address_salt,
        config.contract_class_hash,
        &arguments,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Chain;

    const ETH_ADDRESS: &str = "0x7fc37b5571e7128db2cfa7714edaa4e9bedf0883";

    fn config() -> AccountConfig {
        AccountConfig::new(
            Felt::from_hex_unchecked(
                "0x3530cc4759d78042f1b543bf797f5f3d647cde0388c33734cf91b7f7b9314a9",
            ),
            Felt::from(1234u64),
            Felt::from_hex_unchecked(
                "0x7156fb3c40b9636425931f57a87c507aa472d1b97d52859e5c68b9ba2b3570",
            ),
            Chain::short_string("SN_GOERLI").unwrap(),
        )
    }

    #[test]
    fn test_derive_address_recorded_vectors() {
        let config = config();
        assert_eq!(
            derive_address(ETH_ADDRESS, &config).unwrap(),
            Felt::from_hex_unchecked(
                "0xc2b849638da8eb006f47e4625945977489f7808d7888d8ed36390db4e6c76f"
            )
        );
        assert_eq!(
            derive_address(ETH_ADDRESS, &config.clone().without_chain_binding()).unwrap(),
            Felt::from_hex_unchecked(
                "0x7aa064be311af647ea8d7d2a4f22ed76a8327b98cde7f3d9aa8e56ebd1828b9"
            )
        );

        let mut mainnet = config;
        mainnet.chain = Chain::short_string("SN_MAIN").unwrap();
        assert_eq!(
            derive_address(ETH_ADDRESS, &mainnet).unwrap(),
            Felt::from_hex_unchecked(
                "0x7986d3b08742bd8239fad34e3ac2134b6f8cbf1f721fdfb6e63e8490bd7d316"
            )
        );
    }

    #[test]
    fn test_contract_address_of_empty_constructor() {
        let config = config();
        assert_eq!(
            contract_address(config.contract_address_salt, config.contract_class_hash, &[]),
            Felt::from_hex_unchecked(
                "0x10f5838b2694cd7b7ff9b4c151d1314aaae6ac72b632a1e82061865e5afa057"
            )
        );
    }

    #[test]
    fn test_constructor_arguments_layout() {
        let config = config();
        let eth_address = parse_eth_address(ETH_ADDRESS).unwrap();
        assert_eq!(
            constructor_arguments(&eth_address, &config).unwrap(),
            vec![
                config.implementation_address,
                Felt::from_hex_unchecked(
                    "0x2dd76e7ad84dbed81c314ffe5e7a7cacfb8f4836f01af4e913f275f89a3de1a"
                ),
                Felt::TWO,
                Felt::from_hex_unchecked(ETH_ADDRESS),
                Felt::from_hex_unchecked("0x534e5f474f45524c49"),
            ]
        );

        let unbound = config.without_chain_binding();
        assert_eq!(
            constructor_arguments(&eth_address, &unbound).unwrap(),
            vec![
                unbound.implementation_address,
                selector("initializer".into()).unwrap(),
                Felt::ONE,
                Felt::from_hex_unchecked(ETH_ADDRESS),
            ]
        );
    }

    #[test]
    fn test_derive_address_is_deterministic_and_sensitive() {
        let config = config();
        let address = derive_address(ETH_ADDRESS, &config).unwrap();
        assert_eq!(address, derive_address(ETH_ADDRESS, &config).unwrap());

        // one bit flipped in the last byte
        let other = derive_address("0x7fc37b5571e7128db2cfa7714edaa4e9bedf0882", &config).unwrap();
        assert_ne!(address, other);

        let mut salted = config.clone();
        salted.contract_address_salt = Felt::from(1235u64);
        assert_ne!(address, derive_address(ETH_ADDRESS, &salted).unwrap());

        let mut other_chain = config.clone();
        other_chain.chain = Chain::short_string("SN_MAIN").unwrap();
        assert_ne!(address, derive_address(ETH_ADDRESS, &other_chain).unwrap());

        let mut other_implementation = config.clone();
        other_implementation.implementation_address = Felt::ONE;
        assert_ne!(address, derive_address(ETH_ADDRESS, &other_implementation).unwrap());

        assert_ne!(
            address,
            derive_address(ETH_ADDRESS, &config.clone().without_chain_binding()).unwrap()
        );
    }

    #[test]
    fn test_checksum_casing_is_ignored() {
        let config = config();
        assert_eq!(
            derive_address("0x7FC37b5571e7128DB2CfA7714eDAA4e9Bedf0883", &config).unwrap(),
            derive_address(ETH_ADDRESS, &config).unwrap()
        );
    }

    #[test]
    fn test_invalid_addresses() {
        let config = config();
        for input in [
            "",
            "0x",
            "7fc37b5571e7128db2cfa7714edaa4e9bedf0883",
            "0x7fc37b5571e7128db2cfa7714edaa4e9bedf088",
            "0x7fc37b5571e7128db2cfa7714edaa4e9bedf08831",
            "0x7fc37b5571e7128db2cfa7714edaa4e9bedf088g",
        ] {
            assert!(matches!(
                derive_address(input, &config),
                Err(Error::InvalidAddress(_))
            ));
        }
    }
}
