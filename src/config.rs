use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use starknet_core::types::Felt;
use starknet_core::utils::parse_cairo_short_string;

use crate::error::{Error, Result};
use crate::hash::short_string;
use crate::structs::EthereumChain;

/// StarkNet chain id in one of the two encodings found on deployed verifiers:
/// a small integer or a short-string packed felt such as `SN_GOERLI`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainId {
    Numeric(u64),
    ShortString(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chain {
    pub id: ChainId,
    /// Display name, also the EIP-712 domain name.
    pub name: String,
}

impl Chain {
    pub fn new(id: ChainId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Numeric chain ids with a well known display name.
    pub fn numeric(id: u64) -> Result<Self> {
        let name = match id {
            1 => "SN_MAINNET",
            5 => "SN_GOERLI",
            _ => {
                return Err(Error::InvalidInput(format!(
                    "no display name known for chain id {id}"
                )));
            }
        };
        Ok(Self::new(ChainId::Numeric(id), name))
    }

    pub fn short_string(id: &str) -> Result<Self> {
        short_string(id)?;
        Ok(Self::new(ChainId::ShortString(id.to_string()), id))
    }

    /// Decode a short-string packed chain id felt.
    pub fn from_felt(id: Felt) -> Result<Self> {
        let decoded =
            parse_cairo_short_string(&id).map_err(|e| Error::InvalidInput(e.to_string()))?;
        Self::short_string(&decoded)
    }

    pub fn felt(&self) -> Result<Felt> {
        match &self.id {
            ChainId::Numeric(id) => Ok(Felt::from(*id)),
            ChainId::ShortString(id) => short_string(id),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Which bytes the Ethereum wallet is asked to sign. Signatures from one scheme
/// never verify under the other; the account contract decides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningScheme {
    /// `eth_signTypedData_v4` over the `Payload` typed data.
    #[default]
    TypedData,
    /// `eth_sign` over the StarkNet invoke transaction hash.
    TransactionHash,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            timeout_ms: 600_000,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_initializer() -> String {
    "initializer".into()
}

fn default_true() -> bool {
    true
}

fn default_transaction_version() -> Felt {
    Felt::ZERO
}

fn default_fee_overhead() -> Decimal {
    Decimal::new(5, 1)
}

/// Deployment parameters of the account proxy plus signing behaviour.
///
/// Immutable once built; accounts share it behind an `Arc`.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde_as(as = "DisplayFromStr")]
    pub contract_class_hash: Felt,
    #[serde_as(as = "DisplayFromStr")]
    pub contract_address_salt: Felt,
    #[serde_as(as = "DisplayFromStr")]
    pub implementation_address: Felt,
    pub chain: Chain,
    #[serde(default)]
    pub signing_scheme: SigningScheme,
    /// Entry point the proxy constructor forwards to on the implementation.
    #[serde(default = "default_initializer")]
    pub initializer: String,
    /// Append the chain id to the constructor arguments.
    #[serde(default = "default_true")]
    pub bind_chain_id: bool,
    /// `chainId` of the EIP-712 domain, omitted from the domain when `None`.
    #[serde(default)]
    pub domain_chain_id: Option<u64>,
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_transaction_version")]
    pub transaction_version: Felt,
    /// Fraction added on top of a fee estimate, `0.5` gives `max_fee = 1.5 * estimate`.
    #[serde(default = "default_fee_overhead")]
    pub fee_overhead: Decimal,
    #[serde(default)]
    pub polling: PollingConfig,
    /// Chain the wallet is switched to before accounts are requested.
    #[serde(default)]
    pub wallet_chain: Option<EthereumChain>,
}

impl AccountConfig {
    pub fn new(
        contract_class_hash: Felt,
        contract_address_salt: Felt,
        implementation_address: Felt,
        chain: Chain,
    ) -> Self {
        Self {
            contract_class_hash,
            contract_address_salt,
            implementation_address,
            chain,
            signing_scheme: SigningScheme::default(),
            initializer: default_initializer(),
            bind_chain_id: true,
            domain_chain_id: None,
            transaction_version: default_transaction_version(),
            fee_overhead: default_fee_overhead(),
            polling: PollingConfig::default(),
            wallet_chain: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    pub fn with_signing_scheme(mut self, signing_scheme: SigningScheme) -> Self {
        self.signing_scheme = signing_scheme;
        self
    }

    pub fn with_fee_overhead(mut self, fee_overhead: Decimal) -> Self {
        self.fee_overhead = fee_overhead;
        self
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_domain_chain_id(mut self, chain_id: u64) -> Self {
        self.domain_chain_id = Some(chain_id);
        self
    }

    pub fn with_wallet_chain(mut self, wallet_chain: EthereumChain) -> Self {
        self.wallet_chain = Some(wallet_chain);
        self
    }

    pub fn without_chain_binding(mut self) -> Self {
        self.bind_chain_id = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_encodings() {
        let numeric = Chain::numeric(5).unwrap();
        assert_eq!(numeric.felt().unwrap(), Felt::from(5u64));
        assert_eq!(numeric.name(), "SN_GOERLI");

        let short = Chain::short_string("SN_GOERLI").unwrap();
        assert_eq!(short.felt().unwrap(), Felt::from_hex_unchecked("0x534e5f474f45524c49"));
        assert_eq!(short.name(), "SN_GOERLI");

        let decoded = Chain::from_felt(Felt::from_hex_unchecked("0x534e5f4d41494e")).unwrap();
        assert_eq!(decoded.id, ChainId::ShortString("SN_MAIN".into()));
        assert_eq!(decoded.name(), "SN_MAIN");
    }

    #[test]
    fn test_unknown_numeric_chain() {
        assert!(matches!(Chain::numeric(11), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let config = AccountConfig::from_json(
            r#"{
                "contract_class_hash": "0x1234",
                "contract_address_salt": "42",
                "implementation_address": "0xabc",
                "chain": {"id": "SN_GOERLI", "name": "SN_GOERLI"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.contract_class_hash, Felt::from(0x1234u64));
        assert_eq!(config.contract_address_salt, Felt::from(42u64));
        assert_eq!(config.chain.id, ChainId::ShortString("SN_GOERLI".into()));
        assert_eq!(config.signing_scheme, SigningScheme::TypedData);
        assert_eq!(config.initializer, "initializer");
        assert!(config.bind_chain_id);
        assert_eq!(config.domain_chain_id, None);
        assert_eq!(config.transaction_version, Felt::ZERO);
        assert_eq!(config.fee_overhead, Decimal::new(5, 1));
        assert_eq!(config.polling, PollingConfig::default());
    }

    #[test]
    fn test_config_from_json_overrides() {
        let config = AccountConfig::from_json(
            r#"{
                "contract_class_hash": "1",
                "contract_address_salt": "2",
                "implementation_address": "3",
                "chain": {"id": 5, "name": "SN_GOERLI"},
                "signing_scheme": "transaction_hash",
                "bind_chain_id": false,
                "polling": {"interval_ms": 10, "timeout_ms": 100}
            }"#,
        )
        .unwrap();
        assert_eq!(config.chain.id, ChainId::Numeric(5));
        assert_eq!(config.signing_scheme, SigningScheme::TransactionHash);
        assert!(!config.bind_chain_id);
        assert_eq!(config.polling.interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_config_rejects_bad_felt() {
        let result = AccountConfig::from_json(
            r#"{
                "contract_class_hash": "not a number",
                "contract_address_salt": "2",
                "implementation_address": "3",
                "chain": {"id": 5, "name": "SN_GOERLI"}
            }"#,
        );
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }
}
