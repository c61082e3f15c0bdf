use std::future::Future;
use std::sync::Arc;

use alloy_primitives::Address;
use log::{debug, info};
use serde_json::{Value, json};
use starknet_core::types::Felt;

use crate::address::parse_eth_address;
use crate::error::{Error, Result};
use crate::hash::felt_to_padded_hex;
use crate::structs::EthereumChain;
use crate::typed_data::TypedDataDocument;

#[cfg(feature = "local-signer")]
pub mod local;
pub mod rpc;

/// Anything that answers EIP-1193 style wallet requests.
///
/// Errors carrying wallet code 4001 must surface as [`Error::SigningRejected`];
/// [`Error::from_wallet`] does that mapping.
pub trait SigningOracle: Send + Sync {
    fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Value>> + Send;
}

impl<T: SigningOracle> SigningOracle for Arc<T> {
    fn request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<Value>> + Send {
        (**self).request(method, params)
    }
}

/// Typed helpers over a [`SigningOracle`]. Cheap to clone when the oracle is.
#[derive(Clone, Debug)]
pub struct Wallet<O> {
    oracle: O,
}

impl<O: SigningOracle> Wallet<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Accounts already exposed to the caller (`eth_accounts`).
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let result = self.oracle.request("eth_accounts", vec![]).await?;
        parse_accounts(result)
    }

    /// Ask the user to expose accounts (`eth_requestAccounts`).
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        let result = self.oracle.request("eth_requestAccounts", vec![]).await?;
        parse_accounts(result)
    }

    pub async fn primary_account(&self) -> Result<Address> {
        self.accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoAccountAvailable)
    }

    /// `eth_signTypedData_v4`, returns the `0x` hex signature.
    pub async fn sign_typed_data(
        &self,
        address: &Address,
        document: &TypedDataDocument,
    ) -> Result<String> {
        debug!("requesting typed data signature from {address}");
        let result = self
            .oracle
            .request(
                "eth_signTypedData_v4",
                vec![json!(address.to_string()), json!(document.to_json_string()?)],
            )
            .await?;
        expect_string("eth_signTypedData_v4", result)
    }

    /// `eth_sign` over a 32 byte hash, returns the `0x` hex signature.
    pub async fn sign_hash(&self, address: &Address, hash: &Felt) -> Result<String> {
        debug!("requesting raw hash signature from {address}");
        let result = self
            .oracle
            .request(
                "eth_sign",
                vec![json!(address.to_string()), json!(felt_to_padded_hex(hash))],
            )
            .await?;
        expect_string("eth_sign", result)
    }

    pub async fn encryption_public_key(&self, address: &Address) -> Result<String> {
        let result = self
            .oracle
            .request("eth_getEncryptionPublicKey", vec![json!(address.to_string())])
            .await?;
        expect_string("eth_getEncryptionPublicKey", result)
    }

    pub async fn switch_chain(&self, chain_id: &str) -> Result<()> {
        self.oracle
            .request(
                "wallet_switchEthereumChain",
                vec![json!({ "chainId": chain_id })],
            )
            .await
            .map(|_| ())
    }

    pub async fn add_chain(&self, chain: &EthereumChain) -> Result<()> {
        let chain = serde_json::to_value(chain).map_err(|e| Error::InvalidInput(e.to_string()))?;
        self.oracle
            .request("wallet_addEthereumChain", vec![chain])
            .await
            .map(|_| ())
    }

    /// Switch the wallet to `chain`. A wallet that does not know the chain
    /// (code 4902) gets it added, then the switch is retried once.
    pub async fn ensure_chain(&self, chain: &EthereumChain) -> Result<()> {
        match self.switch_chain(&chain.chain_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                info!("wallet does not know chain {}, adding it", chain.chain_id);
                self.add_chain(chain).await?;
                self.switch_chain(&chain.chain_id)
                    .await
                    .map_err(|e| match e {
                        Error::SigningRejected(_) => e,
                        other => Error::ChainMismatch(format!("{}: {other}", chain.chain_id)),
                    })
            }
            Err(e) => Err(e),
        }
    }
}

fn parse_accounts(result: Value) -> Result<Vec<Address>> {
    let accounts = result.as_array().ok_or_else(|| {
        Error::DeserializationError(format!("expected an account list, got {result}"))
    })?;
    accounts
        .iter()
        .map(|account| {
            account
                .as_str()
                .ok_or_else(|| Error::InvalidAddress(account.to_string()))
                .and_then(parse_eth_address)
        })
        .collect()
}

fn expect_string(method: &str, result: Value) -> Result<String> {
    match result {
        Value::String(value) => Ok(value),
        other => Err(Error::DeserializationError(format!(
            "{method} returned {other}, expected a string"
        ))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{UNRECOGNIZED_CHAIN, USER_REJECTED_REQUEST};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned answers and records every request.
    #[derive(Default)]
    pub(crate) struct ScriptedOracle {
        pub answers: Mutex<VecDeque<Result<Value>>>,
        pub requests: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl ScriptedOracle {
        pub fn new(answers: Vec<Result<Value>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                requests: Mutex::new(vec![]),
            }
        }

        pub fn methods(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(method, _)| method.clone())
                .collect()
        }
    }

    impl SigningOracle for ScriptedOracle {
        async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::Unsupported(format!("unscripted {method}"))))
        }
    }

    fn chain() -> EthereumChain {
        EthereumChain {
            chain_id: "0xb".into(),
            chain_name: "Starknet".into(),
            rpc_urls: vec!["http://127.0.0.1:8545".into()],
        }
    }

    #[tokio::test]
    async fn test_accounts_are_parsed() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![Ok(json!([
            "0x7fc37b5571e7128db2cfa7714edaa4e9bedf0883"
        ]))]));
        let account = wallet.primary_account().await.unwrap();
        assert_eq!(
            account,
            parse_eth_address("0x7fc37b5571e7128db2cfa7714edaa4e9bedf0883").unwrap()
        );
        assert_eq!(wallet.oracle().methods(), vec!["eth_accounts"]);
    }

    #[tokio::test]
    async fn test_no_account_available() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![Ok(json!([]))]));
        assert_eq!(
            wallet.primary_account().await,
            Err(Error::NoAccountAvailable)
        );
    }

    #[tokio::test]
    async fn test_malformed_account_is_rejected() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![Ok(json!(["0x1234"]))]));
        assert!(matches!(
            wallet.request_accounts().await,
            Err(Error::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_hash_pads_to_32_bytes() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![Ok(json!("0xsig"))]));
        let address = parse_eth_address("0x7fc37b5571e7128db2cfa7714edaa4e9bedf0883").unwrap();
        let signature = wallet.sign_hash(&address, &Felt::from(255u64)).await.unwrap();
        assert_eq!(signature, "0xsig");

        let requests = wallet.oracle().requests.lock().unwrap();
        let (method, params) = &requests[0];
        assert_eq!(method, "eth_sign");
        assert_eq!(params[1], json!(format!("0x{}ff", "0".repeat(62))));
    }

    #[tokio::test]
    async fn test_non_string_signature_is_rejected() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![Ok(json!({"r": 1}))]));
        let address = parse_eth_address("0x7fc37b5571e7128db2cfa7714edaa4e9bedf0883").unwrap();
        assert!(matches!(
            wallet.sign_hash(&address, &Felt::ONE).await,
            Err(Error::DeserializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_chain_known() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![Ok(Value::Null)]));
        wallet.ensure_chain(&chain()).await.unwrap();
        assert_eq!(wallet.oracle().methods(), vec!["wallet_switchEthereumChain"]);
    }

    #[tokio::test]
    async fn test_ensure_chain_adds_unknown_chain_and_retries_once() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![
            Err(Error::from_wallet(UNRECOGNIZED_CHAIN, "unknown chain")),
            Ok(Value::Null),
            Ok(Value::Null),
        ]));
        wallet.ensure_chain(&chain()).await.unwrap();
        assert_eq!(
            wallet.oracle().methods(),
            vec![
                "wallet_switchEthereumChain",
                "wallet_addEthereumChain",
                "wallet_switchEthereumChain"
            ]
        );
        let requests = wallet.oracle().requests.lock().unwrap();
        assert_eq!(requests[1].1[0]["chainName"], json!("Starknet"));
    }

    #[tokio::test]
    async fn test_ensure_chain_second_failure_is_mismatch() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![
            Err(Error::from_wallet(UNRECOGNIZED_CHAIN, "unknown chain")),
            Ok(Value::Null),
            Err(Error::from_wallet(UNRECOGNIZED_CHAIN, "still unknown")),
        ]));
        assert!(matches!(
            wallet.ensure_chain(&chain()).await,
            Err(Error::ChainMismatch(_))
        ));
        assert_eq!(wallet.oracle().methods().len(), 3);
    }

    #[tokio::test]
    async fn test_ensure_chain_rejection_is_not_retried() {
        let wallet = Wallet::new(ScriptedOracle::new(vec![Err(Error::from_wallet(
            USER_REJECTED_REQUEST,
            "User rejected the request.",
        ))]));
        assert_eq!(
            wallet.ensure_chain(&chain()).await,
            Err(Error::SigningRejected("User rejected the request.".into()))
        );
        assert_eq!(wallet.oracle().methods().len(), 1);
    }
}
