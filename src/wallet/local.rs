use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use log::debug;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::address::parse_eth_address;
use crate::error::{Error, Result, UNRECOGNIZED_CHAIN};
use crate::typed_data::parse_typed_data;
use crate::wallet::SigningOracle;

/// Wallet code for a request naming an account the wallet does not control.
const UNAUTHORIZED: i32 = 4100;
/// Wallet code for a method the wallet does not implement.
const UNSUPPORTED_METHOD: i32 = 4200;
/// JSON-RPC invalid params.
const INVALID_PARAMS: i32 = -32602;

#[derive(Debug)]
struct ChainState {
    current: String,
    known: BTreeSet<String>,
}

/// In-process wallet holding a secp256k1 key.
///
/// Answers the same requests a browser wallet would, including the chain
/// switching handshake, so it stands in for one in scripts and tests.
#[derive(Clone, Debug)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    chains: Arc<RwLock<ChainState>>,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            chains: Arc::new(RwLock::new(ChainState {
                current: "0x1".into(),
                known: BTreeSet::from(["0x1".to_string()]),
            })),
        }
    }

    pub fn from_private_key(private_key_hex: &str) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self::new(signer))
    }

    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Chain id (`0x` hex) the wallet is currently on.
    pub async fn current_chain(&self) -> String {
        self.chains.read().await.current.clone()
    }

    fn sign_prehash(&self, hash: &B256) -> Result<Value> {
        let signature = self
            .signer
            .sign_hash_sync(hash)
            .map_err(|e| Error::from_wallet(-32603, e.to_string()))?;
        Ok(json!(format!(
            "0x{}",
            alloy_primitives::hex::encode(signature.as_bytes())
        )))
    }

    fn check_account(&self, params: &[Value]) -> Result<()> {
        let requested = params
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| Error::from_wallet(INVALID_PARAMS, "missing account"))?;
        let requested = parse_eth_address(requested)?;
        if requested != self.address() {
            return Err(Error::from_wallet(
                UNAUTHORIZED,
                format!("account {requested} is not managed by this wallet"),
            ));
        }
        Ok(())
    }

    fn sign_typed_data(&self, params: &[Value]) -> Result<Value> {
        self.check_account(params)?;
        let typed_data = params
            .get(1)
            .ok_or_else(|| Error::from_wallet(INVALID_PARAMS, "missing typed data"))
            .and_then(|typed_data| {
                parse_typed_data(typed_data)
                    .map_err(|e| Error::from_wallet(INVALID_PARAMS, e.to_string()))
            })?;
        let hash = typed_data
            .eip712_signing_hash()
            .map_err(|e| Error::TypedDataError(e.to_string()))?;
        debug!("signing typed data hash {hash}");
        self.sign_prehash(&hash)
    }

    /// `eth_sign` here signs the 32 bytes as given, without the personal
    /// message prefix, matching what the account contract verifies.
    fn sign_raw(&self, params: &[Value]) -> Result<Value> {
        self.check_account(params)?;
        let data = params
            .get(1)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::from_wallet(INVALID_PARAMS, "missing data"))?;
        let bytes = alloy_primitives::hex::decode(data.strip_prefix("0x").unwrap_or(data))
            .map_err(|e| Error::from_wallet(INVALID_PARAMS, e.to_string()))?;
        if bytes.len() != 32 {
            return Err(Error::from_wallet(
                INVALID_PARAMS,
                format!("expected a 32 byte hash, got {} bytes", bytes.len()),
            ));
        }
        self.sign_prehash(&B256::from_slice(&bytes))
    }

    async fn switch_chain(&self, params: &[Value]) -> Result<Value> {
        let chain_id = chain_id_param(params)?;
        let mut chains = self.chains.write().await;
        if !chains.known.contains(&chain_id) {
            return Err(Error::from_wallet(
                UNRECOGNIZED_CHAIN,
                format!("Unrecognized chain ID {chain_id}"),
            ));
        }
        chains.current = chain_id;
        Ok(Value::Null)
    }

    async fn add_chain(&self, params: &[Value]) -> Result<Value> {
        let chain_id = chain_id_param(params)?;
        self.chains.write().await.known.insert(chain_id);
        Ok(Value::Null)
    }
}

fn chain_id_param(params: &[Value]) -> Result<String> {
    params
        .first()
        .and_then(|param| param.get("chainId"))
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .ok_or_else(|| Error::from_wallet(INVALID_PARAMS, "missing chainId"))
}

impl SigningOracle for LocalWallet {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        match method {
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.address().to_string()])),
            "eth_signTypedData_v4" => self.sign_typed_data(&params),
            "eth_sign" => self.sign_raw(&params),
            "wallet_switchEthereumChain" => self.switch_chain(&params).await,
            "wallet_addEthereumChain" => self.add_chain(&params).await,
            _ => Err(Error::from_wallet(
                UNSUPPORTED_METHOD,
                format!("{method} is not supported"),
            )),
        }
    }
}
