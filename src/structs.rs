use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use starknet_core::serde::unsigned_field_element::{UfeHex, UfeHexOption};
use starknet_core::types::Felt;

use crate::error::Result;
use crate::hash::selector;
use crate::signature::StarknetSignature;

/// A single contract call bundled into an account `__execute__`.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Call {
    #[serde_as(as = "UfeHex")]
    pub to: Felt,
    #[serde_as(as = "UfeHex")]
    pub selector: Felt,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub calldata: Vec<Felt>,
}

impl Call {
    /// Build a call from an entry point name.
    pub fn new(to: Felt, entrypoint: &str, calldata: Vec<Felt>) -> Result<Self> {
        Ok(Self {
            to,
            selector: selector(entrypoint.to_string())?,
            calldata,
        })
    }
}

/// Caller supplied transaction details. `None` means "ask the chain"; an
/// explicit `Some(Felt::ZERO)` max fee is kept as is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvocationDetails {
    pub nonce: Option<Felt>,
    pub max_fee: Option<Felt>,
}

impl InvocationDetails {
    pub fn with_nonce(mut self, nonce: Felt) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_max_fee(mut self, max_fee: Felt) -> Self {
        self.max_fee = Some(max_fee);
        self
    }
}

/// Transaction level context the signer needs that is not part of any call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerDetails {
    pub wallet_address: Felt,
    pub nonce: Felt,
    pub max_fee: Felt,
    pub version: Felt,
    pub chain_id: Felt,
}

/// Fully signed `__execute__` invocation, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedInvocation {
    pub contract_address: Felt,
    pub entry_point_selector: Felt,
    pub calldata: Vec<Felt>,
    pub signature: StarknetSignature,
    pub max_fee: Felt,
}

impl From<SignedInvocation> for InvokeFunction {
    fn from(invocation: SignedInvocation) -> Self {
        InvokeFunction {
            contract_address: invocation.contract_address,
            entry_point_selector: invocation.entry_point_selector,
            calldata: invocation.calldata,
            signature: invocation.signature.to_felts().to_vec(),
            max_fee: invocation.max_fee,
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvokeFunction {
    #[serde_as(as = "UfeHex")]
    pub contract_address: Felt,
    #[serde_as(as = "UfeHex")]
    pub entry_point_selector: Felt,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub calldata: Vec<Felt>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub signature: Vec<Felt>,
    #[serde_as(as = "UfeHex")]
    pub max_fee: Felt,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeployTransaction {
    #[serde_as(as = "UfeHex")]
    pub contract_address_salt: Felt,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub constructor_calldata: Vec<Felt>,
    /// Compiled proxy contract, passed through untouched.
    pub contract_definition: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Transaction {
    #[serde(rename = "DEPLOY")]
    Deploy(DeployTransaction),
    #[serde(rename = "INVOKE_FUNCTION")]
    InvokeFunction(InvokeFunction),
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddTransactionResponse {
    pub code: String,
    #[serde_as(as = "UfeHex")]
    pub transaction_hash: Felt,
    #[serde_as(as = "UfeHexOption")]
    #[serde(default)]
    pub address: Option<Felt>,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallContractRequest {
    #[serde_as(as = "UfeHex")]
    pub contract_address: Felt,
    #[serde_as(as = "UfeHex")]
    pub entry_point_selector: Felt,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub calldata: Vec<Felt>,
    #[serde_as(as = "Vec<DisplayFromStr>")]
    pub signature: Vec<Felt>,
}

impl From<&Call> for CallContractRequest {
    fn from(call: &Call) -> Self {
        Self {
            contract_address: call.to,
            entry_point_selector: call.selector,
            calldata: call.calldata.clone(),
            signature: vec![],
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallContractResponse {
    #[serde_as(as = "Vec<PickFirst<(UfeHex, DisplayFromStr)>>")]
    pub result: Vec<Felt>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CodeResponse {
    #[serde(default)]
    pub bytecode: Vec<String>,
    #[serde(default)]
    pub abi: serde_json::Value,
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeeEstimate {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub amount: u128,
    #[serde(default)]
    pub unit: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    NotReceived,
    Received,
    Pending,
    AcceptedOnL2,
    AcceptedOnL1,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// Accepted on L2, accepted on L1 or rejected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::AcceptedOnL2
                | TransactionStatus::AcceptedOnL1
                | TransactionStatus::Rejected
        )
    }
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionStatusResponse {
    pub tx_status: TransactionStatus,
    #[serde_as(as = "UfeHexOption")]
    #[serde(default)]
    pub block_hash: Option<Felt>,
}

/// Error body returned by the sequencer gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayErrorBody {
    pub code: String,
    pub message: String,
}

/// Ethereum side chain descriptor used by `wallet_addEthereumChain`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EthereumChain {
    /// Hex encoded chain id, e.g. `0xb`.
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
}
