use std::collections::BTreeMap;

use alloy_dyn_abi::TypedData;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use starknet_core::types::Felt;

use crate::error::{Error, Result};
use crate::hash::felt_to_decimal;
use crate::structs::Call;

pub const DOMAIN_VERSION: &str = "1";
pub const DOMAIN_TYPE: &str = "EIP712Domain";
pub const PAYLOAD_TYPE: &str = "Payload";
pub const CALL_TYPE: &str = "Call";

pub type Types = BTreeMap<String, Vec<TypedDataField>>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

impl TypedDataField {
    pub fn new(name: &str, r#type: &str) -> Self {
        Self {
            name: name.to_string(),
            r#type: r#type.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub version: String,
    #[serde(rename = "chainId", default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

/// Domain and type definitions shared by every payload signed for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDataTemplate {
    pub domain: Domain,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
    pub types: Types,
}

/// Complete `eth_signTypedData_v4` document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedDataDocument {
    pub domain: Domain,
    #[serde(rename = "primaryType")]
    pub primary_type: String,
    pub types: Types,
    pub message: Value,
}

impl TypedDataDocument {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::TypedDataError(e.to_string()))
    }

    /// The 32 bytes an EIP-712 wallet actually signs for this document.
    pub fn signing_hash(&self) -> Result<B256> {
        let value = serde_json::to_value(self).map_err(|e| Error::TypedDataError(e.to_string()))?;
        eip712_signing_hash(&value)
    }
}

/// Everything the account contract checks a typed-data signature against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub nonce: Felt,
    pub max_fee: Felt,
    pub version: Felt,
    pub calls: Vec<Call>,
}

impl Payload {
    /// Message object with every number rendered as a decimal numeral.
    pub fn message(&self) -> Value {
        let calls: Vec<Value> = self
            .calls
            .iter()
            .map(|call| {
                json!({
                    "address": felt_to_decimal(&call.to),
                    "selector": felt_to_decimal(&call.selector),
                    "calldata": call.calldata.iter().map(felt_to_decimal).collect::<Vec<_>>(),
                })
            })
            .collect();
        json!({
            "nonce": felt_to_decimal(&self.nonce),
            "maxFee": felt_to_decimal(&self.max_fee),
            "version": felt_to_decimal(&self.version),
            "calls": calls,
        })
    }
}

/// Typed data template for `chain_name`. `chainId` only becomes part of the
/// domain when `domain_chain_id` is set, the deployed verifiers differ on it.
pub fn build_typed_data(chain_name: &str, domain_chain_id: Option<u64>) -> TypedDataTemplate {
    let mut domain_fields = vec![
        TypedDataField::new("name", "string"),
        TypedDataField::new("version", "string"),
    ];
    if domain_chain_id.is_some() {
        domain_fields.push(TypedDataField::new("chainId", "uint256"));
    }

    let types = BTreeMap::from([
        (DOMAIN_TYPE.to_string(), domain_fields),
        (
            PAYLOAD_TYPE.to_string(),
            vec![
                TypedDataField::new("nonce", "uint256"),
                TypedDataField::new("maxFee", "uint256"),
                TypedDataField::new("version", "uint256"),
                TypedDataField::new("calls", "Call[]"),
            ],
        ),
        (
            CALL_TYPE.to_string(),
            vec![
                TypedDataField::new("address", "uint256"),
                TypedDataField::new("selector", "uint256"),
                TypedDataField::new("calldata", "uint256[]"),
            ],
        ),
    ]);

    TypedDataTemplate {
        domain: Domain {
            name: chain_name.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id: domain_chain_id,
        },
        primary_type: PAYLOAD_TYPE.to_string(),
        types,
    }
}

pub fn bind_message(template: &TypedDataTemplate, payload: &Payload) -> TypedDataDocument {
    TypedDataDocument {
        domain: template.domain.clone(),
        primary_type: template.primary_type.clone(),
        types: template.types.clone(),
        message: payload.message(),
    }
}

/// Parse `eth_signTypedData_v4` input, accepted both as a JSON object and as
/// its stringified form.
pub fn parse_typed_data(typed_data: &Value) -> Result<TypedData> {
    TypedData::deserialize(typed_data).map_err(|e| Error::TypedDataError(e.to_string()))
}

/// `keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ hashStruct(message))`
pub fn eip712_signing_hash(typed_data: &Value) -> Result<B256> {
    parse_typed_data(typed_data)?
        .eip712_signing_hash()
        .map_err(|e| Error::TypedDataError(e.to_string()))
}
