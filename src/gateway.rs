use std::future::Future;
use std::sync::Arc;

use log::trace;
use reqwest::StatusCode;
use starknet_core::types::Felt;

use crate::error::{Error, Result};
use crate::structs::{
    AddTransactionResponse, CallContractRequest, CallContractResponse, CodeResponse, FeeEstimate,
    GatewayErrorBody, InvokeFunction, Transaction, TransactionStatusResponse,
};
use crate::url::Network;

/// Read and write access to StarkNet needed by an account.
pub trait StarknetClient: Send + Sync {
    fn call_contract(
        &self,
        request: &CallContractRequest,
    ) -> impl Future<Output = Result<Vec<Felt>>> + Send;

    fn get_code(&self, contract_address: Felt) -> impl Future<Output = Result<CodeResponse>> + Send;

    fn add_transaction(
        &self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<AddTransactionResponse>> + Send;

    /// Fee for the given invocation; the signature may be empty.
    fn estimate_fee(
        &self,
        invocation: &InvokeFunction,
    ) -> impl Future<Output = Result<FeeEstimate>> + Send;

    fn transaction_status(
        &self,
        transaction_hash: Felt,
    ) -> impl Future<Output = Result<TransactionStatusResponse>> + Send;
}

impl<T: StarknetClient> StarknetClient for Arc<T> {
    fn call_contract(
        &self,
        request: &CallContractRequest,
    ) -> impl Future<Output = Result<Vec<Felt>>> + Send {
        (**self).call_contract(request)
    }

    fn get_code(&self, contract_address: Felt) -> impl Future<Output = Result<CodeResponse>> + Send {
        (**self).get_code(contract_address)
    }

    fn add_transaction(
        &self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<AddTransactionResponse>> + Send {
        (**self).add_transaction(transaction)
    }

    fn estimate_fee(
        &self,
        invocation: &InvokeFunction,
    ) -> impl Future<Output = Result<FeeEstimate>> + Send {
        (**self).estimate_fee(invocation)
    }

    fn transaction_status(
        &self,
        transaction_hash: Felt,
    ) -> impl Future<Output = Result<TransactionStatusResponse>> + Send {
        (**self).transaction_status(transaction_hash)
    }
}

enum Method<Body: serde::Serialize> {
    Get(Vec<(String, String)>),
    Post(Vec<(String, String)>, Body),
}

/// Client for the sequencer HTTP gateway (`/gateway` and `/feeder_gateway`).
///
/// Cloning re-uses the underlying connection pool. Requests are never retried.
#[derive(Clone, Debug)]
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(network: Network) -> Self {
        Self::with_base_url(network.gateway())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn pending_block() -> Vec<(String, String)> {
        vec![("blockNumber".to_string(), "pending".to_string())]
    }

    /// Perform a gateway request
    ///
    /// # Errors
    ///
    /// `NetworkError` when the gateway cannot be reached, `GatewayError` when it
    /// answers with an error status.
    async fn request<B: serde::Serialize, T: for<'de> serde::Deserialize<'de>>(
        &self,
        method: Method<B>,
        path: &str,
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);

        let request = match method {
            Method::Get(params) => self.client.get(url).query(&params),
            Method::Post(params, body) => self.client.post(url).query(&params).json(&body),
        };

        let result = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        let status = result.status();
        let text = result
            .text()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        trace!("gateway {path} answered {status}: {text}");

        decode_response(status, &text)
    }
}

fn decode_response<T: for<'de> serde::Deserialize<'de>>(status: StatusCode, text: &str) -> Result<T> {
    if status.is_success() {
        if text.is_empty() {
            Err(Error::NetworkError(format!("empty response with status {status}")))
        } else {
            serde_json::from_str::<T>(text)
                .map_err(|e| Error::DeserializationError(format!("Text: {text} Error: {e:?}")))
        }
    } else {
        let (code, message) = match serde_json::from_str::<GatewayErrorBody>(text) {
            Ok(body) => (body.code, body.message),
            Err(_) => (status.to_string(), text.to_string()),
        };
        Err(Error::GatewayError {
            status_code: status.as_u16(),
            code,
            message,
        })
    }
}

impl StarknetClient for GatewayClient {
    async fn call_contract(&self, request: &CallContractRequest) -> Result<Vec<Felt>> {
        self.request(
            Method::Post(Self::pending_block(), request),
            "/feeder_gateway/call_contract",
        )
        .await
        .map(|response: CallContractResponse| response.result)
    }

    async fn get_code(&self, contract_address: Felt) -> Result<CodeResponse> {
        let mut params = Self::pending_block();
        params.push((
            "contractAddress".to_string(),
            contract_address.to_hex_string(),
        ));
        self.request(Method::Get::<()>(params), "/feeder_gateway/get_code")
            .await
    }

    async fn add_transaction(&self, transaction: &Transaction) -> Result<AddTransactionResponse> {
        self.request(
            Method::Post(vec![], transaction),
            "/gateway/add_transaction",
        )
        .await
    }

    async fn estimate_fee(&self, invocation: &InvokeFunction) -> Result<FeeEstimate> {
        let transaction = Transaction::InvokeFunction(invocation.clone());
        self.request(
            Method::Post(Self::pending_block(), &transaction),
            "/feeder_gateway/estimate_fee",
        )
        .await
    }

    async fn transaction_status(&self, transaction_hash: Felt) -> Result<TransactionStatusResponse> {
        self.request(
            Method::Get::<()>(vec![(
                "transactionHash".to_string(),
                transaction_hash.to_hex_string(),
            )]),
            "/feeder_gateway/get_transaction_status",
        )
        .await
    }
}
