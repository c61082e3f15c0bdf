use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use jsonrpsee_core::params::ArrayParams;
use jsonrpsee_core::traits::ToRpcParams;
use jsonrpsee_types::{Id, RequestSer, Response, ResponsePayload};
use log::trace;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::wallet::SigningOracle;

/// Wallet reached over HTTP JSON-RPC, e.g. a node with unlocked accounts or a
/// wallet bridge.
///
/// The client does not need to be wrapped in an Arc to re-use, clones share the
/// connection pool and request counter.
#[derive(Clone, Debug)]
pub struct JsonRpcWallet {
    url: String,
    client: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcWallet {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<RequestSer<'static>> {
        let mut array_params = ArrayParams::new();
        for param in params {
            array_params
                .insert(param)
                .map_err(|e| Error::InvalidInput(e.to_string()))?;
        }
        let params = array_params
            .to_rpc_params()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(RequestSer::owned(Id::Number(id), method.to_string(), params))
    }
}

impl SigningOracle for JsonRpcWallet {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let request = self.build_request(method, params)?;
        let body =
            serde_json::to_string(&request).map_err(|e| Error::InvalidInput(e.to_string()))?;
        trace!("wallet request {body}");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        trace!("wallet response {status} {text}");

        if text.is_empty() {
            return Err(Error::NetworkError(format!(
                "empty response with status {status}"
            )));
        }
        decode_response(&text)
    }
}

fn decode_response(text: &str) -> Result<Value> {
    let response = serde_json::from_str::<Response<Value>>(text)
        .map_err(|e| Error::DeserializationError(format!("Text: {text} Error: {e:?}")))?;
    match response.payload {
        ResponsePayload::Success(result) => Ok(result.into_owned()),
        ResponsePayload::Error(e) => Err(Error::from_wallet(e.code(), e.message())),
    }
}
