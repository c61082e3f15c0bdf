use std::sync::Arc;

use alloy_primitives::Address;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde_json::Value;
use starknet_core::types::Felt;

use crate::address::{constructor_arguments, derive_address_from, parse_eth_address};
use crate::config::{AccountConfig, SigningScheme};
use crate::error::{Error, Result};
use crate::gateway::StarknetClient;
use crate::hash::selector;
use crate::message::{StarknetDomain, message_hash};
use crate::signature::{StarknetSignature, to_starknet_signature};
use crate::structs::{
    AddTransactionResponse, Call, CallContractRequest, DeployTransaction, InvocationDetails,
    InvokeFunction, SignedInvocation, SignerDetails, Transaction, TransactionStatus,
    TransactionStatusResponse,
};
use crate::transaction::{EXECUTE_ENTRYPOINT, execute_calldata, invoke_transaction_hash};
use crate::typed_data::{Payload, TypedDataDocument, TypedDataTemplate, bind_message, build_typed_data};
use crate::wallet::{SigningOracle, Wallet};

/// StarkNet account contract controlled by an Ethereum key.
///
/// Every transaction is signed by the Ethereum wallet, either as EIP-712 typed
/// data or as a raw `eth_sign` over the StarkNet transaction hash depending on
/// [`AccountConfig::signing_scheme`].
#[derive(Clone, Debug)]
pub struct EthAccount<O, C> {
    eth_address: Address,
    address: Felt,
    config: Arc<AccountConfig>,
    template: TypedDataTemplate,
    wallet: Wallet<O>,
    client: C,
}

impl<O: SigningOracle, C: StarknetClient> EthAccount<O, C> {
    /// Create the account for `eth_address`
    ///
    /// # Errors
    ///
    /// `InvalidAddress` for a malformed Ethereum address, before the wallet or
    /// the chain is contacted.
    pub fn new(
        eth_address: &str,
        config: Arc<AccountConfig>,
        wallet: Wallet<O>,
        client: C,
    ) -> Result<Self> {
        let eth_address = parse_eth_address(eth_address)?;
        Self::from_address(eth_address, config, wallet, client)
    }

    pub fn from_address(
        eth_address: Address,
        config: Arc<AccountConfig>,
        wallet: Wallet<O>,
        client: C,
    ) -> Result<Self> {
        let address = derive_address_from(&eth_address, &config)?;
        let template = build_typed_data(config.chain.name(), config.domain_chain_id);
        debug!(
            "account {} controlled by {eth_address}",
            address.to_hex_string()
        );
        Ok(Self {
            eth_address,
            address,
            config,
            template,
            wallet,
            client,
        })
    }

    pub fn eth_address(&self) -> Address {
        self.eth_address
    }

    pub fn starknet_address(&self) -> Felt {
        self.address
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Wallet<O> {
        &self.wallet
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn get_nonce(&self) -> Result<Felt> {
        let call = Call::new(self.address, "get_nonce", vec![])?;
        let result = self
            .client
            .call_contract(&CallContractRequest::from(&call))
            .await?;
        result.first().copied().ok_or_else(|| {
            Error::DeserializationError("get_nonce returned an empty result".into())
        })
    }

    /// Whether contract code exists at the account address.
    pub async fn is_deployed(&self) -> Result<bool> {
        match self.client.get_code(self.address).await {
            Ok(code) => Ok(!code.bytecode.is_empty()),
            Err(Error::GatewayError { code, .. }) if code.ends_with("UNINITIALIZED_CONTRACT") => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Submit the DEPLOY transaction of the account proxy. Needs no signature.
    pub async fn deploy_account(&self, contract_definition: Value) -> Result<AddTransactionResponse> {
        let transaction = Transaction::Deploy(DeployTransaction {
            contract_address_salt: self.config.contract_address_salt,
            constructor_calldata: constructor_arguments(&self.eth_address, &self.config)?,
            contract_definition,
        });
        info!(
            "deploying account {} for {}",
            self.address.to_hex_string(),
            self.eth_address
        );
        let response = self.client.add_transaction(&transaction).await?;
        if let Some(address) = response.address {
            if address != self.address {
                warn!(
                    "gateway deployed to {} but {} was derived",
                    address.to_hex_string(),
                    self.address.to_hex_string()
                );
            }
        }
        Ok(response)
    }

    /// The typed data document the wallet is asked to sign for `calls`.
    pub fn typed_data(&self, calls: &[Call], details: &SignerDetails) -> TypedDataDocument {
        bind_message(
            &self.template,
            &Payload {
                nonce: details.nonce,
                max_fee: details.max_fee,
                version: details.version,
                calls: calls.to_vec(),
            },
        )
    }

    /// Resolve nonce and fee, have the wallet sign and assemble the invocation.
    ///
    /// An absent nonce is read from the account, an absent max fee is estimated
    /// once and raised by the configured overhead. An explicit zero fee is kept.
    pub async fn sign_invocation(
        &self,
        calls: &[Call],
        details: InvocationDetails,
    ) -> Result<SignedInvocation> {
        if calls.is_empty() {
            return Err(Error::EmptyCallSet);
        }

        let nonce = match details.nonce {
            Some(nonce) => nonce,
            None => self.get_nonce().await?,
        };
        let entry_point_selector = selector(EXECUTE_ENTRYPOINT.to_string())?;
        let calldata = execute_calldata(calls, nonce);
        let max_fee = match details.max_fee {
            Some(max_fee) => max_fee,
            None => self.estimate_max_fee(entry_point_selector, &calldata).await?,
        };

        let signer_details = SignerDetails {
            wallet_address: self.address,
            nonce,
            max_fee,
            version: self.config.transaction_version,
            chain_id: self.config.chain.felt()?,
        };

        let signature = match self.config.signing_scheme {
            SigningScheme::TypedData => {
                let document = self.typed_data(calls, &signer_details);
                self.wallet
                    .sign_typed_data(&self.eth_address, &document)
                    .await?
            }
            SigningScheme::TransactionHash => {
                let hash = invoke_transaction_hash(calls, &signer_details)?;
                self.wallet.sign_hash(&self.eth_address, &hash).await?
            }
        };

        Ok(SignedInvocation {
            contract_address: self.address,
            entry_point_selector,
            calldata,
            signature: to_starknet_signature(&signature)?,
            max_fee,
        })
    }

    pub async fn execute(
        &self,
        calls: &[Call],
        details: InvocationDetails,
    ) -> Result<AddTransactionResponse> {
        let invocation = self.sign_invocation(calls, details).await?;
        info!(
            "submitting {} call(s) from {}",
            calls.len(),
            self.address.to_hex_string()
        );
        self.client
            .add_transaction(&Transaction::InvokeFunction(invocation.into()))
            .await
    }

    /// Point the proxy at a new implementation.
    pub async fn upgrade_account(&self, implementation: Felt) -> Result<AddTransactionResponse> {
        let call = Call::new(self.address, "upgrade", vec![implementation])?;
        self.execute(&[call], InvocationDetails::default()).await
    }

    /// Poll the transaction status until it is accepted or rejected
    ///
    /// # Errors
    ///
    /// `TransactionTimeout` once the configured polling timeout elapses,
    /// `StarknetError` for a rejected transaction.
    pub async fn wait_for_transaction(
        &self,
        transaction_hash: Felt,
    ) -> Result<TransactionStatusResponse> {
        let polling = self.config.polling;
        let poll = async {
            loop {
                let status = self.client.transaction_status(transaction_hash).await?;
                debug!(
                    "transaction {} is {:?}",
                    transaction_hash.to_hex_string(),
                    status.tx_status
                );
                if status.tx_status.is_terminal() {
                    return Ok::<_, Error>(status);
                }
                tokio::time::sleep(polling.interval()).await;
            }
        };

        let status: TransactionStatusResponse = tokio::time::timeout(polling.timeout(), poll)
            .await
            .map_err(|_| Error::TransactionTimeout(transaction_hash.to_hex_string()))??;
        if status.tx_status == TransactionStatus::Rejected {
            return Err(Error::StarknetError(format!(
                "transaction {} was rejected",
                transaction_hash.to_hex_string()
            )));
        }
        Ok(status)
    }

    /// Sign an off-chain StarkNet message. Only raw hash accounts can, a typed
    /// data account has no way to present a Pedersen hash to the wallet.
    pub async fn sign_message(
        &self,
        domain: &StarknetDomain,
        struct_hash: Felt,
    ) -> Result<StarknetSignature> {
        match self.config.signing_scheme {
            SigningScheme::TransactionHash => {
                let hash = message_hash(domain.hash(), self.address, struct_hash);
                let signature = self.wallet.sign_hash(&self.eth_address, &hash).await?;
                to_starknet_signature(&signature)
            }
            SigningScheme::TypedData => Err(Error::Unsupported(
                "sign_message is not supported by typed data accounts".into(),
            )),
        }
    }

    pub async fn public_key(&self) -> Result<String> {
        self.wallet.encryption_public_key(&self.eth_address).await
    }

    async fn estimate_max_fee(&self, entry_point_selector: Felt, calldata: &[Felt]) -> Result<Felt> {
        let unsigned = InvokeFunction {
            contract_address: self.address,
            entry_point_selector,
            calldata: calldata.to_vec(),
            signature: vec![],
            max_fee: Felt::ZERO,
        };
        let estimate = self.client.estimate_fee(&unsigned).await?;
        let max_fee = scale_fee(estimate.amount, self.config.fee_overhead)?;
        debug!("estimated fee {} raised to {max_fee}", estimate.amount);
        Ok(Felt::from(max_fee))
    }
}

/// `floor(amount * (1 + overhead))`
fn scale_fee(amount: u128, overhead: Decimal) -> Result<u128> {
    let amount = Decimal::from_u128(amount)
        .ok_or_else(|| Error::TypeConversionError(format!("fee {amount} out of range")))?;
    amount
        .checked_mul(Decimal::ONE + overhead)
        .map(|scaled| scaled.floor())
        .and_then(|scaled| scaled.to_u128())
        .ok_or_else(|| {
            Error::TypeConversionError(format!("fee {amount} with overhead {overhead} out of range"))
        })
}
