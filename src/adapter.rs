use std::sync::Arc;

use alloy_primitives::Address;
use log::info;

use crate::account::EthAccount;
use crate::address::parse_eth_address;
use crate::config::AccountConfig;
use crate::error::Result;
use crate::gateway::StarknetClient;
use crate::wallet::{SigningOracle, Wallet};

/// Entry point for an application: exposes every account of an Ethereum
/// wallet as a StarkNet [`EthAccount`] under one shared configuration.
///
/// The oracle and client are cloned into each account, pass `Arc`s (or
/// clients that share their pool on clone) to keep one connection.
#[derive(Clone, Debug)]
pub struct StarknetAdapter<O, C> {
    config: Arc<AccountConfig>,
    wallet: Wallet<O>,
    client: C,
}

impl<O, C> StarknetAdapter<O, C>
where
    O: SigningOracle + Clone,
    C: StarknetClient + Clone,
{
    pub fn new(config: AccountConfig, oracle: O, client: C) -> Self {
        Self {
            config: Arc::new(config),
            wallet: Wallet::new(oracle),
            client,
        }
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    pub fn wallet(&self) -> &Wallet<O> {
        &self.wallet
    }

    /// Switch the wallet to the configured chain, if any, and ask the user to
    /// expose their accounts.
    pub async fn connect(&self) -> Result<Vec<EthAccount<O, C>>> {
        if let Some(chain) = &self.config.wallet_chain {
            self.wallet.ensure_chain(chain).await?;
        }
        let addresses = self.wallet.request_accounts().await?;
        info!("wallet exposed {} account(s)", addresses.len());
        addresses
            .into_iter()
            .map(|address| self.account_for(address))
            .collect()
    }

    /// Accounts the wallet already exposes, without prompting.
    pub async fn accounts(&self) -> Result<Vec<EthAccount<O, C>>> {
        self.wallet
            .accounts()
            .await?
            .into_iter()
            .map(|address| self.account_for(address))
            .collect()
    }

    pub fn account(&self, eth_address: &str) -> Result<EthAccount<O, C>> {
        self.account_for(parse_eth_address(eth_address)?)
    }

    pub fn account_for(&self, eth_address: Address) -> Result<EthAccount<O, C>> {
        EthAccount::from_address(
            eth_address,
            self.config.clone(),
            self.wallet.clone(),
            self.client.clone(),
        )
    }
}
