use serde::{Deserialize, Serialize};

use crate::config::{Chain, ChainId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Mainnet,
    Goerli,
    Devnet,
}

impl Network {
    pub fn gateway(&self) -> &str {
        match self {
            Network::Mainnet => "https://alpha-mainnet.starknet.io",
            Network::Goerli => "https://alpha4.starknet.io",
            Network::Devnet => "http://127.0.0.1:5050",
        }
    }

    /// Chain the sequencer behind [`Network::gateway`] signs for. Devnet reuses the
    /// Goerli chain id.
    pub fn chain(&self) -> Chain {
        match self {
            Network::Mainnet => Chain::new(ChainId::ShortString("SN_MAIN".into()), "SN_MAIN"),
            Network::Goerli | Network::Devnet => {
                Chain::new(ChainId::ShortString("SN_GOERLI".into()), "SN_GOERLI")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_chain() {
        assert_eq!(Network::Mainnet.chain().name(), "SN_MAIN");
        assert_eq!(Network::Devnet.chain(), Network::Goerli.chain());
        assert!(Network::Goerli.gateway().starts_with("https://"));
    }
}
