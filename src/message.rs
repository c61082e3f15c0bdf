use std::sync::LazyLock;

use cached::SizedCache;
use cached::proc_macro::cached;
use starknet_core::types::Felt;
use starknet_core::utils::starknet_keccak;
use starknet_crypto::PedersenHasher;

use crate::error::Result;
use crate::hash::{hash_chain, short_string};

// short string encoding of 'StarkNet Message'
const STARKNET_MESSAGE_PREFIX: Felt = Felt::from_raw([
    257012186512350467,
    18446744073709551605,
    10480951322775611302,
    16156019428408348868,
]);

static DOMAIN_TYPE_HASH: LazyLock<Felt> = LazyLock::new(|| {
    starknet_keccak("StarkNetDomain(name:felt,version:felt,chainId:felt)".as_bytes())
});

/// Revision 0 off-chain message domain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StarknetDomain {
    pub name: Felt,
    pub version: Felt,
    pub chain_id: Felt,
}

impl StarknetDomain {
    pub fn new(name: &str, version: Felt, chain_id: Felt) -> Result<Self> {
        Ok(Self {
            name: short_string(name)?,
            version,
            chain_id,
        })
    }

    pub fn hash(&self) -> Felt {
        domain_hash(self.clone())
    }
}

#[cached(
    ty = "SizedCache<StarknetDomain, Felt>",
    create = "{ SizedCache::with_size(100) }"
)]
fn domain_hash(domain: StarknetDomain) -> Felt {
    hash_chain(&[
        *DOMAIN_TYPE_HASH,
        domain.name,
        domain.version,
        domain.chain_id,
    ])
}

/// `hash_chain([starknet_keccak(type_encoding), fields...])` for a struct whose
/// members are all felts, e.g. `Request(method:felt,path:felt)`.
pub fn struct_hash(type_encoding: &str, fields: &[Felt]) -> Felt {
    let mut elements = Vec::with_capacity(fields.len() + 1);
    elements.push(starknet_keccak(type_encoding.as_bytes()));
    elements.extend_from_slice(fields);
    hash_chain(&elements)
}

/// `hash_chain(["StarkNet Message", domain_hash, account, struct_hash])`
pub fn message_hash(domain_hash: Felt, account: Felt, struct_hash: Felt) -> Felt {
    let mut hasher = PedersenHasher::default();
    hasher.update(STARKNET_MESSAGE_PREFIX);
    hasher.update(domain_hash);
    hasher.update(account);
    hasher.update(struct_hash);
    hasher.finalize()
}
