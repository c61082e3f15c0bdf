use std::sync::LazyLock;

use starknet_core::types::Felt;

use crate::error::Result;
use crate::hash::{hash_chain, selector};
use crate::structs::{Call, SignerDetails};

pub const EXECUTE_ENTRYPOINT: &str = "__execute__";

// short string encoding of 'invoke'
static INVOKE_PREFIX: LazyLock<Felt> = LazyLock::new(|| Felt::from_bytes_be_slice(b"invoke"));

/// `__execute__` calldata for a call bundle:
/// `[n_calls, (to, selector, data_offset, data_len)*, total_len, calldata..., nonce]`.
pub fn execute_calldata(calls: &[Call], nonce: Felt) -> Vec<Felt> {
    let total_len: usize = calls.iter().map(|call| call.calldata.len()).sum();
    let mut calldata = Vec::with_capacity(2 + calls.len() * 4 + total_len + 1);

    calldata.push(Felt::from(calls.len() as u64));
    let mut offset = 0u64;
    for call in calls {
        let len = call.calldata.len() as u64;
        calldata.extend([call.to, call.selector, Felt::from(offset), Felt::from(len)]);
        offset += len;
    }
    calldata.push(Felt::from(total_len as u64));
    for call in calls {
        calldata.extend_from_slice(&call.calldata);
    }
    calldata.push(nonce);
    calldata
}

/// Invoke transaction hash:
/// `hash_chain(["invoke", version, address, selector, hash_chain(calldata), max_fee, chain_id, nonce?])`.
///
/// Version 0 transactions carry the nonce inside the calldata and pass `None`.
pub fn compute_transaction_hash(
    wallet_address: Felt,
    version: Felt,
    entry_point_selector: Felt,
    calldata: &[Felt],
    max_fee: Felt,
    chain_id: Felt,
    nonce: Option<Felt>,
) -> Felt {
    let mut elements = vec![
        *INVOKE_PREFIX,
        version,
        wallet_address,
        entry_point_selector,
        hash_chain(calldata),
        max_fee,
        chain_id,
    ];
    elements.extend(nonce);
    hash_chain(&elements)
}

/// Hash of the `__execute__` invocation an account signs for `calls`.
pub fn invoke_transaction_hash(calls: &[Call], details: &SignerDetails) -> Result<Felt> {
    let calldata = execute_calldata(calls, details.nonce);
    Ok(compute_transaction_hash(
        details.wallet_address,
        details.version,
        selector(EXECUTE_ENTRYPOINT.to_string())?,
        &calldata,
        details.max_fee,
        details.chain_id,
        None,
    ))
}
