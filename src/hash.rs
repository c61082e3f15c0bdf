use cached::SizedCache;
use cached::proc_macro::cached;
use starknet_core::types::Felt;
use starknet_core::utils::{cairo_short_string_to_felt, get_selector_from_name};
use starknet_crypto::pedersen_hash;

use crate::error::{Error, Result};

/// StarkNet "hash on elements".
///
/// Folds every element into a Pedersen accumulator that starts at zero, then
/// folds in the element count. `hash_chain(&[])` is `pedersen(0, 0)`.
pub fn hash_chain(elements: &[Felt]) -> Felt {
    let accumulator = elements
        .iter()
        .fold(Felt::ZERO, |acc, element| pedersen_hash(&acc, element));
    pedersen_hash(&accumulator, &Felt::from(elements.len() as u64))
}

/// Same as [`hash_chain`] for decimal or `0x` hex string inputs.
pub fn hash_chain_str(elements: &[&str]) -> Result<Felt> {
    let felts = elements
        .iter()
        .map(|element| parse_felt(element))
        .collect::<Result<Vec<Felt>>>()?;
    Ok(hash_chain(&felts))
}

/// Parse a field element from a decimal numeral or a `0x` prefixed hex string.
pub fn parse_felt(value: &str) -> Result<Felt> {
    let trimmed = value.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidInput(value.to_string()));
        }
        Felt::from_hex(&format!("0x{hex}")).map_err(|_| Error::InvalidInput(value.to_string()))
    } else if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Felt::from_dec_str(trimmed).map_err(|_| Error::InvalidInput(value.to_string()))
    } else {
        Err(Error::InvalidInput(value.to_string()))
    }
}

/// Entry point selector for a function name, cached since the same handful of
/// names (`__execute__`, `get_nonce`, ...) are looked up on every invocation.
#[cached(
    ty = "SizedCache<String, Result<Felt>>",
    create = "{ SizedCache::with_size(64) }"
)]
pub fn selector(name: String) -> Result<Felt> {
    get_selector_from_name(&name).map_err(|e| Error::StarknetError(e.to_string()))
}

pub fn short_string(value: &str) -> Result<Felt> {
    cairo_short_string_to_felt(value).map_err(|e| Error::StarknetError(e.to_string()))
}

/// Decimal numeral of a field element, the encoding EIP-712 `uint256` values and
/// gateway calldata expect.
pub fn felt_to_decimal(value: &Felt) -> String {
    value.to_biguint().to_str_radix(10)
}

/// `0x` followed by exactly 64 hex digits.
pub fn felt_to_padded_hex(value: &Felt) -> String {
    format!("0x{}", alloy_primitives::hex::encode(value.to_bytes_be()))
}
