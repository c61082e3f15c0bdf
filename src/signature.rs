use serde_tuple::{Deserialize_tuple, Serialize_tuple};
use starknet_core::types::Felt;

use crate::error::{Error, Result};
use crate::hash::felt_to_decimal;

/// Offset of non EIP-155 recovery ids (`v` is 27 or 28).
const RECOVERY_OFFSET: u64 = 27;

/// Ethereum ECDSA signature in the layout the account contract verifies.
///
/// Serialized as the array `[v, r_low, r_high, s_low, s_high]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct StarknetSignature {
    pub v: Felt,
    pub r_low: Felt,
    pub r_high: Felt,
    pub s_low: Felt,
    pub s_high: Felt,
}

impl StarknetSignature {
    pub fn to_felts(&self) -> [Felt; 5] {
        [self.v, self.r_low, self.r_high, self.s_low, self.s_high]
    }

    pub fn to_hex_strings(&self) -> Vec<String> {
        self.to_felts()
            .iter()
            .map(|felt| felt.to_hex_string())
            .collect()
    }

    pub fn to_decimal_strings(&self) -> Vec<String> {
        self.to_felts().iter().map(felt_to_decimal).collect()
    }
}

/// Transcode an RPC signature (`0x` + `r‖s‖v`) into its StarkNet form.
///
/// Accepts the 65 byte form and the 64 byte EIP-2098 compact form. `v` of 27/28
/// is normalized to 0/1, a `v` that is already 0/1 is kept; EIP-155 shifted
/// values are rejected.
pub fn to_starknet_signature(signature_hex: &str) -> Result<StarknetSignature> {
    let trimmed = signature_hex.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = alloy_primitives::hex::decode(hex)
        .map_err(|e| Error::InvalidSignature(format!("{signature_hex}: {e}")))?;

    let (r, s, v) = match bytes.len() {
        65 => {
            let mut r = [0u8; 32];
            let mut s = [0u8; 32];
            r.copy_from_slice(&bytes[..32]);
            s.copy_from_slice(&bytes[32..64]);
            (r, s, u64::from(bytes[64]))
        }
        64 => {
            let mut r = [0u8; 32];
            let mut s = [0u8; 32];
            r.copy_from_slice(&bytes[..32]);
            s.copy_from_slice(&bytes[32..64]);
            // EIP-2098: the top bit of s carries the y parity
            let parity = u64::from(s[0] >> 7);
            s[0] &= 0x7f;
            (r, s, RECOVERY_OFFSET + parity)
        }
        length => {
            return Err(Error::InvalidSignature(format!(
                "expected 64 or 65 bytes, got {length}"
            )));
        }
    };

    from_parts(v, &r, &s)
}

/// Transcode a signature given as separate components.
pub fn from_parts(v: u64, r: &[u8; 32], s: &[u8; 32]) -> Result<StarknetSignature> {
    let recovery_id = normalize_recovery_id(v)?;
    let (r_high, r_low) = split_scalar(r);
    let (s_high, s_low) = split_scalar(s);
    Ok(StarknetSignature {
        v: Felt::from(recovery_id),
        r_low,
        r_high,
        s_low,
        s_high,
    })
}

fn normalize_recovery_id(v: u64) -> Result<u64> {
    match v {
        0 | 1 => Ok(v),
        27 | 28 => Ok(v - RECOVERY_OFFSET),
        _ => Err(Error::UnsupportedRecoveryId(v)),
    }
}

/// Split a big-endian 256 bit scalar into its (high, low) 128 bit halves.
fn split_scalar(scalar: &[u8; 32]) -> (Felt, Felt) {
    (
        Felt::from_bytes_be_slice(&scalar[..16]),
        Felt::from_bytes_be_slice(&scalar[16..]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    const R: &str = "537021cf10650d5798c78fe6ce1008c7fb04123b18194bada3c307ee55263a45";
    const S: &str = "0c0158566d52b92df1b231ddcf61b31e65397db6aa97cdf9dfc5676f72740047";

    fn felt_to_u256(felt: &Felt) -> U256 {
        U256::from_be_bytes(felt.to_bytes_be())
    }

    #[test]
    fn test_split_recombines_exactly() {
        let signature = to_starknet_signature(&format!("0x{R}{S}1c")).unwrap();

        let r = U256::from_str_radix(R, 16).unwrap();
        let s = U256::from_str_radix(S, 16).unwrap();
        assert_eq!(
            (felt_to_u256(&signature.r_high) << 128) + felt_to_u256(&signature.r_low),
            r
        );
        assert_eq!(
            (felt_to_u256(&signature.s_high) << 128) + felt_to_u256(&signature.s_low),
            s
        );
        assert_eq!(signature.v, Felt::ONE);
    }

    #[test]
    fn test_split_is_high_bytes_first() {
        let signature = to_starknet_signature(&format!("0x{R}{S}1b")).unwrap();
        assert_eq!(
            signature.to_hex_strings(),
            vec![
                "0x0".to_string(),
                "0xfb04123b18194bada3c307ee55263a45".to_string(),
                "0x537021cf10650d5798c78fe6ce1008c7".to_string(),
                "0x65397db6aa97cdf9dfc5676f72740047".to_string(),
                "0xc0158566d52b92df1b231ddcf61b31e".to_string(),
            ]
        );
    }

    #[test]
    fn test_recovery_ids() {
        for (v, expected) in [(27u8, 0u64), (28, 1), (0, 0), (1, 1)] {
            let signature = to_starknet_signature(&format!("0x{R}{S}{v:02x}")).unwrap();
            assert_eq!(signature.v, Felt::from(expected));
        }
        for v in [2u8, 26, 29, 35, 37, 0xff] {
            assert_eq!(
                to_starknet_signature(&format!("0x{R}{S}{v:02x}")),
                Err(Error::UnsupportedRecoveryId(u64::from(v)))
            );
        }
    }

    #[test]
    fn test_compact_signature() {
        let mut s_bytes = alloy_primitives::hex::decode(S).unwrap();
        s_bytes[0] |= 0x80;
        let compact = format!("0x{R}{}", alloy_primitives::hex::encode(&s_bytes));

        let from_compact = to_starknet_signature(&compact).unwrap();
        let from_full = to_starknet_signature(&format!("0x{R}{S}1c")).unwrap();
        assert_eq!(from_compact, from_full);
    }

    #[test]
    fn test_malformed_signatures() {
        assert!(matches!(
            to_starknet_signature("0x1234"),
            Err(Error::InvalidSignature(_))
        ));
        assert!(matches!(
            to_starknet_signature(&format!("0x{R}{S}1c00")),
            Err(Error::InvalidSignature(_))
        ));
        assert!(matches!(
            to_starknet_signature(&format!("0x{R}{S}zz")),
            Err(Error::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_signature_serializes_as_array() {
        let signature = to_starknet_signature(&format!("0x{R}{S}1b")).unwrap();
        let value = serde_json::to_value(signature).unwrap();
        assert!(value.is_array());
        assert_eq!(value.as_array().unwrap().len(), 5);
        assert_eq!(signature.to_decimal_strings()[0], "0");
    }
}
