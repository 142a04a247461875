use std::io::{Error, ErrorKind};

/// Data for an unsigned account-model transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountTransaction {
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    pub gas_limit: u64,
    /// Destination address, 20 bytes.
    pub to: [u8; 20],
    /// Value in wei.
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

const SHORT_STRING_BASE: u8 = 0x80;
const LONG_STRING_BASE: u8 = 0xb7;
const SHORT_LIST_BASE: u8 = 0xc0;
const LONG_LIST_BASE: u8 = 0xf7;
const SHORT_FORM_MAX: usize = 55;

/// Minimal big-endian byte string for an integer. Zero encodes as the
/// empty string per the RLP convention.
fn minimal_be(value: u128) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(15);
    bytes[start..].to_vec()
}

fn length_header(len: usize, short_base: u8, long_base: u8) -> Vec<u8> {
    if len <= SHORT_FORM_MAX {
        vec![short_base + len as u8]
    } else {
        let len_bytes = minimal_be(len as u128);
        let mut header = vec![long_base + len_bytes.len() as u8];
        header.extend(len_bytes);
        header
    }
}

/// RLP-encodes a byte string: single bytes below 0x80 stand for themselves,
/// everything else gets a short or long length header.
fn encode_bytes(payload: &[u8]) -> Vec<u8> {
    if payload.len() == 1 && payload[0] < SHORT_STRING_BASE {
        return payload.to_vec();
    }
    let mut out = length_header(payload.len(), SHORT_STRING_BASE, LONG_STRING_BASE);
    out.extend_from_slice(payload);
    out
}

fn encode_integer(value: u128) -> Vec<u8> {
    encode_bytes(&minimal_be(value))
}

/// Splits an RLP list payload off its outer header.
fn strip_list_header(raw: &[u8]) -> Result<&[u8], Error> {
    let first = *raw
        .first()
        .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "empty rlp payload"))?;
    if first < SHORT_LIST_BASE {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "rlp payload is not a list",
        ));
    }
    if first <= LONG_LIST_BASE {
        Ok(&raw[1..])
    } else {
        let len_of_len = (first - LONG_LIST_BASE) as usize;
        if raw.len() < 1 + len_of_len {
            return Err(Error::new(ErrorKind::InvalidInput, "truncated rlp header"));
        }
        Ok(&raw[1 + len_of_len..])
    }
}

/// Encodes an unsigned transaction as
/// `rlp([nonce, gas_price, gas_limit, to, value, data, chain_id, "", ""])`,
/// the pre-signing form of the EIP-155 convention.
#[must_use]
pub fn encode_unsigned(tx: &AccountTransaction) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend(encode_integer(u128::from(tx.nonce)));
    payload.extend(encode_integer(tx.gas_price));
    payload.extend(encode_integer(u128::from(tx.gas_limit)));
    payload.extend(encode_bytes(&tx.to));
    payload.extend(encode_integer(tx.value));
    payload.extend(encode_bytes(&tx.data));
    // V is just the chain id before signing; R and S are empty.
    payload.extend(encode_integer(u128::from(tx.chain_id)));
    payload.push(SHORT_STRING_BASE);
    payload.push(SHORT_STRING_BASE);

    let mut out = length_header(payload.len(), SHORT_LIST_BASE, LONG_LIST_BASE);
    out.extend(payload);
    out
}

/// Replaces the trailing `[chain_id, "", ""]` of an unsigned payload with
/// `[v, r, s]` where `v = chain_id * 2 + 35 + recovery_bit`, and rebuilds
/// the outer list header.
///
/// The trailing triple is located by the encoded chain-id element, not by
/// offset; a payload that was already signed no longer carries it and is
/// rejected, so a signature can never be spliced twice.
pub fn add_signature(
    raw: &[u8],
    chain_id: u64,
    r: &[u8; 32],
    s: &[u8; 32],
    recovery_bit: u8,
) -> Result<Vec<u8>, Error> {
    if recovery_bit > 1 {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!("invalid recovery bit: {recovery_bit}"),
        ));
    }
    let payload = strip_list_header(raw)?;

    let mut unsigned_suffix = encode_integer(u128::from(chain_id));
    unsigned_suffix.push(SHORT_STRING_BASE);
    unsigned_suffix.push(SHORT_STRING_BASE);
    if payload.len() < unsigned_suffix.len() || !payload.ends_with(&unsigned_suffix) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "encoded transaction has no unsigned chain-id marker",
        ));
    }

    let mut new_payload = payload[..payload.len() - unsigned_suffix.len()].to_vec();
    let v = u128::from(chain_id) * 2 + 35 + u128::from(recovery_bit);
    new_payload.extend(encode_integer(v));
    new_payload.extend(encode_bytes(r));
    new_payload.extend(encode_bytes(s));

    let mut out = length_header(new_payload.len(), SHORT_LIST_BASE, LONG_LIST_BASE);
    out.extend(new_payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> AccountTransaction {
        AccountTransaction {
            nonce: 5,
            // 20 gwei.
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: [0xab; 20],
            // 1 ether.
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
            chain_id: 1,
        }
    }

    #[test]
    fn test_zero_fields_encode_as_empty_string() {
        let tx = AccountTransaction {
            nonce: 0,
            gas_price: 0,
            gas_limit: 0,
            to: [0; 20],
            value: 0,
            data: Vec::new(),
            chain_id: 1,
        };
        let encoded = encode_unsigned(&tx);
        // nonce, gas price and gas limit must be 0x80 (empty string), never
        // a zero byte.
        assert_eq!(encoded[1], 0x80);
        assert_eq!(encoded[2], 0x80);
        assert_eq!(encoded[3], 0x80);
        // Address of zero bytes still carries its full 20-byte string.
        assert_eq!(encoded[4], 0x80 + 20);
        // value and data.
        assert_eq!(encoded[25], 0x80);
        assert_eq!(encoded[26], 0x80);
    }

    #[test]
    fn test_unsigned_header_bytes() {
        let encoded = encode_unsigned(&sample_tx());
        // Payload: nonce(1) + gasPrice(6) + gasLimit(3) + to(21) + value(9)
        // + data(1) + chainId(1) + r(1) + s(1) = 44 bytes.
        let mut expected = vec![0xc0 + 44, 0x05];
        expected.extend([0x85, 0x04, 0xa8, 0x17, 0xc8, 0x00]);
        expected.extend([0x82, 0x52, 0x08]);
        expected.push(0x80 + 20);
        expected.extend([0xab; 20]);
        expected.extend([0x88, 0x0d, 0xe0, 0xb6, 0xb3, 0xa7, 0x64, 0x00, 0x00]);
        expected.extend([0x80, 0x01, 0x80, 0x80]);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_add_signature() {
        let tx = sample_tx();
        let unsigned = encode_unsigned(&tx);
        let r = [0x11u8; 32];
        let s = [0x22u8; 32];
        let signed = add_signature(&unsigned, tx.chain_id, &r, &s, 1).expect("sign");

        // v = 1 * 2 + 35 + 1 = 38.
        let trailer_start = signed.len() - (1 + 33 + 33);
        assert_eq!(signed[trailer_start], 38);
        assert_eq!(signed[trailer_start + 1], 0xa0);
        assert_eq!(&signed[trailer_start + 2..trailer_start + 34], &r[..]);
        assert_eq!(signed[trailer_start + 34], 0xa0);
        assert_eq!(&signed[trailer_start + 35..], &s[..]);

        // Payload grew past 55 bytes, so the outer header is long form.
        assert_eq!(signed[0], 0xf7 + 1);
        assert_eq!(signed[1] as usize, signed.len() - 2);
    }

    #[test]
    fn test_add_signature_rejects_signed_payload() {
        let tx = sample_tx();
        let unsigned = encode_unsigned(&tx);
        let signed = add_signature(&unsigned, tx.chain_id, &[1; 32], &[2; 32], 0).expect("sign");
        // The chain-id marker was consumed by the first splice.
        assert!(add_signature(&signed, tx.chain_id, &[1; 32], &[2; 32], 0).is_err());
    }

    #[test]
    fn test_add_signature_rejects_wrong_chain_id() {
        let tx = sample_tx();
        let unsigned = encode_unsigned(&tx);
        assert!(add_signature(&unsigned, 99, &[1; 32], &[2; 32], 0).is_err());
    }

    #[test]
    fn test_long_payload_uses_long_form_headers() {
        let mut tx = sample_tx();
        tx.data = vec![0x01; 60];
        let encoded = encode_unsigned(&tx);
        // Data element: 0xb7 + 1 length byte.
        assert!(encoded.contains(&(0xb7 + 1)));
        // Outer header is long form too.
        assert_eq!(encoded[0], 0xf7 + 1);
        let signed = add_signature(&encoded, tx.chain_id, &[3; 32], &[4; 32], 0).expect("sign");
        assert_eq!(signed[0], 0xf7 + 1);
    }

    #[test]
    fn test_minimal_be() {
        assert!(minimal_be(0).is_empty());
        assert_eq!(minimal_be(1), vec![1]);
        assert_eq!(minimal_be(127), vec![127]);
        assert_eq!(minimal_be(128), vec![128]);
        assert_eq!(minimal_be(256), vec![1, 0]);
    }
}
