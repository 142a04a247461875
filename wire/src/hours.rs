use crate::base58::HoursAddress;
use bytes::{BufMut, BytesMut};

pub const SIGNATURE_LENGTH: usize = 65;

/// Output of an hour-bearing transaction as the encoder needs it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HoursOutput {
    pub address: HoursAddress,
    /// Coin amount in smallest units.
    pub coins: u64,
    pub hours: u64,
}

/// Encodes a raw hour-bearing transaction:
/// length(4B LE) · type(1B = 0) · inner hash(32B) · counted signature list
/// (65B each) · counted input list (32B uxids) · counted output list
/// [version(1B) · key(20B) · coins(8B LE) · hours(8B LE)], every count a
/// 4-byte LE integer.
///
/// The node builds and encodes unsigned transactions itself; this exists
/// for the hardware-wallet path, which splices device signatures locally.
#[must_use]
pub fn encode(
    inner_hash: &[u8; 32],
    signatures: &[[u8; SIGNATURE_LENGTH]],
    inputs: &[[u8; 32]],
    outputs: &[HoursOutput],
) -> Vec<u8> {
    let size = encoded_size(signatures.len(), inputs.len(), outputs.len());
    let mut buf = BytesMut::with_capacity(size);

    // Total length, including this field, then the transaction type.
    buf.put_u32_le(size as u32);
    buf.put_u8(0);
    buf.put_slice(inner_hash);

    buf.put_u32_le(signatures.len() as u32);
    for signature in signatures {
        buf.put_slice(signature);
    }

    buf.put_u32_le(inputs.len() as u32);
    for input in inputs {
        buf.put_slice(input);
    }

    buf.put_u32_le(outputs.len() as u32);
    for output in outputs {
        buf.put_u8(output.address.version);
        buf.put_slice(&output.address.key);
        buf.put_u64_le(output.coins);
        buf.put_u64_le(output.hours);
    }

    buf.to_vec()
}

/// Final size in bytes of the encoded transaction.
#[must_use]
pub fn encoded_size(signatures: usize, inputs: usize, outputs: usize) -> usize {
    // Length, type and inner hash.
    4 + 1 + 32
        + 4 + signatures * SIGNATURE_LENGTH
        + 4 + inputs * 32
        + 4 + outputs * (1 + 20 + 8 + 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_size() {
        assert_eq!(encoded_size(0, 0, 0), 49);
        assert_eq!(encoded_size(1, 1, 2), 49 + 65 + 32 + 74);
    }

    #[test]
    fn test_encode_layout() {
        let inner_hash = [0x0fu8; 32];
        let signatures = [[0x11u8; SIGNATURE_LENGTH]];
        let inputs = [[0x22u8; 32]];
        let outputs = [HoursOutput {
            address: HoursAddress {
                version: 0,
                key: [0x33u8; 20],
            },
            coins: 1_500_000,
            hours: 7,
        }];
        let payload = encode(&inner_hash, &signatures, &inputs, &outputs);
        assert_eq!(payload.len(), encoded_size(1, 1, 1));

        // Length field covers the whole payload, LE.
        assert_eq!(
            u32::from_le_bytes(payload[0..4].try_into().unwrap()) as usize,
            payload.len()
        );
        // Type and inner hash.
        assert_eq!(payload[4], 0);
        assert_eq!(&payload[5..37], &[0x0f; 32][..]);
        // Signature list.
        assert_eq!(&payload[37..41], &[1, 0, 0, 0]);
        assert_eq!(&payload[41..106], &[0x11; 65][..]);
        // Input list.
        assert_eq!(&payload[106..110], &[1, 0, 0, 0]);
        assert_eq!(&payload[110..142], &[0x22; 32][..]);
        // Output list: version, key, coins LE, hours LE.
        assert_eq!(&payload[142..146], &[1, 0, 0, 0]);
        assert_eq!(payload[146], 0);
        assert_eq!(&payload[147..167], &[0x33; 20][..]);
        assert_eq!(
            u64::from_le_bytes(payload[167..175].try_into().unwrap()),
            1_500_000
        );
        assert_eq!(u64::from_le_bytes(payload[175..183].try_into().unwrap()), 7);
    }

    #[test]
    fn test_unsigned_transaction_has_empty_signature_list() {
        let payload = encode(&[0u8; 32], &[], &[[0x01u8; 32]], &[]);
        assert_eq!(&payload[37..41], &[0, 0, 0, 0]);
    }
}
