use sha2::{Digest, Sha256};
use std::io::{Error, ErrorKind};

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Decodes a base58 string into bytes, preserving leading-zero digits.
pub fn decode(input: &str) -> Result<Vec<u8>, Error> {
    let mut bytes: Vec<u8> = Vec::new();
    for c in input.bytes() {
        let digit = ALPHABET.iter().position(|a| *a == c).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("invalid base58 character: {}", c as char),
            )
        })? as u32;
        let mut carry = digit;
        for b in bytes.iter_mut() {
            carry += u32::from(*b) * 58;
            *b = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    // A leading '1' encodes a leading zero byte.
    for c in input.bytes() {
        if c != b'1' {
            break;
        }
        bytes.push(0);
    }
    bytes.reverse();
    Ok(bytes)
}

#[must_use]
pub fn encode(input: &[u8]) -> String {
    let mut digits: Vec<u8> = Vec::new();
    for byte in input {
        let mut carry = u32::from(*byte);
        for d in digits.iter_mut() {
            carry += u32::from(*d) << 8;
            *d = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }
    for byte in input {
        if *byte != 0 {
            break;
        }
        digits.push(0);
    }
    digits
        .iter()
        .rev()
        .map(|d| ALPHABET[*d as usize] as char)
        .collect()
}

/// Address of an hour-bearing chain: a 20-byte public key hash plus a
/// version byte, carried on the wire inside transaction outputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HoursAddress {
    pub version: u8,
    pub key: [u8; 20],
}

impl HoursAddress {
    /// Parses the base58 form `key[20] || version[1] || checksum[4]` where
    /// the checksum is the first 4 bytes of SHA-256 over the first 21.
    pub fn from_base58(address: &str) -> Result<Self, Error> {
        let bytes = decode(address)?;
        if bytes.len() != 25 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("invalid address length: {}", bytes.len()),
            ));
        }
        let digest = Sha256::digest(&bytes[0..21]);
        if digest[0..4] != bytes[21..25] {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("invalid address checksum: {address}"),
            ));
        }
        let mut key = [0u8; 20];
        key.copy_from_slice(&bytes[0..20]);
        Ok(HoursAddress {
            version: bytes[20],
            key,
        })
    }

    #[must_use]
    pub fn to_base58(self) -> String {
        let mut bytes = Vec::with_capacity(25);
        bytes.extend_from_slice(&self.key);
        bytes.push(self.version);
        let digest = Sha256::digest(&bytes);
        bytes.extend_from_slice(&digest[0..4]);
        encode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode("1").unwrap(), vec![0]);
        assert_eq!(decode("2").unwrap(), vec![1]);
        assert_eq!(decode("21").unwrap(), vec![58]);
        assert_eq!(decode("11a").unwrap(), vec![0, 0, 33]);
    }

    #[test]
    fn test_invalid_characters_rejected() {
        assert!(decode("0").is_err());
        assert!(decode("O").is_err());
        assert!(decode("l").is_err());
        assert!(decode("I").is_err());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for bytes in [
            vec![],
            vec![0],
            vec![0, 0, 1],
            vec![255, 254, 253],
            (0..=255u8).collect::<Vec<u8>>(),
        ] {
            assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn test_address_round_trip() {
        let address = HoursAddress {
            version: 0,
            key: [7u8; 20],
        };
        let encoded = address.to_base58();
        assert_eq!(HoursAddress::from_base58(&encoded).unwrap(), address);
    }

    #[test]
    fn test_address_checksum_enforced() {
        let address = HoursAddress {
            version: 0,
            key: [7u8; 20],
        };
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&address.key);
        bytes.push(address.version);
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert!(HoursAddress::from_base58(&encode(&bytes)).is_err());
    }
}
