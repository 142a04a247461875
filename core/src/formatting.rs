use crate::errors::WalletError;

#[must_use]
pub fn prep_hex_str<S: AsRef<str>>(to_fix: S) -> String {
    let lc = to_fix.as_ref().to_lowercase();
    if let Some(s) = lc.strip_prefix("0x") {
        s.to_string()
    } else {
        lc
    }
}

pub fn hex_to_bytes<S: AsRef<str>>(hex_str: S) -> Result<Vec<u8>, WalletError> {
    hex::decode(prep_hex_str(hex_str)).map_err(|e| WalletError::Encoding(format!("{e}")))
}

/// Renders an amount of smallest units as a decimal display string,
/// trimming trailing zeros ("1.5", not "1.50000000").
#[must_use]
pub fn display_amount(amount: u128, decimals: u32) -> String {
    let factor = 10u128.pow(decimals);
    let whole = amount / factor;
    let frac = amount % factor;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parses a decimal display string into smallest units. Rejects negative
/// values and fractions finer than the coin supports.
pub fn parse_amount(value: &str, decimals: u32) -> Result<u128, WalletError> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('-') {
        return Err(WalletError::InvalidParameters(format!(
            "invalid amount: {value:?}"
        )));
    }
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if frac.len() > decimals as usize {
        return Err(WalletError::InvalidParameters(format!(
            "amount {value} has more than {decimals} decimals"
        )));
    }
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| WalletError::InvalidParameters(format!("invalid amount: {value:?}")))?
    };
    let mut frac_units: u128 = 0;
    if !frac.is_empty() {
        frac_units = frac
            .parse()
            .map_err(|_| WalletError::InvalidParameters(format!("invalid amount: {value:?}")))?;
        frac_units *= 10u128.pow(decimals - frac.len() as u32);
    }
    whole
        .checked_mul(10u128.pow(decimals))
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(|| WalletError::InvalidParameters(format!("amount {value} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_amount() {
        assert_eq!(display_amount(0, 8), "0");
        assert_eq!(display_amount(100_000_000, 8), "1");
        assert_eq!(display_amount(150_000_000, 8), "1.5");
        assert_eq!(display_amount(1, 8), "0.00000001");
        assert_eq!(display_amount(1_000_000_000_000_000_000, 18), "1");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1", 8).unwrap(), 100_000_000);
        assert_eq!(parse_amount("1.5", 8).unwrap(), 150_000_000);
        assert_eq!(parse_amount("0.00000001", 8).unwrap(), 1);
        assert_eq!(parse_amount(".5", 6).unwrap(), 500_000);
        assert!(parse_amount("1.000000001", 8).is_err());
        assert!(parse_amount("-1", 8).is_err());
        assert!(parse_amount("", 8).is_err());
        assert!(parse_amount("abc", 8).is_err());
    }

    #[test]
    fn test_round_trip() {
        for amount in [0u128, 1, 999, 100_000_000, 123_456_789] {
            let display = display_amount(amount, 8);
            assert_eq!(parse_amount(&display, 8).unwrap(), amount);
        }
    }

    #[test]
    fn test_prep_hex_str() {
        assert_eq!(prep_hex_str("0xAbCd"), "abcd");
        assert_eq!(prep_hex_str("abcd"), "abcd");
    }
}
