use crate::core::{SdkError, SdkResult, BPS_DENOMINATOR};

/// Scale a human decimal string to base units using exact decimal arithmetic.
///
/// Fractional digits beyond `decimals` are truncated, never rounded. Inputs
/// that are empty, signed, contain anything other than digits and a single
/// `.`, or exceed `u64` are rejected.
pub fn scale_amount(amount: &str, decimals: u8) -> SdkResult<u64> {
    let amount = amount.trim();
    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err(SdkError::Validation(format!("invalid amount {:?}", amount)));
    }
    if !integer.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SdkError::Validation(format!("invalid amount {:?}", amount)));
    }

    let decimals = decimals as usize;
    let kept = &fraction[..fraction.len().min(decimals)];
    let padding = decimals - kept.len();

    let overflow = || SdkError::Validation(format!("amount {} exceeds u64 base units", amount));
    let mut value: u64 = 0;
    for digit in integer.bytes().chain(kept.bytes()) {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((digit - b'0') as u64))
            .ok_or_else(overflow)?;
    }
    for _ in 0..padding {
        value = value.checked_mul(10).ok_or_else(overflow)?;
    }
    Ok(value)
}

/// Render base units as a decimal string with exactly `decimals` fractional digits
pub fn format_amount(amount: u64, decimals: u8) -> String {
    let decimals = decimals as usize;
    if decimals == 0 {
        return amount.to_string();
    }
    let digits = format!("{:0>width$}", amount, width = decimals + 1);
    let (integer, fraction) = digits.split_at(digits.len() - decimals);
    format!("{}.{}", integer, fraction)
}

/// Convert a percent string ("0.3") to basis points, truncating below 0.01%
pub fn percent_to_bps(percent: &str) -> SdkResult<u16> {
    let bps = scale_amount(percent, 2)?;
    if bps > BPS_DENOMINATOR {
        return Err(SdkError::Validation(format!(
            "percentage {} exceeds 100%",
            percent.trim()
        )));
    }
    Ok(bps as u16)
}

/// Clamp a caller-supplied slippage tolerance into the policy window
pub fn clamp_slippage_bps(slippage_bps: u16, min: u16, max: u16) -> u16 {
    slippage_bps.clamp(min, max.max(min))
}

/// `floor(amount * bps / 10_000)` without intermediate overflow
pub fn apply_bps(amount: u64, bps: u64) -> u64 {
    ((amount as u128 * bps as u128) / BPS_DENOMINATOR as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_scale_amount_exact() {
        assert_eq!(scale_amount("1.2345", 6).unwrap(), 1_234_500);
        assert_eq!(scale_amount("5", 0).unwrap(), 5);
        assert_eq!(scale_amount("1.5", 9).unwrap(), 1_500_000_000);
        assert_eq!(scale_amount("0.1", 6).unwrap(), 100_000);
        assert_eq!(scale_amount("42", 0).unwrap(), 42);
        assert_eq!(scale_amount(".25", 2).unwrap(), 25);
        assert_eq!(scale_amount("7.", 3).unwrap(), 7_000);
        assert_eq!(scale_amount(" 2.5 ", 1).unwrap(), 25);
    }

    #[test]
    fn test_scale_amount_truncates_excess_digits() {
        assert_eq!(scale_amount("1.23456789", 6).unwrap(), 1_234_567);
        assert_eq!(scale_amount("0.0000009", 6).unwrap(), 0);
        assert_eq!(scale_amount("0.999", 0).unwrap(), 0);
    }

    #[test]
    fn test_scale_amount_rejects_malformed() {
        for input in ["", ".", "-1", "+1", "1.2.3", "abc", "1e6", "1,5", "0x10"] {
            assert!(
                matches!(scale_amount(input, 6), Err(SdkError::Validation(_))),
                "accepted {:?}",
                input
            );
        }
    }

    #[test]
    fn test_scale_amount_overflow() {
        assert_eq!(scale_amount("18446744073709551615", 0).unwrap(), u64::MAX);
        assert!(matches!(
            scale_amount("18446744073709551616", 0),
            Err(SdkError::Validation(_))
        ));
        assert!(matches!(
            scale_amount("18446744074", 9),
            Err(SdkError::Validation(_))
        ));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500_000_000, 9), "1.500000000");
        assert_eq!(format_amount(5, 6), "0.000005");
        assert_eq!(format_amount(0, 2), "0.00");
        assert_eq!(format_amount(42, 0), "42");
    }

    #[test]
    fn test_percent_to_bps() {
        assert_eq!(percent_to_bps("0.3").unwrap(), 30);
        assert_eq!(percent_to_bps("0.5").unwrap(), 50);
        assert_eq!(percent_to_bps("1").unwrap(), 100);
        assert_eq!(percent_to_bps("0.255").unwrap(), 25);
        assert_eq!(percent_to_bps("100").unwrap(), 10_000);
        assert!(percent_to_bps("100.01").is_err());
    }

    #[test]
    fn test_clamp_slippage() {
        assert_eq!(clamp_slippage_bps(1, 10, 2_000), 10);
        assert_eq!(clamp_slippage_bps(50, 10, 2_000), 50);
        assert_eq!(clamp_slippage_bps(9_000, 10, 2_000), 2_000);
    }

    #[test]
    fn test_apply_bps_no_overflow() {
        assert_eq!(apply_bps(u64::MAX, 10_000), u64::MAX);
        assert_eq!(apply_bps(999, 30), 2);
    }

    proptest! {
        #[test]
        fn prop_format_then_scale_is_identity(amount in any::<u64>(), decimals in 0u8..=12) {
            let rendered = format_amount(amount, decimals);
            prop_assert_eq!(scale_amount(&rendered, decimals).unwrap(), amount);
        }

        #[test]
        fn prop_scaling_is_monotonic(a in 0u64..1_000_000_000, b in 0u64..1_000_000_000) {
            let sa = scale_amount(&a.to_string(), 6).unwrap();
            let sb = scale_amount(&b.to_string(), 6).unwrap();
            prop_assert_eq!(a <= b, sa <= sb);
        }
    }
}
