//! Conversion between lamports (the ledger's indivisible unit) and display units.

use std::fmt;

use crate::error::AmountError;

/// 1 display unit = 10^9 lamports.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
const DISPLAY_DECIMALS: usize = 9;

/// Largest lamport amount that survives a trip through an `f64` display value.
/// Beyond it the division and multiply-back can land on a neighbouring lamport.
pub const MAX_FLOAT_EXACT_LAMPORTS: u64 = 1 << 50;

/// Approximate display value, for rendering only. Use [`format_display`] for
/// an exact rendering.
pub fn lamports_to_display(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Converts a non-negative display amount to lamports.
///
/// Float noise below the representable precision is rounded away; anything that
/// still leaves a fraction of a lamport is rejected, as is anything above
/// [`MAX_FLOAT_EXACT_LAMPORTS`].
pub fn display_to_lamports(amount: f64) -> Result<u64, AmountError> {
    if !amount.is_finite() {
        return Err(AmountError::NotFinite);
    }
    if amount < 0.0 {
        return Err(AmountError::Negative);
    }
    let scaled = amount * LAMPORTS_PER_SOL as f64;
    if scaled >= u64::MAX as f64 {
        return Err(AmountError::Overflow);
    }
    let rounded = scaled.round();
    if rounded > MAX_FLOAT_EXACT_LAMPORTS as f64 {
        return Err(AmountError::BeyondFloatPrecision(amount.to_string()));
    }
    let tolerance = (scaled * f64::EPSILON * 4.0).max(1e-6);
    if (scaled - rounded).abs() > tolerance {
        return Err(AmountError::FractionalLamports(amount.to_string()));
    }
    Ok(rounded as u64)
}

/// Like [`display_to_lamports`] but for transfer amounts, which must be > 0.
pub fn transfer_lamports(amount: f64) -> Result<u64, AmountError> {
    if amount.is_finite() && amount <= 0.0 {
        return Err(AmountError::NotPositive);
    }
    match display_to_lamports(amount)? {
        0 => Err(AmountError::NotPositive),
        lamports => Ok(lamports),
    }
}

/// Transfer amount as a caller supplies it.
///
/// `Text` and `Lamports` are exact over the whole `u64` range; `Display` is
/// bounded by [`MAX_FLOAT_EXACT_LAMPORTS`].
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentAmount {
    Display(f64),
    Text(String),
    Lamports(u64),
}

impl PaymentAmount {
    /// Lamports to transfer; always > 0.
    pub fn to_lamports(&self) -> Result<u64, AmountError> {
        let lamports = match self {
            Self::Display(amount) => return transfer_lamports(*amount),
            Self::Text(text) => parse_display_amount(text)?,
            Self::Lamports(lamports) => *lamports,
        };
        if lamports == 0 {
            return Err(AmountError::NotPositive);
        }
        Ok(lamports)
    }
}

impl From<f64> for PaymentAmount {
    fn from(amount: f64) -> Self {
        Self::Display(amount)
    }
}

impl From<&str> for PaymentAmount {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PaymentAmount {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl fmt::Display for PaymentAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display(amount) => write!(f, "{amount}"),
            Self::Text(text) => f.write_str(text),
            Self::Lamports(lamports) => f.write_str(&format_display(*lamports)),
        }
    }
}

/// Exact decimal parse of a display amount such as `"0.5"` or `"12"`.
pub fn parse_display_amount(input: &str) -> Result<u64, AmountError> {
    let trimmed = input.trim();
    let malformed = || AmountError::Malformed(input.to_string());
    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(malformed());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }
    let significant = fraction.trim_end_matches('0');
    if significant.len() > DISPLAY_DECIMALS {
        return Err(AmountError::FractionalLamports(input.to_string()));
    }

    let whole_lamports = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|_| AmountError::Overflow)?
            .checked_mul(LAMPORTS_PER_SOL)
            .ok_or(AmountError::Overflow)?
    };
    let fraction_lamports = if significant.is_empty() {
        0
    } else {
        let padded = format!("{significant:0<width$}", width = DISPLAY_DECIMALS);
        padded.parse::<u64>().map_err(|_| malformed())?
    };
    whole_lamports
        .checked_add(fraction_lamports)
        .ok_or(AmountError::Overflow)
}

/// Renders lamports as a display amount without trailing zeros (`1.5`, `0`, `12`).
pub fn format_display(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let fraction = lamports % LAMPORTS_PER_SOL;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0width$}", width = DISPLAY_DECIMALS);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Evenly spaced samples over `[0, max]` plus both ends.
    fn spread(max: u64, count: u64) -> impl Iterator<Item = u64> {
        let step = (max / count).max(1);
        (0..count).map(move |i| i * step).chain([max])
    }

    #[test]
    fn lamports_round_trip_exactly_through_display_text() {
        let edges = [
            0u64,
            1,
            499_999_999,
            LAMPORTS_PER_SOL,
            580_000_000_000_000_001,
            4_353_714_059_169_197,
            u64::MAX - 1,
            u64::MAX,
        ];
        for lamports in spread(u64::MAX, 200_000).chain(edges) {
            assert_eq!(
                parse_display_amount(&format_display(lamports)),
                Ok(lamports),
                "round trip failed for {lamports}"
            );
        }
    }

    #[test]
    fn lamports_round_trip_through_float_display_within_exact_range() {
        // Dense window just below the bound, where float error peaks.
        let near_bound = MAX_FLOAT_EXACT_LAMPORTS - 100_000..=MAX_FLOAT_EXACT_LAMPORTS;
        for lamports in spread(MAX_FLOAT_EXACT_LAMPORTS, 200_000).chain(near_bound) {
            assert_eq!(
                display_to_lamports(lamports_to_display(lamports)),
                Ok(lamports),
                "round trip failed for {lamports}"
            );
        }
    }

    #[test]
    fn float_amounts_beyond_exact_range_are_rejected() {
        for lamports in [
            MAX_FLOAT_EXACT_LAMPORTS + LAMPORTS_PER_SOL,
            4_353_714_059_169_197,
            580_000_000_000_000_001,
        ] {
            assert!(matches!(
                display_to_lamports(lamports_to_display(lamports)),
                Err(AmountError::BeyondFloatPrecision(_))
            ));
        }
    }

    #[test]
    fn payment_amounts_convert_exactly() {
        assert_eq!(PaymentAmount::from(0.5).to_lamports(), Ok(500_000_000));
        assert_eq!(
            PaymentAmount::from("580000000.000000001").to_lamports(),
            Ok(580_000_000_000_000_001)
        );
        assert_eq!(PaymentAmount::Lamports(u64::MAX).to_lamports(), Ok(u64::MAX));
        assert_eq!(PaymentAmount::Lamports(0).to_lamports(), Err(AmountError::NotPositive));
        assert_eq!(PaymentAmount::from("0").to_lamports(), Err(AmountError::NotPositive));
        assert!(matches!(
            PaymentAmount::from("1e3").to_lamports(),
            Err(AmountError::Malformed(_))
        ));
        assert!(matches!(
            PaymentAmount::from(5_000_000.0).to_lamports(),
            Err(AmountError::BeyondFloatPrecision(_))
        ));
        assert_eq!(PaymentAmount::Lamports(1_500_000_000).to_string(), "1.5");
    }

    #[test]
    fn converts_common_amounts() {
        assert_eq!(transfer_lamports(0.5), Ok(500_000_000));
        assert_eq!(transfer_lamports(0.1), Ok(100_000_000));
        assert_eq!(transfer_lamports(1.0), Ok(LAMPORTS_PER_SOL));
        assert_eq!(transfer_lamports(0.000000001), Ok(1));
    }

    #[test]
    fn rejects_invalid_transfer_amounts() {
        assert_eq!(transfer_lamports(0.0), Err(AmountError::NotPositive));
        assert_eq!(transfer_lamports(-1.0), Err(AmountError::NotPositive));
        assert_eq!(transfer_lamports(f64::NAN), Err(AmountError::NotFinite));
        assert_eq!(transfer_lamports(f64::INFINITY), Err(AmountError::NotFinite));
        assert_eq!(transfer_lamports(1e12), Err(AmountError::Overflow));
        assert!(matches!(
            transfer_lamports(0.0000000015),
            Err(AmountError::FractionalLamports(_))
        ));
        assert!(matches!(
            transfer_lamports(1e-12),
            Err(AmountError::FractionalLamports(_))
        ));
    }

    #[test]
    fn parses_decimal_strings_exactly() {
        assert_eq!(parse_display_amount("0.5"), Ok(500_000_000));
        assert_eq!(parse_display_amount("12"), Ok(12 * LAMPORTS_PER_SOL));
        assert_eq!(parse_display_amount(".25"), Ok(250_000_000));
        assert_eq!(parse_display_amount("1.0000000010"), Ok(1_000_000_001));
        assert!(matches!(
            parse_display_amount("0.0000000001"),
            Err(AmountError::FractionalLamports(_))
        ));
        assert!(matches!(parse_display_amount("1.2.3"), Err(AmountError::Malformed(_))));
        assert!(matches!(parse_display_amount("-1"), Err(AmountError::Malformed(_))));
        assert!(matches!(parse_display_amount("."), Err(AmountError::Malformed(_))));
        assert_eq!(parse_display_amount("99999999999"), Err(AmountError::Overflow));
    }

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_display(0), "0");
        assert_eq!(format_display(1_500_000_000), "1.5");
        assert_eq!(format_display(1), "0.000000001");
        assert_eq!(format_display(12 * LAMPORTS_PER_SOL), "12");
    }
}
