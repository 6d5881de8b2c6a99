use thiserror::Error;

/// Money is held as integer cents so balances never drift.
/// 1 unit = 100 cents, so $50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a two-decimal amount.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount format: '{0}'")]
    InvalidFormat(String),

    #[error("amount is too large: '{0}'")]
    Overflow(String),
}

/// Parse a user-typed decimal amount into cents.
///
/// Accepts an optional sign and an optional `$` prefix. Digits past the
/// second decimal place round half-up, so "0.005" -> 1 and "12.344" -> 1234.
/// Sign is preserved: validating that an amount is positive is the ledger's job.
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseAmountError::Empty);
    }
    let invalid = || ParseAmountError::InvalidFormat(trimmed.to_string());
    let overflow = || ParseAmountError::Overflow(trimmed.to_string());

    let (negative, rest) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest);

    let (units_str, decimals_str) = match rest.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (rest, ""),
    };
    if units_str.is_empty() && decimals_str.is_empty() {
        return Err(invalid());
    }
    if !units_str.bytes().all(|b| b.is_ascii_digit())
        || !decimals_str.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| overflow())?
    };

    let digits: Vec<i64> = decimals_str.bytes().map(|b| i64::from(b - b'0')).collect();
    let tenths = digits.first().copied().unwrap_or(0);
    let hundredths = digits.get(1).copied().unwrap_or(0);
    let round_up = digits.get(2).is_some_and(|d| *d >= 5);

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
        .ok_or_else(overflow)?;

    Ok(if negative { -cents } else { cents })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
        assert_eq!(format_cents(Cents::MIN), "-92233720368547758.08");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50.00"), Ok(5000));
        assert_eq!(parse_amount("50"), Ok(5000));
        assert_eq!(parse_amount("12.5"), Ok(1250));
        assert_eq!(parse_amount(".50"), Ok(50));
        assert_eq!(parse_amount("7."), Ok(700));
        assert_eq!(parse_amount("  1000.00\n"), Ok(100000));
        assert_eq!(parse_amount("$19.99"), Ok(1999));
        assert_eq!(parse_amount("-50.00"), Ok(-5000));
        assert_eq!(parse_amount("+3"), Ok(300));
        assert_eq!(parse_amount("0"), Ok(0));
    }

    #[test]
    fn test_parse_amount_rounds_half_up() {
        assert_eq!(parse_amount("0.005"), Ok(1));
        assert_eq!(parse_amount("0.004"), Ok(0));
        assert_eq!(parse_amount("12.344"), Ok(1234));
        assert_eq!(parse_amount("12.3456"), Ok(1235));
        assert_eq!(parse_amount("0.999"), Ok(100));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), Err(ParseAmountError::Empty));
        assert_eq!(parse_amount("   "), Err(ParseAmountError::Empty));
        assert!(matches!(
            parse_amount("abc"),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("12.34.56"),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("."),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("1e3"),
            Err(ParseAmountError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_amount("--5"),
            Err(ParseAmountError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_amount_overflow() {
        assert!(matches!(
            parse_amount("92233720368547758.08"),
            Err(ParseAmountError::Overflow(_))
        ));
        assert!(matches!(
            parse_amount("99999999999999999999999"),
            Err(ParseAmountError::Overflow(_))
        ));
    }
}
