//! Display-price parsing.
//!
//! Gift prices arrive as display text ("5,000", "1 250") because the
//! upstream detector extracts them from channel messages verbatim.

/// Parse a display price into a number.
///
/// Strips thousands separators and whitespace before parsing. An
/// unparsable price defaults to 0, which is below any positive minimum.
pub fn parse_price(display: &str) -> f64 {
    let cleaned: String = display
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_number() {
        assert_eq!(parse_price("500"), 500.0);
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(parse_price("1,250"), 1250.0);
        assert_eq!(parse_price("1,250,000"), 1_250_000.0);
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(parse_price(" 1 250 "), 1250.0);
        assert_eq!(parse_price("5\u{a0}000"), 5000.0);
    }

    #[test]
    fn test_decimal() {
        assert_eq!(parse_price("99.5"), 99.5);
    }

    #[test]
    fn test_unparsable_defaults_to_zero() {
        assert_eq!(parse_price("N/A"), 0.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("free"), 0.0);
    }
}
