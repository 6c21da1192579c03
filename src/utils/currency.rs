/// Currency utility functions.
///
/// All monetary values in the database are stored in cents (1 dollar = 100
/// cents) to avoid floating-point precision issues.

/// Convert cents to dollars (divide by 100)
pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Format cents as a dollar string with 2 decimal places
pub fn format_cents(cents: i64) -> String {
    format!("${:.2}", cents_to_dollars(cents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_to_dollars() {
        assert_eq!(cents_to_dollars(10000), 100.0);
        assert_eq!(cents_to_dollars(50), 0.50);
        assert_eq!(cents_to_dollars(12345), 123.45);
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(10000), "$100.00");
        assert_eq!(format_cents(50), "$0.50");
        assert_eq!(format_cents(5), "$0.05");
    }
}
