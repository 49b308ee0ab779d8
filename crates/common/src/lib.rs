//! Shared types for the Coding Sprout portal services.

pub mod error;

pub use error::{Error, FieldError, Result};

/// Format an amount in minor currency units (cents) as a dollar string.
pub fn format_usd(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, (cents % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0), "$0.00");
        assert_eq!(format_usd(5), "$0.05");
        assert_eq!(format_usd(12500), "$125.00");
        assert_eq!(format_usd(9999), "$99.99");
    }
}
