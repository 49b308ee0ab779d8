//! Server-side price resolution.
//!
//! The amount charged is always derived here from the class record and the
//! requested options; client-supplied amounts are never trusted.

use sprout_common::{Error, Result};

use crate::models::{ClassOffering, PaymentMethod};

/// Resolve the amount in cents for a registration.
///
/// One-on-one pricing wins when requested and offered; charter pricing
/// applies to charter payments when the class has one; otherwise the base
/// group price. Requesting one-on-one for a class that does not allow it is
/// a validation rejection.
pub fn resolve_amount_cents(
    class: &ClassOffering,
    is_one_on_one: bool,
    payment_method: PaymentMethod,
) -> Result<i64> {
    if is_one_on_one && !class.allows_one_on_one {
        return Err(Error::invalid_field(
            "is_one_on_one",
            "This class does not offer one-on-one sessions",
        ));
    }

    if is_one_on_one {
        if let Some(price) = class.one_on_one_price_cents {
            return Ok(price);
        }
    }
    if payment_method == PaymentMethod::CharterSchool {
        if let Some(price) = class.charter_price_cents {
            return Ok(price);
        }
    }
    Ok(class.price_cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use sqlx::types::Json;

    fn class(allows_one_on_one: bool) -> ClassOffering {
        ClassOffering {
            id: "class-1".to_string(),
            name: "Intro to Scratch".to_string(),
            description: None,
            grade_levels: Json(vec!["3rd".to_string(), "4th".to_string()]),
            start_date: NaiveDate::from_ymd_opt(2030, 9, 1).unwrap(),
            end_date: None,
            start_time: "16:00".to_string(),
            end_time: "17:00".to_string(),
            price_cents: 12_000,
            charter_price_cents: Some(10_000),
            one_on_one_price_cents: Some(20_000),
            max_spots: 10,
            spots_taken: 0,
            is_online: true,
            meeting_link: Some("https://meet.example.com/scratch".to_string()),
            location: None,
            allows_one_on_one,
            is_published: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_card_uses_base_price() {
        let amount = resolve_amount_cents(&class(true), false, PaymentMethod::Card).unwrap();
        assert_eq!(amount, 12_000);
    }

    #[test]
    fn test_charter_price_applies_to_charter_payments() {
        let amount =
            resolve_amount_cents(&class(true), false, PaymentMethod::CharterSchool).unwrap();
        assert_eq!(amount, 10_000);
    }

    #[test]
    fn test_charter_without_charter_price_falls_back() {
        let mut c = class(true);
        c.charter_price_cents = None;
        let amount = resolve_amount_cents(&c, false, PaymentMethod::CharterSchool).unwrap();
        assert_eq!(amount, 12_000);
    }

    #[test]
    fn test_one_on_one_price_wins() {
        let amount = resolve_amount_cents(&class(true), true, PaymentMethod::Card).unwrap();
        assert_eq!(amount, 20_000);

        // Even for charter payments, the one-on-one rate takes precedence.
        let amount =
            resolve_amount_cents(&class(true), true, PaymentMethod::CharterSchool).unwrap();
        assert_eq!(amount, 20_000);
    }

    #[test]
    fn test_one_on_one_without_rate_falls_back() {
        let mut c = class(true);
        c.one_on_one_price_cents = None;
        let amount = resolve_amount_cents(&c, true, PaymentMethod::Card).unwrap();
        assert_eq!(amount, 12_000);
    }

    #[test]
    fn test_one_on_one_rejected_when_not_offered() {
        let result = resolve_amount_cents(&class(false), true, PaymentMethod::Card);
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
