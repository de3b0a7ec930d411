//! Turns a loosely-typed `POST /send` body into a [`PaymentInstruction`].

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::api::models::transactions::{Currency, SendPaymentRequest};
use crate::errors::{Error, FieldError};
use crate::payments::PaymentInstruction;

pub const MIN_RECIPIENT_CHARS: usize = 2;
pub const MAX_RECIPIENT_CHARS: usize = 100;

/// Smallest accepted amount, 0.01
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Check every field, reporting all problems at once.
pub fn validate(request: &SendPaymentRequest, max_amount: Decimal) -> Result<PaymentInstruction, Error> {
    let mut errors = Vec::new();

    let recipient = check_recipient(request.recipient.as_deref(), &mut errors);
    let amount = check_amount(request.amount.as_ref(), max_amount, &mut errors);
    let currency = check_currency(request.currency.as_deref(), &mut errors);

    match (recipient, amount, currency) {
        (Some(recipient), Some(amount), Some(currency)) => Ok(PaymentInstruction {
            recipient,
            amount,
            currency,
        }),
        _ => Err(Error::Validation { errors }),
    }
}

fn check_recipient(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<String> {
    let recipient = raw.map(str::trim).unwrap_or_default();
    let chars = recipient.chars().count();
    if chars == 0 {
        errors.push(FieldError::new("recipient", "recipient is required"));
        None
    } else if chars < MIN_RECIPIENT_CHARS {
        errors.push(FieldError::new(
            "recipient",
            format!("recipient must be at least {MIN_RECIPIENT_CHARS} characters long"),
        ));
        None
    } else if chars > MAX_RECIPIENT_CHARS {
        errors.push(FieldError::new(
            "recipient",
            format!("recipient must be at most {MAX_RECIPIENT_CHARS} characters long"),
        ));
        None
    } else {
        Some(recipient.to_string())
    }
}

fn check_amount(raw: Option<&Value>, max_amount: Decimal, errors: &mut Vec<FieldError>) -> Option<Decimal> {
    let parsed = match raw {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("amount", "amount is required"));
            return None;
        }
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        Some(_) => None,
    };

    let Some(amount) = parsed else {
        errors.push(FieldError::new("amount", "amount must be a number"));
        return None;
    };

    if amount < MIN_AMOUNT {
        errors.push(FieldError::new("amount", format!("amount must be at least {MIN_AMOUNT}")));
        None
    } else if amount > max_amount {
        errors.push(FieldError::new("amount", format!("amount must not exceed {max_amount}")));
        None
    } else if amount.normalize().scale() > 2 {
        errors.push(FieldError::new("amount", "amount must have at most 2 decimal places"));
        None
    } else {
        Some(amount)
    }
}

/// Plain or scientific notation, as JSON numbers may render either way.
fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok()
}

fn check_currency(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<Currency> {
    match raw.map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("currency", "currency is required"));
            None
        }
        Some(code) => match Currency::from_str(code) {
            Ok(currency) => Some(currency),
            Err(_) => {
                let allowed = Currency::ALL.iter().map(Currency::code).collect::<Vec<_>>().join(", ");
                errors.push(FieldError::new("currency", format!("currency must be one of [{allowed}]")));
                None
            }
        },
    }
}
