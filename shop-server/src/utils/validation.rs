//! Boundary validation helpers for cart inputs

use shared::models::cart::CartItemInput;
use validator::ValidateEmail;

use crate::money::MAX_AMOUNT;
use crate::utils::AppError;

pub const MAX_QUANTITY: i32 = 999;
pub const MAX_TEXT_LEN: usize = 500;

fn require_finite(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::Validation(format!(
            "{field} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity <= 0 {
        return Err(AppError::Validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::Validation(format!(
            "quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

fn validate_optional_text(value: &Option<String>, field: &str) -> Result<(), AppError> {
    if let Some(text) = value
        && text.len() > MAX_TEXT_LEN
    {
        return Err(AppError::Validation(format!(
            "{field} exceeds maximum length ({MAX_TEXT_LEN})"
        )));
    }
    Ok(())
}

/// Validate a cart item input before it is stored
pub fn validate_cart_item(input: &CartItemInput) -> Result<(), AppError> {
    match input {
        CartItemInput::Customized { quantity, choices, .. } => {
            validate_quantity(*quantity)?;
            if choices.len() > 16 {
                return Err(AppError::Validation(
                    "too many customization choices".to_string(),
                ));
            }
            Ok(())
        }
        CartItemInput::InStock { quantity, .. } => validate_quantity(*quantity),
        CartItemInput::GiftCard {
            amount,
            recipient_email,
            recipient_name,
            message,
        } => {
            require_finite(*amount, "amount")?;
            if *amount <= 0.0 {
                return Err(AppError::Validation(format!(
                    "gift card amount must be positive, got {amount}"
                )));
            }
            if *amount > MAX_AMOUNT {
                return Err(AppError::Validation(format!(
                    "gift card amount exceeds maximum allowed ({MAX_AMOUNT})"
                )));
            }
            if !recipient_email.validate_email() {
                return Err(AppError::Validation(format!(
                    "invalid recipient email: {recipient_email}"
                )));
            }
            validate_optional_text(recipient_name, "recipient_name")?;
            validate_optional_text(message, "message")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gift(amount: f64, email: &str) -> CartItemInput {
        CartItemInput::GiftCard {
            amount,
            recipient_email: email.to_string(),
            recipient_name: None,
            message: None,
        }
    }

    #[test]
    fn test_gift_card_amount_must_be_positive_and_finite() {
        assert!(validate_cart_item(&gift(50.0, "ada@example.com")).is_ok());
        assert!(validate_cart_item(&gift(0.0, "ada@example.com")).is_err());
        assert!(validate_cart_item(&gift(-5.0, "ada@example.com")).is_err());
        assert!(validate_cart_item(&gift(f64::NAN, "ada@example.com")).is_err());
        assert!(validate_cart_item(&gift(2_000_000.0, "ada@example.com")).is_err());
    }

    #[test]
    fn test_gift_card_email_checked() {
        assert!(validate_cart_item(&gift(50.0, "not-an-email")).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        let item = CartItemInput::InStock {
            sku: "stock_sku:a".to_string(),
            quantity: 0,
        };
        assert!(validate_cart_item(&item).is_err());

        let item = CartItemInput::InStock {
            sku: "stock_sku:a".to_string(),
            quantity: 1000,
        };
        assert!(validate_cart_item(&item).is_err());

        let item = CartItemInput::InStock {
            sku: "stock_sku:a".to_string(),
            quantity: 3,
        };
        assert!(validate_cart_item(&item).is_ok());
    }
}
