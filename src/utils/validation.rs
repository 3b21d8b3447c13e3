//! Field validation helpers

use bigdecimal::BigDecimal;

use crate::types::*;
use crate::utils::money::is_positive;

/// Validate that an obligation or event description is usable
pub fn validate_description(description: &str) -> FinanceResult<()> {
    if description.trim().is_empty() {
        return Err(FinanceError::Validation(
            "description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(FinanceError::Validation(
            "description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an amount is strictly positive
pub fn validate_positive_amount(amount: &BigDecimal) -> FinanceResult<()> {
    if !is_positive(amount) {
        return Err(FinanceError::Validation(
            "amount must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Validate an installment count; a split needs at least two slices
pub fn validate_installment_count(count: u32) -> FinanceResult<()> {
    if count < 2 {
        return Err(FinanceError::Validation(
            "installment count must be at least 2".to_string(),
        ));
    }
    Ok(())
}

/// Validate a negotiation adjustment percentage
pub fn validate_percentage(pct: &BigDecimal) -> FinanceResult<()> {
    if pct < &BigDecimal::from(0) {
        return Err(FinanceError::Validation(
            "percentage cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_description() {
        assert!(validate_description("  ").is_err());
        assert!(validate_description("Aluguel").is_ok());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount(&BigDecimal::from(-5)).is_err());
        assert!(validate_positive_amount(&BigDecimal::from(1)).is_ok());
    }

    #[test]
    fn rejects_single_installment() {
        assert!(validate_installment_count(1).is_err());
        assert!(validate_installment_count(2).is_ok());
    }
}
