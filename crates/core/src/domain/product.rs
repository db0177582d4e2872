use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: Decimal,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal) -> Result<Self, DomainError> {
        let product = Self { name: name.into(), price };
        product.validate()?;
        Ok(product)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("product name must not be empty".into()));
        }
        if self.price.is_sign_negative() {
            return Err(DomainError::InvariantViolation(format!(
                "product `{}` has a negative price",
                self.name
            )));
        }
        Ok(())
    }

    /// Price rounded half away from zero and always rendered with two decimals.
    pub fn display_price(&self) -> String {
        let rounded = self.price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2}")
    }
}
