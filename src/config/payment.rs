//! Payment details configuration

use serde::Deserialize;

use crate::application::PaymentDetails;

use super::error::ValidationError;

/// Bank transfer details shown to users. Display only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Recipient name
    pub recipient: String,

    /// Account number
    pub iban: String,

    /// Bank name
    pub bank: String,
}

impl PaymentConfig {
    pub fn details(&self) -> PaymentDetails {
        PaymentDetails {
            recipient: self.recipient.clone(),
            iban: self.iban.clone(),
            bank: self.bank.clone(),
        }
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.recipient.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__RECIPIENT"));
        }
        if self.iban.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__IBAN"));
        }
        if self.bank.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__BANK"));
        }
        Ok(())
    }
}
