//! Validation utilities

use bigdecimal::BigDecimal;

use crate::traits::*;
use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> EngineResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(EngineError::Validation(
            "amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate an account code
pub fn validate_account_code(code: &str) -> EngineResult<()> {
    if code.trim().is_empty() {
        return Err(EngineError::Validation(
            "account code cannot be empty".to_string(),
        ));
    }
    if code.len() > 20 {
        return Err(EngineError::Validation(
            "account code cannot exceed 20 characters".to_string(),
        ));
    }
    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(EngineError::Validation(
            "account code can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate an account name
pub fn validate_account_name(name: &str) -> EngineResult<()> {
    if name.trim().is_empty() {
        return Err(EngineError::Validation(
            "account name cannot be empty".to_string(),
        ));
    }
    if name.len() > 100 {
        return Err(EngineError::Validation(
            "account name cannot exceed 100 characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate an entry description
pub fn validate_description(description: &str) -> EngineResult<()> {
    if description.trim().is_empty() {
        return Err(EngineError::Validation(
            "description cannot be empty".to_string(),
        ));
    }
    if description.len() > 500 {
        return Err(EngineError::Validation(
            "description cannot exceed 500 characters".to_string(),
        ));
    }
    Ok(())
}

/// Entry validator with stricter field checks than the default
pub struct EnhancedEntryValidator;

impl EntryValidator for EnhancedEntryValidator {
    fn validate_entry(&self, entry: &JournalEntry) -> EngineResult<()> {
        entry.validate()?;
        validate_description(&entry.description)?;
        for line in &entry.lines {
            validate_positive_amount(&line.amount)?;
        }
        Ok(())
    }
}

/// Account validator with stricter field checks than the default
pub struct EnhancedAccountValidator;

impl AccountValidator for EnhancedAccountValidator {
    fn validate_account(&self, account: &Account) -> EngineResult<()> {
        validate_account_code(&account.code)?;
        validate_account_name(&account.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountRegistry;
    use crate::utils::memory_store::MemoryStore;

    #[test]
    fn positive_amounts_only() {
        assert!(validate_positive_amount(&BigDecimal::from(1)).is_ok());
        assert!(validate_positive_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_positive_amount(&BigDecimal::from(-5)).is_err());
    }

    #[test]
    fn account_code_shape() {
        assert!(validate_account_code("1000").is_ok());
        assert!(validate_account_code("GST-2200").is_ok());
        assert!(validate_account_code("").is_err());
        assert!(validate_account_code("bad code").is_err());
        assert!(validate_account_code(&"x".repeat(21)).is_err());
    }

    #[tokio::test]
    async fn enhanced_validator_rejects_bad_code() {
        let mut registry = AccountRegistry::with_validator(
            MemoryStore::new(),
            Box::new(EnhancedAccountValidator),
        );
        let result = registry
            .create_account(NewAccount {
                code: "not a code".to_string(),
                name: "Broken".to_string(),
                account_type: AccountType::Asset,
                sub_type: None,
            })
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
}
