//! Chart of accounts management

use std::collections::HashMap;

use crate::traits::*;
use crate::types::*;

/// Registry for chart-of-accounts operations
pub struct AccountRegistry<S: EngineStorage> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: EngineStorage> AccountRegistry<S> {
    /// Create a new registry
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new registry with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new account with a zero opening balance.
    pub async fn create_account(&mut self, data: NewAccount) -> EngineResult<Account> {
        let account = Account::new(uuid::Uuid::new_v4().to_string(), data);

        self.validator.validate_account(&account)?;

        if self
            .storage
            .get_account_by_code(&account.code)
            .await?
            .is_some()
        {
            return Err(EngineError::Validation(format!(
                "account with code '{}' already exists",
                account.code
            )));
        }

        self.storage.save_account(&account).await?;
        tracing::debug!(code = %account.code, name = %account.name, "account created");

        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> EngineResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: &str) -> EngineResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account '{account_id}'")))
    }

    /// Get an account by code
    pub async fn get_account_by_code(&self, code: &str) -> EngineResult<Option<Account>> {
        self.storage.get_account_by_code(code).await
    }

    /// List accounts ordered by code, optionally filtered
    pub async fn list_accounts(&self, filter: &AccountFilter) -> EngineResult<Vec<Account>> {
        self.storage.list_accounts(filter).await
    }

    /// Soft-deactivate an account.
    ///
    /// Inactive accounts refuse new postings but stay visible in history
    /// and reports.
    pub async fn deactivate_account(&mut self, account_id: &str) -> EngineResult<Account> {
        let mut account = self.get_account_required(account_id).await?;
        account.is_active = false;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    /// Reactivate a previously deactivated account.
    pub async fn reactivate_account(&mut self, account_id: &str) -> EngineResult<Account> {
        let mut account = self.get_account_required(account_id).await?;
        account.is_active = true;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    /// Delete an account.
    ///
    /// Fails if any journal entry, draft or posted, references the account;
    /// referenced accounts can only be deactivated.
    pub async fn delete_account(&mut self, account_id: &str) -> EngineResult<()> {
        self.get_account_required(account_id).await?;

        let entries = self
            .storage
            .list_entries(&EntryFilter {
                account_id: Some(account_id.to_string()),
                ..EntryFilter::default()
            })
            .await?;
        if !entries.is_empty() {
            return Err(EngineError::ReferentialIntegrity(format!(
                "account '{}' is referenced by {} journal entries",
                account_id,
                entries.len()
            )));
        }

        self.storage.delete_account(account_id).await
    }
}

/// Utility functions for working with accounts
pub mod standard_chart {
    use super::*;

    /// Seed a standard small-business chart of accounts.
    ///
    /// Codes follow the usual 1xxx assets / 2xxx liabilities / 3xxx equity /
    /// 4xxx revenue / 5xxx+ expenses convention; sub-types carry the tags the
    /// reporting engine keys on.
    pub async fn create_standard_chart<S: EngineStorage>(
        registry: &mut AccountRegistry<S>,
    ) -> EngineResult<HashMap<String, Account>> {
        let specs: [(&str, &str, &str, AccountType, Option<&str>); 13] = [
            ("cash", "1000", "Cash", AccountType::Asset, Some("cash")),
            ("bank", "1100", "Bank", AccountType::Asset, Some("bank")),
            (
                "accounts_receivable",
                "1200",
                "Accounts Receivable",
                AccountType::Asset,
                Some("receivable"),
            ),
            (
                "inventory",
                "1300",
                "Inventory",
                AccountType::Asset,
                Some("inventory"),
            ),
            (
                "gst_receivable",
                "1400",
                "GST Receivable",
                AccountType::Asset,
                Some("gst receivable"),
            ),
            (
                "equipment",
                "1500",
                "Equipment",
                AccountType::Asset,
                Some("fixed asset"),
            ),
            (
                "accounts_payable",
                "2000",
                "Accounts Payable",
                AccountType::Liability,
                Some("payable"),
            ),
            (
                "gst_payable",
                "2200",
                "GST Payable",
                AccountType::Liability,
                Some("gst payable"),
            ),
            (
                "loans_payable",
                "2100",
                "Loans Payable",
                AccountType::Liability,
                Some("loan"),
            ),
            (
                "owners_equity",
                "3000",
                "Owner's Equity",
                AccountType::Equity,
                Some("capital"),
            ),
            (
                "sales_revenue",
                "4000",
                "Sales Revenue",
                AccountType::Revenue,
                Some("sales"),
            ),
            (
                "cost_of_goods_sold",
                "5000",
                "Cost of Goods Sold",
                AccountType::Expense,
                Some("cogs"),
            ),
            (
                "rent_expense",
                "6000",
                "Rent Expense",
                AccountType::Expense,
                Some("rent"),
            ),
        ];

        let mut accounts = HashMap::new();
        for (key, code, name, account_type, sub_type) in specs {
            let account = registry
                .create_account(NewAccount {
                    code: code.to_string(),
                    name: name.to_string(),
                    account_type,
                    sub_type: sub_type.map(str::to_string),
                })
                .await?;
            accounts.insert(key.to_string(), account);
        }

        Ok(accounts)
    }
}
