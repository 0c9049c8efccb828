//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::automation::RecurringTemplate;
use crate::inventory::{StockItem, StockMovement};
use crate::reconciliation::BankAccount;
use crate::reports::Budget;
use crate::types::*;

/// Filter for listing accounts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountFilter {
    pub account_type: Option<AccountType>,
    pub active_only: bool,
}

/// Filter for listing journal entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub account_id: Option<String>,
    pub status: Option<EntryStatus>,
}

impl EntryFilter {
    /// Posted entries dated on or before `as_of`.
    pub fn posted_through(as_of: NaiveDate) -> Self {
        Self {
            end_date: Some(as_of),
            status: Some(EntryStatus::Posted),
            ..Self::default()
        }
    }

    /// Posted entries within `[start, end]`.
    pub fn posted_between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            status: Some(EntryStatus::Posted),
            ..Self::default()
        }
    }
}

/// Storage abstraction for the engine.
///
/// All entities persist through this trait so the engine works against any
/// durable keyed backend (browser local storage, SQLite, in-memory, ...).
/// Implementations must return entries ordered by `(entry_date, entry_number)`
/// and accounts ordered by `code`; every running-balance computation
/// downstream relies on that ordering being stable and total.
#[async_trait]
pub trait EngineStorage: Send + Sync {
    // Chart of accounts
    async fn save_account(&mut self, account: &Account) -> EngineResult<()>;
    async fn get_account(&self, account_id: &str) -> EngineResult<Option<Account>>;
    async fn get_account_by_code(&self, code: &str) -> EngineResult<Option<Account>>;
    async fn list_accounts(&self, filter: &AccountFilter) -> EngineResult<Vec<Account>>;
    async fn update_account(&mut self, account: &Account) -> EngineResult<()>;
    async fn delete_account(&mut self, account_id: &str) -> EngineResult<()>;

    // Journal
    async fn save_entry(&mut self, entry: &JournalEntry) -> EngineResult<()>;
    async fn get_entry(&self, entry_id: &str) -> EngineResult<Option<JournalEntry>>;
    async fn list_entries(&self, filter: &EntryFilter) -> EngineResult<Vec<JournalEntry>>;
    async fn update_entry(&mut self, entry: &JournalEntry) -> EngineResult<()>;
    async fn delete_entry(&mut self, entry_id: &str) -> EngineResult<()>;
    /// Next sequential entry number within `fiscal_year`, starting at 1.
    async fn next_entry_number(&self, fiscal_year: &str) -> EngineResult<u32>;

    // Inventory
    async fn save_stock_item(&mut self, item: &StockItem) -> EngineResult<()>;
    async fn get_stock_item(&self, item_id: &str) -> EngineResult<Option<StockItem>>;
    async fn get_stock_item_by_sku(&self, sku: &str) -> EngineResult<Option<StockItem>>;
    async fn list_stock_items(&self) -> EngineResult<Vec<StockItem>>;
    async fn update_stock_item(&mut self, item: &StockItem) -> EngineResult<()>;
    async fn save_stock_movement(&mut self, movement: &StockMovement) -> EngineResult<()>;
    /// Movements for one item in `(date, insertion order)` order.
    async fn list_stock_movements(&self, item_id: &str) -> EngineResult<Vec<StockMovement>>;

    // Bank accounts
    async fn save_bank_account(&mut self, bank: &BankAccount) -> EngineResult<()>;
    async fn get_bank_account(&self, bank_id: &str) -> EngineResult<Option<BankAccount>>;
    async fn list_bank_accounts(&self) -> EngineResult<Vec<BankAccount>>;
    async fn update_bank_account(&mut self, bank: &BankAccount) -> EngineResult<()>;

    // Budgets
    async fn save_budget(&mut self, budget: &Budget) -> EngineResult<()>;
    async fn get_budget(&self, budget_id: &str) -> EngineResult<Option<Budget>>;
    async fn list_budgets(&self) -> EngineResult<Vec<Budget>>;
    async fn delete_budget(&mut self, budget_id: &str) -> EngineResult<()>;

    // Recurring templates
    async fn save_template(&mut self, template: &RecurringTemplate) -> EngineResult<()>;
    async fn get_template(&self, template_id: &str) -> EngineResult<Option<RecurringTemplate>>;
    async fn list_templates(&self) -> EngineResult<Vec<RecurringTemplate>>;
    async fn update_template(&mut self, template: &RecurringTemplate) -> EngineResult<()>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> EngineResult<()>;
}

/// Trait for implementing custom journal-entry validation rules
pub trait EntryValidator: Send + Sync {
    /// Validate an entry before saving
    fn validate_entry(&self, entry: &JournalEntry) -> EngineResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> EngineResult<()> {
        if account.code.trim().is_empty() {
            return Err(EngineError::Validation(
                "account code cannot be empty".to_string(),
            ));
        }
        if account.name.trim().is_empty() {
            return Err(EngineError::Validation(
                "account name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default entry validator enforcing the double-entry rules
pub struct DefaultEntryValidator;

impl EntryValidator for DefaultEntryValidator {
    fn validate_entry(&self, entry: &JournalEntry) -> EngineResult<()> {
        entry.validate()
    }
}

/// Severity of a flagged transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A transaction flagged by the anomaly classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Id of the flagged journal entry
    pub entry_id: String,
    /// Human-readable reason
    pub reason: String,
    pub severity: Severity,
}

/// Strategy interface for anomaly detection over recent journal entries.
///
/// Implementations receive a read-only snapshot and return flags; the engine
/// holds no detection logic of its own. A deterministic rule-based
/// implementation ships in [`crate::automation`]; an LLM-backed one satisfies
/// the same contract. Detection is advisory: the caller time-bounds the call
/// and swallows failures.
#[async_trait]
pub trait AnomalyClassifier: Send + Sync {
    async fn classify(&self, entries: &[JournalEntry]) -> EngineResult<Vec<Anomaly>>;
}
