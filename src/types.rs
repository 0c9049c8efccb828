//! Core types and data structures for the accounting engine

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the business owns (Cash, Inventory, Equipment, etc.)
    Asset,
    /// Liabilities - what the business owes (Loans, Accounts Payable, etc.)
    Liability,
    /// Equity - owner's interest in the business (Capital, Retained Earnings, etc.)
    Equity,
    /// Revenue - money earned by the business
    Revenue,
    /// Expenses - costs incurred by the business
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    /// Assets and Expenses normally carry debit balances; Liabilities,
    /// Equity, and Revenue normally carry credit balances.
    pub fn normal_balance(&self) -> EntryType {
        match self {
            AccountType::Asset | AccountType::Expense => EntryType::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                EntryType::Credit
            }
        }
    }
}

/// Sides of a double-entry posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Debit - increases Assets and Expenses, decreases the rest
    Debit,
    /// Credit - increases Liabilities, Equity, and Revenue, decreases the rest
    Credit,
}

impl EntryType {
    /// The opposite side, used when reversing an entry.
    pub fn opposite(&self) -> EntryType {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }
}

/// A ledger account in the chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Unique, sortable account code ("1000", "4000", ...)
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Sub-classification used by reporting conventions
    /// ("cash", "bank", "cogs", "gst payable", "fixed asset", ...)
    pub sub_type: Option<String>,
    /// Inactive accounts refuse new postings but stay referenceable by history
    pub is_active: bool,
    /// Materialized balance in the account's normal-balance sense.
    /// Recomputable from the posted journal at any time.
    pub balance: BigDecimal,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

/// Input for creating an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub sub_type: Option<String>,
}

impl Account {
    /// Create a new account with a zero balance.
    pub fn new(id: String, data: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            code: data.code,
            name: data.name,
            account_type: data.account_type,
            sub_type: data.sub_type,
            is_active: true,
            balance: BigDecimal::from(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the cached balance for a posted line.
    /// The normal-balance side increases, the opposite side decreases.
    pub fn apply_line(&mut self, entry_type: EntryType, amount: &BigDecimal) {
        match (self.account_type.normal_balance(), entry_type) {
            (EntryType::Debit, EntryType::Debit) | (EntryType::Credit, EntryType::Credit) => {
                self.balance += amount;
            }
            (EntryType::Debit, EntryType::Credit) | (EntryType::Credit, EntryType::Debit) => {
                self.balance -= amount;
            }
        }
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// True when the sub-type matches `needle` case-insensitively.
    pub fn has_sub_type(&self, needle: &str) -> bool {
        self.sub_type
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(needle))
    }
}

/// Lifecycle state of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Editable, not reflected in any balance or report
    Draft,
    /// Immutable, reflected everywhere; undone only by reversal
    Posted,
}

/// One side of a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account being affected
    pub account_id: String,
    /// Debit or Credit
    pub entry_type: EntryType,
    /// Amount of the line, always positive
    pub amount: BigDecimal,
    /// Optional description for this specific line
    pub description: Option<String>,
    /// Bank reconciliation state, meaningful on lines touching a bank ledger account
    #[serde(default)]
    pub cleared: bool,
    #[serde(default)]
    pub cleared_date: Option<NaiveDate>,
}

impl JournalLine {
    pub fn new(
        account_id: String,
        entry_type: EntryType,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        Self {
            account_id,
            entry_type,
            amount,
            description,
            cleared: false,
            cleared_date: None,
        }
    }

    /// Create a debit line
    pub fn debit(account_id: String, amount: BigDecimal, description: Option<String>) -> Self {
        Self::new(account_id, EntryType::Debit, amount, description)
    }

    /// Create a credit line
    pub fn credit(account_id: String, amount: BigDecimal, description: Option<String>) -> Self {
        Self::new(account_id, EntryType::Credit, amount, description)
    }
}

/// A double-entry journal entry.
///
/// Entries carry an ordered list of lines that must balance. The two-leg
/// debit/credit pair is simply a two-element list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier for the entry
    pub id: String,
    /// Sequential number, unique within the fiscal year
    pub entry_number: u32,
    /// Fiscal-year label the number was allocated in ("FY2025-26")
    pub fiscal_year: String,
    /// Date the entry takes effect
    pub entry_date: NaiveDate,
    /// Optional reference (invoice number, cheque number, ...)
    pub reference: Option<String>,
    /// Description of the entry
    pub description: String,
    /// The balanced set of lines
    pub lines: Vec<JournalLine>,
    /// Draft or Posted
    pub status: EntryStatus,
    /// When the entry was created
    pub created_at: NaiveDateTime,
    /// When the entry was last updated
    pub updated_at: NaiveDateTime,
}

impl JournalEntry {
    /// Total of all debit lines
    pub fn total_debits(&self) -> BigDecimal {
        self.lines
            .iter()
            .filter(|l| l.entry_type == EntryType::Debit)
            .map(|l| &l.amount)
            .sum()
    }

    /// Total of all credit lines
    pub fn total_credits(&self) -> BigDecimal {
        self.lines
            .iter()
            .filter(|l| l.entry_type == EntryType::Credit)
            .map(|l| &l.amount)
            .sum()
    }

    /// Check that debits equal credits
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Sum of the lines touching `account_id`, signed in the given
    /// normal-balance sense.
    pub fn net_for_account(&self, account_id: &str, normal: EntryType) -> BigDecimal {
        let mut net = BigDecimal::from(0);
        for line in self.lines.iter().filter(|l| l.account_id == account_id) {
            if line.entry_type == normal {
                net += &line.amount;
            } else {
                net -= &line.amount;
            }
        }
        net
    }

    /// True when any line touches `account_id`.
    pub fn touches(&self, account_id: &str) -> bool {
        self.lines.iter().any(|l| l.account_id == account_id)
    }

    /// Validate the double-entry shape of the entry.
    pub fn validate(&self) -> EngineResult<()> {
        if self.lines.len() < 2 {
            return Err(EngineError::Validation(
                "journal entry must have at least two lines".to_string(),
            ));
        }

        for line in &self.lines {
            if line.amount <= BigDecimal::from(0) {
                return Err(EngineError::Validation(
                    "line amounts must be positive".to_string(),
                ));
            }
        }

        if !self.is_balanced() {
            return Err(EngineError::Validation(format!(
                "entry is not balanced: debits = {}, credits = {}",
                self.total_debits(),
                self.total_credits()
            )));
        }

        // The same account may appear on both sides of a larger entry, but
        // not twice on one side.
        let mut seen = std::collections::HashSet::new();
        for line in &self.lines {
            if !seen.insert((&line.account_id, line.entry_type)) {
                return Err(EngineError::Validation(format!(
                    "account '{}' appears more than once on the same side",
                    line.account_id
                )));
            }
        }

        // A debit and credit of the same single account says nothing.
        let distinct_accounts: std::collections::HashSet<&str> = self
            .lines
            .iter()
            .map(|l| l.account_id.as_str())
            .collect();
        if distinct_accounts.len() < 2 {
            return Err(EngineError::Validation(
                "journal entry must touch at least two distinct accounts".to_string(),
            ));
        }

        Ok(())
    }
}

/// Input for creating a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub entry_date: NaiveDate,
    pub reference: Option<String>,
    pub description: String,
    pub lines: Vec<JournalLine>,
    /// Defaults to Posted when omitted
    pub status: Option<EntryStatus>,
}

/// Account balance presented on its normal side, for trial balance and
/// statement rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account: Account,
    pub debit_balance: Option<BigDecimal>,
    pub credit_balance: Option<BigDecimal>,
}

impl AccountBalance {
    /// Present a signed normal-sense balance on the account's natural side,
    /// flipping to the other column when negative.
    pub fn from_normal_balance(account: Account, balance: BigDecimal) -> Self {
        let natural_side = account.account_type.normal_balance();
        let side = if balance >= BigDecimal::from(0) {
            natural_side
        } else {
            natural_side.opposite()
        };
        match side {
            EntryType::Debit => Self {
                account,
                debit_balance: Some(balance.abs()),
                credit_balance: None,
            },
            EntryType::Credit => Self {
                account,
                debit_balance: None,
                credit_balance: Some(balance.abs()),
            },
        }
    }

    /// Get the balance magnitude regardless of side
    pub fn balance_amount(&self) -> BigDecimal {
        self.debit_balance
            .clone()
            .or_else(|| self.credit_balance.clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }
}

/// Trial balance - snapshot of every account balance at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub as_of_date: NaiveDate,
    /// Rows ordered by account code
    pub rows: Vec<AccountBalance>,
    pub total_debits: BigDecimal,
    pub total_credits: BigDecimal,
    pub is_balanced: bool,
}

/// Errors surfaced by the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("referential integrity violation: {0}")]
    ReferentialIntegrity(String),
    #[error("cannot post on {date}: period locked through {lock_date}")]
    LockedPeriod {
        date: NaiveDate,
        lock_date: NaiveDate,
    },
    #[error("insufficient stock for item '{item_id}': requested {requested}, available {available}")]
    InsufficientStock {
        item_id: String,
        requested: BigDecimal,
        available: BigDecimal,
    },
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
