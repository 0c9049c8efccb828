//! Journal entry validation, posting, and reversal

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::sync::Arc;

use crate::config::EngineSettings;
use crate::traits::*;
use crate::types::*;

/// Journal engine enforcing double-entry correctness.
///
/// Every mutation validates completely before the first write, so a failed
/// call leaves no partial state. Posted entries are immutable; the only way
/// to undo one is a reversal entry.
pub struct JournalEngine<S: EngineStorage> {
    pub(crate) storage: S,
    settings: Arc<EngineSettings>,
    validator: Box<dyn EntryValidator>,
}

impl<S: EngineStorage> JournalEngine<S> {
    /// Create a new journal engine
    pub fn new(storage: S, settings: Arc<EngineSettings>) -> Self {
        Self {
            storage,
            settings,
            validator: Box::new(DefaultEntryValidator),
        }
    }

    /// Create a new journal engine with a custom validator
    pub fn with_validator(
        storage: S,
        settings: Arc<EngineSettings>,
        validator: Box<dyn EntryValidator>,
    ) -> Self {
        Self {
            storage,
            settings,
            validator,
        }
    }

    /// Create a journal entry.
    ///
    /// Validates the double-entry shape, the lock date, and every referenced
    /// account (must exist and be active), then allocates the next entry
    /// number in the entry date's fiscal year. Status defaults to Posted;
    /// posting applies the lines to the cached account balances.
    pub async fn create_entry(&mut self, data: NewJournalEntry) -> EngineResult<JournalEntry> {
        if self.settings.is_date_locked(data.entry_date) {
            return Err(EngineError::LockedPeriod {
                date: data.entry_date,
                // is_date_locked only returns true when a lock date is set
                lock_date: self.settings.lock_date.expect("lock date present"),
            });
        }

        let status = data.status.unwrap_or(EntryStatus::Posted);
        let fiscal_year = self.settings.fiscal_year(data.entry_date);
        let entry_number = self.storage.next_entry_number(&fiscal_year).await?;

        let now = chrono::Utc::now().naive_utc();
        let entry = JournalEntry {
            id: uuid::Uuid::new_v4().to_string(),
            entry_number,
            fiscal_year,
            entry_date: data.entry_date,
            reference: data.reference,
            description: data.description,
            lines: data.lines,
            status,
            created_at: now,
            updated_at: now,
        };

        self.validator.validate_entry(&entry)?;
        self.check_account_references(&entry).await?;

        self.storage.save_entry(&entry).await?;
        if entry.status == EntryStatus::Posted {
            self.apply_to_balances(&entry).await?;
        }

        tracing::debug!(
            entry_number = entry.entry_number,
            fiscal_year = %entry.fiscal_year,
            status = ?entry.status,
            "journal entry recorded"
        );

        Ok(entry)
    }

    /// Promote a draft entry to posted.
    ///
    /// Re-runs the same validations as posting a fresh entry; the lock date
    /// may have advanced since the draft was written.
    pub async fn post_entry(&mut self, entry_id: &str) -> EngineResult<JournalEntry> {
        let mut entry = self.get_entry_required(entry_id).await?;
        if entry.status == EntryStatus::Posted {
            return Err(EngineError::Validation(format!(
                "entry '{entry_id}' is already posted"
            )));
        }

        if self.settings.is_date_locked(entry.entry_date) {
            return Err(EngineError::LockedPeriod {
                date: entry.entry_date,
                lock_date: self.settings.lock_date.expect("lock date present"),
            });
        }
        self.validator.validate_entry(&entry)?;
        self.check_account_references(&entry).await?;

        entry.status = EntryStatus::Posted;
        entry.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_entry(&entry).await?;
        self.apply_to_balances(&entry).await?;

        Ok(entry)
    }

    /// Reverse a posted entry.
    ///
    /// Creates a new posted entry with every line's side swapped and
    /// identical amounts, dated `reversal_date`. The original entry is never
    /// mutated; the pair nets to zero in every projection.
    pub async fn reverse_entry(
        &mut self,
        entry_id: &str,
        reversal_date: NaiveDate,
    ) -> EngineResult<JournalEntry> {
        let original = self.get_entry_required(entry_id).await?;
        if original.status != EntryStatus::Posted {
            return Err(EngineError::Validation(format!(
                "only posted entries can be reversed; entry '{entry_id}' is a draft"
            )));
        }

        let lines = original
            .lines
            .iter()
            .map(|line| {
                JournalLine::new(
                    line.account_id.clone(),
                    line.entry_type.opposite(),
                    line.amount.clone(),
                    line.description.clone(),
                )
            })
            .collect();

        self.create_entry(NewJournalEntry {
            entry_date: reversal_date,
            reference: Some(format!("REV-{}", original.entry_number)),
            description: format!("Reversal of: {}", original.description),
            lines,
            status: Some(EntryStatus::Posted),
        })
        .await
    }

    /// Update a draft entry in place. Posted entries are immutable.
    pub async fn update_draft(
        &mut self,
        entry_id: &str,
        data: NewJournalEntry,
    ) -> EngineResult<JournalEntry> {
        let mut entry = self.get_entry_required(entry_id).await?;
        if entry.status == EntryStatus::Posted {
            return Err(EngineError::Validation(format!(
                "posted entry '{entry_id}' is immutable; reverse it instead"
            )));
        }

        entry.entry_date = data.entry_date;
        entry.reference = data.reference;
        entry.description = data.description;
        entry.lines = data.lines;
        entry.updated_at = chrono::Utc::now().naive_utc();

        self.validator.validate_entry(&entry)?;
        self.check_account_references(&entry).await?;
        self.storage.update_entry(&entry).await?;

        Ok(entry)
    }

    /// Delete a draft entry. Posted entries are immutable.
    pub async fn delete_draft(&mut self, entry_id: &str) -> EngineResult<()> {
        let entry = self.get_entry_required(entry_id).await?;
        if entry.status == EntryStatus::Posted {
            return Err(EngineError::Validation(format!(
                "posted entry '{entry_id}' cannot be deleted; reverse it instead"
            )));
        }
        self.storage.delete_entry(entry_id).await
    }

    /// Get an entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> EngineResult<Option<JournalEntry>> {
        self.storage.get_entry(entry_id).await
    }

    /// Get an entry by ID, returning an error if not found
    pub async fn get_entry_required(&self, entry_id: &str) -> EngineResult<JournalEntry> {
        self.storage
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("journal entry '{entry_id}'")))
    }

    /// List entries in stable `(entry_date, entry_number)` order.
    pub async fn get_entries(&self, filter: &EntryFilter) -> EngineResult<Vec<JournalEntry>> {
        self.storage.list_entries(filter).await
    }

    /// Every referenced account must exist and accept postings.
    async fn check_account_references(&self, entry: &JournalEntry) -> EngineResult<()> {
        for line in &entry.lines {
            let account = self
                .storage
                .get_account(&line.account_id)
                .await?
                .ok_or_else(|| {
                    EngineError::ReferentialIntegrity(format!(
                        "account '{}' does not exist",
                        line.account_id
                    ))
                })?;
            if !account.is_active {
                return Err(EngineError::ReferentialIntegrity(format!(
                    "account '{}' ({}) is inactive",
                    account.code, account.name
                )));
            }
        }
        Ok(())
    }

    /// Apply a posted entry's lines to the cached account balances.
    async fn apply_to_balances(&mut self, entry: &JournalEntry) -> EngineResult<()> {
        for line in &entry.lines {
            let mut account = self
                .storage
                .get_account(&line.account_id)
                .await?
                .ok_or_else(|| {
                    EngineError::ReferentialIntegrity(format!(
                        "account '{}' disappeared while posting",
                        line.account_id
                    ))
                })?;
            account.apply_line(line.entry_type, &line.amount);
            self.storage.update_account(&account).await?;
        }
        Ok(())
    }
}

/// Builder for assembling journal entries line by line
#[derive(Debug)]
pub struct EntryBuilder {
    entry_date: NaiveDate,
    reference: Option<String>,
    description: String,
    lines: Vec<JournalLine>,
    status: Option<EntryStatus>,
}

impl EntryBuilder {
    /// Start a new entry for `entry_date`
    pub fn new(entry_date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            entry_date,
            reference: None,
            description: description.into(),
            lines: Vec::new(),
            status: None,
        }
    }

    /// Set the reference (invoice number, cheque number, ...)
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Keep the entry as an editable draft
    pub fn draft(mut self) -> Self {
        self.status = Some(EntryStatus::Draft);
        self
    }

    /// Add a debit line
    pub fn debit(mut self, account_id: impl Into<String>, amount: BigDecimal) -> Self {
        self.lines
            .push(JournalLine::debit(account_id.into(), amount, None));
        self
    }

    /// Add a credit line
    pub fn credit(mut self, account_id: impl Into<String>, amount: BigDecimal) -> Self {
        self.lines
            .push(JournalLine::credit(account_id.into(), amount, None));
        self
    }

    /// Add a custom line
    pub fn line(mut self, line: JournalLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Finish building
    pub fn build(self) -> NewJournalEntry {
        NewJournalEntry {
            entry_date: self.entry_date,
            reference: self.reference,
            description: self.description,
            lines: self.lines,
            status: self.status,
        }
    }
}

/// Common entry shapes
pub mod patterns {
    use super::*;

    /// Simple two-leg entry: debit one account, credit another.
    pub fn transfer(
        date: NaiveDate,
        description: impl Into<String>,
        debit_account_id: impl Into<String>,
        credit_account_id: impl Into<String>,
        amount: BigDecimal,
    ) -> NewJournalEntry {
        EntryBuilder::new(date, description)
            .debit(debit_account_id, amount.clone())
            .credit(credit_account_id, amount)
            .build()
    }

    /// Cash sale: debit cash/receivables, credit revenue.
    pub fn sale(
        date: NaiveDate,
        description: impl Into<String>,
        cash_or_receivable_id: impl Into<String>,
        revenue_account_id: impl Into<String>,
        amount: BigDecimal,
    ) -> NewJournalEntry {
        transfer(
            date,
            description,
            cash_or_receivable_id,
            revenue_account_id,
            amount,
        )
    }

    /// Expense payment: debit expense, credit cash/payables.
    pub fn expense_payment(
        date: NaiveDate,
        description: impl Into<String>,
        expense_account_id: impl Into<String>,
        cash_or_payable_id: impl Into<String>,
        amount: BigDecimal,
    ) -> NewJournalEntry {
        transfer(
            date,
            description,
            expense_account_id,
            cash_or_payable_id,
            amount,
        )
    }

    /// Sales invoice with GST: receivable carries the gross amount,
    /// revenue the taxable value, GST payable the tax.
    pub fn invoice_with_gst(
        date: NaiveDate,
        invoice_no: impl Into<String>,
        description: impl Into<String>,
        receivable_account_id: impl Into<String>,
        revenue_account_id: impl Into<String>,
        gst_payable_account_id: impl Into<String>,
        taxable_value: BigDecimal,
        tax_amount: BigDecimal,
    ) -> NewJournalEntry {
        let gross = &taxable_value + &tax_amount;
        EntryBuilder::new(date, description)
            .reference(invoice_no)
            .debit(receivable_account_id, gross)
            .credit(revenue_account_id, taxable_value)
            .credit(gst_payable_account_id, tax_amount)
            .build()
    }

    /// Purchase bill with recoverable GST: expense and GST receivable
    /// against cash/payables.
    pub fn bill_with_gst(
        date: NaiveDate,
        description: impl Into<String>,
        expense_account_id: impl Into<String>,
        gst_receivable_account_id: impl Into<String>,
        cash_or_payable_id: impl Into<String>,
        base_amount: BigDecimal,
        tax_amount: BigDecimal,
    ) -> NewJournalEntry {
        let gross = &base_amount + &tax_amount;
        EntryBuilder::new(date, description)
            .debit(expense_account_id, base_amount)
            .debit(gst_receivable_account_id, tax_amount)
            .credit(cash_or_payable_id, gross)
            .build()
    }

    /// Owner puts cash into the business.
    pub fn owner_investment(
        date: NaiveDate,
        description: impl Into<String>,
        cash_account_id: impl Into<String>,
        equity_account_id: impl Into<String>,
        amount: BigDecimal,
    ) -> NewJournalEntry {
        transfer(date, description, cash_account_id, equity_account_id, amount)
    }
}
