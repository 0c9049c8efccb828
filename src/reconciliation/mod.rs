//! Bank reconciliation engine
//!
//! Cleared/uncleared state lives on the bank-side journal lines, so the
//! reconciliation statement is a pure partition of the posted journal:
//! `bank balance = book balance + uncleared credits - uncleared debits`.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ledger::LedgerProjection;
use crate::traits::*;
use crate::types::*;

/// A bank account linked to a ledger account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: String,
    /// The ledger account this bank account posts through
    pub account_id: String,
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    /// Statement balance as last reported by the bank; informational
    pub current_balance: BigDecimal,
    pub currency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for registering a bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBankAccount {
    pub account_id: String,
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub currency: String,
}

/// One uncleared transaction awaiting manual matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationItem {
    pub entry_id: String,
    pub entry_number: u32,
    pub entry_date: NaiveDate,
    pub reference: Option<String>,
    pub description: String,
    pub entry_type: EntryType,
    pub amount: BigDecimal,
}

/// Bank reconciliation statement as of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub bank_account_id: String,
    pub as_of_date: NaiveDate,
    /// Ledger balance of the linked account
    pub book_balance: BigDecimal,
    /// `book_balance + uncleared credits - uncleared debits`
    pub bank_balance: BigDecimal,
    pub uncleared_debits: Vec<ReconciliationItem>,
    pub uncleared_credits: Vec<ReconciliationItem>,
    pub total_uncleared_debits: BigDecimal,
    pub total_uncleared_credits: BigDecimal,
}

/// Reconciliation engine over bank-affecting journal entries
pub struct ReconciliationEngine<S: EngineStorage> {
    pub(crate) storage: S,
}

impl<S: EngineStorage + Clone> ReconciliationEngine<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Register a bank account against an existing ledger account.
    pub async fn create_bank_account(&mut self, data: NewBankAccount) -> EngineResult<BankAccount> {
        if self.storage.get_account(&data.account_id).await?.is_none() {
            return Err(EngineError::ReferentialIntegrity(format!(
                "ledger account '{}' does not exist",
                data.account_id
            )));
        }

        let now = chrono::Utc::now().naive_utc();
        let bank = BankAccount {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: data.account_id,
            account_name: data.account_name,
            account_number: data.account_number,
            bank_name: data.bank_name,
            current_balance: BigDecimal::from(0),
            currency: data.currency,
            created_at: now,
            updated_at: now,
        };
        self.storage.save_bank_account(&bank).await?;
        Ok(bank)
    }

    /// Get a bank account by ID, returning an error if not found
    pub async fn get_bank_account_required(&self, bank_id: &str) -> EngineResult<BankAccount> {
        self.storage
            .get_bank_account(bank_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("bank account '{bank_id}'")))
    }

    /// List registered bank accounts
    pub async fn list_bank_accounts(&self) -> EngineResult<Vec<BankAccount>> {
        self.storage.list_bank_accounts().await
    }

    /// Build the reconciliation statement for a bank account as of a date.
    ///
    /// Partitions posted entries touching the linked ledger account into
    /// cleared and uncleared, and derives the expected bank-statement
    /// balance from the book balance and the uncleared partition.
    pub async fn reconciliation_report(
        &self,
        bank_account_id: &str,
        as_of_date: NaiveDate,
    ) -> EngineResult<ReconciliationReport> {
        let bank = self.get_bank_account_required(bank_account_id).await?;

        let projection = LedgerProjection::new(self.storage.clone());
        let book_balance = projection.balance_as_of(&bank.account_id, as_of_date).await?;

        let entries = self
            .storage
            .list_entries(&EntryFilter {
                account_id: Some(bank.account_id.clone()),
                ..EntryFilter::posted_through(as_of_date)
            })
            .await?;

        let mut uncleared_debits = Vec::new();
        let mut uncleared_credits = Vec::new();
        let mut total_uncleared_debits = BigDecimal::from(0);
        let mut total_uncleared_credits = BigDecimal::from(0);

        for entry in &entries {
            for line in entry
                .lines
                .iter()
                .filter(|l| l.account_id == bank.account_id && !l.cleared)
            {
                let item = ReconciliationItem {
                    entry_id: entry.id.clone(),
                    entry_number: entry.entry_number,
                    entry_date: entry.entry_date,
                    reference: entry.reference.clone(),
                    description: entry.description.clone(),
                    entry_type: line.entry_type,
                    amount: line.amount.clone(),
                };
                match line.entry_type {
                    EntryType::Debit => {
                        total_uncleared_debits += &line.amount;
                        uncleared_debits.push(item);
                    }
                    EntryType::Credit => {
                        total_uncleared_credits += &line.amount;
                        uncleared_credits.push(item);
                    }
                }
            }
        }

        let bank_balance = &book_balance + &total_uncleared_credits - &total_uncleared_debits;

        Ok(ReconciliationReport {
            bank_account_id: bank.id,
            as_of_date,
            book_balance,
            bank_balance,
            uncleared_debits,
            uncleared_credits,
            total_uncleared_debits,
            total_uncleared_credits,
        })
    }

    /// Mark the bank-side lines of an entry as cleared on `cleared_date`.
    ///
    /// Fails with `NotFound` when the entry does not exist, is not posted,
    /// touches no bank ledger account, or has nothing left awaiting
    /// reconciliation. Only posted entries appear in the statement, so only
    /// they can be matched against it.
    pub async fn reconcile_transaction(
        &mut self,
        entry_id: &str,
        cleared_date: NaiveDate,
    ) -> EngineResult<JournalEntry> {
        let mut entry = self
            .storage
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("journal entry '{entry_id}'")))?;
        if entry.status != EntryStatus::Posted {
            return Err(EngineError::NotFound(format!(
                "entry '{entry_id}' is not posted, nothing awaits reconciliation"
            )));
        }

        let bank_ledger_ids: HashSet<String> = self
            .storage
            .list_bank_accounts()
            .await?
            .into_iter()
            .map(|b| b.account_id)
            .collect();

        let mut cleared_any = false;
        for line in entry
            .lines
            .iter_mut()
            .filter(|l| bank_ledger_ids.contains(&l.account_id) && !l.cleared)
        {
            line.cleared = true;
            line.cleared_date = Some(cleared_date);
            cleared_any = true;
        }

        if !cleared_any {
            return Err(EngineError::NotFound(format!(
                "entry '{entry_id}' has no bank line awaiting reconciliation"
            )));
        }

        entry.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_entry(&entry).await?;
        tracing::debug!(entry_id = %entry.id, %cleared_date, "transaction reconciled");

        Ok(entry)
    }
}
