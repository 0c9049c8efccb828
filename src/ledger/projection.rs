//! Ledger projections derived from the posted journal
//!
//! Everything here folds over posted entries in `(entry_date, entry_number)`
//! order and never writes. The cached `Account::balance` is a materialized
//! view of `recompute_balance`; tests assert the two agree.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::traits::*;
use crate::types::*;

/// One row of a per-account ledger statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub entry_id: String,
    pub entry_number: u32,
    pub entry_date: NaiveDate,
    pub reference: Option<String>,
    pub description: String,
    /// Net effect of the entry on the account, in its normal-balance sense
    pub amount: BigDecimal,
    /// Cumulative balance after this entry
    pub running_balance: BigDecimal,
}

/// Read-only projections over the journal
pub struct LedgerProjection<S: EngineStorage> {
    storage: S,
}

impl<S: EngineStorage> LedgerProjection<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Per-account statement with running balance.
    ///
    /// Debits accumulate as `+amount` and credits as `-amount` for
    /// debit-normal accounts, and the opposite for credit-normal accounts,
    /// so a healthy account trends positive either way.
    pub async fn account_ledger(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> EngineResult<Vec<LedgerLine>> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("account '{account_id}'")))?;
        let normal = account.account_type.normal_balance();

        let entries = self
            .storage
            .list_entries(&EntryFilter {
                start_date,
                end_date,
                account_id: Some(account_id.to_string()),
                status: Some(EntryStatus::Posted),
            })
            .await?;

        let mut running = BigDecimal::from(0);
        let mut lines = Vec::with_capacity(entries.len());
        for entry in entries {
            let amount = entry.net_for_account(account_id, normal);
            running += &amount;
            lines.push(LedgerLine {
                entry_id: entry.id,
                entry_number: entry.entry_number,
                entry_date: entry.entry_date,
                reference: entry.reference,
                description: entry.description,
                amount,
                running_balance: running.clone(),
            });
        }

        Ok(lines)
    }

    /// Recompute an account balance from the full posted history,
    /// bypassing the materialized cache.
    pub async fn recompute_balance(&self, account_id: &str) -> EngineResult<BigDecimal> {
        Ok(self
            .account_ledger(account_id, None, None)
            .await?
            .last()
            .map(|line| line.running_balance.clone())
            .unwrap_or_else(|| BigDecimal::from(0)))
    }

    /// Balance of an account as of a date, recomputed from entries.
    pub async fn balance_as_of(
        &self,
        account_id: &str,
        as_of_date: NaiveDate,
    ) -> EngineResult<BigDecimal> {
        Ok(self
            .account_ledger(account_id, None, Some(as_of_date))
            .await?
            .last()
            .map(|line| line.running_balance.clone())
            .unwrap_or_else(|| BigDecimal::from(0)))
    }

    /// Trial balance as of a date.
    ///
    /// The fundamental double-entry property: total debits equal total
    /// credits across the whole ledger. `is_balanced` going false means a
    /// posting bug, not a reporting bug.
    pub async fn trial_balance(&self, as_of_date: NaiveDate) -> EngineResult<TrialBalance> {
        let accounts = self.storage.list_accounts(&AccountFilter::default()).await?;

        let mut rows = Vec::with_capacity(accounts.len());
        let mut total_debits = BigDecimal::from(0);
        let mut total_credits = BigDecimal::from(0);

        for account in accounts {
            let balance = self.balance_as_of(&account.id, as_of_date).await?;
            let row = AccountBalance::from_normal_balance(account, balance);
            if let Some(debit) = &row.debit_balance {
                total_debits += debit;
            }
            if let Some(credit) = &row.credit_balance {
                total_credits += credit;
            }
            rows.push(row);
        }

        let is_balanced = total_debits == total_credits;

        Ok(TrialBalance {
            as_of_date,
            rows,
            total_debits,
            total_credits,
            is_balanced,
        })
    }

    /// Trial-balance rows grouped by account type, the raw material for the
    /// balance sheet and income statement.
    pub async fn balances_by_type(
        &self,
        as_of_date: NaiveDate,
    ) -> EngineResult<HashMap<AccountType, Vec<AccountBalance>>> {
        let trial_balance = self.trial_balance(as_of_date).await?;
        let mut result: HashMap<AccountType, Vec<AccountBalance>> = HashMap::new();
        for row in trial_balance.rows {
            result
                .entry(row.account.account_type)
                .or_default()
                .push(row);
        }
        Ok(result)
    }

    /// Net change of an account over `[start, end]`, in its normal sense.
    pub async fn net_change(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<BigDecimal> {
        let lines = self
            .account_ledger(account_id, Some(start_date), Some(end_date))
            .await?;
        Ok(lines.iter().map(|l| &l.amount).sum())
    }
}
