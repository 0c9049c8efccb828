//! Financial reporting engine
//!
//! Every report here is a read-only fold over the posted journal; none of
//! them mutate engine state, so the UI may poll them freely.

pub mod gst;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ledger::LedgerProjection;
use crate::traits::*;
use crate::types::*;

use self::gst::{Gstr1Invoice, Gstr1RateSummary, Gstr1Report, Gstr3bReport};

/// Balance sheet as of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of_date: NaiveDate,
    pub assets: Vec<AccountBalance>,
    pub liabilities: Vec<AccountBalance>,
    /// Includes a synthesized net-income row when the period has activity
    pub equity: Vec<AccountBalance>,
    pub total_assets: BigDecimal,
    pub total_liabilities: BigDecimal,
    pub total_equity: BigDecimal,
    /// The accounting equation: assets = liabilities + equity. A false value
    /// means a posting bug upstream and is surfaced, never corrected here.
    pub is_balanced: bool,
}

/// One account row in the profit and loss statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlLine {
    pub account: Account,
    /// Net change over the period, in the account's normal sense
    pub amount: BigDecimal,
}

/// Profit and loss statement for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitAndLoss {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub revenue: Vec<PnlLine>,
    /// Expense accounts tagged with the "cogs" sub-type
    pub cogs: Vec<PnlLine>,
    pub expenses: Vec<PnlLine>,
    pub total_revenue: BigDecimal,
    pub total_cogs: BigDecimal,
    pub gross_profit: BigDecimal,
    pub total_expenses: BigDecimal,
    pub net_profit: BigDecimal,
}

/// Cash flow line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowItem {
    pub description: String,
    /// Net cash effect of the entry; positive is an inflow
    pub amount: BigDecimal,
}

/// Cash flow statement for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub operating_activities: Vec<CashFlowItem>,
    pub investing_activities: Vec<CashFlowItem>,
    pub financing_activities: Vec<CashFlowItem>,
    pub net_operating_cash_flow: BigDecimal,
    pub net_investing_cash_flow: BigDecimal,
    pub net_financing_cash_flow: BigDecimal,
    pub net_cash_flow: BigDecimal,
}

/// A spending budget for an expense category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub name: String,
    /// Matched against expense account sub-types and codes
    pub category: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub allocated_budget: BigDecimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for creating a budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudget {
    pub name: String,
    pub category: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub allocated_budget: BigDecimal,
}

/// Budget health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetStatus {
    OnTrack,
    OverBudget,
}

/// Budget with actuals, derived at report time to avoid staleness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetVariance {
    pub budget: Budget,
    pub actual_amount: BigDecimal,
    /// `allocated_budget - actual_amount`
    pub variance: BigDecimal,
    pub status: BudgetStatus,
}

/// Reporting engine composing ledger projections into statements
pub struct ReportingEngine<S: EngineStorage> {
    pub(crate) storage: S,
}

impl<S: EngineStorage + Clone> ReportingEngine<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn projection(&self) -> LedgerProjection<S> {
        LedgerProjection::new(self.storage.clone())
    }

    /// Signed normal-sense total of a group of trial-balance rows.
    fn signed_total(rows: &[AccountBalance]) -> BigDecimal {
        rows.iter().map(Self::signed_amount).sum()
    }

    /// Balance signed in the account's normal sense; a flipped-column row
    /// contributes negatively.
    fn signed_amount(row: &AccountBalance) -> BigDecimal {
        let magnitude = row.balance_amount();
        let on_normal_side = match row.account.account_type.normal_balance() {
            EntryType::Debit => row.debit_balance.is_some(),
            EntryType::Credit => row.credit_balance.is_some(),
        };
        if on_normal_side || magnitude == BigDecimal::from(0) {
            magnitude
        } else {
            -magnitude
        }
    }

    /// Balance sheet as of a date.
    ///
    /// Net income to date is folded into equity so the accounting equation
    /// can hold; a violated equation is reported through `is_balanced`.
    pub async fn balance_sheet(&self, as_of_date: NaiveDate) -> EngineResult<BalanceSheet> {
        let mut balances = self.projection().balances_by_type(as_of_date).await?;

        let assets = balances.remove(&AccountType::Asset).unwrap_or_default();
        let liabilities = balances.remove(&AccountType::Liability).unwrap_or_default();
        let mut equity = balances.remove(&AccountType::Equity).unwrap_or_default();
        let revenue = balances.remove(&AccountType::Revenue).unwrap_or_default();
        let expenses = balances.remove(&AccountType::Expense).unwrap_or_default();

        let net_income = Self::signed_total(&revenue) - Self::signed_total(&expenses);
        if net_income != BigDecimal::from(0) {
            let account = Account::new(
                "net_income".to_string(),
                NewAccount {
                    code: "3999".to_string(),
                    name: "Net Income".to_string(),
                    account_type: AccountType::Equity,
                    sub_type: Some("retained earnings".to_string()),
                },
            );
            equity.push(AccountBalance::from_normal_balance(account, net_income));
        }

        let total_assets = Self::signed_total(&assets);
        let total_liabilities = Self::signed_total(&liabilities);
        let total_equity = Self::signed_total(&equity);
        let is_balanced = total_assets == &total_liabilities + &total_equity;
        if !is_balanced {
            tracing::warn!(
                %total_assets,
                %total_liabilities,
                %total_equity,
                "accounting equation violated; posting bug upstream"
            );
        }

        Ok(BalanceSheet {
            as_of_date,
            assets,
            liabilities,
            equity,
            total_assets,
            total_liabilities,
            total_equity,
            is_balanced,
        })
    }

    /// Profit and loss over `[start, end]`.
    pub async fn profit_and_loss(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<ProfitAndLoss> {
        let projection = self.projection();
        let accounts = self.storage.list_accounts(&AccountFilter::default()).await?;

        let mut revenue = Vec::new();
        let mut cogs = Vec::new();
        let mut expenses = Vec::new();

        for account in accounts {
            let amount = projection
                .net_change(&account.id, start_date, end_date)
                .await?;
            match account.account_type {
                AccountType::Revenue => revenue.push(PnlLine { account, amount }),
                AccountType::Expense => {
                    if account.has_sub_type("cogs") {
                        cogs.push(PnlLine { account, amount });
                    } else {
                        expenses.push(PnlLine { account, amount });
                    }
                }
                _ => {}
            }
        }

        let total_revenue: BigDecimal = revenue.iter().map(|l| &l.amount).sum();
        let total_cogs: BigDecimal = cogs.iter().map(|l| &l.amount).sum();
        let gross_profit = &total_revenue - &total_cogs;
        let total_expenses: BigDecimal = expenses.iter().map(|l| &l.amount).sum();
        let net_profit = &gross_profit - &total_expenses;

        Ok(ProfitAndLoss {
            start_date,
            end_date,
            revenue,
            cogs,
            expenses,
            total_revenue,
            total_cogs,
            gross_profit,
            total_expenses,
            net_profit,
        })
    }

    /// Cash flow statement over `[start, end]`.
    ///
    /// Entries touching a cash or bank account are bucketed by the
    /// counterparty accounts: equity and loans are financing, fixed assets
    /// and investments are investing, everything else is operating.
    pub async fn cash_flow_statement(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<CashFlowStatement> {
        let accounts = self.account_map().await?;
        let is_cash = |id: &str| {
            accounts
                .get(id)
                .is_some_and(|a| a.has_sub_type("cash") || a.has_sub_type("bank"))
        };

        let entries = self
            .storage
            .list_entries(&EntryFilter::posted_between(start_date, end_date))
            .await?;

        let mut operating_activities = Vec::new();
        let mut investing_activities = Vec::new();
        let mut financing_activities = Vec::new();

        for entry in entries {
            let mut cash_delta = BigDecimal::from(0);
            let mut touched_cash = false;
            for line in entry.lines.iter().filter(|l| is_cash(&l.account_id)) {
                touched_cash = true;
                match line.entry_type {
                    EntryType::Debit => cash_delta += &line.amount,
                    EntryType::Credit => cash_delta -= &line.amount,
                }
            }
            if !touched_cash || cash_delta == BigDecimal::from(0) {
                continue;
            }

            let counterparties: Vec<&Account> = entry
                .lines
                .iter()
                .filter(|l| !is_cash(&l.account_id))
                .filter_map(|l| accounts.get(&l.account_id))
                .collect();

            let financing = counterparties.iter().any(|a| {
                a.account_type == AccountType::Equity
                    || a.has_sub_type("loan")
                    || a.has_sub_type("capital")
            });
            let investing = counterparties.iter().any(|a| {
                a.account_type == AccountType::Asset
                    && (a.has_sub_type("fixed asset") || a.has_sub_type("investment"))
            });

            let item = CashFlowItem {
                description: entry.description.clone(),
                amount: cash_delta,
            };
            if financing {
                financing_activities.push(item);
            } else if investing {
                investing_activities.push(item);
            } else {
                operating_activities.push(item);
            }
        }

        let net_operating_cash_flow: BigDecimal =
            operating_activities.iter().map(|i| &i.amount).sum();
        let net_investing_cash_flow: BigDecimal =
            investing_activities.iter().map(|i| &i.amount).sum();
        let net_financing_cash_flow: BigDecimal =
            financing_activities.iter().map(|i| &i.amount).sum();
        let net_cash_flow =
            &net_operating_cash_flow + &net_investing_cash_flow + &net_financing_cash_flow;

        Ok(CashFlowStatement {
            start_date,
            end_date,
            operating_activities,
            investing_activities,
            financing_activities,
            net_operating_cash_flow,
            net_investing_cash_flow,
            net_financing_cash_flow,
            net_cash_flow,
        })
    }

    /// Create a budget for an expense category.
    pub async fn create_budget(&mut self, data: NewBudget) -> EngineResult<Budget> {
        if data.period_end < data.period_start {
            return Err(EngineError::Validation(
                "budget period end precedes its start".to_string(),
            ));
        }
        if data.allocated_budget < BigDecimal::from(0) {
            return Err(EngineError::Validation(
                "allocated budget cannot be negative".to_string(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let budget = Budget {
            id: uuid::Uuid::new_v4().to_string(),
            name: data.name,
            category: data.category,
            period_start: data.period_start,
            period_end: data.period_end,
            allocated_budget: data.allocated_budget,
            created_at: now,
            updated_at: now,
        };
        self.storage.save_budget(&budget).await?;
        Ok(budget)
    }

    /// Delete a budget.
    pub async fn delete_budget(&mut self, budget_id: &str) -> EngineResult<()> {
        if self.storage.get_budget(budget_id).await?.is_none() {
            return Err(EngineError::NotFound(format!("budget '{budget_id}'")));
        }
        self.storage.delete_budget(budget_id).await
    }

    /// Budget variance, with actuals summed from the journal at call time.
    pub async fn budget_variance_report(&self) -> EngineResult<Vec<BudgetVariance>> {
        let projection = self.projection();
        let accounts = self.storage.list_accounts(&AccountFilter::default()).await?;
        let mut report = Vec::new();

        for budget in self.storage.list_budgets().await? {
            let mut actual_amount = BigDecimal::from(0);
            for account in accounts.iter().filter(|a| {
                a.account_type == AccountType::Expense
                    && (a.has_sub_type(&budget.category)
                        || a.code.eq_ignore_ascii_case(&budget.category))
            }) {
                actual_amount += projection
                    .net_change(&account.id, budget.period_start, budget.period_end)
                    .await?;
            }

            let variance = &budget.allocated_budget - &actual_amount;
            let status = if variance >= BigDecimal::from(0) {
                BudgetStatus::OnTrack
            } else {
                BudgetStatus::OverBudget
            };
            report.push(BudgetVariance {
                budget,
                actual_amount,
                variance,
                status,
            });
        }

        Ok(report)
    }

    /// GSTR-1: outward supplies for a month, one row per invoice entry,
    /// aggregated by effective tax rate.
    pub async fn gstr1_report(&self, month: u32, year: i32) -> EngineResult<Gstr1Report> {
        let (start, end) = month_bounds(month, year)?;
        let accounts = self.account_map().await?;
        let entries = self
            .storage
            .list_entries(&EntryFilter::posted_between(start, end))
            .await?;

        let mut invoices = Vec::new();
        let mut rate_summaries: Vec<Gstr1RateSummary> = Vec::new();
        let mut total_taxable_value = BigDecimal::from(0);
        let mut total_tax = BigDecimal::from(0);

        for entry in entries {
            let (taxable_value, tax_amount) = outward_supply_amounts(&entry, &accounts);
            if taxable_value <= BigDecimal::from(0) {
                continue;
            }

            let tax_rate = (&tax_amount * BigDecimal::from(100)) / &taxable_value;
            total_taxable_value += &taxable_value;
            total_tax += &tax_amount;

            match rate_summaries.iter_mut().find(|s| s.tax_rate == tax_rate) {
                Some(summary) => {
                    summary.taxable_value += &taxable_value;
                    summary.tax_amount += &tax_amount;
                    summary.invoice_count += 1;
                }
                None => rate_summaries.push(Gstr1RateSummary {
                    tax_rate: tax_rate.clone(),
                    taxable_value: taxable_value.clone(),
                    tax_amount: tax_amount.clone(),
                    invoice_count: 1,
                }),
            }

            invoices.push(Gstr1Invoice {
                invoice_no: entry
                    .reference
                    .clone()
                    .unwrap_or_else(|| format!("JE-{}", entry.entry_number)),
                entry_date: entry.entry_date,
                taxable_value,
                tax_rate,
                tax_amount,
            });
        }

        Ok(Gstr1Report {
            month,
            year,
            invoices,
            rate_summaries,
            total_taxable_value,
            total_tax,
        })
    }

    /// GSTR-3B: monthly summary of outward supplies, tax collected, input
    /// tax credit, and the net payable position.
    pub async fn gstr3b_report(&self, month: u32, year: i32) -> EngineResult<Gstr3bReport> {
        let (start, end) = month_bounds(month, year)?;
        let accounts = self.account_map().await?;
        let entries = self
            .storage
            .list_entries(&EntryFilter::posted_between(start, end))
            .await?;

        let mut outward_supplies = BigDecimal::from(0);
        let mut tax_liability = BigDecimal::from(0);
        let mut input_tax_credit = BigDecimal::from(0);

        for entry in entries {
            let (taxable_value, tax_amount) = outward_supply_amounts(&entry, &accounts);
            if taxable_value > BigDecimal::from(0) {
                outward_supplies += &taxable_value;
                tax_liability += &tax_amount;
            }

            for line in &entry.lines {
                let Some(account) = accounts.get(&line.account_id) else {
                    continue;
                };
                if account.has_sub_type("gst receivable") && line.entry_type == EntryType::Debit {
                    input_tax_credit += &line.amount;
                }
            }
        }

        let net_tax_payable = &tax_liability - &input_tax_credit;

        Ok(Gstr3bReport {
            month,
            year,
            outward_supplies,
            tax_liability,
            input_tax_credit,
            net_tax_payable,
        })
    }

    async fn account_map(&self) -> EngineResult<HashMap<String, Account>> {
        Ok(self
            .storage
            .list_accounts(&AccountFilter::default())
            .await?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect())
    }
}

/// Taxable value (revenue credits) and tax amount (GST-payable credits) of
/// an outward-supply entry. Entries with no revenue credit return zero.
fn outward_supply_amounts(
    entry: &JournalEntry,
    accounts: &HashMap<String, Account>,
) -> (BigDecimal, BigDecimal) {
    let mut taxable_value = BigDecimal::from(0);
    let mut tax_amount = BigDecimal::from(0);
    for line in entry
        .lines
        .iter()
        .filter(|l| l.entry_type == EntryType::Credit)
    {
        let Some(account) = accounts.get(&line.account_id) else {
            continue;
        };
        if account.account_type == AccountType::Revenue {
            taxable_value += &line.amount;
        } else if account.has_sub_type("gst payable") {
            tax_amount += &line.amount;
        }
    }
    (taxable_value, tax_amount)
}

/// First and last day of a calendar month.
fn month_bounds(month: u32, year: i32) -> EngineResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid period {year}-{month:02}")))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| EngineError::Validation(format!("invalid period {year}-{month:02}")))?;
    Ok((start, next_month.pred_opt().unwrap_or(start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_cover_the_month() {
        let (start, end) = month_bounds(6, 2025).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());

        let (start, end) = month_bounds(12, 2025).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn month_bounds_reject_bad_month() {
        assert!(month_bounds(13, 2025).is_err());
        assert!(month_bounds(0, 2025).is_err());
    }
}
