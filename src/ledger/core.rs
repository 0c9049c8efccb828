//! Engine facade coordinating all accounting subsystems

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::automation::{
    AutomationEngine, NewRecurringTemplate, RecurringTemplate, RuleBasedClassifier,
};
use crate::config::EngineSettings;
use crate::inventory::{
    InventoryEngine, ItemValuation, NewStockItem, StockItem, StockJournal, StockMovement,
};
use crate::ledger::{
    standard_chart, AccountRegistry, JournalEngine, LedgerLine, LedgerProjection,
};
use crate::reconciliation::{
    BankAccount, NewBankAccount, ReconciliationEngine, ReconciliationReport,
};
use crate::reports::{
    BalanceSheet, Budget, BudgetVariance, CashFlowStatement, NewBudget, ProfitAndLoss,
    ReportingEngine,
};
use crate::reports::gst::{Gstr1Report, Gstr3bReport};
use crate::traits::*;
use crate::types::*;

/// The accounting engine: one facade over the registry, journal, inventory,
/// reconciliation, reporting, and automation subsystems.
///
/// Storage clones must share underlying state (the in-memory store does this
/// with interior `Arc`s); the engine is single-writer by design.
pub struct AccountingEngine<S: EngineStorage + Clone, C: AnomalyClassifier = RuleBasedClassifier>
{
    settings: Arc<EngineSettings>,
    registry: AccountRegistry<S>,
    journal: JournalEngine<S>,
    projection: LedgerProjection<S>,
    inventory: InventoryEngine<S>,
    reconciliation: ReconciliationEngine<S>,
    reports: ReportingEngine<S>,
    automation: AutomationEngine<S, C>,
}

impl<S: EngineStorage + Clone> AccountingEngine<S, RuleBasedClassifier> {
    /// Create an engine with the built-in rule-based anomaly classifier.
    pub fn new(storage: S, settings: EngineSettings) -> Self {
        Self::with_classifier(storage, settings, RuleBasedClassifier)
    }
}

impl<S: EngineStorage + Clone, C: AnomalyClassifier> AccountingEngine<S, C> {
    /// Create an engine with a custom anomaly classifier strategy.
    pub fn with_classifier(storage: S, settings: EngineSettings, classifier: C) -> Self {
        let settings = Arc::new(settings);
        Self {
            registry: AccountRegistry::new(storage.clone()),
            journal: JournalEngine::new(storage.clone(), settings.clone()),
            projection: LedgerProjection::new(storage.clone()),
            inventory: InventoryEngine::new(storage.clone()),
            reconciliation: ReconciliationEngine::new(storage.clone()),
            reports: ReportingEngine::new(storage.clone()),
            automation: AutomationEngine::new(storage, settings.clone(), classifier),
            settings,
        }
    }

    /// The engine's configuration
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // Chart of accounts

    /// Create a new account
    pub async fn create_account(&mut self, data: NewAccount) -> EngineResult<Account> {
        self.registry.create_account(data).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> EngineResult<Option<Account>> {
        self.registry.get_account(account_id).await
    }

    /// Get an account by code
    pub async fn get_account_by_code(&self, code: &str) -> EngineResult<Option<Account>> {
        self.registry.get_account_by_code(code).await
    }

    /// List accounts ordered by code
    pub async fn list_accounts(&self, filter: &AccountFilter) -> EngineResult<Vec<Account>> {
        self.registry.list_accounts(filter).await
    }

    /// Soft-deactivate an account
    pub async fn deactivate_account(&mut self, account_id: &str) -> EngineResult<Account> {
        self.registry.deactivate_account(account_id).await
    }

    /// Reactivate an account
    pub async fn reactivate_account(&mut self, account_id: &str) -> EngineResult<Account> {
        self.registry.reactivate_account(account_id).await
    }

    /// Delete an unreferenced account
    pub async fn delete_account(&mut self, account_id: &str) -> EngineResult<()> {
        self.registry.delete_account(account_id).await
    }

    /// Seed a standard small-business chart of accounts
    pub async fn setup_standard_chart(&mut self) -> EngineResult<HashMap<String, Account>> {
        standard_chart::create_standard_chart(&mut self.registry).await
    }

    // Journal

    /// Create (and by default post) a journal entry
    pub async fn create_journal_entry(
        &mut self,
        data: NewJournalEntry,
    ) -> EngineResult<JournalEntry> {
        self.journal.create_entry(data).await
    }

    /// Promote a draft entry to posted
    pub async fn post_entry(&mut self, entry_id: &str) -> EngineResult<JournalEntry> {
        self.journal.post_entry(entry_id).await
    }

    /// Reverse a posted entry with an offsetting entry
    pub async fn reverse_entry(
        &mut self,
        entry_id: &str,
        reversal_date: NaiveDate,
    ) -> EngineResult<JournalEntry> {
        self.journal.reverse_entry(entry_id, reversal_date).await
    }

    /// Update a draft entry
    pub async fn update_draft(
        &mut self,
        entry_id: &str,
        data: NewJournalEntry,
    ) -> EngineResult<JournalEntry> {
        self.journal.update_draft(entry_id, data).await
    }

    /// Delete a draft entry
    pub async fn delete_draft(&mut self, entry_id: &str) -> EngineResult<()> {
        self.journal.delete_draft(entry_id).await
    }

    /// Get an entry by ID
    pub async fn get_journal_entry(&self, entry_id: &str) -> EngineResult<Option<JournalEntry>> {
        self.journal.get_entry(entry_id).await
    }

    /// List entries in `(entry_date, entry_number)` order
    pub async fn get_journal_entries(
        &self,
        filter: &EntryFilter,
    ) -> EngineResult<Vec<JournalEntry>> {
        self.journal.get_entries(filter).await
    }

    // Ledger projection

    /// Per-account statement with running balances
    pub async fn get_account_ledger(
        &self,
        account_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> EngineResult<Vec<LedgerLine>> {
        self.projection
            .account_ledger(account_id, start_date, end_date)
            .await
    }

    /// Trial balance as of a date
    pub async fn get_trial_balance(&self, as_of_date: NaiveDate) -> EngineResult<TrialBalance> {
        self.projection.trial_balance(as_of_date).await
    }

    /// Account balance recomputed from the posted history
    pub async fn recompute_balance(&self, account_id: &str) -> EngineResult<BigDecimal> {
        self.projection.recompute_balance(account_id).await
    }

    // Inventory

    /// Create a stock item
    pub async fn create_stock_item(&mut self, data: NewStockItem) -> EngineResult<StockItem> {
        self.inventory.create_item(data).await
    }

    /// List stock items
    pub async fn list_stock_items(&self) -> EngineResult<Vec<StockItem>> {
        self.inventory.list_items().await
    }

    /// Post a stock journal, costing outward lines by each item's method
    pub async fn create_stock_journal(
        &mut self,
        journal: StockJournal,
    ) -> EngineResult<Vec<StockMovement>> {
        self.inventory.create_stock_journal(journal).await
    }

    /// Inventory valuation report recomputed from movement history
    pub async fn get_inventory_valuation_report(&self) -> EngineResult<Vec<ItemValuation>> {
        self.inventory.valuation_report().await
    }

    /// Item quantity and value recomputed from movement history
    pub async fn recompute_valuation(
        &self,
        item_id: &str,
    ) -> EngineResult<(BigDecimal, BigDecimal)> {
        self.inventory.recompute_valuation(item_id).await
    }

    // Reconciliation

    /// Register a bank account against a ledger account
    pub async fn create_bank_account(&mut self, data: NewBankAccount) -> EngineResult<BankAccount> {
        self.reconciliation.create_bank_account(data).await
    }

    /// List registered bank accounts
    pub async fn list_bank_accounts(&self) -> EngineResult<Vec<BankAccount>> {
        self.reconciliation.list_bank_accounts().await
    }

    /// Reconciliation statement for a bank account as of a date
    pub async fn get_bank_reconciliation_report(
        &self,
        bank_account_id: &str,
        as_of_date: NaiveDate,
    ) -> EngineResult<ReconciliationReport> {
        self.reconciliation
            .reconciliation_report(bank_account_id, as_of_date)
            .await
    }

    /// Mark an entry's bank lines cleared
    pub async fn reconcile_transaction(
        &mut self,
        entry_id: &str,
        cleared_date: NaiveDate,
    ) -> EngineResult<JournalEntry> {
        self.reconciliation
            .reconcile_transaction(entry_id, cleared_date)
            .await
    }

    // Reporting

    /// Balance sheet as of a date
    pub async fn get_balance_sheet(&self, as_of_date: NaiveDate) -> EngineResult<BalanceSheet> {
        self.reports.balance_sheet(as_of_date).await
    }

    /// Profit and loss over a period
    pub async fn get_profit_and_loss(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<ProfitAndLoss> {
        self.reports.profit_and_loss(start_date, end_date).await
    }

    /// Cash flow statement over a period
    pub async fn get_cash_flow_statement(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<CashFlowStatement> {
        self.reports.cash_flow_statement(start_date, end_date).await
    }

    /// Create a budget
    pub async fn create_budget(&mut self, data: NewBudget) -> EngineResult<Budget> {
        self.reports.create_budget(data).await
    }

    /// Delete a budget
    pub async fn delete_budget(&mut self, budget_id: &str) -> EngineResult<()> {
        self.reports.delete_budget(budget_id).await
    }

    /// Budget variance report with actuals derived at call time
    pub async fn get_budget_variance_report(&self) -> EngineResult<Vec<BudgetVariance>> {
        self.reports.budget_variance_report().await
    }

    /// GSTR-1 outward-supply report for a month
    pub async fn get_gstr1_report(&self, month: u32, year: i32) -> EngineResult<Gstr1Report> {
        self.reports.gstr1_report(month, year).await
    }

    /// GSTR-3B summary return for a month
    pub async fn get_gstr3b_report(&self, month: u32, year: i32) -> EngineResult<Gstr3bReport> {
        self.reports.gstr3b_report(month, year).await
    }

    // Automation

    /// Create a recurring journal template
    pub async fn create_recurring_template(
        &mut self,
        data: NewRecurringTemplate,
    ) -> EngineResult<RecurringTemplate> {
        self.automation.create_template(data).await
    }

    /// Pause a recurring template
    pub async fn pause_template(&mut self, template_id: &str) -> EngineResult<RecurringTemplate> {
        self.automation.pause_template(template_id).await
    }

    /// Resume a recurring template
    pub async fn resume_template(&mut self, template_id: &str) -> EngineResult<RecurringTemplate> {
        self.automation.resume_template(template_id).await
    }

    /// List recurring templates
    pub async fn list_recurring_templates(&self) -> EngineResult<Vec<RecurringTemplate>> {
        self.automation.list_templates().await
    }

    /// Materialize due recurring entries; idempotent per calendar day
    pub async fn process_recurring_due(&mut self, today: NaiveDate) -> EngineResult<usize> {
        self.automation.process_recurring_due(today).await
    }

    /// Screen recent entries for anomalies; advisory, never fails
    pub async fn get_anomalies(&self) -> Vec<Anomaly> {
        self.automation.get_anomalies().await
    }

    /// Check the ledger's structural invariants as of a date.
    pub async fn validate_integrity(
        &self,
        as_of_date: NaiveDate,
    ) -> EngineResult<IntegrityReport> {
        let trial_balance = self.get_trial_balance(as_of_date).await?;
        let balance_sheet = self.get_balance_sheet(as_of_date).await?;

        let mut issues = Vec::new();
        if !trial_balance.is_balanced {
            issues.push(format!(
                "trial balance is not balanced: debits = {}, credits = {}",
                trial_balance.total_debits, trial_balance.total_credits
            ));
        }

        let total_liabilities_equity =
            &balance_sheet.total_liabilities + &balance_sheet.total_equity;
        if !balance_sheet.is_balanced {
            issues.push(format!(
                "accounting equation violated: assets = {}, liabilities + equity = {}",
                balance_sheet.total_assets, total_liabilities_equity
            ));
        }

        Ok(IntegrityReport {
            as_of_date,
            is_valid: issues.is_empty(),
            issues,
            total_debits: trial_balance.total_debits,
            total_credits: trial_balance.total_credits,
            total_assets: balance_sheet.total_assets,
            total_liabilities_equity,
        })
    }
}

/// Report on ledger integrity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub as_of_date: NaiveDate,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub total_debits: BigDecimal,
    pub total_credits: BigDecimal,
    pub total_assets: BigDecimal,
    pub total_liabilities_equity: BigDecimal,
}
