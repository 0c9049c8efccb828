//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::automation::RecurringTemplate;
use crate::inventory::{StockItem, StockMovement};
use crate::reconciliation::BankAccount;
use crate::reports::Budget;
use crate::traits::*;
use crate::types::*;

/// In-memory store backed by shared maps.
///
/// Clones share state through the interior `Arc`s, matching the engine's
/// expectation that storage clones view one underlying store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    entries: Arc<RwLock<HashMap<String, JournalEntry>>>,
    stock_items: Arc<RwLock<HashMap<String, StockItem>>>,
    /// Movements per item in insertion order
    stock_movements: Arc<RwLock<HashMap<String, Vec<StockMovement>>>>,
    bank_accounts: Arc<RwLock<HashMap<String, BankAccount>>>,
    budgets: Arc<RwLock<HashMap<String, Budget>>>,
    templates: Arc<RwLock<HashMap<String, RecurringTemplate>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts.write().unwrap().clear();
        self.entries.write().unwrap().clear();
        self.stock_items.write().unwrap().clear();
        self.stock_movements.write().unwrap().clear();
        self.bank_accounts.write().unwrap().clear();
        self.budgets.write().unwrap().clear();
        self.templates.write().unwrap().clear();
    }
}

fn entry_matches(entry: &JournalEntry, filter: &EntryFilter) -> bool {
    if let Some(start) = filter.start_date {
        if entry.entry_date < start {
            return false;
        }
    }
    if let Some(end) = filter.end_date {
        if entry.entry_date > end {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if entry.status != status {
            return false;
        }
    }
    if let Some(account_id) = &filter.account_id {
        if !entry.touches(account_id) {
            return false;
        }
    }
    true
}

#[async_trait]
impl EngineStorage for MemoryStore {
    async fn save_account(&mut self, account: &Account) -> EngineResult<()> {
        self.accounts
            .write()
            .unwrap()
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> EngineResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(account_id).cloned())
    }

    async fn get_account_by_code(&self, code: &str) -> EngineResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> EngineResult<Vec<Account>> {
        let accounts = self.accounts.read().unwrap();
        let mut filtered: Vec<Account> = accounts
            .values()
            .filter(|a| {
                filter
                    .account_type
                    .is_none_or(|t| a.account_type == t)
                    && (!filter.active_only || a.is_active)
            })
            .cloned()
            .collect();
        filtered.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(filtered)
    }

    async fn update_account(&mut self, account: &Account) -> EngineResult<()> {
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(&account.id) {
            accounts.insert(account.id.clone(), account.clone());
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("account '{}'", account.id)))
        }
    }

    async fn delete_account(&mut self, account_id: &str) -> EngineResult<()> {
        if self.accounts.write().unwrap().remove(account_id).is_some() {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("account '{account_id}'")))
        }
    }

    async fn save_entry(&mut self, entry: &JournalEntry) -> EngineResult<()> {
        self.entries
            .write()
            .unwrap()
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn get_entry(&self, entry_id: &str) -> EngineResult<Option<JournalEntry>> {
        Ok(self.entries.read().unwrap().get(entry_id).cloned())
    }

    async fn list_entries(&self, filter: &EntryFilter) -> EngineResult<Vec<JournalEntry>> {
        let entries = self.entries.read().unwrap();
        let mut filtered: Vec<JournalEntry> = entries
            .values()
            .filter(|e| entry_matches(e, filter))
            .cloned()
            .collect();
        // The total order every running-balance computation depends on
        filtered.sort_by(|a, b| {
            (a.entry_date, a.entry_number).cmp(&(b.entry_date, b.entry_number))
        });
        Ok(filtered)
    }

    async fn update_entry(&mut self, entry: &JournalEntry) -> EngineResult<()> {
        let mut entries = self.entries.write().unwrap();
        if entries.contains_key(&entry.id) {
            entries.insert(entry.id.clone(), entry.clone());
            Ok(())
        } else {
            Err(EngineError::NotFound(format!(
                "journal entry '{}'",
                entry.id
            )))
        }
    }

    async fn delete_entry(&mut self, entry_id: &str) -> EngineResult<()> {
        if self.entries.write().unwrap().remove(entry_id).is_some() {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("journal entry '{entry_id}'")))
        }
    }

    async fn next_entry_number(&self, fiscal_year: &str) -> EngineResult<u32> {
        let entries = self.entries.read().unwrap();
        let max = entries
            .values()
            .filter(|e| e.fiscal_year == fiscal_year)
            .map(|e| e.entry_number)
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    async fn save_stock_item(&mut self, item: &StockItem) -> EngineResult<()> {
        self.stock_items
            .write()
            .unwrap()
            .insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get_stock_item(&self, item_id: &str) -> EngineResult<Option<StockItem>> {
        Ok(self.stock_items.read().unwrap().get(item_id).cloned())
    }

    async fn get_stock_item_by_sku(&self, sku: &str) -> EngineResult<Option<StockItem>> {
        Ok(self
            .stock_items
            .read()
            .unwrap()
            .values()
            .find(|i| i.sku == sku)
            .cloned())
    }

    async fn list_stock_items(&self) -> EngineResult<Vec<StockItem>> {
        let mut items: Vec<StockItem> = self.stock_items.read().unwrap().values().cloned().collect();
        items.sort_by(|a, b| a.sku.cmp(&b.sku));
        Ok(items)
    }

    async fn update_stock_item(&mut self, item: &StockItem) -> EngineResult<()> {
        let mut items = self.stock_items.write().unwrap();
        if items.contains_key(&item.id) {
            items.insert(item.id.clone(), item.clone());
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("stock item '{}'", item.id)))
        }
    }

    async fn save_stock_movement(&mut self, movement: &StockMovement) -> EngineResult<()> {
        self.stock_movements
            .write()
            .unwrap()
            .entry(movement.item_id.clone())
            .or_default()
            .push(movement.clone());
        Ok(())
    }

    async fn list_stock_movements(&self, item_id: &str) -> EngineResult<Vec<StockMovement>> {
        let mut movements = self
            .stock_movements
            .read()
            .unwrap()
            .get(item_id)
            .cloned()
            .unwrap_or_default();
        // Stable by date, preserving insertion order within a day
        movements.sort_by_key(|m| m.date);
        Ok(movements)
    }

    async fn save_bank_account(&mut self, bank: &BankAccount) -> EngineResult<()> {
        self.bank_accounts
            .write()
            .unwrap()
            .insert(bank.id.clone(), bank.clone());
        Ok(())
    }

    async fn get_bank_account(&self, bank_id: &str) -> EngineResult<Option<BankAccount>> {
        Ok(self.bank_accounts.read().unwrap().get(bank_id).cloned())
    }

    async fn list_bank_accounts(&self) -> EngineResult<Vec<BankAccount>> {
        let mut banks: Vec<BankAccount> =
            self.bank_accounts.read().unwrap().values().cloned().collect();
        banks.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(banks)
    }

    async fn update_bank_account(&mut self, bank: &BankAccount) -> EngineResult<()> {
        let mut banks = self.bank_accounts.write().unwrap();
        if banks.contains_key(&bank.id) {
            banks.insert(bank.id.clone(), bank.clone());
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("bank account '{}'", bank.id)))
        }
    }

    async fn save_budget(&mut self, budget: &Budget) -> EngineResult<()> {
        self.budgets
            .write()
            .unwrap()
            .insert(budget.id.clone(), budget.clone());
        Ok(())
    }

    async fn get_budget(&self, budget_id: &str) -> EngineResult<Option<Budget>> {
        Ok(self.budgets.read().unwrap().get(budget_id).cloned())
    }

    async fn list_budgets(&self) -> EngineResult<Vec<Budget>> {
        let mut budgets: Vec<Budget> = self.budgets.read().unwrap().values().cloned().collect();
        budgets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(budgets)
    }

    async fn delete_budget(&mut self, budget_id: &str) -> EngineResult<()> {
        if self.budgets.write().unwrap().remove(budget_id).is_some() {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("budget '{budget_id}'")))
        }
    }

    async fn save_template(&mut self, template: &RecurringTemplate) -> EngineResult<()> {
        self.templates
            .write()
            .unwrap()
            .insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn get_template(&self, template_id: &str) -> EngineResult<Option<RecurringTemplate>> {
        Ok(self.templates.read().unwrap().get(template_id).cloned())
    }

    async fn list_templates(&self) -> EngineResult<Vec<RecurringTemplate>> {
        let mut templates: Vec<RecurringTemplate> =
            self.templates.read().unwrap().values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn update_template(&mut self, template: &RecurringTemplate) -> EngineResult<()> {
        let mut templates = self.templates.write().unwrap();
        if templates.contains_key(&template.id) {
            templates.insert(template.id.clone(), template.clone());
            Ok(())
        } else {
            Err(EngineError::NotFound(format!(
                "recurring template '{}'",
                template.id
            )))
        }
    }
}
