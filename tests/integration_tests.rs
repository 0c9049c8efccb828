//! Integration tests for bizledger-core

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::time::Duration;

use bizledger_core::{
    patterns, utils::MemoryStore, AccountType, AccountingEngine, Anomaly, AnomalyClassifier,
    EngineError, EngineResult, EngineSettings, EntryBuilder, EntryFilter, EntryStatus,
    EntryTemplate, Frequency, JournalEntry, JournalLine, MovementType, NewAccount,
    NewBankAccount, NewBudget, NewRecurringTemplate, NewStockItem, BudgetStatus, StockJournal,
    StockJournalLine, ValuationMethod,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn engine() -> AccountingEngine<MemoryStore> {
    AccountingEngine::new(MemoryStore::new(), EngineSettings::default())
}

#[tokio::test]
async fn complete_accounting_workflow() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();
    assert!(accounts.contains_key("cash"));
    assert!(accounts.contains_key("sales_revenue"));
    assert!(accounts.contains_key("owners_equity"));

    // Owner funds the business, then a sale comes in
    engine
        .create_journal_entry(patterns::owner_investment(
            date(2025, 4, 1),
            "Initial investment",
            accounts["cash"].id.clone(),
            accounts["owners_equity"].id.clone(),
            BigDecimal::from(100_000),
        ))
        .await
        .unwrap();
    engine
        .create_journal_entry(patterns::sale(
            date(2025, 4, 5),
            "First sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(15_000),
        ))
        .await
        .unwrap();

    let cash = engine.get_account(&accounts["cash"].id).await.unwrap().unwrap();
    assert_eq!(cash.balance, BigDecimal::from(115_000));

    // Materialized cache equals the recomputed projection
    let recomputed = engine.recompute_balance(&cash.id).await.unwrap();
    assert_eq!(cash.balance, recomputed);

    // Trial balance invariant and the accounting equation
    let trial = engine.get_trial_balance(date(2025, 4, 30)).await.unwrap();
    assert!(trial.is_balanced);
    assert_eq!(trial.total_debits, trial.total_credits);

    let sheet = engine.get_balance_sheet(date(2025, 4, 30)).await.unwrap();
    assert!(sheet.is_balanced);
    assert_eq!(sheet.total_assets, BigDecimal::from(115_000));
    assert_eq!(
        sheet.total_assets,
        &sheet.total_liabilities + &sheet.total_equity
    );

    let integrity = engine.validate_integrity(date(2025, 4, 30)).await.unwrap();
    assert!(integrity.is_valid, "issues: {:?}", integrity.issues);
}

#[tokio::test]
async fn account_ledger_running_balance() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 1),
            "Morning sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(500),
        ))
        .await
        .unwrap();
    // Same day: ordering falls back to the entry number
    engine
        .create_journal_entry(patterns::expense_payment(
            date(2025, 6, 1),
            "Rent",
            accounts["rent_expense"].id.clone(),
            accounts["cash"].id.clone(),
            BigDecimal::from(200),
        ))
        .await
        .unwrap();

    let ledger = engine
        .get_account_ledger(&accounts["cash"].id, None, None)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(ledger[0].entry_number < ledger[1].entry_number);
    assert_eq!(ledger[0].running_balance, BigDecimal::from(500));
    assert_eq!(ledger[1].running_balance, BigDecimal::from(300));

    // Credit-normal account also trends positive
    let sales_ledger = engine
        .get_account_ledger(&accounts["sales_revenue"].id, None, None)
        .await
        .unwrap();
    assert_eq!(sales_ledger.last().unwrap().running_balance, BigDecimal::from(500));
}

#[tokio::test]
async fn lock_date_rejects_posting_and_leaves_no_state() {
    let mut engine = AccountingEngine::new(
        MemoryStore::new(),
        EngineSettings::with_lock_date(date(2025, 3, 31)),
    );
    let accounts = engine.setup_standard_chart().await.unwrap();

    let result = engine
        .create_journal_entry(patterns::sale(
            date(2025, 3, 31),
            "Backdated sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(500),
        ))
        .await;
    assert!(matches!(result, Err(EngineError::LockedPeriod { .. })));

    // Nothing posted, no balance touched
    let entries = engine
        .get_journal_entries(&EntryFilter::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
    let cash = engine.get_account(&accounts["cash"].id).await.unwrap().unwrap();
    assert_eq!(cash.balance, BigDecimal::from(0));

    // The day after the lock is fine
    assert!(engine
        .create_journal_entry(patterns::sale(
            date(2025, 4, 1),
            "Fresh sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(500),
        ))
        .await
        .is_ok());
}

#[tokio::test]
async fn unbalanced_entry_posts_nothing() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    let result = engine
        .create_journal_entry(
            EntryBuilder::new(date(2025, 6, 1), "Lopsided")
                .debit(accounts["cash"].id.clone(), BigDecimal::from(1000))
                .credit(accounts["sales_revenue"].id.clone(), BigDecimal::from(900))
                .build(),
        )
        .await;
    assert!(matches!(result, Err(EngineError::Validation(_))));

    let cash = engine.get_account(&accounts["cash"].id).await.unwrap().unwrap();
    assert_eq!(cash.balance, BigDecimal::from(0));
}

#[tokio::test]
async fn reversal_offsets_without_mutating_original() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    let sale = engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 1),
            "Disputed sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(500),
        ))
        .await
        .unwrap();

    let reversal = engine
        .reverse_entry(&sale.id, date(2025, 6, 10))
        .await
        .unwrap();
    assert_eq!(reversal.reference.as_deref(), Some("REV-1"));
    assert_eq!(reversal.entry_date, date(2025, 6, 10));

    // The pair nets to zero and the cache agrees with the projection
    let cash = engine.get_account(&accounts["cash"].id).await.unwrap().unwrap();
    assert_eq!(cash.balance, BigDecimal::from(0));
    assert_eq!(
        engine.recompute_balance(&cash.id).await.unwrap(),
        BigDecimal::from(0)
    );

    // The original entry is untouched
    let original = engine.get_journal_entry(&sale.id).await.unwrap().unwrap();
    assert_eq!(original.lines, sale.lines);
    assert_eq!(original.status, EntryStatus::Posted);

    // Drafts cannot be reversed
    let draft = engine
        .create_journal_entry(
            EntryBuilder::new(date(2025, 6, 15), "Pending")
                .debit(accounts["cash"].id.clone(), BigDecimal::from(100))
                .credit(accounts["sales_revenue"].id.clone(), BigDecimal::from(100))
                .draft()
                .build(),
        )
        .await
        .unwrap();
    assert!(engine.reverse_entry(&draft.id, date(2025, 6, 16)).await.is_err());
}

#[tokio::test]
async fn draft_lifecycle() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    let draft = engine
        .create_journal_entry(
            EntryBuilder::new(date(2025, 6, 1), "Pending sale")
                .debit(accounts["cash"].id.clone(), BigDecimal::from(750))
                .credit(accounts["sales_revenue"].id.clone(), BigDecimal::from(750))
                .draft()
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(draft.status, EntryStatus::Draft);

    // Drafts touch no balances and no reports
    let cash = engine.get_account(&accounts["cash"].id).await.unwrap().unwrap();
    assert_eq!(cash.balance, BigDecimal::from(0));
    let sheet = engine.get_balance_sheet(date(2025, 6, 30)).await.unwrap();
    assert_eq!(sheet.total_assets, BigDecimal::from(0));

    // Posting applies them
    let posted = engine.post_entry(&draft.id).await.unwrap();
    assert_eq!(posted.status, EntryStatus::Posted);
    let cash = engine.get_account(&accounts["cash"].id).await.unwrap().unwrap();
    assert_eq!(cash.balance, BigDecimal::from(750));

    // Posted entries are immutable
    let update = engine
        .update_draft(
            &draft.id,
            EntryBuilder::new(date(2025, 6, 2), "Edited")
                .debit(accounts["cash"].id.clone(), BigDecimal::from(1))
                .credit(accounts["sales_revenue"].id.clone(), BigDecimal::from(1))
                .build(),
        )
        .await;
    assert!(matches!(update, Err(EngineError::Validation(_))));
    assert!(engine.delete_draft(&draft.id).await.is_err());
}

#[tokio::test]
async fn inactive_account_refuses_postings() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    engine
        .deactivate_account(&accounts["rent_expense"].id)
        .await
        .unwrap();

    let result = engine
        .create_journal_entry(patterns::expense_payment(
            date(2025, 6, 1),
            "Rent to retired account",
            accounts["rent_expense"].id.clone(),
            accounts["cash"].id.clone(),
            BigDecimal::from(100),
        ))
        .await;
    assert!(matches!(result, Err(EngineError::ReferentialIntegrity(_))));

    engine
        .reactivate_account(&accounts["rent_expense"].id)
        .await
        .unwrap();
    assert!(engine
        .create_journal_entry(patterns::expense_payment(
            date(2025, 6, 1),
            "Rent after reactivation",
            accounts["rent_expense"].id.clone(),
            accounts["cash"].id.clone(),
            BigDecimal::from(100),
        ))
        .await
        .is_ok());
}

#[tokio::test]
async fn referenced_accounts_cannot_be_deleted() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 1),
            "Sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(500),
        ))
        .await
        .unwrap();

    let result = engine.delete_account(&accounts["cash"].id).await;
    assert!(matches!(result, Err(EngineError::ReferentialIntegrity(_))));

    // An untouched account deletes cleanly
    assert!(engine.delete_account(&accounts["equipment"].id).await.is_ok());

    // Duplicate codes are rejected
    let duplicate = engine
        .create_account(NewAccount {
            code: "1000".to_string(),
            name: "Shadow Cash".to_string(),
            account_type: AccountType::Asset,
            sub_type: None,
        })
        .await;
    assert!(matches!(duplicate, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn fifo_valuation() {
    let mut engine = engine();
    let item = engine
        .create_stock_item(NewStockItem {
            name: "Widget".to_string(),
            sku: "WID-1".to_string(),
            unit: "pcs".to_string(),
            valuation_method: ValuationMethod::Fifo,
        })
        .await
        .unwrap();

    for (day, qty, rate) in [(1, 10, 5), (2, 10, 7)] {
        engine
            .create_stock_journal(StockJournal {
                date: date(2025, 6, day),
                reference: None,
                lines: vec![StockJournalLine {
                    item_id: item.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(qty),
                    rate: Some(BigDecimal::from(rate)),
                }],
            })
            .await
            .unwrap();
    }

    // 15 out consumes the $5 lot and 5 units of the $7 lot
    let movements = engine
        .create_stock_journal(StockJournal {
            date: date(2025, 6, 3),
            reference: None,
            lines: vec![StockJournalLine {
                item_id: item.id.clone(),
                movement_type: MovementType::Out,
                qty: BigDecimal::from(15),
                rate: None,
            }],
        })
        .await
        .unwrap();
    assert_eq!(movements[0].amount, BigDecimal::from(85));

    let report = engine.get_inventory_valuation_report().await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].current_stock, BigDecimal::from(5));
    assert_eq!(report[0].current_value, BigDecimal::from(35));
    assert_eq!(report[0].avg_rate, BigDecimal::from(7));

    // Item caches agree with full recomputation
    let cached = engine.list_stock_items().await.unwrap().remove(0);
    let (stock, value) = engine.recompute_valuation(&item.id).await.unwrap();
    assert_eq!(cached.current_stock, stock);
    assert_eq!(cached.current_value, value);
}

#[tokio::test]
async fn weighted_average_valuation() {
    let mut engine = engine();
    let item = engine
        .create_stock_item(NewStockItem {
            name: "Gadget".to_string(),
            sku: "GAD-1".to_string(),
            unit: "pcs".to_string(),
            valuation_method: ValuationMethod::WeightedAverage,
        })
        .await
        .unwrap();

    engine
        .create_stock_journal(StockJournal {
            date: date(2025, 6, 1),
            reference: None,
            lines: vec![
                StockJournalLine {
                    item_id: item.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(10),
                    rate: Some(BigDecimal::from(5)),
                },
                StockJournalLine {
                    item_id: item.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(10),
                    rate: Some(BigDecimal::from(7)),
                },
            ],
        })
        .await
        .unwrap();

    // Average rate $6; issuing 5 reduces value by $30
    let movements = engine
        .create_stock_journal(StockJournal {
            date: date(2025, 6, 2),
            reference: None,
            lines: vec![StockJournalLine {
                item_id: item.id.clone(),
                movement_type: MovementType::Out,
                qty: BigDecimal::from(5),
                rate: None,
            }],
        })
        .await
        .unwrap();
    assert_eq!(movements[0].amount, BigDecimal::from(30));

    let (stock, value) = engine.recompute_valuation(&item.id).await.unwrap();
    assert_eq!(stock, BigDecimal::from(15));
    assert_eq!(value, BigDecimal::from(90));

    let report = engine.get_inventory_valuation_report().await.unwrap();
    assert_eq!(report[0].avg_rate, BigDecimal::from(6));
}

#[tokio::test]
async fn insufficient_stock_fails_whole_journal() {
    let mut engine = engine();
    let fifo_item = engine
        .create_stock_item(NewStockItem {
            name: "Scarce".to_string(),
            sku: "SCR-1".to_string(),
            unit: "pcs".to_string(),
            valuation_method: ValuationMethod::Fifo,
        })
        .await
        .unwrap();
    let other_item = engine
        .create_stock_item(NewStockItem {
            name: "Other".to_string(),
            sku: "OTH-1".to_string(),
            unit: "pcs".to_string(),
            valuation_method: ValuationMethod::Fifo,
        })
        .await
        .unwrap();

    engine
        .create_stock_journal(StockJournal {
            date: date(2025, 6, 1),
            reference: None,
            lines: vec![StockJournalLine {
                item_id: fifo_item.id.clone(),
                movement_type: MovementType::In,
                qty: BigDecimal::from(10),
                rate: Some(BigDecimal::from(5)),
            }],
        })
        .await
        .unwrap();

    // A good inward line and a bad outward line in one journal: all or nothing
    let result = engine
        .create_stock_journal(StockJournal {
            date: date(2025, 6, 2),
            reference: None,
            lines: vec![
                StockJournalLine {
                    item_id: other_item.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(5),
                    rate: Some(BigDecimal::from(4)),
                },
                StockJournalLine {
                    item_id: fifo_item.id.clone(),
                    movement_type: MovementType::Out,
                    qty: BigDecimal::from(12),
                    rate: None,
                },
            ],
        })
        .await;
    assert!(matches!(result, Err(EngineError::InsufficientStock { .. })));

    // No partial writes: the good line was rolled back with the bad one
    let (other_stock, _) = engine.recompute_valuation(&other_item.id).await.unwrap();
    assert_eq!(other_stock, BigDecimal::from(0));
    let (fifo_stock, fifo_value) = engine.recompute_valuation(&fifo_item.id).await.unwrap();
    assert_eq!(fifo_stock, BigDecimal::from(10));
    assert_eq!(fifo_value, BigDecimal::from(50));
}

#[tokio::test]
async fn bank_reconciliation_arithmetic() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();
    let bank = engine
        .create_bank_account(NewBankAccount {
            account_id: accounts["bank"].id.clone(),
            account_name: "Current Account".to_string(),
            account_number: "001122334455".to_string(),
            bank_name: "State Bank".to_string(),
            currency: "INR".to_string(),
        })
        .await
        .unwrap();

    let deposit = engine
        .create_journal_entry(patterns::owner_investment(
            date(2025, 6, 1),
            "Capital deposit",
            accounts["bank"].id.clone(),
            accounts["owners_equity"].id.clone(),
            BigDecimal::from(10_000),
        ))
        .await
        .unwrap();
    engine
        .create_journal_entry(patterns::expense_payment(
            date(2025, 6, 5),
            "Rent cheque",
            accounts["rent_expense"].id.clone(),
            accounts["bank"].id.clone(),
            BigDecimal::from(2_000),
        ))
        .await
        .unwrap();
    engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 10),
            "Customer transfer",
            accounts["bank"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(3_000),
        ))
        .await
        .unwrap();

    // Only the deposit has hit the statement so far
    engine
        .reconcile_transaction(&deposit.id, date(2025, 6, 2))
        .await
        .unwrap();

    let report = engine
        .get_bank_reconciliation_report(&bank.id, date(2025, 6, 30))
        .await
        .unwrap();
    assert_eq!(report.book_balance, BigDecimal::from(11_000));
    assert_eq!(report.total_uncleared_debits, BigDecimal::from(3_000));
    assert_eq!(report.total_uncleared_credits, BigDecimal::from(2_000));
    assert_eq!(report.uncleared_debits.len(), 1);
    assert_eq!(report.uncleared_credits.len(), 1);
    // bank balance = book + uncleared credits - uncleared debits
    assert_eq!(
        report.bank_balance,
        &report.book_balance + &report.total_uncleared_credits
            - &report.total_uncleared_debits
    );
    assert_eq!(report.bank_balance, BigDecimal::from(10_000));

    // Clearing an already-cleared entry is NotFound
    let again = engine
        .reconcile_transaction(&deposit.id, date(2025, 6, 3))
        .await;
    assert!(matches!(again, Err(EngineError::NotFound(_))));

    // An entry not touching any bank ledger account is NotFound
    let cash_sale = engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 12),
            "Cash counter sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(100),
        ))
        .await
        .unwrap();
    let not_bank = engine
        .reconcile_transaction(&cash_sale.id, date(2025, 6, 13))
        .await;
    assert!(matches!(not_bank, Err(EngineError::NotFound(_))));

    // Drafts are not on the statement and cannot be matched against it
    let draft = engine
        .create_journal_entry(
            EntryBuilder::new(date(2025, 6, 20), "Pending transfer")
                .debit(accounts["bank"].id.clone(), BigDecimal::from(50))
                .credit(accounts["sales_revenue"].id.clone(), BigDecimal::from(50))
                .draft()
                .build(),
        )
        .await
        .unwrap();
    let draft_result = engine
        .reconcile_transaction(&draft.id, date(2025, 6, 21))
        .await;
    assert!(matches!(draft_result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn profit_and_loss_with_cogs() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 1),
            "Sales",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(10_000),
        ))
        .await
        .unwrap();
    engine
        .create_journal_entry(patterns::expense_payment(
            date(2025, 6, 2),
            "Goods sold",
            accounts["cost_of_goods_sold"].id.clone(),
            accounts["inventory"].id.clone(),
            BigDecimal::from(4_000),
        ))
        .await
        .unwrap();
    engine
        .create_journal_entry(patterns::expense_payment(
            date(2025, 6, 3),
            "Rent",
            accounts["rent_expense"].id.clone(),
            accounts["cash"].id.clone(),
            BigDecimal::from(1_500),
        ))
        .await
        .unwrap();

    let pnl = engine
        .get_profit_and_loss(date(2025, 6, 1), date(2025, 6, 30))
        .await
        .unwrap();
    assert_eq!(pnl.total_revenue, BigDecimal::from(10_000));
    assert_eq!(pnl.total_cogs, BigDecimal::from(4_000));
    assert_eq!(pnl.gross_profit, BigDecimal::from(6_000));
    assert_eq!(pnl.total_expenses, BigDecimal::from(1_500));
    assert_eq!(pnl.net_profit, BigDecimal::from(4_500));

    // Out-of-range entries are excluded
    let empty = engine
        .get_profit_and_loss(date(2025, 7, 1), date(2025, 7, 31))
        .await
        .unwrap();
    assert_eq!(empty.net_profit, BigDecimal::from(0));
}

#[tokio::test]
async fn cash_flow_buckets() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    // Financing: equity in
    engine
        .create_journal_entry(patterns::owner_investment(
            date(2025, 6, 1),
            "Owner investment",
            accounts["cash"].id.clone(),
            accounts["owners_equity"].id.clone(),
            BigDecimal::from(10_000),
        ))
        .await
        .unwrap();
    // Operating: sale for cash
    engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 5),
            "Counter sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(500),
        ))
        .await
        .unwrap();
    // Investing: buy equipment with cash
    engine
        .create_journal_entry(
            EntryBuilder::new(date(2025, 6, 10), "Buy lathe")
                .debit(accounts["equipment"].id.clone(), BigDecimal::from(3_000))
                .credit(accounts["cash"].id.clone(), BigDecimal::from(3_000))
                .build(),
        )
        .await
        .unwrap();

    let statement = engine
        .get_cash_flow_statement(date(2025, 6, 1), date(2025, 6, 30))
        .await
        .unwrap();
    assert_eq!(statement.net_financing_cash_flow, BigDecimal::from(10_000));
    assert_eq!(statement.net_operating_cash_flow, BigDecimal::from(500));
    assert_eq!(statement.net_investing_cash_flow, BigDecimal::from(-3_000));
    assert_eq!(statement.net_cash_flow, BigDecimal::from(7_500));
}

#[tokio::test]
async fn budget_variance() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    engine
        .create_journal_entry(patterns::expense_payment(
            date(2025, 6, 5),
            "June rent",
            accounts["rent_expense"].id.clone(),
            accounts["cash"].id.clone(),
            BigDecimal::from(2_000),
        ))
        .await
        .unwrap();

    engine
        .create_budget(NewBudget {
            name: "Rent, healthy".to_string(),
            category: "rent".to_string(),
            period_start: date(2025, 6, 1),
            period_end: date(2025, 6, 30),
            allocated_budget: BigDecimal::from(5_000),
        })
        .await
        .unwrap();
    engine
        .create_budget(NewBudget {
            name: "Rent, tight".to_string(),
            category: "rent".to_string(),
            period_start: date(2025, 6, 1),
            period_end: date(2025, 6, 30),
            allocated_budget: BigDecimal::from(1_000),
        })
        .await
        .unwrap();

    let report = engine.get_budget_variance_report().await.unwrap();
    assert_eq!(report.len(), 2);

    let healthy = report.iter().find(|v| v.budget.name == "Rent, healthy").unwrap();
    assert_eq!(healthy.actual_amount, BigDecimal::from(2_000));
    assert_eq!(healthy.variance, BigDecimal::from(3_000));
    assert_eq!(healthy.status, BudgetStatus::OnTrack);

    let tight = report.iter().find(|v| v.budget.name == "Rent, tight").unwrap();
    assert_eq!(tight.variance, BigDecimal::from(-1_000));
    assert_eq!(tight.status, BudgetStatus::OverBudget);
}

#[tokio::test]
async fn gst_reports() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    // Outward supply: 10,000 @ 18%
    engine
        .create_journal_entry(patterns::invoice_with_gst(
            date(2025, 6, 5),
            "INV-001",
            "Consulting invoice",
            accounts["accounts_receivable"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            accounts["gst_payable"].id.clone(),
            BigDecimal::from(10_000),
            BigDecimal::from(1_800),
        ))
        .await
        .unwrap();
    // Inward supply: 2,000 base with 360 recoverable GST
    engine
        .create_journal_entry(patterns::bill_with_gst(
            date(2025, 6, 10),
            "Stationery bill",
            accounts["rent_expense"].id.clone(),
            accounts["gst_receivable"].id.clone(),
            accounts["cash"].id.clone(),
            BigDecimal::from(2_000),
            BigDecimal::from(360),
        ))
        .await
        .unwrap();

    let gstr1 = engine.get_gstr1_report(6, 2025).await.unwrap();
    assert_eq!(gstr1.invoices.len(), 1);
    assert_eq!(gstr1.invoices[0].invoice_no, "INV-001");
    assert_eq!(gstr1.invoices[0].taxable_value, BigDecimal::from(10_000));
    assert_eq!(gstr1.invoices[0].tax_amount, BigDecimal::from(1_800));
    assert_eq!(gstr1.invoices[0].tax_rate, BigDecimal::from(18));
    assert_eq!(gstr1.rate_summaries.len(), 1);
    assert_eq!(gstr1.total_taxable_value, BigDecimal::from(10_000));
    assert_eq!(gstr1.total_tax, BigDecimal::from(1_800));

    let gstr3b = engine.get_gstr3b_report(6, 2025).await.unwrap();
    assert_eq!(gstr3b.outward_supplies, BigDecimal::from(10_000));
    assert_eq!(gstr3b.tax_liability, BigDecimal::from(1_800));
    assert_eq!(gstr3b.input_tax_credit, BigDecimal::from(360));
    assert_eq!(gstr3b.net_tax_payable, BigDecimal::from(1_440));

    // A different month is empty
    let july = engine.get_gstr1_report(7, 2025).await.unwrap();
    assert!(july.invoices.is_empty());
    assert_eq!(july.total_tax, BigDecimal::from(0));
}

#[tokio::test]
async fn recurring_automation_is_idempotent_per_day() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    engine
        .create_recurring_template(NewRecurringTemplate {
            name: "Monthly rent".to_string(),
            frequency: Frequency::Monthly,
            start_date: date(2025, 5, 1),
            entry_data: EntryTemplate {
                description: "Office rent".to_string(),
                reference: Some("RENT".to_string()),
                lines: vec![
                    JournalLine::debit(
                        accounts["rent_expense"].id.clone(),
                        BigDecimal::from(2_000),
                        None,
                    ),
                    JournalLine::credit(
                        accounts["bank"].id.clone(),
                        BigDecimal::from(2_000),
                        None,
                    ),
                ],
            },
        })
        .await
        .unwrap();

    // Catch-up: May 1 and June 1 are both due on June 15
    let processed = engine.process_recurring_due(date(2025, 6, 15)).await.unwrap();
    assert_eq!(processed, 2);

    // Same-day rerun posts nothing
    let again = engine.process_recurring_due(date(2025, 6, 15)).await.unwrap();
    assert_eq!(again, 0);

    let entries = engine
        .get_journal_entries(&EntryFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry_date, date(2025, 5, 1));
    assert_eq!(entries[1].entry_date, date(2025, 6, 1));

    // Next month's run materializes exactly one more
    let next_month = engine.process_recurring_due(date(2025, 7, 1)).await.unwrap();
    assert_eq!(next_month, 1);

    // Paused templates accrue but do not post
    let template = engine.list_recurring_templates().await.unwrap().remove(0);
    engine.pause_template(&template.id).await.unwrap();
    let paused = engine.process_recurring_due(date(2025, 9, 1)).await.unwrap();
    assert_eq!(paused, 0);
}

struct FailingClassifier;

#[async_trait]
impl AnomalyClassifier for FailingClassifier {
    async fn classify(&self, _entries: &[JournalEntry]) -> EngineResult<Vec<Anomaly>> {
        Err(EngineError::Storage("classifier backend down".to_string()))
    }
}

struct SlowClassifier;

#[async_trait]
impl AnomalyClassifier for SlowClassifier {
    async fn classify(&self, _entries: &[JournalEntry]) -> EngineResult<Vec<Anomaly>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn anomaly_screening_flags_duplicates() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    // Two identical amounts on one (week)day
    for description in ["Payment A", "Payment B"] {
        engine
            .create_journal_entry(patterns::sale(
                date(2025, 6, 2),
                description,
                accounts["cash"].id.clone(),
                accounts["sales_revenue"].id.clone(),
                BigDecimal::from(999),
            ))
            .await
            .unwrap();
    }

    let anomalies = engine.get_anomalies().await;
    assert_eq!(anomalies.len(), 2);
    assert!(anomalies.iter().all(|a| a.reason.contains("appears 2 times")));
}

#[tokio::test]
async fn anomaly_screening_degrades_gracefully() {
    let mut failing = AccountingEngine::with_classifier(
        MemoryStore::new(),
        EngineSettings::default(),
        FailingClassifier,
    );
    let accounts = failing.setup_standard_chart().await.unwrap();
    failing
        .create_journal_entry(patterns::sale(
            date(2025, 6, 2),
            "Sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(100),
        ))
        .await
        .unwrap();
    assert!(failing.get_anomalies().await.is_empty());

    let slow_settings = EngineSettings {
        classifier_timeout: Duration::from_millis(50),
        ..EngineSettings::default()
    };
    let slow = AccountingEngine::with_classifier(MemoryStore::new(), slow_settings, SlowClassifier);
    assert!(slow.get_anomalies().await.is_empty());
}

#[tokio::test]
async fn core_types_serde_round_trip() {
    let mut engine = engine();
    let accounts = engine.setup_standard_chart().await.unwrap();

    let entry = engine
        .create_journal_entry(patterns::sale(
            date(2025, 6, 1),
            "Serialized sale",
            accounts["cash"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(500),
        ))
        .await
        .unwrap();

    let json = serde_json::to_string(&entry).unwrap();
    let back: JournalEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(entry, back);

    // Lines without reconciliation fields deserialize with defaults
    let legacy = r#"{
        "account_id": "x",
        "entry_type": "Debit",
        "amount": "10",
        "description": null
    }"#;
    let line: JournalLine = serde_json::from_str(legacy).unwrap();
    assert!(!line.cleared);
    assert!(line.cleared_date.is_none());
}
