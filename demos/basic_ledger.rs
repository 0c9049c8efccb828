//! Basic ledger usage example

use bigdecimal::BigDecimal;
use bizledger_core::utils::MemoryStore;
use bizledger_core::{patterns, AccountingEngine, EngineSettings, EntryFilter, NewBankAccount};
use chrono::NaiveDate;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Bizledger Core - Basic Ledger Example\n");

    let mut engine = AccountingEngine::new(MemoryStore::new(), EngineSettings::default());

    // 1. Set up a chart of accounts
    println!("📊 Setting up Chart of Accounts...");
    let accounts = engine.setup_standard_chart().await?;
    for account in accounts.values() {
        println!(
            "  ✓ {} - {} ({:?})",
            account.code, account.name, account.account_type
        );
    }
    println!();

    // 2. Record some business transactions
    println!("💰 Recording Business Transactions...\n");

    engine
        .create_journal_entry(patterns::owner_investment(
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            "Initial owner investment",
            accounts["bank"].id.clone(),
            accounts["owners_equity"].id.clone(),
            BigDecimal::from(50_000),
        ))
        .await?;
    println!("  ✓ Recorded: Owner investment of ₹50,000");

    engine
        .create_journal_entry(patterns::sale(
            NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            "First customer sale",
            accounts["bank"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            BigDecimal::from(12_000),
        ))
        .await?;
    println!("  ✓ Recorded: Sale of ₹12,000");

    let rent = engine
        .create_journal_entry(patterns::expense_payment(
            NaiveDate::from_ymd_opt(2025, 4, 15).unwrap(),
            "April office rent",
            accounts["rent_expense"].id.clone(),
            accounts["bank"].id.clone(),
            BigDecimal::from(8_000),
        ))
        .await?;
    println!("  ✓ Recorded: Rent payment of ₹8,000\n");

    // 3. Account ledger with running balances
    println!("📒 Bank Ledger:");
    for line in engine
        .get_account_ledger(&accounts["bank"].id, None, None)
        .await?
    {
        println!(
            "  #{:<3} {} {:>10}  (balance {:>10})",
            line.entry_number, line.entry_date, line.amount, line.running_balance
        );
    }
    println!();

    // 4. Bank reconciliation
    let bank = engine
        .create_bank_account(NewBankAccount {
            account_id: accounts["bank"].id.clone(),
            account_name: "Current Account".to_string(),
            account_number: "001122334455".to_string(),
            bank_name: "State Bank".to_string(),
            currency: "INR".to_string(),
        })
        .await?;
    engine
        .reconcile_transaction(&rent.id, NaiveDate::from_ymd_opt(2025, 4, 18).unwrap())
        .await?;

    let reconciliation = engine
        .get_bank_reconciliation_report(&bank.id, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap())
        .await?;
    println!("🏦 Bank Reconciliation (as of 2025-04-30):");
    println!("  Book balance:       {}", reconciliation.book_balance);
    println!("  Uncleared debits:   {}", reconciliation.total_uncleared_debits);
    println!("  Uncleared credits:  {}", reconciliation.total_uncleared_credits);
    println!("  Expected bank bal:  {}\n", reconciliation.bank_balance);

    // 5. Financial statements
    let as_of = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
    let trial = engine.get_trial_balance(as_of).await?;
    println!(
        "⚖️  Trial balance: debits {} = credits {} ({})",
        trial.total_debits,
        trial.total_credits,
        if trial.is_balanced { "balanced" } else { "NOT BALANCED" }
    );

    let sheet = engine.get_balance_sheet(as_of).await?;
    println!(
        "📈 Balance sheet: assets {} = liabilities {} + equity {}",
        sheet.total_assets, sheet.total_liabilities, sheet.total_equity
    );

    let pnl = engine
        .get_profit_and_loss(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), as_of)
        .await?;
    println!(
        "💹 P&L: revenue {} - expenses {} = net profit {}",
        pnl.total_revenue, pnl.total_expenses, pnl.net_profit
    );

    let entry_count = engine.get_journal_entries(&EntryFilter::default()).await?.len();
    println!("\n✅ Done: {entry_count} journal entries on the books");

    Ok(())
}
