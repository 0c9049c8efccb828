//! Inventory valuation and GST reporting example

use bigdecimal::BigDecimal;
use bizledger_core::gst::{GstCalculation, GstSlab};
use bizledger_core::utils::MemoryStore;
use bizledger_core::{
    patterns, AccountingEngine, EngineSettings, MovementType, NewStockItem, StockJournal,
    StockJournalLine, ValuationMethod,
};
use chrono::NaiveDate;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Bizledger Core - Inventory & GST Example\n");

    let mut engine = AccountingEngine::new(MemoryStore::new(), EngineSettings::default());
    let accounts = engine.setup_standard_chart().await?;

    // 1. Stock two items under different valuation methods
    println!("📦 Creating stock items...");
    let widget = engine
        .create_stock_item(NewStockItem {
            name: "Widget".to_string(),
            sku: "WID-1".to_string(),
            unit: "pcs".to_string(),
            valuation_method: ValuationMethod::Fifo,
        })
        .await?;
    let gadget = engine
        .create_stock_item(NewStockItem {
            name: "Gadget".to_string(),
            sku: "GAD-1".to_string(),
            unit: "pcs".to_string(),
            valuation_method: ValuationMethod::WeightedAverage,
        })
        .await?;
    println!("  ✓ Widget (FIFO), Gadget (Weighted Average)\n");

    // 2. Receive stock at two different rates, then issue some
    println!("🚚 Posting stock journals...");
    engine
        .create_stock_journal(StockJournal {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            reference: Some("GRN-001".to_string()),
            lines: vec![
                StockJournalLine {
                    item_id: widget.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(10),
                    rate: Some(BigDecimal::from(5)),
                },
                StockJournalLine {
                    item_id: gadget.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(10),
                    rate: Some(BigDecimal::from(5)),
                },
            ],
        })
        .await?;
    engine
        .create_stock_journal(StockJournal {
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            reference: Some("GRN-002".to_string()),
            lines: vec![
                StockJournalLine {
                    item_id: widget.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(10),
                    rate: Some(BigDecimal::from(7)),
                },
                StockJournalLine {
                    item_id: gadget.id.clone(),
                    movement_type: MovementType::In,
                    qty: BigDecimal::from(10),
                    rate: Some(BigDecimal::from(7)),
                },
            ],
        })
        .await?;
    let issues = engine
        .create_stock_journal(StockJournal {
            date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            reference: Some("DN-001".to_string()),
            lines: vec![
                StockJournalLine {
                    item_id: widget.id.clone(),
                    movement_type: MovementType::Out,
                    qty: BigDecimal::from(15),
                    rate: None,
                },
                StockJournalLine {
                    item_id: gadget.id.clone(),
                    movement_type: MovementType::Out,
                    qty: BigDecimal::from(15),
                    rate: None,
                },
            ],
        })
        .await?;
    println!("  ✓ 15 units issued of each:");
    println!("    FIFO cost of goods:       {}", issues[0].amount);
    println!("    Weighted-average cost:    {}\n", issues[1].amount);

    // 3. Valuation report
    println!("📊 Inventory Valuation:");
    for row in engine.get_inventory_valuation_report().await? {
        println!(
            "  {:<8} stock {:>4} @ avg {:>6}  = {}",
            row.item.name, row.current_stock, row.avg_rate, row.current_value
        );
    }
    println!();

    // 4. Invoice the sale with 18% GST and file the month
    let taxable = BigDecimal::from(10_000);
    let calc = GstCalculation::calculate(taxable.clone(), GstSlab::Higher.intra_state_rate())?;
    println!(
        "🧮 GST on ₹{}: CGST {} + SGST {} = {}",
        calc.base_amount, calc.cgst_amount, calc.sgst_amount, calc.total_gst_amount
    );

    engine
        .create_journal_entry(patterns::invoice_with_gst(
            NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            "INV-001",
            "Widget shipment",
            accounts["accounts_receivable"].id.clone(),
            accounts["sales_revenue"].id.clone(),
            accounts["gst_payable"].id.clone(),
            taxable,
            calc.total_gst_amount.clone(),
        ))
        .await?;
    engine
        .create_journal_entry(patterns::bill_with_gst(
            NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
            "June rent with GST",
            accounts["rent_expense"].id.clone(),
            accounts["gst_receivable"].id.clone(),
            accounts["cash"].id.clone(),
            BigDecimal::from(2_000),
            BigDecimal::from(360),
        ))
        .await?;

    let gstr1 = engine.get_gstr1_report(6, 2025).await?;
    println!("\n📄 GSTR-1 (June 2025):");
    for invoice in &gstr1.invoices {
        println!(
            "  {} on {}: taxable {} @ {}% = tax {}",
            invoice.invoice_no,
            invoice.entry_date,
            invoice.taxable_value,
            invoice.tax_rate,
            invoice.tax_amount
        );
    }
    println!(
        "  Totals: taxable {} / tax {}",
        gstr1.total_taxable_value, gstr1.total_tax
    );

    let gstr3b = engine.get_gstr3b_report(6, 2025).await?;
    println!("\n📄 GSTR-3B (June 2025):");
    println!("  Outward supplies:  {}", gstr3b.outward_supplies);
    println!("  Tax liability:     {}", gstr3b.tax_liability);
    println!("  Input tax credit:  {}", gstr3b.input_tax_credit);
    println!("  Net tax payable:   {}", gstr3b.net_tax_payable);

    Ok(())
}
