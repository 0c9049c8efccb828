//! # Bizledger Core
//!
//! The bookkeeping engine of a small-business management suite: double-entry
//! journal, chart of accounts, inventory valuation, bank reconciliation,
//! financial statements, GST returns, and recurring-entry automation.
//!
//! ## Features
//!
//! - **Double-entry journal**: multi-line entries validated to balance, with
//!   sequential numbering per fiscal year, period locking, and
//!   reversal-based corrections
//! - **Chart of accounts**: typed accounts with materialized balances that
//!   stay recomputable from the posted history
//! - **Ledger projections**: per-account statements with running balances
//!   and trial balance, derived purely from posted entries
//! - **Inventory valuation**: FIFO and weighted-average costing replayed
//!   from the stock movement history
//! - **Bank reconciliation**: cleared/uncleared partitioning of
//!   bank-affecting entries
//! - **Reporting**: balance sheet, profit & loss, cash flow, budget
//!   variance, and GSTR-1/3B returns
//! - **Automation**: recurring journal templates and pluggable anomaly
//!   screening
//! - **Storage abstraction**: backend-agnostic design with a trait-based
//!   store
//!
//! ## Quick Start
//!
//! ```rust
//! use bizledger_core::{
//!     AccountingEngine, AccountType, EngineSettings, NewAccount, patterns,
//!     utils::MemoryStore,
//! };
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = AccountingEngine::new(MemoryStore::new(), EngineSettings::default());
//!
//! let cash = engine
//!     .create_account(NewAccount {
//!         code: "1000".to_string(),
//!         name: "Cash".to_string(),
//!         account_type: AccountType::Asset,
//!         sub_type: Some("cash".to_string()),
//!     })
//!     .await?;
//! let sales = engine
//!     .create_account(NewAccount {
//!         code: "4000".to_string(),
//!         name: "Sales".to_string(),
//!         account_type: AccountType::Revenue,
//!         sub_type: None,
//!     })
//!     .await?;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
//! engine
//!     .create_journal_entry(patterns::sale(
//!         date,
//!         "Opening sale",
//!         cash.id.clone(),
//!         sales.id.clone(),
//!         BigDecimal::from(500),
//!     ))
//!     .await?;
//!
//! let sheet = engine.get_balance_sheet(date).await?;
//! assert!(sheet.is_balanced);
//! # Ok(())
//! # }
//! ```

pub mod automation;
pub mod config;
pub mod inventory;
pub mod ledger;
pub mod reconciliation;
pub mod reports;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use automation::*;
pub use config::*;
pub use inventory::*;
pub use ledger::*;
pub use reconciliation::*;
pub use reports::*;
pub use traits::*;
pub use types::*;

// Re-export entry patterns for convenience
pub use ledger::journal::patterns;
