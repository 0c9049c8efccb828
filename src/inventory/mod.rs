//! Inventory valuation engine
//!
//! Stock quantities and values derive from the movement history; the
//! `current_stock` / `current_value` fields on [`StockItem`] are materialized
//! caches updated transactionally with each stock journal and verified
//! against full recomputation in tests.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::traits::EngineStorage;
use crate::types::{EngineError, EngineResult};

/// Inventory costing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationMethod {
    /// Oldest-acquired units are deemed sold first
    Fifo,
    /// Single blended unit cost across all units held
    WeightedAverage,
}

/// A stocked item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub id: String,
    pub name: String,
    /// Unique stock-keeping unit code
    pub sku: String,
    /// Unit of measure ("pcs", "kg", ...)
    pub unit: String,
    pub valuation_method: ValuationMethod,
    /// Cached quantity on hand, recomputable from movements
    pub current_stock: BigDecimal,
    /// Cached value on hand, recomputable from movements
    pub current_value: BigDecimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for creating a stock item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStockItem {
    pub name: String,
    pub sku: String,
    pub unit: String,
    pub valuation_method: ValuationMethod,
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    In,
    Out,
}

/// A recorded stock movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub item_id: String,
    pub movement_type: MovementType,
    /// Quantity moved, always positive
    pub qty: BigDecimal,
    /// Unit rate: the purchase rate for inward movements, the computed unit
    /// cost for outward movements
    pub rate: BigDecimal,
    /// Total value moved; for outward movements this is the cost of goods
    /// sold under the item's valuation method
    pub amount: BigDecimal,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// One line of a stock journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockJournalLine {
    pub item_id: String,
    pub movement_type: MovementType,
    pub qty: BigDecimal,
    /// Required for inward lines; ignored for outward lines, whose cost the
    /// valuation method determines
    pub rate: Option<BigDecimal>,
}

/// A batch of stock movements posted together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockJournal {
    pub date: NaiveDate,
    pub reference: Option<String>,
    pub lines: Vec<StockJournalLine>,
}

/// Valuation of one item in the inventory report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemValuation {
    pub item: StockItem,
    pub current_stock: BigDecimal,
    /// `current_value / current_stock`, zero when out of stock
    pub avg_rate: BigDecimal,
    pub current_value: BigDecimal,
}

/// An inbound cost lot awaiting consumption (FIFO)
#[derive(Debug, Clone, PartialEq)]
struct Lot {
    qty: BigDecimal,
    rate: BigDecimal,
}

/// Valuation state replayed from a movement history
#[derive(Debug, Clone)]
struct ValuationState {
    method: ValuationMethod,
    qty: BigDecimal,
    value: BigDecimal,
    /// Oldest lot first; only maintained under FIFO
    lots: VecDeque<Lot>,
}

impl ValuationState {
    fn new(method: ValuationMethod) -> Self {
        Self {
            method,
            qty: BigDecimal::from(0),
            value: BigDecimal::from(0),
            lots: VecDeque::new(),
        }
    }

    /// Rebuild the state from a movement history in posting order.
    fn replay(method: ValuationMethod, movements: &[StockMovement]) -> EngineResult<Self> {
        let mut state = Self::new(method);
        for movement in movements {
            match movement.movement_type {
                MovementType::In => state.receive(&movement.qty, &movement.rate),
                MovementType::Out => {
                    state.issue(&movement.item_id, &movement.qty)?;
                }
            }
        }
        Ok(state)
    }

    fn receive(&mut self, qty: &BigDecimal, rate: &BigDecimal) {
        self.qty += qty;
        self.value += qty * rate;
        if self.method == ValuationMethod::Fifo {
            self.lots.push_back(Lot {
                qty: qty.clone(),
                rate: rate.clone(),
            });
        }
    }

    /// Remove `qty` units, returning their cost under the valuation method.
    fn issue(&mut self, item_id: &str, qty: &BigDecimal) -> EngineResult<BigDecimal> {
        if *qty > self.qty {
            return Err(EngineError::InsufficientStock {
                item_id: item_id.to_string(),
                requested: qty.clone(),
                available: self.qty.clone(),
            });
        }

        let cost = match self.method {
            ValuationMethod::Fifo => {
                let mut remaining = qty.clone();
                let mut cost = BigDecimal::from(0);
                while remaining > BigDecimal::from(0) {
                    // The quantity guard above means lots cannot run dry here.
                    let mut lot = self
                        .lots
                        .pop_front()
                        .expect("FIFO lots cover available quantity");
                    if lot.qty <= remaining {
                        cost += &lot.qty * &lot.rate;
                        remaining -= &lot.qty;
                    } else {
                        cost += &remaining * &lot.rate;
                        lot.qty -= &remaining;
                        remaining = BigDecimal::from(0);
                        self.lots.push_front(lot);
                    }
                }
                cost
            }
            ValuationMethod::WeightedAverage => {
                // Average rate is taken before the update.
                let avg_rate = &self.value / &self.qty;
                qty * &avg_rate
            }
        };

        self.qty -= qty;
        self.value -= &cost;
        Ok(cost)
    }
}

/// Inventory engine handling stock journals and valuation reports
pub struct InventoryEngine<S: EngineStorage> {
    pub(crate) storage: S,
}

impl<S: EngineStorage> InventoryEngine<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a stock item with empty stock.
    pub async fn create_item(&mut self, data: NewStockItem) -> EngineResult<StockItem> {
        if data.sku.trim().is_empty() {
            return Err(EngineError::Validation("sku cannot be empty".to_string()));
        }
        if self
            .storage
            .get_stock_item_by_sku(&data.sku)
            .await?
            .is_some()
        {
            return Err(EngineError::Validation(format!(
                "stock item with sku '{}' already exists",
                data.sku
            )));
        }

        let now = chrono::Utc::now().naive_utc();
        let item = StockItem {
            id: uuid::Uuid::new_v4().to_string(),
            name: data.name,
            sku: data.sku,
            unit: data.unit,
            valuation_method: data.valuation_method,
            current_stock: BigDecimal::from(0),
            current_value: BigDecimal::from(0),
            created_at: now,
            updated_at: now,
        };
        self.storage.save_stock_item(&item).await?;
        Ok(item)
    }

    /// Get a stock item by ID, returning an error if not found
    pub async fn get_item_required(&self, item_id: &str) -> EngineResult<StockItem> {
        self.storage
            .get_stock_item(item_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("stock item '{item_id}'")))
    }

    /// Post a stock journal.
    ///
    /// Every line is costed against a scratch replay of the item's movement
    /// history before anything is written; an outward line exceeding the
    /// quantity available at its point in the sequence fails the whole
    /// journal with `InsufficientStock` and leaves no partial state.
    pub async fn create_stock_journal(
        &mut self,
        journal: StockJournal,
    ) -> EngineResult<Vec<StockMovement>> {
        if journal.lines.is_empty() {
            return Err(EngineError::Validation(
                "stock journal must have at least one line".to_string(),
            ));
        }

        // Replay each touched item's history once.
        let mut items: BTreeMap<String, StockItem> = BTreeMap::new();
        let mut states: BTreeMap<String, ValuationState> = BTreeMap::new();
        for line in &journal.lines {
            if line.qty <= BigDecimal::from(0) {
                return Err(EngineError::Validation(
                    "movement quantity must be positive".to_string(),
                ));
            }
            if !items.contains_key(&line.item_id) {
                let item = self.get_item_required(&line.item_id).await?;
                let history = self.storage.list_stock_movements(&item.id).await?;
                states.insert(
                    item.id.clone(),
                    ValuationState::replay(item.valuation_method, &history)?,
                );
                items.insert(item.id.clone(), item);
            }
        }

        // Cost the lines in order against the scratch states.
        let now = chrono::Utc::now().naive_utc();
        let mut movements = Vec::with_capacity(journal.lines.len());
        for line in &journal.lines {
            let state = states
                .get_mut(&line.item_id)
                .expect("state loaded for every line");
            let (rate, amount) = match line.movement_type {
                MovementType::In => {
                    let rate = line.rate.clone().ok_or_else(|| {
                        EngineError::Validation(
                            "inward movement requires a rate".to_string(),
                        )
                    })?;
                    if rate < BigDecimal::from(0) {
                        return Err(EngineError::Validation(
                            "movement rate cannot be negative".to_string(),
                        ));
                    }
                    let amount = &line.qty * &rate;
                    state.receive(&line.qty, &rate);
                    (rate, amount)
                }
                MovementType::Out => {
                    let cost = state.issue(&line.item_id, &line.qty)?;
                    let rate = &cost / &line.qty;
                    (rate, cost)
                }
            };
            movements.push(StockMovement {
                id: uuid::Uuid::new_v4().to_string(),
                item_id: line.item_id.clone(),
                movement_type: line.movement_type,
                qty: line.qty.clone(),
                rate,
                amount,
                date: journal.date,
                created_at: now,
            });
        }

        // All lines validated and costed; persist.
        for movement in &movements {
            self.storage.save_stock_movement(movement).await?;
        }
        for (item_id, state) in states {
            let mut item = items.remove(&item_id).expect("item loaded with state");
            item.current_stock = state.qty;
            item.current_value = state.value;
            item.updated_at = now;
            self.storage.update_stock_item(&item).await?;
        }

        tracing::debug!(
            lines = movements.len(),
            date = %journal.date,
            "stock journal posted"
        );

        Ok(movements)
    }

    /// Inventory valuation report, recomputed from the movement history.
    pub async fn valuation_report(&self) -> EngineResult<Vec<ItemValuation>> {
        let mut report = Vec::new();
        for item in self.storage.list_stock_items().await? {
            let (stock, value) = self.recompute_valuation(&item.id).await?;
            let avg_rate = if stock == BigDecimal::from(0) {
                BigDecimal::from(0)
            } else {
                &value / &stock
            };
            report.push(ItemValuation {
                item,
                current_stock: stock,
                avg_rate,
                current_value: value,
            });
        }
        Ok(report)
    }

    /// Recompute `(quantity, value)` for one item from its movement history,
    /// bypassing the caches on the item record.
    pub async fn recompute_valuation(
        &self,
        item_id: &str,
    ) -> EngineResult<(BigDecimal, BigDecimal)> {
        let item = self.get_item_required(item_id).await?;
        let history = self.storage.list_stock_movements(item_id).await?;
        let state = ValuationState::replay(item.valuation_method, &history)?;
        Ok((state.qty, state.value))
    }

    /// Movement history for one item in posting order.
    pub async fn movements(&self, item_id: &str) -> EngineResult<Vec<StockMovement>> {
        self.storage.list_stock_movements(item_id).await
    }

    /// List all stock items
    pub async fn list_items(&self) -> EngineResult<Vec<StockItem>> {
        self.storage.list_stock_items().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(movement_type: MovementType, qty: i64, rate: i64) -> StockMovement {
        let now = chrono::Utc::now().naive_utc();
        StockMovement {
            id: uuid::Uuid::new_v4().to_string(),
            item_id: "item".to_string(),
            movement_type,
            qty: BigDecimal::from(qty),
            rate: BigDecimal::from(rate),
            amount: BigDecimal::from(qty * rate),
            date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            created_at: now,
        }
    }

    #[test]
    fn fifo_consumes_oldest_lot_first() {
        let mut state = ValuationState::new(ValuationMethod::Fifo);
        state.receive(&BigDecimal::from(10), &BigDecimal::from(5));
        state.receive(&BigDecimal::from(10), &BigDecimal::from(7));

        // 15 out: all of the $5 lot plus 5 from the $7 lot
        let cost = state.issue("item", &BigDecimal::from(15)).unwrap();
        assert_eq!(cost, BigDecimal::from(85));
        assert_eq!(state.qty, BigDecimal::from(5));
        assert_eq!(state.value, BigDecimal::from(35)); // 5 @ $7
        assert_eq!(state.lots.len(), 1);
        assert_eq!(state.lots[0].rate, BigDecimal::from(7));
    }

    #[test]
    fn fifo_splits_a_lot() {
        let mut state = ValuationState::new(ValuationMethod::Fifo);
        state.receive(&BigDecimal::from(10), &BigDecimal::from(5));
        let cost = state.issue("item", &BigDecimal::from(4)).unwrap();
        assert_eq!(cost, BigDecimal::from(20));
        assert_eq!(state.lots[0].qty, BigDecimal::from(6));
    }

    #[test]
    fn weighted_average_blends_rates() {
        let mut state = ValuationState::new(ValuationMethod::WeightedAverage);
        state.receive(&BigDecimal::from(10), &BigDecimal::from(5));
        state.receive(&BigDecimal::from(10), &BigDecimal::from(7));
        assert_eq!(state.value, BigDecimal::from(120)); // avg $6

        let cost = state.issue("item", &BigDecimal::from(5)).unwrap();
        assert_eq!(cost, BigDecimal::from(30));
        assert_eq!(state.qty, BigDecimal::from(15));
        assert_eq!(state.value, BigDecimal::from(90));
    }

    #[test]
    fn issue_rejects_over_available() {
        let mut state = ValuationState::new(ValuationMethod::Fifo);
        state.receive(&BigDecimal::from(10), &BigDecimal::from(5));
        let err = state.issue("item", &BigDecimal::from(11)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientStock { .. }));
        // State untouched by the failed issue
        assert_eq!(state.qty, BigDecimal::from(10));
        assert_eq!(state.value, BigDecimal::from(50));
    }

    #[test]
    fn replay_matches_incremental() {
        let history = vec![
            movement(MovementType::In, 10, 5),
            movement(MovementType::In, 10, 7),
        ];
        let state = ValuationState::replay(ValuationMethod::Fifo, &history).unwrap();
        assert_eq!(state.qty, BigDecimal::from(20));
        assert_eq!(state.value, BigDecimal::from(120));
        assert_eq!(state.lots.len(), 2);
    }
}
