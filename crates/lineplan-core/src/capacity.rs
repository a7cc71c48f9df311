//! 產能表模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 產能格鍵（產線 × 時段）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub line: String,
    pub slot: u32,
}

impl CellKey {
    pub fn new(line: impl Into<String>, slot: u32) -> Self {
        Self {
            line: line.into(),
            slot,
        }
    }
}

/// 產能格（序列化用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityCell {
    pub line: String,
    pub slot: u32,
    pub capacity: Decimal,
}

/// 產能表：每個（產線, 時段）的最大可生產量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CapacityCell>", into = "Vec<CapacityCell>")]
pub struct CapacityTable {
    cells: BTreeMap<CellKey, Decimal>,
}

impl CapacityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 設置產能（負值視為 0）
    pub fn set(&mut self, line: impl Into<String>, slot: u32, capacity: Decimal) {
        self.cells
            .insert(CellKey::new(line, slot), capacity.max(Decimal::ZERO));
    }

    /// 建構器模式：添加產能格
    pub fn with_cell(mut self, line: impl Into<String>, slot: u32, capacity: Decimal) -> Self {
        self.set(line, slot, capacity);
        self
    }

    /// 查詢產能（未定義的格視為 0）
    pub fn get(&self, line: &str, slot: u32) -> Decimal {
        self.cells
            .get(&CellKey::new(line, slot))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// 扣減剩餘產能
    pub fn consume(&mut self, line: &str, slot: u32, quantity: Decimal) {
        if let Some(cap) = self.cells.get_mut(&CellKey::new(line, slot)) {
            *cap -= quantity;
        }
    }

    /// 依（產線, 時段）排序的產能格
    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, Decimal)> {
        self.cells.iter().map(|(k, v)| (k, *v))
    }

    /// 所有產線
    pub fn lines(&self) -> BTreeSet<String> {
        self.cells.keys().map(|k| k.line.clone()).collect()
    }

    /// 所有時段（排序）
    pub fn slots(&self) -> Vec<u32> {
        let slots: BTreeSet<u32> = self.cells.keys().map(|k| k.slot).collect();
        slots.into_iter().collect()
    }

    /// 產線 × 時段交叉區域的產能總和
    pub fn total_over(&self, lines: &[String], slots: &[u32]) -> Decimal {
        lines
            .iter()
            .flat_map(|line| slots.iter().map(move |slot| self.get(line, *slot)))
            .sum()
    }

    /// 單格最大產能
    pub fn max_cell(&self) -> Decimal {
        self.cells.values().copied().max().unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<CapacityCell>> for CapacityTable {
    fn from(cells: Vec<CapacityCell>) -> Self {
        let mut table = Self::new();
        for cell in cells {
            table.set(cell.line, cell.slot, cell.capacity);
        }
        table
    }
}

impl From<CapacityTable> for Vec<CapacityCell> {
    fn from(table: CapacityTable) -> Self {
        table
            .cells
            .into_iter()
            .map(|(key, capacity)| CapacityCell {
                line: key.line,
                slot: key.slot,
                capacity,
            })
            .collect()
    }
}
