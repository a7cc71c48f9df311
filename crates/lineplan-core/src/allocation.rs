//! 配產結果模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 產能格位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub line: String,
    pub slot: u32,
}

impl CellRef {
    pub fn new(line: impl Into<String>, slot: u32) -> Self {
        Self {
            line: line.into(),
            slot,
        }
    }
}

/// 單筆配產（產線, 時段, 數量）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub line: String,
    pub slot: u32,
    pub quantity: Decimal,
}

/// 配產解：請求ID → 配產列表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationSolution {
    pub entries: BTreeMap<usize, Vec<Allocation>>,
}

impl AllocationSolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加配產（數量不為正時忽略）
    pub fn push(&mut self, request_id: usize, allocation: Allocation) {
        if allocation.quantity > Decimal::ZERO {
            self.entries.entry(request_id).or_default().push(allocation);
        }
    }

    /// 請求的配產列表
    pub fn allocations(&self, request_id: usize) -> &[Allocation] {
        self.entries
            .get(&request_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 請求已配產總量
    pub fn allocated(&self, request_id: usize) -> Decimal {
        self.allocations(request_id).iter().map(|a| a.quantity).sum()
    }

    /// 產能格在所有請求中的已配產總量
    pub fn allocated_at(&self, line: &str, slot: u32) -> Decimal {
        self.entries
            .values()
            .flatten()
            .filter(|a| a.line == line && a.slot == slot)
            .map(|a| a.quantity)
            .sum()
    }

    /// 總配產量
    pub fn total(&self) -> Decimal {
        self.entries.values().flatten().map(|a| a.quantity).sum()
    }
}

/// 失敗原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// 產能格已用盡
    CapacityExhausted,
    /// 群組開線數已達上限
    LineQuotaExceeded,
    /// 群組產量已達上限（終止該請求）
    QuantityQuotaExceeded,
    /// 可配產量為 0
    ZeroAllocatable,
    /// 候選格用盡仍有未滿足數量
    UnmetExcess,
}

impl FailureReason {
    /// 是否終止整個請求
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::QuantityQuotaExceeded)
    }
}

/// 失敗記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// 發生位置（彙總記錄為 None）
    pub location: Option<CellRef>,

    /// 原因
    pub reason: FailureReason,

    /// 當時可用量（產能或配額餘量）
    pub available: Option<Decimal>,

    /// 當時未滿足數量
    pub excess: Decimal,
}

impl FailureRecord {
    pub fn at(
        line: &str,
        slot: u32,
        reason: FailureReason,
        available: Option<Decimal>,
        excess: Decimal,
    ) -> Self {
        Self {
            location: Some(CellRef::new(line, slot)),
            reason,
            available,
            excess,
        }
    }

    /// 彙總未滿足數量
    pub fn unmet(excess: Decimal) -> Self {
        Self {
            location: None,
            reason: FailureReason::UnmetExcess,
            available: None,
            excess,
        }
    }
}

/// 預排承諾（作為最佳化的硬約束）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedCommitment {
    /// 群組碼（可含萬用字元）
    pub group: String,
    pub line: String,
    pub slot: u32,
    pub quantity: Decimal,
}

/// 生產記錄（品項, 產線, 時段, 數量）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub item: String,
    pub line: String,
    pub slot: u32,
    pub quantity: Decimal,
}

/// 結果表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub records: Vec<ProductionRecord>,
}

impl ResultTable {
    pub fn new(records: Vec<ProductionRecord>) -> Self {
        Self { records }
    }

    /// 總產量
    pub fn total(&self) -> Decimal {
        self.records.iter().map(|r| r.quantity).sum()
    }

    /// 品項產量
    pub fn produced_for(&self, item: &str) -> Decimal {
        self.records
            .iter()
            .filter(|r| r.item == item)
            .map(|r| r.quantity)
            .sum()
    }

    /// 產能格產量
    pub fn produced_at(&self, line: &str, slot: u32) -> Decimal {
        self.records
            .iter()
            .filter(|r| r.line == line && r.slot == slot)
            .map(|r| r.quantity)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_ignores_non_positive() {
        let mut solution = AllocationSolution::new();
        solution.push(
            0,
            Allocation {
                line: "L1".to_string(),
                slot: 1,
                quantity: Decimal::ZERO,
            },
        );
        solution.push(
            0,
            Allocation {
                line: "L1".to_string(),
                slot: 1,
                quantity: Decimal::from(3),
            },
        );
        solution.push(
            1,
            Allocation {
                line: "L1".to_string(),
                slot: 1,
                quantity: Decimal::from(2),
            },
        );

        assert_eq!(solution.allocations(0).len(), 1);
        assert_eq!(solution.allocated(0), Decimal::from(3));
        assert_eq!(solution.allocated_at("L1", 1), Decimal::from(5));
        assert!(solution.allocations(7).is_empty());
    }

    #[test]
    fn test_failure_reason_serde_names() {
        let json = serde_json::to_string(&FailureReason::QuantityQuotaExceeded).unwrap();
        assert_eq!(json, "\"quantity_quota_exceeded\"");
        assert!(FailureReason::QuantityQuotaExceeded.is_terminal());
        assert!(!FailureReason::LineQuotaExceeded.is_terminal());
    }

    #[test]
    fn test_result_table_totals() {
        let table = ResultTable::new(vec![
            ProductionRecord {
                item: "LA12-RED".to_string(),
                line: "L1".to_string(),
                slot: 1,
                quantity: Decimal::from(4),
            },
            ProductionRecord {
                item: "LA12-RED".to_string(),
                line: "L2".to_string(),
                slot: 1,
                quantity: Decimal::from(2),
            },
        ]);

        assert_eq!(table.total(), Decimal::from(6));
        assert_eq!(table.produced_for("LA12-RED"), Decimal::from(6));
        assert_eq!(table.produced_at("L2", 1), Decimal::from(2));
    }
}
