//! 結果組裝
//!
//! 將生產記錄以料號對回需求表，補上目的地、需求量、出貨量與交期差。

use chrono::NaiveDate;
use lineplan_core::{DemandTable, PlanError, ResultTable, SlotCalendar};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 組裝後的輸出列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledRow {
    pub item: String,
    pub destination: String,
    pub line: String,
    pub slot: u32,

    /// 本列產量
    pub quantity: Decimal,

    /// 需求（生產）數量
    pub required_quantity: Decimal,

    /// 出貨數量
    pub ship_quantity: Decimal,

    pub due_date: Option<NaiveDate>,

    /// 時段所在日期
    pub slot_date: Option<NaiveDate>,

    /// 交期減時段日期（天）；無交期或日期無法推算時為 None
    pub lead_time_days: Option<i64>,
}

/// 結果組裝器
pub struct ResultAssembler;

impl ResultAssembler {
    /// 組裝結果表
    ///
    /// 任一記錄找不到對應料號時返回資料完整性錯誤，錯誤訊息列出全部未對應的料號。
    pub fn assemble(
        results: &ResultTable,
        demand: &DemandTable,
        calendar: &SlotCalendar,
    ) -> lineplan_core::Result<Vec<AssembledRow>> {
        let mut rows = Vec::with_capacity(results.records.len());
        let mut unmatched = BTreeSet::new();

        for record in &results.records {
            let Some(item) = demand.get(&record.item) else {
                unmatched.insert(record.item.clone());
                continue;
            };

            let slot_date = calendar.date_of_slot(record.slot);
            let lead_time_days = item
                .due_date
                .and_then(|due| calendar.lead_time_days(record.slot, due));

            rows.push(AssembledRow {
                item: item.code.clone(),
                destination: item.destination.clone(),
                line: record.line.clone(),
                slot: record.slot,
                quantity: record.quantity,
                required_quantity: item.required_quantity,
                ship_quantity: item.ship_quantity,
                due_date: item.due_date,
                slot_date,
                lead_time_days,
            });
        }

        if !unmatched.is_empty() {
            let keys: Vec<_> = unmatched.into_iter().collect();
            tracing::warn!("結果組裝失敗，未對應料號 {} 筆", keys.len());
            return Err(PlanError::DataIntegrity(format!(
                "生產記錄找不到需求料號: {}",
                keys.join(", ")
            )));
        }

        tracing::debug!("結果組裝完成：{} 列", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineplan_core::{CodeLayout, DemandItem, ProductionRecord};

    fn record(item: &str, line: &str, slot: u32, quantity: i64) -> ProductionRecord {
        ProductionRecord {
            item: item.to_string(),
            line: line.to_string(),
            slot,
            quantity: Decimal::from(quantity),
        }
    }

    fn demand() -> DemandTable {
        let layout = CodeLayout::default();
        DemandTable::new(vec![
            DemandItem::new("LA12-RED", "TPE", Decimal::from(10), &layout)
                .unwrap()
                .with_ship_quantity(Decimal::from(8))
                .with_due_date(NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()),
            DemandItem::new("LB07-BLU", "KHH", Decimal::from(4), &layout).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_assemble_joins_demand() {
        // 2025-10-09 週四；時段 3 落在 10-10
        let calendar = SlotCalendar::new(NaiveDate::from_ymd_opt(2025, 10, 9).unwrap());
        let results = ResultTable::new(vec![
            record("LA12-RED", "L1", 3, 6),
            record("LB07-BLU", "B2", 1, 4),
        ]);

        let rows = ResultAssembler::assemble(&results, &demand(), &calendar).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].destination, "TPE");
        assert_eq!(rows[0].required_quantity, Decimal::from(10));
        assert_eq!(rows[0].ship_quantity, Decimal::from(8));
        assert_eq!(rows[0].slot_date, NaiveDate::from_ymd_opt(2025, 10, 10));
        assert_eq!(rows[0].lead_time_days, Some(5));
        assert_eq!(rows[1].lead_time_days, None);
    }

    #[test]
    fn test_unmatched_keys_all_reported() {
        let calendar = SlotCalendar::default();
        let results = ResultTable::new(vec![
            record("LA12-RED", "L1", 1, 1),
            record("ZZ99-NEW", "L1", 1, 1),
            record("LC01-GRN", "L1", 2, 1),
        ]);

        let err = ResultAssembler::assemble(&results, &demand(), &calendar).unwrap_err();
        match err {
            PlanError::DataIntegrity(message) => {
                assert!(message.contains("LC01-GRN"));
                assert!(message.contains("ZZ99-NEW"));
                assert!(!message.contains("LA12-RED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
